//! Lockup Configuration
//!
//! Limits applied during stream creation.

use serde::{Deserialize, Serialize};

/// Configuration for stream creation checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockupConfig {
    /// Maximum length of a stream name in bytes
    pub max_name_len: usize,
}

impl Default for LockupConfig {
    fn default() -> Self {
        Self { max_name_len: 32 }
    }
}

impl LockupConfig {
    /// Create a permissive config for testing
    pub fn for_testing() -> Self {
        Self {
            max_name_len: usize::MAX,
        }
    }
}
