//! Stream Registry
//!
//! Owns every Stream ever created and hands out the monotonically
//! increasing indices their ids are derived from. Streams are registered
//! once and never deleted; canceled and depleted streams stay queryable.
//!
//! # Consensus-Critical
//!
//! Uses BTreeMap for deterministic iteration. The index counter advances
//! only through `allocate_index`, and only after the deposit transfer for
//! the new stream succeeded; `next_index` peeks without committing, so a
//! failed create burns no id.

use std::collections::BTreeMap;

use lib_types::StreamIndex;
use serde::{Deserialize, Serialize};

use crate::state::{Stream, StreamId};

/// Trait for stream storage operations
pub trait StreamRegistry {
    /// Index the next created stream will take, without committing it
    fn next_index(&self) -> StreamIndex;

    /// Commit and return the next index, advancing the counter
    fn allocate_index(&mut self) -> StreamIndex;

    /// Register a newly created stream under its id
    fn add_stream(&mut self, stream: Stream);

    /// Look up a stream by id
    fn get_stream(&self, id: StreamId) -> Option<&Stream>;

    /// Look up a stream by id for mutation
    fn get_stream_mut(&mut self, id: StreamId) -> Option<&mut Stream>;

    /// Ids of all registered streams, in creation order
    fn stream_ids(&self) -> Vec<StreamId>;

    /// Whether a stream with this id exists
    fn contains(&self, id: StreamId) -> bool {
        self.get_stream(id).is_some()
    }

    /// Number of registered streams
    fn stream_count(&self) -> usize {
        self.stream_ids().len()
    }
}

/// Map-backed registry; the whole engine state for hosts that persist it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryRegistry {
    /// Streams keyed by id
    streams: BTreeMap<StreamId, Stream>,
    /// Index the next stream will be assigned
    next_index: StreamIndex,
}

impl InMemoryRegistry {
    /// Create an empty registry; the first stream gets index 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate all streams in creation order
    pub fn streams(&self) -> impl Iterator<Item = &Stream> {
        self.streams.values()
    }
}

impl StreamRegistry for InMemoryRegistry {
    fn next_index(&self) -> StreamIndex {
        self.next_index
    }

    fn allocate_index(&mut self) -> StreamIndex {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn add_stream(&mut self, stream: Stream) {
        self.streams.insert(stream.id, stream);
    }

    fn get_stream(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(&id)
    }

    fn get_stream_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        self.streams.get_mut(&id)
    }

    fn stream_ids(&self) -> Vec<StreamId> {
        self.streams.keys().copied().collect()
    }
}
