use std::collections::HashMap;

use crate::common::closed_streams::CloseReason;
use crate::common::closed_streams::ClosedStreams;
use crate::common::stream::HttpStreamCommon;
use crate::solicit::stream_id::StreamId;

/// Live streams keyed by id, plus tombstones for recently closed ones.
pub struct StreamMap {
    pub map: HashMap<StreamId, HttpStreamCommon>,
    pub closed: ClosedStreams,
}

impl StreamMap {
    pub fn new() -> StreamMap {
        StreamMap {
            map: HashMap::new(),
            closed: ClosedStreams::new(),
        }
    }

    pub fn insert(&mut self, id: StreamId, stream: HttpStreamCommon) {
        let prev = self.map.insert(id, stream);
        debug_assert!(prev.is_none(), "inserted stream that already existed");
    }

    pub fn get_mut(&mut self, id: StreamId) -> Option<&mut HttpStreamCommon> {
        self.map.get_mut(&id)
    }

    pub fn get(&self, id: StreamId) -> Option<&HttpStreamCommon> {
        self.map.get(&id)
    }

    /// Drops the stream from the live map, leaving a tombstone with the
    /// closure reason.
    pub fn remove_closed(&mut self, id: StreamId, reason: CloseReason) {
        match self.map.remove(&id) {
            Some(_) => debug!("removed stream: {} ({:?})", id, reason),
            None => debug!("incorrect request to remove stream: {}", id),
        }
        self.closed.add(id, reason);
    }
}
