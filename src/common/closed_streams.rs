use std::collections::HashMap;
use std::collections::VecDeque;

use crate::solicit::stream_id::StreamId;

/// Why a stream reached the closed state.
///
/// The answer decides how late frames on the stream are treated: after
/// a reset we sent, stragglers the peer put on the wire before seeing
/// the RST_STREAM are expected and get absorbed; after a clean close or
/// a peer reset they indicate a confused peer.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CloseReason {
    /// We sent RST_STREAM, either on host request or because the engine
    /// reset the stream after a peer error. Late frames are absorbed.
    LocalReset,
    /// The peer sent RST_STREAM.
    RemoteReset,
    /// Both sides sent END_STREAM.
    Ended,
}

/// Tracks recently closed streams together with their closure reason,
/// so that late frames can be told apart from frames on streams that
/// never existed.
///
/// The set is bounded: the oldest entries are dropped first. A stream
/// that has aged out behaves like one closed by normal END_STREAM
/// exchange.
#[derive(Default)]
pub struct ClosedStreams {
    map: HashMap<StreamId, CloseReason>,
    lru: VecDeque<StreamId>,
}

const MAX_SIZE: usize = 100;

impl ClosedStreams {
    pub fn new() -> ClosedStreams {
        Default::default()
    }

    pub fn get(&self, stream_id: StreamId) -> Option<CloseReason> {
        self.map.get(&stream_id).copied()
    }

    pub fn add(&mut self, stream_id: StreamId, reason: CloseReason) {
        if self.map.insert(stream_id, reason).is_none() {
            if self.lru.len() == MAX_SIZE {
                let remove = self.lru.pop_front().unwrap();
                assert!(self.map.remove(&remove).is_some());
            }

            self.lru.push_back(stream_id);
        }
    }

    #[cfg(test)]
    pub fn self_check(&self) {
        assert_eq!(self.map.len(), self.lru.len());
        for stream_id in &self.lru {
            assert!(self.map.contains_key(stream_id));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lru_eviction() {
        let mut closed_streams = ClosedStreams::new();

        for i in 1..=MAX_SIZE {
            closed_streams.add(i as StreamId, CloseReason::Ended);
            closed_streams.self_check();
            assert_eq!(Some(CloseReason::Ended), closed_streams.get(i as StreamId));
        }

        for i in 1..=MAX_SIZE {
            closed_streams.add((i + 10000) as StreamId, CloseReason::LocalReset);
            assert_eq!(
                Some(CloseReason::LocalReset),
                closed_streams.get((i + 10000) as StreamId)
            );
            assert_eq!(None, closed_streams.get(i as StreamId));
            closed_streams.self_check();
        }
    }
}
