use crate::solicit::stream_id::StreamId;

/// Which end of the connection this engine is. The role fixes the
/// preface direction and, through stream id parity, which ids each side
/// may originate (5.1.1: clients use odd ids, servers even ones).
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum ClientOrServer {
    Client,
    Server,
}

impl ClientOrServer {
    /// The other end.
    pub fn peer(&self) -> ClientOrServer {
        match self {
            ClientOrServer::Client => ClientOrServer::Server,
            ClientOrServer::Server => ClientOrServer::Client,
        }
    }

    /// The lowest stream id of this role's parity.
    pub fn first_stream_id(&self) -> StreamId {
        match self {
            ClientOrServer::Client => 1,
            ClientOrServer::Server => 2,
        }
    }

    /// Which role a stream id belongs to, by its parity.
    pub fn who_initiated_stream(stream_id: StreamId) -> ClientOrServer {
        match stream_id % 2 == 0 {
            true => ClientOrServer::Server,
            false => ClientOrServer::Client,
        }
    }
}
