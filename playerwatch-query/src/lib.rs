//! Source engine (A2S) server query client.
//!
//! Two request/response exchanges over one UDP socket produce a
//! [`ServerSnapshot`]: A2S_INFO for the server identity and A2S_PLAYER for
//! the roster. Modern servers answer either request with a challenge number
//! first; the client resends the request with the challenge attached. The
//! whole conversation shares a single caller-supplied timeout.

mod error;
mod packet;

pub use error::{QueryError, Result};
pub use packet::{PlayerEntry, ServerInfo};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

/// Largest datagram a Source server sends without splitting.
const MAX_DATAGRAM: usize = 1400;

/// How many challenge redirects to follow before giving up. A well-behaved
/// server answers after one.
const MAX_CHALLENGE_RETRIES: usize = 3;

/// A point-in-time view of the queried server. Produced fresh on every
/// fetch, never mutated.
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Connected player names, in reply order. Entries the server reported
    /// with an empty name (players still connecting) are filtered out.
    pub players: Vec<String>,
    /// Unix timestamp of the moment the snapshot was taken.
    pub fetched_at: i64,
    /// Server name from the A2S_INFO reply.
    pub server_name: String,
    /// The queried host:port.
    pub server_address: String,
}

impl ServerSnapshot {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Query `address` for its identity and player roster.
///
/// An empty roster is a valid snapshot, not an error. Expiry of `timeout`
/// anywhere in the conversation yields [`QueryError::Unreachable`].
pub async fn query(address: &str, timeout: Duration) -> Result<ServerSnapshot> {
    let deadline = Instant::now() + timeout;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(address).await?;

    let info = request_info(&socket, deadline).await?;
    debug!(server = %info.name, reported = info.players, "received A2S_INFO reply");

    let entries = request_players(&socket, deadline).await?;
    let players: Vec<String> = entries
        .into_iter()
        .map(|p| p.name)
        .filter(|name| !name.is_empty())
        .collect();
    debug!(count = players.len(), "received A2S_PLAYER reply");

    Ok(ServerSnapshot {
        players,
        fetched_at: unix_now(),
        server_name: info.name,
        server_address: address.to_string(),
    })
}

async fn request_info(socket: &UdpSocket, deadline: Instant) -> Result<ServerInfo> {
    let mut request = packet::info_request(None);
    for _ in 0..MAX_CHALLENGE_RETRIES {
        let datagram = round_trip(socket, &request, deadline).await?;
        let (kind, payload) = packet::split_reply(&datagram)?;
        match kind {
            packet::REPLY_INFO => return packet::parse_info(payload),
            packet::REPLY_CHALLENGE => {
                request = packet::info_request(Some(packet::parse_challenge(payload)?));
            }
            other => {
                return Err(QueryError::ProtocolViolation(format!(
                    "unexpected reply type {other:#04x} to A2S_INFO"
                )));
            }
        }
    }
    Err(QueryError::ProtocolViolation(
        "server kept answering A2S_INFO with challenges".into(),
    ))
}

async fn request_players(socket: &UdpSocket, deadline: Instant) -> Result<Vec<PlayerEntry>> {
    let mut request = packet::player_request(packet::NO_CHALLENGE);
    for _ in 0..MAX_CHALLENGE_RETRIES {
        let datagram = round_trip(socket, &request, deadline).await?;
        let (kind, payload) = packet::split_reply(&datagram)?;
        match kind {
            packet::REPLY_PLAYER => return packet::parse_players(payload),
            packet::REPLY_CHALLENGE => {
                request = packet::player_request(packet::parse_challenge(payload)?);
            }
            other => {
                return Err(QueryError::ProtocolViolation(format!(
                    "unexpected reply type {other:#04x} to A2S_PLAYER"
                )));
            }
        }
    }
    Err(QueryError::ProtocolViolation(
        "server kept answering A2S_PLAYER with challenges".into(),
    ))
}

async fn round_trip(socket: &UdpSocket, request: &[u8], deadline: Instant) -> Result<Vec<u8>> {
    socket.send(request).await?;
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let received = timeout_at(deadline, socket.recv(&mut buf))
        .await
        .map_err(|_| QueryError::Unreachable)??;
    buf.truncate(received);
    Ok(buf)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}
