//! Request builders and reply parsing for the Source engine query protocol.
//!
//! Every datagram starts with a 4-byte magic header: `FF FF FF FF` for a
//! single-packet message, `FF FF FF FE` for a split one. Split replies only
//! occur for payloads larger than a single datagram, which neither of the two
//! queries used here produces on real servers; they are rejected as malformed.

use crate::error::{QueryError, Result};

const MAGIC_SINGLE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
const MAGIC_SPLIT: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFE];

const REQUEST_INFO: u8 = 0x54; // 'T'
const REQUEST_PLAYER: u8 = 0x55; // 'U'

pub const REPLY_INFO: u8 = 0x49; // 'I'
pub const REPLY_PLAYER: u8 = 0x44; // 'D'
pub const REPLY_CHALLENGE: u8 = 0x41; // 'A'

/// Challenge value for a first A2S_PLAYER request, before the server has
/// handed out a real one.
pub const NO_CHALLENGE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Parsed A2S_INFO reply. The engine only needs `name`, but parsing the full
/// fixed part of the reply is what validates the shape of the datagram.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub protocol: u8,
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    pub app_id: u16,
    pub players: u8,
    pub max_players: u8,
    pub bots: u8,
    pub server_type: u8,
    pub environment: u8,
    pub visibility: u8,
    pub vac: u8,
}

/// One entry of an A2S_PLAYER reply.
#[derive(Debug, Clone)]
pub struct PlayerEntry {
    pub index: u8,
    pub name: String,
    pub score: i32,
    pub duration: f32,
}

/// Build an A2S_INFO request, optionally answering a challenge.
pub fn info_request(challenge: Option<[u8; 4]>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(29);
    buf.extend_from_slice(&MAGIC_SINGLE);
    buf.push(REQUEST_INFO);
    buf.extend_from_slice(b"Source Engine Query\0");
    if let Some(challenge) = challenge {
        buf.extend_from_slice(&challenge);
    }
    buf
}

/// Build an A2S_PLAYER request carrying the given challenge.
pub fn player_request(challenge: [u8; 4]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(9);
    buf.extend_from_slice(&MAGIC_SINGLE);
    buf.push(REQUEST_PLAYER);
    buf.extend_from_slice(&challenge);
    buf
}

/// Split a raw datagram into its reply type byte and payload, rejecting
/// anything that does not carry the single-packet magic header.
pub fn split_reply(datagram: &[u8]) -> Result<(u8, &[u8])> {
    if datagram.len() < 5 {
        return Err(QueryError::ProtocolViolation(format!(
            "reply too short: {} bytes",
            datagram.len()
        )));
    }
    let (header, rest) = datagram.split_at(4);
    if header == MAGIC_SPLIT {
        return Err(QueryError::ProtocolViolation(
            "multi-packet reply is not supported".into(),
        ));
    }
    if header != MAGIC_SINGLE {
        return Err(QueryError::ProtocolViolation(format!(
            "bad magic header: {header:02x?}"
        )));
    }
    Ok((rest[0], &rest[1..]))
}

/// Extract the 4-byte challenge number from a challenge reply payload.
pub fn parse_challenge(payload: &[u8]) -> Result<[u8; 4]> {
    payload.try_into().map_err(|_| {
        QueryError::ProtocolViolation(format!(
            "challenge reply with {} payload bytes",
            payload.len()
        ))
    })
}

/// Parse the payload of an A2S_INFO reply.
///
/// Trailing data (server version, extra data flag fields) varies by server
/// and is ignored.
pub fn parse_info(payload: &[u8]) -> Result<ServerInfo> {
    let mut reader = Reader::new(payload);
    Ok(ServerInfo {
        protocol: reader.u8()?,
        name: reader.cstring()?,
        map: reader.cstring()?,
        folder: reader.cstring()?,
        game: reader.cstring()?,
        app_id: reader.u16_le()?,
        players: reader.u8()?,
        max_players: reader.u8()?,
        bots: reader.u8()?,
        server_type: reader.u8()?,
        environment: reader.u8()?,
        visibility: reader.u8()?,
        vac: reader.u8()?,
    })
}

/// Parse the payload of an A2S_PLAYER reply.
pub fn parse_players(payload: &[u8]) -> Result<Vec<PlayerEntry>> {
    let mut reader = Reader::new(payload);
    let count = reader.u8()? as usize;
    let mut players = Vec::with_capacity(count);
    for _ in 0..count {
        players.push(PlayerEntry {
            index: reader.u8()?,
            name: reader.cstring()?,
            score: reader.i32_le()?,
            duration: reader.f32_le()?,
        });
    }
    Ok(players)
}

/// Little-endian cursor over a reply payload.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(QueryError::ProtocolViolation("truncated reply".into()));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16_le(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn i32_le(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32_le(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a null-terminated string. Player and server names are not
    /// guaranteed to be valid UTF-8, so invalid bytes are replaced rather
    /// than rejected.
    fn cstring(&mut self) -> Result<String> {
        let nul = self.buf[self.pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| QueryError::ProtocolViolation("unterminated string in reply".into()))?;
        let bytes = &self.buf[self.pos..self.pos + nul];
        self.pos += nul + 1;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info_payload() -> Vec<u8> {
        let mut buf = vec![17u8];
        buf.extend_from_slice(b"2Fort 24/7\0");
        buf.extend_from_slice(b"ctf_2fort\0");
        buf.extend_from_slice(b"tf\0");
        buf.extend_from_slice(b"Team Fortress\0");
        buf.extend_from_slice(&440u16.to_le_bytes());
        buf.push(12); // players
        buf.push(24); // max_players
        buf.push(2); // bots
        buf.push(b'd');
        buf.push(b'l');
        buf.push(0); // public
        buf.push(1); // vac
        buf.extend_from_slice(b"1.2.3.4\0"); // version, ignored
        buf
    }

    #[test]
    fn info_request_bytes() {
        assert_eq!(
            info_request(None),
            b"\xFF\xFF\xFF\xFFTSource Engine Query\0"
        );
        let with_challenge = info_request(Some([0xDE, 0xAD, 0xBE, 0xEF]));
        assert!(with_challenge.starts_with(b"\xFF\xFF\xFF\xFFTSource Engine Query\0"));
        assert!(with_challenge.ends_with(&[0xDE, 0xAD, 0xBE, 0xEF]));
    }

    #[test]
    fn player_request_bytes() {
        assert_eq!(
            player_request(NO_CHALLENGE),
            b"\xFF\xFF\xFF\xFFU\xFF\xFF\xFF\xFF"
        );
        assert_eq!(
            player_request([1, 2, 3, 4]),
            b"\xFF\xFF\xFF\xFFU\x01\x02\x03\x04"
        );
    }

    #[test]
    fn splits_single_packet_reply() {
        let (kind, payload) = split_reply(b"\xFF\xFF\xFF\xFFA\x01\x02\x03\x04").unwrap();
        assert_eq!(kind, REPLY_CHALLENGE);
        assert_eq!(parse_challenge(payload).unwrap(), [1, 2, 3, 4]);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = split_reply(b"\x00\x00\x00\x00I rest").unwrap_err();
        assert!(matches!(err, QueryError::ProtocolViolation(_)));
    }

    #[test]
    fn rejects_split_packet_marker() {
        let err = split_reply(b"\xFF\xFF\xFF\xFEDmore").unwrap_err();
        assert!(matches!(err, QueryError::ProtocolViolation(_)));
    }

    #[test]
    fn rejects_short_datagram() {
        let err = split_reply(b"\xFF\xFF\xFF\xFF").unwrap_err();
        assert!(matches!(err, QueryError::ProtocolViolation(_)));
    }

    #[test]
    fn parses_info_reply() {
        let info = parse_info(&sample_info_payload()).unwrap();
        assert_eq!(info.protocol, 17);
        assert_eq!(info.name, "2Fort 24/7");
        assert_eq!(info.map, "ctf_2fort");
        assert_eq!(info.folder, "tf");
        assert_eq!(info.game, "Team Fortress");
        assert_eq!(info.app_id, 440);
        assert_eq!(info.players, 12);
        assert_eq!(info.max_players, 24);
        assert_eq!(info.bots, 2);
        assert_eq!(info.server_type, b'd');
        assert_eq!(info.environment, b'l');
        assert_eq!(info.visibility, 0);
        assert_eq!(info.vac, 1);
    }

    #[test]
    fn rejects_truncated_info() {
        let payload = sample_info_payload();
        let err = parse_info(&payload[..8]).unwrap_err();
        assert!(matches!(err, QueryError::ProtocolViolation(_)));
    }

    #[test]
    fn parses_player_reply() {
        let mut payload = vec![2u8];
        payload.push(0);
        payload.extend_from_slice(b"Alice\0");
        payload.extend_from_slice(&31i32.to_le_bytes());
        payload.extend_from_slice(&128.5f32.to_le_bytes());
        payload.push(1);
        payload.extend_from_slice(b"Bob\0");
        payload.extend_from_slice(&(-3i32).to_le_bytes());
        payload.extend_from_slice(&4.0f32.to_le_bytes());

        let players = parse_players(&payload).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Alice");
        assert_eq!(players[0].score, 31);
        assert_eq!(players[1].name, "Bob");
        assert_eq!(players[1].score, -3);
    }

    #[test]
    fn parses_empty_player_reply() {
        let players = parse_players(&[0u8]).unwrap();
        assert!(players.is_empty());
    }

    #[test]
    fn rejects_player_reply_with_missing_entries() {
        // Claims two players, carries none.
        let err = parse_players(&[2u8]).unwrap_err();
        assert!(matches!(err, QueryError::ProtocolViolation(_)));
    }
}
