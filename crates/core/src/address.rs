use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::KvQuorumError;

/// A 6-byte peer identifier: a little-endian `u32` node id in bytes `[0,4)`
/// followed by a little-endian `u16` port in bytes `[4,6)`.
///
/// Addresses are stable for the lifetime of a process and uniquely identify
/// a peer; there is no DNS resolution or handshake involved in forming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    pub id: u32,
    pub port: u16,
}

impl Address {
    pub const fn new(id: u32, port: u16) -> Self {
        Self { id, port }
    }

    /// The well-known introducer address every node contacts to join.
    pub const INTRODUCER: Address = Address::new(1, 0);

    pub fn to_bytes(self) -> [u8; 6] {
        let mut buf = [0u8; 6];
        buf[0..4].copy_from_slice(&self.id.to_le_bytes());
        buf[4..6].copy_from_slice(&self.port.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, KvQuorumError> {
        if buf.len() != 6 {
            return Err(KvQuorumError::MalformedFrame(format!(
                "address must be 6 bytes, got {}",
                buf.len()
            )));
        }
        let id = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let port = u16::from_le_bytes(buf[4..6].try_into().unwrap());
        Ok(Self { id, port })
    }
}

impl Address {
    /// The canonical string form used as the hash-ring input: `"id:port"`.
    pub fn hash_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.port)
    }
}

impl FromStr for Address {
    type Err = KvQuorumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, port) = s
            .split_once(':')
            .ok_or_else(|| KvQuorumError::MalformedFrame(format!("bad address {s:?}")))?;
        let id = id
            .parse()
            .map_err(|_| KvQuorumError::MalformedFrame(format!("bad address {s:?}")))?;
        let port = port
            .parse()
            .map_err(|_| KvQuorumError::MalformedFrame(format!("bad address {s:?}")))?;
        Ok(Address { id, port })
    }
}
