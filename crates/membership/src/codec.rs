use kvquorum_core::Address;
use kvquorum_core::KvQuorumError;

use crate::member::MemberEntry;

const TYPE_JOINREQ: u16 = 0;
const TYPE_JOINREP: u16 = 1;
const TYPE_GOSSIP: u16 = 3;

const SENTINEL: i64 = -1;

/// The binary membership wire format: a 2-byte little-endian `type`
/// followed by a type-specific payload. Kept separate from the key/value
/// codec because the two framings evolved independently and share no
/// fields beyond the sender address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipMessage {
    JoinReq {
        sender: Address,
        heartbeat: i64,
    },
    JoinRep {
        sender: Address,
        entries: Vec<MemberEntry>,
    },
    Gossip {
        sender: Address,
        entries: Vec<MemberEntry>,
    },
}

impl MembershipMessage {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            MembershipMessage::JoinReq { sender, heartbeat } => {
                let mut buf = Vec::with_capacity(2 + 6 + 8);
                buf.extend_from_slice(&TYPE_JOINREQ.to_le_bytes());
                buf.extend_from_slice(&sender.to_bytes());
                buf.extend_from_slice(&heartbeat.to_le_bytes());
                buf
            }
            MembershipMessage::JoinRep { sender, entries } => {
                encode_list(TYPE_JOINREP, *sender, entries)
            }
            MembershipMessage::Gossip { sender, entries } => {
                encode_list(TYPE_GOSSIP, *sender, entries)
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, KvQuorumError> {
        if bytes.len() < 2 {
            return Err(KvQuorumError::MalformedFrame(
                "membership frame shorter than the type tag".to_string(),
            ));
        }
        let kind = u16::from_le_bytes(bytes[0..2].try_into().unwrap());
        let payload = &bytes[2..];
        match kind {
            TYPE_JOINREQ => {
                if payload.len() != 14 {
                    return Err(KvQuorumError::MalformedFrame(
                        "JOINREQ payload must be 14 bytes".to_string(),
                    ));
                }
                let sender = Address::from_bytes(&payload[0..6])?;
                let heartbeat = i64::from_le_bytes(payload[6..14].try_into().unwrap());
                Ok(MembershipMessage::JoinReq { sender, heartbeat })
            }
            TYPE_JOINREP | TYPE_GOSSIP => {
                let (sender, entries) = decode_list(payload)?;
                if kind == TYPE_JOINREP {
                    Ok(MembershipMessage::JoinRep { sender, entries })
                } else {
                    Ok(MembershipMessage::Gossip { sender, entries })
                }
            }
            other => Err(KvQuorumError::UnknownMessageType(other)),
        }
    }
}

fn encode_list(kind: u16, sender: Address, entries: &[MemberEntry]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + 6 + 8 + entries.len() * 14);
    buf.extend_from_slice(&kind.to_le_bytes());
    buf.extend_from_slice(&sender.to_bytes());
    buf.extend_from_slice(&SENTINEL.to_le_bytes());
    for entry in entries {
        buf.extend_from_slice(&entry.address.to_bytes());
        buf.extend_from_slice(&entry.heartbeat.to_le_bytes());
    }
    buf
}

fn decode_list(payload: &[u8]) -> Result<(Address, Vec<MemberEntry>), KvQuorumError> {
    if payload.len() < 14 {
        return Err(KvQuorumError::MalformedFrame(
            "JOINREP/GOSSIP payload must carry at least the sender and sentinel".to_string(),
        ));
    }
    let sender = Address::from_bytes(&payload[0..6])?;
    // payload[6..14] is the sentinel (-1); it carries no information.
    let records = &payload[14..];
    if records.len() % 14 != 0 {
        return Err(KvQuorumError::MalformedFrame(
            "trailing bytes do not form whole 14-byte records".to_string(),
        ));
    }
    let entries = records
        .chunks_exact(14)
        .map(|chunk| {
            let address = Address::from_bytes(&chunk[0..6])?;
            let heartbeat = i64::from_le_bytes(chunk[6..14].try_into().unwrap());
            // last_heard is filled in by the receiver's merge step, using its
            // own clock; the wire format carries no timestamp.
            Ok(MemberEntry {
                address,
                heartbeat,
                last_heard: 0,
            })
        })
        .collect::<Result<Vec<_>, KvQuorumError>>()?;
    Ok((sender, entries))
}
