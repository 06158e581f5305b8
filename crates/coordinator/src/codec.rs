use std::fmt;
use std::str::FromStr;

use kvquorum_core::Address;
use kvquorum_core::KvQuorumError;

/// Which of the three replicas a CREATE/UPDATE/STABILIZATION-CREATE frame
/// is addressed to. Carried purely for the receiver's own logging; success
/// semantics never depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaRole {
    Primary,
    Secondary,
    Tertiary,
}

impl ReplicaRole {
    pub const fn from_index(i: usize) -> Self {
        match i {
            0 => ReplicaRole::Primary,
            1 => ReplicaRole::Secondary,
            _ => ReplicaRole::Tertiary,
        }
    }

    const fn as_wire(self) -> &'static str {
        match self {
            ReplicaRole::Primary => "0",
            ReplicaRole::Secondary => "1",
            ReplicaRole::Tertiary => "2",
        }
    }
}

impl FromStr for ReplicaRole {
    type Err = KvQuorumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(ReplicaRole::Primary),
            "1" => Ok(ReplicaRole::Secondary),
            "2" => Ok(ReplicaRole::Tertiary),
            other => Err(KvQuorumError::MalformedFrame(format!(
                "unknown replica role {other:?}"
            ))),
        }
    }
}

/// The textual, pipe-delimited key/value wire format.
///
/// A tagged enum rather than one struct with optional fields, so a reader
/// can never observe a REPLY with a `key` field or a CREATE with no
/// `value` — the bug class the pointer-punned C original was prone to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvMessage {
    Create {
        trans_id: i64,
        from: Address,
        key: String,
        value: String,
        replica: ReplicaRole,
    },
    Update {
        trans_id: i64,
        from: Address,
        key: String,
        value: String,
        replica: ReplicaRole,
    },
    Read {
        trans_id: i64,
        from: Address,
        key: String,
    },
    Delete {
        trans_id: i64,
        from: Address,
        key: String,
    },
    StabilizationCreate {
        trans_id: i64,
        from: Address,
        key: String,
        value: String,
        replica: ReplicaRole,
    },
    StabilizationDelete {
        trans_id: i64,
        from: Address,
        key: String,
    },
    Reply {
        trans_id: i64,
        from: Address,
        success: bool,
    },
    ReadReply {
        trans_id: i64,
        from: Address,
        value: String,
    },
}

impl fmt::Display for KvMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvMessage::Create {
                trans_id,
                from,
                key,
                value,
                replica,
            } => write!(
                f,
                "{trans_id}|{from}|CREATE|{key}|{value}|{}",
                replica.as_wire()
            ),
            KvMessage::Update {
                trans_id,
                from,
                key,
                value,
                replica,
            } => write!(
                f,
                "{trans_id}|{from}|UPDATE|{key}|{value}|{}",
                replica.as_wire()
            ),
            KvMessage::Read { trans_id, from, key } => write!(f, "{trans_id}|{from}|READ|{key}"),
            KvMessage::Delete { trans_id, from, key } => {
                write!(f, "{trans_id}|{from}|DELETE|{key}")
            }
            KvMessage::StabilizationCreate {
                trans_id,
                from,
                key,
                value,
                replica,
            } => write!(
                f,
                "{trans_id}|{from}|STABILIZATION-CREATE|{key}|{value}|{}",
                replica.as_wire()
            ),
            KvMessage::StabilizationDelete { trans_id, from, key } => {
                write!(f, "{trans_id}|{from}|STABILIZATION-DELETE|{key}")
            }
            KvMessage::Reply {
                trans_id,
                from,
                success,
            } => write!(f, "{trans_id}|{from}|REPLY|{}", *success as u8),
            KvMessage::ReadReply {
                trans_id,
                from,
                value,
            } => write!(f, "{trans_id}|{from}|READREPLY|{value}"),
        }
    }
}

impl KvMessage {
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, KvQuorumError> {
        let text = std::str::from_utf8(bytes).map_err(|_| {
            KvQuorumError::MalformedFrame("kv frame is not valid utf-8".to_string())
        })?;
        let fields: Vec<&str> = text.split('|').collect();
        let malformed = || KvQuorumError::MalformedFrame(format!("malformed kv frame {text:?}"));

        let trans_id: i64 = fields.first().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        let from: Address = fields.get(1).ok_or_else(malformed)?.parse()?;
        let kind = *fields.get(2).ok_or_else(malformed)?;

        match kind {
            "CREATE" | "UPDATE" | "STABILIZATION-CREATE" => {
                let key = fields.get(3).ok_or_else(malformed)?.to_string();
                let value = fields.get(4).ok_or_else(malformed)?.to_string();
                let replica: ReplicaRole = fields.get(5).ok_or_else(malformed)?.parse()?;
                Ok(match kind {
                    "CREATE" => KvMessage::Create {
                        trans_id,
                        from,
                        key,
                        value,
                        replica,
                    },
                    "UPDATE" => KvMessage::Update {
                        trans_id,
                        from,
                        key,
                        value,
                        replica,
                    },
                    _ => KvMessage::StabilizationCreate {
                        trans_id,
                        from,
                        key,
                        value,
                        replica,
                    },
                })
            }
            "READ" => Ok(KvMessage::Read {
                trans_id,
                from,
                key: fields.get(3).ok_or_else(malformed)?.to_string(),
            }),
            "DELETE" => Ok(KvMessage::Delete {
                trans_id,
                from,
                key: fields.get(3).ok_or_else(malformed)?.to_string(),
            }),
            "STABILIZATION-DELETE" => Ok(KvMessage::StabilizationDelete {
                trans_id,
                from,
                key: fields.get(3).ok_or_else(malformed)?.to_string(),
            }),
            "REPLY" => {
                let success = match *fields.get(3).ok_or_else(malformed)? {
                    "1" => true,
                    "0" => false,
                    _ => return Err(malformed()),
                };
                Ok(KvMessage::Reply {
                    trans_id,
                    from,
                    success,
                })
            }
            "READREPLY" => Ok(KvMessage::ReadReply {
                trans_id,
                from,
                value: fields.get(3).ok_or_else(malformed)?.to_string(),
            }),
            _ => Err(malformed()),
        }
    }
}
