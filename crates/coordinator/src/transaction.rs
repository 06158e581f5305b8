use kvquorum_core::OpKind;

/// A client-initiated operation tracked at the node that originated it
/// (the coordinator for that call).
///
/// `id` doubles as this transaction's index in the `Coordinator`'s table;
/// the table only ever grows, so there is no index-aliasing hazard from
/// slot reuse the way a fixed-size array indexed by id would have.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: u32,
    pub kind: OpKind,
    pub key: String,
    pub value: String,
    pub created_tick: i64,
    pub replies_received: u32,
    pub replies_success: u32,
    pub collected_read_value: String,
    pub finished: bool,
}

impl Transaction {
    pub fn new(id: u32, kind: OpKind, key: String, value: String, created_tick: i64) -> Self {
        Self {
            id,
            kind,
            key,
            value,
            created_tick,
            replies_received: 0,
            replies_success: 0,
            collected_read_value: String::new(),
            finished: false,
        }
    }

    pub fn has_quorum(&self) -> bool {
        self.replies_success >= 2
    }
}
