mod codec;
mod coordinator;
mod stabilizer;
mod transaction;

pub use codec::KvMessage;
pub use codec::ReplicaRole;
pub use coordinator::Coordinator;
pub use stabilizer::Stabilizer;
pub use transaction::Transaction;
