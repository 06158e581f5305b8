mod codec;
mod gossip;
mod member;
mod ring;

pub use codec::MembershipMessage;
pub use gossip::Gossiper;
pub use member::MemberEntry;
pub use member::MemberList;
pub use member::MemberStatus;
pub use ring::Ring;
pub use ring::RingNode;
