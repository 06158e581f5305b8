mod address;
mod error;
mod logger;
mod logging;
mod params;

pub use address::Address;
pub use error::KvQuorumError;
pub use logger::Logger;
pub use logger::OpKind;
pub use logger::StdLogger;
pub use logging::init_stderr_logging;
pub use params::Params;
