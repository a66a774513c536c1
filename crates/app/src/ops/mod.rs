pub mod daemon;
pub mod decrypt;
pub mod encrypt;
pub mod exchange;
pub mod init;
pub mod keys;
pub mod performance;
pub mod reset;
pub mod version;

pub use daemon::Daemon;
pub use decrypt::Decrypt;
pub use encrypt::Encrypt;
pub use init::Init;
pub use version::Version;
