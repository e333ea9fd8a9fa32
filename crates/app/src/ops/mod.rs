pub mod init;
pub mod keygen;
pub mod keys;
pub mod pack;
pub mod sign;
pub mod unpack;
pub mod verify;
pub mod version;

pub use init::Init;
pub use keygen::Keygen;
pub use keys::Keys;
pub use pack::Pack;
pub use sign::Sign;
pub use unpack::Unpack;
pub use verify::Verify;
pub use version::Version;
