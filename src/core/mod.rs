pub mod credential;
pub mod crypto;
pub mod endpoint;
pub mod key_agreement;
pub mod message;
pub mod multibase;
pub mod profile;
pub mod token;
pub mod transport;
pub mod util;
