//! Tipline Crypto Library
//!
//! Credentials for the two ways a caller proves who they are:
//! - anonymous reporters hold a ticket plus a one-time access code,
//!   stored only as an Argon2id hash
//! - registered users hold a signed session token
//!
//! Everything here is stateless and safe to call from any thread.

pub mod code;
pub mod secret;
pub mod token;

pub use code::CodeHasher;
pub use token::{SessionClaims, SessionTokens};
