// Keyward — Credentials Module
//
// Argon2id password hashing and the startup-loaded table of user credential
// records that login requests are verified against.

mod error;
mod hasher;
mod table;

pub use error::CredentialError;
pub use hasher::{constant_time_eq, CredentialHasher, EncodedDigest, HashParams, ARGON2_VERSION};
pub use table::CredentialTable;

#[cfg(test)]
pub(crate) use hasher::tests::fast_hasher;
