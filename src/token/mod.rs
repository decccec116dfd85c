// Keyward — Token Module
//
// Short-lived, HS256-signed bearer tokens asserting a username. Issued after a
// successful credential check, validated on every protected call.

mod authority;
mod error;

pub use authority::{
    strip_bearer, Claims, TokenAuthority, DEFAULT_ISSUER, DEFAULT_VALIDITY_SECS,
};
pub use error::TokenError;
