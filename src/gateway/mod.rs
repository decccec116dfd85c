// Keyward — Gateway Module
//
// HTTP front end over the store: Basic-auth login that issues bearer tokens,
// owner-checked key/value routes, admin shutdown and access logging.

mod caller;
mod error;
mod handlers;
mod login;
mod server;

pub use caller::{BasicCredentials, Identity};
pub use error::{GatewayError, LoginError};
pub use login::{parse_basic_auth, Authenticator};
pub use server::{router, AppState, Gateway, ShutdownHandle, MAX_BODY_SIZE};
