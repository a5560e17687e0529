//! Credential model: the access token issued by the authorization server and the redacting
//! secret wrapper used for its sensitive fields.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;
