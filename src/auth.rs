//! Client authentication: credentials, key material, per-method authenticators, and the
//! caching token client built on top of them.

pub mod authenticator;
pub mod client;
pub mod key;
pub mod scope;
pub mod secret;

pub use authenticator::*;
pub use client::*;
pub use key::*;
pub use scope::*;
pub use secret::*;
