//! Identity providers: discovered metadata (data), vendor strategies (behavior), and the
//! [`Provider`] that ties them to a token client for dynamic client registration.
//!
//! `metadata` holds the decoded OIDC discovery document, including mTLS endpoint aliases.
//! `strategy` defines [`IdpStrategy`], the hook that isolates vendor registration quirks
//! (authorization header prefix, payload rewrites) from the generic registration algorithm.

pub mod idp;
pub mod metadata;
pub mod strategy;

pub use idp::*;
pub use metadata::*;
pub use strategy::*;
