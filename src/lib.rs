//! OAuth 2.0 client authentication and identity-provider integration engine.
//!
//! The crate obtains and caches bearer tokens through pluggable client-authentication
//! strategies (client secret basic/post, client-secret JWT, private-key JWT, mTLS) and drives
//! RFC 7591 dynamic client registration against OIDC providers (generic, Okta, Keycloak).
//! Providers discover their authorization-server metadata once at construction time and are
//! indexed by a [`registry::ProviderRegistry`] under their name, issuer, token endpoint,
//! authorization endpoint, and metadata URL.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod provider;
pub mod registration;
pub mod registry;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tokio as _};
