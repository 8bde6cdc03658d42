//! Keyed cache contract with secondary-key aliasing, plus the in-memory implementation.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Error type produced by [`KeyedCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CacheError {
	/// No entry is stored under the key.
	#[error("Cache key `{key}` was not found.")]
	KeyNotFound {
		/// Requested key.
		key: String,
	},
	/// No entry is stored under the alias.
	#[error("Cache secondary key `{key}` was not found.")]
	SecondaryKeyNotFound {
		/// Requested alias.
		key: String,
	},
	/// An alias was attached to a primary key that holds no entry.
	#[error("Cannot alias `{secondary}`: primary key `{primary}` was not found.")]
	DanglingSecondaryKey {
		/// Primary key the alias should point at.
		primary: String,
		/// Alias that was being attached.
		secondary: String,
	},
}

/// Storage contract for values addressable by a primary key and any number of aliases.
///
/// Implementations must be safe for concurrent use; aliases resolve through the primary key,
/// so overwriting a primary entry re-points every alias attached to it.
pub trait KeyedCache<V>
where
	Self: Send + Sync,
{
	/// Stores or replaces the value under `key`.
	fn set(&self, key: &str, value: V);

	/// Attaches `secondary` as an alias of `primary`.
	fn set_secondary_key(&self, primary: &str, secondary: &str) -> Result<(), CacheError>;

	/// Looks up a value by primary key.
	fn get(&self, key: &str) -> Result<V, CacheError>;

	/// Looks up a value by alias.
	fn get_by_secondary_key(&self, key: &str) -> Result<V, CacheError>;
}
