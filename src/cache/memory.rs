//! Thread-safe in-memory [`KeyedCache`] implementation.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, KeyedCache},
};

#[derive(Debug)]
struct Entries<V> {
	primary: HashMap<String, V>,
	secondary: HashMap<String, String>,
}
impl<V> Default for Entries<V> {
	fn default() -> Self {
		Self { primary: HashMap::new(), secondary: HashMap::new() }
	}
}

/// Process-local cache keeping values in a `HashMap` behind one read/write lock.
#[derive(Debug)]
pub struct MemoryCache<V>(Arc<RwLock<Entries<V>>>);
impl<V> MemoryCache<V> {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self(Arc::new(RwLock::new(Entries::default())))
	}
}
impl<V> Clone for MemoryCache<V> {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}
impl<V> Default for MemoryCache<V> {
	fn default() -> Self {
		Self::new()
	}
}
impl<V> KeyedCache<V> for MemoryCache<V>
where
	V: Clone + Send + Sync,
{
	fn set(&self, key: &str, value: V) {
		self.0.write().primary.insert(key.to_owned(), value);
	}

	fn set_secondary_key(&self, primary: &str, secondary: &str) -> Result<(), CacheError> {
		let mut entries = self.0.write();

		if !entries.primary.contains_key(primary) {
			return Err(CacheError::DanglingSecondaryKey {
				primary: primary.to_owned(),
				secondary: secondary.to_owned(),
			});
		}

		entries.secondary.insert(secondary.to_owned(), primary.to_owned());

		Ok(())
	}

	fn get(&self, key: &str) -> Result<V, CacheError> {
		self.0
			.read()
			.primary
			.get(key)
			.cloned()
			.ok_or_else(|| CacheError::KeyNotFound { key: key.to_owned() })
	}

	fn get_by_secondary_key(&self, key: &str) -> Result<V, CacheError> {
		let entries = self.0.read();

		entries
			.secondary
			.get(key)
			.and_then(|primary| entries.primary.get(primary))
			.cloned()
			.ok_or_else(|| CacheError::SecondaryKeyNotFound { key: key.to_owned() })
	}
}
