//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::application::interceptor::Interceptor;
use crate::application::registry::StubSet;
use crate::domain::invocation::MethodName;
use std::fmt::Debug;
use std::hash::Hash;

/// Port for concurrent key-value storage.
///
/// This abstraction allows the application layer to store and retrieve stub
/// rules without depending on specific concurrent data structure
/// implementations. Infrastructure provides concrete implementations
/// (ShardedStorage).
///
/// Accessor closures run while the entry is locked and must not re-enter the
/// storage.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Access an existing entry mutably without creating it.
    ///
    /// # Returns
    /// `None` if the key is absent, otherwise the accessor's result
    fn with_existing_mut<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Iterate over all entries, providing access to both key and value.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);
}

/// Port implemented by every double, giving the stubbing and verification
/// API access to the double's interceptor.
///
/// Generated doubles (see [`double!`](crate::double)) and [`Double`](crate::Double)
/// implement this; hand-written doubles can too.
pub trait AsDouble {
    /// Stub rule storage used by the interceptor.
    type Storage: Storage<MethodName, StubSet> + Clone;

    /// The interceptor every call on this double is routed through.
    fn interceptor(&self) -> &Interceptor<Self::Storage>;
}

impl<D: AsDouble + ?Sized> AsDouble for &D {
    type Storage = D::Storage;

    fn interceptor(&self) -> &Interceptor<Self::Storage> {
        (**self).interceptor()
    }
}
