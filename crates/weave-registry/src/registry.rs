//! # Registry Implementation
//!
//! The constructor table is guarded by a `parking_lot::RwLock`.
//! Registration is a setup-time operation; resolution is the fast path and
//! only clones the bound constructor under the read lock. Constructors run
//! outside the lock, so a slow or reentrant constructor can never wedge the
//! table.

use crate::errors::RegistryError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use weave_types::{BoxError, Tag};

/// A registered constructor: `args -> instance`.
pub type Constructor<A, T> = Arc<dyn Fn(A) -> Result<T, BoxError> + Send + Sync>;

/// Creation authority for tagged variants.
///
/// `A` is the constructor argument type, `T` the constructed instance type.
/// The registry exclusively owns its constructor table.
pub struct Registry<A, T> {
    constructors: RwLock<HashMap<Tag, Constructor<A, T>>>,
}

impl<A, T> Registry<A, T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Bind a constructor to a tag.
    ///
    /// # Errors
    ///
    /// `RegistryError::DuplicateTag` if the tag is already bound. The
    /// existing binding is left intact.
    pub fn register(
        &self,
        tag: impl Into<Tag>,
        constructor: impl Fn(A) -> Result<T, BoxError> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();
        let mut table = self.constructors.write();

        if table.contains_key(&tag) {
            return Err(RegistryError::DuplicateTag { tag });
        }

        debug!(tag = %tag, "Registered constructor");
        table.insert(tag, Arc::new(constructor));
        Ok(())
    }

    /// Resolve a tag to a constructed instance.
    ///
    /// The constructor is invoked with `args` outside the table lock.
    ///
    /// # Errors
    ///
    /// - `RegistryError::UnknownTag` if the tag is not bound.
    /// - `RegistryError::Constructor` if the bound constructor fails; its
    ///   error is carried through unchanged as the source.
    pub fn resolve(&self, tag: &Tag, args: A) -> Result<T, RegistryError> {
        let constructor = {
            let table = self.constructors.read();
            table
                .get(tag)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownTag { tag: tag.clone() })?
        };

        trace!(tag = %tag, "Resolving tag");
        constructor(args).map_err(|source| RegistryError::Constructor {
            tag: tag.clone(),
            source,
        })
    }

    /// Remove a binding. Returns whether one existed.
    pub fn unregister(&self, tag: &Tag) -> bool {
        let removed = self.constructors.write().remove(tag).is_some();
        if removed {
            debug!(tag = %tag, "Unregistered constructor");
        }
        removed
    }

    /// Check whether a tag is bound.
    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.constructors.read().contains_key(tag)
    }

    /// All bound tags, sorted.
    #[must_use]
    pub fn registered_tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.constructors.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Number of bound tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.read().len()
    }

    /// True if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.read().is_empty()
    }
}

impl<A, T> Default for Registry<A, T> {
    fn default() -> Self {
        Self::new()
    }
}
