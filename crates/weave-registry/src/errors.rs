//! # Registry Error Types

use thiserror::Error;
use weave_types::{BoxError, Tag};

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No constructor is bound to the tag.
    #[error("no constructor registered for tag '{tag}'")]
    UnknownTag { tag: Tag },

    /// The tag is already bound. The original binding is left intact.
    #[error("tag '{tag}' is already registered")]
    DuplicateTag { tag: Tag },

    /// The bound constructor failed. Opaque passthrough of its error.
    #[error("constructor for tag '{tag}' failed: {source}")]
    Constructor {
        tag: Tag,
        #[source]
        source: BoxError,
    },
}

impl RegistryError {
    /// The tag the failed operation was addressed to.
    #[must_use]
    pub fn tag(&self) -> &Tag {
        match self {
            Self::UnknownTag { tag } | Self::DuplicateTag { tag } | Self::Constructor { tag, .. } => {
                tag
            }
        }
    }
}
