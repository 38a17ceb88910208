use thiserror::Error;

/// Failures of the tree core.
///
/// Storage and parse failures are recovered by the gateway (`TreeStore::load`
/// falls back to an empty tree); conversion and edit failures are surfaced to
/// the caller so that nothing corrupt reaches storage.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Persisted value is not JSON or not a node list.
    #[error("stored tree is not a valid node list: {0}")]
    Parse(String),

    /// The live tree could not be encoded for writing.
    #[error("could not serialize the tree: {0}")]
    Serialize(String),

    /// A `children` entry names an id that has no item.
    #[error("item `{parent}` references missing child `{id}`")]
    DanglingReference { parent: String, id: String },

    /// An id is reachable through more than one `children` edge.
    #[error("item `{0}` is referenced more than once")]
    RepeatedReference(String),

    /// Backend storage cannot be reached or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Two nodes share an id, or a node uses the reserved root id.
    #[error("duplicate node id `{0}`")]
    DuplicateId(String),

    /// An item has children but is not marked as a folder.
    #[error("item `{0}` has children but is not a folder")]
    NotAFolder(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("drop rejected: {0}")]
    DropRejected(String),

    #[error("the root item cannot be renamed or moved")]
    RootImmutable,

    #[error("capability disabled: {0}")]
    CapabilityDisabled(&'static str),
}

impl TreeError {
    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    pub(crate) fn serialize(e: impl std::fmt::Display) -> Self {
        Self::Serialize(e.to_string())
    }

    pub(crate) fn storage(e: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable(e.to_string())
    }

    /// Whether the session can keep going after this error without losing data.
    ///
    /// Only structural corruption of the live map is not recoverable; everything
    /// else leaves the state as it was before the failing call.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::DanglingReference { .. } | Self::RepeatedReference(_)
        )
    }
}

pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference_message_names_both_ids() {
        let e = TreeError::DanglingReference {
            parent: "a".to_string(),
            id: "ghost".to_string(),
        };
        assert_eq!(e.to_string(), "item `a` references missing child `ghost`");
        assert!(!e.is_recoverable());
    }

    #[test]
    fn test_serialize_failure_is_not_reported_as_bad_stored_data() {
        let e = TreeError::serialize("key must be a string");
        assert_eq!(e, TreeError::Serialize("key must be a string".to_string()));
        assert_eq!(e.to_string(), "could not serialize the tree: key must be a string");
        assert_ne!(e, TreeError::parse("key must be a string"));
        assert!(e.is_recoverable());
    }

    #[test]
    fn test_storage_helper_keeps_message() {
        let e = TreeError::storage("quota exceeded");
        assert_eq!(e, TreeError::StorageUnavailable("quota exceeded".to_string()));
        assert!(e.is_recoverable());
    }
}
