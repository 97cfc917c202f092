//! Error kinds for lolviz operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Catch-all for unhandled cases
    Unexpected,

    /// A renderer was handed a value of the wrong shape
    InvalidArgument,

    /// Preferences failed to parse or validate
    ConfigInvalid,

    // =========================================================================
    // Model errors
    // =========================================================================
    /// Input document could not be turned into an object graph
    InvalidFormat,

    /// A `NodeId` that does not belong to the heap
    InvalidNodeRef,

    /// A caller-supplied accessor (value/next/left/right) failed
    AccessorFailed,

    // =========================================================================
    // Layout engine errors
    // =========================================================================
    /// The layout engine program could not be started
    LayoutEngineMissing,

    /// The layout engine ran but rejected its input
    LayoutFailed,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Whether the failure came from the external layout engine rather than
    /// from lolviz or its caller.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            ErrorKind::LayoutEngineMissing | ErrorKind::LayoutFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::AccessorFailed.to_string(), "AccessorFailed");
        assert_eq!(ErrorKind::InvalidNodeRef.as_str(), "InvalidNodeRef");
    }

    #[test]
    fn test_is_backend() {
        assert!(ErrorKind::LayoutEngineMissing.is_backend());
        assert!(ErrorKind::LayoutFailed.is_backend());
        assert!(!ErrorKind::AccessorFailed.is_backend());
        assert!(!ErrorKind::IoFailed.is_backend());
    }
}
