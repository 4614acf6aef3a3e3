// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

use core::fmt;

/// The two ways a debug-directory walk can come up empty. Neither is a
/// crash; `NotFound` is an expected outcome for images built without
/// symbols, while `Unsupported` means the metadata is present but broken
/// and the caller may want to distrust the whole image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugDirError {
    /// Debug information is legitimately absent.
    NotFound,
    /// Debug metadata exists but is structurally invalid: malformed size,
    /// out-of-bounds offset, wrapped arithmetic, misalignment, unknown
    /// CodeView signature, or a missing terminator.
    Unsupported,
}

impl fmt::Display for DebugDirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("no debug information present"),
            Self::Unsupported => f.write_str("malformed or unsupported debug information"),
        }
    }
}

impl std::error::Error for DebugDirError {}

/// A failed scroll read is always a bounds problem in this crate, which is
/// structural corruption by definition.
impl From<scroll::Error> for DebugDirError {
    fn from(_: scroll::Error) -> Self {
        Self::Unsupported
    }
}
