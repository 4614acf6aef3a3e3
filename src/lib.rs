// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

/// Logs why a piece of debug metadata was thrown away and bails out of the
/// current function with [`error::DebugDirError::Unsupported`]. The file and
/// line are stamped into the message so a rejection can be traced back to
/// the exact check that fired. Keep the message a plain literal; nothing in
/// this crate allocates.
///
/// Use this for structurally invalid metadata only — a legitimately absent
/// debug directory is `NotFound`, not a rejection.
#[macro_export]
macro_rules! reject {
    ($why:literal) => {{
        log::debug!(concat!(file!(), ":", line!(), " - ", $why));
        return Err($crate::error::DebugDirError::Unsupported)
    }};
}

pub mod context;
pub mod debug;
pub mod error;
pub mod headers;
pub mod overlays;
