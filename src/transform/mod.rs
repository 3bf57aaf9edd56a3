// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-message edit primitives.
//!
//! The engine applies these in a fixed order for every message:
//! [`TrimWindow`] first, then topic deletion, then channel emission with
//! [`TopicRenameTransform`], then [`TimeShift`].
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> roboedit::Result<()> {
//! use roboedit::transform::{TopicRenameTransform, TrimDecision, TrimWindow};
//!
//! let mut rename = TopicRenameTransform::new();
//! rename.add_mapping("/old_topic", "/new_topic")?;
//! assert_eq!(rename.rename("/old_topic"), Some("/new_topic"));
//!
//! let window = TrimWindow::resolve(Some(150), None, 100, 300)?;
//! assert_eq!(window.decide(120), TrimDecision::Skip);
//! # Ok(())
//! # }
//! ```

pub mod time_shift;
pub mod topic_rename;
pub mod trim;

pub use time_shift::TimeShift;
pub use topic_rename::TopicRenameTransform;
pub use trim::{TrimDecision, TrimWindow};
