// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod edit;
mod info;

pub use edit::EditCmd;
pub use info::InfoCmd;
