//! Toolset grouping and enablement.
//!
//! A [`Toolset`] groups read-only and mutating capabilities under one name and
//! enforces that each capability sits in the list matching its declared
//! safety. A [`ToolsetGroup`] owns every toolset of a process, applies the
//! global read-only lockdown, and decides which toolsets are enabled.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod group;
mod toolset;

pub use error::{ToolsetError, ToolsetResult};
pub use group::{EnableOutcome, ToolsetGroup, ToolsetInfo, UnknownToolsetPolicy, ALL_TOOLSETS};
pub use toolset::Toolset;
