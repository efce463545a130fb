//! Core shared types for capability toolsets.
//!
//! A capability is one externally invocable operation: a name, a description,
//! a declared [`Safety`] class, a structural [`InputSchema`], and a handler.
//! Everything above this crate (toolsets, the registry, live sessions) only
//! moves [`CapabilityDescriptor`] values around.

#![warn(missing_docs, clippy::pedantic)]

mod capability;
mod error;
mod handler;
mod ids;
pub mod pagination;
pub mod params;
mod schema;

/// Capability descriptors and supporting builders.
pub use capability::{
    Annotations, CapabilityBuilder, CapabilityDescriptor, CapabilityName, CapabilitySummary,
    Safety,
};
/// Error type and result alias shared across the workspace.
pub use error::{Error, PageBound, Result};
/// Handler contract invoked for every capability call.
pub use handler::{CallContext, CallError, CallOutcome, CallResult, CapabilityHandler};
/// Unique identifier for a connected caller session.
pub use ids::SessionId;
/// Pagination contract shared by every list-style capability.
pub use pagination::{
    CursorPaginationParams, NormalizedCursor, PaginationParams, PaginationRequest,
};
/// Structural input schemas.
pub use schema::{InputSchema, Property, SchemaBuilder};
