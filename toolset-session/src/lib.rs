//! Live sessions and their view of the toolset registry.
//!
//! An [`ExposureBinder`] connects [`Session`]s. Each session owns an
//! invocation table that starts with the control capabilities plus every
//! capability of an enabled toolset, and grows in place whenever a toolset is
//! enabled at runtime.

#![warn(missing_docs, clippy::pedantic)]

mod binder;
pub mod control;
mod error;
mod session;
mod table;

pub use binder::{ExposureBinder, bind_incremental};
pub use control::{CONTROL_CAPABILITIES, ToolsetCapability};
pub use error::{SessionError, SessionResult};
pub use session::Session;
pub use table::{BoundCapability, InvocationTable};
