//! Keeps every live session's invocation table in step with the registry.

use std::sync::{Arc, Mutex, Weak};

use toolset_primitives::CapabilityDescriptor;
use toolset_registry::{EnableOutcome, ToolsetGroup, ToolsetResult};
use tracing::{debug, info};

use crate::control::{self, CONTROL_CAPABILITIES};
use crate::{Session, SessionResult};

type LiveSessions = Arc<Mutex<Vec<Weak<Session>>>>;

/// Registry handle plus the sessions that must see enable transitions.
#[derive(Clone, Debug)]
pub(crate) struct Exposure {
    group: Arc<ToolsetGroup>,
    live: LiveSessions,
}

impl Exposure {
    pub(crate) fn group(&self) -> &Arc<ToolsetGroup> {
        &self.group
    }

    /// Enables `name` and binds its capabilities into every live session
    /// before returning. The bind runs under the registry lock, so it happens
    /// once per transition no matter how many callers race.
    ///
    /// An already enabled toolset is bound again into every live session.
    /// Binding skips names already present, so this only repairs sessions
    /// that missed a transition made directly on the registry.
    pub(crate) fn enable(&self, name: &str) -> ToolsetResult<EnableOutcome> {
        let outcome = self.group.enable_toolset_with(name, |toolset| {
            self.bind_everywhere(toolset.name(), &toolset.active_capabilities());
        })?;
        if outcome == EnableOutcome::AlreadyEnabled {
            let capabilities = self.group.available_capabilities(name)?;
            self.bind_everywhere(name, &capabilities);
        }
        Ok(outcome)
    }

    fn bind_everywhere(&self, toolset: &str, capabilities: &[Arc<CapabilityDescriptor>]) {
        let mut live = self.live.lock().expect("live sessions poisoned");
        live.retain(|session| session.strong_count() > 0);
        for session in live.iter().filter_map(Weak::upgrade) {
            let bound = bind_incremental(&session, capabilities.iter().cloned());
            if bound > 0 {
                info!(
                    session_id = %session.id(),
                    toolset,
                    bound,
                    "toolset bound into live session"
                );
            }
        }
    }
}

/// Binds newly added capabilities into `session`. Names already bound are
/// skipped. Returns how many were newly bound.
pub fn bind_incremental<I>(session: &Session, capabilities: I) -> usize
where
    I: IntoIterator<Item = Arc<CapabilityDescriptor>>,
{
    capabilities
        .into_iter()
        .filter(|capability| session.table().insert_if_absent(Arc::clone(capability)))
        .count()
}

/// Creates sessions and keeps them synchronized with the registry.
#[derive(Debug)]
pub struct ExposureBinder {
    exposure: Exposure,
    controls: Vec<Arc<CapabilityDescriptor>>,
}

impl ExposureBinder {
    /// Prepares a binder over a fully populated registry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Toolset`](crate::SessionError::Toolset) when two
    /// capabilities share a name or one collides with a control capability.
    pub fn new(group: Arc<ToolsetGroup>) -> SessionResult<Self> {
        group.validate_unique_names(&CONTROL_CAPABILITIES)?;
        let exposure = Exposure {
            group,
            live: Arc::default(),
        };
        let controls = control::capabilities(&exposure)?;
        Ok(Self { exposure, controls })
    }

    /// The shared registry.
    ///
    /// Enable toolsets at runtime through [`ExposureBinder::enable_toolset`]
    /// so live sessions see them. Enabling directly on the registry leaves
    /// sessions behind until the next binder enable of that toolset.
    #[must_use]
    pub fn group(&self) -> &Arc<ToolsetGroup> {
        self.exposure.group()
    }

    /// Connects a new session bound to every currently active capability plus
    /// the control capabilities.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    #[must_use]
    pub fn connect(&self) -> Arc<Session> {
        self.exposure.group.with_active_capabilities(|active| {
            let session = Arc::new(Session::new());
            let bound = self.bind_initial(&session, active);
            let mut live = self.exposure.live.lock().expect("live sessions poisoned");
            live.retain(|tracked| tracked.strong_count() > 0);
            live.push(Arc::downgrade(&session));
            info!(session_id = %session.id(), bound, "session connected");
            session
        })
    }

    /// Binds the control capabilities and `capabilities` into `session`.
    /// Returns how many were newly bound.
    pub fn bind_initial<I>(&self, session: &Session, capabilities: I) -> usize
    where
        I: IntoIterator<Item = Arc<CapabilityDescriptor>>,
    {
        let bound = bind_incremental(
            session,
            self.controls.iter().cloned().chain(capabilities),
        );
        debug!(session_id = %session.id(), bound, "initial capabilities bound");
        bound
    }

    /// Binds newly added capabilities into `session`.
    pub fn bind_incremental<I>(&self, session: &Session, capabilities: I) -> usize
    where
        I: IntoIterator<Item = Arc<CapabilityDescriptor>>,
    {
        bind_incremental(session, capabilities)
    }

    /// Enables a toolset and binds it into every live session.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ToolsetNotFound`](toolset_registry::ToolsetError::ToolsetNotFound)
    /// for an unknown name.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn enable_toolset(&self, name: &str) -> ToolsetResult<EnableOutcome> {
        self.exposure.enable(name)
    }

    /// Number of sessions still alive.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        self.exposure
            .live
            .lock()
            .expect("live sessions poisoned")
            .iter()
            .filter(|session| session.strong_count() > 0)
            .count()
    }
}
