//! Process-wide registry of toolsets.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use toolset_primitives::CapabilityDescriptor;
use tracing::{debug, info, warn};

use crate::{Toolset, ToolsetError, ToolsetResult};

/// Pseudo toolset name that enables every toolset.
pub const ALL_TOOLSETS: &str = "all";

/// How bulk enablement treats names that match no toolset.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownToolsetPolicy {
    /// Stop at the first unknown name and return its error.
    #[default]
    Strict,
    /// Skip unknown names and keep going.
    Lenient,
}

/// Result of enabling a single toolset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnableOutcome {
    /// The toolset transitioned from disabled to enabled.
    Enabled,
    /// The toolset was already enabled; nothing changed.
    AlreadyEnabled,
}

/// Listing entry for one toolset.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ToolsetInfo {
    /// Toolset name.
    pub name: String,
    /// Toolset description.
    pub description: String,
    /// Effective enabled state, including the enable-everything override.
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct GroupState {
    toolsets: BTreeMap<String, Toolset>,
    everything_on: bool,
}

/// Owner of every toolset in the process.
///
/// Shared behind an `Arc` by all sessions. One lock guards both startup
/// registration and runtime enablement, so readers always observe a toolset
/// either fully before or fully after an enable.
#[derive(Debug, Default)]
pub struct ToolsetGroup {
    read_only: bool,
    state: RwLock<GroupState>,
}

impl ToolsetGroup {
    /// Creates an empty group. With `read_only`, every toolset added later is
    /// locked down.
    #[must_use]
    pub fn new(read_only: bool) -> Self {
        Self {
            read_only,
            state: RwLock::new(GroupState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, GroupState> {
        self.state.read().expect("toolset group poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, GroupState> {
        self.state.write().expect("toolset group poisoned")
    }

    /// Whether the global read-only lockdown is active.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether `"all"` has been enabled.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn is_everything_enabled(&self) -> bool {
        self.read().everything_on
    }

    /// Registers a toolset, applying the global lockdown. A toolset with the
    /// same name is replaced.
    ///
    /// Startup only: add every toolset before building the session binder.
    /// Later additions skip its name-uniqueness check and are absent from the
    /// control capabilities' toolset list.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add_toolset(&self, mut toolset: Toolset) {
        if self.read_only {
            toolset.set_read_only();
        }
        let mut state = self.write();
        if state.everything_on {
            toolset.set_enabled();
        }
        let name = toolset.name().to_owned();
        debug!(
            toolset = %name,
            read_only = toolset.is_read_only(),
            capabilities = toolset.available_capabilities().len(),
            "toolset added"
        );
        if state.toolsets.insert(name.clone(), toolset).is_some() {
            warn!(toolset = %name, "toolset replaced an existing registration");
        }
    }

    /// Whether the named toolset is enabled. Unknown names are never enabled.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        let state = self.read();
        state.everything_on || state.toolsets.get(name).is_some_and(Toolset::is_enabled)
    }

    /// Enables several toolsets at once.
    ///
    /// `"all"` anywhere in `names` enables every toolset, now and for toolsets
    /// added later. Other names are enabled in order; under
    /// [`UnknownToolsetPolicy::Strict`] the first unknown name aborts the call
    /// before the remaining names, or `"all"`, take effect.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ToolsetNotFound`] under the strict policy.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn enable_toolsets<S>(&self, names: &[S], policy: UnknownToolsetPolicy) -> ToolsetResult<()>
    where
        S: AsRef<str>,
    {
        let mut state = self.write();
        let mut wants_all = false;

        for name in names.iter().map(AsRef::as_ref) {
            if name == ALL_TOOLSETS {
                wants_all = true;
                continue;
            }
            match Self::enable_locked(&mut state, name) {
                Ok(_) => {}
                Err(err) if policy == UnknownToolsetPolicy::Lenient => {
                    warn!(toolset = %name, error = %err, "skipping unknown toolset");
                }
                Err(err) => return Err(err),
            }
        }

        if wants_all {
            state.everything_on = true;
            for toolset in state.toolsets.values_mut() {
                toolset.set_enabled();
            }
            info!(toolsets = state.toolsets.len(), "all toolsets enabled");
        }
        Ok(())
    }

    /// Enables one toolset.
    ///
    /// Nothing is bound into live sessions; once sessions exist, enable
    /// through the session binder instead.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ToolsetNotFound`] for an unknown name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn enable_toolset(&self, name: &str) -> ToolsetResult<EnableOutcome> {
        self.enable_toolset_with(name, |_| {})
    }

    /// Enables one toolset and, on a fresh transition only, runs
    /// `on_transition` with the toolset while the registry lock is still
    /// held. Concurrent enables of the same toolset therefore run the
    /// callback exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ToolsetNotFound`] for an unknown name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn enable_toolset_with<F>(&self, name: &str, on_transition: F) -> ToolsetResult<EnableOutcome>
    where
        F: FnOnce(&Toolset),
    {
        let mut state = self.write();
        let outcome = Self::enable_locked(&mut state, name)?;
        if outcome == EnableOutcome::Enabled
            && let Some(toolset) = state.toolsets.get(name)
        {
            on_transition(toolset);
        }
        Ok(outcome)
    }

    fn enable_locked(state: &mut GroupState, name: &str) -> ToolsetResult<EnableOutcome> {
        let toolset = state
            .toolsets
            .get_mut(name)
            .ok_or_else(|| ToolsetError::not_found(name))?;
        if toolset.is_enabled() {
            debug!(toolset = %name, "toolset already enabled");
            return Ok(EnableOutcome::AlreadyEnabled);
        }
        toolset.set_enabled();
        info!(toolset = %name, "toolset enabled");
        Ok(EnableOutcome::Enabled)
    }

    /// Returns a snapshot of the named toolset.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ToolsetNotFound`] for an unknown name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get_toolset(&self, name: &str) -> ToolsetResult<Toolset> {
        self.read()
            .toolsets
            .get(name)
            .cloned()
            .ok_or_else(|| ToolsetError::not_found(name))
    }

    /// Lists every toolset, sorted by name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn list_toolsets(&self) -> Vec<ToolsetInfo> {
        let state = self.read();
        state
            .toolsets
            .values()
            .map(|toolset| ToolsetInfo {
                name: toolset.name().to_owned(),
                description: toolset.description().to_owned(),
                enabled: state.everything_on || toolset.is_enabled(),
            })
            .collect()
    }

    /// Sorted toolset names.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn toolset_names(&self) -> Vec<String> {
        self.read().toolsets.keys().cloned().collect()
    }

    /// Capabilities the named toolset would expose once enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ToolsetNotFound`] for an unknown name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn available_capabilities(&self, name: &str) -> ToolsetResult<Vec<Arc<CapabilityDescriptor>>> {
        self.read()
            .toolsets
            .get(name)
            .map(Toolset::available_capabilities)
            .ok_or_else(|| ToolsetError::not_found(name))
    }

    /// Runs `f` with the capabilities of every enabled toolset while holding
    /// the registry read lock, so no enable can interleave with `f`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn with_active_capabilities<R, F>(&self, f: F) -> R
    where
        F: FnOnce(Vec<Arc<CapabilityDescriptor>>) -> R,
    {
        let state = self.read();
        let active = state
            .toolsets
            .values()
            .flat_map(Toolset::active_capabilities)
            .collect();
        f(active)
    }

    /// Snapshot of every active capability.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn active_capabilities(&self) -> Vec<Arc<CapabilityDescriptor>> {
        self.with_active_capabilities(|active| active)
    }

    /// Checks that capability names are unique across all toolsets and do not
    /// collide with `reserved` names (e.g. control capabilities).
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::DuplicateCapability`] for the first collision.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn validate_unique_names(&self, reserved: &[&str]) -> ToolsetResult<()> {
        let state = self.read();
        let mut owners: HashMap<&str, &str> =
            reserved.iter().map(|name| (*name, "<reserved>")).collect();

        for toolset in state.toolsets.values() {
            for name in toolset.capability_names() {
                if let Some(first) = owners.insert(name, toolset.name()) {
                    return Err(ToolsetError::DuplicateCapability {
                        name: name.to_owned(),
                        first: first.to_owned(),
                        second: toolset.name().to_owned(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolset::tests::capability;
    use toolset_primitives::Safety;

    fn toolset(name: &str) -> Toolset {
        Toolset::new(name, format!("{name} toolset"))
            .add_read_capabilities([capability(&format!("get_{name}"), Safety::ReadOnly)])
            .unwrap()
            .add_mutating_capabilities([capability(&format!("create_{name}"), Safety::Mutating)])
            .unwrap()
    }

    fn group() -> ToolsetGroup {
        let group = ToolsetGroup::new(false);
        group.add_toolset(toolset("issues"));
        group.add_toolset(toolset("alerts"));
        group
    }

    #[test]
    fn toolsets_start_disabled() {
        let group = group();
        assert!(!group.is_enabled("issues"));
        assert!(group.active_capabilities().is_empty());
        assert!(group.list_toolsets().iter().all(|info| !info.enabled));
    }

    #[test]
    fn unknown_names_are_never_enabled() {
        assert!(!group().is_enabled("nonexistent"));
    }

    #[test]
    fn enable_reports_transition_then_idempotence() {
        let group = group();
        assert_eq!(group.enable_toolset("issues").unwrap(), EnableOutcome::Enabled);
        assert_eq!(
            group.enable_toolset("issues").unwrap(),
            EnableOutcome::AlreadyEnabled
        );
        assert!(group.is_enabled("issues"));
        assert!(!group.is_enabled("alerts"));
    }

    #[test]
    fn transition_callback_runs_once() {
        let group = group();
        let mut calls = 0;
        group
            .enable_toolset_with("issues", |toolset| {
                calls += 1;
                assert_eq!(toolset.active_capabilities().len(), 2);
            })
            .unwrap();
        group.enable_toolset_with("issues", |_| calls += 1).unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn unknown_toolset_is_distinguishable() {
        let group = group();
        let err = group.enable_toolset("nonexistent").expect_err("unknown");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "toolset nonexistent does not exist");
        assert!(group.get_toolset("nonexistent").unwrap_err().is_not_found());
        assert!(
            group
                .available_capabilities("nonexistent")
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn bulk_enable_policies() {
        let group = group();
        let err = group
            .enable_toolsets(&["nonexistent"], UnknownToolsetPolicy::Strict)
            .expect_err("strict");
        assert!(err.is_not_found());

        group
            .enable_toolsets(&["nonexistent"], UnknownToolsetPolicy::Lenient)
            .expect("lenient");
        assert!(group.list_toolsets().iter().all(|info| !info.enabled));
    }

    #[test]
    fn strict_bulk_enable_stops_at_first_unknown() {
        let group = group();
        let err = group
            .enable_toolsets(&["alerts", "bogus", "issues"], UnknownToolsetPolicy::Strict)
            .expect_err("strict");
        assert!(err.is_not_found());
        assert!(group.is_enabled("alerts"));
        assert!(!group.is_enabled("issues"));
    }

    #[test]
    fn all_is_position_independent_and_sticky() {
        for names in [vec!["all", "issues"], vec!["issues", "all"]] {
            let group = group();
            group
                .enable_toolsets(names.as_slice(), UnknownToolsetPolicy::Strict)
                .unwrap();
            assert!(group.is_everything_enabled());
            assert!(group.list_toolsets().iter().all(|info| info.enabled));
            assert!(group.get_toolset("alerts").unwrap().is_enabled());

            group.add_toolset(toolset("late"));
            assert!(group.is_enabled("late"));
            assert!(group.get_toolset("late").unwrap().is_enabled());
            assert_eq!(
                group.enable_toolset("late").unwrap(),
                EnableOutcome::AlreadyEnabled
            );
        }
    }

    #[test]
    fn global_lockdown_applies_on_insert() {
        let group = ToolsetGroup::new(true);
        group.add_toolset(toolset("issues"));
        group.enable_toolset("issues").unwrap();

        let toolset = group.get_toolset("issues").unwrap();
        assert!(toolset.is_read_only());
        let active = group.active_capabilities();
        assert_eq!(active.len(), 1);
        assert!(active.iter().all(|c| c.safety() == Safety::ReadOnly));
    }

    #[test]
    fn duplicate_capability_names_are_detected() {
        let group = group();
        group.add_toolset(
            Toolset::new("copy", "duplicates issues")
                .add_read_capabilities([capability("get_issues", Safety::ReadOnly)])
                .unwrap(),
        );
        let err = group.validate_unique_names(&[]).expect_err("duplicate");
        assert!(matches!(err, ToolsetError::DuplicateCapability { ref name, .. } if name == "get_issues"));

        let single = ToolsetGroup::default();
        single.add_toolset(toolset("issues"));
        assert!(single.validate_unique_names(&["get_issues"]).is_err());
        assert!(single.validate_unique_names(&["enable_toolset"]).is_ok());
    }

    #[test]
    fn listing_is_sorted_and_describes_toolsets() {
        let listing = group().list_toolsets();
        let names: Vec<_> = listing.iter().map(|info| info.name.as_str()).collect();
        assert_eq!(names, vec!["alerts", "issues"]);
        assert_eq!(listing[1].description, "issues toolset");
    }
}
