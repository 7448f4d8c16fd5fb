//! Debounced autosave timing for hosts.
//!
//! The engine never saves on its own. A host feeds the session revision into
//! [`AutoSaveManager::observe_revision`] after each event and polls
//! [`AutoSaveManager::should_save`]; a save fires once edits have been quiet
//! for the debounce window.

use std::time::Duration;
use web_time::Instant;

use crate::config::AutoSaveConfig;

/// Tracks unsaved rectangle-set revisions and decides when to flush them.
#[derive(Debug)]
pub struct AutoSaveManager {
    /// Quiet period required after the last edit.
    debounce: Duration,

    /// Minimum spacing between two saves.
    min_interval: Duration,

    enabled: bool,

    /// Revision most recently written out.
    saved_revision: u64,

    /// Revision most recently observed.
    seen_revision: u64,

    last_change: Option<Instant>,
    last_save: Option<Instant>,
}

impl AutoSaveManager {
    /// Debounce used when none is configured.
    pub const DEFAULT_DEBOUNCE: Duration =
        Duration::from_millis(crate::constants::DEFAULT_AUTOSAVE_DEBOUNCE_MS);

    pub fn new() -> Self {
        Self {
            debounce: Self::DEFAULT_DEBOUNCE,
            min_interval: Duration::ZERO,
            enabled: true,
            saved_revision: 0,
            seen_revision: 0,
            last_change: None,
            last_save: None,
        }
    }

    pub fn from_config(config: &AutoSaveConfig) -> Self {
        let mut manager = Self::new().with_debounce(config.debounce());
        manager.enabled = config.enabled;
        manager
    }

    /// A manager that never asks for a save.
    pub fn disabled() -> Self {
        let mut manager = Self::new();
        manager.enabled = false;
        manager
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Record the current revision; a new value restarts the debounce window.
    pub fn observe_revision(&mut self, revision: u64) {
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.last_change = Some(Instant::now());
            log::trace!("Auto-save: revision {} pending", revision);
        }
    }

    /// Mark a change without a revision number.
    pub fn mark_dirty(&mut self) {
        self.observe_revision(self.seen_revision.wrapping_add(1));
    }

    pub fn is_dirty(&self) -> bool {
        self.seen_revision != self.saved_revision
    }

    pub fn should_save(&self) -> bool {
        self.should_save_at(Instant::now())
    }

    /// Whether a save is due at `now`.
    pub fn should_save_at(&self, now: Instant) -> bool {
        if !self.enabled || !self.is_dirty() {
            return false;
        }
        let Some(last_change) = self.last_change else {
            return false;
        };
        if now.saturating_duration_since(last_change) < self.debounce {
            return false;
        }
        match self.last_save {
            Some(last_save) => now.saturating_duration_since(last_save) >= self.min_interval,
            None => true,
        }
    }

    /// Record a successful save of everything observed so far.
    pub fn mark_saved(&mut self) {
        self.saved_revision = self.seen_revision;
        self.last_save = Some(Instant::now());
        self.last_change = None;
        log::debug!("💾 Auto-save: revision {} saved", self.saved_revision);
    }

    /// Record a failed save; changes stay pending.
    pub fn mark_save_failed(&mut self) {
        self.last_save = Some(Instant::now());
        log::warn!("Auto-save: save of revision {} failed", self.seen_revision);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::debug!("Auto-save: enabled = {}", enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Default for AutoSaveManager {
    fn default() -> Self {
        Self::new()
    }
}
