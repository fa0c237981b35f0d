//! Simulated user session
//!
//! A [`Session`] is one user in front of one document: it owns the keyboard
//! and pointer state, the clipboard, the behavior table and the settings that
//! shape every API call. The document itself is passed in by the caller, so
//! several sessions may take turns on the same [`Document`](crate::dom::Document).

use crate::config::SessionSettings;
use crate::event::{BehaviorTable, EventWrapper};
use crate::input::clipboard::{Clipboard, MemoryClipboard};
use crate::input::keyboard::KeyboardState;
use crate::input::keymap::KeyMap;
use crate::input::pointer::{PointerEventsGuard, PointerHost};
use crate::input::timing::ActionDelay;
use std::sync::Arc;
use tracing::debug;

/// One simulated user
pub struct Session {
    pub(crate) settings: SessionSettings,
    pub(crate) key_map: KeyMap,
    pub(crate) keyboard: KeyboardState,
    pub(crate) pointer: PointerHost,
    pub(crate) pointer_guard: PointerEventsGuard,
    pub(crate) behaviors: BehaviorTable,
    pub(crate) clipboard: Arc<dyn Clipboard>,
    pub(crate) delay: ActionDelay,
    pub(crate) event_wrapper: Option<EventWrapper>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.settings)
            .field("keyboard", &self.keyboard)
            .field("pointer", &self.pointer)
            .field("delay", &self.delay)
            .field("event_wrapper", &self.event_wrapper.is_some())
            .finish()
    }
}

impl Session {
    /// Creates a session with fresh device state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ki_user_event::config::SessionSettings;
    /// use ki_user_event::Session;
    ///
    /// let session = Session::new(SessionSettings::default().with_delay(None));
    /// assert!(session.keyboard().pressed_keys().is_empty());
    /// ```
    pub fn new(settings: SessionSettings) -> Self {
        debug!(
            delay_ms = ?settings.delay_ms,
            pointer_events_check = %settings.pointer_events_check,
            "new session"
        );
        Self {
            key_map: settings.build_key_map(),
            keyboard: KeyboardState::default(),
            pointer: PointerHost::default(),
            pointer_guard: PointerEventsGuard::new(settings.pointer_events_check),
            behaviors: BehaviorTable::default(),
            clipboard: Arc::new(MemoryClipboard::new()),
            delay: settings.action_delay(),
            event_wrapper: None,
            settings,
        }
    }

    /// Settings this session was created with
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    /// Clipboard shared by `copy`, `cut` and `paste`
    pub fn clipboard(&self) -> Arc<dyn Clipboard> {
        Arc::clone(&self.clipboard)
    }

    /// Default actions, for embedders that add or replace behavior
    pub fn behaviors_mut(&mut self) -> &mut BehaviorTable {
        &mut self.behaviors
    }

    pub fn delay(&self) -> &ActionDelay {
        &self.delay
    }

    /// Uses `clipboard` instead of the in-memory one.
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Wraps every listener invocation, e.g. to flush a test harness after
    /// each event.
    pub fn with_event_wrapper(mut self, wrapper: EventWrapper) -> Self {
        self.event_wrapper = Some(wrapper);
        self
    }

    /// Replaces the pause between steps derived from the settings.
    pub fn with_delay(mut self, delay: ActionDelay) -> Self {
        self.delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keymap::KeyDescriptor;
    use crate::input::pointer::PointerEventsCheck;

    #[test]
    fn test_session_from_settings() {
        let settings = SessionSettings::default()
            .with_delay(None)
            .with_pointer_events_check(PointerEventsCheck::Never)
            .with_key_map(vec![KeyDescriptor::new("q", "KeyQ", 81)]);
        let session = Session::new(settings);

        assert!(session.delay().next_duration().is_none());
        assert_eq!(session.pointer_guard.level(), PointerEventsCheck::Never);
        assert_eq!(session.key_map().keys().len(), 1);
        assert!(session.key_map().by_key("q").is_some());
    }

    #[tokio::test]
    async fn test_default_clipboard_is_shared() {
        let session = Session::default();
        session.clipboard().write_text("shared").await.unwrap();
        assert_eq!(session.clipboard().read_text().await.unwrap(), "shared");
    }
}
