//! # Input Module
//!
//! Abstract action tokens, key bindings for the terminal front end, and the
//! debouncer that keeps one physical press from becoming several turns.

use crate::config::INPUT_DEBOUNCE_MS;
use crate::{WayfarerError, WayfarerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A device-independent input, modelled on a handheld's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Confirm, talk, use ability (the A button)
    Primary,
    /// Cancel, back, inventory (the B button)
    Secondary,
    /// Pause and save
    Start,
    /// Map toggle
    Select,
}

impl Action {
    pub fn all() -> [Action; 8] {
        [
            Action::Up,
            Action::Down,
            Action::Left,
            Action::Right,
            Action::Primary,
            Action::Secondary,
            Action::Start,
            Action::Select,
        ]
    }

    pub fn is_movement(self) -> bool {
        matches!(self, Action::Up | Action::Down | Action::Left | Action::Right)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Primary => "primary",
            Action::Secondary => "secondary",
            Action::Start => "start",
            Action::Select => "select",
        };
        f.write_str(name)
    }
}

impl FromStr for Action {
    type Err = WayfarerError;

    /// Parses an action by name, e.g. `"primary"` or `"select"`.
    fn from_str(s: &str) -> WayfarerResult<Self> {
        Action::all()
            .into_iter()
            .find(|action| action.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WayfarerError::InvalidAction(format!("unknown action '{s}'")))
    }
}

/// Maps typed keys to actions for the terminal front end.
///
/// # Examples
///
/// ```
/// use wayfarer::{Action, InputHandler};
///
/// let input = InputHandler::new();
/// assert_eq!(input.map_key("w"), Some(Action::Up));
/// assert_eq!(input.map_key("k"), Some(Action::Up));
/// assert_eq!(input.map_key("start"), Some(Action::Start));
/// assert_eq!(input.map_key("?"), None);
/// ```
#[derive(Debug, Clone)]
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Maps one key or action name to an action.
    pub fn map_key(&self, key: &str) -> Option<Action> {
        let key = key.trim().to_ascii_lowercase();
        let action = match key.as_str() {
            "w" => Action::Up,
            "s" => Action::Down,
            "a" => Action::Left,
            "d" => Action::Right,
            "z" | "e" | " " | "space" => Action::Primary,
            "x" | "q" | "esc" => Action::Secondary,
            "enter" | "p" => Action::Start,
            "m" | "tab" => Action::Select,
            "h" if self.vi_keys_enabled => Action::Left,
            "j" if self.vi_keys_enabled => Action::Down,
            "k" if self.vi_keys_enabled => Action::Up,
            "l" if self.vi_keys_enabled => Action::Right,
            other => return other.parse().ok(),
        };
        Some(action)
    }

    /// Maps a typed line; each character is a key, so `"dddw"` is four moves.
    /// A whole-word action name is accepted as a single action.
    pub fn map_line(&self, line: &str) -> Vec<Action> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return vec![Action::Start];
        }
        if let Some(action) = self.map_key(trimmed).filter(|_| trimmed.len() > 1) {
            return vec![action];
        }
        trimmed
            .chars()
            .filter_map(|c| self.map_key(&c.to_string()))
            .collect()
    }
}

/// Drops inputs arriving faster than the minimum interval.
///
/// # Examples
///
/// ```
/// use wayfarer::InputDebouncer;
///
/// let mut debouncer = InputDebouncer::new(130);
/// assert!(debouncer.accept(0));
/// assert!(!debouncer.accept(100));
/// assert!(debouncer.accept(130));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDebouncer {
    interval_ms: u64,
    last_accepted: Option<u64>,
}

impl InputDebouncer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_accepted: None,
        }
    }

    /// Returns true if an input at `now_ms` should be processed.
    pub fn accept(&mut self, now_ms: u64) -> bool {
        match self.last_accepted {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_accepted = Some(now_ms);
                true
            }
        }
    }

    /// Reserves the next free slot for an input that must not be dropped,
    /// such as the rest of a batched line. Returns how long to wait before
    /// processing it; inputs arriving before that slot are rejected.
    pub fn pace(&mut self, now_ms: u64) -> u64 {
        let slot = match self.last_accepted {
            Some(last) => now_ms.max(last + self.interval_ms),
            None => now_ms,
        };
        self.last_accepted = Some(slot);
        slot - now_ms
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

impl Default for InputDebouncer {
    fn default() -> Self {
        Self::new(INPUT_DEBOUNCE_MS)
    }
}
