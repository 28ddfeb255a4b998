//! # Scene Management System
//!
//! Game modes, the rules for moving between them, and the async driver that
//! connects a [`Session`] to a content generator and a save store.
//!
//! The session itself stays synchronous. [`SceneManager`] forwards input,
//! queues whatever requests come back, and fulfils them when
//! [`SceneManager::pump`] is awaited, so a front end can draw the provisional
//! state (a loading screen, an NPC's greeting) before the slow work finishes.

use crate::game::{GameEvent, Request, SaveStore, Session, TurnReport};
use crate::generation::ContentGenerator;
use crate::input::Action;
use crate::{WayfarerError, WayfarerResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// The active game-level mode. Exactly one is current at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Boot,
    Title,
    ClassSelect,
    /// Waiting for a chunk; player turns are blocked
    Loading,
    Playing,
    Inventory,
    Dialogue,
    Shop,
    /// Non-destructive world map overlay
    Map,
    LevelUp,
    GameOver,
}

impl GameMode {
    /// Whether moving from `self` to `next` is legal.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::GameMode;
    ///
    /// assert!(GameMode::Playing.can_transition_to(GameMode::Map));
    /// assert!(GameMode::Dialogue.can_transition_to(GameMode::Shop));
    /// assert!(!GameMode::Map.can_transition_to(GameMode::Shop));
    /// ```
    pub fn can_transition_to(self, next: GameMode) -> bool {
        use GameMode::*;
        match self {
            Boot => next == Title,
            Title => matches!(next, ClassSelect | Loading | Playing),
            ClassSelect => matches!(next, Loading | Title),
            Loading => matches!(next, Playing | Loading),
            Playing => matches!(
                next,
                Loading | Inventory | Dialogue | Map | LevelUp | GameOver
            ),
            Inventory => matches!(next, Playing),
            Dialogue => matches!(next, Playing | Shop),
            Shop => matches!(next, Playing),
            Map => matches!(next, Playing),
            LevelUp => matches!(next, Playing),
            GameOver => matches!(next, Title | ClassSelect),
        }
    }

    /// Whether the turn engine runs in this mode.
    pub fn is_playing(self) -> bool {
        self == GameMode::Playing
    }

    /// Upper-case label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            GameMode::Boot => "BOOT",
            GameMode::Title => "TITLE",
            GameMode::ClassSelect => "CLASS_SELECT",
            GameMode::Loading => "LOADING",
            GameMode::Playing => "PLAYING",
            GameMode::Inventory => "INVENTORY",
            GameMode::Dialogue => "DIALOGUE",
            GameMode::Shop => "SHOP",
            GameMode::Map => "MAP",
            GameMode::LevelUp => "LEVEL_UP",
            GameMode::GameOver => "GAME_OVER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledTransition {
    to: GameMode,
    remaining_ms: u64,
}

/// Current mode plus at most one delayed transition.
///
/// Delayed transitions are cosmetic; they are resolved by [`ModeMachine::tick`]
/// and dropped if an explicit transition happens first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeMachine {
    current: GameMode,
    scheduled: Option<ScheduledTransition>,
}

impl ModeMachine {
    /// Starts on the boot screen, scheduled to reach the title.
    pub fn new(boot_delay_ms: u64) -> Self {
        Self {
            current: GameMode::Boot,
            scheduled: Some(ScheduledTransition {
                to: GameMode::Title,
                remaining_ms: boot_delay_ms,
            }),
        }
    }

    pub fn current(&self) -> GameMode {
        self.current
    }

    /// Mode a pending delayed transition will move to, if any.
    pub fn scheduled(&self) -> Option<GameMode> {
        self.scheduled.map(|scheduled| scheduled.to)
    }

    /// Moves to `to` immediately, returning the previous mode.
    pub fn transition(&mut self, to: GameMode) -> WayfarerResult<GameMode> {
        let from = self.current;
        if from == to {
            return Ok(from);
        }
        if !from.can_transition_to(to) {
            return Err(WayfarerError::InvalidState(format!(
                "illegal mode transition {} -> {}",
                from.label(),
                to.label()
            )));
        }
        self.current = to;
        self.scheduled = None;
        Ok(from)
    }

    /// Arranges a transition after `delay_ms` of ticks.
    pub fn schedule(&mut self, to: GameMode, delay_ms: u64) {
        self.scheduled = Some(ScheduledTransition {
            to,
            remaining_ms: delay_ms,
        });
    }

    /// Advances the delay. Returns the new mode if the transition fired.
    pub fn tick(&mut self, dt_ms: u64) -> Option<GameMode> {
        let scheduled = self.scheduled.as_mut()?;
        scheduled.remaining_ms = scheduled.remaining_ms.saturating_sub(dt_ms);
        if scheduled.remaining_ms > 0 {
            return None;
        }

        let to = scheduled.to;
        self.scheduled = None;
        match self.transition(to) {
            Ok(from) if from != to => Some(to),
            Ok(_) => None,
            Err(err) => {
                log::debug!("Dropped scheduled transition: {}", err);
                None
            }
        }
    }
}

/// Async driver tying a session to its external collaborators.
pub struct SceneManager<G: ContentGenerator, S: SaveStore> {
    session: Session,
    generator: G,
    saves: S,
    pending: VecDeque<Request>,
    timeout: Duration,
}

impl<G: ContentGenerator, S: SaveStore> SceneManager<G, S> {
    /// Creates a driver. The title screen's continue entry follows whether
    /// the store already holds a save.
    pub fn new(mut session: Session, generator: G, saves: S) -> Self {
        session.set_has_save(saves.exists());
        let timeout = Duration::from_millis(session.rules.generation_timeout_ms);
        log::info!(
            "Scene manager ready with {} generator",
            generator.generator_type()
        );
        Self {
            session,
            generator,
            saves,
            pending: VecDeque::new(),
            timeout,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn saves(&self) -> &S {
        &self.saves
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Requests still waiting for [`SceneManager::pump`].
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Feeds one action to the session. Requests are queued, not fulfilled.
    pub fn dispatch(&mut self, action: Action) -> WayfarerResult<Vec<GameEvent>> {
        let report = self.session.handle_input(action)?;
        Ok(self.absorb(report))
    }

    /// Advances cosmetic timers.
    pub fn tick(&mut self, dt_ms: u64) -> Vec<GameEvent> {
        let report = self.session.tick(dt_ms);
        self.absorb(report)
    }

    /// Fulfils queued requests until none are left.
    pub async fn pump(&mut self) -> WayfarerResult<Vec<GameEvent>> {
        let mut events = Vec::new();
        while let Some(request) = self.pending.pop_front() {
            let report = self.fulfil(request).await?;
            events.extend(self.absorb(report));
        }
        Ok(events)
    }

    /// Dispatches an action and fulfils everything it asked for.
    pub async fn step(&mut self, action: Action) -> WayfarerResult<Vec<GameEvent>> {
        let mut events = self.dispatch(action)?;
        events.extend(self.pump().await?);
        Ok(events)
    }

    fn absorb(&mut self, report: TurnReport) -> Vec<GameEvent> {
        self.pending.extend(report.requests);
        report.events
    }

    async fn fulfil(&mut self, request: Request) -> WayfarerResult<TurnReport> {
        match request {
            Request::GenerateChunk(request) => {
                let result = match tokio::time::timeout(
                    self.timeout,
                    self.generator.generate_chunk(request.coord, &request.openings),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(WayfarerError::GenerationFailed(format!(
                        "chunk {} timed out after {} ms",
                        request.coord,
                        self.timeout.as_millis()
                    ))),
                };
                self.session.complete_chunk_load(request.ticket, result)
            }
            Request::GenerateDialogue(request) => {
                let result = match tokio::time::timeout(
                    self.timeout,
                    self.generator.generate_dialogue(
                        &request.npc,
                        &request.class_name,
                        &request.biome_name,
                    ),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(WayfarerError::LldmError("dialogue timed out".to_string())),
                };
                Ok(self.session.complete_dialogue(request.ticket, result))
            }
            Request::Save(save) => match self.saves.write(&save) {
                Ok(()) => Ok(TurnReport::default()),
                Err(err) => Ok(self.session.report_save_failure(&err)),
            },
            Request::Load => {
                let restored = self
                    .saves
                    .read()
                    .and_then(|save| self.session.restore(save));
                match restored {
                    Ok(report) => Ok(report),
                    Err(err) => Ok(self.session.report_load_failure(&err)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_schedules_title() {
        let mut modes = ModeMachine::new(2000);
        assert_eq!(modes.scheduled(), Some(GameMode::Title));
        assert_eq!(modes.tick(1999), None);
        assert_eq!(modes.tick(1), Some(GameMode::Title));
        assert_eq!(modes.current(), GameMode::Title);
    }

    #[test]
    fn test_illegal_transition_is_rejected() {
        let mut modes = ModeMachine::new(0);
        let err = modes.transition(GameMode::Shop).unwrap_err();
        assert!(matches!(err, WayfarerError::InvalidState(_)));
        assert_eq!(modes.current(), GameMode::Boot);
    }

    #[test]
    fn test_explicit_transition_cancels_schedule() {
        let mut modes = ModeMachine::new(500);
        modes.transition(GameMode::Title).unwrap();
        assert_eq!(modes.scheduled(), None);
        assert_eq!(modes.tick(1000), None);
    }

    #[test]
    fn test_every_overlay_returns_to_playing() {
        for mode in [
            GameMode::Inventory,
            GameMode::Dialogue,
            GameMode::Shop,
            GameMode::Map,
            GameMode::LevelUp,
        ] {
            assert!(mode.can_transition_to(GameMode::Playing), "{mode:?}");
        }
        assert!(!GameMode::GameOver.can_transition_to(GameMode::Playing));
    }
}
