//! # Session State
//!
//! Central game state and the dispatch of abstract input actions.
//!
//! [`Session`] owns everything mutable: the chunk store, the active chunk's
//! live enemies and NPCs, the player, menu cursors and the mode machine. It
//! never performs I/O. Work that needs the outside world is returned as a
//! [`Request`] in the [`TurnReport`] of the dispatch that caused it, and the
//! results come back through [`Session::complete_chunk_load`],
//! [`Session::complete_dialogue`] and [`Session::restore`].

use crate::config::{RulesConfig, DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y};
use crate::game::{
    CharacterClass, Chunk, ChunkCoord, ChunkStore, Dialogue, Direction, Enemy, GameEvent,
    InventoryItem, MessageImportance, NpcSpawn, Player, Position, SaveData, SAVE_VERSION,
};
use crate::generation::{biome_name, enforce, required_openings, spawn_enemies, EdgeOpenings};
use crate::input::Action;
use crate::scenes::{GameMode, ModeMachine};
use crate::{WayfarerError, WayfarerResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Work the session needs from the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Produce content for a chunk, then call [`Session::complete_chunk_load`]
    GenerateChunk(ChunkRequest),
    /// Produce a chat line, then call [`Session::complete_dialogue`]
    GenerateDialogue(DialogueRequest),
    /// Persist this payload
    Save(Box<SaveData>),
    /// Read the stored save and hand it to [`Session::restore`]
    Load,
}

/// A pending chunk generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRequest {
    pub ticket: u64,
    pub coord: ChunkCoord,
    pub openings: EdgeOpenings,
}

/// A pending dialogue line.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueRequest {
    pub ticket: u64,
    pub npc: NpcSpawn,
    pub class_name: String,
    pub biome_name: String,
}

/// Everything one dispatch produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    pub events: Vec<GameEvent>,
    pub requests: Vec<Request>,
}

impl TurnReport {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.requests.is_empty()
    }

    /// Appends another report's contents.
    pub fn merge(&mut self, other: TurnReport) {
        self.events.extend(other.events);
        self.requests.extend(other.requests);
    }
}

/// Menu cursor positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursors {
    /// 0 = new game, 1 = continue
    pub title: usize,
    pub class: usize,
    pub inventory: usize,
    pub shop: usize,
    /// 0 grit, 1 agility, 2 will, 3 wisdom
    pub level_up: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingLoad {
    ticket: u64,
    coord: ChunkCoord,
    entry: Option<Position>,
}

/// Read-only view for render and audio front ends.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub mode: GameMode,
    pub coord: ChunkCoord,
    pub chunk: Option<&'a Chunk>,
    /// Every visited chunk, for the world map
    pub store: &'a ChunkStore,
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub npcs: &'a [NpcSpawn],
    pub message: &'a str,
    pub dialogue: Option<&'a Dialogue>,
    pub shop_items: &'a [InventoryItem],
    pub classes: &'a [CharacterClass],
    pub cursors: Cursors,
    pub has_save: bool,
    pub turn_number: u64,
}

/// The whole mutable game.
///
/// # Examples
///
/// ```
/// use wayfarer::{Action, GameMode, Request, RulesConfig, Session};
///
/// let mut session = Session::new(RulesConfig::default(), 42).unwrap();
/// session.tick(2_000);
/// assert_eq!(session.mode(), GameMode::Title);
///
/// session.handle_input(Action::Start).unwrap(); // new game
/// let report = session.handle_input(Action::Start).unwrap(); // pick class
/// assert_eq!(session.mode(), GameMode::Loading);
/// assert!(matches!(report.requests[0], Request::GenerateChunk(_)));
/// ```
#[derive(Debug)]
pub struct Session {
    pub rules: RulesConfig,
    pub modes: ModeMachine,
    pub store: ChunkStore,
    /// Coordinate of the active chunk
    pub coord: ChunkCoord,
    pub enemies: Vec<Enemy>,
    pub npcs: Vec<NpcSpawn>,
    pub player: Player,
    pub classes: Vec<CharacterClass>,
    pub cursors: Cursors,
    pub has_save: bool,
    pub dialogue: Option<Dialogue>,
    pub shop_items: Vec<InventoryItem>,
    pub message: String,
    /// Spawn indices slain per chunk, honored when persistence is enabled
    pub defeated: BTreeMap<ChunkCoord, BTreeSet<usize>>,
    pub turn_number: u64,
    pending_load: Option<PendingLoad>,
    next_ticket: u64,
    pub(crate) rng: StdRng,
    events: Vec<GameEvent>,
    requests: Vec<Request>,
}

impl Session {
    /// Creates a session sitting on the boot screen.
    ///
    /// Fails with [`WayfarerError::InvalidConfig`] when the rules are out of
    /// range.
    pub fn new(rules: RulesConfig, seed: u64) -> WayfarerResult<Self> {
        rules.validate()?;
        let classes = CharacterClass::roster();
        let player = Player::new(&classes[0], rules.starting_xp_to_next);
        Ok(Self {
            modes: ModeMachine::new(rules.boot_delay_ms),
            rules,
            store: ChunkStore::new(),
            coord: ChunkCoord::origin(),
            enemies: Vec::new(),
            npcs: Vec::new(),
            player,
            classes,
            cursors: Cursors::default(),
            has_save: false,
            dialogue: None,
            shop_items: Vec::new(),
            message: String::new(),
            defeated: BTreeMap::new(),
            turn_number: 0,
            pending_load: None,
            next_ticket: 0,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
            requests: Vec::new(),
        })
    }

    pub fn mode(&self) -> GameMode {
        self.modes.current()
    }

    /// Marks whether a save exists, enabling the title screen's continue entry.
    pub fn set_has_save(&mut self, has_save: bool) {
        self.has_save = has_save;
        if !has_save {
            self.cursors.title = 0;
        }
    }

    /// The active chunk, if one has been activated.
    pub fn active_chunk(&self) -> Option<&Chunk> {
        self.store.get(self.coord)
    }

    pub(crate) fn active_chunk_mut(&mut self) -> Option<&mut Chunk> {
        self.store.get_mut(self.coord)
    }

    /// Coordinate of the chunk currently being generated.
    pub fn loading_coord(&self) -> Option<ChunkCoord> {
        self.pending_load.as_ref().map(|pending| pending.coord)
    }

    /// Read-only view of everything a front end draws.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            mode: self.mode(),
            coord: self.coord,
            chunk: self.active_chunk(),
            store: &self.store,
            player: &self.player,
            enemies: &self.enemies,
            npcs: &self.npcs,
            message: &self.message,
            dialogue: self.dialogue.as_ref(),
            shop_items: &self.shop_items,
            classes: &self.classes,
            cursors: self.cursors,
            has_save: self.has_save,
            turn_number: self.turn_number,
        }
    }

    /// Dispatches one abstract action to the handler of the current mode.
    pub fn handle_input(&mut self, action: Action) -> WayfarerResult<TurnReport> {
        let mode = self.mode();

        if action == Action::Select && matches!(mode, GameMode::Playing | GameMode::Map) {
            let next = if mode == GameMode::Playing {
                GameMode::Map
            } else {
                GameMode::Playing
            };
            self.set_mode(next)?;
            return Ok(self.take_report());
        }

        match mode {
            GameMode::Boot | GameMode::Loading => {}
            GameMode::Title => self.handle_title_input(action)?,
            GameMode::ClassSelect => self.handle_class_input(action)?,
            GameMode::Playing => self.handle_playing_input(action)?,
            GameMode::Inventory => self.handle_inventory_input(action)?,
            GameMode::Dialogue => self.handle_dialogue_input(action)?,
            GameMode::Shop => self.handle_shop_input(action)?,
            GameMode::Map => {
                if action == Action::Secondary {
                    self.set_mode(GameMode::Playing)?;
                }
            }
            GameMode::LevelUp => self.handle_level_up_input(action)?,
            GameMode::GameOver => {
                if action == Action::Start {
                    self.set_mode(GameMode::Title)?;
                }
            }
        }

        Ok(self.take_report())
    }

    /// Advances cosmetic timers: hit flashes and scheduled mode changes.
    pub fn tick(&mut self, dt_ms: u64) -> TurnReport {
        for enemy in &mut self.enemies {
            if let Some(remaining) = enemy.flash {
                enemy.flash = remaining.checked_sub(dt_ms).filter(|left| *left > 0);
            }
        }

        let from = self.mode();
        if let Some(to) = self.modes.tick(dt_ms) {
            self.events.push(GameEvent::ModeChanged { from, to });
        }
        self.take_report()
    }

    fn handle_title_input(&mut self, action: Action) -> WayfarerResult<()> {
        match action {
            Action::Up | Action::Down => {
                if self.has_save {
                    self.cursors.title = 1 - self.cursors.title.min(1);
                }
            }
            Action::Start | Action::Primary => {
                if self.cursors.title == 1 && self.has_save {
                    self.requests.push(Request::Load);
                } else {
                    self.set_mode(GameMode::ClassSelect)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_class_input(&mut self, action: Action) -> WayfarerResult<()> {
        let count = self.classes.len().max(1);
        match action {
            Action::Down => self.cursors.class = (self.cursors.class + 1) % count,
            Action::Up => self.cursors.class = (self.cursors.class + count - 1) % count,
            Action::Start | Action::Primary => self.start_new_game()?,
            _ => {}
        }
        Ok(())
    }

    /// Seeds a fresh character from the selected class and loads the origin.
    pub fn start_new_game(&mut self) -> WayfarerResult<()> {
        let class = self
            .classes
            .get(self.cursors.class)
            .cloned()
            .ok_or_else(|| WayfarerError::InvalidState("no class selected".to_string()))?;

        log::info!("Starting new game as {}", class.name);
        self.player = Player::new(&class, self.rules.starting_xp_to_next);
        self.store = ChunkStore::new();
        self.defeated.clear();
        self.enemies.clear();
        self.npcs.clear();
        self.dialogue = None;
        self.shop_items.clear();
        self.cursors.inventory = 0;
        self.cursors.shop = 0;
        self.cursors.level_up = 0;
        self.turn_number = 0;
        self.coord = ChunkCoord::origin();

        self.begin_chunk_load(ChunkCoord::origin(), None)
    }

    /// Activates a cached chunk or asks for a new one.
    ///
    /// A second request for the coordinate already loading is dropped; a
    /// request for a different coordinate supersedes it.
    pub fn begin_chunk_load(
        &mut self,
        coord: ChunkCoord,
        entry: Option<Position>,
    ) -> WayfarerResult<()> {
        if self.store.contains(coord) {
            self.pending_load = None;
            return self.activate_chunk(coord, entry);
        }

        if let Some(pending) = &self.pending_load {
            if pending.coord == coord {
                log::debug!("Chunk {} already loading (ticket {})", coord, pending.ticket);
                return Ok(());
            }
            log::debug!(
                "Chunk {} supersedes pending load of {}",
                coord,
                pending.coord
            );
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let openings = required_openings(
            &self.store,
            coord,
            self.rules.chunk_width,
            self.rules.chunk_height,
        );
        self.pending_load = Some(PendingLoad {
            ticket,
            coord,
            entry,
        });
        self.set_mode(GameMode::Loading)?;
        self.say(format!("Exploring Sector {coord}..."));
        self.requests.push(Request::GenerateChunk(ChunkRequest {
            ticket,
            coord,
            openings,
        }));
        log::info!("Requested chunk {} (ticket {})", coord, ticket);
        Ok(())
    }

    /// Accepts a generator result. Stale tickets are ignored.
    ///
    /// A failed generation is replaced with the fallback chunk. Either way
    /// the chunk is edge-corrected, stored, activated and auto-saved.
    pub fn complete_chunk_load(
        &mut self,
        ticket: u64,
        result: WayfarerResult<Chunk>,
    ) -> WayfarerResult<TurnReport> {
        let pending = match &self.pending_load {
            Some(pending) if pending.ticket == ticket => pending.clone(),
            _ => {
                log::debug!("Ignoring stale chunk result (ticket {})", ticket);
                return Ok(TurnReport::default());
            }
        };
        self.pending_load = None;

        let (width, height) = (self.rules.chunk_width, self.rules.chunk_height);
        let mut chunk = match result {
            Ok(chunk) => chunk,
            Err(err) => {
                log::warn!("Chunk {} generation failed: {}", pending.coord, err);
                Chunk::fallback(width, height, biome_name(pending.coord))
            }
        };

        let openings = required_openings(&self.store, pending.coord, width, height);
        enforce(&mut chunk, &openings);
        self.store.put(pending.coord, chunk);
        self.activate_chunk(pending.coord, pending.entry)?;
        self.request_save();

        Ok(self.take_report())
    }

    /// Makes a stored chunk the active one and places the player on it.
    ///
    /// The entry point defaults to the spawn point, is clamped into the chunk
    /// and forced to floor; if an NPC stands there the nearest free floor
    /// cell is used instead.
    pub fn activate_chunk(
        &mut self,
        coord: ChunkCoord,
        entry: Option<Position>,
    ) -> WayfarerResult<()> {
        let chunk = self
            .store
            .get_mut(coord)
            .ok_or_else(|| WayfarerError::InvalidState(format!("chunk {coord} not in store")))?;

        let requested = entry.unwrap_or(Position::new(DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y));
        let mut spawn = Position::new(
            requested.x.clamp(0, chunk.width as i32 - 1),
            requested.y.clamp(0, chunk.height as i32 - 1),
        );
        if chunk.npc_spawns.iter().any(|npc| npc.position == spawn) {
            spawn = nearest_free_floor(chunk, spawn).unwrap_or(spawn);
        }
        if chunk.cell(spawn) != Some(crate::game::Cell::Floor) {
            chunk.set_cell(spawn, crate::game::Cell::Floor);
        }

        let chunk: &Chunk = chunk;
        let enemies = spawn_enemies(
            chunk,
            coord,
            self.player.stats.level,
            spawn,
            self.rules
                .persist_defeated_enemies
                .then(|| self.defeated.get(&coord))
                .flatten(),
            &self.rules,
            &mut self.rng,
        );
        let npcs = chunk.npc_spawns.clone();
        let flavor = chunk.flavor_text.clone();

        self.coord = coord;
        self.player.position = spawn;
        self.enemies = enemies;
        self.npcs = npcs;
        self.dialogue = None;
        self.events.push(GameEvent::ChunkActivated { coord, entry: spawn });
        self.say(flavor);
        self.set_mode(GameMode::Playing)?;
        log::info!("Entered chunk {} at ({}, {})", coord, spawn.x, spawn.y);
        Ok(())
    }

    /// Moves the player across the edge of the active chunk.
    pub(crate) fn transition_chunk(&mut self, direction: Direction) -> WayfarerResult<()> {
        let target = self.coord.neighbor(direction);
        let (width, height) = self
            .store
            .get(target)
            .map(|chunk| (chunk.width, chunk.height))
            .unwrap_or((self.rules.chunk_width, self.rules.chunk_height));
        let pos = self.player.position;
        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;

        let entry = match direction {
            Direction::West => Position::new(max_x, pos.y.clamp(0, max_y)),
            Direction::East => Position::new(0, pos.y.clamp(0, max_y)),
            Direction::North => Position::new(pos.x.clamp(0, max_x), max_y),
            Direction::South => Position::new(pos.x.clamp(0, max_x), 0),
        };
        self.begin_chunk_load(target, Some(entry))
    }

    /// Builds the save payload for the current game.
    pub fn save_data(&self) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            coord: self.coord,
            player: self.player.clone(),
            defeated: self
                .defeated
                .iter()
                .map(|(coord, indices)| (*coord, indices.iter().copied().collect()))
                .collect(),
            chunks: self.store.clone(),
        }
    }

    /// Queues an auto-save or manual save.
    pub(crate) fn request_save(&mut self) {
        self.requests
            .push(Request::Save(Box::new(self.save_data())));
        self.has_save = true;
        self.events.push(GameEvent::Saved);
    }

    /// Replaces the live game with a validated save.
    ///
    /// Nothing is touched unless the payload validates. The chunk store is
    /// restored before the saved coordinate is activated.
    pub fn restore(&mut self, save: SaveData) -> WayfarerResult<TurnReport> {
        save.validate()?;

        log::info!(
            "Restoring save at chunk {} with {} chunks",
            save.coord,
            save.chunks.len()
        );
        self.pending_load = None;
        self.store = save.chunks;
        self.defeated = save
            .defeated
            .into_iter()
            .map(|(coord, indices)| (coord, indices.into_iter().collect()))
            .collect();
        self.cursors.class = self
            .classes
            .iter()
            .position(|class| class.name == save.player.class_name)
            .unwrap_or(0);
        let position = save.player.position;
        self.player = save.player;
        self.shop_items.clear();
        self.cursors.inventory = 0;
        self.cursors.shop = 0;
        self.has_save = true;

        self.activate_chunk(save.coord, Some(position))?;
        Ok(self.take_report())
    }

    /// Reports a failed load on the title screen; live state is untouched.
    pub fn report_load_failure(&mut self, err: &WayfarerError) -> TurnReport {
        log::warn!("Refusing to load save: {}", err);
        self.say_with("Save data is corrupted.", MessageImportance::Critical);
        self.take_report()
    }

    /// Reports a failed write of a save payload.
    pub fn report_save_failure(&mut self, err: &WayfarerError) -> TurnReport {
        log::warn!("Save failed: {}", err);
        self.say_with("Save failed.", MessageImportance::Important);
        self.take_report()
    }

    pub(crate) fn set_mode(&mut self, to: GameMode) -> WayfarerResult<()> {
        let from = self.mode();
        if from == to {
            return Ok(());
        }
        self.modes.transition(to)?;
        self.events.push(GameEvent::ModeChanged { from, to });
        Ok(())
    }

    /// Schedules a delayed mode change.
    pub(crate) fn schedule_mode(&mut self, to: GameMode, delay_ms: u64) {
        self.modes.schedule(to, delay_ms);
    }

    pub(crate) fn next_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn push_request(&mut self, request: Request) {
        self.requests.push(request);
    }

    /// Shows a message and records it as an event.
    pub(crate) fn say(&mut self, text: impl Into<String>) {
        self.say_with(text, MessageImportance::Info);
    }

    pub(crate) fn say_with(&mut self, text: impl Into<String>, importance: MessageImportance) {
        let text = text.into();
        self.message = text.clone();
        self.events.push(GameEvent::Message { text, importance });
    }

    pub(crate) fn take_report(&mut self) -> TurnReport {
        TurnReport {
            events: std::mem::take(&mut self.events),
            requests: std::mem::take(&mut self.requests),
        }
    }
}

#[cfg(test)]
impl Session {
    /// A session already playing on an open 20x15 chunk at the origin.
    pub(crate) fn playing_for_tests(class_index: usize) -> Session {
        let mut session = Session::new(RulesConfig::for_testing(), 3).unwrap();
        session.cursors.class = class_index;
        session.tick(session.rules.boot_delay_ms);
        session.modes.transition(GameMode::ClassSelect).unwrap();
        session.start_new_game().unwrap();
        let ticket = session.next_ticket;
        session
            .complete_chunk_load(ticket, Ok(Chunk::new(20, 15, "Test")))
            .unwrap();
        session.take_report();
        session
    }
}

fn nearest_free_floor(chunk: &Chunk, from: Position) -> Option<Position> {
    let npc_cells: BTreeSet<(i32, i32)> = chunk
        .npc_spawns
        .iter()
        .map(|npc| (npc.position.x, npc.position.y))
        .collect();
    let mut best: Option<Position> = None;
    for y in 1..chunk.height.saturating_sub(1) {
        for x in 1..chunk.width.saturating_sub(1) {
            let pos = Position::new(x as i32, y as i32);
            if chunk.cell(pos) != Some(crate::game::Cell::Floor) || npc_cells.contains(&(pos.x, pos.y)) {
                continue;
            }
            if best
                .map(|b| pos.manhattan_distance(from) < b.manhattan_distance(from))
                .unwrap_or(true)
            {
                best = Some(pos);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Cell;

    fn booted() -> Session {
        let mut session = Session::new(RulesConfig::for_testing(), 7).unwrap();
        session.tick(session.rules.boot_delay_ms);
        session
    }

    fn chunk_ticket(report: &TurnReport) -> u64 {
        report
            .requests
            .iter()
            .find_map(|request| match request {
                Request::GenerateChunk(chunk) => Some(chunk.ticket),
                _ => None,
            })
            .expect("chunk request")
    }

    #[test]
    fn test_boot_advances_to_title() {
        let mut session = Session::new(RulesConfig::default(), 1).unwrap();
        assert_eq!(session.mode(), GameMode::Boot);
        session.tick(1_000);
        assert_eq!(session.mode(), GameMode::Boot);
        let report = session.tick(1_000);
        assert_eq!(session.mode(), GameMode::Title);
        assert!(report
            .events
            .contains(&GameEvent::ModeChanged { from: GameMode::Boot, to: GameMode::Title }));
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let rules = RulesConfig {
            chunk_width: 0,
            ..RulesConfig::for_testing()
        };
        assert!(matches!(
            Session::new(rules, 1),
            Err(WayfarerError::InvalidConfig(_))
        ));

        let rules = RulesConfig {
            chunk_height: 0,
            ..RulesConfig::for_testing()
        };
        assert!(Session::new(rules, 1).is_err());
    }

    #[test]
    fn test_title_cursor_requires_save() {
        let mut session = booted();
        session.handle_input(Action::Down).unwrap();
        assert_eq!(session.cursors.title, 0);

        session.set_has_save(true);
        session.handle_input(Action::Down).unwrap();
        assert_eq!(session.cursors.title, 1);
        let report = session.handle_input(Action::Primary).unwrap();
        assert_eq!(report.requests, vec![Request::Load]);
    }

    #[test]
    fn test_new_game_loads_origin_and_autosaves() {
        let mut session = booted();
        session.handle_input(Action::Start).unwrap();
        session.handle_input(Action::Down).unwrap();
        let report = session.handle_input(Action::Start).unwrap();
        assert_eq!(session.player.class_name, "MAGE");
        assert_eq!(session.mode(), GameMode::Loading);

        let ticket = chunk_ticket(&report);
        let report = session
            .complete_chunk_load(ticket, Ok(Chunk::new(20, 15, "Starter Valley")))
            .unwrap();
        assert_eq!(session.mode(), GameMode::Playing);
        assert_eq!(session.player.position, Position::new(10, 7));
        assert!(report.requests.iter().any(|r| matches!(r, Request::Save(_))));
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut session = booted();
        session.handle_input(Action::Start).unwrap();
        let report = session.handle_input(Action::Start).unwrap();
        let ticket = chunk_ticket(&report);

        let stale = session
            .complete_chunk_load(ticket + 10, Ok(Chunk::new(20, 15, "X")))
            .unwrap();
        assert!(stale.is_empty());
        assert_eq!(session.mode(), GameMode::Loading);
        assert!(session.store.is_empty());
    }

    #[test]
    fn test_failed_generation_uses_fallback() {
        let mut session = booted();
        session.handle_input(Action::Start).unwrap();
        let report = session.handle_input(Action::Start).unwrap();
        let ticket = chunk_ticket(&report);

        session
            .complete_chunk_load(
                ticket,
                Err(WayfarerError::GenerationFailed("offline".to_string())),
            )
            .unwrap();
        let chunk = session.active_chunk().unwrap();
        assert_eq!(chunk.flavor_text, "Connection lost. Using emergency map.");
        assert!(session.enemies.is_empty());
        assert_eq!(chunk.cell(session.player.position), Some(Cell::Floor));
    }

    #[test]
    fn test_duplicate_load_is_deduplicated() {
        let mut session = booted();
        session.handle_input(Action::Start).unwrap();
        session.handle_input(Action::Start).unwrap();

        session.begin_chunk_load(ChunkCoord::origin(), None).unwrap();
        assert!(session.take_report().requests.is_empty());

        session.begin_chunk_load(ChunkCoord::new(1, 0), None).unwrap();
        assert_eq!(session.loading_coord(), Some(ChunkCoord::new(1, 0)));
    }

    #[test]
    fn test_entry_on_wall_is_opened() {
        let mut session = booted();
        let mut chunk = Chunk::new(20, 15, "Test");
        chunk.set_cell(Position::new(10, 7), Cell::Wall);
        session.store.put(ChunkCoord::origin(), chunk);

        session.activate_chunk(ChunkCoord::origin(), None).unwrap();
        assert_eq!(
            session.active_chunk().unwrap().cell(Position::new(10, 7)),
            Some(Cell::Floor)
        );
    }
}
