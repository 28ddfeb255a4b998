//! # Save Games
//!
//! The persisted payload and where it is kept.
//!
//! A save holds the full chunk store so visited chunks come back exactly as
//! they were; regenerating them would break edge matching with neighbors
//! that were restored from disk.

use crate::game::{Cell, CharacterClass, ChunkCoord, ChunkStore, Player};
use crate::{WayfarerError, WayfarerResult};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Everything needed to resume a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Coordinate of the active chunk
    pub coord: ChunkCoord,
    /// Player, including the position inside the active chunk
    pub player: Player,
    /// Defeated spawn indices per chunk
    #[serde(default)]
    pub defeated: Vec<(ChunkCoord, Vec<usize>)>,
    pub chunks: ChunkStore,
}

impl SaveData {
    /// Checks that the payload can be restored without corrupting state.
    pub fn validate(&self) -> WayfarerResult<()> {
        if self.version != SAVE_VERSION {
            return Err(WayfarerError::InvalidSave(format!(
                "unsupported save version {}",
                self.version
            )));
        }

        let chunk = self.chunks.get(self.coord).ok_or_else(|| {
            WayfarerError::InvalidSave(format!("active chunk {} missing from save", self.coord))
        })?;
        if !chunk.in_bounds(self.player.position) {
            return Err(WayfarerError::InvalidSave(format!(
                "player position ({}, {}) outside chunk {}",
                self.player.position.x, self.player.position.y, self.coord
            )));
        }

        if chunk.cell(self.player.position) != Some(Cell::Floor) {
            return Err(WayfarerError::InvalidSave(format!(
                "player stands on {:?} at ({}, {})",
                chunk.cell(self.player.position),
                self.player.position.x,
                self.player.position.y
            )));
        }

        for (coord, chunk) in self.chunks.iter() {
            if !chunk.is_well_formed() {
                return Err(WayfarerError::InvalidSave(format!(
                    "chunk {coord} layout does not match its dimensions"
                )));
            }
        }

        let stats = &self.player.stats;
        if stats.hp == 0 || stats.hp > stats.max_hp || stats.mp > stats.max_mp {
            return Err(WayfarerError::InvalidSave(
                "player stats out of range".to_string(),
            ));
        }

        let class_name = &self.player.class_name;
        if !CharacterClass::roster()
            .iter()
            .any(|class| &class.name == class_name)
        {
            return Err(WayfarerError::InvalidSave(format!(
                "unknown class '{class_name}'"
            )));
        }
        if let Some(item) = self.player.inventory.items().iter().find(|item| item.count == 0) {
            return Err(WayfarerError::InvalidSave(format!(
                "empty inventory stack '{}'",
                item.name
            )));
        }
        Ok(())
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> WayfarerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a save.
    pub fn from_json(json: &str) -> WayfarerResult<Self> {
        let save: SaveData = serde_json::from_str(json)?;
        save.validate()?;
        Ok(save)
    }
}

/// Where saves are kept.
pub trait SaveStore {
    fn exists(&self) -> bool;
    fn write(&self, save: &SaveData) -> WayfarerResult<()>;
    /// Reads and validates the stored save.
    fn read(&self) -> WayfarerResult<SaveData>;
}

/// A single JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSaveStore {
    path: PathBuf,
}

impl FileSaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileSaveStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn write(&self, save: &SaveData) -> WayfarerResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Replaced atomically: write a sibling file, then rename over the save.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, save.to_json()?)?;
        std::fs::rename(&tmp, &self.path)?;
        log::debug!("Saved game to {}", self.path.display());
        Ok(())
    }

    fn read(&self) -> WayfarerResult<SaveData> {
        let json = std::fs::read_to_string(&self.path)?;
        SaveData::from_json(&json)
    }
}

/// In-memory store holding raw JSON, for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemorySaveStore {
    json: RefCell<Option<String>>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with arbitrary text, valid or not.
    pub fn with_raw(json: impl Into<String>) -> Self {
        Self {
            json: RefCell::new(Some(json.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.json.borrow().clone()
    }
}

impl SaveStore for MemorySaveStore {
    fn exists(&self) -> bool {
        self.json.borrow().is_some()
    }

    fn write(&self, save: &SaveData) -> WayfarerResult<()> {
        *self.json.borrow_mut() = Some(save.to_json()?);
        Ok(())
    }

    fn read(&self) -> WayfarerResult<SaveData> {
        let json = self
            .json
            .borrow()
            .clone()
            .ok_or_else(|| WayfarerError::InvalidSave("no save present".to_string()))?;
        SaveData::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{CharacterClass, Chunk, Position};

    fn sample() -> SaveData {
        let mut chunks = ChunkStore::new();
        chunks.put(ChunkCoord::origin(), Chunk::fallback(20, 15, "Starter Valley"));
        chunks.put(ChunkCoord::new(1, 0), Chunk::new(20, 15, "Sand Dunes"));
        let mut player = Player::new(&CharacterClass::roster()[0], 50);
        player.position = Position::new(3, 4);
        player.score = 42;
        SaveData {
            version: SAVE_VERSION,
            coord: ChunkCoord::new(1, 0),
            player,
            defeated: vec![(ChunkCoord::new(1, 0), vec![2])],
            chunks,
        }
    }

    #[test]
    fn test_json_round_trip_keeps_store() {
        let save = sample();
        let restored = SaveData::from_json(&save.to_json().unwrap()).unwrap();
        assert_eq!(restored, save);
        assert_eq!(restored.chunks.len(), 2);
    }

    #[test]
    fn test_missing_active_chunk_is_rejected() {
        let mut save = sample();
        save.coord = ChunkCoord::new(5, 5);
        assert!(matches!(save.validate(), Err(WayfarerError::InvalidSave(_))));
    }

    #[test]
    fn test_dead_player_is_rejected() {
        let mut save = sample();
        save.player.stats.hp = 0;
        assert!(save.validate().is_err());
    }

    #[test]
    fn test_garbage_is_a_serde_error() {
        let store = MemorySaveStore::with_raw("{ not json");
        assert!(store.exists());
        assert!(matches!(store.read(), Err(WayfarerError::Serde(_))));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSaveStore::new(dir.path().join("saves").join("slot.json"));
        assert!(!store.exists());

        store.write(&sample()).unwrap();
        assert!(store.exists());
        assert_eq!(store.read().unwrap().player.score, 42);
    }
}
