//! # Game Events
//!
//! Everything that happened during one dispatch, in order. Render and audio
//! front ends consume these instead of observing state changes.

use crate::game::{ChunkCoord, Position};
use crate::scenes::GameMode;
use serde::{Deserialize, Serialize};

/// How prominently a message should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageImportance {
    Info,
    Important,
    Critical,
}

/// Something that happened during a turn cascade or a menu action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ModeChanged {
        from: GameMode,
        to: GameMode,
    },
    PlayerMoved {
        from: Position,
        to: Position,
    },
    /// Movement into a blocking cell
    Bumped {
        at: Position,
    },
    ChunkActivated {
        coord: ChunkCoord,
        entry: Position,
    },
    EnemyDamaged {
        enemy_id: String,
        damage: i32,
        critical: bool,
        source: String,
    },
    EnemyDied {
        enemy_id: String,
        name: String,
        xp: u32,
        score: u32,
    },
    LootDropped {
        at: Position,
    },
    PlayerDamaged {
        amount: u32,
        reason: String,
    },
    Dodged {
        enemy_id: String,
    },
    Regenerated {
        hp: u32,
        mp: u32,
    },
    ItemGained {
        name: String,
    },
    ItemUsed {
        name: String,
    },
    GoldGained {
        amount: u32,
    },
    LeveledUp {
        level: u32,
    },
    QuestAccepted {
        quest_id: String,
    },
    QuestCompleted {
        quest_id: String,
    },
    Purchased {
        name: String,
        cost: u32,
    },
    AbilityUsed {
        name: String,
        targets: usize,
    },
    Saved,
    Message {
        text: String,
        importance: MessageImportance,
    },
}

impl GameEvent {
    /// Shorthand for an informational message.
    pub fn info(text: impl Into<String>) -> Self {
        GameEvent::Message {
            text: text.into(),
            importance: MessageImportance::Info,
        }
    }
}
