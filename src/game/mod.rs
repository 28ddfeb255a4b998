//! # Game Module
//!
//! Core game state management, world representation, and the turn cascade.
//!
//! This module contains the fundamental building blocks of Wayfarer:
//! - Chunks, cells and the chunk store
//! - Player, enemies, inventory and character classes
//! - The session that owns all of it and resolves turns, combat,
//!   progression, quests and persistence

pub mod combat;
pub mod entities;
pub mod events;
pub mod progression;
pub mod quest;
pub mod save;
pub mod state;
pub mod store;
pub mod turn;
pub mod world;

pub use entities::*;
pub use events::*;
pub use progression::*;
pub use quest::*;
pub use save::*;
pub use state::*;
pub use store::*;
pub use world::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tile inside a chunk. `x` grows east, `y` grows south; positions just
/// outside the chunk are how the turn engine detects an edge crossing.
///
/// # Examples
///
/// ```
/// use wayfarer::{Direction, Position};
///
/// let pos = Position::new(0, 5);
/// let west = pos + Direction::West.to_delta();
/// assert_eq!(west, Position::new(-1, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Distance counting diagonal steps as one; the reach of area attacks.
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.x - other.x).abs().max((self.y - other.y).abs()) as u32
    }

    /// The four orthogonal neighbors.
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        Direction::all()
            .into_iter()
            .map(|direction| self + direction.to_delta())
            .collect()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// The four cardinal directions the player and enemies move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Returns all 4 directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }
}

/// Grid address of a chunk in the unbounded world.
///
/// Used directly as the chunk store key; the `"cx,cy"` form from
/// [`fmt::Display`] is only for logs and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// The starting chunk.
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// The coordinate one chunk away in the given direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::{ChunkCoord, Direction};
    ///
    /// let here = ChunkCoord::new(2, -1);
    /// assert_eq!(here.neighbor(Direction::West), ChunkCoord::new(1, -1));
    /// assert_eq!(here.neighbor(Direction::North), ChunkCoord::new(2, -2));
    /// ```
    pub fn neighbor(self, direction: Direction) -> ChunkCoord {
        let delta = direction.to_delta();
        ChunkCoord::new(self.cx + delta.x, self.cy + delta.y)
    }

    /// Manhattan distance from the origin chunk.
    pub fn distance_from_origin(self) -> u32 {
        self.cx.unsigned_abs() + self.cy.unsigned_abs()
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.cx, self.cy)
    }
}
