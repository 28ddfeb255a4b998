//! # World Representation
//!
//! Chunks, their cell grids and the static spawn descriptors they carry.

use crate::game::{Direction, Position, Quest};
use crate::WayfarerError;
use serde::{Deserialize, Serialize};

/// A single cell of a chunk layout.
///
/// Serialized as its integer code so saves and generator payloads share one
/// compact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Cell {
    Floor,
    Wall,
    Hazard,
    Treasure,
    DroppedItem,
    Building,
}

impl Cell {
    /// The integer code used on the wire.
    pub fn code(self) -> u8 {
        match self {
            Cell::Floor => 0,
            Cell::Wall => 1,
            Cell::Hazard => 2,
            Cell::Treasure => 3,
            Cell::DroppedItem => 4,
            Cell::Building => 5,
        }
    }

    /// Returns true if nothing may stand on this cell.
    pub fn is_blocking(self) -> bool {
        matches!(self, Cell::Wall | Cell::Building)
    }

    /// Returns true for plain floor.
    pub fn is_floor(self) -> bool {
        self == Cell::Floor
    }

    /// ASCII glyph used by the terminal front end.
    pub fn glyph(self) -> char {
        match self {
            Cell::Floor => '.',
            Cell::Wall => '#',
            Cell::Hazard => '^',
            Cell::Treasure => '$',
            Cell::DroppedItem => '*',
            Cell::Building => 'H',
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = WayfarerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Cell::Floor),
            1 => Ok(Cell::Wall),
            2 => Ok(Cell::Hazard),
            3 => Ok(Cell::Treasure),
            4 => Ok(Cell::DroppedItem),
            5 => Ok(Cell::Building),
            other => Err(WayfarerError::InvalidState(format!(
                "unknown cell code {other}"
            ))),
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        cell.code()
    }
}

/// Enemy archetypes a chunk may spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnemyKind {
    Slime,
    Rat,
    Skeleton,
    Robot,
    Ghost,
    Alien,
}

impl EnemyKind {
    /// Unscaled hit points of this archetype.
    pub fn base_hp(self) -> f64 {
        match self {
            EnemyKind::Rat => 4.0,
            EnemyKind::Slime => 5.0,
            EnemyKind::Ghost => 7.0,
            EnemyKind::Skeleton => 8.0,
            EnemyKind::Alien => 9.0,
            EnemyKind::Robot => 10.0,
        }
    }

    /// Parses the upper-case wire name, returning None for unknown kinds.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SLIME" => Some(EnemyKind::Slime),
            "RAT" => Some(EnemyKind::Rat),
            "SKELETON" => Some(EnemyKind::Skeleton),
            "ROBOT" => Some(EnemyKind::Robot),
            "GHOST" => Some(EnemyKind::Ghost),
            "ALIEN" => Some(EnemyKind::Alien),
            _ => None,
        }
    }

    /// All archetypes.
    pub fn all() -> [EnemyKind; 6] {
        [
            EnemyKind::Slime,
            EnemyKind::Rat,
            EnemyKind::Skeleton,
            EnemyKind::Robot,
            EnemyKind::Ghost,
            EnemyKind::Alien,
        ]
    }
}

/// Role of a non-player character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NpcRole {
    Villager,
    Shopkeeper,
    Guard,
    Elder,
    QuestGiver,
}

/// Static enemy descriptor stored with a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub position: Position,
    pub name: String,
}

/// Static NPC descriptor stored with a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSpawn {
    pub name: String,
    pub role: NpcRole,
    pub position: Position,
    pub greeting: String,
    pub personality: String,
    /// Catalog item names this shopkeeper sells; empty means the full catalog
    #[serde(default)]
    pub shop_inventory: Vec<String>,
    /// Quest this NPC hands out, if any
    #[serde(default)]
    pub quest: Option<Quest>,
}

impl NpcSpawn {
    /// Returns true if talking to this NPC can open the shop.
    pub fn is_shopkeeper(&self) -> bool {
        self.role == NpcRole::Shopkeeper
    }
}

/// One fixed-size area of the world.
///
/// Cells are addressed as `layout[y][x]`. Once stored, a chunk only changes
/// through localized cell mutation: collected loot and triggered hazards
/// become floor, and slain enemies may leave a dropped item behind.
///
/// # Examples
///
/// ```
/// use wayfarer::{Cell, Chunk, Position};
///
/// let chunk = Chunk::fallback(20, 15, "Sand Dunes");
/// assert_eq!(chunk.cell(Position::new(0, 0)), Some(Cell::Wall));
/// assert_eq!(chunk.cell(Position::new(10, 0)), Some(Cell::Floor));
/// assert!(chunk.enemy_spawns.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub width: usize,
    pub height: usize,
    pub layout: Vec<Vec<Cell>>,
    pub biome_name: String,
    pub flavor_text: String,
    #[serde(default)]
    pub enemy_spawns: Vec<EnemySpawn>,
    #[serde(default)]
    pub npc_spawns: Vec<NpcSpawn>,
    #[serde(default)]
    pub is_city: bool,
}

impl Chunk {
    /// Creates a chunk of open floor.
    pub fn new(width: usize, height: usize, biome_name: impl Into<String>) -> Self {
        Self {
            width,
            height,
            layout: vec![vec![Cell::Floor; width]; height],
            biome_name: biome_name.into(),
            flavor_text: String::new(),
            enemy_spawns: Vec::new(),
            npc_spawns: Vec::new(),
            is_city: false,
        }
    }

    /// The emergency chunk used when the content generator fails.
    ///
    /// Border walls with a gate at the midpoint of every side and no enemies.
    pub fn fallback(width: usize, height: usize, biome_name: impl Into<String>) -> Self {
        let mut chunk = Self::new(width, height, biome_name);
        chunk.flavor_text = "Connection lost. Using emergency map.".to_string();

        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    chunk.layout[y][x] = Cell::Wall;
                }
            }
        }

        let (mid_x, mid_y) = (width / 2, height / 2);
        chunk.layout[mid_y][0] = Cell::Floor;
        chunk.layout[mid_y][width - 1] = Cell::Floor;
        chunk.layout[0][mid_x] = Cell::Floor;
        chunk.layout[height - 1][mid_x] = Cell::Floor;

        chunk
    }

    /// Returns true if the position lies inside the chunk.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Returns true if the position is on the outermost ring.
    pub fn is_border(&self, pos: Position) -> bool {
        self.in_bounds(pos)
            && (pos.x == 0
                || pos.y == 0
                || pos.x as usize == self.width - 1
                || pos.y as usize == self.height - 1)
    }

    /// Gets the cell at a position.
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.layout
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
            .copied()
    }

    /// Sets the cell at a position. Out-of-bounds writes are ignored.
    pub fn set_cell(&mut self, pos: Position, cell: Cell) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        match self
            .layout
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
        {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Returns true if an entity could stand on the position.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.cell(pos).map(|cell| !cell.is_blocking()).unwrap_or(false)
    }

    /// Length of the given edge.
    pub fn edge_len(&self, direction: Direction) -> usize {
        match direction {
            Direction::North | Direction::South => self.width,
            Direction::East | Direction::West => self.height,
        }
    }

    /// Position of the `index`-th cell along an edge.
    pub fn edge_position(&self, direction: Direction, index: usize) -> Position {
        let i = index as i32;
        match direction {
            Direction::North => Position::new(i, 0),
            Direction::South => Position::new(i, self.height as i32 - 1),
            Direction::West => Position::new(0, i),
            Direction::East => Position::new(self.width as i32 - 1, i),
        }
    }

    /// Cells along an edge, in index order.
    pub fn edge(&self, direction: Direction) -> Vec<Cell> {
        (0..self.edge_len(direction))
            .map(|i| {
                self.cell(self.edge_position(direction, i))
                    .unwrap_or(Cell::Wall)
            })
            .collect()
    }

    /// Indices along an edge that are floor.
    pub fn floor_indices(&self, direction: Direction) -> Vec<usize> {
        self.edge(direction)
            .into_iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_floor())
            .map(|(i, _)| i)
            .collect()
    }

    /// Forces the grid to `width x height`, padding with walls and truncating
    /// anything beyond.
    pub fn normalize_dimensions(&mut self, width: usize, height: usize) {
        self.layout.truncate(height);
        for row in &mut self.layout {
            row.truncate(width);
            row.resize(width, Cell::Wall);
        }
        self.layout.resize(height, vec![Cell::Wall; width]);
        self.width = width;
        self.height = height;
    }

    /// Returns true if every row matches the declared width and height.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.layout.len() == self.height
            && self.layout.iter().all(|row| row.len() == self.width)
    }

    /// Renders the layout as ASCII rows.
    pub fn render_rows(&self) -> Vec<String> {
        self.layout
            .iter()
            .map(|row| row.iter().map(|cell| cell.glyph()).collect())
            .collect()
    }
}
