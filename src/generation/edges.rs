//! # Edge Matching
//!
//! Computes which edge cells of a chunk must be open to line up with its
//! already-generated neighbors, and force-corrects generated layouts so every
//! chunk can be walked into and out of from each side.

use crate::game::{Cell, Chunk, ChunkCoord, ChunkStore, Direction, Position};
use pathfinding::prelude::bfs_reach;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Required open indices per edge, plus the shape the chunk must have.
///
/// `None` means no neighbor exists on that side yet and the edge is free.
/// Indices run along the edge: x for north/south, y for west/east.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeOpenings {
    pub width: usize,
    pub height: usize,
    pub north: Option<Vec<usize>>,
    pub south: Option<Vec<usize>>,
    pub west: Option<Vec<usize>>,
    pub east: Option<Vec<usize>>,
}

impl EdgeOpenings {
    /// No constraint on any side.
    pub fn unconstrained(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            north: None,
            south: None,
            west: None,
            east: None,
        }
    }

    pub fn get(&self, direction: Direction) -> Option<&[usize]> {
        match direction {
            Direction::North => self.north.as_deref(),
            Direction::South => self.south.as_deref(),
            Direction::West => self.west.as_deref(),
            Direction::East => self.east.as_deref(),
        }
    }

    pub fn set(&mut self, direction: Direction, indices: Option<Vec<usize>>) {
        match direction {
            Direction::North => self.north = indices,
            Direction::South => self.south = indices,
            Direction::West => self.west = indices,
            Direction::East => self.east = indices,
        }
    }

    pub fn is_constrained(&self, direction: Direction) -> bool {
        self.get(direction).is_some()
    }

    /// Length of the edge facing `direction`.
    pub fn edge_len(&self, direction: Direction) -> usize {
        match direction {
            Direction::North | Direction::South => self.width,
            Direction::East | Direction::West => self.height,
        }
    }
}

/// Collects the openings a new chunk at `coord` must honor.
///
/// A neighbor to the north constrains this chunk's top row with its own
/// bottom row, and likewise for the other three sides.
///
/// # Examples
///
/// ```
/// use wayfarer::{required_openings, Chunk, ChunkCoord, ChunkStore};
///
/// let mut store = ChunkStore::new();
/// store.put(ChunkCoord::new(0, 0), Chunk::fallback(20, 15, "Starter Valley"));
///
/// let openings = required_openings(&store, ChunkCoord::new(-1, 0), 20, 15);
/// assert_eq!(openings.east, Some(vec![7]));
/// assert_eq!(openings.west, None);
/// ```
pub fn required_openings(
    store: &ChunkStore,
    coord: ChunkCoord,
    width: usize,
    height: usize,
) -> EdgeOpenings {
    let mut openings = EdgeOpenings::unconstrained(width, height);
    for direction in Direction::all() {
        if let Some(neighbor) = store.get(coord.neighbor(direction)) {
            openings.set(
                direction,
                Some(neighbor.floor_indices(direction.opposite())),
            );
        }
    }
    openings
}

/// The two cells nearest an edge's midpoint, kept off the corners.
pub fn fallback_openings(len: usize) -> Vec<usize> {
    if len < 3 {
        return Vec::new();
    }
    let mid = len / 2;
    let mut indices: Vec<usize> = [mid, mid + 1]
        .into_iter()
        .map(|i| i.clamp(1, len - 2))
        .collect();
    indices.dedup();
    indices
}

/// Interior cell every edge opening must be able to reach.
pub fn anchor(chunk: &Chunk) -> Position {
    Position::new(
        (chunk.width / 2).clamp(1, chunk.width.saturating_sub(2).max(1)) as i32,
        (chunk.height / 2).clamp(1, chunk.height.saturating_sub(2).max(1)) as i32,
    )
}

/// Every non-blocking cell reachable from `start` with cardinal steps.
pub fn reachable_from(chunk: &Chunk, start: Position) -> HashSet<Position> {
    if !chunk.is_walkable(start) {
        return HashSet::new();
    }
    bfs_reach(start, |&pos: &Position| {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|next| chunk.is_walkable(*next))
            .collect::<Vec<_>>()
    })
    .collect()
}

/// Force-corrects a generated chunk so it honors `openings`.
///
/// Runs on every chunk before it is stored, whatever its source:
///
/// 1. the grid is padded or truncated to the requested size;
/// 2. corners become wall, and so do border hazards, chests and drops;
/// 3. a constrained edge is made to match its neighbor exactly;
/// 4. an unconstrained edge keeps its own openings and gains the two cells
///    nearest its midpoint;
/// 5. any edge opening that cannot reach the interior anchor gets an
///    L-shaped corridor carved to it.
///
/// Spawns left out of bounds, on blocking cells or on the border are dropped.
pub fn enforce(chunk: &mut Chunk, openings: &EdgeOpenings) {
    chunk.normalize_dimensions(openings.width, openings.height);
    normalize_border(chunk);

    for direction in Direction::all() {
        apply_edge(chunk, direction, openings.get(direction));
    }

    repair_connectivity(chunk);
    prune_spawns(chunk);
}

fn normalize_border(chunk: &mut Chunk) {
    for y in 0..chunk.height {
        for x in 0..chunk.width {
            let pos = Position::new(x as i32, y as i32);
            if !chunk.is_border(pos) {
                continue;
            }
            let is_corner = (x == 0 || x + 1 == chunk.width) && (y == 0 || y + 1 == chunk.height);
            let cell = chunk.layout[y][x];
            if is_corner || matches!(cell, Cell::Hazard | Cell::Treasure | Cell::DroppedItem) {
                chunk.layout[y][x] = Cell::Wall;
            }
        }
    }
}

fn apply_edge(chunk: &mut Chunk, direction: Direction, required: Option<&[usize]>) {
    let len = chunk.edge_len(direction);
    if len < 3 {
        return;
    }

    let constrained: Option<HashSet<usize>> = required
        .map(|indices| {
            indices
                .iter()
                .copied()
                .filter(|&i| i >= 1 && i + 1 < len)
                .collect::<HashSet<usize>>()
        })
        .filter(|indices| !indices.is_empty());

    match constrained {
        Some(open) => {
            for i in 1..len - 1 {
                let cell = if open.contains(&i) { Cell::Floor } else { Cell::Wall };
                chunk.set_cell(chunk.edge_position(direction, i), cell);
            }
        }
        None => {
            for i in fallback_openings(len) {
                chunk.set_cell(chunk.edge_position(direction, i), Cell::Floor);
            }
        }
    }
}

fn inward(chunk: &Chunk, pos: Position) -> Position {
    let x = pos.x.clamp(1, chunk.width as i32 - 2);
    let y = pos.y.clamp(1, chunk.height as i32 - 2);
    Position::new(x, y)
}

fn repair_connectivity(chunk: &mut Chunk) {
    let anchor = anchor(chunk);
    if chunk.cell(anchor).map(|cell| cell.is_blocking()).unwrap_or(false) {
        chunk.set_cell(anchor, Cell::Floor);
    }

    let mut reachable = reachable_from(chunk, anchor);
    for direction in Direction::all() {
        for index in chunk.floor_indices(direction) {
            let opening = chunk.edge_position(direction, index);
            if reachable.contains(&opening) {
                continue;
            }
            carve_l_corridor(chunk, inward(chunk, opening), anchor);
            reachable = reachable_from(chunk, anchor);
        }
    }
}

/// Carves an L-shaped corridor between two interior points, turning blocking
/// cells into floor. Border cells are never touched.
pub fn carve_l_corridor(chunk: &mut Chunk, start: Position, end: Position) {
    let corner = if start.x != end.x {
        Position::new(end.x, start.y)
    } else {
        Position::new(start.x, end.y)
    };

    for (from, to) in [(start, corner), (corner, end)] {
        let (min_x, max_x) = (from.x.min(to.x), from.x.max(to.x));
        let (min_y, max_y) = (from.y.min(to.y), from.y.max(to.y));
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let pos = Position::new(x, y);
                if chunk.is_border(pos) {
                    continue;
                }
                if chunk.cell(pos).map(|cell| cell.is_blocking()).unwrap_or(false) {
                    chunk.set_cell(pos, Cell::Floor);
                }
            }
        }
    }
}

fn prune_spawns(chunk: &mut Chunk) {
    let usable = |chunk: &Chunk, pos: Position| chunk.is_walkable(pos) && !chunk.is_border(pos);

    let enemies = std::mem::take(&mut chunk.enemy_spawns);
    chunk.enemy_spawns = enemies
        .into_iter()
        .filter(|spawn| usable(chunk, spawn.position))
        .collect();

    let npcs = std::mem::take(&mut chunk.npc_spawns);
    let mut taken = HashSet::new();
    chunk.npc_spawns = npcs
        .into_iter()
        .filter(|npc| usable(chunk, npc.position) && taken.insert(npc.position))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EnemyKind, EnemySpawn};

    fn solid(width: usize, height: usize) -> Chunk {
        let mut chunk = Chunk::new(width, height, "Test");
        chunk.layout = vec![vec![Cell::Wall; width]; height];
        chunk
    }

    #[test]
    fn test_fallback_openings_midpoint() {
        assert_eq!(fallback_openings(20), vec![10, 11]);
        assert_eq!(fallback_openings(15), vec![7, 8]);
        assert_eq!(fallback_openings(3), vec![1]);
    }

    #[test]
    fn test_sealed_output_gets_opened_and_connected() {
        let mut chunk = solid(20, 15);
        enforce(&mut chunk, &EdgeOpenings::unconstrained(20, 15));

        let reachable = reachable_from(&chunk, anchor(&chunk));
        for direction in Direction::all() {
            let open = chunk.floor_indices(direction);
            assert!(!open.is_empty(), "{direction:?} edge sealed");
            for index in open {
                assert!(reachable.contains(&chunk.edge_position(direction, index)));
            }
        }
    }

    #[test]
    fn test_constrained_edge_matches_exactly() {
        let mut chunk = Chunk::new(20, 15, "Test");
        let mut openings = EdgeOpenings::unconstrained(20, 15);
        openings.east = Some(vec![3, 4]);

        enforce(&mut chunk, &openings);
        assert_eq!(chunk.floor_indices(Direction::East), vec![3, 4]);
    }

    #[test]
    fn test_corner_indices_are_ignored() {
        let mut chunk = solid(20, 15);
        let mut openings = EdgeOpenings::unconstrained(20, 15);
        openings.north = Some(vec![0, 19, 5]);

        enforce(&mut chunk, &openings);
        assert_eq!(chunk.floor_indices(Direction::North), vec![5]);
        assert_eq!(chunk.cell(Position::new(0, 0)), Some(Cell::Wall));
    }

    #[test]
    fn test_required_openings_reads_facing_edges() {
        let mut store = ChunkStore::new();
        let mut north = solid(20, 15);
        north.layout[14][6] = Cell::Floor;
        store.put(ChunkCoord::new(0, -1), north);

        let openings = required_openings(&store, ChunkCoord::origin(), 20, 15);
        assert_eq!(openings.north, Some(vec![6]));
        assert!(!openings.is_constrained(Direction::South));
    }

    #[test]
    fn test_border_loot_becomes_wall() {
        let mut chunk = Chunk::new(20, 15, "Test");
        chunk.layout[0][3] = Cell::Treasure;
        chunk.layout[5][0] = Cell::Hazard;
        enforce(&mut chunk, &EdgeOpenings::unconstrained(20, 15));

        assert_eq!(chunk.cell(Position::new(3, 0)), Some(Cell::Wall));
        assert_eq!(chunk.cell(Position::new(0, 5)), Some(Cell::Wall));
    }

    #[test]
    fn test_misplaced_spawns_are_dropped() {
        let mut chunk = Chunk::new(20, 15, "Test");
        chunk.layout[4][4] = Cell::Wall;
        for (x, y) in [(4, 4), (0, 7), (30, 2), (6, 6)] {
            chunk.enemy_spawns.push(EnemySpawn {
                kind: EnemyKind::Slime,
                position: Position::new(x, y),
                name: "Slime".to_string(),
            });
        }
        enforce(&mut chunk, &EdgeOpenings::unconstrained(20, 15));

        assert_eq!(chunk.enemy_spawns.len(), 1);
        assert_eq!(chunk.enemy_spawns[0].position, Position::new(6, 6));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut chunk = Chunk::new(20, 15, "Test");
        chunk.layout.truncate(3);
        chunk.layout[1].truncate(2);
        enforce(&mut chunk, &EdgeOpenings::unconstrained(20, 15));

        assert!(chunk.is_well_formed());
        assert_eq!(chunk.floor_indices(Direction::South), vec![10, 11]);
    }
}
