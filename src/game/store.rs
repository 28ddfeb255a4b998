//! # Chunk Store
//!
//! Keyed cache of every chunk generated this session. There is no eviction;
//! the store grows with the explored area.

use crate::game::{Chunk, ChunkCoord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All generated chunks, keyed by their grid coordinate.
///
/// `put` stores the chunk as given; edge correction happens before a chunk
/// ever reaches the store. JSON cannot key an object by a composite value, so
/// the store serializes as a list of `(coord, chunk)` entries.
///
/// # Examples
///
/// ```
/// use wayfarer::{Chunk, ChunkCoord, ChunkStore};
///
/// let mut store = ChunkStore::new();
/// store.put(ChunkCoord::new(0, 0), Chunk::fallback(20, 15, "Starter Valley"));
/// assert!(store.contains(ChunkCoord::new(0, 0)));
/// assert!(store.get(ChunkCoord::new(1, 0)).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<StoreEntry>", into = "Vec<StoreEntry>")]
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, Chunk>,
}

/// Serialized form of one store slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEntry {
    pub coord: ChunkCoord,
    pub chunk: Chunk,
}

impl ChunkStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Stores a chunk, replacing any previous chunk at the same coordinate.
    pub fn put(&mut self, coord: ChunkCoord, chunk: Chunk) {
        self.chunks.insert(coord, chunk);
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterates over every stored chunk in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkCoord, &Chunk)> {
        self.chunks.iter().map(|(coord, chunk)| (*coord, chunk))
    }

    /// Stored coordinates in ascending order.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort();
        coords
    }
}

impl From<Vec<StoreEntry>> for ChunkStore {
    fn from(entries: Vec<StoreEntry>) -> Self {
        Self {
            chunks: entries
                .into_iter()
                .map(|entry| (entry.coord, entry.chunk))
                .collect(),
        }
    }
}

impl From<ChunkStore> for Vec<StoreEntry> {
    fn from(store: ChunkStore) -> Self {
        let mut entries: Vec<StoreEntry> = store
            .chunks
            .into_iter()
            .map(|(coord, chunk)| StoreEntry { coord, chunk })
            .collect();
        entries.sort_by_key(|entry| entry.coord);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, Position};

    #[test]
    fn test_put_and_get() {
        let mut store = ChunkStore::new();
        assert!(store.is_empty());

        store.put(ChunkCoord::new(2, -1), Chunk::new(4, 4, "Test"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(ChunkCoord::new(2, -1)).map(|c| c.width), Some(4));
        assert!(!store.contains(ChunkCoord::new(-1, 2)));
    }

    #[test]
    fn test_mutation_through_get_mut_persists() {
        let mut store = ChunkStore::new();
        let coord = ChunkCoord::origin();
        store.put(coord, Chunk::new(4, 4, "Test"));

        if let Some(chunk) = store.get_mut(coord) {
            chunk.set_cell(Position::new(1, 1), Cell::DroppedItem);
        }
        assert_eq!(
            store.get(coord).and_then(|c| c.cell(Position::new(1, 1))),
            Some(Cell::DroppedItem)
        );
    }

    #[test]
    fn test_serializes_as_entry_list() {
        let mut store = ChunkStore::new();
        store.put(ChunkCoord::new(1, 0), Chunk::new(4, 4, "East"));
        store.put(ChunkCoord::new(0, 0), Chunk::new(4, 4, "Origin"));

        let json = serde_json::to_value(&store).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["coord"]["cx"], 0);

        let restored: ChunkStore = serde_json::from_value(json).unwrap();
        assert_eq!(restored, store);
    }
}
