//! # Generation Module
//!
//! Content generation for chunks: the generator seam, world traits derived
//! from coordinates, edge matching and enemy spawning.
//!
//! Generators produce raw, untrusted chunks. Whatever they return is passed
//! through [`edges::enforce`] before it reaches the chunk store, so a
//! generator never has to get the edge contract right on its own.

pub mod edges;
pub mod procedural;
pub mod spawner;

pub use edges::*;
pub use procedural::*;
pub use spawner::*;

use crate::game::{Chunk, ChunkCoord, NpcSpawn};
use crate::WayfarerResult;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Configuration for procedural generation.
///
/// Controls obstacle density, loot and hazard frequency, and how many
/// creatures and townsfolk a chunk receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Noise sampling scale; smaller values give broader obstacle fields
    pub noise_scale: f64,
    /// Noise value above which a wilderness cell becomes an obstacle
    pub obstacle_threshold: f64,
    /// Probability of a hazard per interior floor cell
    pub hazard_chance: f64,
    /// Probability of a treasure chest per interior floor cell
    pub treasure_chance: f64,
    /// Minimum enemies in a wilderness chunk
    pub min_enemies: u32,
    /// Maximum enemies in a wilderness chunk
    pub max_enemies: u32,
    /// Probability that a town includes a quest giver
    pub quest_giver_chance: f64,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.max_enemies >= config.min_enemies);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            noise_scale: 0.18,
            obstacle_threshold: 0.35,
            hazard_chance: 0.02,
            treasure_chance: 0.015,
            min_enemies: 3,
            max_enemies: 5,
            quest_giver_chance: 0.6,
        }
    }

    /// Creates a configuration for testing with sparse, predictable chunks.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            noise_scale: 0.18,
            obstacle_threshold: 0.6,
            hazard_chance: 0.0,
            treasure_chance: 0.0,
            min_enemies: 1,
            max_enemies: 2,
            quest_giver_chance: 1.0,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// External capability that produces chunk content and NPC dialogue.
///
/// Both operations may fail or stall; the scene driver bounds them with a
/// timeout and substitutes the fallback chunk or the NPC's greeting.
pub trait ContentGenerator {
    /// Produces raw content for the chunk at `coord`.
    ///
    /// `openings` carries the requested size and the edge indices that must
    /// stay open. Honoring them is best-effort; the caller enforces them.
    fn generate_chunk(
        &self,
        coord: ChunkCoord,
        openings: &EdgeOpenings,
    ) -> impl Future<Output = WayfarerResult<Chunk>>;

    /// Produces one line of chat for an NPC.
    fn generate_dialogue(
        &self,
        npc: &NpcSpawn,
        class_name: &str,
        biome_name: &str,
    ) -> impl Future<Output = WayfarerResult<String>>;

    /// Returns the generator type name for debugging.
    fn generator_type(&self) -> &'static str;
}

/// Biome of a chunk, from a smooth trigonometric field over coordinates.
///
/// # Examples
///
/// ```
/// use wayfarer::{biome_name, ChunkCoord};
///
/// assert_eq!(biome_name(ChunkCoord::new(0, 0)), "Starter Valley");
/// assert_eq!(biome_name(ChunkCoord::new(1, 0)), "Sand Dunes");
/// ```
pub fn biome_name(coord: ChunkCoord) -> &'static str {
    if coord == ChunkCoord::origin() {
        return "Starter Valley";
    }
    let value = (coord.cx as f64 * 0.15).sin() + (coord.cy as f64 * 0.15).cos();
    if value > 1.2 {
        "Volcanic Crags"
    } else if value > 0.5 {
        "Sand Dunes"
    } else if value > -0.5 {
        "Ancient Forest"
    } else if value > -1.2 {
        "Iron Wasteland"
    } else {
        "Cryo Tundra"
    }
}

/// Whether the chunk at `coord` is a town. The origin always is.
pub fn is_city(coord: ChunkCoord) -> bool {
    if coord == ChunkCoord::origin() {
        return true;
    }
    let a = (coord.cx as i64).wrapping_mul(73_856_093) as i32;
    let b = (coord.cy as i64).wrapping_mul(19_349_663) as i32;
    ((a ^ b) as i64).abs() % 10 == 0
}

/// Utility functions shared by the generators.
pub mod utils {
    use crate::game::ChunkCoord;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Creates a random number generator from a seed.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Mixes a world seed with a chunk coordinate so each chunk gets its own
    /// stable stream.
    pub fn coord_seed(seed: u64, coord: ChunkCoord) -> u64 {
        let x = coord.cx as i64 as u64;
        let y = coord.cy as i64 as u64;
        seed ^ x.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ y.wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
    }

    /// Returns true with probability `p`. Values outside `0..=1` saturate.
    pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        rng.gen::<f64>() < p
    }
}
