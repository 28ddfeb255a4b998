//! # Procedural Generator
//!
//! Offline chunk generator. Wilderness chunks get Perlin-noise obstacle
//! fields, scattered hazards and chests, and a handful of biome-appropriate
//! enemies; towns get building blocks around a central plaza and a few
//! townsfolk, one of whom may hand out a quest.
//!
//! Output is deterministic for a given seed and coordinate.

use crate::config::{DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y};
use crate::game::{
    Cell, Chunk, ChunkCoord, EnemyKind, EnemySpawn, NpcRole, NpcSpawn, Position, Quest,
};
use crate::generation::utils::{chance, coord_seed, create_rng};
use crate::generation::{biome_name, is_city, ContentGenerator, EdgeOpenings, GenerationConfig};
use crate::WayfarerResult;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

const TOWNSFOLK: [&str; 10] = [
    "Mira", "Oswin", "Tamsin", "Borrik", "Elda", "Fenwick", "Quill", "Rowan", "Sabine", "Thorne",
];

const LOST_ITEMS: [&str; 8] = [
    "Silver Locket",
    "Old Map",
    "Rusty Key",
    "Crystal Shard",
    "Family Ring",
    "Lost Journal",
    "Copper Gear",
    "Healing Herb",
];

/// Deterministic generator that needs no network access.
///
/// # Examples
///
/// ```
/// use wayfarer::{ChunkCoord, EdgeOpenings, GenerationConfig, ProceduralGenerator};
///
/// let generator = ProceduralGenerator::new(GenerationConfig::new(7));
/// let chunk = generator.build_chunk(ChunkCoord::new(3, 1), &EdgeOpenings::unconstrained(20, 15));
/// assert_eq!(chunk.width, 20);
/// assert_eq!(chunk.layout.len(), 15);
/// ```
#[derive(Debug, Clone)]
pub struct ProceduralGenerator {
    config: GenerationConfig,
    noise: Perlin,
}

impl ProceduralGenerator {
    /// Creates a generator with the given configuration.
    pub fn new(config: GenerationConfig) -> Self {
        let noise = Perlin::new(config.seed as u32);
        Self { config, noise }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Builds the raw chunk for a coordinate.
    ///
    /// The requested openings are carved as a courtesy; the caller still runs
    /// the edge resolver over the result.
    pub fn build_chunk(&self, coord: ChunkCoord, openings: &EdgeOpenings) -> Chunk {
        let mut rng = create_rng(coord_seed(self.config.seed, coord));
        let biome = biome_name(coord);
        let mut chunk = Chunk::new(openings.width, openings.height, biome);
        chunk.is_city = is_city(coord);

        self.wall_border(&mut chunk);
        if chunk.is_city {
            self.lay_out_town(&mut chunk);
            self.place_townsfolk(&mut chunk, &mut rng);
        } else {
            self.lay_out_wilderness(&mut chunk, coord, &mut rng);
            self.place_enemies(&mut chunk, biome, &mut rng);
        }
        chunk.flavor_text = flavor_text(biome, chunk.is_city, &mut rng);

        for direction in crate::game::Direction::all() {
            if let Some(indices) = openings.get(direction) {
                for &index in indices {
                    chunk.set_cell(chunk.edge_position(direction, index), Cell::Floor);
                }
            }
        }

        log::debug!(
            "Procedurally generated chunk {} ({}, city: {}, {} enemies, {} npcs)",
            coord,
            biome,
            chunk.is_city,
            chunk.enemy_spawns.len(),
            chunk.npc_spawns.len()
        );
        chunk
    }

    fn wall_border(&self, chunk: &mut Chunk) {
        let (w, h) = (chunk.width, chunk.height);
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
                    chunk.layout[y][x] = Cell::Wall;
                }
            }
        }
    }

    fn lay_out_wilderness(&self, chunk: &mut Chunk, coord: ChunkCoord, rng: &mut StdRng) {
        let scale = self.config.noise_scale;
        let spawn = Position::new(DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y);
        for y in 1..chunk.height.saturating_sub(1) {
            for x in 1..chunk.width.saturating_sub(1) {
                let pos = Position::new(x as i32, y as i32);
                if pos.chebyshev_distance(spawn) <= 1 {
                    continue;
                }
                let gx = coord.cx as f64 * chunk.width as f64 + x as f64;
                let gy = coord.cy as f64 * chunk.height as f64 + y as f64;
                let value = self.noise.get([gx * scale, gy * scale]);

                chunk.layout[y][x] = if value > self.config.obstacle_threshold {
                    Cell::Wall
                } else if chance(rng, self.config.hazard_chance) {
                    Cell::Hazard
                } else if chance(rng, self.config.treasure_chance) {
                    Cell::Treasure
                } else {
                    Cell::Floor
                };
            }
        }
    }

    fn lay_out_town(&self, chunk: &mut Chunk) {
        let (w, h) = (chunk.width as i32, chunk.height as i32);
        let (cx, cy) = (w / 2, h / 2);
        for by in (2..h - 3).step_by(5) {
            for bx in (2..w - 4).step_by(6) {
                let touches_plaza =
                    bx <= cx + 2 && bx + 2 >= cx - 2 && by <= cy + 1 && by + 1 >= cy - 1;
                if touches_plaza {
                    continue;
                }
                for y in by..by + 2 {
                    for x in bx..bx + 3 {
                        chunk.set_cell(Position::new(x, y), Cell::Building);
                    }
                }
            }
        }
    }

    fn free_interior_cells(&self, chunk: &Chunk, taken: &[Position]) -> Vec<Position> {
        let spawn = Position::new(DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y);
        let mut cells = Vec::new();
        for y in 1..chunk.height.saturating_sub(1) {
            for x in 1..chunk.width.saturating_sub(1) {
                let pos = Position::new(x as i32, y as i32);
                if chunk.cell(pos) == Some(Cell::Floor) && pos != spawn && !taken.contains(&pos) {
                    cells.push(pos);
                }
            }
        }
        cells
    }

    fn place_townsfolk(&self, chunk: &mut Chunk, rng: &mut StdRng) {
        let spawn = Position::new(DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y);
        let mut roles = vec![NpcRole::Shopkeeper];
        if chance(rng, self.config.quest_giver_chance) {
            roles.push(NpcRole::QuestGiver);
        }
        let extra = [NpcRole::Villager, NpcRole::Elder, NpcRole::Guard];
        if let Some(role) = extra.choose(rng) {
            roles.push(*role);
        }

        let mut names: Vec<&str> = TOWNSFOLK.to_vec();
        names.shuffle(rng);
        let mut taken = Vec::new();

        for (role, name) in roles.into_iter().zip(names) {
            let mut cells = self.free_interior_cells(chunk, &taken);
            // Townsfolk gather near the plaza, off the player's spawn.
            cells.retain(|pos| pos.manhattan_distance(spawn) >= 2);
            cells.sort_by_key(|pos| pos.manhattan_distance(spawn));
            cells.truncate(12);
            let Some(&position) = cells.choose(rng) else {
                break;
            };
            taken.push(position);

            let quest = (role == NpcRole::QuestGiver).then(|| {
                let item = LOST_ITEMS.choose(rng).copied().unwrap_or("Old Map");
                let bytes: [u8; 16] = rng.gen();
                let mut quest = Quest::new(
                    name,
                    format!("I lost my {item} somewhere in the wilds. Will you find it?"),
                    item,
                    rng.gen_range(30..=60),
                    rng.gen_range(20..=50),
                );
                quest.id = uuid::Builder::from_random_bytes(bytes)
                    .into_uuid()
                    .to_string();
                quest
            });

            chunk.npc_spawns.push(NpcSpawn {
                name: name.to_string(),
                role,
                position,
                greeting: greeting_for(role, name),
                personality: personality_for(role).to_string(),
                shop_inventory: Vec::new(),
                quest,
            });
        }
    }

    fn place_enemies(&self, chunk: &mut Chunk, biome: &str, rng: &mut StdRng) {
        let spawn = Position::new(DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y);
        let lo = self.config.min_enemies.min(self.config.max_enemies);
        let count = rng.gen_range(lo..=self.config.max_enemies) as usize;
        let kinds = biome_enemies(biome);

        let mut cells = self.free_interior_cells(chunk, &[]);
        cells.retain(|pos| pos.manhattan_distance(spawn) > 3);
        cells.shuffle(rng);

        for position in cells.into_iter().take(count) {
            let kind = kinds.choose(rng).copied().unwrap_or(EnemyKind::Slime);
            chunk.enemy_spawns.push(EnemySpawn {
                kind,
                position,
                name: enemy_name(kind, biome),
            });
        }
    }

    /// Canned chat line for an NPC.
    pub fn dialogue_line(npc: &NpcSpawn, class_name: &str, biome_name: &str) -> String {
        if let Some(quest) = &npc.quest {
            return format!(
                "{} I could use a {} like you.",
                quest.description,
                class_name.to_lowercase()
            );
        }
        match npc.role {
            NpcRole::Shopkeeper => format!(
                "Supplies for the road, {}? Best prices in {}.",
                class_name.to_lowercase(),
                biome_name
            ),
            NpcRole::Guard => "Keep your blade sheathed inside the walls.".to_string(),
            NpcRole::Elder => format!("{} was calmer in my youth. Tread carefully.", biome_name),
            NpcRole::QuestGiver => "Nothing troubles me today, traveler.".to_string(),
            NpcRole::Villager => format!("Welcome to {}, stranger.", biome_name),
        }
    }
}

impl Default for ProceduralGenerator {
    fn default() -> Self {
        Self::new(GenerationConfig::default())
    }
}

impl ContentGenerator for ProceduralGenerator {
    async fn generate_chunk(
        &self,
        coord: ChunkCoord,
        openings: &EdgeOpenings,
    ) -> WayfarerResult<Chunk> {
        Ok(self.build_chunk(coord, openings))
    }

    async fn generate_dialogue(
        &self,
        npc: &NpcSpawn,
        class_name: &str,
        biome_name: &str,
    ) -> WayfarerResult<String> {
        Ok(Self::dialogue_line(npc, class_name, biome_name))
    }

    fn generator_type(&self) -> &'static str {
        "Procedural"
    }
}

fn biome_enemies(biome: &str) -> &'static [EnemyKind] {
    match biome {
        "Volcanic Crags" => &[EnemyKind::Skeleton, EnemyKind::Slime, EnemyKind::Alien],
        "Sand Dunes" => &[EnemyKind::Rat, EnemyKind::Skeleton, EnemyKind::Slime],
        "Ancient Forest" => &[EnemyKind::Slime, EnemyKind::Rat, EnemyKind::Ghost],
        "Iron Wasteland" => &[EnemyKind::Robot, EnemyKind::Rat, EnemyKind::Alien],
        "Cryo Tundra" => &[EnemyKind::Ghost, EnemyKind::Robot, EnemyKind::Skeleton],
        _ => &[EnemyKind::Slime, EnemyKind::Rat],
    }
}

fn enemy_name(kind: EnemyKind, biome: &str) -> String {
    let prefix = match biome {
        "Volcanic Crags" => "Ember",
        "Sand Dunes" => "Dune",
        "Ancient Forest" => "Moss",
        "Iron Wasteland" => "Rust",
        "Cryo Tundra" => "Frost",
        _ => "Wild",
    };
    let noun = match kind {
        EnemyKind::Slime => "Slime",
        EnemyKind::Rat => "Rat",
        EnemyKind::Skeleton => "Skeleton",
        EnemyKind::Robot => "Robot",
        EnemyKind::Ghost => "Ghost",
        EnemyKind::Alien => "Alien",
    };
    format!("{prefix} {noun}")
}

fn greeting_for(role: NpcRole, name: &str) -> String {
    match role {
        NpcRole::Shopkeeper => format!("{name}'s goods, fair and fresh!"),
        NpcRole::QuestGiver => format!("Oh, a traveler! I'm {name}. I need help."),
        NpcRole::Guard => "Halt. State your business.".to_string(),
        NpcRole::Elder => format!("I am {name}. Sit, rest a while."),
        NpcRole::Villager => "Lovely weather, isn't it?".to_string(),
    }
}

fn personality_for(role: NpcRole) -> &'static str {
    match role {
        NpcRole::Shopkeeper => "shrewd but friendly",
        NpcRole::QuestGiver => "anxious",
        NpcRole::Guard => "stern",
        NpcRole::Elder => "wise and slow-spoken",
        NpcRole::Villager => "cheerful",
    }
}

fn flavor_text(biome: &str, city: bool, rng: &mut StdRng) -> String {
    let lines: &[&str] = if city {
        &[
            "Lanterns sway above a busy square.",
            "Merchants call out over the clatter of carts.",
            "Smoke curls from a dozen chimneys.",
        ]
    } else {
        &[
            "The wind carries strange sounds.",
            "Something watches from the shadows.",
            "The path ahead is uncertain.",
        ]
    };
    let line = lines.choose(rng).copied().unwrap_or_default();
    format!("{biome}. {line}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{enforce, reachable_from, anchor};
    use crate::game::Direction;

    #[test]
    fn test_generation_is_deterministic() {
        let generator = ProceduralGenerator::new(GenerationConfig::new(99));
        let openings = EdgeOpenings::unconstrained(20, 15);
        let a = generator.build_chunk(ChunkCoord::new(4, -2), &openings);
        let b = generator.build_chunk(ChunkCoord::new(4, -2), &openings);
        assert_eq!(a, b);
    }

    #[test]
    fn test_origin_is_a_town_with_a_shop() {
        let generator = ProceduralGenerator::new(GenerationConfig::for_testing(5));
        let chunk = generator.build_chunk(ChunkCoord::origin(), &EdgeOpenings::unconstrained(20, 15));

        assert!(chunk.is_city);
        assert_eq!(chunk.biome_name, "Starter Valley");
        assert!(chunk.enemy_spawns.is_empty());
        assert!(chunk.npc_spawns.iter().any(|npc| npc.is_shopkeeper()));

        let giver = chunk
            .npc_spawns
            .iter()
            .find(|npc| npc.role == NpcRole::QuestGiver)
            .expect("testing config always adds a quest giver");
        let quest = giver.quest.as_ref().unwrap();
        assert_eq!(quest.giver_name, giver.name);
        assert!(!quest.is_completed);
    }

    #[test]
    fn test_wilderness_has_enemies_clear_of_spawn() {
        let generator = ProceduralGenerator::new(GenerationConfig::new(3));
        let chunk = generator.build_chunk(ChunkCoord::new(1, 0), &EdgeOpenings::unconstrained(20, 15));

        assert!(!chunk.is_city);
        assert!((3..=5).contains(&chunk.enemy_spawns.len()));
        for spawn in &chunk.enemy_spawns {
            assert_ne!(spawn.position, Position::new(10, 7));
            assert_eq!(chunk.cell(spawn.position), Some(Cell::Floor));
        }
    }

    #[test]
    fn test_enforced_output_is_open_on_every_side() {
        let generator = ProceduralGenerator::default();
        for cx in -3..3 {
            for cy in -3..3 {
                let openings = EdgeOpenings::unconstrained(20, 15);
                let mut chunk = generator.build_chunk(ChunkCoord::new(cx, cy), &openings);
                enforce(&mut chunk, &openings);

                let reachable = reachable_from(&chunk, anchor(&chunk));
                for direction in Direction::all() {
                    let open = chunk.floor_indices(direction);
                    assert!(!open.is_empty());
                    assert!(open
                        .iter()
                        .all(|&i| reachable.contains(&chunk.edge_position(direction, i))));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_dialogue_mentions_quest() {
        let generator = ProceduralGenerator::default();
        let npc = NpcSpawn {
            name: "Elda".to_string(),
            role: NpcRole::QuestGiver,
            position: Position::new(3, 3),
            greeting: "Hello".to_string(),
            personality: "anxious".to_string(),
            shop_inventory: Vec::new(),
            quest: Some(Quest::new("Elda", "Find my ring.", "Family Ring", 40, 30)),
        };
        let line = generator
            .generate_dialogue(&npc, "WARRIOR", "Starter Valley")
            .await
            .unwrap();
        assert!(line.contains("Find my ring."));
    }
}
