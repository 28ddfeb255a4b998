//! # Entity Spawner
//!
//! Turns a chunk's static enemy descriptors into live, difficulty-scaled
//! enemies when the chunk becomes active.

use crate::config::RulesConfig;
use crate::game::{Chunk, ChunkCoord, Enemy, Position};
use crate::generation::utils::chance;
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

/// Difficulty multiplier for a chunk, growing with distance from the origin
/// and with the player's level.
///
/// # Examples
///
/// ```
/// use wayfarer::{difficulty_scale, ChunkCoord, RulesConfig};
///
/// let rules = RulesConfig::default();
/// let scale = difficulty_scale(ChunkCoord::new(2, -1), 1, &rules);
/// assert!((scale - 1.35).abs() < 1e-9);
/// ```
pub fn difficulty_scale(coord: ChunkCoord, player_level: u32, rules: &RulesConfig) -> f64 {
    1.0 + coord.distance_from_origin() as f64 * rules.distance_coefficient
        + player_level as f64 * rules.level_coefficient
}

/// Builds the live enemy list for a chunk.
///
/// Spawns are skipped when they sit on the player's entry point, outside the
/// chunk, on a blocking cell, on an NPC, on a cell already taken by an
/// earlier spawn, or when their index is in `defeated`. The chunk's static
/// descriptors are left untouched.
pub fn spawn_enemies<R: Rng + ?Sized>(
    chunk: &Chunk,
    coord: ChunkCoord,
    player_level: u32,
    entry: Position,
    defeated: Option<&BTreeSet<usize>>,
    rules: &RulesConfig,
    rng: &mut R,
) -> Vec<Enemy> {
    let scale = difficulty_scale(coord, player_level, rules);
    let npc_cells: HashSet<Position> = chunk.npc_spawns.iter().map(|npc| npc.position).collect();
    let mut occupied = HashSet::new();
    let mut enemies = Vec::new();

    for (index, spawn) in chunk.enemy_spawns.iter().enumerate() {
        let pos = spawn.position;
        if pos == entry
            || !chunk.is_walkable(pos)
            || npc_cells.contains(&pos)
            || defeated.map(|set| set.contains(&index)).unwrap_or(false)
            || !occupied.insert(pos)
        {
            continue;
        }

        let is_elite = chance(rng, rules.elite_chance);
        let multiplier = if is_elite { rules.elite_hp_multiplier } else { 1.0 };
        let hp = ((spawn.kind.base_hp() * scale * multiplier).floor() as i32).max(1);
        let name = if is_elite {
            format!("Elite {}", spawn.name)
        } else {
            spawn.name.clone()
        };

        enemies.push(Enemy {
            id: Enemy::make_id(coord, index),
            kind: spawn.kind,
            spawn_index: index,
            position: pos,
            hp,
            max_hp: hp,
            name,
            is_elite,
            flash: None,
        });
    }

    log::debug!(
        "Spawned {} of {} enemies in chunk {} (scale {:.2})",
        enemies.len(),
        chunk.enemy_spawns.len(),
        coord,
        scale
    );
    enemies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, EnemyKind, EnemySpawn, NpcRole, NpcSpawn};
    use crate::generation::utils::create_rng;

    fn spawn(kind: EnemyKind, x: i32, y: i32) -> EnemySpawn {
        EnemySpawn {
            kind,
            position: Position::new(x, y),
            name: format!("{kind:?}"),
        }
    }

    #[test]
    fn test_scale_is_monotonic() {
        let rules = RulesConfig::default();
        let near = difficulty_scale(ChunkCoord::new(1, 0), 1, &rules);
        let far = difficulty_scale(ChunkCoord::new(3, 0), 1, &rules);
        let stronger = difficulty_scale(ChunkCoord::new(1, 0), 4, &rules);
        assert!(far > near);
        assert!(stronger > near);
    }

    #[test]
    fn test_hp_scaling_without_elites() {
        let rules = RulesConfig::for_testing();
        let mut chunk = Chunk::new(20, 15, "Test");
        chunk.enemy_spawns.push(spawn(EnemyKind::Robot, 3, 3));
        let mut rng = create_rng(1);

        // scale = 1 + 2 * 0.1 + 2 * 0.05 = 1.3, robot base 10
        let enemies = spawn_enemies(
            &chunk,
            ChunkCoord::new(2, 0),
            2,
            Position::new(10, 7),
            None,
            &rules,
            &mut rng,
        );
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].hp, 13);
        assert_eq!(enemies[0].max_hp, 13);
        assert_eq!(enemies[0].id, "e_2_0_0");
        assert!(!enemies[0].is_elite);
    }

    #[test]
    fn test_elite_promotion() {
        let rules = RulesConfig {
            elite_chance: 1.0,
            ..RulesConfig::for_testing()
        };
        let mut chunk = Chunk::new(20, 15, "Test");
        chunk.enemy_spawns.push(spawn(EnemyKind::Slime, 3, 3));
        let mut rng = create_rng(1);

        // floor(5 * 1.05 * 1.5) = 7
        let enemies = spawn_enemies(
            &chunk,
            ChunkCoord::origin(),
            1,
            Position::new(10, 7),
            None,
            &rules,
            &mut rng,
        );
        assert_eq!(enemies[0].hp, 7);
        assert!(enemies[0].name.starts_with("Elite "));
    }

    #[test]
    fn test_unsafe_spawns_are_skipped() {
        let rules = RulesConfig::for_testing();
        let mut chunk = Chunk::new(20, 15, "Test");
        chunk.set_cell(Position::new(4, 4), Cell::Wall);
        chunk.npc_spawns.push(NpcSpawn {
            name: "Mira".to_string(),
            role: NpcRole::Villager,
            position: Position::new(6, 6),
            greeting: "Hi".to_string(),
            personality: "kind".to_string(),
            shop_inventory: Vec::new(),
            quest: None,
        });
        chunk.enemy_spawns = vec![
            spawn(EnemyKind::Rat, 10, 7),  // entry point
            spawn(EnemyKind::Rat, 4, 4),   // wall
            spawn(EnemyKind::Rat, 6, 6),   // npc
            spawn(EnemyKind::Rat, 40, 1),  // out of bounds
            spawn(EnemyKind::Rat, 8, 8),   // kept
            spawn(EnemyKind::Rat, 8, 8),   // stacked
            spawn(EnemyKind::Rat, 9, 9),   // defeated
        ];
        let defeated: BTreeSet<usize> = [6].into_iter().collect();
        let mut rng = create_rng(1);

        let enemies = spawn_enemies(
            &chunk,
            ChunkCoord::origin(),
            1,
            Position::new(10, 7),
            Some(&defeated),
            &rules,
            &mut rng,
        );
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].spawn_index, 4);
        assert_eq!(chunk.enemy_spawns.len(), 7);
    }
}
