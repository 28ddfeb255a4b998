//! # Prompts and Responses
//!
//! Builds the generation prompts and turns the model's JSON back into a
//! chunk. Parsing is lenient about shape and strict about meaning: unknown
//! cell codes read as floor, unknown enemy types are dropped, and quests get
//! a fresh id and their giver's name whatever the model said.

use crate::game::{
    Cell, Chunk, ChunkCoord, Direction, EnemyKind, EnemySpawn, NpcRole, NpcSpawn, Position,
    Quest,
};
use crate::generation::{biome_name, is_city, EdgeOpenings};
use crate::WayfarerResult;
use serde::Deserialize;
use std::fmt::Write;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkDto {
    #[serde(default)]
    layout: Vec<Vec<i64>>,
    #[serde(default)]
    flavor_text: String,
    #[serde(default)]
    enemies: Vec<EnemyDto>,
    #[serde(default)]
    npcs: Vec<NpcDto>,
}

#[derive(Debug, Deserialize)]
struct EnemyDto {
    #[serde(rename = "type")]
    kind: String,
    x: i32,
    y: i32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NpcDto {
    name: String,
    #[serde(default)]
    role: String,
    x: i32,
    y: i32,
    #[serde(default)]
    greeting: String,
    #[serde(default)]
    personality: String,
    #[serde(default)]
    shop_inventory: Option<Vec<String>>,
    #[serde(default)]
    active_quest: Option<QuestDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestDto {
    #[serde(default)]
    description: String,
    #[serde(default)]
    target_item_name: String,
    #[serde(default)]
    reward_xp: u32,
    #[serde(default)]
    reward_gold: u32,
}

fn parse_role(role: &str) -> NpcRole {
    match role.trim().to_ascii_uppercase().as_str() {
        "SHOPKEEPER" => NpcRole::Shopkeeper,
        "GUARD" => NpcRole::Guard,
        "ELDER" => NpcRole::Elder,
        "QUEST_GIVER" => NpcRole::QuestGiver,
        _ => NpcRole::Villager,
    }
}

/// Removes Markdown code fences around a JSON payload.
pub fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Builds a chunk from a model response.
///
/// The layout is padded or truncated to `width` x `height`; edge openings are
/// not checked here.
///
/// # Examples
///
/// ```
/// use wayfarer::{parse_chunk_response, Cell, ChunkCoord, Position};
///
/// let text = "```json\n{\"layout\": [[0, 1], [1, 0]], \"flavorText\": \"Dust.\"}\n```";
/// let chunk = parse_chunk_response(text, ChunkCoord::new(1, 0), 4, 4).unwrap();
/// assert_eq!(chunk.width, 4);
/// assert_eq!(chunk.cell(Position::new(1, 0)), Some(Cell::Wall));
/// assert_eq!(chunk.flavor_text, "Dust.");
/// ```
pub fn parse_chunk_response(
    text: &str,
    coord: ChunkCoord,
    width: usize,
    height: usize,
) -> WayfarerResult<Chunk> {
    let dto: ChunkDto = serde_json::from_str(strip_fences(text))?;

    let mut chunk = Chunk::new(width, height, biome_name(coord));
    chunk.is_city = is_city(coord);
    chunk.flavor_text = dto.flavor_text;
    chunk.layout = dto
        .layout
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|code| {
                    u8::try_from(code)
                        .ok()
                        .and_then(|code| Cell::try_from(code).ok())
                        .unwrap_or(Cell::Floor)
                })
                .collect()
        })
        .collect();
    chunk.normalize_dimensions(width, height);

    let dropped = dto
        .enemies
        .iter()
        .filter(|enemy| EnemyKind::from_name(&enemy.kind).is_none())
        .count();
    if dropped > 0 {
        log::debug!("Dropped {} enemies of unknown type in chunk {}", dropped, coord);
    }
    chunk.enemy_spawns = dto
        .enemies
        .into_iter()
        .filter_map(|enemy| {
            let kind = EnemyKind::from_name(&enemy.kind)?;
            let name = if enemy.name.trim().is_empty() {
                format!("{kind:?}")
            } else {
                enemy.name
            };
            Some(EnemySpawn {
                kind,
                position: Position::new(enemy.x, enemy.y),
                name,
            })
        })
        .collect();

    chunk.npc_spawns = dto
        .npcs
        .into_iter()
        .map(|npc| {
            let quest = npc
                .active_quest
                .filter(|quest| {
                    !quest.description.trim().is_empty()
                        && !quest.target_item_name.trim().is_empty()
                })
                .map(|quest| {
                    Quest::new(
                        npc.name.clone(),
                        quest.description,
                        quest.target_item_name,
                        quest.reward_xp,
                        quest.reward_gold,
                    )
                });
            let greeting = if npc.greeting.trim().is_empty() {
                "Hello.".to_string()
            } else {
                npc.greeting
            };
            NpcSpawn {
                role: parse_role(&npc.role),
                position: Position::new(npc.x, npc.y),
                greeting,
                personality: npc.personality,
                shop_inventory: npc.shop_inventory.unwrap_or_default(),
                quest,
                name: npc.name,
            }
        })
        .collect();

    Ok(chunk)
}

/// Prompt asking for one chunk as JSON.
pub fn chunk_prompt(coord: ChunkCoord, openings: &EdgeOpenings) -> String {
    let width = openings.width;
    let height = openings.height;
    let city = is_city(coord);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Design a {width}x{height} tile map for a top-down RPG in the {} biome.",
        biome_name(coord)
    );
    let _ = writeln!(
        prompt,
        "The world is open: never wall the map in, and keep paths to every edge."
    );
    for direction in Direction::all() {
        let Some(indices) = openings.get(direction) else {
            continue;
        };
        let list = indices
            .iter()
            .map(|index| index.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let edge = match direction {
            Direction::North => "top row (y=0) at x=".to_string(),
            Direction::South => format!("bottom row (y={}) at x=", height.saturating_sub(1)),
            Direction::West => "left column (x=0) at y=".to_string(),
            Direction::East => format!("right column (x={}) at y=", width.saturating_sub(1)),
        };
        let _ = writeln!(prompt, "Keep the {edge}[{list}] open as floor.");
    }
    let _ = writeln!(
        prompt,
        "Cell codes: 0 floor, 1 wall, 2 hazard, 3 treasure chest, 5 building."
    );
    if city {
        let _ = writeln!(
            prompt,
            "This is a town: buildings (5) along clear streets (0), and 2-3 NPCs. \
             One may be a QUEST_GIVER with an activeQuest; a SHOPKEEPER may list shopInventory."
        );
    } else {
        let _ = writeln!(
            prompt,
            "This is wilderness: obstacles (1), a few hazards, and 3-5 enemies \
             of type SLIME, RAT, SKELETON, ROBOT, GHOST or ALIEN."
        );
    }
    let _ = writeln!(
        prompt,
        "Answer with JSON only: {{\"layout\": [[...]], \"flavorText\": \"...\", \
         \"enemies\": [{{\"type\", \"x\", \"y\", \"name\"}}], \
         \"npcs\": [{{\"name\", \"role\", \"x\", \"y\", \"greeting\", \"personality\", \
         \"shopInventory\", \"activeQuest\": {{\"description\", \"targetItemName\", \
         \"rewardXp\", \"rewardGold\"}}}}]}}"
    );
    prompt
}

/// Prompt asking for a short line of NPC chat.
pub fn dialogue_prompt(npc: &NpcSpawn, class_name: &str, biome_name: &str) -> String {
    let mut prompt = format!(
        "Write at most two sentences of RPG dialogue.\n\
         Speaker: {} ({:?}), personality: {}.\n\
         Location: {biome_name}. The listener is a {class_name}.\n",
        npc.name, npc.role, npc.personality
    );
    if let Some(quest) = &npc.quest {
        let _ = writeln!(
            prompt,
            "The speaker needs help: \"{}\". Ask for it.",
            quest.description
        );
    }
    prompt.push_str("Reply with the spoken text only.\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_unknown_enemies_are_dropped() {
        let text = r#"{
            "layout": [],
            "flavorText": "Quiet.",
            "enemies": [
                {"type": "SLIME", "x": 3, "y": 3, "name": "Goo"},
                {"type": "DRAGON", "x": 4, "y": 4, "name": "Smaug"}
            ],
            "npcs": []
        }"#;
        let chunk = parse_chunk_response(text, ChunkCoord::new(2, 2), 20, 15).unwrap();
        assert_eq!(chunk.enemy_spawns.len(), 1);
        assert_eq!(chunk.enemy_spawns[0].kind, EnemyKind::Slime);
        // empty layout is padded with walls
        assert_eq!(chunk.layout.len(), 15);
        assert_eq!(chunk.cell(Position::new(5, 5)), Some(Cell::Wall));
    }

    #[test]
    fn test_quest_is_rewritten() {
        let text = r#"{
            "layout": [[0]],
            "npcs": [{
                "name": "Oona", "role": "quest_giver", "x": 4, "y": 4,
                "greeting": "Psst.", "personality": "sly",
                "activeQuest": {"id": "q1", "giverName": "Someone", "description": "Find my ring.",
                                "targetItemName": "Ring", "rewardXp": 40, "rewardGold": 30}
            }]
        }"#;
        let chunk = parse_chunk_response(text, ChunkCoord::origin(), 20, 15).unwrap();
        let npc = &chunk.npc_spawns[0];
        assert_eq!(npc.role, NpcRole::QuestGiver);
        let quest = npc.quest.as_ref().unwrap();
        assert_eq!(quest.giver_name, "Oona");
        assert_ne!(quest.id, "q1");
        assert!(!quest.is_completed);
        assert_eq!(quest.reward_gold, 30);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_chunk_response("not json", ChunkCoord::origin(), 20, 15).is_err());
    }

    #[test]
    fn test_chunk_prompt_lists_required_openings() {
        let mut openings = EdgeOpenings::unconstrained(20, 15);
        openings.set(Direction::East, Some(vec![6, 7]));
        let prompt = chunk_prompt(ChunkCoord::new(-1, 0), &openings);
        assert!(prompt.contains("right column (x=19) at y=[6,7]"));
        assert!(!prompt.contains("top row"));
    }
}
