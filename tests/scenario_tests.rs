//! Combat, streaming, shop, progression and quest scenarios driven through
//! the public session API.

mod common;

use common::{chunk_request, open_chunk, playing_session, slime};
use wayfarer::{
    Action, Cell, Chunk, ChunkCoord, Direction, GameEvent, GameMode, InventoryItem, NpcRole,
    NpcSpawn, Position, Quest, WayfarerResult,
};

#[test]
fn test_melee_hit_leaves_survivor_in_place() -> WayfarerResult<()> {
    let mut session = playing_session(open_chunk())?;
    session.player.stats.atk = 3;
    session.player.stats.def = 2;
    session.player.position = Position::new(10, 7);
    session.enemies = vec![slime(11, 7, 5)];

    session.handle_input(Action::Right)?;

    assert_eq!(session.enemies.len(), 1);
    assert_eq!(session.enemies[0].hp, 2);
    // attacking does not move the player
    assert_eq!(session.player.position, Position::new(10, 7));
    Ok(())
}

#[test]
fn test_second_hit_kills_and_rewards() -> WayfarerResult<()> {
    let mut session = playing_session(open_chunk())?;
    session.player.stats.atk = 3;
    session.player.stats.def = 2;
    session.player.stats.wisdom = 0;
    session.player.position = Position::new(10, 7);
    session.enemies = vec![slime(11, 7, 5)];
    session.handle_input(Action::Right)?;
    assert_eq!(session.enemies[0].hp, 2);

    session.rules.loot_drop_chance = 1.0;
    let score = session.player.score;
    let report = session.handle_input(Action::Right)?;

    assert!(session.enemies.is_empty());
    assert_eq!(session.player.score, score + session.rules.kill_score);
    assert_eq!(
        session.player.stats.xp,
        session.rules.kill_xp_base + 5,
        "xp is the flat reward plus the slime's max hp"
    );
    assert!(report
        .events
        .iter()
        .any(|event| matches!(event, GameEvent::EnemyDied { .. })));
    // the loot roll ran and left an item behind
    assert_eq!(
        session.active_chunk().unwrap().cell(Position::new(11, 7)),
        Some(Cell::DroppedItem)
    );
    Ok(())
}

#[test]
fn test_west_edge_requests_neighbor_with_matching_opening() -> WayfarerResult<()> {
    let mut session = playing_session(open_chunk())?;
    session.player.position = Position::new(0, 6);

    let report = session.handle_input(Action::Left)?;
    assert_eq!(session.mode(), GameMode::Loading);

    let request = chunk_request(&report).expect("a chunk request").clone();
    assert_eq!(request.coord, ChunkCoord::new(-1, 0));
    let east = request.openings.get(Direction::East).expect("east edge constrained");
    assert!(east.contains(&6));

    session.complete_chunk_load(request.ticket, Ok(Chunk::new(20, 15, "West")))?;
    assert_eq!(session.mode(), GameMode::Playing);
    assert_eq!(session.coord, ChunkCoord::new(-1, 0));
    assert_eq!(session.player.position, Position::new(19, 6));
    Ok(())
}

#[test]
fn test_purchase_without_enough_gold_is_rejected() -> WayfarerResult<()> {
    let mut session = playing_session(open_chunk())?;
    session.player.score = 15;
    session.shop_items = vec![InventoryItem::elixir().with_cost(20)];
    let inventory = session.player.inventory.clone();

    assert!(!session.purchase(0));
    assert_eq!(session.player.score, 15);
    assert_eq!(session.player.inventory, inventory);
    assert_eq!(session.message, "Not enough gold!");
    Ok(())
}

#[test]
fn test_big_kill_levels_up_once_per_threshold() -> WayfarerResult<()> {
    let mut session = playing_session(open_chunk())?;
    session.player.stats.wisdom = 0;
    session.player.position = Position::new(10, 7);
    // 5 + 125 = 130 xp against thresholds of 50 and 75
    let mut target = slime(11, 7, 1);
    target.max_hp = 125;
    session.enemies = vec![target];

    session.handle_input(Action::Right)?;

    let stats = &session.player.stats;
    assert_eq!(stats.level, 3);
    assert_eq!(stats.points_available, 2);
    assert_eq!(stats.xp, 5);
    assert_eq!(stats.xp_to_next, 112);
    assert_eq!(session.mode(), GameMode::LevelUp);

    // spending both points leads back to play
    session.handle_input(Action::Primary)?;
    session.handle_input(Action::Primary)?;
    assert_eq!(session.player.stats.points_available, 0);
    session.tick(session.rules.level_up_exit_delay_ms);
    assert_eq!(session.mode(), GameMode::Playing);
    Ok(())
}

#[test]
fn test_second_quest_is_refused_while_one_is_open() -> WayfarerResult<()> {
    let mut chunk = open_chunk();
    chunk.npc_spawns.push(NpcSpawn {
        name: "Oona".to_string(),
        role: NpcRole::QuestGiver,
        position: Position::new(11, 7),
        greeting: "Psst.".to_string(),
        personality: "sly".to_string(),
        shop_inventory: Vec::new(),
        quest: Some(Quest::new("Oona", "Find my ring.", "Ring", 40, 30)),
    });
    let mut session = playing_session(chunk)?;
    session.player.position = Position::new(10, 7);
    let held = Quest::new("Bram", "Find my hat.", "Hat", 10, 10);
    session.player.active_quest = Some(held.clone());

    let report = session.handle_input(Action::Right)?;

    assert_eq!(session.mode(), GameMode::Dialogue);
    assert_eq!(session.player.active_quest, Some(held));
    assert!(!report
        .events
        .iter()
        .any(|event| matches!(event, GameEvent::QuestAccepted { .. })));
    Ok(())
}

#[test]
fn test_quest_round_trip_pays_out() -> WayfarerResult<()> {
    let mut chunk = open_chunk();
    chunk.npc_spawns.push(NpcSpawn {
        name: "Oona".to_string(),
        role: NpcRole::QuestGiver,
        position: Position::new(11, 7),
        greeting: "Psst.".to_string(),
        personality: "sly".to_string(),
        shop_inventory: Vec::new(),
        quest: Some(Quest::new("Oona", "Find my ring.", "Ring", 0, 30)),
    });
    let mut session = playing_session(chunk)?;
    session.player.position = Position::new(10, 7);

    session.handle_input(Action::Right)?;
    assert!(session.player.has_open_quest());
    session.handle_input(Action::Secondary)?;

    session.player.inventory.add(InventoryItem::quest_item("Ring"));
    let report = session.handle_input(Action::Right)?;

    assert!(!session.player.has_open_quest());
    assert_eq!(session.player.score, 30);
    assert_eq!(session.player.inventory.count_of("Ring"), 0);
    assert!(report.events.contains(&GameEvent::Saved));

    // the same giver does not offer the finished quest again
    session.handle_input(Action::Secondary)?;
    let report = session.handle_input(Action::Right)?;
    assert!(!report
        .events
        .iter()
        .any(|event| matches!(event, GameEvent::QuestAccepted { .. })));
    Ok(())
}

#[test]
fn test_hazard_hurts_even_with_heavy_armor() -> WayfarerResult<()> {
    let mut chunk = open_chunk();
    chunk.layout[7][11] = Cell::Hazard;
    let mut session = playing_session(chunk)?;
    session.player.position = Position::new(10, 7);
    session.player.stats.def = 50;
    let hp = session.player.stats.hp;

    session.handle_input(Action::Right)?;

    assert_eq!(session.player.stats.hp, hp - 1);
    assert_eq!(session.message, "Ouch! A trap!");
    assert_eq!(
        session.active_chunk().unwrap().cell(Position::new(11, 7)),
        Some(Cell::Floor)
    );
    Ok(())
}
