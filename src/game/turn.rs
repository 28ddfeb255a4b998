//! # Turn Engine
//!
//! One movement input is one turn. The cascade runs in a fixed order:
//! NPC interaction, chunk edge, walls, melee, the move itself, regeneration,
//! tile effects, enemy turns and finally the level-up check.

use crate::game::{Cell, Direction, GameEvent, InventoryItem, Position, RegenResource};
use crate::generation::utils::chance;
use crate::input::Action;
use crate::scenes::GameMode;
use crate::{Session, WayfarerError, WayfarerResult};
use rand::Rng;
use std::collections::HashSet;

impl Session {
    pub(crate) fn handle_playing_input(&mut self, action: Action) -> WayfarerResult<()> {
        match action {
            Action::Up => self.player_move(Direction::North),
            Action::Down => self.player_move(Direction::South),
            Action::Left => self.player_move(Direction::West),
            Action::Right => self.player_move(Direction::East),
            Action::Primary => {
                if self.use_ability()? {
                    self.process_enemy_turns()?;
                    self.turn_number += 1;
                    self.enter_level_up_if_pending()?;
                }
                Ok(())
            }
            Action::Secondary => {
                self.cursors.inventory = 0;
                self.set_mode(GameMode::Inventory)
            }
            Action::Start => {
                self.request_save();
                self.say("GAME SAVED");
                Ok(())
            }
            Action::Select => Ok(()),
        }
    }

    /// Runs the turn cascade for a step in `direction`.
    pub fn player_move(&mut self, direction: Direction) -> WayfarerResult<()> {
        if self.mode() != GameMode::Playing {
            return Err(WayfarerError::InvalidAction(format!(
                "cannot move while in {:?}",
                self.mode()
            )));
        }

        let from = self.player.position;
        let target = from + direction.to_delta();

        if let Some(npc_index) = self.npcs.iter().position(|npc| npc.position == target) {
            return self.start_dialogue(npc_index);
        }

        let chunk = self
            .active_chunk()
            .ok_or_else(|| WayfarerError::InvalidState("no active chunk".to_string()))?;
        if !chunk.in_bounds(target) {
            return self.transition_chunk(direction);
        }
        if chunk.cell(target).map(Cell::is_blocking).unwrap_or(true) {
            self.push_event(GameEvent::Bumped { at: target });
            return Ok(());
        }

        if let Some(index) = self.enemies.iter().position(|enemy| enemy.position == target) {
            let killed = self.player_attack(index)?;
            if !killed {
                self.process_enemy_turns()?;
            }
            self.turn_number += 1;
            return self.enter_level_up_if_pending();
        }

        self.player.position = target;
        self.player.steps += 1;
        self.push_event(GameEvent::PlayerMoved { from, to: target });
        self.apply_regeneration();

        self.resolve_tile_effects()?;
        self.process_enemy_turns()?;
        self.turn_number += 1;
        self.enter_level_up_if_pending()
    }

    /// Periodic regeneration of the class's resource.
    fn apply_regeneration(&mut self) {
        let interval = self.rules.regen_interval;
        if interval == 0 || self.player.steps % interval != 0 {
            return;
        }
        let Some(resource) = self.player_class().map(|class| class.regen) else {
            return;
        };

        let stats = &mut self.player.stats;
        let (hp, mp) = match resource {
            RegenResource::Hp if stats.hp < stats.max_hp => {
                stats.hp += 1;
                (1, 0)
            }
            RegenResource::Mp if stats.mp < stats.max_mp => {
                stats.mp += 1;
                (0, 1)
            }
            _ => (0, 0),
        };
        if hp + mp > 0 {
            self.push_event(GameEvent::Regenerated { hp, mp });
        }
    }

    /// Hazard, treasure and dropped items at the player's tile, in that order.
    fn resolve_tile_effects(&mut self) -> WayfarerResult<()> {
        let pos = self.player.position;
        let Some(cell) = self.active_chunk().and_then(|chunk| chunk.cell(pos)) else {
            return Ok(());
        };

        match cell {
            Cell::Hazard => {
                self.clear_cell(pos);
                self.say("Ouch! A trap!");
                self.take_damage(self.rules.hazard_damage, "hazard")?;
            }
            Cell::Treasure => {
                self.clear_cell(pos);
                self.open_treasure();
            }
            Cell::DroppedItem => {
                self.clear_cell(pos);
                self.pick_up_drop();
            }
            _ => {}
        }
        Ok(())
    }

    fn clear_cell(&mut self, pos: Position) {
        if let Some(chunk) = self.active_chunk_mut() {
            chunk.set_cell(pos, Cell::Floor);
        }
    }

    fn open_treasure(&mut self) {
        let quest_item = self
            .player
            .active_quest
            .as_ref()
            .filter(|quest| !quest.is_completed)
            .map(|quest| quest.target_item_name.clone());

        if let Some(name) = quest_item {
            if chance(&mut self.rng, self.rules.quest_item_chance) {
                self.say(format!("Found {name}!"));
                self.gain_item(InventoryItem::quest_item(name));
                return;
            }
        }
        if chance(&mut self.rng, 0.3) {
            self.say("Found a Potion!");
            self.gain_item(InventoryItem::potion());
            return;
        }
        let gold = self.rng.gen_range(5..=15);
        self.gain_gold(gold);
        self.say(format!("Found {gold} gold!"));
    }

    fn pick_up_drop(&mut self) {
        let roll: f64 = self.rng.gen();
        if roll < 0.5 {
            self.say("Picked up a Potion.");
            self.gain_item(InventoryItem::potion());
        } else if roll < 0.7 {
            self.say("Picked up an Ether.");
            self.gain_item(InventoryItem::ether());
        } else {
            let gold = self.rng.gen_range(3..=8);
            self.gain_gold(gold);
            self.say(format!("Picked up {gold} gold."));
        }
    }

    pub(crate) fn gain_item(&mut self, item: InventoryItem) {
        let name = item.name.clone();
        self.player.inventory.add(item);
        self.push_event(GameEvent::ItemGained { name });
    }

    pub(crate) fn gain_gold(&mut self, amount: u32) {
        self.player.score += amount;
        self.push_event(GameEvent::GoldGained { amount });
    }

    /// Every enemy acts once: adjacent ones attack, nearby ones close in.
    ///
    /// Moves are applied one enemy at a time, so a cell vacated or taken
    /// earlier in the pass is seen by later enemies. Stops once the player
    /// dies.
    pub fn process_enemy_turns(&mut self) -> WayfarerResult<()> {
        let npc_cells: HashSet<Position> = self.npcs.iter().map(|npc| npc.position).collect();

        for index in 0..self.enemies.len() {
            if !self.player.stats.is_alive() {
                break;
            }

            let pos = self.enemies[index].position;
            let player = self.player.position;
            let distance = pos.manhattan_distance(player);

            if distance == 1 {
                self.enemy_attack(index)?;
                continue;
            }
            if distance == 0 || distance >= self.rules.aggro_radius {
                continue;
            }

            let dx = player.x - pos.x;
            let dy = player.y - pos.y;
            let step = if dx.abs() > dy.abs() {
                Position::new(pos.x + dx.signum(), pos.y)
            } else {
                Position::new(pos.x, pos.y + dy.signum())
            };

            let walkable = self
                .active_chunk()
                .map(|chunk| chunk.is_walkable(step))
                .unwrap_or(false);
            let occupied = step == player
                || npc_cells.contains(&step)
                || self.enemies.iter().any(|enemy| enemy.position == step);
            if walkable && !occupied {
                self.enemies[index].position = step;
            }
        }
        Ok(())
    }
}
