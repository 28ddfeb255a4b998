//! # Combat
//!
//! Damage resolution for both sides: melee, class abilities, crits, dodges,
//! deaths and the loot they leave behind.

use crate::game::{Ability, Cell, CharacterClass, GameEvent, MessageImportance};
use crate::generation::utils::chance;
use crate::scenes::GameMode;
use crate::{Session, WayfarerResult};
use rand::Rng;

impl Session {
    /// Class template of the current character.
    pub fn player_class(&self) -> Option<&CharacterClass> {
        self.classes
            .iter()
            .find(|class| class.name == self.player.class_name)
    }

    /// Melee attack against the enemy at `index`. Returns true on a kill.
    pub fn player_attack(&mut self, index: usize) -> WayfarerResult<bool> {
        let amount = self.player.stats.atk.max(1);
        self.damage_enemy(index, amount, "melee")
    }

    /// Applies damage to a live enemy, rolling for a critical hit.
    ///
    /// A kill awards score and experience, may leave a dropped item on the
    /// enemy's tile and removes it from the active list. Returns true on a
    /// kill.
    pub fn damage_enemy(&mut self, index: usize, amount: i32, source: &str) -> WayfarerResult<bool> {
        if index >= self.enemies.len() {
            return Ok(false);
        }

        let crit_chance = self.player.stats.agility as f64 * self.rules.crit_per_agility;
        let critical = chance(&mut self.rng, crit_chance);
        let damage = if critical { amount * 2 } else { amount };

        let enemy = &mut self.enemies[index];
        enemy.hp -= damage;
        let event = GameEvent::EnemyDamaged {
            enemy_id: enemy.id.clone(),
            damage,
            critical,
            source: source.to_string(),
        };
        let killed = !enemy.is_alive();
        if !killed {
            enemy.flash = Some(self.rules.flash_ms);
        }
        self.push_event(event);

        if !killed {
            if critical {
                self.say("Critical hit!");
            }
            return Ok(false);
        }

        let enemy = self.enemies.remove(index);
        let mut score = self.rules.kill_score;
        let mut xp = self.rules.kill_xp_base + enemy.max_hp.max(0) as u32;
        if enemy.is_elite {
            score += self.rules.elite_score_bonus;
            xp += self.rules.elite_xp_bonus;
        }
        self.player.score += score;

        let drop_chance = if enemy.is_elite {
            self.rules.elite_loot_drop_chance
        } else {
            self.rules.loot_drop_chance
        };
        if chance(&mut self.rng, drop_chance) {
            let dropped = match self.active_chunk_mut() {
                Some(chunk)
                    if chunk.cell(enemy.position) == Some(Cell::Floor)
                        && !chunk.is_border(enemy.position) =>
                {
                    chunk.set_cell(enemy.position, Cell::DroppedItem)
                }
                _ => false,
            };
            if dropped {
                self.push_event(GameEvent::LootDropped { at: enemy.position });
            }
        }

        if self.rules.persist_defeated_enemies {
            self.defeated
                .entry(self.coord)
                .or_default()
                .insert(enemy.spawn_index);
        }

        log::debug!("{} slain in chunk {}", enemy.name, self.coord);
        self.push_event(GameEvent::EnemyDied {
            enemy_id: enemy.id,
            name: enemy.name.clone(),
            xp,
            score,
        });
        self.say(format!("Defeated {}!", enemy.name));
        self.gain_xp(xp);
        Ok(true)
    }

    /// Uses the class ability. Returns true if a turn was spent.
    ///
    /// Too little mana or no target in range shows a message and changes
    /// nothing.
    pub fn use_ability(&mut self) -> WayfarerResult<bool> {
        let Some(ability) = self.player_class().map(|class| class.ability) else {
            return Ok(false);
        };

        let cost = match ability {
            Ability::SpinSlash => self.rules.spin_slash_cost,
            Ability::Thunder => self.rules.thunder_cost,
        };
        if self.player.stats.mp < cost {
            self.say("Not enough MP!");
            return Ok(false);
        }

        let origin = self.player.position;
        let targets: Vec<usize> = match ability {
            Ability::SpinSlash => self
                .enemies
                .iter()
                .enumerate()
                .filter(|(_, enemy)| enemy.position.chebyshev_distance(origin) <= 1)
                .map(|(index, _)| index)
                .collect(),
            Ability::Thunder => self
                .enemies
                .iter()
                .enumerate()
                .filter(|(_, enemy)| {
                    enemy.position.manhattan_distance(origin) < self.rules.aggro_radius
                })
                .map(|(index, _)| index)
                .collect(),
        };
        if targets.is_empty() {
            self.say("No enemies in range!");
            return Ok(false);
        }

        self.player.stats.mp -= cost;
        let name = ability.display_name();
        match ability {
            Ability::SpinSlash => {
                let amount = self.player.stats.atk.max(1);
                self.push_event(GameEvent::AbilityUsed {
                    name: name.to_string(),
                    targets: targets.len(),
                });
                for &index in targets.iter().rev() {
                    self.damage_enemy(index, amount, name)?;
                }
            }
            Ability::Thunder => {
                let index = targets[self.rng.gen_range(0..targets.len())];
                let amount = (self.player.stats.atk + self.player.stats.will as i32).max(1);
                self.push_event(GameEvent::AbilityUsed {
                    name: name.to_string(),
                    targets: 1,
                });
                self.damage_enemy(index, amount, name)?;
            }
        }
        Ok(true)
    }

    /// Damages the player, reduced by defense but never below 1.
    ///
    /// Returns the damage dealt. Reaching zero hit points ends the game.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::{RulesConfig, Session};
    ///
    /// let mut session = Session::new(RulesConfig::for_testing(), 1).unwrap();
    /// session.player.stats.def = 10;
    /// assert_eq!(session.take_damage(3, "trap").unwrap(), 1);
    /// assert_eq!(session.take_damage(0, "nothing").unwrap(), 0);
    /// ```
    pub fn take_damage(&mut self, amount: u32, reason: &str) -> WayfarerResult<u32> {
        if amount == 0 {
            return Ok(0);
        }
        let def = self.player.stats.def.max(0) as u32;
        let damage = amount.saturating_sub(def).max(1);
        self.player.stats.hp = self.player.stats.hp.saturating_sub(damage);
        self.push_event(GameEvent::PlayerDamaged {
            amount: damage,
            reason: reason.to_string(),
        });

        if !self.player.stats.is_alive() {
            log::info!("Player killed by {}", reason);
            self.say_with(
                format!("You were slain by {reason}."),
                MessageImportance::Critical,
            );
            if self.mode() != GameMode::GameOver {
                self.set_mode(GameMode::GameOver)?;
            }
        }
        Ok(damage)
    }

    /// Melee swing from the enemy at `index`, after the player's dodge roll.
    pub(crate) fn enemy_attack(&mut self, index: usize) -> WayfarerResult<()> {
        let Some(enemy) = self.enemies.get(index) else {
            return Ok(());
        };
        let enemy_id = enemy.id.clone();
        let name = enemy.name.clone();
        let mut damage = 1 + (enemy.max_hp / self.rules.enemy_damage_divisor).max(0) as u32;
        if enemy.is_elite {
            damage += self.rules.elite_damage_bonus;
        }

        let dodge_chance = self.player.stats.agility as f64 * self.rules.dodge_per_agility;
        if chance(&mut self.rng, dodge_chance) {
            self.push_event(GameEvent::Dodged { enemy_id });
            self.say(format!("Dodged the {name}!"));
            return Ok(());
        }

        self.take_damage(damage, &name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::game::{ChunkCoord, Enemy, EnemyKind, Position};
    use crate::{GameEvent, GameMode, Session};

    fn playing_session(class_index: usize) -> Session {
        Session::playing_for_tests(class_index)
    }

    fn enemy(x: i32, y: i32, hp: i32) -> Enemy {
        Enemy {
            id: format!("e_0_0_{x}{y}"),
            kind: EnemyKind::Slime,
            spawn_index: 0,
            position: Position::new(x, y),
            hp,
            max_hp: hp,
            name: "Slime".to_string(),
            is_elite: false,
            flash: None,
        }
    }

    #[test]
    fn test_attack_leaves_wounded_enemy() {
        let mut session = playing_session(0);
        session.player.stats.atk = 3;
        session.enemies = vec![enemy(11, 7, 5)];

        let killed = session.player_attack(0).unwrap();
        assert!(!killed);
        assert_eq!(session.enemies[0].hp, 2);
        assert!(session.enemies[0].flash.is_some());
    }

    #[test]
    fn test_kill_awards_score_and_xp() {
        let mut session = playing_session(0);
        session.player.stats.atk = 3;
        session.enemies = vec![enemy(11, 7, 5)];
        session.enemies[0].hp = 2;

        assert!(session.player_attack(0).unwrap());
        assert!(session.enemies.is_empty());
        assert_eq!(session.player.score, 5);
        // 5 + max_hp 5, wisdom 1 → floor(10 * 1.05)
        assert_eq!(session.player.stats.xp, 10);
    }

    #[test]
    fn test_loot_drop_marks_tile() {
        let mut session = playing_session(0);
        session.rules.loot_drop_chance = 1.0;
        session.enemies = vec![enemy(12, 7, 1)];

        session.player_attack(0).unwrap();
        let chunk = session.active_chunk().unwrap();
        assert_eq!(chunk.cell(Position::new(12, 7)), Some(crate::game::Cell::DroppedItem));
    }

    #[test]
    fn test_defeat_is_recorded_when_persistent() {
        let mut session = playing_session(0);
        session.rules.persist_defeated_enemies = true;
        let mut slime = enemy(11, 7, 1);
        slime.spawn_index = 3;
        session.enemies = vec![slime];

        session.player_attack(0).unwrap();
        assert!(session.defeated[&ChunkCoord::origin()].contains(&3));
    }

    #[test]
    fn test_damage_floor_and_game_over() {
        let mut session = playing_session(0);
        session.player.stats.def = 5;
        session.player.stats.hp = 2;

        assert_eq!(session.take_damage(1, "pebble").unwrap(), 1);
        assert_eq!(session.player.stats.hp, 1);
        session.take_damage(50, "boulder").unwrap();
        assert_eq!(session.player.stats.hp, 0);
        assert_eq!(session.mode(), GameMode::GameOver);
    }

    #[test]
    fn test_spin_slash_hits_adjacent_only() {
        let mut session = playing_session(0);
        session.player.stats.atk = 1;
        session.enemies = vec![enemy(11, 8, 5), enemy(13, 7, 5), enemy(9, 6, 1)];

        assert!(session.use_ability().unwrap());
        assert_eq!(session.player.stats.mp, 2);
        assert_eq!(session.enemies.len(), 2);
        assert_eq!(session.enemies[0].hp, 4);
        assert_eq!(session.enemies[1].hp, 5);
    }

    #[test]
    fn test_ability_without_target_costs_nothing() {
        let mut session = playing_session(1);
        session.enemies = vec![enemy(1, 1, 5)];

        assert!(!session.use_ability().unwrap());
        assert_eq!(session.player.stats.mp, 15);
        assert_eq!(session.message, "No enemies in range!");
    }

    #[test]
    fn test_thunder_needs_mana() {
        let mut session = playing_session(1);
        session.player.stats.mp = 3;
        session.enemies = vec![enemy(12, 7, 50)];

        assert!(!session.use_ability().unwrap());
        assert_eq!(session.enemies[0].hp, 50);
        assert_eq!(session.message, "Not enough MP!");
    }

    #[test]
    fn test_thunder_uses_atk_plus_will() {
        let mut session = playing_session(1);
        session.enemies = vec![enemy(12, 7, 50)];

        assert!(session.use_ability().unwrap());
        assert_eq!(session.enemies[0].hp, 50 - 12);
        assert_eq!(session.player.stats.mp, 11);
    }

    #[test]
    fn test_enemy_attack_uses_max_hp() {
        let mut session = playing_session(1);
        session.enemies = vec![enemy(11, 7, 10)];

        session.enemy_attack(0).unwrap();
        // 1 + 10 / 5 = 3, mage def 0
        assert_eq!(session.player.stats.hp, 9);
    }

    #[test]
    fn test_dodge_prevents_damage() {
        let mut session = playing_session(1);
        session.rules.dodge_per_agility = 1.0;
        session.enemies = vec![enemy(11, 7, 10)];

        session.enemy_attack(0).unwrap();
        assert_eq!(session.player.stats.hp, 12);
        assert!(session
            .take_report()
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::Dodged { .. })));
    }
}
