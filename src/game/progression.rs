//! # Progression
//!
//! Experience, levels and attribute points.

use crate::game::GameEvent;
use crate::input::Action;
use crate::scenes::GameMode;
use crate::{Session, WayfarerResult};
use serde::{Deserialize, Serialize};

/// Attribute a level-up point can be spent on, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// +1 grit, +5 max hp and hp
    Grit,
    Agility,
    /// +1 will, +3 max mp and mp
    Will,
    Wisdom,
}

impl Attribute {
    pub fn all() -> [Attribute; 4] {
        [
            Attribute::Grit,
            Attribute::Agility,
            Attribute::Will,
            Attribute::Wisdom,
        ]
    }

    pub fn from_index(index: usize) -> Option<Attribute> {
        Self::all().get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Attribute::Grit => "GRIT",
            Attribute::Agility => "AGILITY",
            Attribute::Will => "WILL",
            Attribute::Wisdom => "WISDOM",
        }
    }
}

impl Session {
    /// Grants experience scaled by wisdom and levels up once per threshold
    /// crossed. Returns the number of levels gained.
    ///
    /// The switch to the level-up screen happens later, at the end of the
    /// turn cascade or when a menu closes.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::{RulesConfig, Session};
    ///
    /// let mut session = Session::new(RulesConfig::default(), 1).unwrap();
    /// session.player.stats.wisdom = 0;
    /// let levels = session.gain_xp(50 + 75 + 10);
    /// assert_eq!(levels, 2);
    /// assert_eq!(session.player.stats.xp, 10);
    /// assert_eq!(session.player.stats.xp_to_next, 112);
    /// ```
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        let bonus = 1.0 + self.player.stats.wisdom as f64 * self.rules.wisdom_xp_bonus;
        let gained = (amount as f64 * bonus).floor() as u32;
        let stats = &mut self.player.stats;
        stats.xp += gained;

        let mut levels = 0;
        while stats.xp_to_next > 0 && stats.xp >= stats.xp_to_next {
            stats.xp -= stats.xp_to_next;
            stats.level += 1;
            stats.xp_to_next = (stats.xp_to_next as f64 * self.rules.xp_growth).floor() as u32;
            stats.points_available += 1;
            levels += 1;
        }

        let level = self.player.stats.level;
        if levels > 0 {
            log::info!("Reached level {}", level);
            self.push_event(GameEvent::LeveledUp { level });
            self.say(format!("LEVEL UP! You are now level {level}."));
        }
        levels
    }

    /// Spends one point on an attribute. Returns false with no points left.
    pub fn allocate_point(&mut self, attribute: Attribute) -> bool {
        let stats = &mut self.player.stats;
        if stats.points_available == 0 {
            return false;
        }
        stats.points_available -= 1;
        match attribute {
            Attribute::Grit => {
                stats.grit += 1;
                stats.max_hp += 5;
                stats.hp += 5;
            }
            Attribute::Agility => stats.agility += 1,
            Attribute::Will => {
                stats.will += 1;
                stats.max_mp += 3;
                stats.mp += 3;
            }
            Attribute::Wisdom => stats.wisdom += 1,
        }
        true
    }

    /// Leaves a menu, going to the level-up screen if points are waiting.
    pub(crate) fn return_to_play(&mut self) -> WayfarerResult<()> {
        self.set_mode(GameMode::Playing)?;
        self.enter_level_up_if_pending()
    }

    /// End of a turn cascade: a surviving player with unspent points is sent
    /// to the level-up screen.
    pub(crate) fn enter_level_up_if_pending(&mut self) -> WayfarerResult<()> {
        if self.mode() == GameMode::Playing
            && self.player.stats.is_alive()
            && self.player.stats.points_available > 0
        {
            self.cursors.level_up = 0;
            self.set_mode(GameMode::LevelUp)?;
        }
        Ok(())
    }

    pub(crate) fn handle_level_up_input(&mut self, action: Action) -> WayfarerResult<()> {
        let count = Attribute::all().len();
        match action {
            Action::Down => self.cursors.level_up = (self.cursors.level_up + 1) % count,
            Action::Up => self.cursors.level_up = (self.cursors.level_up + count - 1) % count,
            Action::Primary | Action::Start => {
                if self.player.stats.points_available == 0 {
                    return Ok(());
                }
                let Some(attribute) = Attribute::from_index(self.cursors.level_up) else {
                    return Ok(());
                };
                self.allocate_point(attribute);
                self.say(format!("{} increased!", attribute.label()));
                if self.player.stats.points_available == 0 {
                    self.schedule_mode(GameMode::Playing, self.rules.level_up_exit_delay_ms);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_up() {
        let mut session = Session::playing_for_tests(0);
        session.player.stats.wisdom = 0;
        assert_eq!(session.gain_xp(60), 1);
        assert_eq!(session.player.stats.level, 2);
        assert_eq!(session.player.stats.xp, 10);
        assert_eq!(session.player.stats.xp_to_next, 75);
        assert_eq!(session.player.stats.points_available, 1);
    }

    #[test]
    fn test_gain_loops_over_thresholds() {
        let mut session = Session::playing_for_tests(0);
        session.player.stats.wisdom = 0;
        // 50 + 75 + 112 = 237
        assert_eq!(session.gain_xp(240), 3);
        assert_eq!(session.player.stats.level, 4);
        assert_eq!(session.player.stats.xp, 3);
        assert_eq!(session.player.stats.points_available, 3);
    }

    #[test]
    fn test_wisdom_scales_xp() {
        let mut session = Session::playing_for_tests(1);
        // mage wisdom 5 → ×1.25
        session.gain_xp(20);
        assert_eq!(session.player.stats.xp, 25);
    }

    #[test]
    fn test_allocation_effects() {
        let mut session = Session::playing_for_tests(0);
        session.player.stats.points_available = 2;
        let max_hp = session.player.stats.max_hp;

        assert!(session.allocate_point(Attribute::Grit));
        assert_eq!(session.player.stats.max_hp, max_hp + 5);
        assert!(session.allocate_point(Attribute::Will));
        assert_eq!(session.player.stats.max_mp, 8);
        assert!(!session.allocate_point(Attribute::Wisdom));
    }

    #[test]
    fn test_level_up_screen_returns_after_delay() {
        let mut session = Session::playing_for_tests(0);
        session.player.stats.wisdom = 0;
        session.gain_xp(50);
        session.enter_level_up_if_pending().unwrap();
        assert_eq!(session.mode(), GameMode::LevelUp);

        session.handle_input(Action::Down).unwrap();
        session.handle_input(Action::Primary).unwrap();
        assert_eq!(session.player.stats.agility, 3);
        assert_eq!(session.mode(), GameMode::LevelUp);

        session.tick(100);
        assert_eq!(session.mode(), GameMode::LevelUp);
        session.tick(100);
        assert_eq!(session.mode(), GameMode::Playing);
    }
}
