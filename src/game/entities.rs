//! # Entities
//!
//! Live enemies, the player character, character classes and the inventory.

use crate::config::{DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y};
use crate::game::{ChunkCoord, EnemyKind, Position, Quest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A live enemy derived from a chunk's static spawn list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// `e_{cx}_{cy}_{index}`, stable for the lifetime of the activation
    pub id: String,
    pub kind: EnemyKind,
    /// Index of the static spawn this enemy came from
    pub spawn_index: usize,
    pub position: Position,
    pub hp: i32,
    pub max_hp: i32,
    pub name: String,
    pub is_elite: bool,
    /// Remaining hit-flash time in milliseconds. Purely cosmetic.
    #[serde(skip)]
    pub flash: Option<u64>,
}

impl Enemy {
    /// Builds the deterministic id for a spawn slot.
    pub fn make_id(coord: ChunkCoord, index: usize) -> String {
        format!("e_{}_{}_{}", coord.cx, coord.cy, index)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// ASCII glyph used by the terminal front end.
    pub fn glyph(&self) -> char {
        let glyph = match self.kind {
            EnemyKind::Slime => 's',
            EnemyKind::Rat => 'r',
            EnemyKind::Skeleton => 'k',
            EnemyKind::Robot => 'b',
            EnemyKind::Ghost => 'g',
            EnemyKind::Alien => 'a',
        };
        if self.is_elite {
            glyph.to_ascii_uppercase()
        } else {
            glyph
        }
    }
}

/// Special move bound to a character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    /// Hits every enemy within one tile, diagonals included
    SpinSlash,
    /// Strikes one random enemy inside the aggro radius
    Thunder,
}

impl Ability {
    pub fn display_name(self) -> &'static str {
        match self {
            Ability::SpinSlash => "Spin Slash",
            Ability::Thunder => "Thunder",
        }
    }
}

/// Resource restored by periodic regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegenResource {
    Hp,
    Mp,
}

/// Immutable template a new character is seeded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterClass {
    pub name: String,
    pub hp: u32,
    pub mp: u32,
    pub atk: i32,
    pub def: i32,
    pub grit: u32,
    pub agility: u32,
    pub will: u32,
    pub wisdom: u32,
    pub weapon: String,
    pub armor: String,
    pub description: String,
    pub ability: Ability,
    pub regen: RegenResource,
}

impl CharacterClass {
    /// The playable classes, in menu order.
    pub fn roster() -> Vec<CharacterClass> {
        vec![
            CharacterClass {
                name: "WARRIOR".to_string(),
                hp: 20,
                mp: 5,
                atk: 4,
                def: 2,
                grit: 5,
                agility: 2,
                will: 2,
                wisdom: 1,
                weapon: "Iron Sword".to_string(),
                armor: "Chainmail".to_string(),
                description: "High Grit & HP.".to_string(),
                ability: Ability::SpinSlash,
                regen: RegenResource::Hp,
            },
            CharacterClass {
                name: "MAGE".to_string(),
                hp: 12,
                mp: 15,
                atk: 6,
                def: 0,
                grit: 1,
                agility: 3,
                will: 6,
                wisdom: 5,
                weapon: "Novice Wand".to_string(),
                armor: "Silk Robe".to_string(),
                description: "High Will & Wisdom.".to_string(),
                ability: Ability::Thunder,
                regen: RegenResource::Mp,
            },
        ]
    }

    /// Looks a class up by name, case-insensitively.
    pub fn by_name(name: &str) -> Option<CharacterClass> {
        Self::roster()
            .into_iter()
            .find(|class| class.name.eq_ignore_ascii_case(name))
    }
}

/// Player statistics.
///
/// # Examples
///
/// ```
/// use wayfarer::{CharacterClass, PlayerStats};
///
/// let mage = &CharacterClass::roster()[1];
/// let stats = PlayerStats::from_class(mage, 50);
/// assert_eq!(stats.max_mp, 15);
/// assert_eq!(stats.level, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub atk: i32,
    pub def: i32,
    pub grit: u32,
    pub agility: u32,
    pub will: u32,
    pub wisdom: u32,
    pub points_available: u32,
    pub weapon: String,
    pub armor: String,
}

impl PlayerStats {
    /// Seeds level-one stats from a class template.
    pub fn from_class(class: &CharacterClass, xp_to_next: u32) -> Self {
        Self {
            hp: class.hp,
            max_hp: class.hp,
            mp: class.mp,
            max_mp: class.mp,
            level: 1,
            xp: 0,
            xp_to_next,
            atk: class.atk,
            def: class.def,
            grit: class.grit,
            agility: class.agility,
            will: class.will,
            wisdom: class.wisdom,
            points_available: 0,
            weapon: class.weapon.clone(),
            armor: class.armor.clone(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// Category of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    PotionHp,
    PotionMp,
    Elixir,
    QuestItem,
}

/// One stack in the player's inventory or one shop listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub kind: ItemKind,
    pub description: String,
    pub count: u32,
    /// Price, present only on shop listings
    #[serde(default)]
    pub cost: Option<u32>,
}

impl InventoryItem {
    /// Creates a single unit of an item.
    pub fn new(name: impl Into<String>, kind: ItemKind, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            description: description.into(),
            count: 1,
            cost: None,
        }
    }

    pub fn potion() -> Self {
        Self::new("Potion", ItemKind::PotionHp, "Heals HP")
    }

    pub fn ether() -> Self {
        Self::new("Ether", ItemKind::PotionMp, "Heals MP")
    }

    pub fn elixir() -> Self {
        Self::new("Elixir", ItemKind::Elixir, "Fully restores HP and MP")
    }

    pub fn quest_item(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::QuestItem, "Quest Item")
    }

    /// Attaches a shop price.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = Some(cost);
        self
    }
}

/// Ordered list of item stacks, one row per name.
///
/// # Examples
///
/// ```
/// use wayfarer::{Inventory, InventoryItem};
///
/// let mut inventory = Inventory::new();
/// inventory.add(InventoryItem::potion());
/// inventory.add(InventoryItem::potion());
/// assert_eq!(inventory.len(), 1);
/// assert_eq!(inventory.count_of("Potion"), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one stack, merging into an existing row with the same name.
    pub fn add(&mut self, item: InventoryItem) {
        let count = item.count.max(1);
        if let Some(existing) = self.items.iter_mut().find(|i| i.name == item.name) {
            existing.count += count;
        } else {
            self.items.push(InventoryItem {
                count,
                cost: None,
                ..item
            });
        }
    }

    /// Removes one unit by row index; the row disappears at zero.
    pub fn remove_one(&mut self, index: usize) -> Option<InventoryItem> {
        let item = self.items.get_mut(index)?;
        item.count = item.count.saturating_sub(1);
        let taken = InventoryItem {
            count: 1,
            ..item.clone()
        };
        if item.count == 0 {
            self.items.remove(index);
        }
        Some(taken)
    }

    /// Removes one unit of the named item.
    pub fn remove_one_by_name(&mut self, name: &str) -> Option<InventoryItem> {
        let index = self.position_of(name)?;
        self.remove_one(index)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.name == name)
    }

    pub fn count_of(&self, name: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.count)
            .unwrap_or(0)
    }

    pub fn get(&self, index: usize) -> Option<&InventoryItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Position inside the active chunk
    pub position: Position,
    pub stats: PlayerStats,
    pub inventory: Inventory,
    /// Gold; doubles as the score
    pub score: u32,
    pub active_quest: Option<Quest>,
    /// Quests already turned in, so their givers do not offer them again
    #[serde(default)]
    pub completed_quests: BTreeSet<String>,
    /// Committed moves since the game began
    pub steps: u64,
    pub class_name: String,
}

impl Player {
    /// Creates a fresh level-one character at the default spawn.
    pub fn new(class: &CharacterClass, xp_to_next: u32) -> Self {
        Self {
            position: Position::new(DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y),
            stats: PlayerStats::from_class(class, xp_to_next),
            inventory: Inventory::new(),
            score: 0,
            active_quest: None,
            completed_quests: BTreeSet::new(),
            steps: 0,
            class_name: class.name.clone(),
        }
    }

    /// Returns true while a quest is held and not yet turned in.
    pub fn has_open_quest(&self) -> bool {
        self.active_quest
            .as_ref()
            .map(|quest| !quest.is_completed)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_matches_class_templates() {
        let roster = CharacterClass::roster();
        assert_eq!(roster.len(), 2);

        let warrior = &roster[0];
        assert_eq!(warrior.hp, 20);
        assert_eq!(warrior.def, 2);
        assert_eq!(warrior.ability, Ability::SpinSlash);
        assert_eq!(warrior.regen, RegenResource::Hp);

        let mage = CharacterClass::by_name("mage").unwrap();
        assert_eq!(mage.atk, 6);
        assert_eq!(mage.ability, Ability::Thunder);
    }

    #[test]
    fn test_inventory_stacking() {
        let mut inventory = Inventory::new();
        inventory.add(InventoryItem::potion());
        inventory.add(InventoryItem::ether());
        inventory.add(InventoryItem::potion());

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.count_of("Potion"), 2);
        assert_eq!(inventory.position_of("Ether"), Some(1));
    }

    #[test]
    fn test_inventory_remove_last_unit_drops_row() {
        let mut inventory = Inventory::new();
        inventory.add(InventoryItem::potion());
        inventory.add(InventoryItem::potion());

        let taken = inventory.remove_one(0).unwrap();
        assert_eq!(taken.count, 1);
        assert_eq!(inventory.count_of("Potion"), 1);

        inventory.remove_one_by_name("Potion").unwrap();
        assert!(inventory.is_empty());
        assert!(inventory.remove_one(0).is_none());
    }

    #[test]
    fn test_shop_cost_does_not_enter_inventory() {
        let mut inventory = Inventory::new();
        inventory.add(InventoryItem::potion().with_cost(20));
        assert_eq!(inventory.get(0).and_then(|item| item.cost), None);
    }

    #[test]
    fn test_enemy_id_and_glyph() {
        let id = Enemy::make_id(ChunkCoord::new(-1, 3), 2);
        assert_eq!(id, "e_-1_3_2");

        let enemy = Enemy {
            id,
            kind: EnemyKind::Rat,
            spawn_index: 2,
            position: Position::new(1, 1),
            hp: 4,
            max_hp: 4,
            name: "Elite Rat".to_string(),
            is_elite: true,
            flash: None,
        };
        assert_eq!(enemy.glyph(), 'R');
        assert!(enemy.is_alive());
    }

    #[test]
    fn test_new_player_defaults() {
        let warrior = &CharacterClass::roster()[0];
        let player = Player::new(warrior, 50);
        assert_eq!(player.position, Position::new(10, 7));
        assert_eq!(player.stats.xp_to_next, 50);
        assert!(!player.has_open_quest());
    }
}
