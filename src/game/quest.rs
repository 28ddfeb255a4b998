//! # Quests, Dialogue and Shops
//!
//! Everything that happens when the player talks to someone: quest hand-in,
//! quest offers, generated chat, and the shop and inventory menus.

use crate::game::{GameEvent, InventoryItem, ItemKind, NpcSpawn};
use crate::input::Action;
use crate::scenes::GameMode;
use crate::{DialogueRequest, Request, Session, WayfarerResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fetch quest: bring `target_item_name` back to `giver_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub giver_name: String,
    pub description: String,
    pub target_item_name: String,
    pub reward_xp: u32,
    pub reward_gold: u32,
    #[serde(default)]
    pub is_completed: bool,
}

impl Quest {
    /// Creates an open quest with a fresh id.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer::Quest;
    ///
    /// let quest = Quest::new("Elder Rowan", "Recover my map.", "Old Map", 40, 25);
    /// assert!(!quest.is_completed);
    /// assert_eq!(quest.target_item_name, "Old Map");
    /// ```
    pub fn new(
        giver_name: impl Into<String>,
        description: impl Into<String>,
        target_item_name: impl Into<String>,
        reward_xp: u32,
        reward_gold: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            giver_name: giver_name.into(),
            description: description.into(),
            target_item_name: target_item_name.into(),
            reward_xp,
            reward_gold,
            is_completed: false,
        }
    }
}

/// An open conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialogue {
    /// Index into the active chunk's NPC list
    pub npc_index: usize,
    pub npc_name: String,
    pub text: String,
    pub is_shopkeeper: bool,
    /// Ticket of the generated line still in flight, if any
    pub ticket: Option<u64>,
}

/// Everything a shop can sell, with prices.
pub fn shop_catalog() -> Vec<InventoryItem> {
    vec![
        InventoryItem::potion().with_cost(20),
        InventoryItem::ether().with_cost(30),
        InventoryItem::elixir().with_cost(75),
    ]
}

impl Session {
    /// Talks to the NPC at `npc_index`.
    ///
    /// Turning in the giver's quest takes precedence, then a quest offer,
    /// then ordinary chat. Chat shows the NPC's greeting at once and asks
    /// for a generated line.
    pub fn start_dialogue(&mut self, npc_index: usize) -> WayfarerResult<()> {
        let Some(npc) = self.npcs.get(npc_index).cloned() else {
            return Ok(());
        };

        let mut ticket = None;
        let giver_quest = self
            .player
            .active_quest
            .as_ref()
            .filter(|quest| !quest.is_completed && quest.giver_name == npc.name)
            .cloned();

        let text = if let Some(quest) = giver_quest {
            if self.player.inventory.count_of(&quest.target_item_name) > 0 {
                self.complete_quest()
            } else {
                format!("Please find the {}.", quest.target_item_name)
            }
        } else if let Some(quest) = self.offerable_quest(&npc) {
            log::info!("Accepted quest {} from {}", quest.id, npc.name);
            let text = format!("Quest accepted: {}", quest.description);
            self.push_event(GameEvent::QuestAccepted {
                quest_id: quest.id.clone(),
            });
            self.player.active_quest = Some(quest);
            text
        } else {
            let id = self.next_ticket();
            ticket = Some(id);
            let request = DialogueRequest {
                ticket: id,
                npc: npc.clone(),
                class_name: self.player.class_name.clone(),
                biome_name: self
                    .active_chunk()
                    .map(|chunk| chunk.biome_name.clone())
                    .unwrap_or_default(),
            };
            self.push_request(Request::GenerateDialogue(request));
            npc.greeting.clone()
        };

        self.dialogue = Some(Dialogue {
            npc_index,
            npc_name: npc.name.clone(),
            text: text.clone(),
            is_shopkeeper: npc.is_shopkeeper(),
            ticket,
        });
        self.set_mode(GameMode::Dialogue)?;
        self.say(format!("{}: {}", npc.name, text));
        Ok(())
    }

    fn offerable_quest(&self, npc: &NpcSpawn) -> Option<Quest> {
        let quest = npc.quest.as_ref()?;
        if self.player.has_open_quest() || self.player.completed_quests.contains(&quest.id) {
            return None;
        }
        Some(Quest {
            giver_name: npc.name.clone(),
            is_completed: false,
            ..quest.clone()
        })
    }

    /// Hands in the active quest's item and pays out.
    fn complete_quest(&mut self) -> String {
        let Some(quest) = self.player.active_quest.as_mut() else {
            return String::new();
        };
        quest.is_completed = true;
        let quest = quest.clone();

        self.player.inventory.remove_one_by_name(&quest.target_item_name);
        self.player.completed_quests.insert(quest.id.clone());
        self.gain_gold(quest.reward_gold);
        self.push_event(GameEvent::QuestCompleted {
            quest_id: quest.id.clone(),
        });
        self.gain_xp(quest.reward_xp);
        self.request_save();

        log::info!("Completed quest {}", quest.id);
        format!(
            "You found the {}! Thank you. (+{} gold, +{} xp)",
            quest.target_item_name, quest.reward_gold, quest.reward_xp
        )
    }

    /// Replaces the provisional greeting with a generated line.
    ///
    /// Ignored unless the same conversation is still open. A failed
    /// generation keeps the greeting.
    pub fn complete_dialogue(&mut self, ticket: u64, result: WayfarerResult<String>) -> crate::TurnReport {
        let open = self.mode() == GameMode::Dialogue
            && self
                .dialogue
                .as_ref()
                .map(|dialogue| dialogue.ticket == Some(ticket))
                .unwrap_or(false);
        if !open {
            log::debug!("Ignoring stale dialogue line (ticket {})", ticket);
            return self.take_report();
        }

        match result {
            Ok(line) if !line.trim().is_empty() => {
                let line = line.trim().to_string();
                let mut name = String::new();
                if let Some(dialogue) = self.dialogue.as_mut() {
                    dialogue.text = line.clone();
                    dialogue.ticket = None;
                    name = dialogue.npc_name.clone();
                }
                self.say(format!("{name}: {line}"));
            }
            Ok(_) => {}
            Err(err) => log::debug!("Dialogue generation failed: {}", err),
        }
        self.take_report()
    }

    pub(crate) fn handle_dialogue_input(&mut self, action: Action) -> WayfarerResult<()> {
        match action {
            Action::Primary => {
                let shop = self
                    .dialogue
                    .as_ref()
                    .filter(|dialogue| dialogue.is_shopkeeper)
                    .map(|dialogue| dialogue.npc_index);
                self.dialogue = None;
                match shop {
                    Some(npc_index) => self.open_shop(npc_index),
                    None => self.return_to_play(),
                }
            }
            Action::Secondary => {
                self.dialogue = None;
                self.return_to_play()
            }
            _ => Ok(()),
        }
    }

    /// Opens the shop of the NPC at `npc_index`.
    ///
    /// A shopkeeper with a stock list sells only the catalog items it names.
    pub fn open_shop(&mut self, npc_index: usize) -> WayfarerResult<()> {
        let stock = self
            .npcs
            .get(npc_index)
            .map(|npc| npc.shop_inventory.clone())
            .unwrap_or_default();

        let catalog = shop_catalog();
        let listed: Vec<InventoryItem> = catalog
            .iter()
            .filter(|item| stock.iter().any(|name| name.eq_ignore_ascii_case(&item.name)))
            .cloned()
            .collect();
        self.shop_items = if listed.is_empty() { catalog } else { listed };
        self.cursors.shop = 0;
        self.set_mode(GameMode::Shop)
    }

    /// Buys one unit of the listing at `index`. All or nothing.
    pub fn purchase(&mut self, index: usize) -> bool {
        let Some(item) = self.shop_items.get(index).cloned() else {
            return false;
        };
        let cost = item.cost.unwrap_or(0);
        if self.player.score < cost {
            self.say("Not enough gold!");
            return false;
        }

        self.player.score -= cost;
        let name = item.name.clone();
        self.player.inventory.add(InventoryItem {
            count: 1,
            ..item
        });
        self.push_event(GameEvent::Purchased {
            name: name.clone(),
            cost,
        });
        self.say(format!("Bought {name}!"));
        true
    }

    pub(crate) fn handle_shop_input(&mut self, action: Action) -> WayfarerResult<()> {
        let count = self.shop_items.len().max(1);
        match action {
            Action::Down => self.cursors.shop = (self.cursors.shop + 1) % count,
            Action::Up => self.cursors.shop = (self.cursors.shop + count - 1) % count,
            Action::Primary => {
                self.purchase(self.cursors.shop);
            }
            Action::Secondary => {
                self.shop_items.clear();
                return self.return_to_play();
            }
            _ => {}
        }
        Ok(())
    }

    /// Uses one unit of the inventory row at `index`.
    ///
    /// Nothing is consumed when the item would have no effect.
    pub fn use_item(&mut self, index: usize) -> bool {
        let Some(item) = self.player.inventory.get(index).cloned() else {
            self.say("Nothing to use.");
            return false;
        };

        if item.kind == ItemKind::QuestItem {
            self.say("Someone might need this.");
            return false;
        }

        let restore = self.rules.potion_restore;
        let stats = &mut self.player.stats;
        let applied = match item.kind {
            ItemKind::PotionHp if stats.hp < stats.max_hp => {
                stats.hp = (stats.hp + restore).min(stats.max_hp);
                true
            }
            ItemKind::PotionMp if stats.mp < stats.max_mp => {
                stats.mp = (stats.mp + restore).min(stats.max_mp);
                true
            }
            ItemKind::Elixir if stats.hp < stats.max_hp || stats.mp < stats.max_mp => {
                stats.hp = stats.max_hp;
                stats.mp = stats.max_mp;
                true
            }
            _ => false,
        };
        if !applied {
            self.say(format!("The {} would have no effect.", item.name));
            return false;
        }

        self.player.inventory.remove_one(index);
        let len = self.player.inventory.len();
        if self.cursors.inventory >= len {
            self.cursors.inventory = len.saturating_sub(1);
        }
        self.push_event(GameEvent::ItemUsed {
            name: item.name.clone(),
        });
        self.say(format!("Used {}.", item.name));
        true
    }

    pub(crate) fn handle_inventory_input(&mut self, action: Action) -> WayfarerResult<()> {
        let count = self.player.inventory.len().max(1);
        match action {
            Action::Down => self.cursors.inventory = (self.cursors.inventory + 1) % count,
            Action::Up => self.cursors.inventory = (self.cursors.inventory + count - 1) % count,
            Action::Primary => {
                self.use_item(self.cursors.inventory);
            }
            Action::Secondary => return self.return_to_play(),
            _ => {}
        }
        Ok(())
    }
}
