//! # LLDM Module
//!
//! LLM Dungeon Master integration: a [`ContentGenerator`] that asks a
//! language model for chunks and dialogue.

pub mod prompt;
pub mod traits;

pub use prompt::*;
pub use traits::*;

use crate::game::{Chunk, ChunkCoord, NpcSpawn};
use crate::generation::{ContentGenerator, EdgeOpenings};
use crate::{WayfarerError, WayfarerResult};
use serde::{Deserialize, Serialize};

/// Settings for the LLM-backed generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LldmConfig {
    /// Program invoked by [`CommandBackend`]
    pub command: String,
    pub args: Vec<String>,
    /// Token hint for dialogue lines
    pub dialogue_max_tokens: u32,
}

impl Default for LldmConfig {
    fn default() -> Self {
        Self {
            command: "llm".to_string(),
            args: Vec::new(),
            dialogue_max_tokens: 100,
        }
    }
}

/// Generates content by prompting a language model.
#[derive(Debug, Clone)]
pub struct LldmGenerator<B: LldmBackend> {
    backend: B,
    config: LldmConfig,
}

impl<B: LldmBackend> LldmGenerator<B> {
    pub fn new(backend: B, config: LldmConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl LldmGenerator<CommandBackend> {
    /// A generator driving the configured external command.
    pub fn from_config(config: LldmConfig) -> Self {
        let backend = CommandBackend::new(config.command.clone(), config.args.clone());
        Self::new(backend, config)
    }
}

impl<B: LldmBackend> ContentGenerator for LldmGenerator<B> {
    async fn generate_chunk(
        &self,
        coord: ChunkCoord,
        openings: &EdgeOpenings,
    ) -> WayfarerResult<Chunk> {
        log::debug!(
            "Prompting {} for chunk {}",
            self.backend.backend_name(),
            coord
        );
        let prompt = chunk_prompt(coord, openings);
        let text = self.backend.complete(&prompt, None).await?;
        parse_chunk_response(&text, coord, openings.width, openings.height)
            .map_err(|err| WayfarerError::GenerationFailed(format!("chunk {coord}: {err}")))
    }

    async fn generate_dialogue(
        &self,
        npc: &NpcSpawn,
        class_name: &str,
        biome_name: &str,
    ) -> WayfarerResult<String> {
        let prompt = dialogue_prompt(npc, class_name, biome_name);
        let text = self
            .backend
            .complete(&prompt, Some(self.config.dialogue_max_tokens))
            .await?;
        let line = text.trim();
        if line.is_empty() {
            return Err(WayfarerError::LldmError("empty dialogue line".to_string()));
        }
        Ok(line.to_string())
    }

    fn generator_type(&self) -> &'static str {
        "LLDM"
    }
}
