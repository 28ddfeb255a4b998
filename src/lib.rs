//! # Wayfarer
//!
//! A chunk-streaming, turn-driven RPG engine with LLM-driven world generation.
//!
//! ## Architecture Overview
//!
//! The world is an unbounded grid of fixed-size chunks that are generated lazily
//! the first time the player walks into them. The engine is organized around a
//! few key concepts:
//!
//! - **Chunk Store**: every generated chunk, keyed by its grid coordinate
//! - **Edge Resolver**: forces each new chunk to line up with its neighbors
//! - **Session**: the single owner of all mutable game state and the turn cascade
//! - **Scenes**: the game mode machine and the async driver that talks to the
//!   content generator and the save store
//!
//! ## Sans-IO session
//!
//! [`Session`] never performs I/O. Whenever it needs content from the outside
//! world it returns a [`Request`] carrying a ticket, and the driver
//! ([`SceneManager`]) fulfils it and hands the result back. Stale tickets are
//! ignored, so a slow generator can never clobber newer state.

pub mod config;
pub mod game;
pub mod generation;
pub mod input;
pub mod lldm;
pub mod scenes;

// Core module re-exports
pub use config::RulesConfig;
pub use game::*;
pub use generation::*;
pub use input::*;
pub use lldm::*;
pub use scenes::*;

/// Core error type for the Wayfarer engine.
#[derive(thiserror::Error, Debug)]
pub enum WayfarerError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// LLM integration error
    #[error("LLDM error: {0}")]
    LldmError(String),

    /// A save payload was readable but not consistent
    #[error("Invalid save: {0}")]
    InvalidSave(String),

    /// Rules configuration is out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type used throughout the Wayfarer codebase.
pub type WayfarerResult<T> = Result<T, WayfarerError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
