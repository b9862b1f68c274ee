//! derive_core - Derived attribute engine for the Arknights tabletop system
//!
//! This library provides:
//! - Derivation: ability ranks and dice, character pools, threat xp
//! - Roll data: the variable context formulas are rolled against
//! - Chat: rolling an item and posting the outcome to an activity log
//! - Rules: the lookup tables behind all of the above, loadable from TOML
//!
//! # Quick Start
//!
//! ```rust
//! use derive_core::prelude::*;
//!
//! let system = CharacterSystem::with_values([2, 5, 3, 4, 6]);
//! let mut doc: Document = Actor::character("amiya", "Amiya", system).into();
//! prepare_data(&mut doc).unwrap();
//!
//! let Document::Actor(actor) = &doc else { unreachable!() };
//! let data = actor_roll_data(actor).unwrap();
//! assert_eq!(data.resolve("att.die"), Some(&serde_json::json!("d6")));
//! assert_eq!(data.resolve("diceNumber"), Some(&serde_json::json!(5)));
//! ```

pub mod chat;
pub mod config;
pub mod prelude;
pub mod prepare;
pub mod roll_data;

// Core API - what most users need
pub use chat::{
    roll_item, ActivityLog, ChatError, ChatMessage, MessageBody, MessageLog, RollMode, Speaker,
};
pub use prepare::{
    derive_actor, derive_entity, derive_entity_with_rules, derive_item, prepare_data,
    prepare_data_with_rules, CharacterDerived,
};
pub use roll_data::{actor_roll_data, get_roll_data, item_roll_data};

// Configuration
pub use config::{init_rules, init_rules_default, rules, ConfigError, SystemRules};

// Re-export commonly needed types from the other crates
pub use roll_core::{Roll, RollContext, RollError};
pub use sheet_core::{Actor, Document, EntityKind, Item};

use config::StatTable;
use sheet_core::AbilityKey;
use thiserror::Error;

/// Error deriving an entity's data
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("Missing ability: {0}")]
    MissingAbility(AbilityKey),
    #[error(
        "Invalid value {value} for ability {ability}: must be between 1 and {max}",
        max = config::MAX_ABILITY_VALUE
    )]
    InvalidAbilityValue { ability: AbilityKey, value: i64 },
    #[error("No {table} entry for {ability} = {value}")]
    OutOfTable {
        ability: AbilityKey,
        value: i64,
        table: StatTable,
    },
    #[error("No die for rank {0}")]
    MissingDie(String),
    #[error("Failed to build roll data: {0}")]
    Serialize(#[from] serde_json::Error),
}
