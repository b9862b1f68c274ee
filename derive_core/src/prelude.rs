//! Prelude module for convenient imports
//!
//! ```rust
//! use derive_core::prelude::*;
//! ```

// Derivation
pub use crate::prepare::{derive_entity, derive_entity_with_rules, prepare_data, CharacterDerived};
pub use crate::DeriveError;

// Roll data and chat
pub use crate::chat::{roll_item, ActivityLog, ChatMessage, MessageBody, MessageLog, RollMode};
pub use crate::roll_data::{actor_roll_data, get_roll_data, item_roll_data};

// Config
pub use crate::config::{init_rules, init_rules_default, rules, SystemRules};

// Re-exports from the other crates
pub use roll_core::{Roll, RollContext};
pub use sheet_core::{AbilityKey, Actor, CharacterSystem, Document, EntityKind, Item, ItemKind};
