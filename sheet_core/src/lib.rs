//! sheet_core - Entity records for the Arknights tabletop system
//!
//! This library provides:
//! - Actor: characters, enemies and support units with their owned items
//! - Item: actions, features, spells and gear
//! - Document: either of the above, as handed over by the host
//!
//! Records use the host's JSON shape so they can be loaded straight from an
//! exported world and written back after derivation.

pub mod actor;
pub mod item;
pub mod types;

pub use actor::{
    Ability, Actor, ActorSystem, CharacterAttributes, CharacterSystem, ChallengeSystem, Level,
    Resource,
};
pub use item::{Item, ItemSystem};
pub use types::{AbilityKey, ActorKind, EntityKind, ItemKind};

use thiserror::Error;

/// Error importing or exporting an entity record
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Any entity the host can ask us to prepare
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Actor(Actor),
    Item(Item),
}

impl Document {
    pub fn kind(&self) -> EntityKind {
        match self {
            Document::Actor(actor) => actor.kind().into(),
            Document::Item(item) => item.kind.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Document::Actor(actor) => &actor.name,
            Document::Item(item) => &item.name,
        }
    }
}

impl From<Actor> for Document {
    fn from(actor: Actor) -> Self {
        Document::Actor(actor)
    }
}

impl From<Item> for Document {
    fn from(item: Item) -> Self {
        Document::Item(item)
    }
}
