use serde::{Deserialize, Serialize};
use std::fmt;

/// The five ability scores of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKey {
    Att,
    Spd,
    Con,
    Mov,
    Art,
}

impl AbilityKey {
    /// Get all abilities in sheet order
    pub fn all() -> &'static [AbilityKey] {
        &[
            AbilityKey::Att,
            AbilityKey::Spd,
            AbilityKey::Con,
            AbilityKey::Mov,
            AbilityKey::Art,
        ]
    }

    /// Short name used as the roll data key (`@att`, `@spd`, ...)
    pub fn short_name(&self) -> &'static str {
        match self {
            AbilityKey::Att => "att",
            AbilityKey::Spd => "spd",
            AbilityKey::Con => "con",
            AbilityKey::Mov => "mov",
            AbilityKey::Art => "art",
        }
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Actor document types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Character,
    Enemy,
    Support,
}

/// Item document types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Action,
    Feature,
    Spell,
    Item,
}

/// Every entity type tag, actor or item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Character,
    Enemy,
    Support,
    Action,
    Feature,
    Spell,
    Item,
}

impl EntityKind {
    /// Get all entity kinds
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Character,
            EntityKind::Enemy,
            EntityKind::Support,
            EntityKind::Action,
            EntityKind::Feature,
            EntityKind::Spell,
            EntityKind::Item,
        ]
    }

    /// The type tag as written in records and chat labels
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Character => "character",
            EntityKind::Enemy => "enemy",
            EntityKind::Support => "support",
            EntityKind::Action => "action",
            EntityKind::Feature => "feature",
            EntityKind::Spell => "spell",
            EntityKind::Item => "item",
        }
    }

    pub fn is_actor(&self) -> bool {
        matches!(
            self,
            EntityKind::Character | EntityKind::Enemy | EntityKind::Support
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", EntityKind::from(*self))
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", EntityKind::from(*self))
    }
}

impl From<ActorKind> for EntityKind {
    fn from(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Character => EntityKind::Character,
            ActorKind::Enemy => EntityKind::Enemy,
            ActorKind::Support => EntityKind::Support,
        }
    }
}

impl From<ItemKind> for EntityKind {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Action => EntityKind::Action,
            ItemKind::Feature => EntityKind::Feature,
            ItemKind::Spell => EntityKind::Spell,
            ItemKind::Item => EntityKind::Item,
        }
    }
}
