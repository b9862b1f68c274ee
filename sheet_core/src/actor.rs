//! Actor records - characters, enemies and support units

use crate::item::Item;
use crate::types::{AbilityKey, ActorKind};
use crate::SheetError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single ability score and the values derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    /// Stored score, 1 and up
    pub value: i64,
    /// Rank label (D, C, B, A, S, S+, S++, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    /// Die size for the rank (d4 .. d14 and beyond)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub die: Option<String>,
}

impl Ability {
    pub fn new(value: i64) -> Self {
        Ability {
            value,
            rank: None,
            die: None,
        }
    }
}

/// A current/maximum pool such as health or exposure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub max: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default)]
    pub exposure: Resource,
}

/// System data of a player character
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSystem {
    pub abilities: BTreeMap<AbilityKey, Ability>,
    #[serde(default)]
    pub health: Resource,
    #[serde(default)]
    pub attributes: CharacterAttributes,
    #[serde(default)]
    pub biography: String,

    // === Derived ===
    #[serde(default)]
    pub dice_number: i64,
    #[serde(default)]
    pub mov_bonus: i64,
    #[serde(rename = "KOLength", default)]
    pub ko_length: i64,
    #[serde(default)]
    pub arts_cards: i64,

    /// Template fields the engine doesn't read
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CharacterSystem {
    /// Create a character with the given ability values in sheet order
    /// (att, spd, con, mov, art)
    pub fn with_values(values: [i64; 5]) -> Self {
        let abilities = AbilityKey::all()
            .iter()
            .zip(values)
            .map(|(key, value)| (*key, Ability::new(value)))
            .collect();
        CharacterSystem {
            abilities,
            ..Default::default()
        }
    }

    pub fn ability(&self, key: AbilityKey) -> Option<&Ability> {
        self.abilities.get(&key)
    }

    /// Set an ability's stored value, creating the entry if needed
    pub fn set_ability(&mut self, key: AbilityKey, value: i64) {
        self.abilities
            .entry(key)
            .and_modify(|a| a.value = value)
            .or_insert_with(|| Ability::new(value));
    }

    pub fn level(&self) -> Option<i64> {
        self.attributes.level.and_then(|l| l.value)
    }
}

/// System data shared by enemies and support units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSystem {
    /// Challenge rating
    #[serde(default)]
    pub cr: f64,
    #[serde(default)]
    pub health: Resource,
    #[serde(default)]
    pub biography: String,

    // === Derived ===
    #[serde(default)]
    pub xp: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChallengeSystem {
    pub fn with_cr(cr: f64) -> Self {
        ChallengeSystem {
            cr,
            ..Default::default()
        }
    }
}

/// Type-specific system data, tagged by the record's `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "system", rename_all = "snake_case")]
pub enum ActorSystem {
    Character(CharacterSystem),
    Enemy(ChallengeSystem),
    Support(ChallengeSystem),
}

impl ActorSystem {
    pub fn kind(&self) -> ActorKind {
        match self {
            ActorSystem::Character(_) => ActorKind::Character,
            ActorSystem::Enemy(_) => ActorKind::Enemy,
            ActorSystem::Support(_) => ActorKind::Support,
        }
    }
}

/// An actor and the items it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub system: ActorSystem,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, system: ActorSystem) -> Self {
        Actor {
            id: id.into(),
            name: name.into(),
            system,
            items: Vec::new(),
        }
    }

    pub fn character(
        id: impl Into<String>,
        name: impl Into<String>,
        system: CharacterSystem,
    ) -> Self {
        Self::new(id, name, ActorSystem::Character(system))
    }

    pub fn enemy(id: impl Into<String>, name: impl Into<String>, cr: f64) -> Self {
        Self::new(id, name, ActorSystem::Enemy(ChallengeSystem::with_cr(cr)))
    }

    pub fn support(id: impl Into<String>, name: impl Into<String>, cr: f64) -> Self {
        Self::new(id, name, ActorSystem::Support(ChallengeSystem::with_cr(cr)))
    }

    /// Add an owned item
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn kind(&self) -> ActorKind {
        self.system.kind()
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SheetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;

    const CHARACTER_JSON: &str = r#"{
        "_id": "amiya",
        "name": "Amiya",
        "type": "character",
        "system": {
            "abilities": {
                "att": { "value": 2 },
                "spd": { "value": 3 },
                "con": { "value": 3 },
                "mov": { "value": 4 },
                "art": { "value": 6 }
            },
            "health": { "value": 5, "max": 0 },
            "attributes": { "level": { "value": 2 }, "exposure": { "value": 1 } },
            "biography": "Leader of Rhodes Island"
        },
        "items": [
            {
                "_id": "spark",
                "name": "Spark Burst",
                "type": "spell",
                "system": { "formula": "2d6", "range": 3 }
            }
        ]
    }"#;

    #[test]
    fn test_parse_character_record() {
        let actor = Actor::from_json(CHARACTER_JSON).unwrap();
        assert_eq!(actor.kind(), ActorKind::Character);
        assert_eq!(actor.items.len(), 1);
        assert_eq!(actor.items[0].kind, ItemKind::Spell);

        let ActorSystem::Character(system) = &actor.system else {
            panic!("Expected character system");
        };
        assert_eq!(system.ability(AbilityKey::Art).unwrap().value, 6);
        assert_eq!(system.level(), Some(2));
        assert_eq!(system.health.value, 5);
        assert_eq!(system.attributes.exposure.value, 1);
        // Derived values start out empty
        assert_eq!(system.dice_number, 0);
    }

    #[test]
    fn test_parse_enemy_record() {
        let json = r#"{
            "_id": "e1",
            "name": "Reunion Soldier",
            "type": "enemy",
            "system": { "cr": 0.5 }
        }"#;
        let actor = Actor::from_json(json).unwrap();
        assert_eq!(actor.kind(), ActorKind::Enemy);
        let ActorSystem::Enemy(system) = &actor.system else {
            panic!("Expected enemy system");
        };
        assert!((system.cr - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_uses_host_field_names() {
        let actor = Actor::character("c1", "Doctor", CharacterSystem::with_values([1, 1, 1, 1, 1]));
        let json = actor.to_json().unwrap();
        assert!(json.contains("\"KOLength\""));
        assert!(json.contains("\"diceNumber\""));
        assert!(json.contains("\"type\": \"character\""));

        let back = Actor::from_json(&json).unwrap();
        assert_eq!(back, actor);
    }

    #[test]
    fn test_template_fields_preserved() {
        let json = r#"{
            "_id": "c1",
            "name": "Kal'tsit",
            "type": "character",
            "system": {
                "abilities": { "att": { "value": 2 } },
                "faction": "Rhodes Island",
                "notes": { "gm": "hidden" }
            }
        }"#;
        let actor = Actor::from_json(json).unwrap();
        let ActorSystem::Character(system) = &actor.system else {
            panic!("Expected character system");
        };
        assert_eq!(system.extra.get("faction"), Some(&Value::from("Rhodes Island")));
        assert!(!system.extra.contains_key("abilities"));

        let value: Value = serde_json::from_str(&actor.to_json().unwrap()).unwrap();
        assert_eq!(value["system"]["notes"]["gm"], Value::from("hidden"));

        let json = r#"{
            "_id": "e1",
            "name": "Mephisto",
            "type": "enemy",
            "system": { "cr": 3, "faction": "Reunion" }
        }"#;
        let actor = Actor::from_json(json).unwrap();
        let ActorSystem::Enemy(system) = &actor.system else {
            panic!("Expected enemy system");
        };
        assert!((system.cr - 3.0).abs() < f64::EPSILON);
        assert_eq!(system.extra.get("faction"), Some(&Value::from("Reunion")));
    }

    #[test]
    fn test_unknown_actor_type_rejected() {
        let json = r#"{ "name": "Odd", "type": "vehicle", "system": {} }"#;
        assert!(Actor::from_json(json).is_err());
    }

    #[test]
    fn test_set_ability() {
        let mut system = CharacterSystem::default();
        system.set_ability(AbilityKey::Mov, 3);
        system.set_ability(AbilityKey::Mov, 5);
        assert_eq!(system.ability(AbilityKey::Mov).unwrap().value, 5);
        assert!(system.ability(AbilityKey::Att).is_none());
    }
}
