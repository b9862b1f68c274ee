//! Item records - actions, features, spells and gear

use crate::types::ItemKind;
use crate::SheetError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// System data of an item
///
/// Only the fields the engine reads are typed. Anything else a content
/// author puts on the item is kept in `extra` and travels into roll data
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSystem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dice formula rolled when the item is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemSystem {
    /// The formula, if one is set and not blank
    pub fn roll_formula(&self) -> Option<&str> {
        self.formula
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub system: ItemSystem,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ItemKind) -> Self {
        Item {
            id: id.into(),
            name: name.into(),
            kind,
            system: ItemSystem::default(),
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.system.formula = Some(formula.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.system.description = Some(description.into());
        self
    }

    /// Set an untyped system field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.system.extra.insert(key.into(), value.into());
        self
    }

    /// Chat label, e.g. `[spell] Spark Burst`
    pub fn label(&self) -> String {
        format!("[{}] {}", self.kind, self.name)
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

    #[test]
    fn test_label() {
        let item = Item::new("i1", "Medkit", ItemKind::Item);
        assert_eq!(item.label(), "[item] Medkit");
    }

    #[test]
    fn test_blank_formula_is_no_formula() {
        let item = Item::new("i1", "Guard", ItemKind::Action).with_formula("   ");
        assert_eq!(item.system.roll_formula(), None);

        let item = item.with_formula(" 1d6+2 ");
        assert_eq!(item.system.roll_formula(), Some("1d6+2"));
    }

    #[test]
    fn test_extra_fields_preserved() {
        let json = r#"{
            "_id": "blade",
            "name": "Originium Blade",
            "type": "item",
            "system": { "description": "Sharp", "quantity": 2, "weight": 1.5 }
        }"#;
        let item = Item::from_json(json).unwrap();
        assert_eq!(item.system.description.as_deref(), Some("Sharp"));
        assert_eq!(item.system.extra.get("quantity"), Some(&Value::from(2)));

        let value: Value = serde_json::from_str(&item.to_json().unwrap()).unwrap();
        assert_eq!(value["system"]["weight"], Value::from(1.5));
        assert!(value["system"].get("formula").is_none());
    }

    #[test]
    fn test_missing_system_defaults() {
        let item = Item::from_json(r#"{ "name": "Note", "type": "feature" }"#).unwrap();
        assert_eq!(item.kind, ItemKind::Feature);
        assert!(item.system.description.is_none());
        assert!(item.id.is_empty());
    }
}
