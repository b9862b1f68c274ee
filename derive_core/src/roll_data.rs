//! Roll data - the context formulas are evaluated against
//!
//! Every call builds a fresh [`RollContext`] from the entity's current
//! system data, so callers may mutate the result freely.

use crate::DeriveError;
use roll_core::RollContext;
use serde_json::Value;
use sheet_core::{Actor, ActorSystem, ChallengeSystem, CharacterSystem, Document, Item};

/// Roll data for an actor
pub fn actor_roll_data(actor: &Actor) -> Result<RollContext, DeriveError> {
    match &actor.system {
        ActorSystem::Character(system) => {
            let mut data = RollContext::from_serialize(system)?;
            character_roll_data(system, &mut data)?;
            Ok(data)
        }
        ActorSystem::Enemy(system) => {
            let mut data = RollContext::from_serialize(system)?;
            enemy_roll_data(system, &mut data);
            Ok(data)
        }
        ActorSystem::Support(system) => {
            let mut data = RollContext::from_serialize(system)?;
            support_roll_data(system, &mut data);
            Ok(data)
        }
    }
}

/// Roll data for an item: its owner's roll data plus the item's own
/// system data under `item`. None when the item has no owner.
pub fn item_roll_data(
    item: &Item,
    owner: Option<&Actor>,
) -> Result<Option<RollContext>, DeriveError> {
    let Some(owner) = owner else {
        return Ok(None);
    };
    let mut data = actor_roll_data(owner)?;
    data.insert("item", serde_json::to_value(&item.system)?);
    Ok(Some(data))
}

/// Roll data for any document. `owner` is only consulted for items.
pub fn get_roll_data(
    document: &Document,
    owner: Option<&Actor>,
) -> Result<Option<RollContext>, DeriveError> {
    match document {
        Document::Actor(actor) => actor_roll_data(actor).map(Some),
        Document::Item(item) => item_roll_data(item, owner),
    }
}

/// Copy ability scores to the top level so formulas can use `@att.die`,
/// and expose the level as `@lvl`.
fn character_roll_data(
    system: &CharacterSystem,
    data: &mut RollContext,
) -> Result<(), DeriveError> {
    for (key, ability) in &system.abilities {
        data.insert(key.short_name(), serde_json::to_value(ability)?);
    }
    data.insert("lvl", Value::from(system.level().unwrap_or(0)));
    Ok(())
}

fn enemy_roll_data(_system: &ChallengeSystem, _data: &mut RollContext) {}

fn support_roll_data(_system: &ChallengeSystem, _data: &mut RollContext) {}
