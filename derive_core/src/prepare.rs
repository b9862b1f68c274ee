//! Data preparation - recompute every derived field from base data
//!
//! The host calls [`prepare_data`] after a document is loaded or edited.
//! It runs, in order: base data, owned items, derived data. Each entity
//! kind has its own routine so new kinds only need a new match arm.

use crate::config::{rules, StatTable, SystemRules, MAX_ABILITY_VALUE};
use crate::DeriveError;
use sheet_core::{
    AbilityKey, Actor, ActorSystem, ChallengeSystem, CharacterSystem, Document, Item, ItemKind,
    ItemSystem,
};
use std::collections::BTreeMap;

/// Run the full preparation pass with the global rules
pub fn prepare_data(document: &mut Document) -> Result<(), DeriveError> {
    prepare_data_with_rules(document, rules())
}

/// Run the full preparation pass: base data, owned items, derived data
pub fn prepare_data_with_rules(
    document: &mut Document,
    rules: &SystemRules,
) -> Result<(), DeriveError> {
    prepare_base_data(document);
    if let Document::Actor(actor) = document {
        for item in &mut actor.items {
            derive_item(item);
        }
    }
    let result = derive_entity_with_rules(document, rules);
    if let Err(e) = &result {
        tracing::warn!(
            name = document.name(),
            kind = %document.kind(),
            error = %e,
            "derivation rejected"
        );
    }
    result
}

/// Hook for modifications before owned items and derived data.
/// No base data is adjusted at present.
fn prepare_base_data(_document: &mut Document) {}

/// Recompute derived data with the global rules
pub fn derive_entity(document: &mut Document) -> Result<(), DeriveError> {
    derive_entity_with_rules(document, rules())
}

pub fn derive_entity_with_rules(
    document: &mut Document,
    rules: &SystemRules,
) -> Result<(), DeriveError> {
    match document {
        Document::Actor(actor) => derive_actor(actor, rules),
        Document::Item(item) => {
            derive_item(item);
            Ok(())
        }
    }
}

pub fn derive_actor(actor: &mut Actor, rules: &SystemRules) -> Result<(), DeriveError> {
    match &mut actor.system {
        ActorSystem::Character(system) => prepare_character_data(system, rules)?,
        ActorSystem::Enemy(system) => prepare_enemy_data(system, rules),
        ActorSystem::Support(system) => prepare_support_data(system, rules),
    }
    tracing::debug!(actor = %actor.name, kind = %actor.kind(), "derived actor data");
    Ok(())
}

pub fn derive_item(item: &mut Item) {
    match item.kind {
        ItemKind::Action => prepare_action_data(&mut item.system),
        ItemKind::Feature => prepare_feature_data(&mut item.system),
        ItemKind::Spell => prepare_spell_data(&mut item.system),
        ItemKind::Item => prepare_item_data(&mut item.system),
    }
}

/// Everything a character derivation pass produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDerived {
    /// (rank, die) per ability
    pub abilities: BTreeMap<AbilityKey, (String, String)>,
    pub dice_number: i64,
    pub health_max: i64,
    pub exposure_max: i64,
    pub mov_bonus: i64,
    pub ko_length: i64,
    pub arts_cards: i64,
}

impl CharacterDerived {
    /// Compute derived values without touching the character
    pub fn compute(system: &CharacterSystem, rules: &SystemRules) -> Result<Self, DeriveError> {
        let mut abilities = BTreeMap::new();
        for key in AbilityKey::all() {
            let value = ability_value(system, *key)?;
            let rank = rules
                .ranks
                .rank(value)
                .ok_or(DeriveError::InvalidAbilityValue { ability: *key, value })?;
            let die = rules
                .ranks
                .die(value)
                .ok_or_else(|| DeriveError::MissingDie(rank.clone()))?;
            abilities.insert(*key, (rank, die));
        }

        let spd = ability_value(system, AbilityKey::Spd)?;
        let con = ability_value(system, AbilityKey::Con)?;
        let mov = ability_value(system, AbilityKey::Mov)?;
        let lookup = |ability: AbilityKey, value: i64, table: StatTable| {
            rules
                .stats
                .lookup(table, value)
                .ok_or(DeriveError::OutOfTable { ability, value, table })
        };

        Ok(CharacterDerived {
            abilities,
            dice_number: lookup(AbilityKey::Spd, spd, StatTable::DiceNumber)?,
            health_max: lookup(AbilityKey::Con, con, StatTable::HealthMax)?,
            exposure_max: lookup(AbilityKey::Con, con, StatTable::ExposureMax)?,
            mov_bonus: lookup(AbilityKey::Mov, mov, StatTable::MovBonus)?,
            ko_length: lookup(AbilityKey::Mov, mov, StatTable::KoLength)?,
            arts_cards: mov - 1,
        })
    }

    /// Overwrite the character's derived fields
    pub fn apply(self, system: &mut CharacterSystem) {
        for (key, (rank, die)) in self.abilities {
            if let Some(ability) = system.abilities.get_mut(&key) {
                ability.rank = Some(rank);
                ability.die = Some(die);
            }
        }
        system.dice_number = self.dice_number;
        system.health.max = self.health_max;
        system.attributes.exposure.max = self.exposure_max;
        system.mov_bonus = self.mov_bonus;
        system.ko_length = self.ko_length;
        system.arts_cards = self.arts_cards;
    }
}

fn ability_value(system: &CharacterSystem, key: AbilityKey) -> Result<i64, DeriveError> {
    let value = system
        .ability(key)
        .ok_or(DeriveError::MissingAbility(key))?
        .value;
    if !(1..=MAX_ABILITY_VALUE).contains(&value) {
        return Err(DeriveError::InvalidAbilityValue { ability: key, value });
    }
    Ok(value)
}

/// Character derivation. Nothing is written unless every lookup succeeds.
fn prepare_character_data(
    system: &mut CharacterSystem,
    rules: &SystemRules,
) -> Result<(), DeriveError> {
    CharacterDerived::compute(system, rules)?.apply(system);
    Ok(())
}

fn prepare_enemy_data(system: &mut ChallengeSystem, rules: &SystemRules) {
    system.xp = challenge_xp(system.cr, rules);
}

fn prepare_support_data(system: &mut ChallengeSystem, rules: &SystemRules) {
    system.xp = challenge_xp(system.cr, rules);
}

/// Experience granted for a challenge rating
pub fn challenge_xp(cr: f64, rules: &SystemRules) -> f64 {
    cr * cr * rules.xp.per_cr_squared
}

fn prepare_action_data(_system: &mut ItemSystem) {}

fn prepare_feature_data(_system: &mut ItemSystem) {}

fn prepare_spell_data(_system: &mut ItemSystem) {}

fn prepare_item_data(_system: &mut ItemSystem) {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sheet_core::{Ability, ItemKind};

    fn character(values: [i64; 5]) -> Document {
        Actor::character("c1", "Amiya", CharacterSystem::with_values(values)).into()
    }

    fn character_system(doc: &Document) -> &CharacterSystem {
        match doc {
            Document::Actor(Actor {
                system: ActorSystem::Character(system),
                ..
            }) => system,
            other => panic!("Expected character, got {:?}", other),
        }
    }

    fn challenge_system(doc: &Document) -> &ChallengeSystem {
        match doc {
            Document::Actor(Actor {
                system: ActorSystem::Enemy(system) | ActorSystem::Support(system),
                ..
            }) => system,
            other => panic!("Expected enemy or support, got {:?}", other),
        }
    }

    #[test]
    fn test_character_pools() {
        let mut doc = character([1, 5, 3, 4, 2]);
        derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap();
        let system = character_system(&doc);

        assert_eq!(system.health.max, 6);
        assert_eq!(system.attributes.exposure.max, 8);
        assert_eq!(system.mov_bonus, 1);
        assert_eq!(system.ko_length, 2);
        assert_eq!(system.arts_cards, 3);
        assert_eq!(system.dice_number, 5);
    }

    #[test]
    fn test_ability_ranks_and_dice() {
        let mut doc = character([1, 2, 3, 4, 6]);
        derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap();
        let system = character_system(&doc);

        let expect = [
            (AbilityKey::Att, "D", "d4"),
            (AbilityKey::Spd, "C", "d6"),
            (AbilityKey::Con, "B", "d8"),
            (AbilityKey::Mov, "A", "d10"),
            (AbilityKey::Art, "S+", "d14"),
        ];
        for (key, rank, die) in expect {
            let ability = system.ability(key).unwrap();
            assert_eq!(ability.rank.as_deref(), Some(rank), "{}", key);
            assert_eq!(ability.die.as_deref(), Some(die), "{}", key);
        }
    }

    #[test]
    fn test_escalated_rank_on_unbounded_ability() {
        // att and art only feed rank and die, so they may exceed the tables
        let mut doc = character([8, 1, 1, 1, 7]);
        derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap();
        let system = character_system(&doc);

        let att = system.ability(AbilityKey::Att).unwrap();
        assert_eq!(att.rank.as_deref(), Some("S+++"));
        assert_eq!(att.die.as_deref(), Some("d18"));
        let art = system.ability(AbilityKey::Art).unwrap();
        assert_eq!(art.rank.as_deref(), Some("S++"));
        assert_eq!(art.die.as_deref(), Some("d16"));
    }

    #[test]
    fn test_out_of_table_stat_rejected() {
        let mut doc = character([1, 1, 7, 1, 1]);
        let before = doc.clone();
        let err = derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap_err();
        assert!(matches!(
            err,
            DeriveError::OutOfTable {
                ability: AbilityKey::Con,
                value: 7,
                table: StatTable::HealthMax,
            }
        ));
        // A failed pass leaves the record untouched
        assert_eq!(doc, before);
    }

    #[test]
    fn test_invalid_ability_value() {
        let mut doc = character([1, 0, 1, 1, 1]);
        let err = derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap_err();
        assert!(matches!(
            err,
            DeriveError::InvalidAbilityValue {
                ability: AbilityKey::Spd,
                value: 0,
            }
        ));
    }

    #[test]
    fn test_huge_ability_value_rejected() {
        let mut doc = character([i64::MAX, 1, 1, 1, 1]);
        let before = doc.clone();
        let err = prepare_data_with_rules(&mut doc, &SystemRules::default()).unwrap_err();
        assert!(matches!(
            err,
            DeriveError::InvalidAbilityValue {
                ability: AbilityKey::Att,
                value: i64::MAX,
            }
        ));
        assert_eq!(doc, before);

        let mut doc = character([MAX_ABILITY_VALUE, 1, 1, 1, MAX_ABILITY_VALUE]);
        derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap();
        let art = character_system(&doc).ability(AbilityKey::Art).unwrap();
        assert_eq!(art.die.as_deref(), Some("d202"));
    }

    #[test]
    fn test_missing_ability() {
        let mut system = CharacterSystem::with_values([1, 1, 1, 1, 1]);
        system.abilities.remove(&AbilityKey::Mov);
        let mut doc: Document = Actor::character("c1", "Kal'tsit", system).into();
        let err = derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap_err();
        assert!(matches!(err, DeriveError::MissingAbility(AbilityKey::Mov)));
    }

    #[test]
    fn test_stale_derived_values_overwritten() {
        let mut system = CharacterSystem::with_values([3, 3, 3, 3, 3]);
        system.abilities.insert(
            AbilityKey::Att,
            Ability {
                value: 3,
                rank: Some("S".to_string()),
                die: Some("d12".to_string()),
            },
        );
        system.dice_number = 99;
        system.health.max = 99;
        let mut doc: Document = Actor::character("c1", "Doctor", system).into();
        derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap();
        let system = character_system(&doc);

        assert_eq!(system.ability(AbilityKey::Att).unwrap().rank.as_deref(), Some("B"));
        assert_eq!(system.dice_number, 3);
        assert_eq!(system.health.max, 6);
    }

    #[test]
    fn test_enemy_and_support_xp() {
        let rules = SystemRules::default();
        for (mut doc, cr, xp) in [
            (Document::from(Actor::enemy("e1", "Slug", 5.0)), 5.0, 2500.0),
            (Document::from(Actor::enemy("e2", "Dummy", 0.0)), 0.0, 0.0),
            (Document::from(Actor::support("s1", "Drone", 5.0)), 5.0, 2500.0),
            (Document::from(Actor::support("s2", "Scout", 0.5)), 0.5, 25.0),
        ] {
            derive_entity_with_rules(&mut doc, &rules).unwrap();
            let system = challenge_system(&doc);
            assert!((system.cr - cr).abs() < f64::EPSILON);
            assert!((system.xp - xp).abs() < f64::EPSILON, "cr {} gave {}", cr, system.xp);
        }
    }

    #[test]
    fn test_custom_xp_rule() {
        let mut rules = SystemRules::default();
        rules.xp.per_cr_squared = 10.0;
        let mut doc: Document = Actor::enemy("e1", "Slug", 3.0).into();
        derive_entity_with_rules(&mut doc, &rules).unwrap();
        assert!((challenge_system(&doc).xp - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_item_derivation_is_noop() {
        for kind in [ItemKind::Action, ItemKind::Feature, ItemKind::Spell, ItemKind::Item] {
            let item = Item::new("i1", "Thing", kind)
                .with_formula("1d6")
                .with_field("uses", 2);
            let mut doc: Document = item.clone().into();
            derive_entity(&mut doc).unwrap();
            assert_eq!(doc, Document::Item(item));
        }
    }

    #[test]
    fn test_prepare_data_prepares_owned_items() {
        let actor = Actor::character("c1", "Amiya", CharacterSystem::with_values([2, 2, 2, 2, 2]))
            .with_item(Item::new("i1", "Spark", ItemKind::Spell).with_formula("@att.die"));
        let mut doc: Document = actor.into();
        prepare_data(&mut doc).unwrap();

        let Document::Actor(actor) = &doc else {
            panic!("Expected actor");
        };
        assert_eq!(actor.items.len(), 1);
        assert_eq!(character_system(&doc).health.max, 4);
    }

    #[test]
    fn test_derivation_leaves_other_entities_alone() {
        let rules = SystemRules::default();
        let mut a = character([1, 1, 1, 1, 1]);
        let mut b = character([6, 6, 6, 6, 6]);
        derive_entity_with_rules(&mut a, &rules).unwrap();
        let snapshot = a.clone();
        derive_entity_with_rules(&mut b, &rules).unwrap();
        derive_entity_with_rules(&mut a, &rules).unwrap();
        assert_eq!(a, snapshot);
        assert_eq!(character_system(&b).health.max, 12);
    }

    proptest! {
        #[test]
        fn prop_derivation_idempotent(values in prop::array::uniform5(1i64..=6)) {
            let rules = SystemRules::default();
            let mut doc = character(values);
            derive_entity_with_rules(&mut doc, &rules).unwrap();
            let first = doc.clone();
            derive_entity_with_rules(&mut doc, &rules).unwrap();
            prop_assert_eq!(first, doc);
        }

        #[test]
        fn prop_escalated_rank_suffix(v in 7i64..60) {
            let rules = SystemRules::default();
            let mut doc = character([v, 1, 1, 1, 1]);
            derive_entity_with_rules(&mut doc, &rules).unwrap();
            let att = character_system(&doc).ability(AbilityKey::Att).unwrap();
            let extra = (v - 6) as usize;
            prop_assert_eq!(att.rank.clone(), Some(format!("S+{}", "+".repeat(extra))));
            prop_assert_eq!(att.die.clone(), Some(format!("d{}", 14 + 2 * extra)));
        }

        #[test]
        fn prop_xp_is_square_of_cr(cr in 0u32..100) {
            let mut doc: Document = Actor::enemy("e", "E", cr as f64).into();
            derive_entity_with_rules(&mut doc, &SystemRules::default()).unwrap();
            let expected = (cr * cr * 100) as f64;
            prop_assert!((challenge_system(&doc).xp - expected).abs() < f64::EPSILON);
        }
    }
}
