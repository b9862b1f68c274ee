//! Lookup tables driving derivation

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Highest ability value a rank can be built for
pub const MAX_ABILITY_VALUE: i64 = 100;

/// Global rules instance
static SYSTEM_RULES: OnceLock<SystemRules> = OnceLock::new();

/// Initialize the global rules from a TOML file
///
/// Returns error if already initialized or if loading fails.
pub fn init_rules(path: &Path) -> Result<(), ConfigError> {
    let rules = load_rules(path)?;
    SYSTEM_RULES
        .set(rules)
        .map_err(|_| ConfigError::ValidationError("SystemRules already initialized".to_string()))
}

/// Initialize the global rules with the built-in tables
pub fn init_rules_default() -> Result<(), ConfigError> {
    SYSTEM_RULES
        .set(SystemRules::default())
        .map_err(|_| ConfigError::ValidationError("SystemRules already initialized".to_string()))
}

/// Get the global rules
///
/// Falls back to the built-in tables if nothing was initialized.
pub fn rules() -> &'static SystemRules {
    SYSTEM_RULES.get_or_init(SystemRules::default)
}

pub fn rules_initialized() -> bool {
    SYSTEM_RULES.get().is_some()
}

/// Load and validate rules from a TOML file (doesn't set global)
pub fn load_rules(path: &Path) -> Result<SystemRules, ConfigError> {
    let rules: SystemRules = super::load_toml(path)?;
    rules.validate()?;
    Ok(rules)
}

/// Parse and validate rules from a TOML string (doesn't set global)
pub fn parse_rules(toml: &str) -> Result<SystemRules, ConfigError> {
    let rules: SystemRules = super::parse_toml(toml)?;
    rules.validate()?;
    Ok(rules)
}

/// Face count of a die string such as `d12`
pub fn parse_die_faces(die: &str) -> Option<u32> {
    die.strip_prefix('d')
        .or_else(|| die.strip_prefix('D'))?
        .parse()
        .ok()
        .filter(|faces| *faces > 0)
}

/// Every table the system reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemRules {
    #[serde(default)]
    pub ranks: RankRules,
    #[serde(default)]
    pub stats: StatTables,
    #[serde(default)]
    pub xp: XpRules,
}

impl SystemRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ranks.validate()?;
        let expected = self.ranks.value_to_rank.len();
        for table in StatTable::all() {
            let len = self.stats.get(*table).len();
            if len != expected {
                return Err(ConfigError::ValidationError(format!(
                    "stats.{} has {} entries, rank table has {}",
                    table, len, expected
                )));
            }
        }
        Ok(())
    }
}

/// Ability value to rank to die size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRules {
    /// Rank for values 1..=len
    #[serde(default = "default_value_to_rank")]
    pub value_to_rank: Vec<String>,
    #[serde(default = "default_rank_to_die")]
    pub rank_to_die: BTreeMap<String, String>,
    /// Appended to the top rank once per point above the table
    #[serde(default = "default_escalation_suffix")]
    pub escalation_suffix: String,
    /// Extra die faces per point above the table
    #[serde(default = "default_escalated_die_step")]
    pub escalated_die_step: u32,
}

impl Default for RankRules {
    fn default() -> Self {
        RankRules {
            value_to_rank: default_value_to_rank(),
            rank_to_die: default_rank_to_die(),
            escalation_suffix: default_escalation_suffix(),
            escalated_die_step: default_escalated_die_step(),
        }
    }
}

impl RankRules {
    /// How far `value` is past the end of the rank table
    fn overflow(&self, value: i64) -> Option<usize> {
        if !(1..=MAX_ABILITY_VALUE).contains(&value) || self.value_to_rank.is_empty() {
            return None;
        }
        Some((value as usize).saturating_sub(self.value_to_rank.len()))
    }

    /// Rank label for an ability value
    ///
    /// Values past the table repeat the escalation suffix on the top rank,
    /// so with the default table 6 is `S+`, 7 is `S++` and 8 is `S+++`.
    pub fn rank(&self, value: i64) -> Option<String> {
        let overflow = self.overflow(value)?;
        if overflow == 0 {
            return self.value_to_rank.get(value as usize - 1).cloned();
        }
        let top = self.value_to_rank.last()?;
        Some(format!("{}{}", top, self.escalation_suffix.repeat(overflow)))
    }

    /// Die size for an ability value
    pub fn die(&self, value: i64) -> Option<String> {
        let overflow = self.overflow(value)?;
        if overflow == 0 {
            let rank = self.value_to_rank.get(value as usize - 1)?;
            return self.rank_to_die.get(rank).cloned();
        }
        let top = self.rank_to_die.get(self.value_to_rank.last()?)?;
        let step = u32::try_from(overflow)
            .ok()?
            .checked_mul(self.escalated_die_step)?;
        let faces = parse_die_faces(top)?.checked_add(step)?;
        Some(format!("d{}", faces))
    }

    /// Die size for a rank label, escalated ranks included
    pub fn die_for_rank(&self, rank: &str) -> Option<String> {
        if let Some(die) = self.rank_to_die.get(rank) {
            return Some(die.clone());
        }
        let top = self.value_to_rank.last()?;
        let rest = rank.strip_prefix(top.as_str())?;
        if self.escalation_suffix.is_empty() || rest.is_empty() {
            return None;
        }
        let count = rest.len() / self.escalation_suffix.len();
        if count > MAX_ABILITY_VALUE as usize {
            return None;
        }
        if self.escalation_suffix.repeat(count) != rest {
            return None;
        }
        self.die((self.value_to_rank.len() + count) as i64)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.value_to_rank.is_empty() {
            return Err(ConfigError::ValidationError(
                "ranks.value_to_rank must not be empty".to_string(),
            ));
        }
        if self.escalation_suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "ranks.escalation_suffix must not be empty".to_string(),
            ));
        }
        for rank in &self.value_to_rank {
            let die = self.rank_to_die.get(rank).ok_or_else(|| {
                ConfigError::ValidationError(format!("rank '{}' has no die", rank))
            })?;
            if parse_die_faces(die).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "rank '{}' has invalid die '{}'",
                    rank, die
                )));
            }
        }
        Ok(())
    }
}

fn default_value_to_rank() -> Vec<String> {
    ["D", "C", "B", "A", "S", "S+"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_rank_to_die() -> BTreeMap<String, String> {
    [
        ("D", "d4"),
        ("C", "d6"),
        ("B", "d8"),
        ("A", "d10"),
        ("S", "d12"),
        ("S+", "d14"),
    ]
    .into_iter()
    .map(|(rank, die)| (rank.to_string(), die.to_string()))
    .collect()
}

fn default_escalation_suffix() -> String {
    "+".to_string()
}

fn default_escalated_die_step() -> u32 {
    2
}

/// Table-driven character stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatTable {
    DiceNumber,
    HealthMax,
    ExposureMax,
    MovBonus,
    KoLength,
}

impl StatTable {
    pub fn all() -> &'static [StatTable] {
        &[
            StatTable::DiceNumber,
            StatTable::HealthMax,
            StatTable::ExposureMax,
            StatTable::MovBonus,
            StatTable::KoLength,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatTable::DiceNumber => "dice_number",
            StatTable::HealthMax => "health_max",
            StatTable::ExposureMax => "exposure_max",
            StatTable::MovBonus => "mov_bonus",
            StatTable::KoLength => "ko_length",
        }
    }
}

impl fmt::Display for StatTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stat value per ability value, indexed by value - 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTables {
    /// Indexed by spd
    #[serde(default = "default_dice_number")]
    pub dice_number: Vec<i64>,
    /// Indexed by con
    #[serde(default = "default_health_max")]
    pub health_max: Vec<i64>,
    /// Indexed by con
    #[serde(default = "default_exposure_max")]
    pub exposure_max: Vec<i64>,
    /// Indexed by mov
    #[serde(default = "default_mov_bonus")]
    pub mov_bonus: Vec<i64>,
    /// Indexed by mov
    #[serde(default = "default_ko_length")]
    pub ko_length: Vec<i64>,
}

impl Default for StatTables {
    fn default() -> Self {
        StatTables {
            dice_number: default_dice_number(),
            health_max: default_health_max(),
            exposure_max: default_exposure_max(),
            mov_bonus: default_mov_bonus(),
            ko_length: default_ko_length(),
        }
    }
}

impl StatTables {
    pub fn get(&self, table: StatTable) -> &[i64] {
        match table {
            StatTable::DiceNumber => &self.dice_number,
            StatTable::HealthMax => &self.health_max,
            StatTable::ExposureMax => &self.exposure_max,
            StatTable::MovBonus => &self.mov_bonus,
            StatTable::KoLength => &self.ko_length,
        }
    }

    /// Row for an ability value, None outside the table
    pub fn lookup(&self, table: StatTable, value: i64) -> Option<i64> {
        let index = usize::try_from(value.checked_sub(1)?).ok()?;
        self.get(table).get(index).copied()
    }
}

fn default_dice_number() -> Vec<i64> {
    vec![1, 2, 3, 4, 5, 6]
}
fn default_health_max() -> Vec<i64> {
    vec![2, 4, 6, 8, 10, 12]
}
fn default_exposure_max() -> Vec<i64> {
    vec![4, 6, 8, 10, 12, 14]
}
fn default_mov_bonus() -> Vec<i64> {
    vec![0, 0, 1, 1, 2, 2]
}
fn default_ko_length() -> Vec<i64> {
    vec![4, 3, 2, 2, 1, 1]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpRules {
    /// xp = cr * cr * per_cr_squared
    #[serde(default = "default_per_cr_squared")]
    pub per_cr_squared: f64,
}

impl Default for XpRules {
    fn default() -> Self {
        XpRules {
            per_cr_squared: default_per_cr_squared(),
        }
    }
}

fn default_per_cr_squared() -> f64 {
    100.0
}
