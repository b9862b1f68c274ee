//! Chat - rolling items and posting the outcome to an activity log

use crate::roll_data::item_roll_data;
use crate::DeriveError;
use rand::Rng;
use roll_core::{Roll, RollError};
use serde::{Deserialize, Serialize};
use sheet_core::{Actor, Item};
use thiserror::Error;

/// Who can see a posted roll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    #[default]
    PublicRoll,
    GmRoll,
    BlindRoll,
    SelfRoll,
}

/// Author of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Id of the speaking actor, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub alias: String,
}

impl Speaker {
    pub fn for_item(item: &Item, owner: Option<&Actor>) -> Self {
        match owner {
            Some(actor) => Speaker {
                actor: Some(actor.id.clone()),
                alias: actor.name.clone(),
            },
            None => Speaker {
                actor: None,
                alias: item.name.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    /// Plain text, no roll performed
    Content(String),
    Roll(Roll),
}

/// A message for the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub mode: RollMode,
    /// Label shown above the body, e.g. `[spell] Spark Burst`
    pub flavor: String,
    pub body: MessageBody,
}

impl ChatMessage {
    pub fn roll(&self) -> Option<&Roll> {
        match &self.body {
            MessageBody::Roll(roll) => Some(roll),
            MessageBody::Content(_) => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Content(content) => Some(content),
            MessageBody::Roll(_) => None,
        }
    }
}

/// Destination for chat messages
pub trait ActivityLog {
    fn post(&mut self, message: ChatMessage);
}

/// In-memory activity log
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take every message posted so far
    pub fn drain(&mut self) -> Vec<ChatMessage> {
        std::mem::take(&mut self.messages)
    }
}

impl ActivityLog for MessageLog {
    fn post(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

/// Error rolling an item
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Item '{item}' has no owner to roll with")]
    MissingOwner { item: String },
    #[error("Roll failed: {0}")]
    Roll(#[from] RollError),
    #[error(transparent)]
    Derive(#[from] DeriveError),
}

/// Use an item: roll its formula, or show its description when it has none
///
/// The owner should already be prepared so its derived values reach the
/// roll data. Returns the roll if one was made. Nothing is posted when the
/// roll fails.
pub fn roll_item<L: ActivityLog + ?Sized>(
    item: &Item,
    owner: Option<&Actor>,
    mode: RollMode,
    log: &mut L,
    rng: &mut impl Rng,
) -> Result<Option<Roll>, ChatError> {
    let speaker = Speaker::for_item(item, owner);
    let flavor = item.label();

    // A blank or whitespace-only formula counts as no formula
    let Some(formula) = item.system.roll_formula() else {
        let content = item.system.description.clone().unwrap_or_default();
        tracing::info!(item = %item.name, "posted item description");
        log.post(ChatMessage {
            speaker,
            mode,
            flavor,
            body: MessageBody::Content(content),
        });
        return Ok(None);
    };

    let missing_owner = || ChatError::MissingOwner {
        item: item.name.clone(),
    };
    let data = item_roll_data(item, owner)?.ok_or_else(|| {
        tracing::warn!(item = %item.name, "item rolled without an owner");
        missing_owner()
    })?;

    let roll = Roll::evaluate(formula, &data, rng)?;
    tracing::info!(item = %item.name, formula, total = roll.total, "posted item roll");
    log.post(ChatMessage {
        speaker,
        mode,
        flavor,
        body: MessageBody::Roll(roll.clone()),
    });
    Ok(Some(roll))
}
