use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::domain::DomainError;

/// Which capacity-limited queue of a group an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueType {
    Single,
    Double,
}

impl QueueType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueueType::Single => "single",
            QueueType::Double => "double",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(QueueType::Single),
            "double" => Ok(QueueType::Double),
            other => Err(DomainError::validation(format!(
                "Unknown queue type '{other}' (expected single or double)"
            ))),
        }
    }
}

/// One player's claim on a queue slot, as embedded in the group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub pin: String,
    #[serde(with = "time::serde::rfc3339")]
    pub signup_time: OffsetDateTime,
    /// Per-group insertion counter; rows written before it existed read as 0.
    #[serde(default)]
    pub seq: u64,
}

/// A decoded group. Limits of 0 disable a queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: i64,
    pub location: String,
    pub description: Option<String>,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub retreat_deadline: OffsetDateTime,
    pub single_limit: u32,
    pub double_limit: u32,
    pub pin: String,
    pub single_players: Vec<Entry>,
    pub double_players: Vec<Entry>,
    /// Optimistic lock counter as read from the store
    pub version: i32,
}

impl Group {
    pub fn queue(&self, queue: QueueType) -> &[Entry] {
        match queue {
            QueueType::Single => &self.single_players,
            QueueType::Double => &self.double_players,
        }
    }

    pub fn queue_mut(&mut self, queue: QueueType) -> &mut Vec<Entry> {
        match queue {
            QueueType::Single => &mut self.single_players,
            QueueType::Double => &mut self.double_players,
        }
    }

    pub fn limit(&self, queue: QueueType) -> u32 {
        match queue {
            QueueType::Single => self.single_limit,
            QueueType::Double => self.double_limit,
        }
    }

    /// Next insertion counter, unique across both queues of this group.
    pub fn next_seq(&self) -> u64 {
        self.single_players
            .iter()
            .chain(&self.double_players)
            .map(|e| e.seq)
            .max()
            .map_or(1, |max| max + 1)
    }
}

/// Validated creation input; both queues start empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGroup {
    pub location: String,
    pub description: Option<String>,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub retreat_deadline: OffsetDateTime,
    pub single_limit: u32,
    pub double_limit: u32,
    pub pin: String,
}
