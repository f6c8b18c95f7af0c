//! Group store gateway: the seam services depend on.
//!
//! `GroupStore` is the connection-level gateway; `GroupTxn` is one scoped
//! transaction. Writes through a transaction are version-checked: a put whose
//! group was modified since it was read fails with
//! `ConflictKind::OptimisticLock`.
//!
//! Rows cross the boundary through `decode_group`, which is the only place
//! raw player JSON is interpreted.

use async_trait::async_trait;
use sea_orm::prelude::Json;
use tracing::warn;

use crate::domain::group::{Entry, Group, NewGroup};
use crate::entities::groups;
use crate::errors::domain::{DomainError, InfraErrorKind};

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Newest `start_time` first; rows that fail to decode are skipped.
    async fn list_groups(&self, limit: u64) -> Result<Vec<Group>, DomainError>;

    async fn find_group(&self, id: i64) -> Result<Option<Group>, DomainError>;

    /// Persist a new group with empty queues and return its id.
    async fn insert_group(&self, new: NewGroup) -> Result<i64, DomainError>;

    async fn begin(&self) -> Result<Box<dyn GroupTxn>, DomainError>;
}

#[async_trait]
pub trait GroupTxn: Send {
    async fn find_group(&mut self, id: i64) -> Result<Option<Group>, DomainError>;

    /// Write both player queues back, guarded by `group.version`.
    async fn put_group(&mut self, group: &Group) -> Result<(), DomainError>;

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

fn corrupt(group_id: i64, detail: impl std::fmt::Display) -> DomainError {
    DomainError::infra(
        InfraErrorKind::DataCorruption,
        format!("Group {group_id} is corrupt: {detail}"),
    )
}

fn decode_entries(group_id: i64, column: &str, value: Json) -> Result<Vec<Entry>, DomainError> {
    let Json::Array(items) = value else {
        return Err(corrupt(group_id, format_args!("{column} is not an array")));
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, item)| match serde_json::from_value::<Entry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(group_id, column, index, error = %e, "Dropping malformed entry");
                    None
                }
            },
        )
        .collect())
}

/// Convert a stored row into a typed group.
///
/// Malformed entries are dropped; malformed group-level fields fail the
/// whole row with `InfraErrorKind::DataCorruption`.
pub fn decode_group(row: groups::Model) -> Result<Group, DomainError> {
    let id = row.id;
    let single_limit = u32::try_from(row.single_limit)
        .map_err(|_| corrupt(id, format_args!("single_limit {}", row.single_limit)))?;
    let double_limit = u32::try_from(row.double_limit)
        .map_err(|_| corrupt(id, format_args!("double_limit {}", row.double_limit)))?;

    Ok(Group {
        id,
        location: row.location,
        description: row.description,
        start_time: row.start_time,
        end_time: row.end_time,
        retreat_deadline: row.retreat_deadline,
        single_limit,
        double_limit,
        pin: row.pin,
        single_players: decode_entries(id, "single_players", row.single_players)?,
        double_players: decode_entries(id, "double_players", row.double_players)?,
        version: row.version,
    })
}

/// `decode_group` for listings: a corrupt row is logged and skipped.
pub fn decode_listed(rows: Vec<groups::Model>) -> Vec<Group> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match decode_group(row) {
                Ok(group) => Some(group),
                Err(e) => {
                    warn!(group_id = id, error = %e, "Skipping undecodable group");
                    None
                }
            }
        })
        .collect()
}

pub fn encode_entries(entries: &[Entry]) -> Result<Json, DomainError> {
    serde_json::to_value(entries).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::Other("Encode".into()),
            format!("failed to encode entries: {e}"),
        )
    })
}

pub fn limit_to_i32(limit: u32, field: &str) -> Result<i32, DomainError> {
    i32::try_from(limit).map_err(|_| DomainError::validation(format!("{field} is too large")))
}
