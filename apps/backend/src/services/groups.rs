//! Group sign-up service: the core surface the HTTP layer calls.
//!
//! Mutations run as read-modify-write inside one store transaction. A
//! version conflict restarts the whole cycle in a fresh transaction, up to
//! `max_attempts` times, before the conflict is returned to the caller.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::domain::creation::{parse_new_group, CreateGroupForm};
use crate::domain::group::{Group, QueueType};
use crate::domain::projection::{self, GroupView};
use crate::domain::signup::{add_entry, remove_entry};
use crate::errors::domain::DomainError;
use crate::repos::groups::{GroupStore, GroupTxn};

#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn GroupStore>,
    max_attempts: u32,
    page_size: u64,
}

impl fmt::Debug for GroupService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupService")
            .field("max_attempts", &self.max_attempts)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl GroupService {
    pub fn new(store: Arc<dyn GroupStore>, max_attempts: u32, page_size: u64) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Newest groups first. `limit` is capped at the configured page size.
    pub async fn list_groups(&self, limit: Option<u64>) -> Result<Vec<Group>, DomainError> {
        let limit = limit.map_or(self.page_size, |l| l.min(self.page_size));
        self.store.list_groups(limit).await
    }

    pub async fn get_group(&self, group_id: i64) -> Result<Group, DomainError> {
        self.store
            .find_group(group_id)
            .await?
            .ok_or_else(|| DomainError::group_not_found(group_id))
    }

    pub fn resolve_group(&self, group: &Group) -> Result<GroupView, DomainError> {
        projection::resolve_group(group, OffsetDateTime::now_utc())
    }

    pub async fn create_group(&self, form: &CreateGroupForm) -> Result<i64, DomainError> {
        let new = parse_new_group(form)?;
        let group_id = self.store.insert_group(new).await?;
        info!(group_id, "Group created");
        Ok(group_id)
    }

    pub async fn add_player(
        &self,
        group_id: i64,
        queue: QueueType,
        name: &str,
        pin: &str,
    ) -> Result<(), DomainError> {
        self.mutate(group_id, |group| {
            add_entry(group, queue, name, pin, OffsetDateTime::now_utc())
        })
        .await?;
        info!(group_id, queue = %queue, "Player signed up");
        Ok(())
    }

    pub async fn remove_player(
        &self,
        group_id: i64,
        queue: QueueType,
        name: &str,
        pin: &str,
    ) -> Result<(), DomainError> {
        self.mutate(group_id, |group| remove_entry(group, queue, name, pin))
            .await?;
        info!(group_id, queue = %queue, "Player withdrew");
        Ok(())
    }

    async fn mutate<T, F>(&self, group_id: i64, f: F) -> Result<T, DomainError>
    where
        T: Send,
        F: Fn(&mut Group) -> Result<T, DomainError> + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            match self.try_mutate(group_id, &f).await {
                Err(e) if e.is_optimistic_lock() && attempt < self.max_attempts => {
                    warn!(
                        group_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        "Concurrent modification, retrying"
                    );
                    attempt += 1;
                }
                Err(e) if e.is_optimistic_lock() => {
                    warn!(group_id, attempt, "Concurrent modification, giving up");
                    return Err(e);
                }
                other => return other,
            }
        }
    }

    async fn try_mutate<T, F>(&self, group_id: i64, f: &F) -> Result<T, DomainError>
    where
        F: Fn(&mut Group) -> Result<T, DomainError> + Sync,
    {
        let mut txn = self.store.begin().await?;

        match apply(txn.as_mut(), group_id, f).await {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(group_id, error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

async fn apply<T, F>(txn: &mut dyn GroupTxn, group_id: i64, f: &F) -> Result<T, DomainError>
where
    F: Fn(&mut Group) -> Result<T, DomainError> + Sync,
{
    let mut group = txn
        .find_group(group_id)
        .await?
        .ok_or_else(|| DomainError::group_not_found(group_id))?;
    let value = f(&mut group)?;
    txn.put_group(&group).await?;
    Ok(value)
}
