//! In-process group store.
//!
//! Holds raw rows exactly as the SQL adapter would, so decoding, version
//! checks and malformed-data handling behave the same. Transactions stage
//! their writes and validate versions when they commit.
//!
//! Test hooks: `set_fail_writes` makes every write fail as a store error and
//! `inject_concurrent_writes(n)` makes the next `n` commits lose a race
//! against a simulated writer.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::domain::group::{Group, NewGroup};
use crate::entities::groups;
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::infra::db_errors::optimistic_lock_err;
use crate::repos::groups::{
    decode_group, decode_listed, encode_entries, limit_to_i32, GroupStore, GroupTxn,
};

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<i64, groups::Model>,
    last_id: i64,
    fail_writes: bool,
    concurrent_writes: u32,
}

impl Inner {
    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes {
            return Err(DomainError::infra(
                InfraErrorKind::Other("Write".into()),
                "Group store rejected the write",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGroupStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    pub fn inject_concurrent_writes(&self, count: u32) {
        self.inner.lock().concurrent_writes = count;
    }

    /// Store a row verbatim, bypassing validation. Assigns an id if `row.id`
    /// is not positive and returns the id used.
    pub fn insert_raw(&self, mut row: groups::Model) -> i64 {
        let mut inner = self.inner.lock();
        if row.id <= 0 {
            inner.last_id += 1;
            row.id = inner.last_id;
        } else {
            inner.last_id = inner.last_id.max(row.id);
        }
        let id = row.id;
        inner.rows.insert(id, row);
        id
    }

    /// Raw stored version, for assertions.
    pub fn version_of(&self, id: i64) -> Option<i32> {
        self.inner.lock().rows.get(&id).map(|row| row.version)
    }

    fn row(&self, id: i64) -> Option<groups::Model> {
        self.inner.lock().rows.get(&id).cloned()
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn list_groups(&self, limit: u64) -> Result<Vec<Group>, DomainError> {
        let mut rows: Vec<groups::Model> = self.inner.lock().rows.values().cloned().collect();
        rows.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(decode_listed(rows))
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, DomainError> {
        self.row(id).map(decode_group).transpose()
    }

    async fn insert_group(&self, new: NewGroup) -> Result<i64, DomainError> {
        let now = OffsetDateTime::now_utc();
        let row = groups::Model {
            id: 0,
            location: new.location,
            description: new.description,
            start_time: new.start_time.to_offset(UtcOffset::UTC),
            end_time: new.end_time.to_offset(UtcOffset::UTC),
            retreat_deadline: new.retreat_deadline.to_offset(UtcOffset::UTC),
            single_limit: limit_to_i32(new.single_limit, "single_limit")?,
            double_limit: limit_to_i32(new.double_limit, "double_limit")?,
            pin: new.pin,
            single_players: encode_entries(&[])?,
            double_players: encode_entries(&[])?,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        self.inner.lock().check_writable()?;
        Ok(self.insert_raw(row))
    }

    async fn begin(&self) -> Result<Box<dyn GroupTxn>, DomainError> {
        Ok(Box::new(MemoryGroupTxn {
            store: self.clone(),
            staged: BTreeMap::new(),
        }))
    }
}

/// Staged row plus the version it was read at
struct StagedWrite {
    expected_version: i32,
    row: groups::Model,
}

pub struct MemoryGroupTxn {
    store: MemoryGroupStore,
    staged: BTreeMap<i64, StagedWrite>,
}

#[async_trait]
impl GroupTxn for MemoryGroupTxn {
    async fn find_group(&mut self, id: i64) -> Result<Option<Group>, DomainError> {
        let row = match self.staged.get(&id) {
            Some(staged) => Some(staged.row.clone()),
            None => self.store.row(id),
        };
        row.map(decode_group).transpose()
    }

    async fn put_group(&mut self, group: &Group) -> Result<(), DomainError> {
        self.store.inner.lock().check_writable()?;

        let Some(mut row) = self.store.row(group.id) else {
            return Err(DomainError::group_not_found(group.id));
        };
        row.single_players = encode_entries(&group.single_players)?;
        row.double_players = encode_entries(&group.double_players)?;
        row.updated_at = OffsetDateTime::now_utc();
        row.version = group.version + 1;

        self.staged.insert(
            group.id,
            StagedWrite {
                expected_version: group.version,
                row,
            },
        );
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let MemoryGroupTxn { store, staged } = *self;
        let mut inner = store.inner.lock();

        if inner.concurrent_writes > 0 && !staged.is_empty() {
            inner.concurrent_writes -= 1;
            for id in staged.keys() {
                if let Some(row) = inner.rows.get_mut(id) {
                    row.version += 1;
                    row.updated_at = OffsetDateTime::now_utc();
                }
            }
            debug!("Simulated a concurrent write before commit");
        }

        for (id, write) in &staged {
            match inner.rows.get(id).map(|row| row.version) {
                Some(actual) if actual == write.expected_version => {}
                Some(actual) => {
                    return Err(optimistic_lock_err(write.expected_version, actual).into())
                }
                None => return Err(DomainError::group_not_found(*id)),
            }
        }

        for (id, write) in staged {
            inner.rows.insert(id, write.row);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}
