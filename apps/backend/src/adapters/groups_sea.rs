//! SeaORM adapter for the group store (Postgres or SQLite).
//!
//! SQLite allows one writer at a time and reports a lost race as
//! `SQLITE_BUSY` instead of waiting, so on SQLite every write transaction
//! first takes a writer gate shared by every clone of the store. Version
//! checks then decide the outcome exactly as on Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::group::{Group, NewGroup};
use crate::entities::groups;
use crate::errors::domain::DomainError;
use crate::infra::db_errors::optimistic_lock_err;
use crate::repos::groups::{
    decode_group, decode_listed, encode_entries, limit_to_i32, GroupStore, GroupTxn,
};

async fn find_row<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<groups::Model>, DomainError> {
    groups::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(DomainError::from)
}

async fn find_decoded<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<Group>, DomainError> {
    find_row(conn, id).await?.map(decode_group).transpose()
}

fn utc(t: OffsetDateTime) -> OffsetDateTime {
    t.to_offset(UtcOffset::UTC)
}

#[derive(Debug, Clone)]
pub struct SeaGroupStore {
    db: DatabaseConnection,
    writer_gate: Option<Arc<Mutex<()>>>,
}

impl SeaGroupStore {
    pub fn new(db: DatabaseConnection) -> Self {
        let writer_gate = matches!(db.get_database_backend(), DatabaseBackend::Sqlite)
            .then(|| Arc::new(Mutex::new(())));
        Self { db, writer_gate }
    }

    async fn acquire_writer(&self) -> Option<OwnedMutexGuard<()>> {
        match &self.writer_gate {
            Some(gate) => Some(Arc::clone(gate).lock_owned().await),
            None => None,
        }
    }
}

#[async_trait]
impl GroupStore for SeaGroupStore {
    async fn list_groups(&self, limit: u64) -> Result<Vec<Group>, DomainError> {
        let rows = groups::Entity::find()
            .order_by_desc(groups::Column::StartTime)
            .order_by_desc(groups::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(DomainError::from)?;
        Ok(decode_listed(rows))
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, DomainError> {
        find_decoded(&self.db, id).await
    }

    async fn insert_group(&self, new: NewGroup) -> Result<i64, DomainError> {
        let now = OffsetDateTime::now_utc();
        let model = groups::ActiveModel {
            id: NotSet,
            location: Set(new.location),
            description: Set(new.description),
            start_time: Set(utc(new.start_time)),
            end_time: Set(utc(new.end_time)),
            retreat_deadline: Set(utc(new.retreat_deadline)),
            single_limit: Set(limit_to_i32(new.single_limit, "single_limit")?),
            double_limit: Set(limit_to_i32(new.double_limit, "double_limit")?),
            pin: Set(new.pin),
            single_players: Set(encode_entries(&[])?),
            double_players: Set(encode_entries(&[])?),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
        };

        let _writer = self.acquire_writer().await;
        let result = groups::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(DomainError::from)?;
        Ok(result.last_insert_id)
    }

    async fn begin(&self) -> Result<Box<dyn GroupTxn>, DomainError> {
        let writer = self.acquire_writer().await;
        let txn = self.db.begin().await.map_err(DomainError::from)?;
        Ok(Box::new(SeaGroupTxn {
            txn,
            _writer: writer,
        }))
    }
}

pub struct SeaGroupTxn {
    txn: DatabaseTransaction,
    // Released only after the transaction has finished
    _writer: Option<OwnedMutexGuard<()>>,
}

#[async_trait]
impl GroupTxn for SeaGroupTxn {
    async fn find_group(&mut self, id: i64) -> Result<Option<Group>, DomainError> {
        find_decoded(&self.txn, id).await
    }

    async fn put_group(&mut self, group: &Group) -> Result<(), DomainError> {
        let single = encode_entries(&group.single_players)?;
        let double = encode_entries(&group.double_players)?;

        let result = groups::Entity::update_many()
            .col_expr(groups::Column::SinglePlayers, Expr::value(single))
            .col_expr(groups::Column::DoublePlayers, Expr::value(double))
            .col_expr(
                groups::Column::UpdatedAt,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .col_expr(
                groups::Column::Version,
                Expr::col(groups::Column::Version).add(1),
            )
            .filter(groups::Column::Id.eq(group.id))
            .filter(groups::Column::Version.eq(group.version))
            .exec(&self.txn)
            .await
            .map_err(DomainError::from)?;

        if result.rows_affected == 0 {
            // Either the group vanished or another writer bumped the version
            return match find_row(&self.txn, group.id).await? {
                Some(current) => Err(optimistic_lock_err(group.version, current.version).into()),
                None => Err(DomainError::group_not_found(group.id)),
            };
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.txn.commit().await.map_err(DomainError::from)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.txn.rollback().await.map_err(DomainError::from)
    }
}
