use std::future::Future;
use std::time::Duration;

use migration::{migrate, MigrationCommand};
use rand::Rng;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::config::db::{make_conn_spec, DbKind, DbOwner, RuntimeEnv};
use crate::error::DbInfraError;

const PG_CONNECT_ATTEMPTS: u32 = 5;
const PG_CONNECT_INTERVAL_MS: u64 = 500;

async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, DbInfraError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbInfraError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        "connection_retry=success attempts={} interval_ms={}",
                        attempt, interval_ms
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    let jitter_ms = rand::rng().random_range(0..=interval_ms / 4);
                    warn!(
                        "connection_retry=failed attempt={} max_attempts={} interval_ms={}",
                        attempt, max_attempts, interval_ms
                    );
                    tokio::time::sleep(Duration::from_millis(interval_ms + jitter_ms)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DbInfraError::Connect {
        message: "no error recorded after max attempts".to_string(),
    }))
}

fn connect_options(url: &str, db_kind: DbKind, owner: DbOwner) -> ConnectOptions {
    let mut opt = ConnectOptions::new(url);
    opt.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    match (db_kind, owner) {
        // Every connection to sqlite::memory: opens its own private database
        (DbKind::SqliteMemory, _) => {
            opt.min_connections(1).max_connections(1);
        }
        (_, DbOwner::Owner) => {
            opt.min_connections(1).max_connections(1);
        }
        (DbKind::SqliteFile, DbOwner::App) => {
            opt.min_connections(1).max_connections(4);
        }
        (DbKind::Postgres, DbOwner::App) => {
            let max = (num_cpus::get() as u32 * 2).clamp(4, 32);
            opt.min_connections(1).max_connections(max);
        }
    }
    opt
}

/// Open a connection pool for the given environment, engine and owner.
/// This function does NOT run any migrations.
pub async fn connect_pool(
    env: RuntimeEnv,
    db_kind: DbKind,
    owner: DbOwner,
) -> Result<DatabaseConnection, DbInfraError> {
    let url = make_conn_spec(env, db_kind, owner)?;
    let opt = connect_options(&url, db_kind, owner);

    info!(
        env = ?env,
        db_kind = ?db_kind,
        engine = db_kind.engine(),
        url = %sanitize_db_url(&url),
        "db=connect"
    );

    if matches!(db_kind, DbKind::Postgres) {
        retry_connection(
            || {
                let opt = opt.clone();
                async move {
                    Database::connect(opt)
                        .await
                        .map_err(|e| DbInfraError::Connect {
                            message: format!("failed to connect to Postgres: {e}"),
                        })
                }
            },
            PG_CONNECT_ATTEMPTS,
            PG_CONNECT_INTERVAL_MS,
        )
        .await
    } else {
        Database::connect(opt)
            .await
            .map_err(|e| DbInfraError::Connect {
                message: format!("failed to connect to SQLite: {e}"),
            })
    }
}

pub async fn build_admin_pool(
    env: RuntimeEnv,
    db_kind: DbKind,
) -> Result<DatabaseConnection, DbInfraError> {
    connect_pool(env, db_kind, DbOwner::Owner).await
}

/// Connect and bring the schema up to date in one step.
///
/// SQLite in-memory databases only live as long as their single connection,
/// so the migration runs on the same pool the caller will use.
pub async fn bootstrap_db(
    env: RuntimeEnv,
    db_kind: DbKind,
) -> Result<DatabaseConnection, DbInfraError> {
    match db_kind {
        DbKind::SqliteMemory => {
            let pool = connect_pool(env, db_kind, DbOwner::App).await?;
            run_migration(&pool, MigrationCommand::Up).await?;
            Ok(pool)
        }
        DbKind::SqliteFile => {
            // Owner and app credentials are the same file for SQLite
            let pool = connect_pool(env, db_kind, DbOwner::App).await?;
            run_migration(&pool, MigrationCommand::Up).await?;
            Ok(pool)
        }
        DbKind::Postgres => {
            let admin = build_admin_pool(env, db_kind).await?;
            run_migration(&admin, MigrationCommand::Up).await?;
            if let Err(e) = admin.close().await {
                warn!(error = %e, "failed to close admin pool");
            }
            connect_pool(env, db_kind, DbOwner::App).await
        }
    }
}

/// Entry point for the migration CLI
pub async fn orchestrate_migration(
    env: RuntimeEnv,
    db_kind: DbKind,
    command: MigrationCommand,
) -> Result<(), DbInfraError> {
    if matches!(db_kind, DbKind::SqliteMemory) {
        return Err(DbInfraError::config(
            "SQLite in-memory databases are ephemeral and cannot be migrated from the CLI",
        ));
    }

    info!(
        "migrate=start env={:?} db_kind={:?} engine={}",
        env,
        db_kind,
        db_kind.engine()
    );

    let pool = build_admin_pool(env, db_kind).await?;
    run_migration(&pool, command).await?;

    info!("migrate=done");
    Ok(())
}

async fn run_migration(
    pool: &DatabaseConnection,
    command: MigrationCommand,
) -> Result<(), DbInfraError> {
    migrate(pool, command)
        .await
        .map_err(|e| DbInfraError::Migration {
            message: format!("migration execution failed: {e}"),
        })
}

/// Sanitize database URL by masking password in connection strings.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((auth_part, host_part)) = url.rsplit_once('@') else {
        return url.to_string();
    };
    match auth_part.rfind(':') {
        // `postgresql://user` has its only colon in the scheme
        Some(colon_pos) if auth_part[..colon_pos].contains("//") => {
            format!("{}:***@{}", &auth_part[..colon_pos], host_part)
        }
        _ => url.to_string(),
    }
}
