//! SeaORM -> DomainError translation.
//!
//! Adapters convert `sea_orm::DbErr` here; higher layers then map the
//! `DomainError` to `AppError` via `From`.

use serde::Deserialize;
use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::trace_ctx;

/// Prefix of the `DbErr::Custom` payload adapters raise on a version mismatch
pub const OPTIMISTIC_LOCK_PREFIX: &str = "OPTIMISTIC_LOCK:";

#[derive(Deserialize)]
struct LockInfo {
    expected: i32,
    actual: i32,
}

/// Build the structured `DbErr` reported when a versioned update misses.
pub fn optimistic_lock_err(expected: i32, actual: i32) -> sea_orm::DbErr {
    sea_orm::DbErr::Custom(format!(
        "{OPTIMISTIC_LOCK_PREFIX}{{\"expected\":{expected},\"actual\":{actual}}}"
    ))
}

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_BUSY_SNAPSHOT (517): another
/// connection holds the write lock.
fn is_sqlite_busy(msg: &str) -> bool {
    ["(code: 5)", "(code: 6)", "(code: 517)"]
        .iter()
        .any(|code| msg.contains(code))
        || msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("SQLITE_BUSY")
}

pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(_) => {
            return DomainError::not_found(
                NotFoundKind::Other("Record".into()),
                "Record not found",
            );
        }
        sea_orm::DbErr::Custom(msg) if msg.starts_with(OPTIMISTIC_LOCK_PREFIX) => {
            let info = msg
                .strip_prefix(OPTIMISTIC_LOCK_PREFIX)
                .and_then(|json| serde_json::from_str::<LockInfo>(json).ok());

            return match info {
                Some(info) => {
                    warn!(
                        trace_id = %trace_id,
                        expected = info.expected,
                        actual = info.actual,
                        "Optimistic lock conflict detected"
                    );
                    DomainError::conflict(
                        ConflictKind::OptimisticLock,
                        format!(
                            "Group was modified concurrently (expected version {}, actual version {}). Please retry.",
                            info.expected, info.actual
                        ),
                    )
                }
                None => {
                    warn!(trace_id = %trace_id, "Optimistic lock conflict detected (version info unavailable)");
                    DomainError::conflict(
                        ConflictKind::OptimisticLock,
                        "Group was modified by another request; please retry",
                    )
                }
            };
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %error_msg, "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        sea_orm::DbErr::Json(_) | sea_orm::DbErr::Type(_) | sea_orm::DbErr::TryIntoErr { .. } => {
            error!(trace_id = %trace_id, raw_error = %error_msg, "Stored row could not be decoded");
            return DomainError::infra(
                InfraErrorKind::DataCorruption,
                "Stored group could not be decoded",
            );
        }
        _ => {}
    }

    if is_sqlite_busy(&error_msg) {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "sqlite_busy: write lock contention");
        return DomainError::conflict(
            ConflictKind::OptimisticLock,
            "Group is being modified by another request; please retry",
        );
    }

    if mentions_sqlstate(&error_msg, "23505")
        || error_msg.contains("duplicate key value violates unique constraint")
        || error_msg.contains("UNIQUE constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Unique constraint violation");
        return DomainError::conflict(
            ConflictKind::Other("Unique".into()),
            "Unique constraint violation",
        );
    }

    if mentions_sqlstate(&error_msg, "23514") || error_msg.contains("CHECK constraint failed") {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Check constraint violation");
        return DomainError::validation("Check constraint violation");
    }

    if error_msg.contains("timeout") || error_msg.contains("timed out") {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Database timeout");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %error_msg, "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn structured_optimistic_lock_maps_to_conflict() {
        let err = map_db_err(optimistic_lock_err(3, 4));
        assert!(err.is_optimistic_lock());
        assert!(err.detail().contains("expected version 3"));
    }

    #[test]
    fn unparsable_lock_payload_still_conflicts() {
        let err = map_db_err(DbErr::Custom("OPTIMISTIC_LOCK:garbage".into()));
        assert!(err.is_optimistic_lock());
    }

    #[test]
    fn sqlite_lock_contention_is_retryable() {
        for msg in [
            "Execution Error: error returned from database: (code: 5) database is locked",
            "Query Error: error returned from database: (code: 517) database is locked",
            "Execution Error: error returned from database: (code: 6) database table is locked",
        ] {
            let err = map_db_err(DbErr::Custom(msg.into()));
            assert!(err.is_optimistic_lock(), "{msg}");
        }
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = map_db_err(DbErr::Custom(
            "UNIQUE constraint failed: groups.id".into(),
        ));
        assert!(matches!(err, DomainError::Conflict(ConflictKind::Other(_), _)));
    }

    #[test]
    fn json_errors_are_data_corruption() {
        let err = map_db_err(DbErr::Json("expected array".into()));
        assert!(matches!(
            err,
            DomainError::Infra(InfraErrorKind::DataCorruption, _)
        ));
    }

    #[test]
    fn unknown_errors_are_generic_infra() {
        let err = map_db_err(DbErr::Custom("disk on fire".into()));
        assert_eq!(
            err,
            DomainError::infra(
                InfraErrorKind::Other("DbErr".into()),
                "Database operation failed"
            )
        );
    }
}
