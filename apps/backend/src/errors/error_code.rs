//! Error codes for the sign-up API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes. Every code
//! is SCREAMING_SNAKE_CASE and maps 1:1 to the `code` field of a Problem
//! Details response.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request validation
    /// Path segment is not a positive group id
    InvalidGroupId,
    /// Queue is neither `single` nor `double`
    InvalidQueueType,
    /// Creation form or player input rejected
    ValidationError,
    /// Malformed request body
    BadRequest,

    // Resource not found
    GroupNotFound,
    PlayerNotFound,
    NotFound,

    // Business conflicts
    /// Same name (case-insensitive) already in the queue
    DuplicateName,
    /// Group changed between read and write on every attempt
    OptimisticLock,
    Conflict,

    // Credentials
    /// PIN matches neither the entry nor the group
    WrongPin,

    // System errors
    DbError,
    DbUnavailable,
    DbTimeout,
    /// Stored group could not be decoded
    DataCorruption,
    Internal,
    ConfigError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 17] = [
        Self::InvalidGroupId,
        Self::InvalidQueueType,
        Self::ValidationError,
        Self::BadRequest,
        Self::GroupNotFound,
        Self::PlayerNotFound,
        Self::NotFound,
        Self::DuplicateName,
        Self::OptimisticLock,
        Self::Conflict,
        Self::WrongPin,
        Self::DbError,
        Self::DbUnavailable,
        Self::DbTimeout,
        Self::DataCorruption,
        Self::Internal,
        Self::ConfigError,
    ];

    /// The exact string that appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidGroupId => "INVALID_GROUP_ID",
            Self::InvalidQueueType => "INVALID_QUEUE_TYPE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::DuplicateName => "DUPLICATE_NAME",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::Conflict => "CONFLICT",

            Self::WrongPin => "WRONG_PIN",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_error_code_strings() {
        assert_eq!(ErrorCode::InvalidGroupId.as_str(), "INVALID_GROUP_ID");
        assert_eq!(ErrorCode::GroupNotFound.as_str(), "GROUP_NOT_FOUND");
        assert_eq!(ErrorCode::DuplicateName.as_str(), "DUPLICATE_NAME");
        assert_eq!(ErrorCode::WrongPin.as_str(), "WRONG_PIN");
        assert_eq!(ErrorCode::DataCorruption.as_str(), "DATA_CORRUPTION");
    }

    #[test]
    fn test_codes_are_unique_and_screaming_snake() {
        let mut seen = HashSet::new();
        for code in ErrorCode::ALL {
            let s = code.as_str();
            assert!(seen.insert(s), "duplicate error code {s}");
            assert!(
                s.chars().all(|c| c.is_ascii_uppercase() || c == '_'),
                "{s} is not SCREAMING_SNAKE_CASE"
            );
        }
    }

    #[test]
    fn test_display_trait() {
        assert_eq!(format!("{}", ErrorCode::OptimisticLock), "OPTIMISTIC_LOCK");
    }
}
