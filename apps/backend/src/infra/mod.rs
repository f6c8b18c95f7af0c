//! Infrastructure layer - DB error translation and state construction.

pub mod db_errors;
pub mod state;
