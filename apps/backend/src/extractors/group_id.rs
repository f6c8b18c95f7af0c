use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::error::AppError;
use crate::errors::ErrorCode;

/// Group ID taken from the `{group_id}` path segment.
///
/// Only the shape is checked here; whether the group exists is up to the
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(pub i64);

fn parse(raw: Option<&str>) -> Result<GroupId, AppError> {
    let raw = raw.ok_or_else(|| {
        AppError::bad_request(ErrorCode::InvalidGroupId, "Missing group_id parameter")
    })?;

    let group_id = raw.parse::<i64>().map_err(|_| {
        AppError::bad_request(ErrorCode::InvalidGroupId, format!("Invalid group id: {raw}"))
    })?;

    if group_id <= 0 {
        return Err(AppError::bad_request(
            ErrorCode::InvalidGroupId,
            format!("Group id must be positive, got: {group_id}"),
        ));
    }
    Ok(GroupId(group_id))
}

impl FromRequest for GroupId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(parse(req.match_info().get("group_id")))
    }
}
