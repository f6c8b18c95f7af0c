use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::domain::group::QueueType;
use crate::error::AppError;
use crate::errors::ErrorCode;

/// Queue named by the `{queue}` path segment: `single` or `double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueParam(pub QueueType);

fn parse(raw: Option<&str>) -> Result<QueueParam, AppError> {
    let raw = raw
        .ok_or_else(|| AppError::bad_request(ErrorCode::InvalidQueueType, "Missing queue parameter"))?;
    raw.parse::<QueueType>()
        .map(QueueParam)
        .map_err(|e| AppError::bad_request(ErrorCode::InvalidQueueType, e.detail()))
}

impl FromRequest for QueueParam {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(parse(req.match_info().get("queue")))
    }
}
