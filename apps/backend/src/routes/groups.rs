//! Group sign-up HTTP routes.

use actix_web::http::header::LOCATION;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::creation::CreateGroupForm;
use crate::domain::projection::GroupView;
use crate::error::AppError;
use crate::extractors::{GroupId, QueueParam, ValidatedJson};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerForm {
    pub name: String,
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedGroup {
    pub id: i64,
}

/// GET /api/groups?limit=N
///
/// Newest sessions first, each resolved into confirmed and waitlisted
/// players. `limit` is capped at the configured page size.
async fn list_groups(
    app_state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let groups = app_state.groups.list_groups(query.limit).await?;
    let views = groups
        .iter()
        .map(|group| app_state.groups.resolve_group(group))
        .collect::<Result<Vec<GroupView>, _>>()?;
    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/groups/{group_id}
async fn get_group(
    group_id: GroupId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let group = app_state.groups.get_group(group_id.0).await?;
    let view = app_state.groups.resolve_group(&group)?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /api/groups
///
/// Field problems come back as 400 naming the offending field.
async fn create_group(
    app_state: web::Data<AppState>,
    form: ValidatedJson<CreateGroupForm>,
) -> Result<HttpResponse, AppError> {
    let id = app_state.groups.create_group(&form).await?;
    Ok(HttpResponse::Created()
        .insert_header((LOCATION, format!("/api/groups/{id}")))
        .json(CreatedGroup { id }))
}

/// POST /api/groups/{group_id}/players/{queue}
async fn add_player(
    group_id: GroupId,
    queue: QueueParam,
    app_state: web::Data<AppState>,
    body: ValidatedJson<PlayerForm>,
) -> Result<HttpResponse, AppError> {
    app_state
        .groups
        .add_player(group_id.0, queue.0, &body.name, &body.pin)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/groups/{group_id}/players/{queue}
///
/// Removes the first player with a matching name. The PIN must be the
/// player's own or the organizer's.
async fn remove_player(
    group_id: GroupId,
    queue: QueueParam,
    app_state: web::Data<AppState>,
    body: ValidatedJson<PlayerForm>,
) -> Result<HttpResponse, AppError> {
    app_state
        .groups
        .remove_player(group_id.0, queue.0, &body.name, &body.pin)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/groups")
            .route(web::get().to(list_groups))
            .route(web::post().to(create_group)),
    );
    cfg.service(web::resource("/api/groups/{group_id}").route(web::get().to(get_group)));
    cfg.service(
        web::resource("/api/groups/{group_id}/players/{queue}")
            .route(web::post().to(add_player))
            .route(web::delete().to(remove_player)),
    );
}
