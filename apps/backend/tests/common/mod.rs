#![allow(dead_code)]

// tests/common/mod.rs
pub mod proptest_prelude;

use std::sync::Arc;

use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use signup_backend::domain::creation::CreateGroupForm;
use signup_backend::routes;
use signup_backend::services::GroupService;
use signup_backend::state::AppState;
use signup_backend::{MemoryGroupStore, RequestTrace};

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// A complete, valid creation form for a session on `date` (local time).
pub fn group_form(date: &str) -> CreateGroupForm {
    CreateGroupForm {
        location: Some("Community Gym".into()),
        description: Some("Drop-in doubles".into()),
        date: Some(date.into()),
        start_time: Some("19:30".into()),
        end_time: Some("21:30".into()),
        retreat_deadline: Some(format!("{date}T12:00")),
        single_limit: Some("1".into()),
        double_limit: Some("4".into()),
        pin: Some("organizer".into()),
    }
}

/// A form for a session starting well in the future.
pub fn future_form() -> CreateGroupForm {
    group_form("2099-06-12")
}

pub fn memory_service(store: &MemoryGroupStore) -> GroupService {
    GroupService::new(Arc::new(store.clone()), 3, 10)
}

/// Service app wired like `main.rs`, minus the logging middleware.
pub async fn test_app(
    state: AppState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .wrap(RequestTrace)
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await
}
