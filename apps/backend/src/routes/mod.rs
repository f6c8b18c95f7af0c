use actix_web::web;

use crate::error::AppError;
use crate::errors::ErrorCode;

pub mod groups;
pub mod health;

/// Register every route. Used by `main.rs` and by tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::bad_request(ErrorCode::BadRequest, format!("Invalid query string: {err}"))
            .into()
    }));

    cfg.configure(health::configure_routes);
    cfg.configure(groups::configure_routes);
}
