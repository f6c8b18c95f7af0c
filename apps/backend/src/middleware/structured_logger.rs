//! One `request_completed` event per request.
//!
//! Requests are labelled by their matched route pattern
//! (`/api/groups/{group_id}/players/{queue}`) so per-group URLs aggregate.
//! The concrete group id and queue are logged as their own fields.

use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error as ActixError, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::Level;

const UNMATCHED_ROUTE: &str = "unmatched";

fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

#[derive(Debug, PartialEq, Eq)]
struct RouteLabel {
    route: String,
    group_id: Option<String>,
    queue: Option<String>,
}

impl RouteLabel {
    fn of(req: &HttpRequest) -> Self {
        let info = req.match_info();
        Self {
            route: req
                .match_pattern()
                .unwrap_or_else(|| UNMATCHED_ROUTE.to_string()),
            group_id: info.get("group_id").map(str::to_owned),
            queue: info.get("queue").map(str::to_owned),
        }
    }

    fn unmatched() -> Self {
        Self {
            route: UNMATCHED_ROUTE.to_string(),
            group_id: None,
            queue: None,
        }
    }
}

macro_rules! request_completed {
    ($level:ident, $method:ident, $label:ident, $code:ident, $duration_us:ident, $trace_id:ident) => {
        tracing::event!(
            Level::$level,
            http.method = %$method,
            http.route = %$label.route,
            group_id = $label.group_id.as_deref(),
            queue = $label.queue.as_deref(),
            http.status_code = $code,
            duration_us = $duration_us,
            trace_id = %$trace_id,
            "request_completed"
        )
    };
}

fn emit(method: &str, label: &RouteLabel, status: StatusCode, duration_us: u64, trace_id: &str) {
    let code = status.as_u16();
    let level = level_for(status);
    if level == Level::ERROR {
        request_completed!(ERROR, method, label, code, duration_us, trace_id);
    } else if level == Level::WARN {
        request_completed!(WARN, method, label, code, duration_us, trace_id);
    } else {
        request_completed!(INFO, method, label, code, duration_us, trace_id);
    }
}

pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let trace_id = req
            .extensions()
            .get::<String>()
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            // The route is only known once the router has run
            let (label, status) = match &result {
                Ok(res) => (RouteLabel::of(res.request()), res.status()),
                Err(err) => (RouteLabel::unmatched(), err.as_response_error().status_code()),
            };
            let duration_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
            emit(&method, &label, status, duration_us, &trace_id);

            result
        })
    }
}
