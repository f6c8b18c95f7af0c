use std::ops::{Deref, DerefMut};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Error as JsonError;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::trace_ctx;

/// JSON body extractor whose failures render as problem details (400)
/// instead of actix's plain-text JSON errors.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let mut payload = payload.take();

        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("")
            .to_string();

        Box::pin(async move {
            let trace_id = trace_ctx::trace_id();

            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    warn!(trace_id = %trace_id, error = %e, "Failed to read request body chunk");
                    AppError::bad_request(ErrorCode::BadRequest, "Failed to read request body")
                })?;
                body.extend_from_slice(&chunk);
            }

            // Body text may carry PINs, so only the shape of the failure is logged
            let parsed = serde_json::from_slice::<T>(&body).map_err(|e| {
                debug!(
                    trace_id = %trace_id,
                    category = ?e.classify(),
                    content_type = %content_type,
                    body_size = body.len(),
                    "JSON parsing failed"
                );
                AppError::bad_request(ErrorCode::BadRequest, classify_json_error(&e))
            })?;

            Ok(ValidatedJson(parsed))
        })
    }
}

fn classify_json_error(error: &JsonError) -> String {
    match error.classify() {
        serde_json::error::Category::Syntax => {
            format!("Invalid JSON at line {}", error.line())
        }
        serde_json::error::Category::Eof => "Invalid JSON: unexpected end of input".to_string(),
        serde_json::error::Category::Data => {
            "Invalid JSON: wrong types for one or more fields".to_string()
        }
        serde_json::error::Category::Io => "Invalid JSON: I/O error while reading body".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct PlayerBody {
        name: String,
        pin: String,
    }

    #[test]
    fn syntax_errors_report_the_line() {
        let err = serde_json::from_str::<PlayerBody>("{\n\"name\": }").unwrap_err();
        assert_eq!(classify_json_error(&err), "Invalid JSON at line 2");
    }

    #[test]
    fn truncated_body_is_eof() {
        let err = serde_json::from_str::<PlayerBody>(r#"{"name": "Ann""#).unwrap_err();
        assert!(classify_json_error(&err).contains("unexpected end of input"));
    }

    #[test]
    fn wrong_types_are_data_errors() {
        let err = serde_json::from_str::<PlayerBody>(r#"{"name": 1, "pin": "2"}"#).unwrap_err();
        assert!(classify_json_error(&err).contains("wrong types"));
    }

    #[actix_web::test]
    async fn extracts_a_valid_body() {
        let (req, mut payload) = TestRequest::post()
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"name": "Ann", "pin": "1234"}"#)
            .to_http_parts();

        let body = ValidatedJson::<PlayerBody>::from_request(&req, &mut payload)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(body.name, "Ann");
        assert_eq!(body.pin, "1234");
    }

    #[actix_web::test]
    async fn invalid_body_is_a_bad_request() {
        let (req, mut payload) = TestRequest::post()
            .set_payload("not json")
            .to_http_parts();

        let err = ValidatedJson::<PlayerBody>::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }
}
