use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::error::AppError;

/// JSON body extractor that also runs the payload's `validator` rules.
///
/// Parse and validation failures both become `400 Bad Request`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "rejected JSON body");
                AppError::BadRequest(rejection.body_text())
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameter extractor reporting unparsable segments with the JSON error body.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "rejected path parameters");
                AppError::BadRequest(rejection.body_text())
            })?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::header::CONTENT_TYPE};

    use super::*;
    use crate::dto::player::CreatePlayerRequest;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/api/players")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_bodies_are_extracted() {
        let ValidatedJson(request) =
            ValidatedJson::<CreatePlayerRequest>::from_request(json_request(r#"{"name":"Ada"}"#), &())
                .await
                .unwrap();
        assert_eq!(request.name, "Ada");
    }

    #[tokio::test]
    async fn malformed_and_invalid_bodies_are_bad_requests() {
        let err = ValidatedJson::<CreatePlayerRequest>::from_request(json_request(r#"{"name":7}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let long = format!(r#"{{"name":"{}"}}"#, "x".repeat(101));
        let err = ValidatedJson::<CreatePlayerRequest>::from_request(json_request(&long), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(message) if message.starts_with("validation failed")));
    }
}
