//! JSON request bodies that fail to parse are answered like any other [`AppError`].

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// Drop-in for [`axum::Json`]: same parsing, but a rejected body becomes a JSON 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Json(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{self, header::CONTENT_TYPE, StatusCode},
    };
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct NewTitle {
        title: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn extract(req: Request) -> Result<Json<NewTitle>, AppError> {
        Json::<NewTitle>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let Json(body) = extract(request(Some("application/json"), r#"{"title":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(body.title, "hi");
    }

    #[tokio::test]
    async fn malformed_bodies_become_bad_requests() {
        let cases = [
            (Some("application/json"), "{not json"),
            (Some("application/json"), r#"{"title":42}"#),
            (Some("text/plain"), r#"{"title":"hi"}"#),
            (None, r#"{"title":"hi"}"#),
        ];
        for (content_type, body) in cases {
            let err = extract(request(content_type, body)).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{content_type:?} {body}");
            assert!(!err.to_string().is_empty());
        }
    }
}
