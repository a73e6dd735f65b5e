use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
        Request,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

const SERVER_ERROR: &str = "Server error";

/// Every failure a handler can surface. Each maps to one status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Internal failure text, carried on the response for the development-only middleware.
#[derive(Debug, Clone)]
struct ErrorDetail(String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, detail) = match self {
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                (SERVER_ERROR.to_string(), Some(format!("{e:#}")))
            }
            other => (other.to_string(), None),
        };

        let mut res = (
            status,
            Json(ErrorBody {
                success: false,
                message,
                error: None,
            }),
        )
            .into_response();
        if let Some(detail) = detail {
            res.extensions_mut().insert(ErrorDetail(detail));
        }
        res
    }
}

/// Re-renders 500 responses with their internal detail. Only mounted in development.
pub async fn expose_error_detail(req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    let Some(ErrorDetail(detail)) = res.extensions().get::<ErrorDetail>().cloned() else {
        return res;
    };
    (
        res.status(),
        Json(ErrorBody {
            success: false,
            message: SERVER_ERROR.to_string(),
            error: Some(detail),
        }),
    )
        .into_response()
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Validation(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn statuses_follow_the_taxonomy() {
        let cases = [
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (AppError::Unauthenticated("who".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Duplicate("twice".into()), StatusCode::CONFLICT),
            (
                AppError::Internal(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let body = body_json(AppError::NotFound("Car not found".into()).into_response()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Car not found");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let res = AppError::Internal(anyhow::anyhow!("connection refused")).into_response();
        let body = body_json(res).await;
        assert_eq!(body["message"], SERVER_ERROR);
        assert!(!body.to_string().contains("connection refused"));
    }
}
