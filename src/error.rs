use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("{0}")]
    TaskUnavailable(String),

    #[error("{0}")]
    ThresholdNotMet(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

/// Connection-level failures are reported as 503 so callers can retry;
/// everything else stays a 500.
impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(e) => AppError::ServiceUnavailable(e.to_string()),
            DbErr::ConnectionAcquire(e) => AppError::ServiceUnavailable(e.to_string()),
            other => AppError::DatabaseError(other),
        }
    }
}

impl AppError {
    pub fn status_code_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::InsufficientBalance => (StatusCode::BAD_REQUEST, "INSUFFICIENT_BALANCE"),
            AppError::TaskUnavailable(_) => (StatusCode::BAD_REQUEST, "TASK_UNAVAILABLE"),
            AppError::ThresholdNotMet(_) => (StatusCode::BAD_REQUEST, "THRESHOLD_NOT_MET"),
            AppError::AuthError(_) | AppError::JwtError(_) => {
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR")
            }
            AppError::Forbidden | AppError::PermissionDenied => {
                (StatusCode::FORBIDDEN, "FORBIDDEN")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::ExternalApiError(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            AppError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::InternalError(_) | AppError::SerdeJsonError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    /// Coarse category a client can branch on without parsing messages.
    pub fn category(&self) -> &'static str {
        match self.status_code_and_code().0 {
            StatusCode::BAD_REQUEST => "bad_input",
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::SERVICE_UNAVAILABLE => "unavailable",
            _ => "internal",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::TaskUnavailable(msg)
            | AppError::ThresholdNotMet(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::ExternalApiError(msg) => msg.clone(),
            AppError::InsufficientBalance => "Insufficient balance".to_string(),
            AppError::JwtError(_) => "Invalid token".to_string(),
            AppError::Forbidden => "Forbidden".to_string(),
            AppError::PermissionDenied => "Permission denied".to_string(),
            AppError::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::DatabaseError(_) => "Database error".to_string(),
            AppError::InternalError(_) | AppError::SerdeJsonError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code) = self.status_code_and_code();
        if status_code.is_server_error() {
            log::error!("{error_code}: {self}");
        } else {
            log::warn!("{error_code}: {self}");
        }

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "category": self.category(),
                "message": self.public_message()
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_bad_input_variants_map_to_400() {
        for err in [
            AppError::ValidationError("x".into()),
            AppError::InsufficientBalance,
            AppError::TaskUnavailable("Task not available".into()),
            AppError::ThresholdNotMet("Minimum withdrawal amount is 100 Ksh".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.category(), "bad_input");
        }
    }

    #[test]
    fn test_auth_and_access_statuses() {
        assert_eq!(
            AppError::AuthError("Missing access token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::PermissionDenied.category(), "forbidden");
        assert_eq!(
            AppError::NotFound("Invalid referral code".into()).category(),
            "not_found"
        );
    }

    #[test]
    fn test_connection_failures_become_unavailable() {
        let err: AppError = DbErr::Conn(RuntimeErr::Internal("refused".into())).into();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.category(), "unavailable");

        let err: AppError = DbErr::RecordNotFound("wallet".into()).into();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_threshold_message_is_passed_through() {
        let err = AppError::ThresholdNotMet("Withdrawal cooldown: 3 days remaining".into());
        assert_eq!(err.public_message(), "Withdrawal cooldown: 3 days remaining");
        assert_eq!(err.status_code_and_code().1, "THRESHOLD_NOT_MET");
    }
}
