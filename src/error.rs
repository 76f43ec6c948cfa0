use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::domain::attribution::AttributionError;
use crate::domain::transition::TransitionError;
use crate::entities::OrderStatus;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("A reason is required to mark an order {0}")]
    MissingReason(OrderStatus),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Attribution for order {0} cannot be resolved from its history")]
    AttributionUnresolvable(i64),

    #[error("Seller KYC incomplete: {0}")]
    KycIncomplete(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            // 终态订单已被他人处理，按并发冲突返回
            TransitionError::Absorbing(status) => {
                AppError::Conflict(format!("Order is already {status}"))
            }
            TransitionError::Illegal { from, to } => AppError::InvalidTransition { from, to },
            TransitionError::MissingReason(status) => AppError::MissingReason(status),
        }
    }
}

impl From<AttributionError> for AppError {
    fn from(err: AttributionError) -> Self {
        match err {
            AttributionError::Unresolvable { order_id } => {
                AppError::AttributionUnresolvable(order_id)
            }
            AttributionError::EmptyReason => {
                AppError::ValidationError("Reason must not be empty".to_string())
            }
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::InvalidTransition { .. } => {
                log::warn!("{self}");
                (StatusCode::BAD_REQUEST, "INVALID_TRANSITION", self.to_string())
            }
            AppError::MissingReason(_) => {
                log::warn!("{self}");
                (StatusCode::BAD_REQUEST, "MISSING_REASON", self.to_string())
            }
            AppError::KycIncomplete(msg) => {
                log::warn!("KYC check failed: {msg}");
                (StatusCode::BAD_REQUEST, "KYC_INCOMPLETE", msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                (
                    StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    "Invalid access token".to_string(),
                )
            }
            AppError::Forbidden(msg) => {
                log::warn!("Forbidden: {msg}");
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::OrderNotFound(_) => {
                (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND", self.to_string())
            }
            AppError::Conflict(msg) => {
                log::warn!("Conflict: {msg}");
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::AttributionUnresolvable(order_id) => {
                log::warn!("Attribution unresolvable for order {order_id}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "ATTRIBUTION_UNRESOLVABLE",
                    self.to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidTransition { .. }
            | AppError::MissingReason(_)
            | AppError::KycIncomplete(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AttributionUnresolvable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = self.parts();

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "message": message,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_errors_map_to_http_codes() {
        let absorbing: AppError = TransitionError::Absorbing(OrderStatus::Rejected).into();
        assert_eq!(absorbing.status_code(), StatusCode::CONFLICT);

        let backward: AppError = TransitionError::Illegal {
            from: OrderStatus::Packed,
            to: OrderStatus::Confirmed,
        }
        .into();
        assert_eq!(backward.status_code(), StatusCode::BAD_REQUEST);

        let missing: AppError = TransitionError::MissingReason(OrderStatus::Cancelled).into();
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_body_shape() {
        let resp = AppError::OrderNotFound(42).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::AttributionUnresolvable(7).error_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
