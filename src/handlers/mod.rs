use actix_web::{HttpResponse, ResponseError, Result};
use serde::Serialize;
use serde_json::json;

use crate::error::AppResult;

pub mod admin;
pub mod health;
pub mod order;

pub use admin::admin_config;
pub use health::health_config;
pub use order::order_config;

/// `{"success": true, "data": ...}` on success, the mapped error body otherwise
pub(crate) fn respond<T: Serialize>(result: AppResult<T>) -> Result<HttpResponse> {
    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": data
        }))),
        Err(e) => Ok(e.error_response()),
    }
}
