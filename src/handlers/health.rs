use actix_web::{HttpResponse, Result, web};
use serde_json::json;

/// 存活检查，不需要认证
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "status": "ok" }
    })))
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
