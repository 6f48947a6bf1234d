use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;

/// 配置中的气体源
#[get("/sources")]
pub async fn get_sources(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "fixed_frame": data.config.environment.fixed_frame,
        "sources": data.config.sources,
    }))
}

/// 配置中的 CAD 模型
#[get("/cad-models")]
pub async fn get_cad_models(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "fixed_frame": data.config.environment.fixed_frame,
        "cad_models": data.config.cad_models,
    }))
}
