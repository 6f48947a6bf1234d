use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    let snapshot = data.store.get();
    HttpResponse::Ok().json(serde_json::json!({
        "message": "三维占据栅格数据服务",
        "source": data.store.source().display().to_string(),
        "loaded": snapshot.is_some(),
        "generation": snapshot.as_ref().map(|s| s.generation),
        "preprocessing_done": data.readiness.is_ready(),
        "fixed_frame": data.config.environment.fixed_frame,
        "endpoints": [
            "GET /occupancy",
            "GET /occupancy/metadata",
            "GET /occupancy/raw?compress=gzip",
            "GET /cell?x=&y=&z=",
            "GET /cell/at?x=&y=&z=",
            "GET /cells?state=occupied|outlet|free|non_free",
            "GET /sources",
            "GET /cad-models",
            "POST /preprocessing/done",
            "POST /reload",
        ],
    }))
}
