use actix_web::{HttpResponse, Responder, post, web};

use crate::app_state::AppState;
use crate::handlers::load_error_response;

/// 外部预处理阶段完成后调用
#[post("/preprocessing/done")]
pub async fn preprocessing_done(data: web::Data<AppState>) -> impl Responder {
    data.readiness.signal();
    HttpResponse::Ok().json(serde_json::json!({
        "preprocessing_done": true,
        "loaded": data.store.is_loaded(),
    }))
}

/// 重新加载配置的占据栅格文件，成功后整体替换当前栅格
#[post("/reload")]
pub async fn reload_grid(data: web::Data<AppState>) -> impl Responder {
    let store = data.store.clone();
    // 解析是阻塞操作，放到阻塞线程池中执行
    let result = match web::block(move || store.reload()).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("[重新加载] 后台任务失败: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "重新加载任务失败",
                "details": e.to_string(),
            }));
        }
    };

    match result {
        Ok(snapshot) => HttpResponse::Ok().json(serde_json::json!({
            "generation": snapshot.generation,
            "dimensions": snapshot.loaded.grid.dimensions(),
            "diagnostics": snapshot
                .loaded
                .diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>(),
        })),
        Err(e) => {
            log::error!("[重新加载] {}", e);
            load_error_response(&e)
        }
    }
}
