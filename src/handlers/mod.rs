pub mod cell;
pub mod health;
pub mod lifecycle;
pub mod occupancy;
pub mod scene;

pub use cell::{get_cell, get_cell_at, list_cells};
pub use health::hello;
pub use lifecycle::{preprocessing_done, reload_grid};
pub use occupancy::{get_occupancy, get_occupancy_metadata, get_occupancy_raw};
pub use scene::{get_cad_models, get_sources};

use std::sync::Arc;

use actix_web::HttpResponse;

use crate::app_state::AppState;
use crate::error::LoadError;
use crate::grid_store::GridSnapshot;

/// 取当前栅格快照，未加载时返回 503
pub(crate) fn current_grid(data: &AppState) -> Result<Arc<GridSnapshot>, HttpResponse> {
    data.store.get().ok_or_else(|| {
        HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": "占据栅格尚未加载",
            "waiting_for_preprocessing": !data.readiness.is_ready(),
            "source": data.store.source().display().to_string(),
        }))
    })
}

/// 把加载错误转换为 HTTP 响应
pub(crate) fn load_error_response(err: &LoadError) -> HttpResponse {
    let body = serde_json::json!({
        "error": "加载占据栅格失败",
        "kind": err.kind(),
        "details": err.to_string(),
    });
    match err {
        LoadError::MissingSource => HttpResponse::Conflict().json(body),
        LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            HttpResponse::NotFound().json(body)
        }
        LoadError::Io { .. } => HttpResponse::InternalServerError().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}
