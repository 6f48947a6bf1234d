use actix_web::web;

use crate::handlers;

/// 统一注册 HTTP 路由，方便集中管理
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::get_occupancy)
        .service(handlers::get_occupancy_metadata)
        .service(handlers::get_occupancy_raw)
        .service(handlers::get_cell)
        .service(handlers::get_cell_at)
        .service(handlers::list_cells)
        .service(handlers::get_sources)
        .service(handlers::get_cad_models)
        .service(handlers::preprocessing_done)
        .service(handlers::reload_grid);
}
