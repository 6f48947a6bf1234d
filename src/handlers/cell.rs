use actix_web::{HttpResponse, Responder, get, web};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::handlers::current_grid;
use crate::utils::occupancy_grid::{CellState, OccupancyGrid};

#[derive(Deserialize)]
pub struct CellQuery {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

#[derive(Deserialize)]
pub struct PointQuery {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 单个单元格的查询结果
#[derive(Debug, Serialize, Deserialize)]
pub struct CellInfo {
    pub cell: [usize; 3],
    pub index: usize,
    pub state: CellState,
    /// 单元格中心的世界坐标
    pub center: [f64; 3],
}

impl CellInfo {
    fn new(grid: &OccupancyGrid, [x, y, z]: [usize; 3], state: CellState) -> Self {
        Self {
            cell: [x, y, z],
            index: grid.index_from_3d(x, y, z),
            state,
            center: grid.cell_center(x, y, z),
        }
    }
}

/// 按单元格坐标查询，越界返回 400
#[get("/cell")]
pub async fn get_cell(data: web::Data<AppState>, query: web::Query<CellQuery>) -> impl Responder {
    let snapshot = match current_grid(&data) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let grid = &snapshot.loaded.grid;
    let cell = [query.x, query.y, query.z];

    let Some(state) = grid.cell_state(query.x, query.y, query.z) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "单元格坐标越界",
            "cell": cell,
            "dimensions": grid.dimensions(),
        }));
    };

    HttpResponse::Ok().json(CellInfo::new(grid, cell, state))
}

/// 按世界坐标（米）查询所在单元格，不在栅格内返回 404
#[get("/cell/at")]
pub async fn get_cell_at(
    data: web::Data<AppState>,
    query: web::Query<PointQuery>,
) -> impl Responder {
    let snapshot = match current_grid(&data) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let grid = &snapshot.loaded.grid;
    let point = [query.x, query.y, query.z];

    let found = grid
        .cell_containing(point)
        .and_then(|[x, y, z]| grid.cell_state(x, y, z).map(|s| ([x, y, z], s)));
    match found {
        Some((cell, state)) => HttpResponse::Ok().json(CellInfo::new(grid, cell, state)),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "坐标不在栅格范围内",
            "point": point,
            "bounds": grid.bounds(),
        })),
    }
}

/// 单元格筛选条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellFilter {
    Free,
    Occupied,
    Outlet,
    /// 占据与出口
    #[default]
    NonFree,
}

#[derive(Deserialize)]
pub struct CellsQuery {
    #[serde(default)]
    pub state: CellFilter,
}

/// 列出满足条件的单元格及其中心坐标，按线性索引排序
#[get("/cells")]
pub async fn list_cells(
    data: web::Data<AppState>,
    query: web::Query<CellsQuery>,
) -> impl Responder {
    let snapshot = match current_grid(&data) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let grid = &snapshot.loaded.grid;

    let coords: Vec<[usize; 3]> = match query.state {
        CellFilter::Free => grid.cells_in_state(CellState::Free).collect(),
        CellFilter::Occupied => grid.cells_in_state(CellState::Occupied).collect(),
        CellFilter::Outlet => grid.cells_in_state(CellState::Outlet).collect(),
        CellFilter::NonFree => grid.non_free_cells().collect(),
    };
    let cells: Vec<CellInfo> = coords
        .into_iter()
        .filter_map(|c| grid.cell_state(c[0], c[1], c[2]).map(|s| CellInfo::new(grid, c, s)))
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "cell_size": grid.cell_size(),
        "count": cells.len(),
        "cells": cells,
    }))
}
