use std::io::Write;

use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::handlers::current_grid;
use crate::utils::occupancy_grid::{CellState, GridBounds, OccupancyGrid};

/// 批量查询响应：原点、各轴单元格数、分辨率与完整占据序列
#[derive(Debug, Serialize, Deserialize)]
pub struct OccupancyResponse {
    pub frame: String,
    pub origin: [f64; 3],
    pub num_cells_x: usize,
    pub num_cells_y: usize,
    pub num_cells_z: usize,
    pub resolution: f64,
    pub occupancy: Vec<u8>,
}

impl OccupancyResponse {
    pub fn from_grid(grid: &OccupancyGrid, frame: &str) -> Self {
        let [nx, ny, nz] = grid.dimensions();
        Self {
            frame: frame.to_string(),
            origin: grid.bounds().min,
            num_cells_x: nx,
            num_cells_y: ny,
            num_cells_z: nz,
            resolution: grid.cell_size(),
            occupancy: grid.occupancy(),
        }
    }
}

#[get("/occupancy")]
pub async fn get_occupancy(data: web::Data<AppState>) -> impl Responder {
    let snapshot = match current_grid(&data) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    HttpResponse::Ok().json(OccupancyResponse::from_grid(
        &snapshot.loaded.grid,
        &data.config.environment.fixed_frame,
    ))
}

#[derive(Serialize)]
struct StateCounts {
    free: usize,
    occupied: usize,
    outlet: usize,
}

#[derive(Serialize)]
struct MetadataResponse {
    source: String,
    generation: u64,
    bounds: GridBounds,
    dimensions: [usize; 3],
    cell_size: f64,
    cell_count: usize,
    counts: StateCounts,
    ignored_lines: usize,
    diagnostics: Vec<String>,
}

/// 栅格元数据与加载诊断，不包含占据序列
#[get("/occupancy/metadata")]
pub async fn get_occupancy_metadata(data: web::Data<AppState>) -> impl Responder {
    let snapshot = match current_grid(&data) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let loaded = &snapshot.loaded;
    let grid = &loaded.grid;

    HttpResponse::Ok().json(MetadataResponse {
        source: loaded.source.display().to_string(),
        generation: snapshot.generation,
        bounds: grid.bounds(),
        dimensions: grid.dimensions(),
        cell_size: grid.cell_size(),
        cell_count: grid.cell_count(),
        counts: StateCounts {
            free: grid.count(CellState::Free),
            occupied: grid.count(CellState::Occupied),
            outlet: grid.count(CellState::Outlet),
        },
        ignored_lines: loaded.ignored_lines,
        diagnostics: loaded.diagnostics.iter().map(|d| d.to_string()).collect(),
    })
}

#[derive(Deserialize)]
pub struct RawQuery {
    /// 目前只支持 "gzip"
    pub compress: Option<String>,
}

/// 二进制格式的占据栅格
///
/// 布局（小端）：origin f64 x3，cells u32 x3，resolution f64，随后每个单元格一个 u8。
pub fn encode_raw(grid: &OccupancyGrid) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(4 * 8 + 3 * 4 + grid.cell_count());
    for v in grid.bounds().min {
        bytes.write_f64::<LittleEndian>(v)?;
    }
    for n in grid.dimensions() {
        let n = u32::try_from(n).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "单元格数量超出 u32 范围")
        })?;
        bytes.write_u32::<LittleEndian>(n)?;
    }
    bytes.write_f64::<LittleEndian>(grid.cell_size())?;
    bytes.extend(grid.cells().iter().map(|c| c.as_u8()));
    Ok(bytes)
}

#[get("/occupancy/raw")]
pub async fn get_occupancy_raw(
    data: web::Data<AppState>,
    query: web::Query<RawQuery>,
) -> impl Responder {
    let snapshot = match current_grid(&data) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let grid = &snapshot.loaded.grid;

    let gzip = match query.compress.as_deref() {
        None => false,
        Some(c) if c.eq_ignore_ascii_case("gzip") => true,
        Some(other) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "不支持的压缩方式",
                "compress": other,
                "supported": ["gzip"],
            }));
        }
    };

    let encoded = encode_raw(grid).and_then(|bytes| {
        if !gzip {
            return Ok(bytes);
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes)?;
        encoder.finish()
    });

    let bytes = match encoded {
        Ok(b) => b,
        Err(e) => {
            log::error!("[二进制导出] 编码失败: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "写入占据栅格数据失败",
                "details": e.to_string(),
            }));
        }
    };

    let [nx, ny, nz] = grid.dimensions();
    let mut response = HttpResponse::Ok();
    response
        .content_type(ContentType::octet_stream())
        .append_header(("X-Cells-X", nx.to_string()))
        .append_header(("X-Cells-Y", ny.to_string()))
        .append_header(("X-Cells-Z", nz.to_string()))
        .append_header(("X-Generation", snapshot.generation.to_string()));
    if gzip {
        response.append_header(("Content-Encoding", "gzip"));
    }
    response.body(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use std::io::Cursor;

    #[test]
    fn test_encode_raw_layout() {
        let bounds = GridBounds {
            min: [1.0, -2.0, 0.5],
            max: [2.0, -1.0, 1.5],
        };
        let grid = OccupancyGrid::new(
            bounds,
            [2, 1, 1],
            0.5,
            vec![CellState::Outlet, CellState::Occupied],
        )
        .unwrap();

        let bytes = encode_raw(&grid).unwrap();
        assert_eq!(bytes.len(), 3 * 8 + 3 * 4 + 8 + 2);

        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_f64::<LittleEndian>().unwrap(), 1.0);
        assert_eq!(cursor.read_f64::<LittleEndian>().unwrap(), -2.0);
        assert_eq!(cursor.read_f64::<LittleEndian>().unwrap(), 0.5);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 2);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 1);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 1);
        assert_eq!(cursor.read_f64::<LittleEndian>().unwrap(), 0.5);
        assert_eq!(&bytes[bytes.len() - 2..], &[2, 1]);
    }
}
