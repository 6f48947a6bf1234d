//! 三维占据栅格加载与查询服务
//!
//! 解析仿真环境的体素化占据描述文件，提供线性索引、单元格与坐标点查询，
//! 并通过 HTTP 接口对外提供批量与单点查询。

pub mod app_state;
pub mod config;
pub mod error;
pub mod grid_store;
pub mod handlers;
pub mod parsers;
pub mod readiness;
pub mod routes;
pub mod sources;
pub mod utils;

pub use error::{ConfigError, LoadError, Result};
pub use parsers::{LayerOverflowPolicy, LoadedGrid, OccupancyGridLoader, load};
pub use utils::{CellState, GridBounds, OccupancyGrid};
