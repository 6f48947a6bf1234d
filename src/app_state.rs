use std::sync::Arc;

use crate::config::AppConfig;
use crate::grid_store::GridStore;
use crate::readiness::ReadinessGate;

/// 全局应用状态，负责在各个 handler 之间共享栅格存储、就绪信号与配置
pub struct AppState {
    pub store: Arc<GridStore>,
    pub readiness: Arc<ReadinessGate>,
    pub config: Arc<AppConfig>,
}
