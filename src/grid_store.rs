use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::parsers::{LoadedGrid, OccupancyGridLoader};

/// 已加载栅格的快照
pub struct GridSnapshot {
    pub loaded: LoadedGrid,
    /// 加载完成时间
    pub loaded_at: Instant,
    /// 第几次成功加载，从 1 开始
    pub generation: u64,
}

/// 占据栅格存储
///
/// 读者拿到的是 `Arc` 快照，加载完成后不会再被修改。
/// 重新加载时先在锁外完整解析，再整体替换指针，不存在部分更新的状态。
pub struct GridStore {
    current: RwLock<Option<Arc<GridSnapshot>>>,
    /// 同一时间只允许一个加载任务
    writer: Mutex<()>,
    loader: OccupancyGridLoader,
    source: PathBuf,
}

impl GridStore {
    pub fn new(source: impl Into<PathBuf>, loader: OccupancyGridLoader) -> Self {
        Self {
            current: RwLock::new(None),
            writer: Mutex::new(()),
            loader,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// 当前快照，未加载时返回 None
    pub fn get(&self) -> Option<Arc<GridSnapshot>> {
        self.current.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// 从配置的文件（重新）加载栅格
    ///
    /// 阻塞调用。失败时保留原有快照。
    pub fn reload(&self) -> Result<Arc<GridSnapshot>> {
        let _guard = self.writer.lock();
        let start = Instant::now();

        let loaded = self.loader.load(&self.source)?;
        let snapshot = self.install(loaded);

        log::info!(
            "[栅格存储] 第 {} 次加载完成，耗时 {}ms",
            snapshot.generation,
            start.elapsed().as_millis()
        );
        Ok(snapshot)
    }

    /// 用已经解析好的栅格替换当前快照
    pub fn replace(&self, loaded: LoadedGrid) -> Arc<GridSnapshot> {
        let _guard = self.writer.lock();
        self.install(loaded)
    }

    fn install(&self, loaded: LoadedGrid) -> Arc<GridSnapshot> {
        let mut current = self.current.write();
        let generation = current.as_ref().map_or(0, |s| s.generation) + 1;
        let snapshot = Arc::new(GridSnapshot {
            loaded,
            loaded_at: Instant::now(),
            generation,
        });
        *current = Some(snapshot.clone());
        snapshot
    }
}
