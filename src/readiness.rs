use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 预处理完成信号
///
/// 由外部预处理阶段通过 HTTP 通知。等待逻辑属于调用方，加载器本身不感知。
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已就绪的信号，用于不需要等待预处理的场景
    pub fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
        }
    }

    pub fn signal(&self) {
        if !self.ready.swap(true, Ordering::SeqCst) {
            log::info!("[就绪] 收到预处理完成信号");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// 按固定间隔轮询直到就绪，返回轮询次数
    pub async fn wait(&self, interval: Duration) -> usize {
        let mut polls = 0;
        while !self.is_ready() {
            log::info!("[就绪] 等待预处理完成...");
            actix_web::rt::time::sleep(interval).await;
            polls += 1;
        }
        polls
    }
}
