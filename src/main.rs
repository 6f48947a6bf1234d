use std::env;
use std::path::Path;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};

use occupancy3d_backend::app_state::AppState;
use occupancy3d_backend::config::AppConfig;
use occupancy3d_backend::grid_store::GridStore;
use occupancy3d_backend::parsers::OccupancyGridLoader;
use occupancy3d_backend::readiness::ReadinessGate;
use occupancy3d_backend::routes;

const DEFAULT_CONFIG_PATH: &str = "occupancy3d.toml";

/// 从命令行参数获取配置文件路径
///
/// 支持 `--config <path>`、`-c <path>` 或第一个位置参数。
/// 返回 (路径, 是否显式指定)。
fn parse_config_path() -> (String, bool) {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return (args[i + 1].clone(), true);
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return (args[1].clone(), true);
    }

    (DEFAULT_CONFIG_PATH.to_string(), false)
}

fn load_config(path: &str, explicit: bool) -> std::io::Result<AppConfig> {
    if !explicit && !Path::new(path).exists() {
        return Ok(AppConfig::default());
    }
    AppConfig::from_file(path).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config_path, explicit) = parse_config_path();
    let config = load_config(&config_path, explicit)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if explicit || Path::new(&config_path).exists() {
        log::info!("使用配置文件: {}", config_path);
    } else {
        log::warn!("未找到配置文件 {}，使用默认配置", config_path);
    }

    let env_config = &config.environment;
    let store = Arc::new(GridStore::new(
        env_config.occupancy_file.clone(),
        OccupancyGridLoader::new(env_config.layer_overflow),
    ));
    let readiness = Arc::new(if env_config.wait_preprocessing {
        ReadinessGate::new()
    } else {
        ReadinessGate::ready()
    });

    for (i, source) in config.sources.iter().enumerate() {
        log::info!(
            "气体源 {}: 位置 [{:.2} {:.2} {:.2}] 尺寸 {:.2} 颜色 [{:.2} {:.2} {:.2}]",
            i,
            source.position[0],
            source.position[1],
            source.position[2],
            source.scale,
            source.color[0],
            source.color[1],
            source.color[2]
        );
    }
    for (i, model) in config.cad_models.iter().enumerate() {
        log::info!("CAD 模型 {}: {}", i, model.mesh_resource);
    }

    // 后台加载：按需等待预处理完成信号，然后在阻塞线程池中解析文件
    if env_config.occupancy_file.is_empty() {
        log::error!("未配置占据栅格文件，请设置 environment.occupancy_file；查询接口将返回 503");
    } else {
        let load_store = store.clone();
        let load_gate = readiness.clone();
        let interval = env_config.poll_interval();
        actix_web::rt::spawn(async move {
            load_gate.wait(interval).await;
            match web::block(move || load_store.reload()).await {
                Ok(Ok(snapshot)) => {
                    for diagnostic in &snapshot.loaded.diagnostics {
                        log::warn!("[后台加载] {}", diagnostic);
                    }
                }
                Ok(Err(e)) => log::error!("[后台加载] 加载占据栅格失败: {}", e),
                Err(e) => log::error!("[后台加载] 后台任务失败: {}", e),
            }
        });
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let app_state = web::Data::new(AppState {
        store,
        readiness,
        config: Arc::new(config),
    });

    log::info!("服务器启动在 http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
