//! 服务配置
//!
//! 从 TOML 文件加载，所有段落都有默认值。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::parsers::LayerOverflowPolicy;
use crate::sources::{self, CadModel, GasSource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub environment: EnvironmentConfig,
    pub logging: LoggingConfig,
    pub sources: Vec<GasSource>,
    pub cad_models: Vec<CadModel>,
}

/// HTTP 监听地址
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 占据栅格相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// 占据栅格文件路径，空字符串表示未配置
    pub occupancy_file: String,
    /// 加载前是否等待预处理完成信号
    pub wait_preprocessing: bool,
    /// 等待预处理时的轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    pub layer_overflow: LayerOverflowPolicy,
    /// 所有坐标所在的坐标系名称
    pub fixed_frame: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            occupancy_file: String::new(),
            wait_preprocessing: false,
            poll_interval_ms: 500,
            layer_overflow: LayerOverflowPolicy::Strict,
            fixed_frame: "map".to_string(),
        }
    }
}

impl EnvironmentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)，RUST_LOG 优先
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// 检查取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "environment.poll_interval_ms 必须大于 0".to_string(),
            ));
        }
        sources::validate_sources(&self.sources)?;
        sources::validate_cad_models(&self.cad_models)?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.environment.occupancy_file.is_empty());
        assert_eq!(config.environment.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.environment.layer_overflow, LayerOverflowPolicy::Strict);
        assert_eq!(config.environment.fixed_frame, "map");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[server]
port = 9090

[environment]
occupancy_file = "resources/demo_occupancy.txt"
wait_preprocessing = true
layer_overflow = "truncate"

[logging]
level = "debug"

[[sources]]
position = [1.0, 2.0, 0.5]
color = [0.0, 1.0, 0.0]

[[sources]]
position = [3.0, 1.0, 0.5]
scale = 0.3

[[cad_models]]
mesh_resource = "meshes/walls.dae"
color = [0.9, 0.9, 0.9]
"#;

        let config: AppConfig = toml_content.parse().unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.environment.wait_preprocessing);
        assert_eq!(config.environment.layer_overflow, LayerOverflowPolicy::Truncate);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].scale, 0.1);
        assert_eq!(config.sources[1].scale, 0.3);
        assert_eq!(config.cad_models[0].mesh_resource, "meshes/walls.dae");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = "[environment]\npoll_interval_ms = 0\n".parse::<AppConfig>();
        assert!(matches!(err, Err(ConfigError::Invalid(_))));

        let err = "[environment]\nlayer_overflow = \"sometimes\"\n".parse::<AppConfig>();
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_string = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml_string.contains("[server]"));
        assert!(toml_string.contains("[environment]"));
        assert!(toml_string.contains("layer_overflow = \"strict\""));
    }
}
