//! 气体源与 CAD 模型
//!
//! 两者都来自配置文件中的扁平列表，与占据栅格只共享坐标系。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 气体源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSource {
    /// 位置 (x, y, z)，单位米
    pub position: [f64; 3],
    /// 显示尺寸
    pub scale: f64,
    /// 颜色 (r, g, b)，取值 0.0 - 1.0
    pub color: [f32; 3],
}

impl Default for GasSource {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            scale: 0.1,
            color: [0.0; 3],
        }
    }
}

/// 环境的 CAD 网格模型（只记录资源路径，不读取网格）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadModel {
    pub mesh_resource: String,
    #[serde(default)]
    pub color: [f32; 3],
}

fn check_color(color: &[f32; 3]) -> bool {
    color.iter().all(|c| (0.0..=1.0).contains(c))
}

/// 检查配置中的气体源
pub fn validate_sources(sources: &[GasSource]) -> Result<(), ConfigError> {
    for (i, source) in sources.iter().enumerate() {
        if source.position.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("sources[{}].position 不是有限数", i)));
        }
        if !(source.scale.is_finite() && source.scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sources[{}].scale 必须为正，当前为 {}",
                i, source.scale
            )));
        }
        if !check_color(&source.color) {
            return Err(ConfigError::Invalid(format!(
                "sources[{}].color 超出 0.0 - 1.0: {:?}",
                i, source.color
            )));
        }
    }
    Ok(())
}

pub fn validate_cad_models(models: &[CadModel]) -> Result<(), ConfigError> {
    for (i, model) in models.iter().enumerate() {
        if model.mesh_resource.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("cad_models[{}].mesh_resource 为空", i)));
        }
        if !check_color(&model.color) {
            return Err(ConfigError::Invalid(format!(
                "cad_models[{}].color 超出 0.0 - 1.0: {:?}",
                i, model.color
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_source_defaults() {
        let source = GasSource::default();
        assert_eq!(source.position, [0.0; 3]);
        assert_eq!(source.scale, 0.1);
        assert!(validate_sources(&[source]).is_ok());
    }

    #[test]
    fn test_rejects_bad_scale_and_color() {
        let source = GasSource {
            scale: 0.0,
            ..GasSource::default()
        };
        assert!(validate_sources(&[source]).is_err());

        let source = GasSource {
            color: [1.5, 0.0, 0.0],
            ..GasSource::default()
        };
        assert!(validate_sources(&[source]).is_err());
    }

    #[test]
    fn test_rejects_empty_mesh() {
        let model = CadModel {
            mesh_resource: " ".to_string(),
            color: [0.5; 3],
        };
        assert!(validate_cad_models(&[model]).is_err());
    }
}
