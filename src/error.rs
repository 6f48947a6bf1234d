//! 错误类型定义

use std::path::PathBuf;

/// 加载结果类型别名
pub type Result<T> = std::result::Result<T, LoadError>;

/// 占据栅格加载错误
///
/// 行号均从 1 开始计数，与文本编辑器中看到的一致。
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// 没有配置占据栅格文件路径（配置错误，而不是解析错误）
    #[error("未配置占据栅格文件路径")]
    MissingSource,

    /// 文件无法读取
    #[error("无法读取文件 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 文件头缺失或格式错误
    #[error("第 {line} 行文件头解析失败: {message}")]
    HeaderParse { line: usize, message: String },

    /// 数据体中出现非整数的值
    #[error("第 {line} 行无法解析单元格值 '{token}'")]
    BodyParse { line: usize, token: String },

    /// 单元格值不属于 0/1/2
    #[error("第 {line} 行出现未知的单元格状态 {value}")]
    InvalidCellValue { line: usize, value: i64 },

    /// 某一行的值过多，或某一层的行数超过 cells_x
    #[error("第 {line} 行超出栅格范围: {message}")]
    RowOverflow { line: usize, message: String },

    /// 数据体中的层数超过文件头声明的 cells_z
    #[error("第 {line} 行属于第 {layer} 层，但文件头只声明了 {declared} 层")]
    LayerOverflow {
        line: usize,
        layer: usize,
        declared: usize,
    },
}

impl LoadError {
    pub(crate) fn header(line: usize, message: impl Into<String>) -> Self {
        LoadError::HeaderParse {
            line,
            message: message.into(),
        }
    }

    /// 错误类别的稳定名称，用于 HTTP 响应
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::MissingSource => "missing_source",
            LoadError::Io { .. } => "io",
            LoadError::HeaderParse { .. } => "header_parse",
            LoadError::BodyParse { .. } => "body_parse",
            LoadError::InvalidCellValue { .. } => "invalid_cell_value",
            LoadError::RowOverflow { .. } => "row_overflow",
            LoadError::LayerOverflow { .. } => "layer_overflow",
        }
    }
}

/// 配置文件错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("配置项无效: {0}")]
    Invalid(String),
}
