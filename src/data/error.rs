//! 数据加载错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 数据加载相关错误
#[derive(Debug, Error)]
pub enum DataError {
    /// 本地没有数据，且不允许下载
    #[error("本地缺少数据且未允许下载: {0}")]
    DataUnavailable(PathBuf),

    /// 文件未找到
    #[error("文件未找到: {0}")]
    FileNotFound(PathBuf),

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 图像解码失败
    #[error("无法读取图像 {path}: {source}")]
    ImageError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// 格式错误（如 magic number 不匹配）
    #[error("格式错误: {0}")]
    FormatError(String),

    /// 标签超出类别范围
    #[error("标签越界: 第 {sample} 个样本的标签为 {label}, 应在 [0, {num_classes}) 内")]
    IndexOutOfRange {
        sample: usize,
        label: i64,
        num_classes: usize,
    },

    /// 输入配置不合法（如图像与掩码数量不一致）
    #[error("配置错误: {0}")]
    ConfigurationError(String),

    /// 某通道方差为零，无法标准化
    #[error("第 {channel} 个通道的标准差为零，无法标准化")]
    DegenerateChannel { channel: usize },

    /// 某样本方差为零，无法标准化
    #[error("第 {sample} 个样本的标准差为零，无法标准化")]
    DegenerateSample { sample: usize },

    /// 形状不匹配
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 下载错误
    #[error("下载错误: {0}")]
    DownloadError(String),

    /// 校验和不匹配
    #[error("校验和不匹配: 期望 {expected}, 实际 {got}")]
    ChecksumMismatch { expected: String, got: String },
}
