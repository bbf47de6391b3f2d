//! 数据加载模块
//!
//! 提供数据集获取与预处理功能。各函数相互独立、无共享状态。
//!
//! # 主要组件
//!
//! - [`fetch_mnist`]: 从本地缓存（或下载）获取 MNIST 原始像素与标签
//! - [`load_paired_images`] / [`load_tumor_data`]: 图像与分割掩码配对加载
//! - [`transforms`]: one-hot 编码、按通道/按样本标准化、掩码二值化
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use imaging_data::data::{fetch_mnist, transforms};
//! use ndarray::Axis;
//!
//! let (x, y) = fetch_mnist("./data", true, true)?;
//! let y = transforms::one_hot(&y, 10)?;
//! let x = transforms::normalize_whole_dataset(
//!     &x.insert_axis(Axis(3)),
//!     transforms::ZeroStdPolicy::default(),
//! )?;
//! ```

pub mod datasets;
pub mod download;
pub mod error;
pub mod transforms;

#[cfg(test)]
mod tests;

// Re-exports
pub use datasets::{
    MNIST_IMAGE_SIZE, MNIST_NUM_CLASSES, PairedImageSet, default_data_dir, fetch_mnist,
    load_paired_images, load_tumor_data,
};
pub use error::DataError;
pub use transforms::{ChannelStats, ZeroStdPolicy};
