//! # Imaging Data
//!
//! `imaging_data`为机器学习影像课程提供数据加载与归一化的小工具：
//! 获取 MNIST、标签 one-hot 编码、按通道标准化整个数据集，
//! 以及加载图像与分割掩码配对并逐样本标准化。
//!
//! 所有数组均为[ndarray](https://docs.rs/ndarray)数组。

pub mod data;

pub use data::DataError;
