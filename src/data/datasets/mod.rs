//! 内置数据集
//!
//! - MNIST：手写数字分类（原始像素与标签）
//! - 肿瘤分割：图像与分割掩码配对

mod mnist;
mod segmentation;

pub use mnist::{MNIST_IMAGE_SIZE, MNIST_NUM_CLASSES, default_data_dir, fetch_mnist};
pub use segmentation::{PairedImageSet, load_paired_images, load_tumor_data};
