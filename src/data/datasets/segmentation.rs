//! 图像-分割掩码配对数据
//!
//! 读取若干张灰度图像及同名的分割真值掩码（PNG 等常见栅格格式），
//! 按原始位深（8/16 位）沿新的样本维堆叠为 [N, H, W]，然后：
//! - 图像：每个样本各自标准化（不跨样本）
//! - 掩码：二值化为 {0, 1}
//!
//! 课程里固定的文件清单由 [`PairedImageSet::tumor_split`] 给出；
//! 其他清单可通过 [`PairedImageSet::new`] 显式构造。

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::data::error::DataError;
use crate::data::transforms::{ZeroStdPolicy, binarize_masks, normalize_per_sample};

/// 训练集使用的样本编号
const TUMOR_TRAIN_INDICES: [usize; 2] = [0, 1];
/// 测试集使用的样本编号
const TUMOR_TEST_INDICES: [usize; 1] = [2];

/// 一组图像路径及其一一对应的掩码路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedImageSet {
    pub images: Vec<PathBuf>,
    pub masks: Vec<PathBuf>,
}

impl PairedImageSet {
    pub fn new(images: Vec<PathBuf>, masks: Vec<PathBuf>) -> Self {
        Self { images, masks }
    }

    /// 课程提供的肿瘤分割数据：
    /// - 训练：`image_0.png`, `image_1.png` 与 `segmentation_0.png`, `segmentation_1.png`
    /// - 测试：`image_2.png` 与 `segmentation_2.png`
    pub fn tumor_split(data_dir: impl AsRef<Path>, train: bool) -> Self {
        let data_dir = data_dir.as_ref();
        let indices: &[usize] = if train {
            &TUMOR_TRAIN_INDICES
        } else {
            &TUMOR_TEST_INDICES
        };
        Self {
            images: indices
                .iter()
                .map(|i| data_dir.join(format!("image_{i}.png")))
                .collect(),
            masks: indices
                .iter()
                .map(|i| data_dir.join(format!("segmentation_{i}.png")))
                .collect(),
        }
    }

    /// 配对数量
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn validate(&self) -> Result<(), DataError> {
        if self.images.len() != self.masks.len() {
            return Err(DataError::ConfigurationError(format!(
                "图像数量 ({}) 与掩码数量 ({}) 不一致",
                self.images.len(),
                self.masks.len()
            )));
        }
        if self.images.is_empty() {
            return Err(DataError::ConfigurationError(
                "图像/掩码列表为空".to_string(),
            ));
        }
        Ok(())
    }
}

/// 加载课程的肿瘤分割数据（零方差样本直接报错）
///
/// # 参数
/// - `data_dir`: 存放 `image_<i>.png` / `segmentation_<i>.png` 的目录
/// - `train`: true=训练集(2 对), false=测试集(1 对)
pub fn load_tumor_data(
    data_dir: impl AsRef<Path>,
    train: bool,
) -> Result<(Array3<f32>, Array3<u8>), DataError> {
    load_paired_images(
        &PairedImageSet::tumor_split(data_dir, train),
        ZeroStdPolicy::Reject,
    )
}

/// 加载配对的图像与掩码
///
/// # 返回
/// `(images, masks)`，形状均为 [N, H, W]；
/// 图像按样本标准化为 f32，掩码只含 0 和 1
///
/// # 错误
/// - 列表长度不一致或为空: `ConfigurationError`（不会读取任何文件）
/// - 文件缺失: `FileNotFound`；无法解码: `ImageError`
/// - 图像与掩码尺寸不一致、或各样本尺寸不一致: `ShapeMismatch`
pub fn load_paired_images(
    set: &PairedImageSet,
    policy: ZeroStdPolicy,
) -> Result<(Array3<f32>, Array3<u8>), DataError> {
    set.validate()?;

    let mut images = Vec::with_capacity(set.len());
    let mut masks = Vec::with_capacity(set.len());
    for (image_path, mask_path) in set.images.iter().zip(&set.masks) {
        let image = read_luma_image(image_path)?;
        let mask = read_luma_image(mask_path)?;
        if image.shape() != mask.shape() {
            return Err(DataError::ShapeMismatch {
                expected: image.shape().to_vec(),
                got: mask.shape().to_vec(),
            });
        }
        images.push(image);
        masks.push(mask);
    }

    let images = stack_samples(&images)?;
    let masks = stack_samples(&masks)?;

    let images = normalize_per_sample(&images, policy)?;
    let masks = binarize_masks(&masks);

    tracing::info!("已加载 {} 对图像/掩码，形状 {:?}", set.len(), images.shape());
    Ok((images, masks))
}

/// 将图像读为二维灰度数组 [H, W]，保留原始位深（8 位或 16 位）
///
/// 8 位图像按原值放入 u16，不做缩放；彩色图像先转为灰度，
/// 超过 8 位的彩色/浮点图像转为 16 位灰度。
fn read_luma_image(path: &Path) -> Result<Array2<u16>, DataError> {
    if !path.is_file() {
        return Err(DataError::FileNotFound(path.to_path_buf()));
    }

    let image = image::open(path).map_err(|source| DataError::ImageError {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = (image.width(), image.height());
    let color = image.color();

    let pixels: Vec<u16> = match image {
        DynamicImage::ImageLuma16(luma) => luma.into_raw(),
        DynamicImage::ImageLuma8(luma) => {
            luma.into_raw().into_iter().map(u16::from).collect()
        }
        other if color.bytes_per_pixel() == color.channel_count() => {
            other.to_luma8().into_raw().into_iter().map(u16::from).collect()
        }
        other => other.to_luma16().into_raw(),
    };

    tracing::debug!("读取图像 {}: {height}x{width}, {color:?}", path.display());
    Array2::from_shape_vec((height as usize, width as usize), pixels)
        .map_err(|e| DataError::FormatError(e.to_string()))
}

/// 沿新的第 0 维堆叠样本：[H, W] * N -> [N, H, W]
fn stack_samples(samples: &[Array2<u16>]) -> Result<Array3<u16>, DataError> {
    let Some(first) = samples.first() else {
        return Err(DataError::ConfigurationError("没有可堆叠的样本".to_string()));
    };
    if let Some(other) = samples.iter().find(|s| s.shape() != first.shape()) {
        return Err(DataError::ShapeMismatch {
            expected: first.shape().to_vec(),
            got: other.shape().to_vec(),
        });
    }

    let views: Vec<_> = samples.iter().map(|s| s.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| DataError::FormatError(e.to_string()))
}
