//! 数据变换函数
//!
//! 提供常用的数据预处理操作：
//! - [`one_hot`]: 标签 one-hot 编码（带越界检查）
//! - [`normalize_whole_dataset`]: 按通道在整个数据集上标准化
//! - [`normalize_per_sample`]: 每个样本各自标准化
//! - [`binarize_masks`]: 掩码二值化
//!
//! 所有统计量都在 f64 下计算，输出为 f32。

use ndarray::{
    Array, Array1, Array2, Array3, Array4, ArrayBase, Axis, Data, Dimension, Ix1, Ix3, Ix4, Zip,
};
use num_traits::{AsPrimitive, PrimInt, Zero};
use serde::{Deserialize, Serialize};

use super::error::DataError;

/// 判定标准差"为零"的相对容差
const DEGENERATE_STD_TOLERANCE: f64 = 1e-12;

/// 遇到零方差（常数强度）的通道或样本时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ZeroStdPolicy {
    /// 直接报错（`DegenerateChannel` / `DegenerateSample`）
    #[default]
    Reject,
    /// 用给定的正数替代零标准差
    Epsilon(f64),
}

impl ZeroStdPolicy {
    fn validate(self) -> Result<(), DataError> {
        match self {
            Self::Epsilon(eps) if !(eps.is_finite() && eps > 0.0) => Err(
                DataError::ConfigurationError(format!("epsilon 必须是有限正数，实际为 {eps}")),
            ),
            _ => Ok(()),
        }
    }

    /// 返回实际用于除法的标准差；`None` 表示应当报错
    fn resolve_std(self, mean: f64, std: f64) -> Option<f64> {
        if std > DEGENERATE_STD_TOLERANCE * (1.0 + mean.abs()) {
            return Some(std);
        }
        match self {
            Self::Reject => None,
            Self::Epsilon(eps) => Some(eps),
        }
    }
}

/// 按通道统计的均值与标准差（总体标准差，ddof = 0）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// 形状 [C]
    pub mean: Array1<f64>,
    /// 形状 [C]
    pub std: Array1<f64>,
}

impl ChannelStats {
    pub fn num_channels(&self) -> usize {
        self.mean.len()
    }

    /// 按策略处理零标准差后的标准差；调用方保证 `mean` 与 `std` 等长
    fn effective_std(&self, policy: ZeroStdPolicy) -> Result<Array1<f64>, DataError> {
        self.mean
            .iter()
            .zip(self.std.iter())
            .enumerate()
            .map(|(channel, (&mean, &std))| {
                policy
                    .resolve_std(mean, std)
                    .ok_or(DataError::DegenerateChannel { channel })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }
}

/// 将类别索引转换为 one-hot 编码
///
/// # 参数
/// - `labels`: 类别索引，形状 [N]，值应在 [0, num_classes) 内
/// - `num_classes`: 类别总数
///
/// # 返回
/// one-hot 编码，形状 [N, num_classes]；任一标签越界时返回 `IndexOutOfRange`
///
/// # 示例
/// ```
/// use imaging_data::data::transforms::one_hot;
/// use ndarray::array;
///
/// let encoded = one_hot(&array![0i16, 2, 1], 3).unwrap();
/// assert_eq!(encoded, array![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);
/// ```
pub fn one_hot<S, T>(
    labels: &ArrayBase<S, Ix1>,
    num_classes: usize,
) -> Result<Array2<f32>, DataError>
where
    S: Data<Elem = T>,
    T: PrimInt,
{
    let mut encoded = Array2::zeros((labels.len(), num_classes));
    for (sample, (&label, mut row)) in labels.iter().zip(encoded.rows_mut()).enumerate() {
        let class_idx = label
            .to_usize()
            .filter(|&idx| idx < num_classes)
            .ok_or_else(|| DataError::IndexOutOfRange {
                sample,
                label: label.to_i64().unwrap_or(i64::MAX),
                num_classes,
            })?;
        row[class_idx] = 1.0;
    }
    Ok(encoded)
}

/// 计算 [N, H, W, C] 数据集每个通道在 N、H、W 上的均值和标准差
pub fn channel_statistics<S, T>(data: &ArrayBase<S, Ix4>) -> Result<ChannelStats, DataError>
where
    S: Data<Elem = T>,
    T: AsPrimitive<f64>,
{
    ensure_not_empty(data)?;

    let channels = data.len_of(Axis(3));
    let mut mean = Array1::zeros(channels);
    let mut std = Array1::zeros(channels);
    for (c, channel) in data.axis_iter(Axis(3)).enumerate() {
        let (m, s) = mean_std(channel.iter().map(|&v| to_f64(v)));
        mean[c] = m;
        std[c] = s;
    }
    Ok(ChannelStats { mean, std })
}

/// 按通道在整个数据集上标准化：`(data - mean) / std`
///
/// # 参数
/// - `data`: 形状 [N, H, W, C]；单通道的 [N, H, W] 数据可先 `insert_axis(Axis(3))`
/// - `policy`: 零方差通道的处理策略
///
/// # 返回
/// 与输入同形状的 f32 数组
pub fn normalize_whole_dataset<S, T>(
    data: &ArrayBase<S, Ix4>,
    policy: ZeroStdPolicy,
) -> Result<Array4<f32>, DataError>
where
    S: Data<Elem = T>,
    T: AsPrimitive<f64>,
{
    policy.validate()?;
    let stats = channel_statistics(data)?;
    normalize_with_stats(data, &stats, policy)
}

/// 用给定的通道统计量标准化数据
pub fn normalize_with_stats<S, T>(
    data: &ArrayBase<S, Ix4>,
    stats: &ChannelStats,
    policy: ZeroStdPolicy,
) -> Result<Array4<f32>, DataError>
where
    S: Data<Elem = T>,
    T: AsPrimitive<f64>,
{
    policy.validate()?;
    let channels = data.len_of(Axis(3));
    for stat_len in [stats.mean.len(), stats.std.len()] {
        if stat_len != channels {
            return Err(DataError::ShapeMismatch {
                expected: vec![channels],
                got: vec![stat_len],
            });
        }
    }
    let std = stats.effective_std(policy)?;

    let mut normalized = Array4::<f32>::zeros(data.raw_dim());
    Zip::from(normalized.lanes_mut(Axis(3)))
        .and(data.lanes(Axis(3)))
        .for_each(|mut out, pixel| {
            for c in 0..channels {
                out[c] = ((to_f64(pixel[c]) - stats.mean[c]) / std[c]) as f32;
            }
        });
    Ok(normalized)
}

/// 每个样本各自标准化（只在该样本的 H、W 上统计，不跨样本）
///
/// # 参数
/// - `data`: 形状 [N, H, W]
/// - `policy`: 零方差样本的处理策略
pub fn normalize_per_sample<S, T>(
    data: &ArrayBase<S, Ix3>,
    policy: ZeroStdPolicy,
) -> Result<Array3<f32>, DataError>
where
    S: Data<Elem = T>,
    T: AsPrimitive<f64>,
{
    policy.validate()?;
    ensure_not_empty(data)?;

    let mut normalized = Array3::<f32>::zeros(data.raw_dim());
    for (sample, (image, mut out)) in data
        .outer_iter()
        .zip(normalized.outer_iter_mut())
        .enumerate()
    {
        let (mean, std) = mean_std(image.iter().map(|&v| to_f64(v)));
        let std = policy
            .resolve_std(mean, std)
            .ok_or(DataError::DegenerateSample { sample })?;
        out.zip_mut_with(&image, |o, &v| *o = ((to_f64(v) - mean) / std) as f32);
    }
    Ok(normalized)
}

/// 掩码二值化：大于 0 的值变为 1，其余为 0
pub fn binarize_masks<S, T, D>(masks: &ArrayBase<S, D>) -> Array<u8, D>
where
    S: Data<Elem = T>,
    T: Zero + PartialOrd + Copy,
    D: Dimension,
{
    masks.mapv(|v| u8::from(v > T::zero()))
}

fn to_f64<T: AsPrimitive<f64>>(value: T) -> f64 {
    value.as_()
}

/// 两遍法计算总体均值和标准差；调用方保证非空
fn mean_std<I>(values: I) -> (f64, f64)
where
    I: Iterator<Item = f64> + Clone,
{
    let (sum, count) = values
        .clone()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    (mean, variance.sqrt())
}

fn ensure_not_empty<S, D>(data: &ArrayBase<S, D>) -> Result<(), DataError>
where
    S: Data,
    D: Dimension,
{
    if data.is_empty() {
        return Err(DataError::ConfigurationError(format!(
            "空数据无法计算统计量，形状为 {:?}",
            data.shape()
        )));
    }
    Ok(())
}
