/*
 * @Description  : 数据加载集成测试
 *                 验证：MNIST 获取 + one-hot + 整体标准化，以及图像/掩码配对加载
 *                 的端到端流程（只用临时目录中的小型数据，不访问网络）
 */

use std::path::Path;

use approx::assert_abs_diff_eq;
use image::{GrayImage, Luma};
use ndarray::Axis;
use tempfile::tempdir;

use imaging_data::data::transforms::{normalize_whole_dataset, one_hot};
use imaging_data::data::{
    DataError, MNIST_IMAGE_SIZE, MNIST_NUM_CLASSES, ZeroStdPolicy, fetch_mnist, load_tumor_data,
};

fn write_mnist_split(dir: &Path, prefix: &str, labels: &[u8]) {
    let side = MNIST_IMAGE_SIZE as u32;
    let mut images = Vec::new();
    images.extend_from_slice(&2051u32.to_be_bytes());
    images.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    images.extend_from_slice(&side.to_be_bytes());
    images.extend_from_slice(&side.to_be_bytes());
    for (i, &label) in labels.iter().enumerate() {
        for p in 0..MNIST_IMAGE_SIZE * MNIST_IMAGE_SIZE {
            images.push(((p * (i + 1) + label as usize) % 256) as u8);
        }
    }
    std::fs::write(dir.join(format!("{prefix}-images-idx3-ubyte")), images).unwrap();

    let mut label_bytes = Vec::new();
    label_bytes.extend_from_slice(&2049u32.to_be_bytes());
    label_bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    label_bytes.extend_from_slice(labels);
    std::fs::write(dir.join(format!("{prefix}-labels-idx1-ubyte")), label_bytes).unwrap();
}

/// MNIST：获取 -> one-hot -> 整个数据集标准化
#[test]
fn test_mnist_pipeline() {
    let dir = tempdir().unwrap();
    write_mnist_split(dir.path(), "train", &[3, 1, 4, 1, 5, 9]);
    write_mnist_split(dir.path(), "t10k", &[2, 6]);

    let (train_x, train_y) = fetch_mnist(dir.path(), true, false).unwrap();
    let (test_x, test_y) = fetch_mnist(dir.path(), false, false).unwrap();
    assert_eq!(train_x.len_of(Axis(0)), 6);
    assert_eq!(test_x.len_of(Axis(0)), 2);
    assert_eq!(test_y.to_vec(), vec![2i16, 6]);

    let train_onehot = one_hot(&train_y, MNIST_NUM_CLASSES).unwrap();
    assert_eq!(train_onehot.shape(), &[6, 10]);
    assert_eq!(train_onehot[[5, 9]], 1.0);
    assert_eq!(train_onehot.sum(), 6.0);

    let normalized =
        normalize_whole_dataset(&train_x.insert_axis(Axis(3)), ZeroStdPolicy::Reject).unwrap();
    assert_eq!(normalized.shape(), &[6, 28, 28, 1]);
    let n = normalized.len() as f64;
    let mean = normalized.iter().map(|&v| v as f64).sum::<f64>() / n;
    let std = (normalized
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(std, 1.0, epsilon = 1e-5);
}

/// 类别数给小了，应报错而不是静默截断
#[test]
fn test_mnist_labels_exceed_class_count() {
    let dir = tempdir().unwrap();
    write_mnist_split(dir.path(), "train", &[0, 9]);

    let (_, labels) = fetch_mnist(dir.path(), true, false).unwrap();
    let err = one_hot(&labels, 5).unwrap_err();
    assert!(matches!(err, DataError::IndexOutOfRange { label: 9, .. }));
}

/// 肿瘤分割：训练 2 对、测试 1 对，掩码只含 {0, 1}
#[test]
fn test_tumor_pipeline() {
    let dir = tempdir().unwrap();
    for i in 0..3u32 {
        GrayImage::from_fn(16, 12, |x, y| Luma([(x * 5 + y * (i + 2)) as u8]))
            .save(dir.path().join(format!("image_{i}.png")))
            .unwrap();
        GrayImage::from_fn(16, 12, |x, y| {
            Luma([if (4..12).contains(&x) && (3..9).contains(&y) { 255 } else { 0 }])
        })
        .save(dir.path().join(format!("segmentation_{i}.png")))
        .unwrap();
    }

    let (train_x, train_y) = load_tumor_data(dir.path(), true).unwrap();
    let (test_x, test_y) = load_tumor_data(dir.path(), false).unwrap();

    assert_eq!(train_x.shape(), &[2, 12, 16]);
    assert_eq!(train_y.shape(), &[2, 12, 16]);
    assert_eq!(test_x.shape(), &[1, 12, 16]);
    assert_eq!(test_y.shape(), &[1, 12, 16]);

    for masks in [&train_y, &test_y] {
        assert!(masks.iter().all(|&v| v <= 1));
        // 前景为 8x6 的矩形
        for mask in masks.outer_iter() {
            assert_eq!(mask.iter().filter(|&&v| v == 1).count(), 48);
        }
    }
}
