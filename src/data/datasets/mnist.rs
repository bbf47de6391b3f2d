//! MNIST 手写数字数据集
//!
//! 支持：
//! - IDX 二进制格式解析（支持 .gz 压缩）
//! - 兼容 torchvision 的缓存目录布局（`<root>/MNIST/raw/`）
//! - 可选自动下载（带 MD5 校验）
//!
//! 返回原始数组：像素为 u8 `[N, 28, 28]`，标签为 i16 `[N]`。
//! 归一化、one-hot 等交给 [`crate::data::transforms`]。

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use ndarray::{Array1, Array3};

use crate::data::download::download_file;
use crate::data::error::DataError;

/// MNIST 下载地址（使用 AWS S3 镜像，原官网 yann.lecun.com 不稳定）
const MNIST_BASE_URL: &str = "https://ossci-datasets.s3.amazonaws.com/mnist/";

/// 类别数
pub const MNIST_NUM_CLASSES: usize = 10;

/// 图像边长（像素）
pub const MNIST_IMAGE_SIZE: usize = 28;

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// MNIST 文件信息（压缩包名，MD5）
const MNIST_FILES: [(&str, &str); 4] = [
    (
        "train-images-idx3-ubyte.gz",
        "f68b3c2dcbeaaa9fbdd348bbdeb94873",
    ),
    (
        "train-labels-idx1-ubyte.gz",
        "d53e105ee54ea40749a09fcbcd1e9432",
    ),
    (
        "t10k-images-idx3-ubyte.gz",
        "9fb629c4189551a2d022fa330f9573f3",
    ),
    (
        "t10k-labels-idx1-ubyte.gz",
        "ec29112dd5afa0611ce80d1b7f02629c",
    ),
];

/// 获取 MNIST 数据
///
/// # 参数
/// - `data_dir`: 数据所在（或下载到）的本地目录
/// - `train`: true=训练集(60000), false=测试集(10000)
/// - `download`: true=本地缺失时自动下载
///
/// # 返回
/// `(images, labels)`，形状分别为 [N, 28, 28] 和 [N]
///
/// # 错误
/// - 本地缺失且 `download == false`: `DataUnavailable`
/// - 下载失败: `DownloadError` / `ChecksumMismatch` / `IoError`
/// - 文件损坏: `FormatError`
pub fn fetch_mnist(
    data_dir: impl AsRef<Path>,
    train: bool,
    download: bool,
) -> Result<(Array3<u8>, Array1<i16>), DataError> {
    let data_dir = data_dir.as_ref();

    let (images_file, labels_file) = if train {
        ("train-images-idx3-ubyte", "train-labels-idx1-ubyte")
    } else {
        ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte")
    };

    let images_path = ensure_file(data_dir, images_file, download)?;
    let labels_path = ensure_file(data_dir, labels_file, download)?;

    let images = parse_idx_images(&images_path)?;
    let labels = parse_idx_labels(&labels_path)?;

    let num_images = images.len_of(ndarray::Axis(0));
    if num_images != labels.len() {
        return Err(DataError::ShapeMismatch {
            expected: vec![num_images],
            got: vec![labels.len()],
        });
    }

    tracing::info!(
        "已加载 MNIST {}集: {} 个样本",
        if train { "训练" } else { "测试" },
        num_images
    );
    Ok((images, labels))
}

/// 获取默认数据目录
pub fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("imaging_data")
        .join("datasets")
}

/// 在本地查找文件（先原始文件，后 .gz；先 `data_dir`，后 torchvision 布局）
fn locate_file(data_dir: &Path, base_name: &str) -> Option<PathBuf> {
    let gz_name = format!("{base_name}.gz");
    let torchvision_dir = data_dir.join("MNIST").join("raw");
    [
        data_dir.join(base_name),
        data_dir.join(&gz_name),
        torchvision_dir.join(base_name),
        torchvision_dir.join(&gz_name),
    ]
    .into_iter()
    .find(|path| path.is_file())
}

/// 确保文件存在，必要时下载
fn ensure_file(data_dir: &Path, base_name: &str, download: bool) -> Result<PathBuf, DataError> {
    if let Some(path) = locate_file(data_dir, base_name) {
        tracing::debug!("使用本地文件: {}", path.display());
        return Ok(path);
    }

    if !download {
        return Err(DataError::DataUnavailable(data_dir.join(base_name)));
    }

    let gz_name = format!("{base_name}.gz");
    let expected_md5 = MNIST_FILES
        .iter()
        .find(|(name, _)| *name == gz_name)
        .map(|(_, md5)| *md5);

    std::fs::create_dir_all(data_dir)?;
    let gz_path = data_dir.join(&gz_name);
    download_file(&format!("{MNIST_BASE_URL}{gz_name}"), &gz_path, expected_md5)?;
    Ok(gz_path)
}

/// 打开文件，`.gz` 结尾的自动解压
fn open_idx(path: &Path) -> Result<Box<dyn Read>, DataError> {
    let file = File::open(path).map_err(|_| DataError::FileNotFound(path.to_path_buf()))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// 读取 IDX 头部并检查 magic number，返回除 magic 外的各维度
fn read_idx_header<const DIMS: usize>(
    reader: &mut dyn Read,
    expected_magic: u32,
) -> Result<[usize; DIMS], DataError> {
    let magic = read_be_u32(reader)?;
    if magic != expected_magic {
        return Err(DataError::FormatError(format!(
            "无效的 magic number: {magic} (期望 {expected_magic})"
        )));
    }

    let mut dims = [0usize; DIMS];
    for dim in dims.iter_mut() {
        *dim = read_be_u32(reader)? as usize;
    }
    Ok(dims)
}

fn read_be_u32(reader: &mut dyn Read) -> Result<u32, DataError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| DataError::FormatError(format!("读取头部失败: {e}")))?;
    Ok(u32::from_be_bytes(buf))
}

/// 读取头部声明长度的数据体
///
/// 按实际读到的字节增长缓冲区，头部谎报的长度不会导致超大分配；
/// 数据不足时返回 `FormatError`。
fn read_payload(
    reader: &mut dyn Read,
    expected: usize,
    what: &str,
) -> Result<Vec<u8>, DataError> {
    let mut payload = Vec::new();
    (&mut *reader)
        .take(expected as u64)
        .read_to_end(&mut payload)
        .map_err(|e| DataError::FormatError(format!("读取{what}数据失败: {e}")))?;
    if payload.len() != expected {
        return Err(DataError::FormatError(format!(
            "{what}数据被截断: 期望 {expected} 字节, 实际 {} 字节",
            payload.len()
        )));
    }
    Ok(payload)
}

/// 解析 IDX 图像文件
///
/// IDX 格式：
/// - [0-3] magic number (0x00000803 = 2051)
/// - [4-7] number of images
/// - [8-11] number of rows
/// - [12-15] number of columns
/// - [16+] pixel data (unsigned byte)
fn parse_idx_images(path: &Path) -> Result<Array3<u8>, DataError> {
    let mut reader = open_idx(path)?;
    let [num_images, num_rows, num_cols] =
        read_idx_header::<3>(reader.as_mut(), IMAGES_MAGIC)?;

    if num_rows != MNIST_IMAGE_SIZE || num_cols != MNIST_IMAGE_SIZE {
        return Err(DataError::FormatError(format!(
            "无效的图像尺寸: {num_rows}x{num_cols} (期望 {MNIST_IMAGE_SIZE}x{MNIST_IMAGE_SIZE})"
        )));
    }

    let pixel_count = num_images
        .checked_mul(num_rows * num_cols)
        .ok_or_else(|| DataError::FormatError(format!("图像数量过大: {num_images}")))?;
    let pixels = read_payload(reader.as_mut(), pixel_count, "像素")?;

    tracing::debug!("解析图像文件 {}: {num_images} 张", path.display());
    Array3::from_shape_vec((num_images, num_rows, num_cols), pixels)
        .map_err(|e| DataError::FormatError(e.to_string()))
}

/// 解析 IDX 标签文件
///
/// IDX 格式：
/// - [0-3] magic number (0x00000801 = 2049)
/// - [4-7] number of labels
/// - [8+] label data (unsigned byte, 0-9)
fn parse_idx_labels(path: &Path) -> Result<Array1<i16>, DataError> {
    let mut reader = open_idx(path)?;
    let [num_labels] = read_idx_header::<1>(reader.as_mut(), LABELS_MAGIC)?;

    let labels = read_payload(reader.as_mut(), num_labels, "标签")?;

    tracing::debug!("解析标签文件 {}: {num_labels} 个", path.display());
    Ok(labels.into_iter().map(i16::from).collect())
}
