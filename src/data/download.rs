//! 通用下载工具
//!
//! 提供 HTTP 下载和 MD5 校验功能，供各数据集复用。
//! 不做重试，任何失败都直接返回给调用方。

use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use super::error::DataError;

/// 下载文件并保存到指定路径
///
/// # 参数
/// - `url`: 下载地址
/// - `dest_path`: 保存路径
/// - `expected_md5`: 可选的 MD5 校验码，提供时会验证下载内容
///
/// # 返回
/// - 成功返回 `Ok(())`
/// - HTTP 失败返回 `DataError::DownloadError`
/// - 校验失败返回 `DataError::ChecksumMismatch`（此时不会写入文件）
pub fn download_file(
    url: &str,
    dest_path: &Path,
    expected_md5: Option<&str>,
) -> Result<(), DataError> {
    tracing::info!("正在下载 {url} ...");

    let response = ureq::get(url)
        .call()
        .map_err(|e| DataError::DownloadError(format!("HTTP 请求失败: {e}")))?;

    if response.status() != 200 {
        return Err(DataError::DownloadError(format!(
            "HTTP 状态码: {}",
            response.status()
        )));
    }

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| DataError::DownloadError(format!("读取响应失败: {e}")))?;

    if let Some(expected) = expected_md5 {
        verify_md5(&bytes, expected)?;
        tracing::debug!("MD5 校验通过: {expected}");
    }

    std::fs::write(dest_path, &bytes)?;

    tracing::info!("下载完成: {}", dest_path.display());
    Ok(())
}

/// 校验数据的 MD5 是否与预期一致
pub fn verify_md5(data: &[u8], expected: &str) -> Result<(), DataError> {
    let actual = compute_md5(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(DataError::ChecksumMismatch {
            expected: expected.to_string(),
            got: actual,
        })
    }
}

/// 计算数据的 MD5 校验码（小写十六进制）
pub fn compute_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{:x}", result)
}
