//! download 模块单元测试（只测校验，不访问网络）

use crate::data::DataError;
use crate::data::download::{compute_md5, verify_md5};

#[test]
fn test_compute_md5_known_digests() {
    assert_eq!(compute_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(compute_md5(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
}

#[test]
fn test_verify_md5_ok_ignores_case() {
    assert!(verify_md5(b"abc", "900150983CD24FB0D6963F7D28E17F72").is_ok());
}

#[test]
fn test_verify_md5_mismatch() {
    let err = verify_md5(b"abc", "00000000000000000000000000000000").unwrap_err();
    match err {
        DataError::ChecksumMismatch { expected, got } => {
            assert_eq!(expected, "00000000000000000000000000000000");
            assert_eq!(got, "900150983cd24fb0d6963f7d28e17f72");
        }
        other => panic!("期望 ChecksumMismatch，实际 {other:?}"),
    }
}
