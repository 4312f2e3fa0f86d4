use std::path::{Path, PathBuf};

use crate::error::RedactError;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif", "webp"];
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
}

/// 拡張子（小文字化済み）からファイル種別を判定する。
pub fn kind_of(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if PDF_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileKind::Pdf)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileKind::Image)
    } else {
        None
    }
}

/// 入力パスを検証し、種別とともに返す。
///
/// 存在しない場合は `FileNotFound`、ディレクトリ等の場合は `NotAFile`、
/// 対応外の拡張子は `UnsupportedFormat` を返す。
pub fn validate_file(path: impl AsRef<Path>) -> crate::error::Result<(PathBuf, FileKind)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RedactError::FileNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(RedactError::NotAFile(path.to_path_buf()));
    }
    let kind = kind_of(path).ok_or_else(|| {
        RedactError::unsupported_format(format!(
            "{} ({})",
            path.display(),
            path.extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "no extension".to_string())
        ))
    })?;
    Ok((path.to_path_buf(), kind))
}

/// PDFであることを要求する [`validate_file`]。
pub fn validate_pdf(path: impl AsRef<Path>) -> crate::error::Result<PathBuf> {
    let (path, kind) = validate_file(path)?;
    if kind != FileKind::Pdf {
        return Err(RedactError::unsupported_format(format!(
            "not a PDF file: {}",
            path.display()
        )));
    }
    Ok(path)
}
