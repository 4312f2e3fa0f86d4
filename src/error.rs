use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedactError {
    #[error("Page {requested} out of range (document has {page_count} pages)")]
    PageOutOfRange { requested: u32, page_count: u32 },

    #[error("No document loaded")]
    NoDocumentLoaded,

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("No regions selected")]
    NothingToRedact,

    #[error("No valid pages in range '{range}' (document has {page_count} pages)")]
    EmptyPageSelection { range: String, page_count: u32 },

    #[error("No input files given")]
    NoInputs,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Encode failure: {0}")]
    EncodeFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`RedactError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl RedactError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create an unsupported-format error.
    unsupported_format => UnsupportedFormat,
    /// Create an encode failure.
    encode => EncodeFailure,
    /// Create a configuration error.
    config => ConfigError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a render error.
    render => RenderError,
    /// Create an image error.
    image => ImageError,
}

impl RedactError {
    /// Create a page-out-of-range error.
    pub fn page_out_of_range(requested: u32, page_count: u32) -> Self {
        Self::PageOutOfRange {
            requested,
            page_count,
        }
    }
}

impl From<lopdf::Error> for RedactError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for RedactError {
    fn from(e: serde_json::Error) -> Self {
        Self::EncodeFailure(e.to_string())
    }
}

impl From<serde_yml::Error> for RedactError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

#[cfg(feature = "pdfium")]
impl From<pdfium_render::prelude::PdfiumError> for RedactError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for RedactError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RedactError>;
