// Render integration tests
//
// Image-backed documents are always tested. PDF rendering needs the pdfium
// shared library and is skipped unless PDFIUM_DYNAMIC_LIB_PATH is set.
// Test PDFs are dynamically generated with lopdf to avoid fixture files.

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use pdf_redaction::error::RedactError;
use pdf_redaction::render::{self, ImageDocument, PageSource, open_document};

fn pdfium_available() -> bool {
    std::env::var("PDFIUM_DYNAMIC_LIB_PATH").is_ok()
}

/// Create a PDF with one Letter page (612x792 pt) and one landscape A5 page
/// (595x420 pt) using lopdf.
fn create_test_pdf(dir: &tempfile::TempDir) -> PathBuf {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (w, h) in [(612, 792), (595, 420)] {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(w),
                Object::Integer(h),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(2),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.path().join("test.pdf");
    doc.save(&path).expect("failed to save test PDF");
    path
}

fn image_doc() -> ImageDocument {
    ImageDocument::from_images(vec![
        DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 50, Rgb([1, 2, 3]))),
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 40, Rgba([9, 9, 9, 128]))),
    ])
}

// ============================================================
// 1. Page validation
// ============================================================

#[test]
fn test_render_page_out_of_range() {
    let doc = image_doc();
    for bad in [0, 3] {
        let result = render::render(&doc, bad, 1.0);
        assert!(
            matches!(result, Err(RedactError::PageOutOfRange { page_count: 2, .. })),
            "page {bad}: {result:?}"
        );
    }
}

#[test]
fn test_render_rejects_bad_scale() {
    let doc = image_doc();
    for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        assert!(
            matches!(render::render(&doc, 1, scale), Err(RedactError::RenderError(_))),
            "scale {scale} should be rejected"
        );
    }
}

// ============================================================
// 2. Image-backed documents
// ============================================================

#[test]
fn test_image_document_dimensions() {
    let doc = image_doc();
    assert_eq!(render::page_count(&doc), 2);
    assert_eq!(render::native_size(&doc, 1).expect("size"), (100.0, 50.0));
    assert_eq!(render::rendered_size(&doc, 1, 1.5).expect("size"), (150, 75));

    let raster = render::render(&doc, 1, 0.5).expect("render");
    assert_eq!((raster.width(), raster.height()), (50, 25));
}

#[test]
fn test_render_normalizes_colour_model() {
    let doc = image_doc();
    let raster = render::render(&doc, 2, 1.0).expect("render");
    assert!(matches!(raster, DynamicImage::ImageRgb8(_)));
}

#[test]
fn test_render_at_native_size_is_exact() {
    let doc = image_doc();
    let raster = render::render(&doc, 1, 1.0).expect("render");
    assert_eq!(raster.as_rgb8().expect("rgb").get_pixel(99, 49), &Rgb([1, 2, 3]));
}

#[test]
fn test_open_document_picks_image_backend() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scan.PNG");
    DynamicImage::ImageRgb8(RgbImage::new(30, 20))
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("save");

    let doc = open_document(&path).expect("open");
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.native_size(1).expect("size"), (30.0, 20.0));
}

#[test]
fn test_open_document_validation_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        open_document(dir.path().join("missing.pdf")),
        Err(RedactError::FileNotFound(_))
    ));
    assert!(matches!(
        open_document(dir.path()),
        Err(RedactError::NotAFile(_))
    ));
    let doc = dir.path().join("letter.docx");
    std::fs::write(&doc, b"x").expect("write");
    assert!(matches!(
        open_document(&doc),
        Err(RedactError::UnsupportedFormat(_))
    ));
}

// ============================================================
// 3. PDF rendering (pdfium)
// ============================================================

fn open_pdf(path: &Path) -> Box<dyn PageSource> {
    open_document(path).expect("open PDF")
}

#[test]
fn test_pdf_page_sizes() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let doc = open_pdf(&create_test_pdf(&dir));

    assert_eq!(doc.page_count(), 2);
    assert_eq!(render::native_size(doc.as_ref(), 1).expect("size"), (612.0, 792.0));
    assert_eq!(render::native_size(doc.as_ref(), 2).expect("size"), (595.0, 420.0));
}

#[test]
fn test_pdf_render_dimensions_follow_scale() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let doc = open_pdf(&create_test_pdf(&dir));

    let at_2 = render::render(doc.as_ref(), 1, 2.0).expect("render at 2.0");
    assert_eq!((at_2.width(), at_2.height()), (1224, 1584));

    let at_1 = render::render(doc.as_ref(), 2, 1.0).expect("render at 1.0");
    assert_eq!((at_1.width(), at_1.height()), (595, 420));
    assert!(matches!(at_1, DynamicImage::ImageRgb8(_)));
}

#[test]
fn test_pdf_render_is_deterministic() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let doc = open_pdf(&create_test_pdf(&dir));
    let a = render::render(doc.as_ref(), 1, 0.5).expect("first render");
    let b = render::render(doc.as_ref(), 1, 0.5).expect("second render");
    assert_eq!(a, b);
}
