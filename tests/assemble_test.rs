// Merge / extract tests
//
// All test PDFs are dynamically generated with lopdf (no committed fixtures).
// Rendering to PNG needs pdfium and is skipped unless PDFIUM_DYNAMIC_LIB_PATH
// is set.

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::{Document, Object, Stream, dictionary};

use pdf_redaction::assemble::{Aggregator, Separator};
use pdf_redaction::error::RedactError;

// ============================================================
// Guards and helpers
// ============================================================

fn pdfium_available() -> bool {
    std::env::var("PDFIUM_DYNAMIC_LIB_PATH").is_ok()
}

/// Create a PDF whose pages have distinct widths (100, 200, ...) and a
/// content stream naming the page, so pages can be told apart after import.
fn create_pdf(path: &Path, num_pages: usize) -> PathBuf {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    // Shared by every page through the Pages node.
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for i in 0..num_pages {
        let content = format!("BT /F1 12 Tf 10 10 Td (page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(100 * (i as i64 + 1)),
                Object::Integer(300),
            ],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(num_pages as i64),
        "Resources" => resources_id,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).expect("failed to save test PDF");
    path.to_path_buf()
}

fn create_png(path: &Path, width: u32, height: u32) -> PathBuf {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 240])));
    img.save(path).expect("save png");
    path.to_path_buf()
}

fn page_widths(path: &Path) -> Vec<f64> {
    let doc = Document::load(path).expect("open output");
    doc.get_pages()
        .values()
        .map(|page_id| {
            let media_box = doc
                .get_dictionary(*page_id)
                .and_then(|page| page.get(b"MediaBox"))
                .and_then(Object::as_array)
                .expect("MediaBox");
            let x0 = media_box[0].as_float().expect("x0");
            let x1 = media_box[2].as_float().expect("x1");
            f64::from(x1 - x0)
        })
        .collect()
}

fn page_text(doc: &Document, page_number: u32) -> String {
    let pages = doc.get_pages();
    let page_id = pages[&page_number];
    String::from_utf8_lossy(&doc.get_page_content(page_id).expect("content")).into_owned()
}

// ============================================================
// 1. Aggregator::merge
// ============================================================

#[test]
fn test_merge_pdfs_and_image_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = create_pdf(&dir.path().join("a.pdf"), 2);
    let scan = create_png(&dir.path().join("scan.png"), 600, 300);
    let b = create_pdf(&dir.path().join("b.pdf"), 1);
    let output = dir.path().join("merged.pdf");

    let written = Aggregator::new(300)
        .merge(&[&a, &scan, &b], &output)
        .expect("merge");
    assert_eq!(written, output);

    // 600 px at 300 dpi is 144 pt.
    let widths = page_widths(&output);
    assert_eq!(widths.len(), 4);
    assert_eq!(widths[0], 100.0);
    assert_eq!(widths[1], 200.0);
    assert!((widths[2] - 144.0).abs() < 0.01, "image page width {}", widths[2]);
    assert_eq!(widths[3], 100.0);

    let doc = Document::load(&output).expect("load merged");
    assert!(page_text(&doc, 2).contains("page 2"));
    assert!(page_text(&doc, 4).contains("page 1"));
}

#[test]
fn test_merge_flattens_inherited_resources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = create_pdf(&dir.path().join("a.pdf"), 2);
    let output = dir.path().join("merged.pdf");
    Aggregator::default().merge(&[&a], &output).expect("merge");

    let doc = Document::load(&output).expect("load merged");
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id).expect("page");
        assert!(page.get(b"Resources").is_ok(), "Resources should be on the page");
        assert!(page.get(b"MediaBox").is_ok(), "MediaBox should be on the page");
    }
}

#[test]
fn test_merge_no_inputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let files: [&Path; 0] = [];
    let result = Aggregator::default().merge(&files, &dir.path().join("out.pdf"));
    assert!(matches!(result, Err(RedactError::NoInputs)));
}

#[test]
fn test_merge_missing_input_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = create_pdf(&dir.path().join("a.pdf"), 1);
    let missing = dir.path().join("missing.pdf");
    let output = dir.path().join("out.pdf");

    let result = Aggregator::default().merge(&[&a, &missing], &output);
    assert!(matches!(result, Err(RedactError::FileNotFound(p)) if p == missing));
    assert!(!output.exists());
}

#[test]
fn test_merge_unsupported_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "hello").expect("write");
    let result = Aggregator::default().merge(&[&notes], &dir.path().join("out.pdf"));
    assert!(matches!(result, Err(RedactError::UnsupportedFormat(_))));
}

// ============================================================
// 2. Aggregator::preview
// ============================================================

#[test]
fn test_preview_images_and_skips_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scan = create_png(&dir.path().join("scan.png"), 200, 100);
    let missing = dir.path().join("missing.png");

    let thumbs = Aggregator::default()
        .preview(&[&scan, &missing], 0.3)
        .expect("preview");
    assert_eq!(thumbs.len(), 1);
    assert_eq!((thumbs[0].width(), thumbs[0].height()), (60, 30));
}

#[test]
fn test_preview_renders_pdf_pages() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let a = create_pdf(&dir.path().join("a.pdf"), 2);
    let thumbs = Aggregator::default().preview(&[&a], 0.5).expect("preview");
    assert_eq!(thumbs.len(), 2);
    assert_eq!((thumbs[1].width(), thumbs[1].height()), (100, 150));
}

// ============================================================
// 3. Separator
// ============================================================

#[test]
fn test_page_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = create_pdf(&dir.path().join("a.pdf"), 4);
    assert_eq!(Separator::default().page_count(&a).expect("count"), 4);
}

#[test]
fn test_page_count_rejects_images() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scan = create_png(&dir.path().join("scan.png"), 10, 10);
    assert!(matches!(
        Separator::default().page_count(&scan),
        Err(RedactError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_extract_split_pdfs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = create_pdf(&dir.path().join("report.pdf"), 5);
    let out_dir = dir.path().join("pages");

    let outputs = Separator::default()
        .extract(&doc, "2, 4-5, 9", &out_dir, false)
        .expect("extract");
    let names: Vec<String> = outputs
        .iter()
        .map(|p| p.file_name().expect("name").to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["report_page2.pdf", "report_page4.pdf", "report_page5.pdf"]
    );
    for (path, width) in outputs.iter().zip([200.0, 400.0, 500.0]) {
        assert_eq!(page_widths(path), vec![width]);
    }
}

#[test]
fn test_extract_single() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = create_pdf(&dir.path().join("report.pdf"), 5);
    let output = dir.path().join("part.pdf");

    Separator::default()
        .extract_single(&doc, "5, 1-2, 2", &output)
        .expect("extract");
    // Ascending order regardless of the order given.
    assert_eq!(page_widths(&output), vec![100.0, 200.0, 500.0]);
}

#[test]
fn test_extract_empty_selection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = create_pdf(&dir.path().join("report.pdf"), 3);
    let output = dir.path().join("part.pdf");

    let result = Separator::default().extract_single(&doc, "7-9, abc", &output);
    assert!(matches!(
        result,
        Err(RedactError::EmptyPageSelection { page_count: 3, .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_extract_as_images() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = create_pdf(&dir.path().join("report.pdf"), 2);
    let out_dir = dir.path().join("png");

    let outputs = Separator::new(144)
        .extract(&doc, "2", &out_dir, true)
        .expect("extract");
    assert_eq!(outputs, vec![out_dir.join("report_page2.png")]);
    let img = image::open(&outputs[0]).expect("open png");
    assert_eq!((img.width(), img.height()), (400, 600));
}
