use std::path::Path;

use lopdf::Document;
use tracing::{debug, instrument};

/// MediaBoxなど、親のPagesノードから継承されうるページ属性。
pub(crate) const INHERITABLE_PAGE_KEYS: &[&[u8]] = &[b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let doc = Document::load(path)?;
        debug!(pages = doc.get_pages().len(), "pdf_loaded");
        Ok(Self { doc })
    }

    /// 内部のlopdf Documentへの参照を返す。
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// ページ数を返す。
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// 継承可能な属性をページ辞書から探し、なければParentをたどる。
    pub(crate) fn inherited_attribute(
        doc: &Document,
        dict: &lopdf::Dictionary,
        key: &[u8],
    ) -> Option<lopdf::Object> {
        if let Ok(obj) = dict.get(key) {
            return Some(obj.clone());
        }
        if let Ok(lopdf::Object::Reference(parent_id)) = dict.get(b"Parent")
            && let Ok(parent_dict) = doc.get_dictionary(*parent_id)
        {
            return Self::inherited_attribute(doc, parent_dict, key);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, dictionary};

    /// Pagesノードに MediaBox と Rotate を持ち、ページ側で Rotate を上書きする
    fn nested_document() -> (Document, lopdf::ObjectId) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Rotate" => 180,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
                "Rotate" => 90,
            }),
        );
        (doc, page_id)
    }

    #[test]
    fn test_inherited_attribute_prefers_page_value() {
        let (doc, page_id) = nested_document();
        let page = doc.get_dictionary(page_id).expect("page");
        let rotate = PdfReader::inherited_attribute(&doc, page, b"Rotate").expect("Rotate");
        assert_eq!(rotate.as_i64().expect("int"), 180);
    }

    #[test]
    fn test_inherited_attribute_walks_parent() {
        let (doc, page_id) = nested_document();
        let page = doc.get_dictionary(page_id).expect("page");
        let media_box = PdfReader::inherited_attribute(&doc, page, b"MediaBox").expect("MediaBox");
        assert_eq!(media_box.as_array().expect("array").len(), 4);
        assert!(PdfReader::inherited_attribute(&doc, page, b"CropBox").is_none());
    }
}
