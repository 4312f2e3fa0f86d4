// ページ単位のインポート: 既存PDFのページを新しいDocumentへ複製する

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::{debug, instrument, warn};

use super::reader::{INHERITABLE_PAGE_KEYS, PdfReader};
use crate::error::RedactError;

/// 空のPDFを作り、他のDocumentからページを取り込んで保存する。
pub struct PageImporter {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PageImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageImporter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// `source` の指定ページ(0-indexed)を順番どおり末尾に追加する。
    ///
    /// 範囲外のインデックスは `PageOutOfRange` を返す。
    #[instrument(skip(self, source), fields(count = page_indices.len()))]
    pub fn import_pages(
        &mut self,
        source: &Document,
        page_indices: &[u32],
    ) -> crate::error::Result<()> {
        let pages = source.get_pages();
        let page_count = pages.len() as u32;

        // 同じDocumentから複数ページを取り込む場合、共有リソースは一度だけ複製する
        let mut id_map: HashMap<ObjectId, ObjectId> = HashMap::new();

        for &index in page_indices {
            let page_num = index + 1;
            let page_id = *pages
                .get(&page_num)
                .ok_or_else(|| RedactError::page_out_of_range(page_num, page_count))?;
            let new_id = self.clone_page(source, page_id, &mut id_map)?;
            self.kids.push(Object::Reference(new_id));
        }

        debug!(imported = page_indices.len(), total = self.kids.len(), "pages_imported");
        Ok(())
    }

    /// `source` の全ページを追加する。
    pub fn import_all(&mut self, source: &Document) -> crate::error::Result<()> {
        let count = source.get_pages().len() as u32;
        let indices: Vec<u32> = (0..count).collect();
        self.import_pages(source, &indices)
    }

    fn clone_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        id_map: &mut HashMap<ObjectId, ObjectId>,
    ) -> crate::error::Result<ObjectId> {
        let page_dict = source.get_dictionary(page_id)?;

        // 継承属性はページ辞書に明示的にコピーしておく（親ノードは複製しないため）
        let mut flattened = page_dict.clone();
        for key in INHERITABLE_PAGE_KEYS {
            if flattened.get(key).is_err()
                && let Some(value) = PdfReader::inherited_attribute(source, page_dict, key)
            {
                flattened.set(key.to_vec(), value);
            }
        }
        flattened.remove(b"Parent");

        let new_page_id = self.doc.new_object_id();
        id_map.insert(page_id, new_page_id);

        let mut cloned = self.clone_dictionary(source, &flattened, id_map)?;
        cloned.set("Parent", Object::Reference(self.pages_id));
        self.doc
            .objects
            .insert(new_page_id, Object::Dictionary(cloned));
        Ok(new_page_id)
    }

    fn clone_dictionary(
        &mut self,
        source: &Document,
        dict: &Dictionary,
        id_map: &mut HashMap<ObjectId, ObjectId>,
    ) -> crate::error::Result<Dictionary> {
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            // 他ページへの親参照はたどらない
            if key == b"Parent" {
                continue;
            }
            let cloned = self.clone_object(source, value, id_map)?;
            new_dict.set(key.clone(), cloned);
        }
        Ok(new_dict)
    }

    /// 参照先を再帰的に複製する。複製済みのIDは `id_map` で再利用するため循環参照でも停止する。
    fn clone_object(
        &mut self,
        source: &Document,
        object: &Object,
        id_map: &mut HashMap<ObjectId, ObjectId>,
    ) -> crate::error::Result<Object> {
        match object {
            Object::Reference(ref_id) => {
                if let Some(mapped) = id_map.get(ref_id) {
                    return Ok(Object::Reference(*mapped));
                }
                let referenced = match source.get_object(*ref_id) {
                    Ok(obj) => obj,
                    Err(err) => {
                        warn!(?ref_id, %err, "unresolvable reference replaced with null");
                        return Ok(Object::Null);
                    }
                };
                // 他ページオブジェクトへの参照（注釈の /P など）は取り込まない
                if let Object::Dictionary(d) = referenced
                    && d.get(b"Type").and_then(Object::as_name).ok() == Some(b"Page".as_slice())
                {
                    return Ok(Object::Null);
                }
                let new_id = self.doc.new_object_id();
                id_map.insert(*ref_id, new_id);
                let cloned = self.clone_object(source, referenced, id_map)?;
                self.doc.objects.insert(new_id, cloned);
                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => Ok(Object::Dictionary(
                self.clone_dictionary(source, dict, id_map)?,
            )),
            Object::Array(items) => {
                let mut new_items = Vec::with_capacity(items.len());
                for item in items {
                    new_items.push(self.clone_object(source, item, id_map)?);
                }
                Ok(Object::Array(new_items))
            }
            Object::Stream(stream) => {
                let dict = self.clone_dictionary(source, &stream.dict, id_map)?;
                // 圧縮済みのバイト列とFilterをそのまま引き継ぐ
                let mut new_stream = lopdf::Stream::new(dict, stream.content.clone());
                new_stream.allows_compression = stream.allows_compression;
                Ok(Object::Stream(new_stream))
            }
            other => Ok(other.clone()),
        }
    }

    /// Pagesノードとカタログを設定し、Documentを返す。
    pub fn finish(mut self) -> crate::error::Result<Document> {
        if self.kids.is_empty() {
            return Err(RedactError::EmptyDocument);
        }
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        Ok(self.doc)
    }

    pub fn save_to_bytes(self) -> crate::error::Result<Vec<u8>> {
        let mut doc = self.finish()?;
        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| RedactError::pdf_write(e.to_string()))?;
        Ok(buf)
    }

    /// 一時ファイル経由でアトミックに保存する。
    pub fn save(self, path: &Path) -> crate::error::Result<()> {
        let bytes = self.save_to_bytes()?;
        super::write_atomic(path, &bytes)
    }
}
