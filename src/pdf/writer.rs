// ラスタ画像列 -> 画像XObject1枚ずつのページを持つPDF

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::DynamicImage;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::error::RedactError;

/// ページに配置するためにエンコード済みのラスタ。
///
/// 画素データはFlateDecodeで可逆圧縮されるため、デコードすれば元の画素と一致する。
pub struct EncodedRaster {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
}

impl EncodedRaster {
    /// グレースケールはDeviceGray、それ以外はRGBに変換してDeviceRGBでエンコードする。
    pub fn encode(raster: &DynamicImage) -> crate::error::Result<Self> {
        let (raw, color_space) = match raster {
            DynamicImage::ImageLuma8(gray) => (gray.as_raw().clone(), "DeviceGray"),
            DynamicImage::ImageRgb8(rgb) => (rgb.as_raw().clone(), "DeviceRGB"),
            other => (other.to_rgb8().into_raw(), "DeviceRGB"),
        };
        Ok(Self {
            data: flate_encode(&raw)?,
            width: raster.width(),
            height: raster.height(),
            color_space,
        })
    }
}

/// zlibで圧縮
pub(crate) fn flate_encode(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| RedactError::encode(format!("Flate encode error: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RedactError::encode(format!("Flate encode error: {}", e)))
}

/// ラスタ1枚につき1ページのPDFを組み立てる。
pub struct RasterPdfWriter {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    /// 1ピクセルあたりのPDFポイント数（MediaBox計算用）。
    points_per_pixel: f64,
}

impl RasterPdfWriter {
    /// `points_per_pixel` はMediaBoxの計算に使う倍率。
    /// レンダリング倍率 `s` のラスタなら `1 / s`、DPI指定なら `72 / dpi`。
    pub fn new(points_per_pixel: f64) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            points_per_pixel,
        }
    }

    /// DPI指定でライターを作成する。
    pub fn with_dpi(dpi: u32) -> Self {
        Self::new(72.0 / f64::from(dpi.max(1)))
    }

    /// 画像XObjectを追加する。
    ///
    /// 戻り値はXObjectのオブジェクトID。
    pub fn add_image_xobject(&mut self, raster: &EncodedRaster) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => raster.width as i64,
            "Height" => raster.height as i64,
            "ColorSpace" => raster.color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let stream = Stream::new(dict, raster.data.clone());
        self.doc.add_object(Object::Stream(stream))
    }

    /// 画像をページ全体に描画するコンテンツストリームを生成する。
    ///
    /// `q <width> 0 0 <height> 0 0 cm /<name> Do Q`
    pub fn build_image_content_stream(name: &str, width: f64, height: f64) -> Vec<u8> {
        format!("q {width:.4} 0 0 {height:.4} 0 0 cm /{name} Do Q").into_bytes()
    }

    /// エンコード済みラスタを新しいページとして末尾に追加する。
    ///
    /// 戻り値はページのオブジェクトID。
    pub fn add_page(&mut self, raster: &EncodedRaster) -> ObjectId {
        let page_w = f64::from(raster.width) * self.points_per_pixel;
        let page_h = f64::from(raster.height) * self.points_per_pixel;

        let image_id = self.add_image_xobject(raster);

        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => dictionary! {
                "Im0" => Object::Reference(image_id),
            },
        });

        let content_bytes = Self::build_image_content_stream("Im0", page_w, page_h);
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content_bytes)));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w as f32),
                Object::Real(page_h as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        self.kids.push(page_id.into());
        page_id
    }

    /// DynamicImageをエンコードしてページとして追加する。
    pub fn add_raster(&mut self, raster: &DynamicImage) -> crate::error::Result<ObjectId> {
        let encoded = EncodedRaster::encode(raster)?;
        Ok(self.add_page(&encoded))
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
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

    /// PDFドキュメントをバイト列として出力する。
    pub fn save_to_bytes(self) -> crate::error::Result<Vec<u8>> {
        let mut doc = self.finish()?;
        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| RedactError::pdf_write(e.to_string()))?;
        Ok(buf)
    }
}
