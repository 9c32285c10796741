//! Page metadata for the displayed document.
//!
//! The overlay engine needs to know how many pages exist and how big each
//! one is before it can register layers; this reads that straight from the
//! PDF bytes (including a service-generated artifact) without rendering
//! anything.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// US Letter, used when a malformed page carries no MediaBox at all.
const FALLBACK_EXTENT: (f64, f64) = (612.0, 792.0);

/// Unscaled size of one page, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageExtent {
    pub page: u32,
    pub width: f64,
    pub height: f64,
}

impl PageExtent {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// The zoom scale that fits this page to `target_width` pixels.
    pub fn fit_width_scale(&self, target_width: f64) -> f64 {
        target_width / self.width
    }
}

/// Read-only directory of the document's pages.
#[wasm_bindgen]
pub struct PageDirectory {
    doc: lopdf::Document,
}

impl PageDirectory {
    pub fn load(bytes: &[u8]) -> Result<Self, String> {
        let doc =
            lopdf::Document::load_mem(bytes).map_err(|e| format!("Failed to load PDF: {}", e))?;
        Ok(Self { doc })
    }

    pub fn len(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.doc.get_pages().is_empty()
    }

    pub fn extent(&self, page: u32) -> Result<PageExtent, String> {
        let page_id = self
            .doc
            .get_pages()
            .get(&page)
            .copied()
            .ok_or_else(|| format!("Page {} not found", page))?;

        let dict = self
            .doc
            .get_object(page_id)
            .map_err(|e| format!("Failed to read page object: {}", e))?
            .as_dict()
            .map_err(|_| "Page is not a dictionary".to_string())?;

        let (width, height) = match self.media_box(dict) {
            Some(rect) => self.rect_extent(&rect)?,
            None => FALLBACK_EXTENT,
        };

        Ok(PageExtent {
            page,
            width,
            height,
        })
    }

    pub fn extents(&self) -> Result<Vec<PageExtent>, String> {
        (1..=self.len()).map(|page| self.extent(page)).collect()
    }

    /// The page's MediaBox, looking through the parent node when the page
    /// inherits it.
    fn media_box<'a>(&'a self, dict: &'a lopdf::Dictionary) -> Option<&'a lopdf::Object> {
        if let Ok(media_box) = dict.get(b"MediaBox") {
            return Some(media_box);
        }
        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_object(parent_id).ok()?.as_dict().ok()?;
        parent.get(b"MediaBox").ok()
    }

    /// `[x1, y1, x2, y2]` to (width, height).
    fn rect_extent(&self, obj: &lopdf::Object) -> Result<(f64, f64), String> {
        let arr = match obj {
            lopdf::Object::Array(arr) => arr,
            lopdf::Object::Reference(id) => self
                .doc
                .get_object(*id)
                .map_err(|e| format!("Failed to resolve MediaBox: {}", e))?
                .as_array()
                .map_err(|_| "MediaBox reference is not an array".to_string())?,
            _ => return Err("MediaBox is not an array".to_string()),
        };

        if arr.len() != 4 {
            return Err(format!("MediaBox has {} elements, expected 4", arr.len()));
        }

        let mut corners = [0.0f64; 4];
        for (slot, obj) in corners.iter_mut().zip(arr) {
            *slot = self.number(obj)?;
        }

        Ok((corners[2] - corners[0], corners[3] - corners[1]))
    }

    fn number(&self, obj: &lopdf::Object) -> Result<f64, String> {
        match obj {
            lopdf::Object::Integer(i) => Ok(*i as f64),
            lopdf::Object::Real(r) => Ok(*r as f64),
            lopdf::Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| format!("Failed to resolve number: {}", e))?;
                self.number(resolved)
            }
            _ => Err("Expected a number in MediaBox".to_string()),
        }
    }
}

#[wasm_bindgen]
impl PageDirectory {
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: &[u8]) -> Result<PageDirectory, JsValue> {
        Self::load(bytes).map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.len()
    }

    #[wasm_bindgen(js_name = pageExtent)]
    pub fn page_extent(&self, page: u32) -> Result<JsValue, JsValue> {
        let extent = self.extent(page).map_err(|e| JsValue::from_str(&e))?;
        serde_wasm_bindgen::to_value(&extent)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize extent: {}", e)))
    }

    #[wasm_bindgen(js_name = allExtents)]
    pub fn all_extents(&self) -> Result<JsValue, JsValue> {
        let extents = self.extents().map_err(|e| JsValue::from_str(&e))?;
        serde_wasm_bindgen::to_value(&extents)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize extents: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// A two-page PDF: Letter then A4.
    fn sample_pdf() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let page1_id = doc.new_object_id();
        let page2_id = doc.new_object_id();

        let page1 = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(page1_id, lopdf::Object::Dictionary(page1));

        let page2 = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(page2_id, lopdf::Object::Dictionary(page2));

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page1_id.into(), page2_id.into()],
            "Count" => 2,
        };
        doc.objects.insert(pages_id, lopdf::Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    /// Pages with no own MediaBox inherit the parent's.
    fn inherited_media_box_pdf() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        let page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        doc.objects.insert(page_id, lopdf::Object::Dictionary(page));

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 500.into(), 700.into()],
        };
        doc.objects.insert(pages_id, lopdf::Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_page_count() {
        let directory = PageDirectory::load(&sample_pdf()).unwrap();
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_per_page_extents() {
        let directory = PageDirectory::load(&sample_pdf()).unwrap();

        let first = directory.extent(1).unwrap();
        assert_eq!((first.width, first.height), (612.0, 792.0));

        let second = directory.extent(2).unwrap();
        assert_eq!((second.width, second.height), (595.0, 842.0));
    }

    #[test]
    fn test_missing_page_is_an_error() {
        let directory = PageDirectory::load(&sample_pdf()).unwrap();
        assert!(directory.extent(3).is_err());
        assert!(directory.extent(0).is_err());
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let directory = PageDirectory::load(&inherited_media_box_pdf()).unwrap();
        let extent = directory.extent(1).unwrap();
        assert_eq!((extent.width, extent.height), (500.0, 700.0));
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        assert!(PageDirectory::load(b"not a pdf").is_err());
    }

    #[test]
    fn test_fit_width_scale() {
        let extent = PageExtent {
            page: 1,
            width: 612.0,
            height: 792.0,
        };
        let scale = extent.fit_width_scale(734.4);
        assert!((scale - 1.2).abs() < 1e-9);
        assert!((extent.aspect_ratio() - 612.0 / 792.0).abs() < 1e-9);
    }
}
