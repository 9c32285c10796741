//! pdf.js bridge: the opaque component that renders page N at scale s.
//!
//! All rasterization happens on the JavaScript side; this wrapper only
//! tracks the loaded document and validates page numbers. Overlay logic
//! lives elsewhere.

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

#[wasm_bindgen(module = "/www/js/pdf-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = initPdfJs)]
    pub async fn init_pdf_js(worker_src: &str) -> JsValue;

    #[wasm_bindgen(js_name = loadDocument)]
    async fn load_document_internal(data: Uint8Array) -> JsValue;

    #[wasm_bindgen(js_name = renderPage)]
    async fn render_page_internal(page_num: u32, canvas: &HtmlCanvasElement, scale: f64)
        -> JsValue;
}

/// Handle to the document loaded into pdf.js.
#[wasm_bindgen]
pub struct DocumentViewer {
    document_proxy: Option<JsValue>,
    page_count: u32,
}

#[wasm_bindgen]
impl DocumentViewer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            document_proxy: None,
            page_count: 0,
        }
    }

    /// Hand the document bytes to pdf.js and record the page count.
    pub async fn load(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        let data = Uint8Array::new_with_length(bytes.len() as u32);
        data.copy_from(bytes);

        let proxy = load_document_internal(data).await;
        if proxy.is_undefined() || proxy.is_null() {
            return Err(JsValue::from_str("Failed to load PDF document"));
        }

        self.page_count = Reflect::get(&proxy, &JsValue::from_str("numPages"))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as u32;
        self.document_proxy = Some(proxy);

        Ok(())
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Render one page onto a canvas at the given zoom scale.
    #[wasm_bindgen(js_name = renderPage)]
    pub async fn render_page(
        &self,
        page_num: u32,
        canvas: HtmlCanvasElement,
        scale: f64,
    ) -> Result<(), JsValue> {
        if self.document_proxy.is_none() {
            return Err(JsValue::from_str("No document loaded"));
        }
        if page_num < 1 || page_num > self.page_count {
            return Err(JsValue::from_str(&format!(
                "Invalid page number: {} (document has {} pages)",
                page_num, self.page_count
            )));
        }

        render_page_internal(page_num, &canvas, scale).await;
        Ok(())
    }
}

impl Default for DocumentViewer {
    fn default() -> Self {
        Self::new()
    }
}
