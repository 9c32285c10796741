//! Service endpoint configuration.
//!
//! Built once from the API base URL and handed to each service client at
//! construction time; no call site reads a URL on its own.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    analyze_url: String,
    negotiate_url: String,
    metrics_url: String,
}

#[wasm_bindgen]
impl ServiceConfig {
    /// Derive all endpoints from one base URL, e.g. `http://localhost:8005`.
    #[wasm_bindgen(constructor)]
    pub fn from_base(api_base: &str) -> ServiceConfig {
        let base = api_base.trim_end_matches('/');
        ServiceConfig {
            analyze_url: format!("{}/analyze", base),
            negotiate_url: format!("{}/negotiate", base),
            metrics_url: format!("{}/stats", base),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn analyze_url(&self) -> String {
        self.analyze_url.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn negotiate_url(&self) -> String {
        self.negotiate_url.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn metrics_url(&self) -> String {
        self.metrics_url.clone()
    }
}
