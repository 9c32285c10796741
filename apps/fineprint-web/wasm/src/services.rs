//! HTTP clients for the analysis, negotiation, and metrics services.
//!
//! Each client is constructed with its endpoint URL from [`ServiceConfig`]
//! and owns the full request/response cycle for that service. No client
//! retries: every retry is user-initiated.

use fineprint_types::{NegotiationScript, RawMetrics, Trap};
use js_sys::{Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, RequestMode, Response, Window};

pub(crate) fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))
}

/// A promise that resolves after `ms` milliseconds.
pub fn delay_promise(window: &Window, ms: i32) -> Promise {
    let window = window.clone();
    Promise::new(&mut move |resolve, _reject| {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
    })
}

/// Issue `request` but gate resolution on a minimum elapsed-time floor.
///
/// The timer and the fetch run concurrently; the returned future resolves
/// at the later of the two, never their sum. Rejection is immediate: the
/// floor paces success, not failure.
pub async fn fetch_with_floor(
    window: &Window,
    request: &Request,
    floor_ms: i32,
) -> Result<Response, JsValue> {
    let paced = Array::new();
    paced.push(&delay_promise(window, floor_ms));
    paced.push(&window.fetch_with_request(request));

    let settled: Array = JsFuture::from(Promise::all(&paced)).await?.dyn_into()?;
    settled
        .get(1)
        .dyn_into::<Response>()
        .map_err(|_| JsValue::from_str("fetch did not yield a Response"))
}

async fn fetch(window: &Window, request: &Request) -> Result<Response, JsValue> {
    JsFuture::from(window.fetch_with_request(request))
        .await?
        .dyn_into::<Response>()
        .map_err(|_| JsValue::from_str("fetch did not yield a Response"))
}

/// Read and deserialize a JSON response body.
pub async fn read_json<T: serde::de::DeserializeOwned>(response: &Response) -> Result<T, JsValue> {
    let body = JsFuture::from(response.text()?).await?;
    let body = body
        .as_string()
        .ok_or_else(|| JsValue::from_str("response body was not text"))?;
    serde_json::from_str(&body)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse response: {}", e)))
}

/// Failure notice for a non-success response, preferring the service's
/// `detail` field when the body carries one.
pub async fn failure_detail(response: &Response, fallback: &str) -> String {
    let body = match response.text() {
        Ok(promise) => JsFuture::from(promise).await.ok().and_then(|v| v.as_string()),
        Err(_) => None,
    };

    body.and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|v| {
            v.get("detail")
                .and_then(|d| d.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("{} (status {})", fallback, response.status()))
}

/// Client for the document analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    url: String,
}

impl AnalysisClient {
    pub fn new(url: String) -> Self {
        Self { url }
    }

    /// Build the multipart submission. The Content-Type header is left to
    /// the browser so it can set the multipart boundary.
    pub fn request(&self, form: &FormData) -> Result<Request, JsValue> {
        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        let body: &JsValue = form.as_ref();
        opts.set_body(body);
        Request::new_with_str_and_init(&self.url, &opts)
    }
}

/// Client for the negotiation script service.
#[derive(Debug, Clone)]
pub struct NegotiationClient {
    url: String,
}

impl NegotiationClient {
    pub fn new(url: String) -> Self {
        Self { url }
    }

    pub async fn generate(
        &self,
        window: &Window,
        trap: &Trap,
    ) -> Result<NegotiationScript, JsValue> {
        let body = serde_json::json!({
            "trap_text": trap.original_text,
            "category": trap.category,
            "explanation": trap.plain_english_explanation,
        });

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&JsValue::from_str(&body.to_string()));

        let request = Request::new_with_str_and_init(&self.url, &opts)?;
        request.headers().set("Content-Type", "application/json")?;

        let response = fetch(window, &request).await?;
        if !response.ok() {
            let notice = failure_detail(&response, "Negotiation failed").await;
            return Err(JsValue::from_str(&notice));
        }

        read_json(&response).await
    }
}

/// Client for the aggregate metrics service.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    url: String,
}

impl MetricsClient {
    pub fn new(url: String) -> Self {
        Self { url }
    }

    pub async fn fetch_metrics(&self, window: &Window) -> Result<RawMetrics, JsValue> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(&self.url, &opts)?;
        let response = fetch(window, &request).await?;
        if !response.ok() {
            let notice = failure_detail(&response, "Metrics fetch failed").await;
            return Err(JsValue::from_str(&notice));
        }

        read_json(&response).await
    }
}
