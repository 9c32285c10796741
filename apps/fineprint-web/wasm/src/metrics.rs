//! Live aggregate metrics, polled independently of the audit session.
//!
//! Fetches once on start and then on a fixed period until stopped. A
//! failed poll keeps the previous snapshot; responses are applied
//! last-write-wins with no ordering guarantee, which is acceptable for
//! monotonic aggregates. Stopping clears the timer but does not abort an
//! in-flight request.

use std::cell::RefCell;
use std::rc::Rc;

use fineprint_types::{MetricsSnapshot, RawMetrics};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::ServiceConfig;
use crate::services::{window, MetricsClient};

pub const METRICS_POLL_MS: i32 = 5_000;

fn spawn_refresh(
    client: MetricsClient,
    raw: Rc<RefCell<RawMetrics>>,
    on_update: Option<js_sys::Function>,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let window = match web_sys::window() {
            Some(window) => window,
            None => return,
        };

        match client.fetch_metrics(&window).await {
            Ok(metrics) => {
                *raw.borrow_mut() = metrics;
                if let Some(callback) = &on_update {
                    let snapshot = raw.borrow().derive();
                    if let Ok(value) = serde_wasm_bindgen::to_value(&snapshot) {
                        let _ = callback.call1(&JsValue::NULL, &value);
                    }
                }
            }
            Err(e) => {
                // Non-critical telemetry: log and keep the prior snapshot.
                web_sys::console::warn_1(&e);
            }
        }
    });
}

#[wasm_bindgen]
pub struct MetricsPoller {
    client: MetricsClient,
    raw: Rc<RefCell<RawMetrics>>,
    interval_id: Option<i32>,
    tick: Option<Closure<dyn FnMut()>>,
    on_update: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl MetricsPoller {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &ServiceConfig) -> MetricsPoller {
        MetricsPoller {
            client: MetricsClient::new(config.metrics_url()),
            raw: Rc::new(RefCell::new(RawMetrics::default())),
            interval_id: None,
            tick: None,
            on_update: None,
        }
    }

    /// Callback invoked with the derived snapshot after each successful
    /// refresh.
    #[wasm_bindgen(js_name = setOnUpdate)]
    pub fn set_on_update(&mut self, callback: js_sys::Function) {
        self.on_update = Some(callback);
    }

    /// Fetch immediately, then on the default period.
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.start_with_period(METRICS_POLL_MS)
    }

    #[wasm_bindgen(js_name = startWithPeriod)]
    pub fn start_with_period(&mut self, period_ms: i32) -> Result<(), JsValue> {
        if self.interval_id.is_some() {
            return Ok(());
        }
        let window = window()?;

        spawn_refresh(self.client.clone(), Rc::clone(&self.raw), self.on_update.clone());

        let client = self.client.clone();
        let raw = Rc::clone(&self.raw);
        let on_update = self.on_update.clone();
        let tick = Closure::<dyn FnMut()>::new(move || {
            spawn_refresh(client.clone(), Rc::clone(&raw), on_update.clone());
        });

        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            period_ms,
        )?;
        self.interval_id = Some(id);
        self.tick = Some(tick);
        Ok(())
    }

    /// Clear the repeating timer. In-flight responses still land
    /// (last write wins); they are not aborted.
    pub fn stop(&mut self) {
        if let Some(id) = self.interval_id.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
        }
        self.tick = None;
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.interval_id.is_some()
    }

    /// The display snapshot, derived fresh from the raw aggregates on
    /// every call.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot: MetricsSnapshot = self.raw.borrow().derive();
        serde_wasm_bindgen::to_value(&snapshot)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize snapshot: {}", e)))
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.raw.borrow().derive())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize snapshot: {}", e)))
    }
}

impl Drop for MetricsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
