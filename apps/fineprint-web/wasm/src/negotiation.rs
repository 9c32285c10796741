//! Negotiation request coordination.
//!
//! At most one negotiation request may be outstanding. A trigger while one
//! is pending is a quiet no-op (the caller is expected to have disabled
//! the control), so rapid double-activation can never issue two requests
//! or display the wrong trap's script.

use std::cell::RefCell;
use std::rc::Rc;

use fineprint_types::{NegotiationScript, Trap};
use wasm_bindgen::prelude::*;

use crate::config::ServiceConfig;
use crate::services::{window, NegotiationClient};

/// Single-flight state, free of browser types.
#[derive(Debug, Default)]
pub struct CoordinatorState {
    active_trap: Option<usize>,
    in_flight: bool,
    script: Option<NegotiationScript>,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single flight slot for `index`. Returns false without
    /// side effects when a request is already pending.
    pub fn try_begin(&mut self, index: usize) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.active_trap = Some(index);
        true
    }

    pub fn finish_success(&mut self, script: NegotiationScript) {
        self.script = Some(script);
        self.in_flight = false;
        self.active_trap = None;
    }

    /// Failure leaves no partial result behind.
    pub fn finish_failure(&mut self) {
        self.script = None;
        self.in_flight = false;
        self.active_trap = None;
    }

    /// Close the script display.
    pub fn dismiss(&mut self) {
        self.script = None;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn active_trap(&self) -> Option<usize> {
        self.active_trap
    }

    /// Whether trap `index` should show its "generating" visual state.
    pub fn is_generating(&self, index: usize) -> bool {
        self.in_flight && self.active_trap == Some(index)
    }

    pub fn script(&self) -> Option<&NegotiationScript> {
        self.script.as_ref()
    }
}

/// Browser-facing coordinator. State sits behind `Rc<RefCell<_>>` so a
/// re-entrant trigger during the awaited request hits the guard instead of
/// a borrow panic.
#[wasm_bindgen]
pub struct NegotiationCoordinator {
    state: Rc<RefCell<CoordinatorState>>,
    client: NegotiationClient,
}

#[wasm_bindgen]
impl NegotiationCoordinator {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &ServiceConfig) -> NegotiationCoordinator {
        NegotiationCoordinator {
            state: Rc::new(RefCell::new(CoordinatorState::new())),
            client: NegotiationClient::new(config.negotiate_url()),
        }
    }

    /// Request a negotiation script for the trap at `index`.
    ///
    /// Resolves to the script object on success, or `null` when another
    /// request already holds the flight slot.
    #[wasm_bindgen(js_name = requestNegotiation)]
    pub async fn request_negotiation(&self, trap: JsValue, index: usize) -> Result<JsValue, JsValue> {
        let trap: Trap = serde_wasm_bindgen::from_value(trap)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse trap: {}", e)))?;

        if !self.state.borrow_mut().try_begin(index) {
            return Ok(JsValue::NULL);
        }

        let window = window()?;
        match self.client.generate(&window, &trap).await {
            Ok(script) => {
                self.state.borrow_mut().finish_success(script.clone());
                serde_wasm_bindgen::to_value(&script)
                    .map_err(|e| JsValue::from_str(&format!("Failed to serialize script: {}", e)))
            }
            Err(e) => {
                self.state.borrow_mut().finish_failure();
                Err(e)
            }
        }
    }

    #[wasm_bindgen(js_name = isInFlight)]
    pub fn is_in_flight(&self) -> bool {
        self.state.borrow().in_flight()
    }

    #[wasm_bindgen(js_name = activeTrapIndex)]
    pub fn active_trap_index(&self) -> Option<usize> {
        self.state.borrow().active_trap()
    }

    /// Whether trap `index` should render its "generating" state.
    #[wasm_bindgen(js_name = isGenerating)]
    pub fn is_generating(&self, index: usize) -> bool {
        self.state.borrow().is_generating(index)
    }

    /// The stored script as JSON, if the modal should be open.
    #[wasm_bindgen(js_name = scriptJson)]
    pub fn script_json(&self) -> Option<String> {
        self.state
            .borrow()
            .script()
            .and_then(|s| serde_json::to_string(s).ok())
    }

    /// Full subject + body text for the copy-everything action.
    #[wasm_bindgen(js_name = clipboardText)]
    pub fn clipboard_text(&self) -> Option<String> {
        self.state.borrow().script().map(|s| s.clipboard_text())
    }

    /// Close the script display.
    pub fn dismiss(&self) {
        self.state.borrow_mut().dismiss();
    }
}
