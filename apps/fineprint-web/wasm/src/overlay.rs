//! Spatial overlay state and rendering.
//!
//! One hover pointer serves the whole document: entering any rectangle of
//! a trap claims it and suppresses every other tooltip, so at most one
//! tooltip is visible at any instant. Pointer-leave transitions carry the
//! destination the DOM reports (`relatedTarget`), so moving from a
//! rectangle into its own tooltip never drops the hover.
//!
//! The DOM layer rebuilds a page's overlay from the view models on every
//! state change; screen coordinates are never cached across a scale
//! change. Host-side glue attaches pointer listeners using the
//! `data-trap-index` attributes and forwards enter/leave into
//! [`OverlayRenderer`].

use fineprint_types::{AuditReport, Trap};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::coords::{scale_rect, traps_on_page, ScreenRect};

/// Default zoom applied before the host adjusts it.
pub const DEFAULT_SCALE: f64 = 1.2;

/// One highlight region, ready to draw.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HighlightView {
    pub trap_index: usize,
    pub rect: ScreenRect,
    pub emphasized: bool,
}

/// The single tooltip, ready to draw.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TooltipView {
    pub trap_index: usize,
    pub anchor: ScreenRect,
    pub category: String,
    pub risk_label: String,
    pub risk_accent: String,
    pub explanation: String,
    pub remediation: String,
}

/// Hover and geometry state, free of browser types.
#[derive(Debug)]
pub struct OverlayState {
    traps: Vec<Trap>,
    scale: f64,
    hovered: Option<usize>,
}

impl OverlayState {
    pub fn new() -> Self {
        Self {
            traps: Vec::new(),
            scale: DEFAULT_SCALE,
            hovered: None,
        }
    }

    /// Replace all traps wholesale from a fresh analysis. Any hover from
    /// the prior result is meaningless and dropped.
    pub fn set_report(&mut self, report: &AuditReport) {
        self.traps = report.detected_traps.clone();
        self.hovered = None;
    }

    pub fn clear(&mut self) {
        self.traps.clear();
        self.hovered = None;
    }

    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<(), String> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(format!("scale must be a positive number, got {}", scale));
        }
        self.scale = scale;
        Ok(())
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn enter_rect(&mut self, trap_index: usize) {
        if trap_index < self.traps.len() {
            self.hovered = Some(trap_index);
        }
    }

    /// `into_tooltip` is whether the pointer moved into this trap's own
    /// tooltip, per the event's `relatedTarget`.
    pub fn leave_rect(&mut self, trap_index: usize, into_tooltip: bool) {
        if self.hovered == Some(trap_index) && !into_tooltip {
            self.hovered = None;
        }
    }

    /// Keeps the tooltip open while the cursor sits on it.
    pub fn enter_tooltip(&mut self, trap_index: usize) {
        if trap_index < self.traps.len() {
            self.hovered = Some(trap_index);
        }
    }

    pub fn leave_tooltip(&mut self, trap_index: usize, into_own_rect: bool) {
        if self.hovered == Some(trap_index) && !into_own_rect {
            self.hovered = None;
        }
    }

    /// Every rectangle of every trap appearing on `page`, scaled to the
    /// current zoom.
    pub fn highlights_for_page(&self, page: u32) -> Vec<HighlightView> {
        let mut views = Vec::new();
        for (index, trap) in traps_on_page(&self.traps, page) {
            let emphasized = self.hovered == Some(index);
            for rect in &trap.coordinates {
                views.push(HighlightView {
                    trap_index: index,
                    rect: scale_rect(rect, self.scale),
                    emphasized,
                });
            }
        }
        views
    }

    /// The tooltip for `page`, if the hovered trap is pinned there.
    ///
    /// A multi-page trap anchors its tooltip on its home page only, so at
    /// most one tooltip exists across the whole document.
    pub fn tooltip_for_page(&self, page: u32) -> Option<TooltipView> {
        let index = self.hovered?;
        let trap = self.traps.get(index)?;
        if trap.home_page() != Some(page) {
            return None;
        }
        let anchor = trap.anchor_rect()?;
        Some(TooltipView {
            trap_index: index,
            anchor: scale_rect(anchor, self.scale),
            category: trap.category.clone(),
            risk_label: trap.risk_level.label().to_string(),
            risk_accent: trap.risk_level.accent().to_string(),
            explanation: trap.plain_english_explanation.clone(),
            remediation: trap.remediation.clone(),
        })
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new()
    }
}

/// DOM builder for overlay layers.
struct OverlayDom {
    document: Document,
}

impl OverlayDom {
    fn new() -> Result<Self, JsValue> {
        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object available"))?;
        Ok(Self { document })
    }

    /// The per-page layer stacked over the rendered canvas.
    fn create_layer(&self, page: u32) -> Result<Element, JsValue> {
        let layer = self.document.create_element("div")?;
        layer.set_class_name("overlay-layer");
        layer.set_id(&format!("overlay-page-{}", page));

        if let Some(el) = layer.dyn_ref::<HtmlElement>() {
            let style = el.style();
            style.set_property("position", "absolute")?;
            style.set_property("inset", "0")?;
            style.set_property("pointer-events", "none")?;
        }

        Ok(layer)
    }

    fn render_page(&self, state: &OverlayState, page: u32, layer: &Element) -> Result<(), JsValue> {
        layer.set_inner_html("");
        for view in state.highlights_for_page(page) {
            layer.append_child(&self.highlight_div(&view)?.into())?;
        }
        if let Some(tooltip) = state.tooltip_for_page(page) {
            layer.append_child(&self.tooltip_div(&tooltip)?.into())?;
        }
        Ok(())
    }

    fn highlight_div(&self, view: &HighlightView) -> Result<Element, JsValue> {
        let div = self.document.create_element("div")?;
        div.set_class_name(if view.emphasized {
            "trap-highlight trap-highlight-active"
        } else {
            "trap-highlight"
        });
        div.set_attribute("data-trap-index", &view.trap_index.to_string())?;

        if let Some(el) = div.dyn_ref::<HtmlElement>() {
            let style = el.style();
            style.set_property("position", "absolute")?;
            style.set_property("left", &format!("{}px", view.rect.left))?;
            style.set_property("top", &format!("{}px", view.rect.top))?;
            style.set_property("width", &format!("{}px", view.rect.width))?;
            style.set_property("height", &format!("{}px", view.rect.height))?;
            style.set_property("pointer-events", "auto")?;
            style.set_property("cursor", "help")?;
            style.set_property("border", "2px solid rgba(239, 68, 68, 0.5)")?;
            let fill = if view.emphasized {
                "rgba(239, 68, 68, 0.4)"
            } else {
                "rgba(239, 68, 68, 0.2)"
            };
            style.set_property("background-color", fill)?;
        }

        Ok(div)
    }

    fn tooltip_div(&self, view: &TooltipView) -> Result<Element, JsValue> {
        let tooltip = self.document.create_element("div")?;
        tooltip.set_class_name("trap-tooltip");
        tooltip.set_attribute("data-trap-index", &view.trap_index.to_string())?;

        if let Some(el) = tooltip.dyn_ref::<HtmlElement>() {
            let style = el.style();
            style.set_property("position", "absolute")?;
            style.set_property("left", &format!("{}px", view.anchor.left))?;
            style.set_property("top", &format!("{}px", view.anchor.top))?;
            // Sits above the anchor, nudged toward center.
            style.set_property("transform", "translateY(-105%) translateX(-10%)")?;
            style.set_property("pointer-events", "auto")?;
            style.set_property("z-index", "50")?;
        }

        let category = self.document.create_element("p")?;
        category.set_class_name("trap-tooltip-category");
        category.set_text_content(Some(&view.category));
        tooltip.append_child(&category)?;

        let badge = self.document.create_element("span")?;
        badge.set_class_name("trap-tooltip-risk");
        badge.set_text_content(Some(&view.risk_label));
        if let Some(el) = badge.dyn_ref::<HtmlElement>() {
            el.style().set_property("color", &view.risk_accent)?;
        }
        tooltip.append_child(&badge)?;

        let explanation = self.document.create_element("p")?;
        explanation.set_class_name("trap-tooltip-explanation");
        explanation.set_text_content(Some(&view.explanation));
        tooltip.append_child(&explanation)?;

        let remediation = self.document.create_element("p")?;
        remediation.set_class_name("trap-tooltip-remediation");
        remediation.set_text_content(Some(&format!("To Fix: {}", view.remediation)));
        tooltip.append_child(&remediation)?;

        // Clicking this keeps the tooltip open; the host wires it to the
        // negotiation coordinator and flips the row into "generating".
        let negotiate = self.document.create_element("button")?;
        negotiate.set_class_name("trap-tooltip-negotiate");
        negotiate.set_attribute("data-trap-index", &view.trap_index.to_string())?;
        negotiate.set_text_content(Some("Draft opt-out email"));
        tooltip.append_child(&negotiate)?;

        Ok(tooltip)
    }
}

/// Browser-facing overlay renderer: hover state plus DOM construction.
#[wasm_bindgen]
pub struct OverlayRenderer {
    state: OverlayState,
    dom: OverlayDom,
}

#[wasm_bindgen]
impl OverlayRenderer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<OverlayRenderer, JsValue> {
        Ok(OverlayRenderer {
            state: OverlayState::new(),
            dom: OverlayDom::new()?,
        })
    }

    /// Replace all traps wholesale from a fresh analysis report.
    #[wasm_bindgen(js_name = setReport)]
    pub fn set_report(&mut self, report: JsValue) -> Result<(), JsValue> {
        let report: AuditReport = serde_wasm_bindgen::from_value(report)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse report: {}", e)))?;
        self.state.set_report(&report);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }

    #[wasm_bindgen(js_name = setScale)]
    pub fn set_scale(&mut self, scale: f64) -> Result<(), JsValue> {
        self.state.set_scale(scale).map_err(|e| JsValue::from_str(&e))
    }

    pub fn scale(&self) -> f64 {
        self.state.scale()
    }

    #[wasm_bindgen(js_name = enterRect)]
    pub fn enter_rect(&mut self, trap_index: usize) {
        self.state.enter_rect(trap_index);
    }

    #[wasm_bindgen(js_name = leaveRect)]
    pub fn leave_rect(&mut self, trap_index: usize, into_tooltip: bool) {
        self.state.leave_rect(trap_index, into_tooltip);
    }

    #[wasm_bindgen(js_name = enterTooltip)]
    pub fn enter_tooltip(&mut self, trap_index: usize) {
        self.state.enter_tooltip(trap_index);
    }

    #[wasm_bindgen(js_name = leaveTooltip)]
    pub fn leave_tooltip(&mut self, trap_index: usize, into_own_rect: bool) {
        self.state.leave_tooltip(trap_index, into_own_rect);
    }

    #[wasm_bindgen(js_name = hoveredTrap)]
    pub fn hovered_trap(&self) -> Option<usize> {
        self.state.hovered()
    }

    /// Create the overlay layer element for one page.
    #[wasm_bindgen(js_name = createLayer)]
    pub fn create_layer(&self, page: u32) -> Result<Element, JsValue> {
        self.dom.create_layer(page)
    }

    /// Rebuild one page's overlay contents from current state.
    #[wasm_bindgen(js_name = renderPage)]
    pub fn render_page(&self, page: u32, layer: &Element) -> Result<(), JsValue> {
        self.dom.render_page(&self.state, page, layer)
    }

    /// View models for hosts that draw their own highlights.
    #[wasm_bindgen(js_name = highlightsForPage)]
    pub fn highlights_for_page(&self, page: u32) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.state.highlights_for_page(page))
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize highlights: {}", e)))
    }

    #[wasm_bindgen(js_name = tooltipForPage)]
    pub fn tooltip_for_page(&self, page: u32) -> Result<JsValue, JsValue> {
        match self.state.tooltip_for_page(page) {
            Some(tooltip) => serde_wasm_bindgen::to_value(&tooltip)
                .map_err(|e| JsValue::from_str(&format!("Failed to serialize tooltip: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }
}


// WASM-specific tests that run in a browser environment
#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use fineprint_types::{Rect, RiskLevel};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_create_layer() {
        let dom = OverlayDom::new().unwrap();
        let layer = dom.create_layer(1).unwrap();
        assert_eq!(layer.id(), "overlay-page-1");
        assert_eq!(layer.class_name(), "overlay-layer");
    }

    #[wasm_bindgen_test]
    fn test_render_page_builds_highlights_and_tooltip() {
        let dom = OverlayDom::new().unwrap();
        let mut state = OverlayState::new();
        state.set_report(&AuditReport {
            overall_predatory_score: 85,
            detected_traps: vec![Trap {
                original_text: "clause".to_string(),
                risk_level: RiskLevel::Critical,
                category: "Hidden Fees".to_string(),
                plain_english_explanation: "explanation".to_string(),
                estimated_cost_impact: "High".to_string(),
                remediation: "fix".to_string(),
                coordinates: vec![Rect::new(10.0, 20.0, 100.0, 15.0)],
                pages: vec![1],
            }],
            filename: "contract.pdf".to_string(),
            pdf_base64: None,
        });
        state.enter_rect(0);

        let layer = dom.create_layer(1).unwrap();
        dom.render_page(&state, 1, &layer).unwrap();

        assert_eq!(layer.query_selector_all(".trap-highlight").unwrap().length(), 1);
        assert_eq!(layer.query_selector_all(".trap-tooltip").unwrap().length(), 1);
    }
}
