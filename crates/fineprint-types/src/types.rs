/// A highlight region in unscaled, page-local units.
///
/// Serialized on the wire as a 4-element `[x, y, w, h]` array.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Width over height; NaN for a zero-height rect.
    pub fn aspect_ratio(&self) -> f64 {
        self.w / self.h
    }
}

impl From<[f64; 4]> for Rect {
    fn from([x, y, w, h]: [f64; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x, r.y, r.w, r.h]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Critical,
    Caution,
    Info,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::Caution => "CAUTION",
            RiskLevel::Info => "INFO",
        }
    }

    /// Accent color used for the trap list dot and badge.
    pub fn accent(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "#ef4444",
            RiskLevel::Caution => "#f59e0b",
            RiskLevel::Info => "#3b82f6",
        }
    }
}

/// One detected problematic clause, immutable once received.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Trap {
    pub original_text: String,
    pub risk_level: RiskLevel,
    pub category: String,
    pub plain_english_explanation: String,
    pub estimated_cost_impact: String,
    pub remediation: String,
    pub coordinates: Vec<Rect>, // [[x, y, w, h], ...]
    pub pages: Vec<u32>,
}

impl Trap {
    /// Exact page-number membership; never index proximity.
    pub fn appears_on(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    /// The page the tooltip is pinned to: the lowest page this trap
    /// appears on. `None` for a trap with no page anchors.
    pub fn home_page(&self) -> Option<u32> {
        self.pages.iter().copied().min()
    }

    /// Anchor rectangle for the tooltip.
    pub fn anchor_rect(&self) -> Option<&Rect> {
        self.coordinates.first()
    }
}

/// Complete analysis response. Created atomically and replaced wholesale;
/// never merged with a prior result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuditReport {
    pub overall_predatory_score: u8, // 0-100
    pub detected_traps: Vec<Trap>,
    pub filename: String,
    /// Generated composite document (e.g. photos assembled into one PDF),
    /// to be rendered instead of the original upload when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
}

impl AuditReport {
    pub fn trap_count(&self) -> usize {
        self.detected_traps.len()
    }
}

/// Generated opt-out script for one trap.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NegotiationScript {
    pub subject_line: String,
    pub email_body: String,
}

impl NegotiationScript {
    /// Full text for the copy-everything action.
    pub fn clipboard_text(&self) -> String {
        format!("{}\n\n{}", self.subject_line, self.email_body)
    }
}

/// The active document: opaque bytes plus naming metadata. Owned by the
/// session controller, replaced wholesale on a new upload.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentHandle {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}
