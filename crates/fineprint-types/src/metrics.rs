//! Aggregate service metrics and their display derivation.
//!
//! The poller stores only the raw wire snapshot; everything shown to the
//! user is recomputed from it on every read so raw and derived values
//! cannot drift apart.

/// Optimistic placeholders shown before any request has been recorded.
pub const DEFAULT_SAFETY_SCORE: f64 = 98.4;
pub const DEFAULT_ACCURACY: f64 = 99.2;

/// Raw aggregates as returned by the metrics service.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawMetrics {
    pub total_clauses: u64,
    pub avg_latency: f64,
    pub total_requests: u64,
    pub total_predatory_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_score: Option<f64>,
}

impl RawMetrics {
    /// Average safety score across all audited documents, clamped to
    /// [0, 100]. Falls back to the optimistic default until at least one
    /// request has been recorded.
    pub fn safety_score(&self) -> f64 {
        if self.total_requests == 0 {
            return DEFAULT_SAFETY_SCORE;
        }
        let avg_predatory = self.total_predatory_score / self.total_requests as f64;
        (100.0 - avg_predatory).clamp(0.0, 100.0)
    }

    pub fn derive(&self) -> MetricsSnapshot {
        let safety = self.safety_score();
        MetricsSnapshot {
            total_clauses_analyzed: self.total_clauses,
            avg_latency_ms: self.avg_latency,
            avg_safety_score: safety,
            accuracy: self.accuracy_score.unwrap_or(DEFAULT_ACCURACY),
            grade: Grade::from_score(safety),
        }
    }
}

/// Letter grade for a safety score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C")]
    C,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 97.0 {
            Grade::APlus
        } else if score >= 93.0 {
            Grade::A
        } else if score >= 90.0 {
            Grade::AMinus
        } else if score >= 87.0 {
            Grade::BPlus
        } else if score >= 83.0 {
            Grade::B
        } else if score >= 80.0 {
            Grade::BMinus
        } else {
            Grade::C
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::C => "C",
        }
    }
}

/// Display-ready metrics, derived fresh from [`RawMetrics`] on every read.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_clauses_analyzed: u64,
    pub avg_latency_ms: f64,
    pub avg_safety_score: f64,
    pub accuracy: f64,
    pub grade: Grade,
}
