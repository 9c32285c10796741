//! Score banding for the overall predatory score.
//!
//! A total function from score to band, evaluated fresh on every render.

/// Band breakpoints: scores below 20 are safe, below 50 moderate,
/// below 80 predatory, 80 and up extreme.
pub const MODERATE_FLOOR: u8 = 20;
pub const PREDATORY_FLOOR: u8 = 50;
pub const EXTREME_FLOOR: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    Safe,
    Moderate,
    Predatory,
    Extreme,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        if score >= EXTREME_FLOOR {
            RiskBand::Extreme
        } else if score >= PREDATORY_FLOOR {
            RiskBand::Predatory
        } else if score >= MODERATE_FLOOR {
            RiskBand::Moderate
        } else {
            RiskBand::Safe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Safe => "SAFE",
            RiskBand::Moderate => "MODERATE",
            RiskBand::Predatory => "PREDATORY",
            RiskBand::Extreme => "EXTREME DANGER",
        }
    }

    /// Accent color for the score readout.
    pub fn accent(&self) -> &'static str {
        match self {
            RiskBand::Safe => "#10b981",
            RiskBand::Moderate => "#f59e0b",
            RiskBand::Predatory => "#ef4444",
            RiskBand::Extreme => "#dc2626",
        }
    }
}
