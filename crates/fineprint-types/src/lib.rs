pub mod metrics;
pub mod risk;
pub mod types;
pub mod upload;

pub use metrics::{Grade, MetricsSnapshot, RawMetrics};
pub use risk::RiskBand;
pub use types::{AuditReport, DocumentHandle, NegotiationScript, Rect, RiskLevel, Trap};
pub use upload::{classify_upload, UploadError, UploadKind};
