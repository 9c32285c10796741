// Export modules
pub mod config;
pub mod coords;
pub mod metrics;
pub mod negotiation;
pub mod overlay;
pub mod pdf_pages;
pub mod services;
pub mod session;
pub mod viewer;

// Re-export commonly used items
pub use config::ServiceConfig;
pub use coords::{scale_rect, traps_on_page, ScreenRect};
pub use metrics::{MetricsPoller, METRICS_POLL_MS};
pub use negotiation::{CoordinatorState, NegotiationCoordinator};
pub use overlay::{HighlightView, OverlayRenderer, OverlayState, TooltipView};
pub use pdf_pages::{PageDirectory, PageExtent};
pub use session::{
    status_message_at, AuditSession, SessionPhase, SessionState, StagedFile, ANALYSIS_FLOOR_MS,
};
pub use viewer::DocumentViewer;
