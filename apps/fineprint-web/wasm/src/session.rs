//! Audit session controller.
//!
//! Owns the active document, its analysis result, and the in-flight flag.
//! State transitions: IDLE -> UPLOADING -> READY, back to IDLE on reset.
//! Commits are epoch-guarded so a slow response from an abandoned upload
//! can never clobber a newer session.

use std::cell::RefCell;
use std::rc::Rc;

use base64::Engine as _;
use fineprint_types::{
    classify_upload, upload::PDF_MIME, AuditReport, DocumentHandle, RiskBand, UploadError,
};
use wasm_bindgen::prelude::*;

use crate::config::ServiceConfig;
use crate::services::{failure_detail, fetch_with_floor, read_json, window, AnalysisClient};

/// Minimum elapsed time for the UPLOADING phase. The analysis fetch and
/// this floor run concurrently; READY is gated on the later of the two.
pub const ANALYSIS_FLOOR_MS: i32 = 3_500;

/// Filename given to a service-generated composite document.
pub const GENERATED_DOC_NAME: &str = "scanned_contract.pdf";

/// Status line shown before the first rotation tick.
pub const STATUS_INITIAL: &str = "Initializing AI...";

const STATUS_ROTATION_MS: u64 = 800;
const STATUS_MESSAGES: [&str; 4] = [
    "Reading Document...",
    "Analyzing Clauses...",
    "Identifying Traps...",
    "Calculating Risk Score...",
];

/// Rotating status line for the analysis wait.
pub fn status_message_at(elapsed_ms: u64) -> &'static str {
    if elapsed_ms < STATUS_ROTATION_MS {
        return STATUS_INITIAL;
    }
    let tick = (elapsed_ms / STATUS_ROTATION_MS - 1) as usize;
    STATUS_MESSAGES[tick % STATUS_MESSAGES.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Uploading,
    Ready,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Uploading => "uploading",
            SessionPhase::Ready => "ready",
        }
    }
}

/// One file staged for analysis.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// The session state machine, free of browser types so every transition
/// is testable natively.
#[derive(Debug)]
pub struct SessionState {
    phase: SessionPhase,
    resume_phase: SessionPhase,
    document: Option<DocumentHandle>,
    report: Option<AuditReport>,
    epoch: u64,
    pending: Vec<StagedFile>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            resume_phase: SessionPhase::Idle,
            document: None,
            report: None,
            epoch: 0,
            pending: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_analyzing(&self) -> bool {
        self.phase == SessionPhase::Uploading
    }

    pub fn report(&self) -> Option<&AuditReport> {
        self.report.as_ref()
    }

    pub fn document(&self) -> Option<&DocumentHandle> {
        self.document.as_ref()
    }

    /// Stage a picked file. Rejected while an analysis is in flight.
    pub fn queue_file(&mut self, file: StagedFile) -> Result<(), String> {
        if self.is_analyzing() {
            return Err("analysis already in progress".to_string());
        }
        self.pending.push(file);
        Ok(())
    }

    pub fn take_staged(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.pending)
    }

    /// Enter UPLOADING and hand back the epoch token the eventual commit
    /// must present. The prior phase is remembered so a failed re-upload
    /// from READY restores the old pair untouched.
    pub fn begin_upload(&mut self) -> Result<u64, String> {
        if self.is_analyzing() {
            return Err("analysis already in progress".to_string());
        }
        self.resume_phase = self.phase;
        self.phase = SessionPhase::Uploading;
        self.epoch += 1;
        Ok(self.epoch)
    }

    /// Commit a successful analysis. Returns false (and changes nothing)
    /// when `epoch` is stale, i.e. the session was reset or re-entered
    /// since the request was issued.
    pub fn commit_success(
        &mut self,
        epoch: u64,
        report: AuditReport,
        document: DocumentHandle,
    ) -> bool {
        if epoch != self.epoch || self.phase != SessionPhase::Uploading {
            return false;
        }
        // The report must land before the document so no observer sees a
        // mounted viewer without overlays.
        self.report = Some(report);
        self.document = Some(document);
        self.phase = SessionPhase::Ready;
        true
    }

    /// Roll back a failed analysis, restoring the phase (and pair) that
    /// was live before the upload began. Stale epochs are ignored.
    pub fn commit_failure(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || self.phase != SessionPhase::Uploading {
            return false;
        }
        self.phase = self.resume_phase;
        true
    }

    /// Full reset: discard the pair and invalidate all in-flight commits.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.phase = SessionPhase::Idle;
        self.resume_phase = SessionPhase::Idle;
        self.document = None;
        self.report = None;
        self.pending.clear();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Choose the document to display: the service's generated artifact when
/// present, otherwise the first staged file.
pub fn resolve_document(
    report: &AuditReport,
    staged: &[StagedFile],
) -> Result<DocumentHandle, String> {
    if let Some(encoded) = &report.pdf_base64 {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| format!("invalid generated document: {}", e))?;
        return Ok(DocumentHandle::new(GENERATED_DOC_NAME, PDF_MIME, bytes));
    }

    staged
        .first()
        .map(|f| DocumentHandle::new(f.name.clone(), f.mime.clone(), f.bytes.clone()))
        .ok_or_else(|| "no uploaded file to display".to_string())
}

fn build_form_data(staged: &[StagedFile]) -> Result<web_sys::FormData, JsValue> {
    let form = web_sys::FormData::new()?;
    for file in staged {
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(file.bytes.as_slice()));

        let options = web_sys::BlobPropertyBag::new();
        options.set_type(&file.mime);
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

        form.append_with_blob_and_filename("file", &blob, &file.name)?;
    }
    Ok(form)
}

/// Browser-facing session controller. State lives behind `Rc<RefCell<_>>`
/// so the async analyze flow never holds a borrow across an await.
#[wasm_bindgen]
pub struct AuditSession {
    state: Rc<RefCell<SessionState>>,
    analysis: AnalysisClient,
}

#[wasm_bindgen]
impl AuditSession {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &ServiceConfig) -> AuditSession {
        console_error_panic_hook::set_once();
        AuditSession {
            state: Rc::new(RefCell::new(SessionState::new())),
            analysis: AnalysisClient::new(config.analyze_url()),
        }
    }

    /// Stage one picked file (name, MIME type, content).
    #[wasm_bindgen(js_name = queueFile)]
    pub fn queue_file(&self, name: &str, mime: &str, bytes: &[u8]) -> Result<(), JsValue> {
        self.state
            .borrow_mut()
            .queue_file(StagedFile {
                name: name.to_string(),
                mime: mime.to_string(),
                bytes: bytes.to_vec(),
            })
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Validate the staged set, submit it for analysis, and commit the
    /// result. Resolves to the report on success, or `null` when a reset
    /// or newer upload superseded this response.
    pub async fn analyze(&self) -> Result<JsValue, JsValue> {
        let staged = self.state.borrow_mut().take_staged();

        // Input validation happens before any network call; on rejection
        // the machine is untouched.
        let mimes: Vec<&str> = staged.iter().map(|f| f.mime.as_str()).collect();
        classify_upload(&mimes).map_err(|e: UploadError| JsValue::from_str(&e.to_string()))?;

        let epoch = self
            .state
            .borrow_mut()
            .begin_upload()
            .map_err(|e| JsValue::from_str(&e))?;

        let window = window()?;
        let form = build_form_data(&staged)?;
        let request = self.analysis.request(&form)?;

        let response = match fetch_with_floor(&window, &request, ANALYSIS_FLOOR_MS).await {
            Ok(response) => response,
            Err(e) => {
                self.state.borrow_mut().commit_failure(epoch);
                return Err(e);
            }
        };

        if !response.ok() {
            let notice = failure_detail(&response, "Analysis failed").await;
            self.state.borrow_mut().commit_failure(epoch);
            return Err(JsValue::from_str(&notice));
        }

        let report: AuditReport = match read_json(&response).await {
            Ok(report) => report,
            Err(e) => {
                self.state.borrow_mut().commit_failure(epoch);
                return Err(e);
            }
        };

        let document = match resolve_document(&report, &staged) {
            Ok(document) => document,
            Err(e) => {
                self.state.borrow_mut().commit_failure(epoch);
                return Err(JsValue::from_str(&e));
            }
        };

        if !self
            .state
            .borrow_mut()
            .commit_success(epoch, report.clone(), document)
        {
            return Ok(JsValue::NULL);
        }

        serde_wasm_bindgen::to_value(&report)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize report: {}", e)))
    }

    pub fn reset(&self) {
        self.state.borrow_mut().reset();
    }

    pub fn phase(&self) -> String {
        self.state.borrow().phase().as_str().to_string()
    }

    #[wasm_bindgen(js_name = isAnalyzing)]
    pub fn is_analyzing(&self) -> bool {
        self.state.borrow().is_analyzing()
    }

    #[wasm_bindgen(js_name = reportJson)]
    pub fn report_json(&self) -> Option<String> {
        self.state
            .borrow()
            .report()
            .and_then(|r| serde_json::to_string(r).ok())
    }

    #[wasm_bindgen(js_name = trapCount)]
    pub fn trap_count(&self) -> usize {
        self.state.borrow().report().map(|r| r.trap_count()).unwrap_or(0)
    }

    #[wasm_bindgen(js_name = overallScore)]
    pub fn overall_score(&self) -> Option<u8> {
        self.state.borrow().report().map(|r| r.overall_predatory_score)
    }

    /// Band label for the overall score, recomputed on every call.
    #[wasm_bindgen(js_name = riskLabel)]
    pub fn risk_label(&self) -> Option<String> {
        self.state
            .borrow()
            .report()
            .map(|r| RiskBand::from_score(r.overall_predatory_score).label().to_string())
    }

    #[wasm_bindgen(js_name = documentName)]
    pub fn document_name(&self) -> Option<String> {
        self.state.borrow().document().map(|d| d.filename.clone())
    }

    #[wasm_bindgen(js_name = documentBytes)]
    pub fn document_bytes(&self) -> Option<Vec<u8>> {
        self.state.borrow().document().map(|d| d.bytes.clone())
    }

    /// Rotating status line for the analysis wait.
    #[wasm_bindgen(js_name = statusMessage)]
    pub fn status_message(&self, elapsed_ms: f64) -> String {
        status_message_at(elapsed_ms.max(0.0) as u64).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fineprint_types::{Rect, RiskLevel, Trap};
    use pretty_assertions::assert_eq;

    fn report_with_trap(score: u8, text: &str) -> AuditReport {
        AuditReport {
            overall_predatory_score: score,
            detected_traps: vec![Trap {
                original_text: text.to_string(),
                risk_level: RiskLevel::Critical,
                category: "Hidden Fees".to_string(),
                plain_english_explanation: "explanation".to_string(),
                estimated_cost_impact: "High".to_string(),
                remediation: "push back".to_string(),
                coordinates: vec![Rect::new(10.0, 20.0, 100.0, 15.0)],
                pages: vec![1],
            }],
            filename: format!("{}.pdf", text),
            pdf_base64: None,
        }
    }

    fn staged_pdf(name: &str) -> StagedFile {
        StagedFile {
            name: name.to_string(),
            mime: PDF_MIME.to_string(),
            bytes: b"%PDF-1.7 stub".to_vec(),
        }
    }

    fn document_for(name: &str) -> DocumentHandle {
        DocumentHandle::new(name, PDF_MIME, b"%PDF-1.7 stub".to_vec())
    }

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let state = SessionState::new();
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(!state.is_analyzing());
        assert!(state.report().is_none());
        assert!(state.document().is_none());
    }

    #[test]
    fn test_upload_commit_reaches_ready() {
        let mut state = SessionState::new();
        let epoch = state.begin_upload().unwrap();
        assert!(state.is_analyzing());

        assert!(state.commit_success(epoch, report_with_trap(85, "a"), document_for("a")));
        assert_eq!(state.phase(), SessionPhase::Ready);
        assert_eq!(state.report().unwrap().overall_predatory_score, 85);
        assert_eq!(state.document().unwrap().filename, "a");
    }

    #[test]
    fn test_failure_from_idle_returns_to_idle() {
        let mut state = SessionState::new();
        let epoch = state.begin_upload().unwrap();
        assert!(state.commit_failure(epoch));
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(state.report().is_none());
        assert!(state.document().is_none());
    }

    #[test]
    fn test_failed_reupload_keeps_prior_pair() {
        let mut state = SessionState::new();
        let epoch = state.begin_upload().unwrap();
        state.commit_success(epoch, report_with_trap(40, "first"), document_for("first"));

        let epoch2 = state.begin_upload().unwrap();
        assert!(state.commit_failure(epoch2));
        assert_eq!(state.phase(), SessionPhase::Ready);
        assert_eq!(state.document().unwrap().filename, "first");
        assert_eq!(state.report().unwrap().detected_traps[0].original_text, "first");
    }

    #[test]
    fn test_successful_reupload_replaces_pair_wholesale() {
        let mut state = SessionState::new();
        let epoch = state.begin_upload().unwrap();
        state.commit_success(epoch, report_with_trap(40, "first"), document_for("first"));

        let epoch2 = state.begin_upload().unwrap();
        assert!(state.commit_success(epoch2, report_with_trap(90, "second"), document_for("second")));

        let report = state.report().unwrap();
        assert_eq!(report.detected_traps.len(), 1);
        assert!(report
            .detected_traps
            .iter()
            .all(|t| t.original_text == "second"));
        assert_eq!(state.document().unwrap().filename, "second");
    }

    #[test]
    fn test_stale_commit_after_reset_is_discarded() {
        let mut state = SessionState::new();
        let epoch = state.begin_upload().unwrap();
        state.reset();

        assert!(!state.commit_success(epoch, report_with_trap(85, "slow"), document_for("slow")));
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(state.report().is_none());
    }

    #[test]
    fn test_stale_commit_after_newer_upload_is_discarded() {
        let mut state = SessionState::new();
        let old_epoch = state.begin_upload().unwrap();
        state.commit_failure(old_epoch);

        let new_epoch = state.begin_upload().unwrap();
        // The abandoned upload resolves late; it must not win.
        assert!(!state.commit_success(old_epoch, report_with_trap(10, "old"), document_for("old")));
        assert!(state.is_analyzing());

        assert!(state.commit_success(new_epoch, report_with_trap(70, "new"), document_for("new")));
        assert_eq!(state.report().unwrap().detected_traps[0].original_text, "new");
    }

    #[test]
    fn test_begin_upload_rejected_while_uploading() {
        let mut state = SessionState::new();
        state.begin_upload().unwrap();
        assert!(state.begin_upload().is_err());
    }

    #[test]
    fn test_queue_rejected_while_uploading() {
        let mut state = SessionState::new();
        state.queue_file(staged_pdf("ok.pdf")).unwrap();
        state.begin_upload().unwrap();
        assert!(state.queue_file(staged_pdf("late.pdf")).is_err());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = SessionState::new();
        state.queue_file(staged_pdf("a.pdf")).unwrap();
        let epoch = state.begin_upload().unwrap();
        state.commit_success(epoch, report_with_trap(85, "a"), document_for("a"));

        state.reset();
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(state.report().is_none());
        assert!(state.document().is_none());
        assert!(state.take_staged().is_empty());
    }

    #[test]
    fn test_resolve_document_prefers_generated_artifact() {
        let mut report = report_with_trap(50, "scan");
        // "%PDF-" base64-encoded
        report.pdf_base64 = Some("JVBERi0=".to_string());

        let staged = vec![StagedFile {
            name: "photo.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8],
        }];

        let doc = resolve_document(&report, &staged).unwrap();
        assert_eq!(doc.filename, GENERATED_DOC_NAME);
        assert_eq!(doc.mime_type, PDF_MIME);
        assert_eq!(doc.bytes, b"%PDF-");
    }

    #[test]
    fn test_resolve_document_falls_back_to_upload() {
        let report = report_with_trap(50, "doc");
        let staged = vec![staged_pdf("original.pdf")];
        let doc = resolve_document(&report, &staged).unwrap();
        assert_eq!(doc.filename, "original.pdf");
    }

    #[test]
    fn test_resolve_document_rejects_bad_base64() {
        let mut report = report_with_trap(50, "scan");
        report.pdf_base64 = Some("not base64 !!!".to_string());
        assert!(resolve_document(&report, &[staged_pdf("a.pdf")]).is_err());
    }

    #[test]
    fn test_status_messages_rotate() {
        assert_eq!(status_message_at(0), STATUS_INITIAL);
        assert_eq!(status_message_at(799), STATUS_INITIAL);
        assert_eq!(status_message_at(800), "Reading Document...");
        assert_eq!(status_message_at(1_600), "Analyzing Clauses...");
        assert_eq!(status_message_at(2_400), "Identifying Traps...");
        assert_eq!(status_message_at(3_200), "Calculating Risk Score...");
        // Wraps around.
        assert_eq!(status_message_at(4_000), "Reading Document...");
    }
}
