use crate::app::{IntegrityReport, RecordView, RecordWrite};
use crate::domain::directory::{Subject, SubjectPage, SubjectProfile};
use crate::domain::payload::PdfDocument;
use crate::domain::registry::Credential;
use crate::transport::http::handlers::{diagnostics, health, ipfs, records, students};
use crate::transport::http::types::{
    AddressRequest, ApiResponse, AppState, IssueRecordRequest, RevokeRecordRequest,
    StudentRequest, UpdateRecordRequest, VerifyRecordRequest,
};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Headroom over the document limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        students::register_handler,
        students::update_handler,
        students::deactivate_handler,
        students::reactivate_handler,
        students::add_admin_handler,
        students::get_student_handler,
        students::is_registered_handler,
        students::list_students_handler,
        students::count_handler,
        students::list_range_handler,
        records::issue_handler,
        records::update_handler,
        records::revoke_handler,
        records::add_admin_handler,
        records::count_handler,
        records::get_record_handler,
        records::integrity_handler,
        records::verify_handler,
        ipfs::upload_json_handler,
        ipfs::upload_file_handler,
        ipfs::file_handler,
        ipfs::retrieve_handler,
        diagnostics::ledger_diagnostics_handler,
        diagnostics::ipfs_diagnostics_handler
    ),
    components(schemas(
        ApiResponse,
        StudentRequest,
        AddressRequest,
        IssueRecordRequest,
        UpdateRecordRequest,
        RevokeRecordRequest,
        VerifyRecordRequest,
        Subject,
        SubjectPage,
        SubjectProfile,
        Credential,
        PdfDocument,
        RecordWrite,
        RecordView,
        IntegrityReport
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    let body_limit = app_state.max_upload_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/students/register", post(students::register_handler))
        .route("/students/update", put(students::update_handler))
        .route("/students/deactivate", put(students::deactivate_handler))
        .route("/students/reactivate", put(students::reactivate_handler))
        .route("/students/admins", post(students::add_admin_handler))
        .route("/students/student/:address", get(students::get_student_handler))
        .route("/students/isRegistered/:address", get(students::is_registered_handler))
        .route("/students/all", get(students::list_students_handler))
        .route("/students/count", get(students::count_handler))
        .route("/students/range", get(students::list_range_handler))
        .route("/records/issue", post(records::issue_handler))
        .route("/records/update", put(records::update_handler))
        .route("/records/revoke", put(records::revoke_handler))
        .route("/records/admins", post(records::add_admin_handler))
        .route("/records/verify", post(records::verify_handler))
        .route("/records/:address/count", get(records::count_handler))
        .route("/records/:address/:index", get(records::get_record_handler))
        .route("/records/:address/:index/integrity", get(records::integrity_handler))
        .route("/ipfs/upload", post(ipfs::upload_json_handler))
        .route("/ipfs/upload-file", post(ipfs::upload_file_handler))
        .route("/ipfs/file/:hash", get(ipfs::file_handler))
        .route("/ipfs/retrieve/:hash", get(ipfs::retrieve_handler))
        .route("/diagnostics/ledger", get(diagnostics::ledger_diagnostics_handler))
        .route("/diagnostics/ipfs", get(diagnostics::ipfs_diagnostics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
