#![cfg(not(tarpaulin_include))]

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::downloader;
use crate::error::GradeError;
use crate::grade::Grade;
use crate::loader;
use crate::state::{Action, AppState as Session, SourceFile, update};
use crate::stats::{SheetStats, StudentFilter};
use crate::student::{QuestionSlot, Student};

pub struct AppState {
    session: Mutex<Session>,
    pass_mark: f64,
}

impl AppState {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `action` through the reducer and keep the result.
    fn dispatch(&self, action: Action) -> Result<(), GradeError> {
        let mut session = self.session();
        *session = update(&session, action)?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct GradeUpdate {
    student_id: Uuid,
    question: String,
    grade: String,
}

#[derive(Deserialize)]
struct StudentQuery {
    search: Option<String>,
    discrepancies: Option<bool>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct SheetSummary {
    name: String,
    students: usize,
}

#[derive(Serialize)]
struct UploadResponse {
    status: String,
    filename: String,
    sheets: Vec<SheetSummary>,
}

struct ApiError(GradeError);

impl From<GradeError> for ApiError {
    fn from(e: GradeError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GradeError::Ingest { .. }
            | GradeError::UnknownQuestion(_)
            | GradeError::UnknownGrade(_) => StatusCode::BAD_REQUEST,
            GradeError::NoWorkbook | GradeError::SheetOutOfRange(_) => StatusCode::NOT_FOUND,
            GradeError::Busy(_) => StatusCode::CONFLICT,
            GradeError::Export { .. } | GradeError::Io(_) | GradeError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("{}", self.0);
        }
        let body = StatusResponse {
            status: "error".to_string(),
            message: Some(self.0.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(config: &ServerConfig) -> Router {
    let app_state = Arc::new(AppState {
        session: Mutex::new(Session::default()),
        pass_mark: config.pass_mark,
    });

    Router::new()
        .route("/", get(serve_landing))
        .route("/api/upload", post(upload_workbook))
        .route("/api/workbook", get(get_workbook))
        .route("/api/sheet/:index", post(select_sheet))
        .route("/api/students", get(list_students))
        .route("/api/stats", get(get_stats))
        .route("/api/grade", post(set_grade))
        .route("/api/export", post(export_workbook))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_request))
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(app_state)
}

pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(&config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;
    info!(
        "{} {} -> {} ({:.1} ms)",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    response
}

async fn serve_landing() -> &'static str {
    "GradeMaster\n\
     POST /api/upload          multipart field 'workbook'\n\
     GET  /api/workbook\n\
     POST /api/sheet/:index\n\
     GET  /api/students?search=&discrepancies=\n\
     GET  /api/stats\n\
     POST /api/grade           {student_id, question, grade}\n\
     POST /api/export\n"
}

async fn upload_workbook(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GradeError::ingest(e.to_string()))?
    {
        if field.name() == Some("workbook") {
            let name = field.file_name().unwrap_or("workbook.xlsx").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| GradeError::ingest(e.to_string()))?;
            upload = Some((name, bytes));
        }
    }

    let (name, bytes) = match upload {
        Some((name, bytes)) if !bytes.is_empty() => (name, bytes),
        _ => return Err(GradeError::ingest("No file data received").into()),
    };

    state.dispatch(Action::LoadStarted)?;

    let parse_name = name.clone();
    let parse_bytes = bytes.clone();
    let parsed = tokio::task::spawn_blocking(move || loader::load_workbook(&parse_name, &parse_bytes))
        .await
        .map_err(|e| GradeError::ingest(e.to_string()))
        .and_then(|result| result);

    let workbook = match parsed {
        Ok(workbook) => workbook,
        Err(e) => {
            state.dispatch(Action::LoadFailed)?;
            return Err(e.into());
        }
    };

    let response = UploadResponse {
        status: "ok".to_string(),
        filename: workbook.filename.clone(),
        sheets: workbook
            .sheets
            .iter()
            .map(|s| SheetSummary {
                name: s.name.clone(),
                students: s.students.len(),
            })
            .collect(),
    };

    let source = SourceFile {
        name,
        bytes: Arc::from(bytes.to_vec()),
    };
    state.dispatch(Action::Loaded { source, workbook })?;

    Ok(Json(response))
}

async fn get_workbook(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let session = state.session();
    let workbook = session.workbook.as_ref().ok_or(GradeError::NoWorkbook)?;
    Ok(Json(serde_json::json!({
        "active_sheet": session.active_sheet,
        "workbook": workbook,
    }))
    .into_response())
}

async fn select_sheet(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.dispatch(Action::SelectSheet(index))?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        message: None,
    }))
}

async fn list_students(
    Query(params): Query<StudentQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let filter = StudentFilter {
        search: params.search.unwrap_or_default(),
        discrepancies_only: params.discrepancies.unwrap_or(false),
    };
    state.dispatch(Action::SetFilter(filter))?;

    let session = state.session();
    let sheet = session.active_sheet().ok_or(GradeError::NoWorkbook)?;
    let students = session
        .filter
        .apply(sheet.students.iter().map(|s| s.as_ref()))
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(students))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<SheetStats>, ApiError> {
    let stats = state
        .session()
        .active_stats(state.pass_mark)
        .ok_or(GradeError::NoWorkbook)?;
    Ok(Json(stats))
}

async fn set_grade(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GradeUpdate>,
) -> Result<Response, ApiError> {
    let slot: QuestionSlot = payload.question.parse()?;
    let grade: Grade = payload.grade.parse()?;

    state.dispatch(Action::ApplyGrade {
        student_id: payload.student_id,
        slot,
        grade,
    })?;

    let session = state.session();
    let student = session
        .active_sheet()
        .and_then(|sheet| sheet.find(&payload.student_id))
        .cloned();
    // An unknown student leaves the workbook as it was
    match student {
        Some(student) => Ok(Json(student).into_response()),
        None => Ok(Json(StatusResponse {
            status: "ok".to_string(),
            message: Some(format!("no student {}, nothing changed", payload.student_id)),
        })
        .into_response()),
    }
}

async fn export_workbook(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let (source, workbook) = {
        let mut session = state.session();
        let next = update(&session, Action::ExportStarted)?;
        let snapshot = next.export_snapshot()?;
        *session = next;
        snapshot
    };

    let filename = downloader::export_filename(&workbook);
    let result = tokio::task::spawn_blocking(move || {
        downloader::export_workbook(&source.bytes, &workbook)
    })
    .await
    .map_err(|e| GradeError::export(e.to_string()))
    .and_then(|result| result);

    state.dispatch(Action::ExportFinished)?;
    let buffer = result?;

    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename.replace('"', "")),
        )
        .body(Body::from(buffer))
        .map_err(|e| GradeError::export(e.to_string()).into())
}
