//! HTTP API.
//!
//! JSON endpoints for search, research, material generation, YouTube
//! transcripts and the saved-material library.

use crate::error::ScholarError;
use crate::library::SavedMaterial;
use crate::materials::{DiagramKind, Material, MaterialKind, MaterialRequest};
use crate::research::{ResearchReport, ResearchRequest};
use crate::search::SearchReport;
use crate::studio::Studio;
use crate::youtube::{Transcript, VideoInfo};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    pub studio: Studio,
}

type SharedState = Arc<AppState>;
type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Build the API router.
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/search", post(search))
        .route("/api/research", post(research).get(list_reports))
        .route("/api/research/{id}", get(get_report))
        .route("/api/materials/{kind}", post(generate))
        .route("/api/video/transcript", post(transcript))
        .route("/api/video/search", post(video_search))
        .route("/api/video/materials/{kind}", post(generate_from_video))
        .route("/api/library", get(list_library))
        .route("/api/library/{id}", get(get_saved).delete(delete_saved))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(host: &str, port: u16, studio: Studio) -> crate::error::Result<()> {
    let app = router(Arc::new(AppState { studio }));
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// === Errors ===

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A `ScholarError` rendered as `{ "error": ... }` with a matching status.
pub struct ApiError(ScholarError);

impl From<ScholarError> for ApiError {
    fn from(e: ScholarError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ScholarError::InvalidInput(rejection.body_text()))
    }
}

fn status_for(e: &ScholarError) -> StatusCode {
    match e {
        ScholarError::InvalidInput(_) | ScholarError::Parse(_) => StatusCode::BAD_REQUEST,
        ScholarError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id)
        .map_err(|_| ApiError(ScholarError::InvalidInput(format!("Invalid id: {}", id))))
}

fn parse_kind(kind: &str) -> Result<MaterialKind, ApiError> {
    Ok(kind.parse::<MaterialKind>()?)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct ResearchBody {
    #[serde(flatten)]
    request: ResearchRequest,
    /// Ground the personas in web search results first.
    #[serde(default)]
    with_search: bool,
    #[serde(default)]
    save: bool,
}

#[derive(Serialize)]
struct ResearchResponse {
    #[serde(flatten)]
    report: ResearchReport,
    markdown: String,
    saved: bool,
}

#[derive(Serialize)]
struct ReportSummary {
    id: Uuid,
    topic: String,
    personas: usize,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct MaterialBody {
    #[serde(flatten)]
    request: MaterialRequest,
    #[serde(default)]
    save: bool,
}

#[derive(Serialize)]
struct MaterialResponse {
    material: Material,
    markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoInfo>,
}

#[derive(Deserialize)]
struct TranscriptRequest {
    /// YouTube URL or video ID.
    video: String,
}

#[derive(Serialize)]
struct TranscriptResponse {
    video: VideoInfo,
    transcript: Transcript,
    formatted: String,
}

#[derive(Deserialize)]
struct VideoSearchRequest {
    query: String,
    #[serde(default = "default_video_limit")]
    limit: usize,
}

fn default_video_limit() -> usize {
    10
}

#[derive(Serialize)]
struct VideoSearchResponse {
    videos: Vec<VideoInfo>,
}

#[derive(Deserialize)]
struct VideoMaterialBody {
    video: String,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    grade_level: Option<String>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    diagram_kind: Option<DiagramKind>,
    #[serde(default)]
    save: bool,
}

#[derive(Deserialize)]
struct LibraryQuery {
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Serialize)]
struct LibraryEntry {
    id: Uuid,
    kind: MaterialKind,
    title: String,
    topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SavedMaterial> for LibraryEntry {
    fn from(m: SavedMaterial) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            title: m.title,
            topic: m.topic,
            source: m.source,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize)]
struct LibraryResponse {
    materials: Vec<LibraryEntry>,
    total: usize,
}

// === Handlers ===

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "llm": state.studio.llm_description(),
        "search_providers": state.studio.search_providers(),
    }))
}

async fn search(
    State(state): State<SharedState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<SearchReport> {
    let Json(req) = payload?;
    let mut report = state.studio.search(&req.query).await?;
    if let Some(limit) = req.limit {
        report.results.truncate(limit);
    }
    Ok(Json(report))
}

async fn research(
    State(state): State<SharedState>,
    payload: Result<Json<ResearchBody>, JsonRejection>,
) -> ApiResult<ResearchResponse> {
    let Json(body) = payload?;
    let report = state.studio.research(body.request, body.with_search).await?;
    if body.save {
        state.studio.save_report(&report).await?;
    }
    Ok(Json(ResearchResponse {
        markdown: report.to_markdown(),
        report,
        saved: body.save,
    }))
}

async fn list_reports(State(state): State<SharedState>) -> ApiResult<Vec<ReportSummary>> {
    let reports = state.studio.library().list_reports().await?;
    Ok(Json(
        reports
            .into_iter()
            .map(|r| ReportSummary {
                id: r.id,
                personas: r.analyses.len(),
                topic: r.topic,
                created_at: r.created_at,
            })
            .collect(),
    ))
}

async fn get_report(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<ResearchReport> {
    let id = parse_id(&id)?;
    state
        .studio
        .library()
        .get_report(id)
        .await?
        .map(Json)
        .ok_or_else(|| ScholarError::NotFound(format!("research report {}", id)).into())
}

async fn generate(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    payload: Result<Json<MaterialBody>, JsonRejection>,
) -> ApiResult<MaterialResponse> {
    let kind = parse_kind(&kind)?;
    let Json(body) = payload?;
    let material = state.studio.generate(kind, &body.request).await?;

    let saved_id = if body.save {
        let saved = state
            .studio
            .save_material(&body.request.topic, material.clone(), None)
            .await?;
        Some(saved.id)
    } else {
        None
    };

    Ok(Json(MaterialResponse {
        markdown: material.to_markdown(),
        material,
        saved_id,
        video: None,
    }))
}

async fn transcript(
    State(state): State<SharedState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> ApiResult<TranscriptResponse> {
    let Json(req) = payload?;
    let (video, transcript) = state.studio.transcript(&req.video).await?;
    Ok(Json(TranscriptResponse {
        video,
        formatted: transcript.format_with_timestamps(),
        transcript,
    }))
}

async fn video_search(
    State(state): State<SharedState>,
    payload: Result<Json<VideoSearchRequest>, JsonRejection>,
) -> ApiResult<VideoSearchResponse> {
    let Json(req) = payload?;
    let videos = state.studio.video_search(&req.query, req.limit).await?;
    Ok(Json(VideoSearchResponse { videos }))
}

async fn generate_from_video(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    payload: Result<Json<VideoMaterialBody>, JsonRejection>,
) -> ApiResult<MaterialResponse> {
    let kind = parse_kind(&kind)?;
    let Json(body) = payload?;

    let request = MaterialRequest {
        topic: body.topic.unwrap_or_default(),
        source_text: None,
        grade_level: body.grade_level,
        count: body.count,
        diagram_kind: body.diagram_kind,
    };
    let out = state.studio.generate_from_video(kind, &body.video, request).await?;

    let saved_id = if body.save {
        let saved = state
            .studio
            .save_material(&out.topic, out.material.clone(), Some(&out.video.url))
            .await?;
        Some(saved.id)
    } else {
        None
    };

    Ok(Json(MaterialResponse {
        markdown: out.material.to_markdown(),
        material: out.material,
        saved_id,
        video: Some(out.video),
    }))
}

async fn list_library(
    State(state): State<SharedState>,
    Query(query): Query<LibraryQuery>,
) -> ApiResult<LibraryResponse> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;
    let materials: Vec<LibraryEntry> = state
        .studio
        .library()
        .list_materials(kind)
        .await?
        .into_iter()
        .map(LibraryEntry::from)
        .collect();

    Ok(Json(LibraryResponse {
        total: materials.len(),
        materials,
    }))
}

async fn get_saved(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<SavedMaterial> {
    let id = parse_id(&id)?;
    state
        .studio
        .library()
        .get_material(id)
        .await?
        .map(Json)
        .ok_or_else(|| ScholarError::NotFound(format!("saved material {}", id)).into())
}

async fn delete_saved(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if state.studio.library().delete_material(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ScholarError::NotFound(format!("saved material {}", id)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{MemoryLibrary, SqliteLibrary};
    use crate::materials::tests::ScriptedLlm;
    use crate::studio::tests::{studio, studio_with};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const QUIZ_REPLY: &str = r#"{"questions": [{"question": "2+2?", "options": ["3", "4"], "answer": "B"}]}"#;

    fn app(llm: Option<ScriptedLlm>) -> Router {
        router(Arc::new(AppState {
            studio: studio(llm.map(Arc::new)),
        }))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(None), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["search_providers"], json!(["fixed"]));
    }

    #[tokio::test]
    async fn test_generate_and_save_then_fetch_and_delete() {
        let app = app(Some(ScriptedLlm::replying(QUIZ_REPLY)));

        let (status, body) = send(
            &app,
            "POST",
            "/api/materials/quiz",
            Some(json!({"topic": "arithmetic", "count": 1, "save": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["material"]["kind"], "quiz");
        assert_eq!(body["material"]["questions"][0]["answer_index"], 1);
        assert!(body["markdown"].as_str().unwrap().contains("## Answer Key"));
        let id = body["saved_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/library?kind=quiz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["materials"][0]["topic"], "arithmetic");

        let (status, body) = send(&app, "GET", &format!("/api/library/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Quiz: arithmetic");

        let (status, _) = send(&app, "DELETE", &format!("/api/library/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, "GET", &format!("/api/library/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("saved material"));
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let app = app(Some(ScriptedLlm::new(vec![
            Ok("no json here".to_string()),
            Err(ScholarError::Llm("upstream down".to_string())),
        ])));

        let (status, _) = send(&app, "POST", "/api/materials/essay", Some(json!({"topic": "t"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "POST", "/api/materials/vocab", Some(json!({"topic": "t"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("model output"));

        let (status, _) = send(&app, "POST", "/api/materials/quiz", Some(json!({"topic": "t"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, body) = send(&app, "POST", "/api/materials/quiz", Some(json!({"count": 3}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, "GET", "/api/library/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_limit() {
        let (status, body) = send(
            &app(None),
            "POST",
            "/api/search",
            Some(json!({"query": "photosynthesis", "limit": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["providers_used"], json!(["fixed"]));
        assert_eq!(body["results"], json!([]));
    }

    #[tokio::test]
    async fn test_research_save_and_fetch() {
        let replies = vec![Ok("analysis".to_string()), Ok("synthesis".to_string())];
        let app = app(Some(ScriptedLlm::new(replies)));

        let (status, body) = send(
            &app,
            "POST",
            "/api/research",
            Some(json!({"topic": "fractions", "personas": ["Master Teacher"], "save": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], true);
        assert_eq!(body["synthesis"], "synthesis");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", &format!("/api/research/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topic"], "fractions");

        let (status, body) = send(&app, "GET", "/api/research", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["personas"], 1);
    }

    #[tokio::test]
    async fn test_video_endpoints() {
        let app = app(Some(ScriptedLlm::replying(QUIZ_REPLY)));

        let (status, body) = send(
            &app,
            "POST",
            "/api/video/transcript",
            Some(json!({"video": "https://www.youtube.com/watch?v=abcdefghijk"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video"]["title"], "How Plants Eat");
        assert!(body["formatted"].as_str().unwrap().starts_with("[00:00] Plants"));

        let (status, _) = send(&app, "POST", "/api/video/transcript", Some(json!({"video": "missingcaps"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "POST", "/api/video/search", Some(json!({"query": "cells"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["videos"][0]["title"], "cells explained");

        let (status, body) = send(
            &app,
            "POST",
            "/api/video/materials/quiz",
            Some(json!({"video": "abcdefghijk", "save": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["material"]["title"], "How Plants Eat");
        assert_eq!(body["video"]["id"], "abcdefghijk");

        let (_, body) = send(&app, "GET", "/api/library", None).await;
        assert_eq!(
            body["materials"][0]["source"],
            "https://www.youtube.com/watch?v=abcdefghijk"
        );
    }

    #[tokio::test]
    async fn test_llm_missing_is_server_error() {
        let mut settings = crate::config::Settings::default();
        settings.llm.api_key_env = Some("SCHOLAR_TEST_UNSET_LLM_KEY".to_string());
        let app = router(Arc::new(AppState {
            studio: studio_with(settings, None, Arc::new(MemoryLibrary::new())),
        }));

        let (status, body) = send(&app, "POST", "/api/materials/quiz", Some(json!({"topic": "t"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("SCHOLAR_TEST_UNSET_LLM_KEY"));
    }

    #[tokio::test]
    async fn test_saved_diagram_survives_sqlite_library() {
        let reply = "Here it is:\n```mermaid\nmindmap\n  root((Cells))\n```";
        let library = Arc::new(SqliteLibrary::in_memory().unwrap());
        let app = router(Arc::new(AppState {
            studio: studio_with(
                crate::config::Settings::default(),
                Some(Arc::new(ScriptedLlm::replying(reply))),
                library,
            ),
        }));

        let (status, body) = send(
            &app,
            "POST",
            "/api/materials/diagram",
            Some(json!({"topic": "cells", "save": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["material"]["kind"], "diagram");
        assert_eq!(body["material"]["diagram_kind"], "mindmap");
        let id = body["saved_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/library", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["materials"][0]["kind"], "diagram");

        let (status, body) = send(&app, "GET", &format!("/api/library/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["material"]["mermaid"], "mindmap\n  root((Cells))");
    }

    #[tokio::test]
    async fn test_video_material_saved_under_caller_topic() {
        let app = app(Some(ScriptedLlm::replying(QUIZ_REPLY)));
        let (status, _) = send(
            &app,
            "POST",
            "/api/video/materials/quiz",
            Some(json!({"video": "abcdefghijk", "topic": "plant nutrition", "save": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", "/api/library", None).await;
        assert_eq!(body["materials"][0]["topic"], "plant nutrition");
        assert_eq!(body["materials"][0]["title"], "How Plants Eat");
    }
}
