//! HTTP surface for Paper Podcast.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /analyze` – Multipart batch of PDF uploads plus `dois`, `urls`, and `topic_list`
//!   form fields (comma-separated). Runs the whole pipeline and returns papers, the synthesis,
//!   the podcast file name, and batch statistics.
//! - `GET /audio/{filename}` – Download a generated audio artifact by exact file name.
//! - `GET /metrics` – Observe batch counters since startup.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The CLI drives the same pipeline, so behavior is identical across interfaces.

use crate::processing::{
    BatchRequest, Citation, PipelineApi, SynthesisResult, is_usable_summary,
    sanitize::{sanitize_upload_name, split_comma_list},
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Filesystem and size settings for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Directory receiving uploaded PDFs.
    pub upload_dir: PathBuf,
    /// Directory holding generated audio artifacts.
    pub output_dir: PathBuf,
    /// Maximum accepted request body size.
    pub max_upload_bytes: usize,
}

impl ApiSettings {
    /// Settings taken from the process configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

struct AppState<S> {
    service: Arc<S>,
    settings: Arc<ApiSettings>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// Build the HTTP router exposing the podcast API surface.
pub fn create_router<S>(service: Arc<S>, settings: ApiSettings) -> Router
where
    S: PipelineApi + 'static,
{
    let body_limit = settings.max_upload_bytes;
    Router::new()
        .route("/analyze", post(analyze::<S>))
        .route("/audio/:filename", get(get_audio::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            service,
            settings: Arc::new(settings),
        })
}

/// One processed source as presented to clients.
#[derive(Debug, Serialize)]
struct PaperResponse {
    title: String,
    authors: Vec<String>,
    topic: String,
    summary: String,
    audio_file: Option<String>,
    source: String,
}

#[derive(Debug, Serialize)]
struct SynthesisResponse {
    text: String,
    num_papers: usize,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct PodcastResponse {
    podcast_file: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatisticsResponse {
    total_papers: usize,
    successful_summaries: usize,
    successful_audio_files: usize,
    podcast_created: bool,
}

/// Success response for `POST /analyze`.
#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    session_id: String,
    papers: Vec<PaperResponse>,
    synthesis: SynthesisResponse,
    audio: PodcastResponse,
    statistics: StatisticsResponse,
    citations: Vec<Citation>,
}

impl AnalyzeResponse {
    fn from_result(result: SynthesisResult) -> Self {
        let papers: Vec<PaperResponse> = result.citations.iter().map(paper_from).collect();
        let statistics = StatisticsResponse {
            total_papers: result.citations.len(),
            successful_summaries: result
                .citations
                .iter()
                .filter(|citation| is_usable_summary(&citation.summary))
                .count(),
            successful_audio_files: result
                .citations
                .iter()
                .filter(|citation| citation.audio.is_some())
                .count(),
            podcast_created: result.synthesis_audio.is_some(),
        };

        Self {
            session_id: Uuid::new_v4().to_string(),
            papers,
            synthesis: SynthesisResponse {
                text: result.synthesis,
                num_papers: result.citations.len(),
                kind: "cross-paper synthesis",
            },
            audio: PodcastResponse {
                podcast_file: result.synthesis_audio.as_deref().and_then(file_name),
            },
            statistics,
            citations: result.citations,
        }
    }
}

fn paper_from(citation: &Citation) -> PaperResponse {
    PaperResponse {
        title: paper_title(citation),
        authors: citation.details.authors.clone(),
        topic: citation.topic.clone(),
        summary: citation.summary.clone(),
        audio_file: citation.audio.as_deref().and_then(file_name),
        source: citation.source.clone(),
    }
}

/// PDF uploads are titled by their original file name; other sources by registry title.
fn paper_title(citation: &Citation) -> String {
    let source = citation.source.as_str();
    if source.to_ascii_lowercase().ends_with(".pdf") {
        let name = FsPath::new(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string());
        let stem = name
            .len()
            .checked_sub(".pdf".len())
            .and_then(|end| name.get(..end))
            .unwrap_or(&name);
        return strip_upload_prefix(stem).to_string();
    }
    citation
        .details
        .title
        .clone()
        .unwrap_or_else(|| source.to_string())
}

fn strip_upload_prefix(name: &str) -> &str {
    match name.split_once('_') {
        Some((prefix, rest)) if Uuid::parse_str(prefix).is_ok() => rest,
        _ => name,
    }
}

fn file_name(path: &FsPath) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Run a batch from a multipart form.
///
/// Every part carrying a file name is stored as `{upload_dir}/{uuid}_{name}` before the
/// pipeline starts; `dois`, `urls`, and `topic_list` parts are comma-separated lists.
async fn analyze<S>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError>
where
    S: PipelineApi,
{
    let mut request = BatchRequest::default();

    while let Some(field) = multipart.next_field().await? {
        if let Some(raw_name) = field.file_name().map(str::to_string) {
            let bytes = field.bytes().await?;
            let path = save_upload(&state.settings.upload_dir, &raw_name, &bytes).await?;
            tracing::info!(file = %path.display(), bytes = bytes.len(), "Stored upload");
            request.pdfs.push(path);
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await?;
        let entries = split_comma_list(Some(&value));
        match name.as_str() {
            "dois" => request.dois.extend(entries),
            "urls" => request.urls.extend(entries),
            "topic_list" => request.topics.extend(entries),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let result = state.service.run(request).await;
    let response = AnalyzeResponse::from_result(result);
    tracing::info!(
        session_id = %response.session_id,
        papers = response.statistics.total_papers,
        podcast = response.statistics.podcast_created,
        "Analyze request completed"
    );
    Ok(Json(response))
}

async fn save_upload(dir: &FsPath, raw_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    let path = dir.join(format!(
        "{}_{}",
        Uuid::new_v4(),
        sanitize_upload_name(raw_name)
    ));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| AppError::Upload {
            path: dir.to_path_buf(),
            source,
        })?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| AppError::Upload {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Serve a generated audio artifact by exact file name.
async fn get_audio<S>(
    State(state): State<AppState<S>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError>
where
    S: PipelineApi,
{
    if filename.is_empty()
        || filename.starts_with('.')
        || filename.contains(['/', '\\'])
    {
        return Err(AppError::NotFound);
    }

    let path = state.settings.output_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(file = %path.display(), error = %error, "Audio lookup missed");
            return Err(AppError::NotFound);
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Return batch counters since startup.
async fn get_metrics<S>(State(state): State<AppState<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(state.service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "analyze",
                method: "POST",
                path: "/analyze",
                description: "Summarize uploaded PDFs, DOIs, and URLs, tag topics, narrate each summary, and build a cross-paper synthesis podcast. Multipart form: files plus comma-separated 'dois', 'urls', and 'topic_list'.",
                request_example: Some(json!({
                    "files": ["paper.pdf"],
                    "dois": "10.1000/xyz123, 10.1038/nphys1170",
                    "urls": "https://example.org/article",
                    "topic_list": "machine learning, biology"
                })),
            },
            CommandDescriptor {
                name: "audio",
                method: "GET",
                path: "/audio/{filename}",
                description: "Download a generated MP3 by the file name reported in 'papers[].audio_file' or 'audio.podcast_file'.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return batch, citation, and audio counters since startup.",
                request_example: None,
            },
        ],
    })
}

#[derive(Debug, Error)]
enum AppError {
    #[error("Failed to store upload at {path}: {source}")]
    Upload {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed multipart request: {0}")]
    Multipart(#[from] MultipartError),
    #[error("File not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Upload { .. } => {
                tracing::error!(error = %self, "Upload persistence failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiSettings, create_router, get_commands};
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        BatchRequest, Citation, PipelineApi, SUMMARY_UNAVAILABLE, SourceDetails, SynthesisResult,
        UNSPECIFIED_TOPIC,
    };
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use std::path::Path;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "podcast-test-boundary";

    #[tokio::test]
    async fn commands_catalog_exposes_analyze_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let analyze = commands
            .iter()
            .find(|cmd| cmd.name == "analyze")
            .expect("analyze command present");

        assert_eq!(analyze.method, "POST");
        assert_eq!(analyze.path, "/analyze");
        assert!(analyze.description.contains("topic_list"));
        assert!(commands.iter().any(|cmd| cmd.path == "/audio/{filename}"));
    }

    #[tokio::test]
    async fn analyze_stores_uploads_and_forwards_lists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = Arc::new(StubPipeline::new(SynthesisResult::default()));
        let app = router(service.clone(), dir.path());

        let body = multipart_body(
            &[("paper.pdf", b"%PDF-1.4 fake".as_slice())],
            &[
                ("dois", "10.1000/a, ,10.1000/b"),
                ("urls", "https://example.org/x"),
                ("topic_list", " alpha , beta,"),
            ],
        );
        let response = app.oneshot(analyze_request(body)).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let requests = service.recorded().await;
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.dois, vec!["10.1000/a", "10.1000/b"]);
        assert_eq!(request.urls, vec!["https://example.org/x"]);
        assert_eq!(request.topics, vec!["alpha", "beta"]);

        assert_eq!(request.pdfs.len(), 1);
        let stored = &request.pdfs[0];
        assert_eq!(stored.parent(), Some(dir.path().join("uploads").as_path()));
        let stored_name = stored
            .file_name()
            .expect("name")
            .to_string_lossy()
            .into_owned();
        assert!(stored_name.ends_with("_paper.pdf"), "{stored_name}");
        assert_eq!(std::fs::read(stored).expect("upload"), b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn analyze_maps_result_to_client_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("outputs");
        let upload = dir
            .path()
            .join("uploads")
            .join("0b8e3b5e-6f0a-4c7e-9a51-0c8f5d7f2a11_deep_nets.pdf");
        let result = SynthesisResult {
            synthesis: "Across papers.".into(),
            synthesis_audio: Some(output.join("final_synthesis.mp3")),
            citations: vec![
                Citation {
                    source: upload.display().to_string(),
                    topic: "alpha".into(),
                    audio: Some(output.join("deep_nets.mp3")),
                    summary: "Deep nets.".into(),
                    details: SourceDetails::default(),
                },
                Citation {
                    source: "10.1000/xyz".into(),
                    topic: UNSPECIFIED_TOPIC.into(),
                    audio: None,
                    summary: SUMMARY_UNAVAILABLE.into(),
                    details: SourceDetails {
                        title: Some("Registry Title".into()),
                        authors: vec!["Doe".into(), "Roe".into()],
                    },
                },
                Citation {
                    source: "https://example.org/x".into(),
                    topic: "beta".into(),
                    audio: Some(output.join("example_org_x.mp3")),
                    summary: "Web text.".into(),
                    details: SourceDetails::default(),
                },
            ],
        };
        let app = router(Arc::new(StubPipeline::new(result)), dir.path());

        let body = multipart_body(&[], &[("topic_list", "alpha,beta")]);
        let response = app.oneshot(analyze_request(body)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;

        assert!(uuid::Uuid::parse_str(json["session_id"].as_str().expect("id")).is_ok());
        let papers = json["papers"].as_array().expect("papers");
        assert_eq!(papers[0]["title"], "deep_nets");
        assert_eq!(papers[0]["audio_file"], "deep_nets.mp3");
        assert_eq!(papers[1]["title"], "Registry Title");
        assert_eq!(papers[1]["authors"], serde_json::json!(["Doe", "Roe"]));
        assert!(papers[1]["audio_file"].is_null());
        assert_eq!(papers[2]["title"], "https://example.org/x");

        assert_eq!(json["synthesis"]["text"], "Across papers.");
        assert_eq!(json["synthesis"]["num_papers"], 3);
        assert_eq!(json["synthesis"]["type"], "cross-paper synthesis");
        assert_eq!(json["audio"]["podcast_file"], "final_synthesis.mp3");
        assert_eq!(json["statistics"]["total_papers"], 3);
        assert_eq!(json["statistics"]["successful_summaries"], 2);
        assert_eq!(json["statistics"]["successful_audio_files"], 2);
        assert_eq!(json["statistics"]["podcast_created"], true);
        assert_eq!(json["citations"][1]["summary"], SUMMARY_UNAVAILABLE);
    }

    #[tokio::test]
    async fn analyze_rejects_malformed_multipart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = Arc::new(StubPipeline::new(SynthesisResult::default()));
        let app = router(service.clone(), dir.path());

        let response = app
            .oneshot(analyze_request(format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"dois\"\r\n\r\nunterminated"
            )))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn analyze_reports_upload_failure_as_server_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").expect("blocker");
        let service = Arc::new(StubPipeline::new(SynthesisResult::default()));
        let app = create_router(
            service.clone(),
            ApiSettings {
                upload_dir: blocker.join("uploads"),
                output_dir: dir.path().join("outputs"),
                max_upload_bytes: 1024 * 1024,
            },
        );

        let body = multipart_body(&[("paper.pdf", b"bytes".as_slice())], &[]);
        let response = app.oneshot(analyze_request(body)).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["detail"].as_str().expect("detail").contains("upload"));
        assert!(service.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn audio_route_serves_existing_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("outputs");
        std::fs::create_dir_all(&output).expect("outputs");
        std::fs::write(output.join("final_synthesis.mp3"), b"ID3audio").expect("artifact");
        let app = router(
            Arc::new(StubPipeline::new(SynthesisResult::default())),
            dir.path(),
        );

        let response = app
            .oneshot(get_request("/audio/final_synthesis.mp3"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"final_synthesis.mp3\""
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(body.as_ref(), b"ID3audio");
    }

    #[tokio::test]
    async fn audio_route_misses_with_detail() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("secret.mp3"), b"outside").expect("secret");
        std::fs::create_dir_all(dir.path().join("outputs")).expect("outputs");
        std::fs::write(dir.path().join("outputs").join(".hidden.mp3"), b"x").expect("hidden");

        for uri in [
            "/audio/missing.mp3",
            "/audio/..%2Fsecret.mp3",
            "/audio/.hidden.mp3",
        ] {
            let app = router(
                Arc::new(StubPipeline::new(SynthesisResult::default())),
                dir.path(),
            );
            let response = app.oneshot(get_request(uri)).await.expect("response");
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let json = json_body(response).await;
            assert_eq!(json["detail"], "File not found");
        }
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router(
            Arc::new(StubPipeline::new(SynthesisResult::default())),
            dir.path(),
        );

        let response = app.oneshot(get_request("/metrics")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["batches_processed"], 4);
        assert!(json.get("last_batch_at").is_none());
    }

    fn router(service: Arc<StubPipeline>, root: &Path) -> Router {
        create_router(
            service,
            ApiSettings {
                upload_dir: root.join("uploads"),
                output_dir: root.join("outputs"),
                max_upload_bytes: 1024 * 1024,
            },
        )
    }

    fn multipart_body(files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; \
                     filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n\
                     {value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn analyze_request(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body.into())
            .expect("request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    struct StubPipeline {
        requests: Mutex<Vec<BatchRequest>>,
        result: SynthesisResult,
    }

    impl StubPipeline {
        fn new(result: SynthesisResult) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                result,
            }
        }

        async fn recorded(&self) -> Vec<BatchRequest> {
            self.requests.lock().await.clone()
        }
    }

    #[async_trait]
    impl PipelineApi for StubPipeline {
        async fn run(&self, request: BatchRequest) -> SynthesisResult {
            self.requests.lock().await.push(request);
            self.result.clone()
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                batches_processed: 4,
                citations_produced: 9,
                audio_files_written: 7,
                podcasts_created: 3,
                last_batch_at: None,
            }
        }
    }
}
