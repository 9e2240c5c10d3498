//! API routes for the paper QA server

pub mod chat;
pub mod feedback;
pub mod papers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::MessageResponse;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build all API routes
pub fn api_routes(max_file_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Papers
        .route("/papers", get(papers::list_papers))
        .route("/papers/add", post(papers::add_paper))
        .route(
            "/papers/upload",
            post(papers::upload_paper)
                .layer(DefaultBodyLimit::max(max_file_size + MULTIPART_OVERHEAD)),
        )
        // Chat
        .route("/chat", post(chat::chat))
        // Feedback
        .route("/feedback", post(feedback::submit_feedback))
        .route("/feedback/stats", get(feedback::feedback_stats))
}

/// GET / - API banner
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Research Papers QA API"))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::server::build_router;
    use crate::testing::{paper, pdf_with_pages, TestHarness};

    const BOUNDARY: &str = "paperqaboundary";

    async fn app(dir: &TempDir) -> (Router, TestHarness) {
        let h = TestHarness::builder()
            .documents(vec![
                paper("1706.03762", "Attention Is All You Need", "Self attention over tokens."),
                paper("2301.00001", "Sparse Mixtures", "Mixture of experts routing."),
            ])
            .initial(&["1706.03762"])
            .max_file_size(2048)
            .build()
            .await;
        let state = h.app_state(dir.path().join("feedback.json")).await;
        (build_router(state), h)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload(filename: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/pdf\r\n\r\n",
                b = BOUNDARY,
                f = filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/papers/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_and_papers() {
        let dir = TempDir::new().unwrap();
        let (app, _h) = app(&dir).await;

        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Research Papers QA API");

        let (status, body) = send(&app, get("/papers")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["papers"],
            json!([{"id": "1706.03762", "title": "Attention Is All You Need"}])
        );
    }

    #[tokio::test]
    async fn test_add_paper_end_to_end() {
        let dir = TempDir::new().unwrap();
        let (app, h) = app(&dir).await;

        let (status, body) =
            send(&app, post_json("/papers/add", json!({"paper_id": "2301.00001"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully added paper: Sparse Mixtures");
        assert_eq!(body["papers"].as_array().unwrap().len(), 2);

        let (status, body) =
            send(&app, post_json("/papers/add", json!({"paper_id": "2301.00001"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Paper already loaded: Sparse Mixtures");
        assert_eq!(h.registry.papers().len(), 2);
    }

    #[tokio::test]
    async fn test_add_unknown_paper_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (app, _h) = app(&dir).await;

        let (status, body) =
            send(&app, post_json("/papers/add", json!({"paper_id": "0000.00000"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "content");
        assert_eq!(
            body["error"]["message"],
            "Failed to load paper with ID: 0000.00000"
        );
    }

    #[tokio::test]
    async fn test_chat() {
        let dir = TempDir::new().unwrap();
        let (app, _h) = app(&dir).await;

        let (status, body) =
            send(&app, post_json("/chat", json!({"text": "What is attention?"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Answer to: What is attention?");
        assert_eq!(body["papers"][0]["id"], "1706.03762");

        let (status, _) = send(&app, post_json("/chat", json!({"text": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_llm_failure_is_server_error() {
        let dir = TempDir::new().unwrap();
        let (app, h) = app(&dir).await;
        h.llm.set_failing(true);

        let (status, body) =
            send(&app, post_json("/chat", json!({"text": "What is attention?"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "processing");
    }

    #[tokio::test]
    async fn test_upload_pdf() {
        let dir = TempDir::new().unwrap();
        let (app, h) = app(&dir).await;

        let data = pdf_with_pages(&["Graph networks pass messages."]);
        assert!(data.len() <= 2048);

        let (status, body) = send(&app, upload("graphs.pdf", &data)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            "Successfully uploaded and processed paper: graphs.pdf"
        );
        assert_eq!(h.registry.papers().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let dir = TempDir::new().unwrap();
        let (app, h) = app(&dir).await;

        let (status, body) = send(&app, upload("notes.txt", b"plain text")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Only PDF files are allowed");

        let (status, _) = send(&app, upload("scan.pdf", &pdf_with_pages(&[""]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let oversized = vec![b'x'; 2049];
        let (status, body) = send(&app, upload("big.pdf", &oversized)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["type"], "validation");

        assert_eq!(h.registry.papers().len(), 1);
    }

    #[tokio::test]
    async fn test_feedback_round() {
        let dir = TempDir::new().unwrap();
        let (app, _h) = app(&dir).await;

        for kind in ["like", "like", "dislike"] {
            let (status, body) = send(
                &app,
                post_json(
                    "/feedback",
                    json!({"question": "q", "answer": "a", "feedback_type": kind}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "Feedback saved successfully");
        }

        let (status, body) = send(&app, get("/feedback/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"likes": 2, "dislikes": 1}));
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (app, _h) = app(&dir).await;

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}
