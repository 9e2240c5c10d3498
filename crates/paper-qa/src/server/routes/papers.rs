//! Paper listing, addition by arXiv id and PDF upload

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

use crate::error::{Error, Result};
use crate::registry::AddOutcome;
use crate::server::state::AppState;
use crate::types::{AddPaperRequest, PaperAddedResponse, PapersResponse};

/// GET /papers - List loaded papers
pub async fn list_papers(State(state): State<AppState>) -> Json<PapersResponse> {
    Json(PapersResponse {
        papers: state.registry().papers(),
    })
}

/// POST /papers/add - Fetch a paper from arXiv and index it
pub async fn add_paper(
    State(state): State<AppState>,
    Json(request): Json<AddPaperRequest>,
) -> Result<Json<PaperAddedResponse>> {
    tracing::info!("Adding paper {}", request.paper_id);

    let outcome = state.registry().add_paper(&request.paper_id).await?;
    let message = match &outcome {
        AddOutcome::Added(paper) => format!("Successfully added paper: {}", paper.title),
        AddOutcome::AlreadyLoaded(paper) => format!("Paper already loaded: {}", paper.title),
    };

    Ok(Json(PaperAddedResponse {
        message,
        papers: state.registry().papers(),
    }))
}

/// POST /papers/upload - Index an uploaded PDF (multipart field `file`)
pub async fn upload_paper(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PaperAddedResponse>> {
    let limit = state.config().server.max_file_size;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Validation("Uploaded file has no filename".into()))?;
        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| Error::Validation("Missing multipart field 'file'".into()))?;

    if data.len() > limit {
        return Err(Error::PayloadTooLarge { limit });
    }

    tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

    let outcome = state.registry().add_upload(&filename, data.to_vec()).await?;
    let message = match &outcome {
        AddOutcome::Added(paper) => {
            format!("Successfully uploaded and processed paper: {}", paper.title)
        }
        AddOutcome::AlreadyLoaded(paper) => format!("Paper already loaded: {}", paper.title),
    };

    Ok(Json(PaperAddedResponse {
        message,
        papers: state.registry().papers(),
    }))
}

fn multipart_error(err: MultipartError, limit: usize) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { limit }
    } else {
        Error::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}
