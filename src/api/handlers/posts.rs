use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, Envelope};
use crate::content::{self, ContentError, CAPTION_FILE, INSTAGRAM_FILE};
use crate::storage::models::PostRecord;
use crate::submission::{FilePart, Orchestrator, Rejection, SubmissionError, SubmissionForm};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: String,
    pub post_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    #[serde(default, rename = "andrewId")]
    pub andrew_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListPostsResponse {
    pub posts: Vec<PostRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub record: PostRecord,
    pub caption: String,
    pub instagram_username: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: PostDetail,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn submit_post(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Envelope<SubmitResponse>>), ApiError> {
    let parsed = match multipart {
        Ok(multipart) => read_submission_form(multipart).await,
        Err(rejection) => Err(Rejection::MalformedForm(rejection.body_text())),
    };

    let mut orchestrator = Orchestrator::new(&state.content, state.store.as_ref());
    let outcome = orchestrator.run(parsed).await.map_err(submission_error)?;

    Ok((
        StatusCode::CREATED,
        Envelope::success(SubmitResponse {
            message: format!(
                "Post submitted successfully with {} file(s)",
                outcome.files_processed
            ),
            post_id: outcome.post_id,
        }),
    ))
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListPostsParams>,
) -> Result<Json<Envelope<ListPostsResponse>>, ApiError> {
    let andrew_id = params
        .andrew_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Andrew ID is required"))?;

    let posts = state
        .store
        .list_by_andrew_id(andrew_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to fetch posts: {e}")))?;

    Ok(Envelope::success(ListPostsResponse {
        count: posts.len(),
        posts,
    }))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<PostResponse>>, ApiError> {
    let record = find_post(&state, &id).await?;
    let dir = std::path::Path::new(&record.content);

    let caption = content::read_text(dir, CAPTION_FILE)
        .await
        .unwrap_or_default();
    let instagram_username = content::read_text(dir, INSTAGRAM_FILE)
        .await
        .unwrap_or_default();
    let files = content::list_files(dir).await;

    Ok(Envelope::success(PostResponse {
        post: PostDetail {
            record,
            caption,
            instagram_username,
            files,
        },
    }))
}

/// Serve one file from a post's directory.
/// Route: GET /api/posts/:id/files/:name
pub async fn get_post_file(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let record = find_post(&state, &id).await?;

    let data = content::read_media(std::path::Path::new(&record.content), &name)
        .await
        .map_err(|e| match e {
            ContentError::NotFound(_) => ApiError::not_found("File not found"),
            ContentError::InvalidName(_) => ApiError::bad_request("Invalid file name"),
            ContentError::Io(_) => ApiError::internal(format!("Failed to read file: {e}")),
        })?;

    let mime_type = mime_guess::from_path(&name).first_or_octet_stream();

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    if let Ok(value) = mime_type.as_ref().parse() {
        headers.insert(header::CONTENT_TYPE, value);
    }

    if let Ok(value) = format!("inline; filename=\"{name}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Submission directories are never rewritten
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("public, max-age=3600"),
    );

    Ok(response)
}

// ============================================================================
// Helpers
// ============================================================================

/// Collect the multipart body into a form, buffering file parts.
async fn read_submission_form(mut multipart: Multipart) -> Result<SubmissionForm, Rejection> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        Rejection::MalformedForm(e.body_text())
    };

    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let field_name = field.name().unwrap_or("").to_string();

        match SubmissionForm::slot_index(&field_name) {
            Some(index) if field.file_name().is_some() => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(malformed)?;

                form.set_slot(
                    index,
                    FilePart {
                        file_name,
                        content_type,
                        data,
                    },
                );
            }
            Some(_) => {
                // A plain value in a file slot does not count as an upload
                field.bytes().await.map_err(malformed)?;
            }
            None => {
                let value = field.text().await.map_err(malformed)?;
                form.set_field(&field_name, value);
            }
        }
    }

    tracing::debug!(slots = form.filled_slots(), "Parsed submission form");
    Ok(form)
}

async fn find_post(state: &AppState, id: &str) -> Result<PostRecord, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid post ID"))?;

    state
        .store
        .get_post(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to fetch post: {e}")))?
        .ok_or_else(|| ApiError::not_found("Post not found"))
}

fn submission_error(e: SubmissionError) -> ApiError {
    if e.is_rejection() {
        ApiError::bad_request(e.to_string())
    } else {
        ApiError::internal(e.to_string())
    }
}
