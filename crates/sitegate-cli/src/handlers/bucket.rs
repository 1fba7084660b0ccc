//! Bucket operation handlers

use super::{ok_data, ok_msg};
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, State},
    response::Response,
};
use sitegate_core::BucketCreation;
use std::sync::Arc;

/// GET /storage/{site}/{bucket} - List the objects of a bucket
pub async fn bucket_contents(
    State(state): State<Arc<AppState>>,
    Path((site, bucket)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let contents = state.service.bucket_contents(&site, &bucket).await?;
    Ok(ok_data(contents))
}

/// POST /storage/{site}/{bucket} - Create bucket
pub async fn create_bucket(
    State(state): State<Arc<AppState>>,
    Path((site, bucket)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let outcome = state.service.create_bucket(&site, &bucket).await?;
    let msg = match outcome {
        BucketCreation::Created => format!("Bucket {}/{} created successfully", site, bucket),
        BucketCreation::AlreadyOwned => format!("Bucket {}/{} already exists", site, bucket),
    };
    Ok(ok_msg(msg, Some(outcome)))
}

/// DELETE /storage/{site}/{bucket} - Delete bucket
pub async fn delete_bucket(
    State(state): State<Arc<AppState>>,
    Path((site, bucket)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    state.service.delete_bucket(&site, &bucket).await?;
    Ok(ok_msg::<()>(
        format!("Bucket {}/{} deleted successfully", site, bucket),
        None,
    ))
}
