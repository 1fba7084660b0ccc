//! Object operation handlers

use super::ok_msg;
use crate::{ApiError, AppState};
use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use sitegate_storage::ObjectStream;
use std::sync::Arc;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// Query parameters for object deletion
#[derive(Debug, Deserialize)]
pub struct DeleteObjectParams {
    #[serde(rename = "versionId")]
    pub version_id: Option<String>,
}

/// GET /storage/{site}/{bucket}/{object} - Download object as an attachment
pub async fn download_object(
    State(state): State<Arc<AppState>>,
    Path((site, bucket, key)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let download = state.service.get_object_stream(&site, &bucket, &key).await?;
    let descriptor = download.descriptor;

    let filename = key.rsplit('/').next().unwrap_or(&key).replace('"', "");
    let content_type = descriptor
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, descriptor.size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );

    if let Some(ref etag) = descriptor.etag {
        response = response.header(header::ETAG, format!("\"{}\"", etag));
    }
    if let Some(ref version_id) = descriptor.version_id {
        response = response.header("x-version-id", version_id);
    }

    response
        .body(Body::from_stream(download.body))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// POST /storage/{site}/{bucket}/{object} - Upload the multipart `file` field
pub async fn upload_multipart(
    State(state): State<Arc<AppState>>,
    Path((site, bucket, key)): Path<(String, String, String)>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        debug!(file_name = ?field.file_name(), "Receiving multipart upload");

        // The part is spooled to disk so its size is known before the upload starts
        let (body, size) =
            spool_to_tempfile(field.map_err(|e| ApiError::bad_request(e.body_text()))).await?;

        let stored = state
            .service
            .upload_object(&site, &bucket, &key, content_type.as_deref(), body, size)
            .await?;
        return Ok(ok_msg(
            format!("File {}/{}/{} uploaded successfully", site, bucket, key),
            Some(stored),
        ));
    }

    Err(ApiError::bad_request(format!(
        "multipart field \"{}\" is required",
        FILE_FIELD
    )))
}

/// Write `chunks` to an anonymous temporary file and stream it back.
///
/// The file is unlinked on creation, so it disappears once the stream is dropped.
async fn spool_to_tempfile<S>(chunks: S) -> Result<(ObjectStream, u64), ApiError>
where
    S: Stream<Item = Result<Bytes, ApiError>>,
{
    let file = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(format!("failed to create spool file: {}", e)))?;
    let mut spool = tokio::fs::File::from_std(file);

    let mut chunks = std::pin::pin!(chunks);
    let mut size = 0u64;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        spool.write_all(&chunk).await.map_err(spool_error)?;
    }
    spool.flush().await.map_err(spool_error)?;
    spool.rewind().await.map_err(spool_error)?;

    Ok((ReaderStream::new(spool).boxed(), size))
}

fn spool_error(err: std::io::Error) -> ApiError {
    ApiError::Internal(format!("failed to spool upload: {}", err))
}

/// PUT /storage/{site}/{bucket}/{object} - Upload the raw request body
pub async fn upload_raw(
    State(state): State<Arc<AppState>>,
    Path((site, bucket, key)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let size: u64 = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or(ApiError::LengthRequired)?;

    let limit = state.config.max_body_size;
    if size > limit as u64 {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let stream: ObjectStream = body
        .into_data_stream()
        .map_err(std::io::Error::other)
        .boxed();

    let stored = state
        .service
        .upload_object(&site, &bucket, &key, content_type.as_deref(), stream, size)
        .await?;
    Ok(ok_msg(
        format!("File {}/{}/{} uploaded successfully", site, bucket, key),
        Some(stored),
    ))
}

/// DELETE /storage/{site}/{bucket}/{object} - Delete object or one version of it
pub async fn delete_object(
    State(state): State<Arc<AppState>>,
    Path((site, bucket, key)): Path<(String, String, String)>,
    Query(params): Query<DeleteObjectParams>,
) -> Result<Response, ApiError> {
    state
        .service
        .delete_object(&site, &bucket, &key, params.version_id.as_deref())
        .await?;
    Ok(ok_msg::<()>(
        format!("File {}/{}/{} deleted successfully", site, bucket, key),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_spooled_upload_streams_back_every_chunk() {
        let chunks: Vec<Result<Bytes, ApiError>> = (0..40u8)
            .map(|i| Ok(Bytes::from(vec![i; 8 * 1024])))
            .collect();

        let (body, size) = spool_to_tempfile(stream::iter(chunks)).await.unwrap();
        assert_eq!(size, 40 * 8 * 1024);

        let data: Vec<u8> = body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap();
        assert_eq!(data.len() as u64, size);
        assert_eq!(data[0], 0);
        assert_eq!(data[data.len() - 1], 39);
    }

    #[tokio::test]
    async fn test_spool_stops_on_client_error() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(ApiError::bad_request("connection reset")),
        ]);
        let result = spool_to_tempfile(chunks).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
