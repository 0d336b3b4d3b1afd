use std::io::SeekFrom;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::range::{plan_range, ByteRange, RangePlan};
use crate::state::{AppState, FileQuery};
use crate::utils::json_error_response;

use super::browse::resolve_error;

const FALLBACK_MIME: &str = "audio/mpeg";

pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
) -> Response {
    let resolved = match state.resolver.resolve_file(&query.username, &query.path) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return json_error_response(StatusCode::NOT_FOUND, "file not found"),
        Err(err) => return resolve_error(err).into_response(),
    };

    let file = match File::open(&resolved.path).await {
        Ok(file) => file,
        Err(err) => {
            return json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("open failed: {}", err),
            )
        }
    };
    let size = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(err) => {
            return json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("stat failed: {}", err),
            )
        }
    };
    let mime = mime_guess::from_path(&resolved.path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME);

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    match plan_range(range_header, size) {
        RangePlan::Full => full_response(file, size, mime),
        RangePlan::Partial(range) => match partial_response(file, range, size, mime).await {
            Ok(response) => response,
            Err(err) => json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("seek failed: {}", err),
            ),
        },
        RangePlan::Unsatisfiable => unsatisfiable_response(size),
    }
}

fn full_response(file: File, size: u64, mime: &str) -> Response {
    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, mime_value(mime));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    response
}

async fn partial_response(
    mut file: File,
    range: ByteRange,
    size: u64,
    mime: &str,
) -> std::io::Result<Response> {
    file.seek(SeekFrom::Start(range.start)).await?;
    let stream = ReaderStream::new(file.take(range.len()));
    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::PARTIAL_CONTENT;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, mime_value(mime));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len()));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    let content_range = format!("bytes {}-{}/{}", range.start, range.end, size);
    if let Ok(value) = HeaderValue::from_str(&content_range) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    Ok(response)
}

fn unsatisfiable_response(size: u64) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::RANGE_NOT_SATISFIABLE;
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
        response.headers_mut().insert(header::CONTENT_RANGE, value);
    }
    response
}

fn mime_value(mime: &str) -> HeaderValue {
    HeaderValue::from_str(mime).unwrap_or(HeaderValue::from_static("application/octet-stream"))
}
