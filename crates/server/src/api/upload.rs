use std::path::Path;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use vault::ingest_archive;

use crate::state::{AppState, ErrorResponse, JsonResult, UploadResponse};
use crate::utils::json_error;

// sentinel some clients send for "no playlist"
const NO_PLAYLIST: &str = "null";

pub async fn upload_zip(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> JsonResult<UploadResponse> {
    let scratch = state.roots.scratch();
    tokio::fs::create_dir_all(&scratch).await.map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("scratch setup failed: {}", err),
        )
    })?;
    let archive_path = scratch.join(format!("upload-{}.zip", Uuid::new_v4()));

    let fields = receive_fields(&mut multipart, &archive_path).await;
    let (got_archive, target_playlist) = match fields {
        Ok(fields) => fields,
        Err(err) => {
            let _ = tokio::fs::remove_file(&archive_path).await;
            return Err(err);
        }
    };
    if !got_archive {
        return Err(json_error(StatusCode::BAD_REQUEST, "missing file field"));
    }

    let playlist = target_playlist
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && value != NO_PLAYLIST);
    if let Some(playlist) = &playlist {
        info!("Upload targets playlist {:?}", playlist);
    }

    let writer = state.writer.clone();
    let ingest_path = archive_path.clone();
    let result = tokio::task::spawn_blocking(move || {
        ingest_archive(&writer, &ingest_path, playlist.as_deref())
    })
    .await;

    let _ = tokio::fs::remove_file(&archive_path).await;

    match result {
        Ok(Ok(report)) => Ok(Json(UploadResponse {
            status: "ok",
            processed: report.processed,
        })),
        Ok(Err(err)) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("ingestion failed: {}", err),
        )),
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("ingestion task failed: {}", err),
        )),
    }
}

async fn receive_fields(
    multipart: &mut Multipart,
    archive_path: &Path,
) -> Result<(bool, Option<String>), (StatusCode, Json<ErrorResponse>)> {
    let mut got_archive = false;
    let mut target_playlist = None;

    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        match field.name() {
            Some("file") => {
                spool_field(&mut field, archive_path).await?;
                got_archive = true;
            }
            Some("target_playlist") => {
                target_playlist = Some(field.text().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }
    Ok((got_archive, target_playlist))
}

async fn spool_field(
    field: &mut axum::extract::multipart::Field<'_>,
    dest: &Path,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let mut out = tokio::fs::File::create(dest).await.map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("spool failed: {}", err),
        )
    })?;
    while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
        out.write_all(&chunk).await.map_err(|err| {
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("spool failed: {}", err),
            )
        })?;
    }
    out.flush().await.map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("spool failed: {}", err),
        )
    })?;
    Ok(())
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> (StatusCode, Json<ErrorResponse>) {
    json_error(
        StatusCode::BAD_REQUEST,
        format!("invalid multipart payload: {}", err),
    )
}
