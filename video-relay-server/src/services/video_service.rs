use std::io::ErrorKind;
use actix_files::NamedFile;
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, HttpResponse};
use blob_store::{BlobStore, StagedBlob, VideoKey};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::errors::RelayErr;
use crate::services::{AppState, APP_TYPE_JSON};

const VIDEO_FIELD: &str = "video";
const MAX_TEXT_FIELD_BYTES: usize = 4096;

#[derive(Debug, Default, Validate)]
struct UploadForm {
    #[validate(length(min = 1))]
    schema: String,
    #[validate(length(min = 1))]
    worker_id: String,
}

#[derive(Debug, Deserialize, Validate)]
struct VideoQuery {
    #[serde(default)]
    #[validate(length(min = 1))]
    schema: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    worker_id: String,
}

#[derive(Serialize, Deserialize)]
struct UploadResponse {
    success: bool,
    schema: String,
    worker_id: String,
    stored_path: String,
    download_url: String,
}

async fn read_text_field(mut field: Field) -> Result<String, RelayErr> {
    let name = field.name().unwrap_or_default().to_string();
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(RelayErr::Validation(format!(
                "{} exceeds {} bytes", name, MAX_TEXT_FIELD_BYTES
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| RelayErr::Validation(format!("{} must be UTF-8", name)))
}

async fn discard_quietly(store: &dyn BlobStore, staged: StagedBlob) {
    let path = staged.path().to_path_buf();
    if let Err(e) = store.discard(staged).await {
        tracing::warn!("failed to remove staging file {}: {}", path.display(), e);
    }
}

/// Streams the video part into a staging file chunk by chunk.
async fn stage_video_field(mut field: Field, store: &dyn BlobStore) -> Result<StagedBlob, RelayErr> {
    let mut staged = store.stage().await?;
    let copied: Result<(), RelayErr> = async {
        while let Some(chunk) = field.try_next().await? {
            staged.write_chunk(&chunk).await?;
        }
        Ok(())
    }
    .await;

    match copied {
        Ok(()) => Ok(staged),
        Err(e) => {
            discard_quietly(store, staged).await;
            Err(e)
        }
    }
}

/// Reads the whole multipart body. Text fields and the video may come in any
/// order, so the video is staged before its address is known.
async fn read_upload(
    mut payload: Multipart,
    store: &dyn BlobStore,
) -> Result<(UploadForm, Option<StagedBlob>), RelayErr> {
    let mut form = UploadForm::default();
    let mut staged: Option<StagedBlob> = None;

    let parsed: Result<(), RelayErr> = async {
        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("schema") => form.schema = read_text_field(field).await?,
                Some("worker_id") => form.worker_id = read_text_field(field).await?,
                Some(VIDEO_FIELD) => {
                    if staged.is_some() {
                        return Err(RelayErr::Validation(format!(
                            "only one \"{}\" field is allowed", VIDEO_FIELD
                        )));
                    }
                    staged = Some(stage_video_field(field, store).await?);
                }
                _ => {
                    while field.try_next().await?.is_some() {}
                }
            }
        }
        Ok(())
    }
    .await;

    match parsed {
        Ok(()) => Ok((form, staged)),
        Err(e) => {
            if let Some(staged) = staged {
                discard_quietly(store, staged).await;
            }
            Err(e)
        }
    }
}

fn key_for(form: &UploadForm) -> Result<VideoKey, RelayErr> {
    form.validate()?;
    Ok(VideoKey::new(form.schema.as_str(), form.worker_id.as_str())?)
}

#[post("/upload")]
async fn upload_video(
    payload: Multipart,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, RelayErr> {
    let store = shared_state.store.as_ref();
    let (form, staged) = read_upload(payload, store).await?;

    let key = match key_for(&form) {
        Ok(key) => key,
        Err(e) => {
            if let Some(staged) = staged {
                discard_quietly(store, staged).await;
            }
            return Err(e);
        }
    };
    let staged = staged.ok_or_else(|| {
        RelayErr::Validation(format!("video file (field \"{}\") required", VIDEO_FIELD))
    })?;

    let stored = store.commit(staged, &key).await?;
    tracing::info!(
        "stored video schema={} worker_id={} ({} bytes) at {}",
        key.schema(), key.worker_id(), stored.size, stored.path.display()
    );

    let resp = UploadResponse {
        success: true,
        download_url: shared_state.config.download_url(key.schema(), key.worker_id()).to_string(),
        stored_path: stored.path.display().to_string(),
        schema: form.schema,
        worker_id: form.worker_id,
    };
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(resp))
}

#[get("/video")]
async fn download_video(
    query: web::Query<VideoQuery>,
    shared_state: web::Data<AppState>,
) -> Result<NamedFile, RelayErr> {
    query.validate()?;
    let VideoQuery { schema, worker_id } = query.into_inner();
    let key = VideoKey::new(schema, worker_id)?;

    let stored = shared_state.store.locate(&key).await?;
    // The file can vanish between locate and open.
    let file = NamedFile::open_async(&stored.path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => RelayErr::NotFound,
        _ => RelayErr::Io(e),
    })?;
    tracing::debug!("serving {} ({} bytes)", stored.path.display(), stored.size);

    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(key.file_name())],
    }))
}
