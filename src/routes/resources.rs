use std::{fs, path::{Path, PathBuf}};

use actix_files::Files;
use actix_web::{http::header::DispositionType, post, web::{Bytes, Data, PayloadConfig, Query}, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::{auth::UserSession, error::ApiError};

pub const UPLOADS_PATH: &str = "/uploads";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Banners, photos and the documents people attach to events.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp",
    "pdf", "txt", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
];

/// Where uploaded files are written and served from.
pub struct UploadDir(pub PathBuf);

#[derive(Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    filename: String,
}

/// Non-ASCII characters are dropped and whitespace becomes `-`. Path
/// separators never survive, so the result always stays inside the uploads
/// directory.
pub fn sanitize_file_name(name: &str) -> String {
    let name = name.chars()
        .filter(char::is_ascii)
        .map(|c| match c {
            c if c.is_ascii_whitespace() => '-',
            '/' | '\\' => '_',
            c => c,
        })
        .collect::<String>();
    let name = name.trim_start_matches('.');
    if name.is_empty() {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

pub fn is_allowed_upload(file_name: &str) -> bool {
    Path::new(file_name).extension()
        .and_then(|x| x.to_str())
        .map_or(false, |x| ALLOWED_EXTENSIONS.contains(&x.to_ascii_lowercase().as_str()))
}

/// Only images are shown inline; everything else is downloaded.
pub fn uploads_service(dir: &UploadDir) -> Files {
    Files::new(UPLOADS_PATH, &dir.0)
        .mime_override(|name| match name.as_str() {
            "image" => DispositionType::Inline,
            _ => DispositionType::Attachment,
        })
}

pub fn upload_payload_config() -> PayloadConfig {
    PayloadConfig::new(MAX_UPLOAD_BYTES)
}

#[post("/api/upload")]
pub async fn upload(dir: Data<UploadDir>, user: UserSession, Query(query): Query<UploadQuery>, body: Bytes) -> Result<HttpResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    let name = sanitize_file_name(&query.filename);
    if !is_allowed_upload(&name) {
        warn!("{} tried to upload {}", user.user.0, name);
        return Err(ApiError::bad_request("File type not allowed"));
    }
    let file_name = format!("{}-{}", Utc::now().timestamp_millis(), name);
    fs::create_dir_all(&dir.0)?;
    fs::write(dir.0.join(&file_name), &body)?;
    info!("{} uploaded {} ({} bytes)", user.user.0, file_name, body.len());
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "url": format!("{}/{}", UPLOADS_PATH, file_name),
    })))
}
