// src/api/mod.rs

pub mod admins;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
pub mod razorpay;
pub mod restaurants;
pub mod users;
pub mod webhooks;

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Drain a multipart body into text fields and uploaded files. Image-bearing
/// creates/updates send the entity as a JSON `data` field next to the files.
pub async fn read_multipart(
    mut payload: Multipart,
) -> Result<(HashMap<String, String>, Vec<UploadedFile>), ApiError> {
    let mut fields = HashMap::new();
    let mut files = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                return Err(ApiError::BadRequest(format!("Invalid multipart body: {e}")));
            }
        };

        let cd = field.content_disposition();
        let name = cd.get_name().unwrap_or_default().to_string();
        let filename = cd.get_filename().map(str::to_string);
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk
                .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?;
            bytes.extend_from_slice(&data);
        }

        match filename {
            Some(filename) => files.push(UploadedFile {
                field: name,
                filename,
                content_type,
                bytes,
            }),
            None => {
                fields.insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    }

    Ok((fields, files))
}

pub fn json_field<T: DeserializeOwned>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<T, ApiError> {
    let raw = fields
        .get(name)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {name} field")))?;
    serde_json::from_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {name} payload: {e}")))
}
