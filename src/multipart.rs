// ABOUTME: Multipart form parsing for image uploads
// ABOUTME: Collects the `file` part as an ImageUpload and keeps any text parts by name

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::{AppError, Result};
use crate::schema::ImageUpload;

#[derive(Debug, Default)]
pub struct MultipartFields {
    file: Option<ImageUpload>,
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    pub async fn parse(multipart: &mut Multipart, max_file_size: usize) -> Result<Self> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "file" {
                let content_type = field.content_type().unwrap_or("").to_string();
                let file_name = field.file_name().unwrap_or("upload").to_string();

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec();

                if bytes.len() > max_file_size {
                    return Err(AppError::BadRequest(format!(
                        "File exceeds the {} byte upload limit",
                        max_file_size
                    )));
                }

                fields.file = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?;
                fields.text_fields.insert(name, value);
            }
        }

        Ok(fields)
    }

    /// Takes the uploaded file. A missing part is reported as an empty upload so the
    /// image schema produces the usual `file` violation.
    pub fn take_file(&mut self) -> ImageUpload {
        self.file.take().unwrap_or(ImageUpload {
            file_name: String::new(),
            content_type: String::new(),
            bytes: Vec::new(),
        })
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}
