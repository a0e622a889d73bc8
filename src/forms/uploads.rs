use std::io::{Read, Seek, SeekFrom};

use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use thiserror::Error;

use crate::client::UploadedImage;
use crate::domain::types::TypeConstraintError;
use crate::forms::investors::SlotRef;

const FALLBACK_FILE_NAME: &str = "image";

#[derive(MultipartForm)]
pub struct UploadImageForm {
    #[multipart(limit = "10MB")]
    pub file: TempFile,
    pub slot: Text<String>,
}

#[derive(Debug, Error)]
pub enum UploadImageFormError {
    #[error("No file selected.")]
    MissingFile,
    #[error("Only image files can be uploaded.")]
    NotAnImage,
    #[error("Error reading uploaded file")]
    ReadFailed,
    #[error("{0}")]
    InvalidSlot(String),
}

impl From<std::io::Error> for UploadImageFormError {
    fn from(_: std::io::Error) -> Self {
        UploadImageFormError::ReadFailed
    }
}

impl From<TypeConstraintError> for UploadImageFormError {
    fn from(value: TypeConstraintError) -> Self {
        UploadImageFormError::InvalidSlot(value.to_string())
    }
}

impl UploadImageForm {
    /// Reads the uploaded file into memory together with its target slot.
    pub fn parse(&mut self) -> Result<(SlotRef, UploadedImage), UploadImageFormError> {
        let slot = SlotRef::try_from(self.slot.as_str())?;

        if self.file.size == 0 {
            return Err(UploadImageFormError::MissingFile);
        }

        let content_type = self.file.content_type.as_ref().map(|mime| mime.to_string());
        if let Some(content_type) = &content_type
            && !content_type.starts_with("image/")
        {
            return Err(UploadImageFormError::NotAnImage);
        }

        let mut bytes = Vec::with_capacity(self.file.size);
        self.file.file.seek(SeekFrom::Start(0))?;
        self.file.file.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Err(UploadImageFormError::MissingFile);
        }

        let file_name = self
            .file
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILE_NAME)
            .to_string();

        Ok((
            slot,
            UploadedImage {
                file_name,
                content_type,
                bytes,
            },
        ))
    }
}
