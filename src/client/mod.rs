//! Access to the remote investor API.
//!
//! The service layer is generic over [`InvestorApi`] so that it can run against
//! [`http::HttpInvestorApi`] in production and an in-memory double in tests.

use std::future::Future;

use thiserror::Error;

use crate::domain::investor::{InvestorRecord, StoredInvestor};
use crate::domain::types::InvestorId;

pub mod http;
#[cfg(test)]
pub mod test;

/// Failure of a single API call, classified by how far the request got.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with something other than success.
    #[error("server responded with status {status}")]
    Server {
        status: u16,
        /// `message` field of the JSON error body, when there was one.
        message: Option<String>,
    },
    /// No response was received.
    #[error("no response from server: {0}")]
    Network(String),
    /// The upload endpoint answered but did not return a file URL.
    #[error("upload was rejected by the server")]
    UploadRejected,
    #[error("unexpected API failure: {0}")]
    Unexpected(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// A file received from the browser, ready to be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Operations offered by the remote investor API.
pub trait InvestorApi {
    /// `POST /api/create-investor`; succeeds only on HTTP 200.
    fn create_investor(&self, record: &InvestorRecord) -> impl Future<Output = ApiResult<()>>;

    /// `GET /api/get-investor/{id}`.
    fn get_investor(&self, id: &InvestorId) -> impl Future<Output = ApiResult<StoredInvestor>>;

    /// `PUT /api/update-investor/{id}`; succeeds only on HTTP 200.
    fn update_investor(
        &self,
        id: &InvestorId,
        record: &InvestorRecord,
    ) -> impl Future<Output = ApiResult<()>>;

    /// `POST /api/fileUpload`; returns the URL of the stored file.
    fn upload_file(&self, file: UploadedImage) -> impl Future<Output = ApiResult<String>>;
}
