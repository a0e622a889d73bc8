use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;

use crate::client::{ApiError, ApiResult, InvestorApi, UploadedImage};
use crate::domain::investor::{InvestorRecord, StoredInvestor};
use crate::domain::types::InvestorId;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct GetInvestorResponse {
    investor: StoredInvestor,
}

#[derive(Deserialize)]
struct UploadedFileRef {
    url: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    data: Option<Vec<UploadedFileRef>>,
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() || value.is_builder() {
            ApiError::Unexpected(value.to_string())
        } else {
            ApiError::Network(value.to_string())
        }
    }
}

/// [`InvestorApi`] backed by `reqwest`.
///
/// Investor records and file uploads may live on different hosts, so the
/// upload endpoint is configured as a full URL.
#[derive(Clone)]
pub struct HttpInvestorApi {
    client: Client,
    api_base_url: String,
    upload_url: String,
}

impl HttpInvestorApi {
    pub fn new(
        api_base_url: impl Into<String>,
        upload_url: impl Into<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            upload_url: upload_url.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.api_base_url)
    }

    /// `{base}/api/{action}/{id}` with the id percent-encoded as one segment.
    fn investor_endpoint(&self, action: &str, id: &InvestorId) -> ApiResult<Url> {
        // Dot segments are dropped by `push` and would address another endpoint.
        if matches!(id.as_str(), "." | "..") {
            return Err(ApiError::Unexpected(format!("invalid investor id: {id}")));
        }
        let mut url = Url::parse(&self.endpoint(action))
            .map_err(|e| ApiError::Unexpected(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Unexpected("API base URL cannot have a path".to_string()))?
            .push(id.as_str());
        Ok(url)
    }
}

async fn server_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
    ApiError::Server { status, message }
}

async fn expect_ok(response: Response) -> ApiResult<()> {
    if response.status() == StatusCode::OK {
        Ok(())
    } else {
        Err(server_error(response).await)
    }
}

impl InvestorApi for HttpInvestorApi {
    async fn create_investor(&self, record: &InvestorRecord) -> ApiResult<()> {
        let response = self
            .client
            .post(self.endpoint("create-investor"))
            .json(record)
            .send()
            .await?;
        expect_ok(response).await
    }

    async fn get_investor(&self, id: &InvestorId) -> ApiResult<StoredInvestor> {
        let response = self
            .client
            .get(self.investor_endpoint("get-investor", id)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        let body: GetInvestorResponse = response.json().await?;
        Ok(body.investor)
    }

    async fn update_investor(&self, id: &InvestorId, record: &InvestorRecord) -> ApiResult<()> {
        let response = self
            .client
            .put(self.investor_endpoint("update-investor", id)?)
            .json(record)
            .send()
            .await?;
        expect_ok(response).await
    }

    async fn upload_file(&self, file: UploadedImage) -> ApiResult<String> {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let body: UploadResponse = response.json().await?;
        if !body.status {
            return Err(ApiError::UploadRejected);
        }
        body.data
            .and_then(|files| files.into_iter().next())
            .map(|file| file.url)
            .ok_or(ApiError::UploadRejected)
    }
}
