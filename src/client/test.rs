use std::collections::HashMap;
use std::sync::Mutex;

use futures::channel::oneshot;

use crate::client::{ApiError, ApiResult, InvestorApi, UploadedImage};
use crate::domain::investor::{InvestorRecord, StoredInvestor};
use crate::domain::types::InvestorId;

/// A call observed by [`TestInvestorApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Create(InvestorRecord),
    Get(String),
    Update(String, InvestorRecord),
    Upload(String),
}

/// Simple in-memory API double used for unit tests.
///
/// Uploads succeed with `https://cdn.test/<file name>` unless the file name
/// was registered as failing. Held uploads wait until their sender fires.
#[derive(Default)]
pub struct TestInvestorApi {
    investors: HashMap<String, StoredInvestor>,
    submit_error: Option<ApiError>,
    failing_uploads: HashMap<String, ApiError>,
    held_uploads: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    held_submit: Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl TestInvestorApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_investor(mut self, id: &str, investor: StoredInvestor) -> Self {
        self.investors.insert(id.to_string(), investor);
        self
    }

    /// Makes create and update calls fail with `error`.
    pub fn failing_submits(mut self, error: ApiError) -> Self {
        self.submit_error = Some(error);
        self
    }

    pub fn failing_upload(mut self, file_name: &str, error: ApiError) -> Self {
        self.failing_uploads.insert(file_name.to_string(), error);
        self
    }

    /// Holds the upload of `file_name` until the returned sender fires.
    pub fn hold_upload(&self, file_name: &str) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.held_uploads
            .lock()
            .unwrap()
            .insert(file_name.to_string(), receiver);
        sender
    }

    /// Holds the next create or update until the returned sender fires.
    pub fn hold_submit(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        *self.held_submit.lock().unwrap() = Some(receiver);
        sender
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn submit_result(&self) -> ApiResult<()> {
        let held = self.held_submit.lock().unwrap().take();
        if let Some(receiver) = held {
            let _ = receiver.await;
        }
        match &self.submit_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl InvestorApi for TestInvestorApi {
    async fn create_investor(&self, record: &InvestorRecord) -> ApiResult<()> {
        self.record(ApiCall::Create(record.clone()));
        self.submit_result().await
    }

    async fn get_investor(&self, id: &InvestorId) -> ApiResult<StoredInvestor> {
        self.record(ApiCall::Get(id.to_string()));
        self.investors
            .get(id.as_str())
            .cloned()
            .ok_or(ApiError::Server {
                status: 404,
                message: Some("Investor not found".to_string()),
            })
    }

    async fn update_investor(&self, id: &InvestorId, record: &InvestorRecord) -> ApiResult<()> {
        self.record(ApiCall::Update(id.to_string(), record.clone()));
        self.submit_result().await
    }

    async fn upload_file(&self, file: UploadedImage) -> ApiResult<String> {
        self.record(ApiCall::Upload(file.file_name.clone()));
        let held = self.held_uploads.lock().unwrap().remove(&file.file_name);
        if let Some(receiver) = held {
            let _ = receiver.await;
        }
        match self.failing_uploads.get(&file.file_name) {
            Some(error) => Err(error.clone()),
            None => Ok(format!("https://cdn.test/{}", file.file_name)),
        }
    }
}
