//! Submitting a draft to the investor API.

use crate::client::{ApiError, InvestorApi};
use crate::drafts::{DraftId, DraftStore, FormMessage};
use crate::forms::investors::FormKind;

use super::{ServiceError, ServiceResult};

pub const CREATED_MESSAGE: &str = "Investor added successfully!";
pub const UPDATED_MESSAGE: &str = "Investor updated successfully!";
const UPDATE_FAILED_MESSAGE: &str = "An error occurred while updating the investor.";

/// What a successful submit means for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Investor created and the draft reset; leave for the listing.
    Created,
    /// Investor updated; the draft stays as submitted.
    Updated,
}

fn classify(kind: &FormKind, error: ApiError) -> ServiceError {
    match (kind, error) {
        (FormKind::Create, ApiError::Server { message, status }) => {
            let detail = message.unwrap_or_else(|| format!("request failed with status {status}"));
            ServiceError::Server(format!("Server error: {detail}"))
        }
        (FormKind::Update(_), ApiError::Server { message, .. }) => {
            ServiceError::Server(message.unwrap_or_else(|| UPDATE_FAILED_MESSAGE.to_string()))
        }
        (_, ApiError::Network(_)) => ServiceError::Network,
        (_, ApiError::UploadRejected | ApiError::Unexpected(_)) => ServiceError::Unexpected,
    }
}

/// Validates the draft and sends it as a create or update request.
///
/// Exactly one request is made per accepted attempt. Attempts are refused
/// while another submit or an image upload of the same form is in flight.
/// A failed create never resets the draft or navigates away.
pub async fn submit_draft<A>(
    draft_id: DraftId,
    store: &DraftStore,
    api: &A,
) -> ServiceResult<SubmitOutcome>
where
    A: InvestorApi,
{
    let prepared = store.with_session(draft_id, |session| {
        if session.draft.has_pending_uploads() && !session.submission.is_in_flight() {
            return Err(ServiceError::UploadInProgress);
        }
        session.submission.begin()?;

        match session.draft.to_record(&session.kind) {
            Ok(record) => {
                session.submission.start_request();
                session.message = None;
                Ok((session.kind.clone(), record))
            }
            Err(e) => {
                let message = e.to_string();
                session.submission.fail(message.clone());
                session.submission.settle();
                session.message = Some(FormMessage::error(message.clone()));
                Err(ServiceError::Form(message))
            }
        }
    })?;
    let (kind, record) = prepared?;

    let result = match &kind {
        FormKind::Create => api.create_investor(&record).await,
        FormKind::Update(investor_id) => api.update_investor(investor_id, &record).await,
    };

    let outcome = match result {
        Ok(()) => Ok(match kind {
            FormKind::Create => SubmitOutcome::Created,
            FormKind::Update(_) => SubmitOutcome::Updated,
        }),
        Err(e) => {
            log::error!("Failed to submit draft {draft_id}: {e}");
            Err(classify(&kind, e))
        }
    };

    let recorded = store.with_session(draft_id, |session| {
        match &outcome {
            Ok(SubmitOutcome::Created) => {
                session.submission.succeed();
                session.draft.reset();
                session.message = Some(FormMessage::success(CREATED_MESSAGE));
            }
            Ok(SubmitOutcome::Updated) => {
                session.submission.succeed();
                session.message = Some(FormMessage::success(UPDATED_MESSAGE));
            }
            Err(e) => {
                session.submission.fail(e.to_string());
                session.message = Some(FormMessage::error(e.to_string()));
            }
        }
        session.submission.settle();
    });
    match recorded {
        Ok(()) => {}
        // Evicted while the request ran; the request itself still happened.
        Err(ServiceError::NotFound) => {
            log::warn!("Draft {draft_id} was evicted before its submit result arrived");
        }
        Err(e) => log::error!("Failed to record submit result of draft {draft_id}: {e}"),
    }

    outcome
}
