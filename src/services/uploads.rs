//! Image uploads into draft slots.

use crate::client::{ApiError, InvestorApi, UploadedImage};
use crate::drafts::{DraftId, DraftStore, FormMessage};
use crate::forms::investors::{SlotRef, UploadCompletion, UploadTicket};

use super::{ServiceError, ServiceResult};

pub const UPLOADED_MESSAGE: &str = "Image uploaded successfully!";
const REJECTED_MESSAGE: &str = "Image upload failed. Please try again.";
const FAILED_MESSAGE: &str = "An error occurred while uploading the image.";

/// Clears the slot's pending flag if the upload future is dropped before the
/// API call returns, so an abandoned request cannot block submission.
struct PendingUpload<'a> {
    draft_id: DraftId,
    ticket: UploadTicket,
    store: &'a DraftStore,
}

impl PendingUpload<'_> {
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl Drop for PendingUpload<'_> {
    fn drop(&mut self) {
        let ticket = self.ticket;
        match self
            .store
            .with_session(self.draft_id, |session| session.draft.complete_upload(ticket, None))
        {
            Ok(UploadCompletion::Failed) => {
                log::warn!("Upload for draft {} was abandoned", self.draft_id);
            }
            Ok(_) | Err(ServiceError::NotFound) => {}
            Err(e) => log::error!("Failed to release upload of draft {}: {e}", self.draft_id),
        }
    }
}

/// Uploads `file` and stores the returned URL in `slot`.
///
/// The slot is marked pending before the request and the store lock is not
/// held while it runs, so other slots of the same form stay editable. The
/// result only lands in the slot it was started for; if that slot was removed
/// or reset in the meantime the URL is dropped.
pub async fn upload_image<A>(
    draft_id: DraftId,
    slot: SlotRef,
    file: UploadedImage,
    store: &DraftStore,
    api: &A,
) -> ServiceResult<UploadCompletion>
where
    A: InvestorApi,
{
    if file.bytes.is_empty() {
        return Err(ServiceError::Upload("No file selected.".to_string()));
    }

    let ticket = store
        .with_session(draft_id, |session| session.draft.begin_upload(slot))?
        .map_err(|e| ServiceError::Form(e.to_string()))?;
    let guard = PendingUpload {
        draft_id,
        ticket,
        store,
    };

    let file_name = file.file_name.clone();
    let result = api.upload_file(file).await;
    guard.disarm();
    let uploaded = match &result {
        Ok(url) => Some(url.clone()),
        Err(e) => {
            log::error!("Failed to upload {file_name} for {slot} of draft {draft_id}: {e}");
            None
        }
    };

    let completion = store.with_session(draft_id, |session| {
        let completion = session.draft.complete_upload(ticket, uploaded);
        match (&result, completion) {
            (_, UploadCompletion::Discarded) => {}
            (Ok(_), _) => session.message = Some(FormMessage::success(UPLOADED_MESSAGE)),
            (Err(ApiError::UploadRejected), _) => {
                session.message = Some(FormMessage::error(REJECTED_MESSAGE))
            }
            (Err(_), _) => session.message = Some(FormMessage::error(FAILED_MESSAGE)),
        }
        completion
    })?;

    if completion == UploadCompletion::Discarded {
        log::info!("Discarded upload of {file_name} for draft {draft_id}: slot changed");
    }

    match result {
        Ok(_) => Ok(completion),
        Err(ApiError::UploadRejected) => Err(ServiceError::Upload(REJECTED_MESSAGE.to_string())),
        Err(_) => Err(ServiceError::Upload(FAILED_MESSAGE.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test::TestInvestorApi;
    use crate::domain::types::ImageMode;
    use crate::drafts::SubmissionState;
    use crate::forms::investors::{FormKind, InvestorDraft};
    use chrono::Duration;

    fn image(name: &str) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    fn draft_with_entries(count: usize) -> InvestorDraft {
        let mut draft = InvestorDraft::default();
        for _ in 0..count {
            draft.add_portfolio_entry();
        }
        draft
    }

    #[actix_web::test]
    async fn uploaded_url_becomes_the_stored_value() {
        let store = DraftStore::new(Duration::minutes(30));
        let api = TestInvestorApi::new();
        let draft_id = store
            .open(FormKind::Create, draft_with_entries(1), None)
            .unwrap();

        let completion = upload_image(draft_id, SlotRef::Logo(0), image("a.png"), &store, &api)
            .await
            .unwrap();

        assert_eq!(completion, UploadCompletion::Applied);
        let session = store.snapshot(draft_id).unwrap();
        let logo = session.draft.portfolio()[0].logo();
        assert_eq!(logo.value(), "https://cdn.test/a.png");
        assert_eq!(logo.preview(), Some("https://cdn.test/a.png"));
        assert!(!logo.is_pending());
        assert_eq!(session.message, Some(FormMessage::success(UPLOADED_MESSAGE)));
    }

    #[actix_web::test]
    async fn slower_upload_only_updates_its_own_slot() {
        let store = DraftStore::new(Duration::minutes(30));
        let api = TestInvestorApi::new();
        let draft_id = store
            .open(FormKind::Create, draft_with_entries(2), None)
            .unwrap();
        let release = api.hold_upload("slow.png");

        let slow = upload_image(draft_id, SlotRef::Logo(0), image("slow.png"), &store, &api);
        let fast = async {
            let completion =
                upload_image(draft_id, SlotRef::Logo(1), image("fast.png"), &store, &api).await;
            let pending = store.snapshot(draft_id).unwrap().draft.portfolio()[0]
                .logo()
                .is_pending();
            release.send(()).unwrap();
            (completion, pending)
        };
        let (slow, (fast, slow_was_pending)) = futures::join!(slow, fast);

        assert_eq!(slow.unwrap(), UploadCompletion::Applied);
        assert_eq!(fast.unwrap(), UploadCompletion::Applied);
        assert!(slow_was_pending);
        let draft = store.snapshot(draft_id).unwrap().draft;
        assert_eq!(draft.portfolio()[0].logo().value(), "https://cdn.test/slow.png");
        assert_eq!(draft.portfolio()[1].logo().value(), "https://cdn.test/fast.png");
    }

    #[actix_web::test]
    async fn upload_for_a_removed_entry_is_dropped() {
        let store = DraftStore::new(Duration::minutes(30));
        let api = TestInvestorApi::new();
        let draft_id = store
            .open(FormKind::Create, draft_with_entries(2), None)
            .unwrap();
        let release = api.hold_upload("gone.png");

        let upload = upload_image(draft_id, SlotRef::Logo(0), image("gone.png"), &store, &api);
        let remove = async {
            store
                .with_session(draft_id, |session| {
                    session.draft.remove_portfolio_entry(0).unwrap();
                })
                .unwrap();
            release.send(()).unwrap();
        };
        let (completion, ()) = futures::join!(upload, remove);

        assert_eq!(completion.unwrap(), UploadCompletion::Discarded);
        let draft = store.snapshot(draft_id).unwrap().draft;
        assert_eq!(draft.portfolio().len(), 1);
        assert_eq!(draft.portfolio()[0].logo().value(), "");
    }

    #[actix_web::test]
    async fn rejected_upload_is_reported_without_touching_submission() {
        let store = DraftStore::new(Duration::minutes(30));
        let api = TestInvestorApi::new().failing_upload("bad.png", ApiError::UploadRejected);
        let mut draft = InvestorDraft::default();
        draft
            .set_image_mode(SlotRef::Profile, ImageMode::Upload)
            .unwrap();
        let draft_id = store.open(FormKind::Create, draft, None).unwrap();

        let err = upload_image(draft_id, SlotRef::Profile, image("bad.png"), &store, &api)
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Upload(REJECTED_MESSAGE.into()));
        let session = store.snapshot(draft_id).unwrap();
        assert_eq!(session.draft.image().value(), "");
        assert!(!session.draft.has_pending_uploads());
        assert_eq!(session.submission, SubmissionState::Idle);
        assert_eq!(session.message, Some(FormMessage::error(REJECTED_MESSAGE)));
    }

    #[actix_web::test]
    async fn transport_failure_uses_its_own_message() {
        let store = DraftStore::new(Duration::minutes(30));
        let api =
            TestInvestorApi::new().failing_upload("a.png", ApiError::Network("timeout".into()));
        let draft_id = store
            .open(FormKind::Create, draft_with_entries(1), None)
            .unwrap();

        let err = upload_image(draft_id, SlotRef::Logo(0), image("a.png"), &store, &api)
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Upload(FAILED_MESSAGE.into()));
    }

    #[actix_web::test]
    async fn dropped_upload_releases_its_slot() {
        let store = DraftStore::new(Duration::minutes(30));
        let api = TestInvestorApi::new();
        let draft_id = store
            .open(FormKind::Create, draft_with_entries(1), None)
            .unwrap();
        let _release = api.hold_upload("abandoned.png");

        let mut upload = Box::pin(upload_image(
            draft_id,
            SlotRef::Logo(0),
            image("abandoned.png"),
            &store,
            &api,
        ));
        assert!(futures::poll!(&mut upload).is_pending());
        assert!(store.snapshot(draft_id).unwrap().draft.has_pending_uploads());

        drop(upload);

        let session = store.snapshot(draft_id).unwrap();
        assert!(!session.draft.has_pending_uploads());
        assert_eq!(session.draft.portfolio()[0].logo().value(), "");
        assert_eq!(session.message, None);
    }

    #[actix_web::test]
    async fn upload_into_url_mode_slot_is_refused() {
        let store = DraftStore::new(Duration::minutes(30));
        let api = TestInvestorApi::new();
        let draft_id = store
            .open(FormKind::Create, InvestorDraft::default(), None)
            .unwrap();

        let err = upload_image(draft_id, SlotRef::Profile, image("a.png"), &store, &api)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Form(_)));
        assert!(api.calls().is_empty());
    }
}
