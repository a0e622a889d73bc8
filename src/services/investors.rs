//! Opening, rendering and editing investor forms.

use crate::client::InvestorApi;
use crate::domain::types::{ImageMode, InvestorId};
use crate::domain::vocabulary::{TagField, TagVocabulary};
use crate::drafts::{DraftId, DraftStore, FormMessage, FormSession};
use crate::forms::investors::{EntryField, FormKind, InvestorDraft, ScalarField, SlotRef};

use super::{ServiceError, ServiceResult};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to fetch investor data.";

/// A single user edit applied to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    SetScalar(ScalarField, String),
    ToggleTag(TagField, String),
    RemoveTag(TagField, String),
    AddEntry,
    RemoveEntry(usize),
    SetEntryField(usize, EntryField, String),
    SetImageMode(SlotRef, ImageMode),
    SetImageUrl(SlotRef, String),
}

/// Opens an empty create form.
pub fn open_create_form(store: &DraftStore) -> ServiceResult<DraftId> {
    store.open(FormKind::Create, InvestorDraft::default(), None)
}

/// Fetches an investor once and opens an update form for it.
///
/// A failed fetch still opens the form, with an empty draft and an error
/// message, so the user can fill it in by hand.
pub async fn open_update_form<A>(
    investor_id: &str,
    store: &DraftStore,
    api: &A,
) -> ServiceResult<DraftId>
where
    A: InvestorApi,
{
    let investor_id = InvestorId::new(investor_id).map_err(|_| ServiceError::NotFound)?;

    let (draft, message) = match api.get_investor(&investor_id).await {
        Ok(stored) => (InvestorDraft::from_record(stored), None),
        Err(e) => {
            log::error!("Failed to fetch investor {investor_id}: {e}");
            (
                InvestorDraft::default(),
                Some(FormMessage::error(LOAD_FAILED_MESSAGE)),
            )
        }
    };

    store.open(FormKind::Update(investor_id), draft, message)
}

/// Returns a copy of the form session for rendering.
pub fn show_form(draft_id: DraftId, store: &DraftStore) -> ServiceResult<FormSession> {
    store.snapshot(draft_id)
}

/// Applies one edit to the draft.
pub fn edit_draft(
    draft_id: DraftId,
    edit: DraftEdit,
    store: &DraftStore,
    vocabulary: &TagVocabulary,
) -> ServiceResult<()> {
    let result = store.with_session(draft_id, |session| {
        let draft = &mut session.draft;
        match edit {
            DraftEdit::SetScalar(field, value) => {
                draft.set_scalar(field, value);
                Ok(())
            }
            DraftEdit::ToggleTag(field, value) => {
                draft.toggle_tag(field, &value, vocabulary).map(|_| ())
            }
            DraftEdit::RemoveTag(field, value) => {
                draft.remove_tag(field, &value);
                Ok(())
            }
            DraftEdit::AddEntry => {
                draft.add_portfolio_entry();
                Ok(())
            }
            DraftEdit::RemoveEntry(index) => draft.remove_portfolio_entry(index).map(|_| ()),
            DraftEdit::SetEntryField(index, field, value) => {
                draft.set_entry_field(index, field, value)
            }
            DraftEdit::SetImageMode(slot, mode) => draft.set_image_mode(slot, mode),
            DraftEdit::SetImageUrl(slot, value) => draft.set_image_url(slot, value),
        }
    })?;

    result.map_err(|e| {
        log::warn!("Rejected edit of draft {draft_id}: {e}");
        ServiceError::Form(e.to_string())
    })
}
