//! Draft state behind the create and update investor forms.
//!
//! [`InvestorDraft`] owns every editable value of one form. Each image-bearing
//! field is an [`ImageSlot`] holding its input mode, stored value and an
//! in-flight marker; the preview shown to the user is derived from the stored
//! value, so it can never disagree with what will be submitted.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::domain::investor::{InvestorRecord, PortfolioCompany, StoredInvestor};
use crate::domain::types::{
    ImageMode, InvestorDescription, InvestorId, InvestorName, InvestorWebsite, TypeConstraintError,
};
use crate::domain::vocabulary::{TagField, TagVocabulary};

/// Scalar investor attributes editable through `set_scalar`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ScalarField {
    Name,
    Website,
    Description,
    Geography,
    InvestmentStages,
    InvestorType,
    CheckSize,
    Headquarter,
    ContactLink,
}

impl ScalarField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Website => "website",
            Self::Description => "description",
            Self::Geography => "geography",
            Self::InvestmentStages => "investmentStages",
            Self::InvestorType => "investorType",
            Self::CheckSize => "checkSize",
            Self::Headquarter => "headquarter",
            Self::ContactLink => "contactLink",
        }
    }
}

impl TryFrom<&str> for ScalarField {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "name" => Ok(Self::Name),
            "website" => Ok(Self::Website),
            "description" => Ok(Self::Description),
            "geography" => Ok(Self::Geography),
            "investmentStages" => Ok(Self::InvestmentStages),
            "investorType" => Ok(Self::InvestorType),
            "checkSize" => Ok(Self::CheckSize),
            "headquarter" => Ok(Self::Headquarter),
            "contactLink" => Ok(Self::ContactLink),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "scalar field: {other}"
            ))),
        }
    }
}

/// Text sub-fields of a portfolio entry. The logo goes through its image slot.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EntryField {
    Name,
    Link,
}

impl TryFrom<&str> for EntryField {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "name" => Ok(Self::Name),
            "link" => Ok(Self::Link),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "portfolio field: {other}"
            ))),
        }
    }
}

/// Stable identity of a portfolio entry, unaffected by removal of siblings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EntryKey(u64);

impl EntryKey {
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Positional reference to an image slot as the user sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotRef {
    /// The investor's profile image.
    Profile,
    /// Logo of the portfolio entry at this position.
    Logo(usize),
}

impl Display for SlotRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Logo(index) => write!(f, "logo:{index}"),
        }
    }
}

impl TryFrom<&str> for SlotRef {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value == "profile" {
            return Ok(Self::Profile);
        }
        value
            .strip_prefix("logo:")
            .and_then(|index| index.parse::<usize>().ok())
            .map(Self::Logo)
            .ok_or_else(|| TypeConstraintError::InvalidValue(format!("image slot: {value}")))
    }
}

/// Slot identity captured when an upload starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum SlotTarget {
    Profile,
    Logo(EntryKey),
}

/// Handle for an upload in flight. Completing it only ever touches the slot it
/// was issued for, and only if that slot has not been reset since.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    target: SlotTarget,
    generation: u64,
}

/// What happened to an upload result handed back to the draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadCompletion {
    /// The returned URL is now the slot's stored value.
    Applied,
    /// The upload failed; the slot keeps its previous value.
    Failed,
    /// The slot was removed, switched mode or started a newer upload.
    Discarded,
}

/// Errors raised by draft edits. None of them leave the draft modified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("'{value}' is not a valid {field} option")]
    UnknownTag { field: TagField, value: String },
    #[error("portfolio company #{} does not exist", .0 + 1)]
    EntryOutOfRange(usize),
    #[error("image slot is in {actual} mode")]
    ModeMismatch { actual: ImageMode },
}

/// Result of toggling a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagToggle {
    Added,
    Removed,
}

/// One image-bearing field with its own mode and stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSlot {
    mode: ImageMode,
    value: String,
    pending: bool,
    #[serde(skip)]
    generation: u64,
}

impl ImageSlot {
    pub fn new(mode: ImageMode) -> Self {
        Self {
            mode,
            value: String::new(),
            pending: false,
            generation: 0,
        }
    }

    /// Slot hydrated from a stored URL; the mode is derived once from it.
    pub fn from_value(value: String) -> Self {
        Self {
            mode: ImageMode::for_existing_value(&value),
            value,
            pending: false,
            generation: 0,
        }
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    /// Stored value sent on submit.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Image source to display, if any.
    pub fn preview(&self) -> Option<&str> {
        if self.value.is_empty() {
            None
        } else {
            Some(&self.value)
        }
    }

    fn set_mode(&mut self, mode: ImageMode) {
        self.mode = mode;
        self.value.clear();
        self.pending = false;
        self.generation += 1;
    }

    fn set_url(&mut self, value: String) -> Result<(), DraftError> {
        if self.mode != ImageMode::Url {
            return Err(DraftError::ModeMismatch { actual: self.mode });
        }
        self.value = value;
        Ok(())
    }

    fn begin_upload(&mut self) -> Result<u64, DraftError> {
        if self.mode != ImageMode::Upload {
            return Err(DraftError::ModeMismatch { actual: self.mode });
        }
        self.generation += 1;
        self.pending = true;
        Ok(self.generation)
    }

    fn complete_upload(&mut self, generation: u64, uploaded: Option<String>) -> UploadCompletion {
        if generation != self.generation || !self.pending {
            return UploadCompletion::Discarded;
        }
        self.pending = false;
        match uploaded {
            Some(url) => {
                self.value = url;
                UploadCompletion::Applied
            }
            None => UploadCompletion::Failed,
        }
    }
}

/// A portfolio company being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioEntryDraft {
    key: EntryKey,
    name: String,
    logo: ImageSlot,
    link: String,
}

impl PortfolioEntryDraft {
    fn new(key: EntryKey) -> Self {
        Self {
            key,
            name: String::new(),
            logo: ImageSlot::new(ImageMode::Upload),
            link: String::new(),
        }
    }

    pub fn key(&self) -> EntryKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn logo(&self) -> &ImageSlot {
        &self.logo
    }
}

/// What the draft is going to be submitted as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Create,
    Update(InvestorId),
}

/// The in-memory investor being edited by one form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorDraft {
    name: String,
    website: String,
    image: ImageSlot,
    description: String,
    geography: String,
    investment_stages: String,
    business_model: Vec<String>,
    investor_type: String,
    sector_interested: Vec<String>,
    check_size: String,
    headquarter: String,
    contact_link: String,
    portfolio_companies: Vec<PortfolioEntryDraft>,
    #[serde(skip)]
    next_entry_key: u64,
}

impl Default for InvestorDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            website: String::new(),
            image: ImageSlot::new(ImageMode::Url),
            description: String::new(),
            geography: String::new(),
            investment_stages: String::new(),
            business_model: Vec::new(),
            investor_type: String::new(),
            sector_interested: Vec::new(),
            check_size: String::new(),
            headquarter: String::new(),
            contact_link: String::new(),
            portfolio_companies: Vec::new(),
            next_entry_key: 0,
        }
    }
}

impl InvestorDraft {
    /// Builds a draft from a fetched investor.
    ///
    /// Missing strings become `""`, missing lists become empty and every
    /// image slot starts in url mode when it already has a URL, upload mode
    /// otherwise.
    pub fn from_record(stored: StoredInvestor) -> Self {
        let mut draft = Self {
            name: stored.name.unwrap_or_default(),
            website: stored.website.unwrap_or_default(),
            image: ImageSlot::from_value(stored.image.unwrap_or_default()),
            description: stored.description.unwrap_or_default(),
            geography: stored.geography.unwrap_or_default(),
            investment_stages: stored.investment_stages.unwrap_or_default(),
            business_model: stored.business_model.unwrap_or_default(),
            investor_type: stored.investor_type.unwrap_or_default(),
            sector_interested: stored.sector_interested.unwrap_or_default(),
            check_size: stored.check_size.unwrap_or_default(),
            headquarter: stored.headquarter.unwrap_or_default(),
            contact_link: stored.contact_link.unwrap_or_default(),
            ..Self::default()
        };
        for company in stored.portfolio_companies.unwrap_or_default() {
            let key = draft.allocate_key();
            draft.portfolio_companies.push(PortfolioEntryDraft {
                key,
                name: company.name.unwrap_or_default(),
                logo: ImageSlot::from_value(company.logo.unwrap_or_default()),
                link: company.link.unwrap_or_default(),
            });
        }
        draft
    }

    /// Returns the draft to the empty-record defaults.
    ///
    /// Entry keys and slot generations keep counting so that uploads started
    /// before the reset cannot land in the fresh draft.
    pub fn reset(&mut self) {
        let next_entry_key = self.next_entry_key;
        let mut image = self.image.clone();
        image.set_mode(ImageMode::Url);
        *self = Self {
            image,
            next_entry_key,
            ..Self::default()
        };
    }

    pub fn scalar(&self, field: ScalarField) -> &str {
        match field {
            ScalarField::Name => &self.name,
            ScalarField::Website => &self.website,
            ScalarField::Description => &self.description,
            ScalarField::Geography => &self.geography,
            ScalarField::InvestmentStages => &self.investment_stages,
            ScalarField::InvestorType => &self.investor_type,
            ScalarField::CheckSize => &self.check_size,
            ScalarField::Headquarter => &self.headquarter,
            ScalarField::ContactLink => &self.contact_link,
        }
    }

    fn scalar_mut(&mut self, field: ScalarField) -> &mut String {
        match field {
            ScalarField::Name => &mut self.name,
            ScalarField::Website => &mut self.website,
            ScalarField::Description => &mut self.description,
            ScalarField::Geography => &mut self.geography,
            ScalarField::InvestmentStages => &mut self.investment_stages,
            ScalarField::InvestorType => &mut self.investor_type,
            ScalarField::CheckSize => &mut self.check_size,
            ScalarField::Headquarter => &mut self.headquarter,
            ScalarField::ContactLink => &mut self.contact_link,
        }
    }

    /// Replaces a scalar attribute. Validation happens on submit.
    pub fn set_scalar(&mut self, field: ScalarField, value: impl Into<String>) {
        *self.scalar_mut(field) = value.into();
    }

    pub fn tags(&self, field: TagField) -> &[String] {
        match field {
            TagField::BusinessModel => &self.business_model,
            TagField::SectorInterested => &self.sector_interested,
        }
    }

    fn tags_mut(&mut self, field: TagField) -> &mut Vec<String> {
        match field {
            TagField::BusinessModel => &mut self.business_model,
            TagField::SectorInterested => &mut self.sector_interested,
        }
    }

    /// Removes `value` if selected, otherwise appends it.
    ///
    /// Only vocabulary members can be added. Removal accepts any present
    /// value, including ones hydrated from the server.
    pub fn toggle_tag(
        &mut self,
        field: TagField,
        value: &str,
        vocabulary: &TagVocabulary,
    ) -> Result<TagToggle, DraftError> {
        if self.remove_tag(field, value) {
            return Ok(TagToggle::Removed);
        }
        if !vocabulary.contains(field, value) {
            return Err(DraftError::UnknownTag {
                field,
                value: value.to_string(),
            });
        }
        self.tags_mut(field).push(value.to_string());
        Ok(TagToggle::Added)
    }

    /// Removes `value` from the set. Returns whether it was present.
    pub fn remove_tag(&mut self, field: TagField, value: &str) -> bool {
        let tags = self.tags_mut(field);
        let before = tags.len();
        tags.retain(|tag| tag != value);
        tags.len() != before
    }

    pub fn portfolio(&self) -> &[PortfolioEntryDraft] {
        &self.portfolio_companies
    }

    fn allocate_key(&mut self) -> EntryKey {
        let key = EntryKey(self.next_entry_key);
        self.next_entry_key += 1;
        key
    }

    /// Appends an empty portfolio entry whose logo is in upload mode.
    pub fn add_portfolio_entry(&mut self) -> EntryKey {
        let key = self.allocate_key();
        self.portfolio_companies.push(PortfolioEntryDraft::new(key));
        key
    }

    /// Removes the entry at `index`; later entries shift down by one.
    pub fn remove_portfolio_entry(
        &mut self,
        index: usize,
    ) -> Result<PortfolioEntryDraft, DraftError> {
        if index >= self.portfolio_companies.len() {
            return Err(DraftError::EntryOutOfRange(index));
        }
        Ok(self.portfolio_companies.remove(index))
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut PortfolioEntryDraft, DraftError> {
        self.portfolio_companies
            .get_mut(index)
            .ok_or(DraftError::EntryOutOfRange(index))
    }

    pub fn set_entry_field(
        &mut self,
        index: usize,
        field: EntryField,
        value: impl Into<String>,
    ) -> Result<(), DraftError> {
        let entry = self.entry_mut(index)?;
        match field {
            EntryField::Name => entry.name = value.into(),
            EntryField::Link => entry.link = value.into(),
        }
        Ok(())
    }

    pub fn image(&self) -> &ImageSlot {
        &self.image
    }

    pub fn slot(&self, slot: SlotRef) -> Option<&ImageSlot> {
        match slot {
            SlotRef::Profile => Some(&self.image),
            SlotRef::Logo(index) => self.portfolio_companies.get(index).map(|e| &e.logo),
        }
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Result<&mut ImageSlot, DraftError> {
        match slot {
            SlotRef::Profile => Ok(&mut self.image),
            SlotRef::Logo(index) => Ok(&mut self.entry_mut(index)?.logo),
        }
    }

    /// Switches a slot between url and upload input, clearing its value.
    pub fn set_image_mode(&mut self, slot: SlotRef, mode: ImageMode) -> Result<(), DraftError> {
        self.slot_mut(slot)?.set_mode(mode);
        Ok(())
    }

    /// Stores a typed URL. The slot must be in url mode.
    pub fn set_image_url(
        &mut self,
        slot: SlotRef,
        value: impl Into<String>,
    ) -> Result<(), DraftError> {
        self.slot_mut(slot)?.set_url(value.into())
    }

    /// Marks a slot as uploading and returns the ticket to complete it with.
    pub fn begin_upload(&mut self, slot: SlotRef) -> Result<UploadTicket, DraftError> {
        let target = match slot {
            SlotRef::Profile => SlotTarget::Profile,
            SlotRef::Logo(index) => SlotTarget::Logo(self.entry_mut(index)?.key),
        };
        let generation = self.slot_mut(slot)?.begin_upload()?;
        Ok(UploadTicket { target, generation })
    }

    /// Applies an upload result to the slot the ticket was issued for.
    ///
    /// `uploaded` is the remote URL, or `None` when the upload failed.
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        uploaded: Option<String>,
    ) -> UploadCompletion {
        let slot = match ticket.target {
            SlotTarget::Profile => Some(&mut self.image),
            SlotTarget::Logo(key) => self
                .portfolio_companies
                .iter_mut()
                .find(|entry| entry.key == key)
                .map(|entry| &mut entry.logo),
        };
        match slot {
            Some(slot) => slot.complete_upload(ticket.generation, uploaded),
            None => UploadCompletion::Discarded,
        }
    }

    pub fn has_pending_uploads(&self) -> bool {
        self.image.pending || self.portfolio_companies.iter().any(|e| e.logo.pending)
    }

    /// Validates the draft for `kind` and builds the request body.
    pub fn to_record(&self, kind: &FormKind) -> Result<InvestorRecord, InvestorFormError> {
        match kind {
            FormKind::Create => CreateInvestorForm::from(self).try_into(),
            FormKind::Update(_) => UpdateInvestorForm::from(self).try_into(),
        }
    }
}

#[derive(Debug, Validate)]
pub struct PortfolioCompanyForm {
    #[validate(length(min = 1))]
    pub name: String,
    pub logo: String,
    #[validate(length(min = 1))]
    pub link: String,
}

impl From<&PortfolioEntryDraft> for PortfolioCompanyForm {
    fn from(entry: &PortfolioEntryDraft) -> Self {
        Self {
            name: entry.name.trim().to_string(),
            logo: entry.logo.value.trim().to_string(),
            link: entry.link.trim().to_string(),
        }
    }
}

impl From<PortfolioCompanyForm> for PortfolioCompany {
    fn from(form: PortfolioCompanyForm) -> Self {
        Self {
            name: form.name,
            logo: form.logo,
            link: form.link,
        }
    }
}

/// Required fields of the create form.
#[derive(Debug, Validate)]
pub struct CreateInvestorForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub website: String,
    pub image: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub geography: String,
    pub investment_stages: String,
    pub business_model: Vec<String>,
    pub investor_type: String,
    pub sector_interested: Vec<String>,
    #[validate(length(min = 1))]
    pub check_size: String,
    #[validate(length(min = 1))]
    pub headquarter: String,
    #[validate(length(min = 1))]
    pub contact_link: String,
    #[validate(nested)]
    pub portfolio_companies: Vec<PortfolioCompanyForm>,
}

/// Required fields of the update form. Portfolio entries are sent as-is.
#[derive(Debug, Validate)]
pub struct UpdateInvestorForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub website: String,
    pub image: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub geography: String,
    pub investment_stages: String,
    pub business_model: Vec<String>,
    pub investor_type: String,
    pub sector_interested: Vec<String>,
    pub check_size: String,
    pub headquarter: String,
    pub contact_link: String,
    pub portfolio_companies: Vec<PortfolioCompanyForm>,
}

macro_rules! form_from_draft {
    ($form:ident) => {
        impl From<&InvestorDraft> for $form {
            fn from(draft: &InvestorDraft) -> Self {
                Self {
                    name: draft.name.trim().to_string(),
                    website: draft.website.trim().to_string(),
                    image: draft.image.value.trim().to_string(),
                    description: draft.description.trim().to_string(),
                    geography: draft.geography.clone(),
                    investment_stages: draft.investment_stages.clone(),
                    business_model: draft.business_model.clone(),
                    investor_type: draft.investor_type.clone(),
                    sector_interested: draft.sector_interested.clone(),
                    check_size: draft.check_size.trim().to_string(),
                    headquarter: draft.headquarter.trim().to_string(),
                    contact_link: draft.contact_link.trim().to_string(),
                    portfolio_companies: draft
                        .portfolio_companies
                        .iter()
                        .map(PortfolioCompanyForm::from)
                        .collect(),
                }
            }
        }

        impl TryFrom<$form> for InvestorRecord {
            type Error = InvestorFormError;

            fn try_from(value: $form) -> Result<Self, Self::Error> {
                value.validate()?;
                Ok(Self {
                    name: InvestorName::new(value.name)?,
                    website: InvestorWebsite::new(value.website)?,
                    image: value.image,
                    description: InvestorDescription::new(value.description)?,
                    geography: value.geography,
                    investment_stages: value.investment_stages,
                    business_model: value.business_model,
                    investor_type: value.investor_type,
                    sector_interested: value.sector_interested,
                    check_size: value.check_size,
                    headquarter: value.headquarter,
                    contact_link: value.contact_link,
                    portfolio_companies: value
                        .portfolio_companies
                        .into_iter()
                        .map(PortfolioCompany::from)
                        .collect(),
                })
            }
        }
    };
}

form_from_draft!(CreateInvestorForm);
form_from_draft!(UpdateInvestorForm);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvestorFormError {
    #[error("Please fill out all required fields: {}.", .0.join(", "))]
    Validation(Vec<String>),
    #[error("Investor form contains invalid data: {0}")]
    TypeConstraint(String),
}

fn field_label(field: &str) -> String {
    field.replace('_', " ")
}

fn missing_fields(errors: &HashMap<Cow<'static, str>, ValidationErrorsKind>) -> Vec<String> {
    let mut fields = Vec::new();
    for (field, kind) in errors {
        match kind {
            ValidationErrorsKind::Field(_) => fields.push(field_label(field)),
            ValidationErrorsKind::Struct(inner) => {
                for nested in missing_fields(inner.errors()) {
                    fields.push(format!("{} {nested}", field_label(field)));
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    for nested in missing_fields(inner.errors()) {
                        fields.push(format!("{} #{} {nested}", field_label(field), index + 1));
                    }
                }
            }
        }
    }
    fields.sort();
    fields
}

impl From<ValidationErrors> for InvestorFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(missing_fields(value.errors()))
    }
}

impl From<TypeConstraintError> for InvestorFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}
