//! Browser form posts that edit an open draft.

use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{ImageMode, TypeConstraintError};
use crate::domain::vocabulary::TagField;
use crate::forms::investors::{EntryField, ScalarField, SlotRef};
use crate::services::investors::DraftEdit;

#[derive(Debug, Error)]
pub enum EditFormError {
    #[error("Edit form validation failed: {0}")]
    Validation(String),
    #[error("Edit form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for EditFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for EditFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

#[derive(Deserialize, Validate)]
pub struct SetFieldForm {
    #[validate(length(min = 1))]
    pub field: String,
    #[serde(default)]
    pub value: String,
}

impl TryFrom<SetFieldForm> for DraftEdit {
    type Error = EditFormError;

    fn try_from(value: SetFieldForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(DraftEdit::SetScalar(
            ScalarField::try_from(value.field.as_str())?,
            value.value,
        ))
    }
}

#[derive(Deserialize, Validate)]
pub struct TagForm {
    #[validate(length(min = 1))]
    pub field: String,
    #[validate(length(min = 1))]
    pub value: String,
}

impl TagForm {
    fn parts(self) -> Result<(TagField, String), EditFormError> {
        self.validate()?;
        Ok((TagField::try_from(self.field.as_str())?, self.value))
    }

    pub fn into_toggle(self) -> Result<DraftEdit, EditFormError> {
        let (field, value) = self.parts()?;
        Ok(DraftEdit::ToggleTag(field, value))
    }

    pub fn into_remove(self) -> Result<DraftEdit, EditFormError> {
        let (field, value) = self.parts()?;
        Ok(DraftEdit::RemoveTag(field, value))
    }
}

/// Edit of one portfolio entry; the entry index comes from the path.
#[derive(Deserialize, Validate)]
pub struct EntryFieldForm {
    #[validate(length(min = 1))]
    pub field: String,
    #[serde(default)]
    pub value: String,
}

impl EntryFieldForm {
    pub fn into_edit(self, index: usize) -> Result<DraftEdit, EditFormError> {
        self.validate()?;
        Ok(DraftEdit::SetEntryField(
            index,
            EntryField::try_from(self.field.as_str())?,
            self.value,
        ))
    }
}

#[derive(Deserialize, Validate)]
pub struct ImageModeForm {
    #[validate(length(min = 1))]
    pub slot: String,
    #[validate(length(min = 1))]
    pub mode: String,
}

impl TryFrom<ImageModeForm> for DraftEdit {
    type Error = EditFormError;

    fn try_from(value: ImageModeForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(DraftEdit::SetImageMode(
            SlotRef::try_from(value.slot.as_str())?,
            ImageMode::try_from(value.mode.as_str())?,
        ))
    }
}

#[derive(Deserialize, Validate)]
pub struct ImageUrlForm {
    #[validate(length(min = 1))]
    pub slot: String,
    #[serde(default)]
    pub value: String,
}

impl TryFrom<ImageUrlForm> for DraftEdit {
    type Error = EditFormError;

    fn try_from(value: ImageUrlForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(DraftEdit::SetImageUrl(
            SlotRef::try_from(value.slot.as_str())?,
            value.value.trim().to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_field_form_maps_wire_names() {
        let form = SetFieldForm {
            field: "checkSize".to_string(),
            value: "5".to_string(),
        };

        let edit: DraftEdit = form.try_into().unwrap();

        assert_eq!(edit, DraftEdit::SetScalar(ScalarField::CheckSize, "5".into()));
    }

    #[test]
    fn set_field_form_rejects_unknown_fields() {
        let form = SetFieldForm {
            field: "image".to_string(),
            value: "x".to_string(),
        };

        let edit: Result<DraftEdit, _> = form.try_into();
        assert!(matches!(edit, Err(EditFormError::TypeConstraint(_))));
    }

    #[test]
    fn tag_form_builds_toggle_and_remove() {
        let toggle = TagForm {
            field: "businessModel".to_string(),
            value: "B2B".to_string(),
        }
        .into_toggle()
        .unwrap();
        let remove = TagForm {
            field: "sectorInterested".to_string(),
            value: "Fintech".to_string(),
        }
        .into_remove()
        .unwrap();

        assert_eq!(
            toggle,
            DraftEdit::ToggleTag(TagField::BusinessModel, "B2B".into())
        );
        assert_eq!(
            remove,
            DraftEdit::RemoveTag(TagField::SectorInterested, "Fintech".into())
        );
    }

    #[test]
    fn image_mode_form_parses_slot_and_mode() {
        let form = ImageModeForm {
            slot: "logo:1".to_string(),
            mode: "url".to_string(),
        };

        let edit: DraftEdit = form.try_into().unwrap();

        assert_eq!(edit, DraftEdit::SetImageMode(SlotRef::Logo(1), ImageMode::Url));
    }

    #[test]
    fn empty_tag_value_fails_validation() {
        let result = TagForm {
            field: "businessModel".to_string(),
            value: String::new(),
        }
        .into_toggle();

        assert!(matches!(result, Err(EditFormError::Validation(_))));
    }
}
