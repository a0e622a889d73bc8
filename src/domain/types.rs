//! Strongly-typed value objects used by domain entities.
//!
//! Payloads sent to the investor API carry these wrappers for the fields the
//! forms require, so that emptiness is rejected before a request is built.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Errors produced when attempting to construct constrained domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// A string was empty or whitespace-only after trimming.
    #[error("{0} cannot be empty")]
    EmptyString(&'static str),
    /// Catch-all for custom validation failures.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

fn trim_and_require_non_empty<S: Into<String>>(
    value: S,
    field: &'static str,
) -> Result<String, TypeConstraintError> {
    let trimmed = value.into().trim().to_string();
    if trimmed.is_empty() {
        Err(TypeConstraintError::EmptyString(field))
    } else {
        Ok(trimmed)
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                trim_and_require_non_empty(value, $field).map(Self)
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }

        impl PartialEq<$name> for &str {
            fn eq(&self, other: &$name) -> bool {
                *self == other.as_str()
            }
        }
    };
}

non_empty_string_newtype!(
    InvestorId,
    "Server-assigned investor identifier. Opaque to this service.",
    "investor id"
);
non_empty_string_newtype!(
    InvestorName,
    "Investor display name enforcing non-empty values.",
    "name"
);
non_empty_string_newtype!(
    InvestorWebsite,
    "Investor website enforcing non-empty values.",
    "website"
);
non_empty_string_newtype!(
    InvestorDescription,
    "Investor description enforcing non-empty values.",
    "description"
);

/// How the value of an image slot is supplied.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImageMode {
    /// The user types a literal image URL.
    Url,
    /// The user uploads a file and the returned URL is stored.
    #[default]
    Upload,
}

impl ImageMode {
    /// String representation used in form fields and templates.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Upload => "upload",
        }
    }

    /// Mode implied by an already stored URL: present means it was typed.
    pub fn for_existing_value(value: &str) -> Self {
        if value.trim().is_empty() {
            Self::Upload
        } else {
            Self::Url
        }
    }
}

impl Display for ImageMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for ImageMode {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "url" => Ok(Self::Url),
            "upload" => Ok(Self::Upload),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "image mode: {other}"
            ))),
        }
    }
}

impl TryFrom<String> for ImageMode {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}
