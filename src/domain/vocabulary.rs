//! Fixed option lists offered by the investor forms.
//!
//! Compiled-in defaults can be replaced per deployment through the
//! `vocabulary` section of the server configuration.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::domain::types::TypeConstraintError;

const BUSINESS_MODELS: [&str; 8] = [
    "B2B",
    "B2C",
    "B2B2C",
    "D2C",
    "SaaS",
    "Marketplace",
    "Subscription",
    "E-commerce",
];

const SECTORS: [&str; 12] = [
    "Fintech",
    "Healthtech",
    "Edtech",
    "AI/ML",
    "SaaS",
    "E-commerce",
    "Agritech",
    "Cleantech",
    "Deeptech",
    "Gaming",
    "Logistics",
    "Media",
];

const INVESTOR_TYPES: [&str; 8] = [
    "Angel Investor",
    "Venture Capital",
    "Micro VC",
    "Corporate VC",
    "Family Office",
    "Accelerator",
    "Incubator",
    "Private Equity",
];

const GEOGRAPHIES: [&str; 8] = [
    "India",
    "United States",
    "Europe",
    "Southeast Asia",
    "Middle East",
    "Africa",
    "Latin America",
    "Global",
];

const INVESTMENT_STAGES: [&str; 7] = [
    "Pre-Seed",
    "Seed",
    "Series A",
    "Series B",
    "Series C",
    "Growth",
    "Late Stage",
];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Set-valued investor fields whose members come from a vocabulary.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TagField {
    #[serde(rename = "businessModel")]
    BusinessModel,
    #[serde(rename = "sectorInterested")]
    SectorInterested,
}

impl TagField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BusinessModel => "businessModel",
            Self::SectorInterested => "sectorInterested",
        }
    }
}

impl Display for TagField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TagField {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "businessModel" => Ok(Self::BusinessModel),
            "sectorInterested" => Ok(Self::SectorInterested),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "tag field: {other}"
            ))),
        }
    }
}

/// Option lists for the selectors and tag pickers of the forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TagVocabulary {
    pub business_models: Vec<String>,
    pub sectors: Vec<String>,
    pub investor_types: Vec<String>,
    pub geographies: Vec<String>,
    pub investment_stages: Vec<String>,
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self {
            business_models: owned(&BUSINESS_MODELS),
            sectors: owned(&SECTORS),
            investor_types: owned(&INVESTOR_TYPES),
            geographies: owned(&GEOGRAPHIES),
            investment_stages: owned(&INVESTMENT_STAGES),
        }
    }
}

impl TagVocabulary {
    /// Options available for a set-valued field.
    pub fn tags(&self, field: TagField) -> &[String] {
        match field {
            TagField::BusinessModel => &self.business_models,
            TagField::SectorInterested => &self.sectors,
        }
    }

    /// Whether `value` is an allowed member of `field`.
    pub fn contains(&self, field: TagField, value: &str) -> bool {
        self.tags(field).iter().any(|tag| tag == value)
    }
}
