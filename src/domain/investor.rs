use serde::{Deserialize, Serialize};

use crate::domain::types::{InvestorDescription, InvestorId, InvestorName, InvestorWebsite};

/// Investor profile as sent to the create and update endpoints.
///
/// Field names follow the remote API's camelCase wire format. Image input
/// modes are UI state and never part of this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestorRecord {
    pub name: InvestorName,
    pub website: InvestorWebsite,
    /// Profile image URL; empty when none was provided.
    pub image: String,
    pub description: InvestorDescription,
    pub geography: String,
    pub investment_stages: String,
    pub business_model: Vec<String>,
    pub investor_type: String,
    pub sector_interested: Vec<String>,
    pub check_size: String,
    pub headquarter: String,
    pub contact_link: String,
    pub portfolio_companies: Vec<PortfolioCompany>,
}

/// One company in an investor's portfolio, in display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortfolioCompany {
    pub name: String,
    pub logo: String,
    pub link: String,
}

/// Investor as returned by the get endpoint.
///
/// The API gives no guarantees about which fields are present, so every field
/// is optional here and defaults are applied when hydrating a draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredInvestor {
    #[serde(alias = "_id")]
    pub id: Option<InvestorId>,
    pub name: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub geography: Option<String>,
    pub investment_stages: Option<String>,
    pub business_model: Option<Vec<String>>,
    pub investor_type: Option<String>,
    pub sector_interested: Option<Vec<String>>,
    pub check_size: Option<String>,
    pub headquarter: Option<String>,
    pub contact_link: Option<String>,
    pub portfolio_companies: Option<Vec<StoredPortfolioCompany>>,
}

/// Portfolio company as returned by the get endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoredPortfolioCompany {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub link: Option<String>,
}
