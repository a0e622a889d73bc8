//! Investor domain types shared by the draft model, the API client and the
//! HTTP layer.

pub mod investor;
pub mod types;
pub mod vocabulary;
