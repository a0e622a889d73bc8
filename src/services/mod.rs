pub mod errors;
pub mod investors;
pub mod submission;
pub mod uploads;

pub use errors::{ServiceError, ServiceResult};
