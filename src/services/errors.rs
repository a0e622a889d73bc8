use thiserror::Error;

/// Generic error type used by service layer functions.
///
/// Variants other than `NotFound` and `Internal` display as the message shown
/// to the user on the form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Requested draft or investor was not found.
    #[error("not found")]
    NotFound,
    /// An unexpected internal error occurred.
    #[error("internal error")]
    Internal,
    /// The draft could not be edited or failed validation.
    #[error("{0}")]
    Form(String),
    #[error("The form is already being submitted.")]
    SubmissionInFlight,
    #[error("Please wait for image uploads to finish.")]
    UploadInProgress,
    /// The API answered with an error.
    #[error("{0}")]
    Server(String),
    /// The API could not be reached.
    #[error("Network error: Please check your internet connection.")]
    Network,
    #[error("An unexpected error occurred.")]
    Unexpected,
    /// An image upload failed. Reported apart from submit failures.
    #[error("{0}")]
    Upload(String),
}

/// Convenient alias for results returned from service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;
