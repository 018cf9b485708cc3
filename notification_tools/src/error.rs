use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Notification request failed: {0}")]
    RequestError(String),
    #[error("Notification rejected. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Gave up after {attempts} attempts. Last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}
