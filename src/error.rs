use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("transition rejected: {0}")]
    TransitionRejected(String),

    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("remote service refused request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short, user-facing text for the transient notification area.
    pub fn notification(&self) -> String {
        match self {
            AppError::Precondition(msg) => msg.clone(),
            AppError::TransitionRejected(msg) => format!("Update refused: {msg}"),
            AppError::RemoteUnavailable(_) => "Service unreachable, try again".to_string(),
            AppError::Rejected { message, .. } => format!("Request refused: {message}"),
            AppError::Config(msg) | AppError::Internal(msg) => msg.clone(),
        }
    }

    /// Status changes refused by the service become `TransitionRejected`; everything
    /// else passes through.
    pub fn into_transition_error(self) -> AppError {
        match self {
            AppError::Rejected { status, message } => {
                AppError::TransitionRejected(format!("{message} (status {status})"))
            }
            other => other,
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            AppError::Precondition(_) => "precondition",
            AppError::TransitionRejected(_) | AppError::Rejected { .. } => "rejected",
            AppError::RemoteUnavailable(_) => "unavailable",
            AppError::Config(_) | AppError::Internal(_) => "error",
        }
    }
}
