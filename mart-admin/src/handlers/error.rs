use crate::services::BackendError;
use askama::Template;
use axum::response::{IntoResponse, Response};
use mart_core::error::AppError;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}

/// Error returned by page handlers, rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl From<BackendError> for PageError {
    fn from(err: BackendError) -> Self {
        PageError(err.into())
    }
}

impl From<validator::ValidationErrors> for PageError {
    fn from(err: validator::ValidationErrors) -> Self {
        PageError(err.into())
    }
}

/// One line per failed form field, sorted by field name.
pub fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, failures)| {
            let reasons: Vec<String> = failures
                .iter()
                .map(|failure| match &failure.message {
                    Some(message) => message.to_string(),
                    None => failure.code.to_string(),
                })
                .collect();
            format!("{field}: {}", reasons.join(", "))
        })
        .collect();
    messages.sort();
    messages
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Page request failed");
        } else {
            tracing::debug!(error = %self.0, "Page request rejected");
        }

        let message = match &self.0 {
            AppError::ValidationError(errors) => format!("Please check the form: {errors}"),
            other => other.public_message(),
        };

        (
            status,
            ErrorTemplate {
                status: status.as_u16(),
                message,
            },
        )
            .into_response()
    }
}
