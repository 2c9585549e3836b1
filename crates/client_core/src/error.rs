use reqwest::StatusCode;
use shared::error::{ApiError, ApiErrorBody, ErrorCode};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("response is missing the x-total-count header")]
    MissingTotalCount,
}

impl ClientError {
    /// Builds an API error from a non-success response, preferring the
    /// server's own `error` message over the status text.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .map(|body| body.error)
            .ok()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        Self::Api {
            status: status.as_u16(),
            code: ErrorCode::from_status(status.as_u16()),
            message,
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::Api { code, message, .. } => ApiError::new(*code, message.clone()),
            Self::Http(err) => ApiError::new(
                err.status()
                    .map(|status| ErrorCode::from_status(status.as_u16()))
                    .unwrap_or(ErrorCode::Internal),
                err.to_string(),
            ),
            Self::MissingTotalCount => ApiError::new(ErrorCode::Internal, self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_status_text() {
        let err = ClientError::from_response(StatusCode::FORBIDDEN, r#"{"error":"access denied"}"#);
        assert_eq!(err.to_string(), "access denied");
        assert!(matches!(err.to_api_error().code, ErrorCode::Forbidden));
    }

    #[test]
    fn falls_back_to_status_text_for_unstructured_bodies() {
        let err = ClientError::from_response(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.to_string(), "Bad Gateway");
        assert!(matches!(err.to_api_error().code, ErrorCode::Internal));
    }
}
