//! Conversions from transport and codec errors into core errors

use ailite_core::Error as CoreError;
use reqwest::Response;

/// Convert provider errors to core errors
pub fn to_core_error(provider: impl Into<String>, message: impl Into<String>) -> CoreError {
    CoreError::Provider {
        provider: provider.into(),
        message: message.into(),
    }
}

/// Convert network errors to core errors
pub fn network_error(error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        return CoreError::Timeout;
    }
    CoreError::Network {
        message: error.to_string(),
        source: Some(Box::new(error)),
    }
}

/// Convert serialization errors to core errors
pub fn serialization_error(error: serde_json::Error) -> CoreError {
    CoreError::Serialization {
        message: error.to_string(),
        source: Some(Box::new(error)),
    }
}

/// Check HTTP response status and convert failures to [`CoreError::Http`]
pub async fn check_response_status(response: Response) -> Result<Response, CoreError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(CoreError::Http { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_core_error() {
        let error = to_core_error("anthropic", "empty completion");
        assert_eq!(
            error.to_string(),
            "Provider error (anthropic): empty completion"
        );
    }

    #[test]
    fn test_serialization_error_keeps_source() {
        let json_error = serde_json::from_str::<u32>("nope").unwrap_err();
        let error = serialization_error(json_error);
        assert!(std::error::Error::source(&error).is_some());
    }
}
