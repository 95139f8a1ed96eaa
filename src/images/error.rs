use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the image generation workflow. The `Display` strings are the
/// exact messages shown to the user; raw provider detail is carried in the
/// variant payloads and only ever logged.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Image generation service is temporarily unavailable. Please try again later.")]
    ServiceUnavailable,
    #[error("You've reached the daily limit of {limit} image generations. Please try again tomorrow.")]
    DailyLimitReached { limit: i32 },
    #[error("Please log in to generate images.")]
    NotAuthenticated,
    #[error("Recipe not found. Please refresh the page and try again.")]
    RecipeNotFound,
    #[error("Image generation is disabled for your account.")]
    GenerationDisabled,
    #[error("Image generation failed. The AI service may be busy. Please try again.")]
    Provider(String),
    #[error("Failed to process the generated image. Please try again.")]
    Download(String),
    #[error("Failed to save the image. Please try again.")]
    Upload(String),
    #[error("Image generation failed. Please try again.")]
    NoImageInResponse,
    #[error("Something went wrong while generating the image. Please try again.")]
    Other(String),
}

impl GenerationError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::DailyLimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::RecipeNotFound => StatusCode::NOT_FOUND,
            Self::GenerationDisabled => StatusCode::FORBIDDEN,
            Self::Provider(_) | Self::Download(_) | Self::NoImageInResponse => {
                StatusCode::BAD_GATEWAY
            }
            Self::Upload(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GenerationError> for (StatusCode, String) {
    fn from(e: GenerationError) -> Self {
        (e.status(), e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_never_leak_provider_detail() {
        let e = GenerationError::Provider("500 upstream exploded: secret".into());
        assert_eq!(
            e.to_string(),
            "Image generation failed. The AI service may be busy. Please try again."
        );
        let e = GenerationError::Download("connection reset".into());
        assert!(!e.to_string().contains("connection reset"));
    }

    #[test]
    fn limit_message_names_the_cap() {
        let e = GenerationError::DailyLimitReached { limit: 10 };
        assert!(e.to_string().contains("daily limit of 10"));
        assert_eq!(e.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn statuses_map_to_http() {
        assert_eq!(
            GenerationError::NotAuthenticated.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GenerationError::RecipeNotFound.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GenerationError::GenerationDisabled.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GenerationError::ServiceUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
