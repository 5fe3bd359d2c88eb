//! Startup errors
//!
//! Anything that goes wrong before the first frame is fatal: the game never
//! starts against a missing or unusable drawing surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("no window or document available")]
    NoDocument,
    #[error("element #{0} not found")]
    MissingElement(String),
    #[error("element #{0} is not a canvas")]
    NotACanvas(String),
    #[error("failed to create rendering surface: {0}")]
    Surface(String),
    #[error("no compatible graphics adapter: {0}")]
    Adapter(String),
    #[error("failed to create graphics device: {0}")]
    Device(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_element() {
        let err = InitError::MissingElement("gameCanvas".into());
        assert_eq!(err.to_string(), "element #gameCanvas not found");
        let err = InitError::NotACanvas("hud".into());
        assert!(err.to_string().contains("not a canvas"));
    }
}
