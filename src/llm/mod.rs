pub mod advisor;
pub mod gemini_model;

pub use advisor::Advisor;
pub use gemini_model::{AiError, GeminiModel};

/// State of one AI request as seen by a view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AiReply {
    #[default]
    Idle,
    Pending,
    Succeeded(String),
    Failed(String),
}

impl AiReply {
    pub fn is_pending(&self) -> bool {
        matches!(self, AiReply::Pending)
    }

    /// The text to show once the request has finished.
    pub fn text(&self) -> Option<&str> {
        match self {
            AiReply::Succeeded(text) | AiReply::Failed(text) => Some(text),
            AiReply::Idle | AiReply::Pending => None,
        }
    }

    /// Maps a finished call onto the reply a view renders. Errors become the
    /// caller's apology text; the cause is logged, not shown.
    pub fn from_result(result: Result<String, AiError>, apology: &str) -> Self {
        match result {
            Ok(text) => AiReply::Succeeded(text),
            Err(e) => {
                log::warn!("AI request failed: {}", e);
                AiReply::Failed(apology.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_as_apology() {
        let reply = AiReply::from_result(Err(AiError::MissingCredential), "sorry");
        assert_eq!(reply, AiReply::Failed("sorry".to_string()));

        let reply = AiReply::from_result(Ok("do it".to_string()), "sorry");
        assert_eq!(reply, AiReply::Succeeded("do it".to_string()));
        assert!(!reply.is_pending());
        assert_eq!(reply.text(), Some("do it"));
        assert_eq!(AiReply::Pending.text(), None);
    }
}
