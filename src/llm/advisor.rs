use super::gemini_model::{AiError, GeminiModel};
use crate::models::Task;

pub const ADVICE_FALLBACK: &str = "I couldn't generate advice at this time.";
pub const CHAT_FALLBACK: &str = "I'm sorry, I'm having trouble responding right now.";

const PERSONA: &str = "You are TaskPilot AI, a friendly college productivity assistant. Help the user with scheduling, motivation, and study tips.";

/// Turns tasks and chat messages into prompts and prompts into answers.
/// Holds no state between calls, so clones can be moved into spawned tasks.
#[derive(Clone)]
pub struct Advisor {
    model: GeminiModel,
}

impl Advisor {
    pub fn new(model: GeminiModel) -> Self {
        Self { model }
    }

    pub async fn get_task_advice(&self, task: &Task) -> Result<String, AiError> {
        let answer = self.model.generate(&task_advice_prompt(task)).await?;
        Ok(answer.unwrap_or_else(|| ADVICE_FALLBACK.to_string()))
    }

    pub async fn chat_with_ai(&self, message: &str, context: &str) -> Result<String, AiError> {
        let answer = self.model.generate(&chat_prompt(message, context)).await?;
        Ok(answer.unwrap_or_else(|| CHAT_FALLBACK.to_string()))
    }
}

pub fn task_advice_prompt(task: &Task) -> String {
    let description = if task.description.trim().is_empty() {
        "No description provided."
    } else {
        task.description.as_str()
    };

    format!(
        "You are a productivity coach. Give specific, actionable, and encouraging advice for this task:\n\n\
         Title: {}\n\
         Description: {}\n\
         Priority: {}\n\
         Due Date: {}\n\n\
         Format:\n\
         - Bullet points\n\
         - End with one motivating sentence\n\
         Keep it under 150 words.\n",
        task.title, description, task.priority, task.due_date
    )
}

pub fn chat_prompt(message: &str, context: &str) -> String {
    format!("System: {}\n\nContext: {}\n\nUser: {}\n", PERSONA, context, message)
}
