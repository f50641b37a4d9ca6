use anyhow::Result;
use chrono::NaiveDate;

use crate::models::{Priority, Task, TaskDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    DueDate,
    Priority,
}

impl FormField {
    const ORDER: [FormField; 4] = [
        FormField::Title,
        FormField::Description,
        FormField::DueDate,
        FormField::Priority,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Task Title",
            FormField::Description => "Description",
            FormField::DueDate => "Due Date (YYYY-MM-DD)",
            FormField::Priority => "Priority",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Create(TaskDraft),
    Update(Task),
}

/// Create/edit popup state. Nothing reaches the store until `submit`
/// validates the fields.
#[derive(Debug, Clone)]
pub struct TaskForm {
    editing: Option<Task>,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: Priority,
    pub focus: FormField,
    pub error: Option<String>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    pub fn new() -> Self {
        TaskForm {
            editing: None,
            title: String::new(),
            description: String::new(),
            due_date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            priority: Priority::Moderate,
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        TaskForm {
            editing: Some(task.clone()),
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date.clone(),
            priority: task.priority,
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn next_field(&mut self) {
        let i = (self.focus.index() + 1) % FormField::ORDER.len();
        self.focus = FormField::ORDER[i];
    }

    pub fn previous_field(&mut self) {
        let len = FormField::ORDER.len();
        let i = (self.focus.index() + len - 1) % len;
        self.focus = FormField::ORDER[i];
    }

    pub fn insert_char(&mut self, c: char) {
        match self.focus {
            FormField::Title => self.title.push(c),
            FormField::Description => self.description.push(c),
            FormField::DueDate => {
                if c.is_ascii_digit() || c == '-' {
                    self.due_date.push(c);
                }
            }
            FormField::Priority => {
                if c == ' ' {
                    self.priority = self.priority.next();
                }
            }
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Description => {
                self.description.pop();
            }
            FormField::DueDate => {
                self.due_date.pop();
            }
            FormField::Priority => {}
        }
    }

    pub fn cycle_priority(&mut self, forward: bool) {
        self.priority = if forward {
            self.priority.next()
        } else {
            self.priority.previous()
        };
    }

    /// Validates the fields. On failure the message is kept in `error` and
    /// `None` is returned so the popup stays open.
    pub fn submit(&mut self) -> Option<FormOutcome> {
        match self.validate() {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    fn validate(&self) -> Result<FormOutcome> {
        let title = self.title.trim();
        if title.is_empty() {
            anyhow::bail!("Title is required");
        }
        let due_date = parse_due_date(&self.due_date)?;

        Ok(match &self.editing {
            Some(task) => FormOutcome::Update(Task {
                title: title.to_string(),
                description: self.description.clone(),
                due_date,
                priority: self.priority,
                ..task.clone()
            }),
            None => FormOutcome::Create(TaskDraft {
                title: title.to_string(),
                description: self.description.clone(),
                due_date,
                priority: self.priority,
            }),
        })
    }
}

/// Accepts calendar dates only, normalized to `YYYY-MM-DD`.
pub fn parse_due_date(input: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid due date '{}', expected YYYY-MM-DD", input.trim()))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn type_str(form: &mut TaskForm, s: &str) {
        for c in s.chars() {
            form.insert_char(c);
        }
    }

    #[test]
    fn new_form_defaults_to_today_and_moderate() {
        let form = TaskForm::new();
        assert_eq!(form.priority, Priority::Moderate);
        assert!(parse_due_date(&form.due_date).is_ok());
        assert!(!form.is_editing());
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut form = TaskForm::new();
        type_str(&mut form, "   ");
        assert_eq!(form.submit(), None);
        assert_eq!(form.error.as_deref(), Some("Title is required"));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut form = TaskForm::new();
        type_str(&mut form, "Essay");
        form.focus = FormField::DueDate;
        form.due_date.clear();
        type_str(&mut form, "2024-13-40");

        assert_eq!(form.submit(), None);
        assert!(form.error.as_deref().unwrap().contains("Invalid due date"));
    }

    #[test]
    fn create_outcome_trims_title() {
        let mut form = TaskForm::new();
        type_str(&mut form, "  Essay ");
        form.next_field();
        type_str(&mut form, "five pages");
        form.next_field();
        form.due_date = "2024-05-01".to_string();
        form.next_field();
        form.cycle_priority(false);

        let outcome = form.submit().unwrap();
        assert_eq!(
            outcome,
            FormOutcome::Create(TaskDraft {
                title: "Essay".to_string(),
                description: "five pages".to_string(),
                due_date: "2024-05-01".to_string(),
                priority: Priority::Low,
            })
        );
    }

    #[test]
    fn edit_outcome_keeps_identity_and_status() {
        let task = Task {
            id: "abc".to_string(),
            title: "Old".to_string(),
            description: String::new(),
            due_date: "2024-05-01".to_string(),
            priority: Priority::Low,
            status: Status::Completed,
            created_at: 42,
        };
        let mut form = TaskForm::edit(&task);
        form.title = "New".to_string();
        form.focus = FormField::Priority;
        form.insert_char(' ');

        match form.submit().unwrap() {
            FormOutcome::Update(updated) => {
                assert_eq!(updated.id, "abc");
                assert_eq!(updated.title, "New");
                assert_eq!(updated.priority, Priority::Moderate);
                assert_eq!(updated.status, Status::Completed);
                assert_eq!(updated.created_at, 42);
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn field_focus_wraps_both_ways() {
        let mut form = TaskForm::new();
        form.previous_field();
        assert_eq!(form.focus, FormField::Priority);
        form.next_field();
        assert_eq!(form.focus, FormField::Title);
    }

    #[test]
    fn due_date_is_normalized() {
        assert_eq!(parse_due_date(" 2024-5-1 ").unwrap(), "2024-05-01");
        assert!(parse_due_date("tomorrow").is_err());
    }
}
