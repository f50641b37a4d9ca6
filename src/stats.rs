use crate::models::{Priority, Status, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Pending tasks with High priority.
    pub high_priority: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.status == Status::Completed).count();
        let high_priority = tasks
            .iter()
            .filter(|t| t.status == Status::Pending && t.priority == Priority::High)
            .count();

        TaskStats {
            total,
            completed,
            pending: total - completed,
            high_priority,
        }
    }

    /// One-line summary handed to the chat assistant as context.
    pub fn summary(&self) -> String {
        format!(
            "The user has {} tasks: {} pending ({} high priority) and {} completed.",
            self.total, self.pending, self.high_priority, self.completed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(priority: Priority, status: Status) -> Task {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: "t".to_string(),
            description: String::new(),
            due_date: "2024-01-01".to_string(),
            priority,
            status,
            created_at: 0,
        }
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        assert_eq!(TaskStats::from_tasks(&[]), TaskStats::default());
    }

    #[test]
    fn counts_add_up() {
        let tasks = vec![
            task(Priority::High, Status::Pending),
            task(Priority::High, Status::Completed),
            task(Priority::Low, Status::Pending),
            task(Priority::Moderate, Status::Completed),
            task(Priority::High, Status::Pending),
        ];
        let stats = TaskStats::from_tasks(&tasks);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.high_priority, 2);
        assert_eq!(stats.pending + stats.completed, stats.total);
        assert!(stats.high_priority <= stats.pending);
    }

    #[test]
    fn completed_high_priority_is_not_counted() {
        let stats = TaskStats::from_tasks(&[task(Priority::High, Status::Completed)]);
        assert_eq!(stats.high_priority, 0);
        assert_eq!(stats.pending, 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_task() -> impl Strategy<Value = Task> {
            (
                prop_oneof![Just(Priority::Low), Just(Priority::Moderate), Just(Priority::High)],
                prop_oneof![Just(Status::Pending), Just(Status::Completed)],
            )
                .prop_map(|(p, s)| task(p, s))
        }

        proptest! {
            #[test]
            fn counts_are_consistent(tasks in proptest::collection::vec(any_task(), 0..64)) {
                let stats = TaskStats::from_tasks(&tasks);
                let pending_high = tasks
                    .iter()
                    .filter(|t| t.status == Status::Pending && t.priority == Priority::High)
                    .count();

                prop_assert_eq!(stats.total, tasks.len());
                prop_assert_eq!(stats.pending + stats.completed, stats.total);
                prop_assert!(stats.high_priority <= stats.pending);
                prop_assert_eq!(stats.high_priority, pending_high);
            }
        }
    }
}
