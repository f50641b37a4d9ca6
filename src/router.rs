use crate::store::{Storage, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    AllTasks,
    Pomodoro,
    TaskDetail,
}

impl View {
    /// Views reachable from the sidebar, in display order.
    pub const NAV: [View; 3] = [View::Dashboard, View::AllTasks, View::Pomodoro];

    pub fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::AllTasks => "All Tasks",
            View::Pomodoro => "Pomodoro",
            View::TaskDetail => "Task Details",
        }
    }
}

/// Which presentation is active, plus the task shown in detail. A selected
/// id only ever exists together with `View::TaskDetail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRouter {
    current: View,
    selected: Option<String>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        ViewRouter {
            current: View::Dashboard,
            selected: None,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Switches to a list-style view. Detail needs an id, so it goes
    /// through `open_task` instead.
    pub fn navigate(&mut self, view: View) {
        if view == View::TaskDetail {
            return;
        }
        self.current = view;
        self.selected = None;
    }

    pub fn open_task<S: Storage>(&mut self, id: &str, store: &TaskStore<S>) -> View {
        if store.contains(id) {
            self.current = View::TaskDetail;
            self.selected = Some(id.to_string());
        } else {
            log::debug!("task {} not found, falling back to dashboard", id);
            self.go_home();
        }
        self.current
    }

    /// Re-checks the selection against the store. Call after mutations.
    pub fn resolve<S: Storage>(&mut self, store: &TaskStore<S>) -> View {
        if self.current == View::TaskDetail {
            let valid = self.selected.as_deref().is_some_and(|id| store.contains(id));
            if !valid {
                self.go_home();
            }
        }
        self.current
    }

    pub fn task_removed(&mut self, id: &str) {
        if self.selected.as_deref() == Some(id) {
            self.go_home();
        }
    }

    fn go_home(&mut self) {
        self.current = View::Dashboard;
        self.selected = None;
    }
}
