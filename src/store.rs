use anyhow::{Context, Result};

use crate::models::{Status, Task, TaskDraft};

/// Key the whole task collection is serialized under.
pub const TASKS_KEY: &str = "taskpilot_tasks";

/// Opaque key-value persistence. No transactions, last write wins.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Owns the ordered task collection (newest first) and writes it back to
/// storage after every effective mutation.
pub struct TaskStore<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
}

impl<S: Storage> TaskStore<S> {
    /// Reads the persisted collection. Anything unreadable starts empty.
    pub fn load(storage: S) -> Self {
        let tasks = match storage.get(TASKS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => {
                    log::info!("loaded {} tasks", tasks.len());
                    tasks
                }
                Err(e) => {
                    log::warn!("Failed to load tasks, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read tasks from storage, starting empty: {:#}", e);
                Vec::new()
            }
        };

        TaskStore { storage, tasks }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn snapshot(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Tasks whose id starts with `prefix`. An exact id match wins outright.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&Task> {
        if let Some(task) = self.get(prefix) {
            return vec![task];
        }
        if prefix.is_empty() {
            return Vec::new();
        }
        self.tasks.iter().filter(|t| t.id.starts_with(prefix)).collect()
    }

    pub fn add(&mut self, draft: TaskDraft) -> Result<Task> {
        let task = Task {
            id: self.fresh_id(),
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            priority: draft.priority,
            status: Status::Pending,
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        self.tasks.insert(0, task.clone());
        log::info!("task {} added", task.id);
        self.persist()?;
        Ok(task)
    }

    /// Replaces everything except `id` and `created_at`. Returns false when
    /// no task has that id.
    pub fn update(&mut self, task: Task) -> Result<bool> {
        let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Ok(false);
        };

        let created_at = existing.created_at;
        *existing = Task { created_at, ..task };
        log::info!("task {} updated", existing.id);
        self.persist()?;
        Ok(true)
    }

    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(false);
        }

        log::info!("task {} removed", id);
        self.persist()?;
        Ok(true)
    }

    /// Flips Pending/Completed and returns the new status.
    pub fn toggle_status(&mut self, id: &str) -> Result<Option<Status>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        task.status = task.status.toggled();
        let status = task.status;
        log::info!("task {} marked {}", id, status);
        self.persist()?;
        Ok(Some(status))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn persist(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.storage
            .set(TASKS_KEY, &raw)
            .context("Failed to save tasks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::Priority;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStorage {
        entries: RefCell<HashMap<String, String>>,
        writes: RefCell<usize>,
    }

    impl Storage for MemoryStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            *self.writes.borrow_mut() += 1;
            self.entries.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.entries.borrow_mut().remove(key);
            Ok(())
        }
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            anyhow::bail!("disk on fire")
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("disk on fire")
        }

        fn remove(&self, _key: &str) -> Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    fn draft(title: &str, priority: Priority) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            due_date: "2024-05-01".to_string(),
            priority,
        }
    }

    #[test]
    fn essay_lifecycle() {
        let mut store = TaskStore::load(Database::open_in_memory().unwrap());
        let task = store.add(draft("Essay", Priority::Low)).unwrap();

        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.snapshot()[0].status, Status::Pending);

        assert_eq!(store.toggle_status(&task.id).unwrap(), Some(Status::Completed));
        assert_eq!(store.get(&task.id).unwrap().status, Status::Completed);

        assert!(store.remove(&task.id).unwrap());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn add_prepends_with_pending_status_and_unique_ids() {
        let mut store = TaskStore::load(MemoryStorage::default());
        let first = store.add(draft("first", Priority::High)).unwrap();
        let second = store.add(draft("second", Priority::Low)).unwrap();

        assert_ne!(first.id, second.id);
        let titles: Vec<&str> = store.snapshot().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);
        assert!(store.snapshot().iter().all(|t| t.status == Status::Pending));
    }

    #[test]
    fn toggle_twice_restores_status() {
        let mut store = TaskStore::load(MemoryStorage::default());
        let task = store.add(draft("read", Priority::Moderate)).unwrap();

        store.toggle_status(&task.id).unwrap();
        store.toggle_status(&task.id).unwrap();
        assert_eq!(store.get(&task.id).unwrap().status, Status::Pending);
    }

    #[test]
    fn update_keeps_created_at() {
        let mut store = TaskStore::load(MemoryStorage::default());
        let task = store.add(draft("draft", Priority::Low)).unwrap();

        let mut edited = task.clone();
        edited.title = "final".to_string();
        edited.priority = Priority::High;
        edited.created_at = 0;
        assert!(store.update(edited).unwrap());

        let stored = store.get(&task.id).unwrap();
        assert_eq!(stored.title, "final");
        assert_eq!(stored.priority, Priority::High);
        assert_eq!(stored.created_at, task.created_at);
    }

    #[test]
    fn unknown_ids_are_noops_without_writes() {
        let mut store = TaskStore::load(MemoryStorage::default());
        store.add(draft("only", Priority::Low)).unwrap();
        let writes = *store.storage().writes.borrow();

        let mut ghost = store.snapshot()[0].clone();
        ghost.id = "missing".to_string();
        assert!(!store.update(ghost).unwrap());
        assert!(!store.remove("missing").unwrap());
        assert_eq!(store.toggle_status("missing").unwrap(), None);

        assert_eq!(*store.storage().writes.borrow(), writes);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn persisted_snapshot_reloads_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        let expected = {
            let mut store = TaskStore::load(Database::open(&path).unwrap());
            let a = store.add(draft("a", Priority::Low)).unwrap();
            let b = store.add(draft("b", Priority::High)).unwrap();
            store.add(draft("c", Priority::Moderate)).unwrap();
            store.toggle_status(&a.id).unwrap();
            let mut b = b;
            b.description = "with notes".to_string();
            store.update(b).unwrap();
            store.remove(&a.id).unwrap();
            store.snapshot().to_vec()
        };

        let reloaded = TaskStore::load(Database::open(&path).unwrap());
        assert_eq!(reloaded.snapshot(), expected.as_slice());
    }

    #[test]
    fn corrupt_blob_starts_empty() {
        let storage = MemoryStorage::default();
        storage.set(TASKS_KEY, "{not json").unwrap();

        let store = TaskStore::load(storage);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn unreadable_storage_starts_empty_and_surfaces_write_errors() {
        let mut store = TaskStore::load(BrokenStorage);
        assert!(store.snapshot().is_empty());

        assert!(store.add(draft("x", Priority::Low)).is_err());
        // In-memory state keeps the change even though the write failed
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn find_by_prefix_prefers_exact_match() {
        let mut store = TaskStore::load(MemoryStorage::default());
        let task = store.add(draft("one", Priority::Low)).unwrap();
        store.add(draft("two", Priority::Low)).unwrap();

        assert_eq!(store.find_by_prefix(&task.id).len(), 1);
        assert_eq!(store.find_by_prefix(&task.id[..8])[0].id, task.id);
        assert!(store.find_by_prefix("").is_empty());
        assert!(store.find_by_prefix("zzzz-not-an-id").is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        #[derive(Debug, Clone)]
        enum Op {
            Add(String, Priority),
            Update(usize, String),
            Toggle(usize),
            Remove(usize),
        }

        fn priority() -> impl Strategy<Value = Priority> {
            prop_oneof![Just(Priority::Low), Just(Priority::Moderate), Just(Priority::High)]
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                ("[a-z ]{1,12}", priority()).prop_map(|(title, p)| Op::Add(title, p)),
                (any::<usize>(), "[a-z]{1,8}").prop_map(|(i, title)| Op::Update(i, title)),
                any::<usize>().prop_map(Op::Toggle),
                any::<usize>().prop_map(Op::Remove),
            ]
        }

        fn id_at<S: Storage>(store: &TaskStore<S>, i: usize) -> Option<String> {
            let snapshot = store.snapshot();
            if snapshot.is_empty() {
                None
            } else {
                Some(snapshot[i % snapshot.len()].id.clone())
            }
        }

        fn apply(store: &mut TaskStore<MemoryStorage>, op: Op) {
            match op {
                Op::Add(title, p) => {
                    store.add(draft(&title, p)).unwrap();
                }
                Op::Update(i, title) => {
                    if let Some(id) = id_at(store, i) {
                        let mut task = store.get(&id).unwrap().clone();
                        task.title = title;
                        task.created_at = -1;
                        store.update(task).unwrap();
                    }
                }
                Op::Toggle(i) => {
                    if let Some(id) = id_at(store, i) {
                        store.toggle_status(&id).unwrap();
                    }
                }
                Op::Remove(i) => {
                    if let Some(id) = id_at(store, i) {
                        store.remove(&id).unwrap();
                    }
                }
            }
        }

        proptest! {
            #[test]
            fn any_mutation_sequence_reloads_identically(ops in proptest::collection::vec(op(), 0..40)) {
                let mut store = TaskStore::load(MemoryStorage::default());
                for op in ops {
                    apply(&mut store, op);
                }

                let ids: HashSet<&str> = store.snapshot().iter().map(|t| t.id.as_str()).collect();
                prop_assert_eq!(ids.len(), store.snapshot().len());
                prop_assert!(store.snapshot().iter().all(|t| t.created_at >= 0));

                let expected = store.snapshot().to_vec();
                let reloaded = TaskStore::load(store.storage);
                prop_assert_eq!(reloaded.snapshot(), expected.as_slice());
            }

            #[test]
            fn toggling_twice_restores_snapshot(
                priorities in proptest::collection::vec(priority(), 0..8),
                pick in any::<usize>(),
                stray in "[a-f0-9-]{1,36}",
                use_stray in any::<bool>(),
            ) {
                let mut store = TaskStore::load(MemoryStorage::default());
                for (i, p) in priorities.into_iter().enumerate() {
                    store.add(draft(&format!("task {}", i), p)).unwrap();
                }
                let id = match id_at(&store, pick) {
                    Some(id) if !use_stray => id,
                    _ => stray,
                };

                let before = store.snapshot().to_vec();
                let first = store.toggle_status(&id).unwrap();
                store.toggle_status(&id).unwrap();

                prop_assert_eq!(store.snapshot(), before.as_slice());
                prop_assert_eq!(first.is_some(), store.contains(&id));
            }
        }
    }
}
