use std::collections::HashSet;

use chrono::Utc;

use crate::io::slot::{Slot, SlotError};
use crate::model::task::{Filter, Task};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reorder is not a permutation of the current tasks")]
    NotAPermutation,
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("could not save tasks: {0}")]
    Save(#[from] SlotError),
}

/// Sole owner of the ordered task collection and the active filter.
///
/// Every mutating operation mirrors the full, unfiltered collection to the
/// injected slot before returning. A failed save is reported as
/// [`StoreError::Save`] but the in-memory mutation is kept: state stays
/// authoritative for the rest of the session.
///
/// Lookup misses (`toggle`, `remove`, `edit` with an unknown id) are silent
/// no-ops, not errors, and perform no save.
#[derive(Debug)]
pub struct TaskStore<S: Slot> {
    slot: S,
    tasks: Vec<Task>,
    filter: Filter,
}

impl<S: Slot> TaskStore<S> {
    /// Load the collection from the slot.
    ///
    /// Surfaces decode failures; callers that prefer to start over can fall
    /// back to [`TaskStore::empty`].
    pub fn open(slot: S) -> Result<Self, SlotError> {
        let tasks = slot.load()?;
        Ok(TaskStore {
            slot,
            tasks,
            filter: Filter::All,
        })
    }

    /// A store with no tasks, ignoring whatever the slot holds
    pub fn empty(slot: S) -> Self {
        TaskStore {
            slot,
            tasks: Vec::new(),
            filter: Filter::All,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append a new task and return its id.
    ///
    /// Title and description are taken verbatim; trimming and non-empty
    /// checks belong to the caller.
    pub fn add(&mut self, title: String, description: String) -> Result<String, StoreError> {
        let id = self.next_id();
        self.tasks.push(Task::new(id.clone(), title, description));
        self.persist()?;
        Ok(id)
    }

    /// Flip `completed` on the matching task
    pub fn toggle(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(());
        };
        task.completed = !task.completed;
        self.persist()
    }

    /// Delete the matching task, preserving the order of the rest
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Replace title and description, leaving `completed` and position alone
    pub fn edit(&mut self, id: &str, title: String, description: String) -> Result<(), StoreError> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(());
        };
        task.title = title;
        task.description = description;
        self.persist()
    }

    /// Replace the collection wholesale with a new ordering.
    ///
    /// The replacement must be a true permutation of the current tasks
    /// (same length, same set of unique ids); anything else is rejected and
    /// the collection is left unchanged.
    pub fn reorder(&mut self, new_order: Vec<Task>) -> Result<(), StoreError> {
        if !is_permutation(&self.tasks, &new_order) {
            return Err(StoreError::NotAPermutation);
        }
        self.tasks = new_order;
        self.persist()
    }

    /// Move the task at `from` so it ends up at index `to`.
    ///
    /// Splice semantics: the task is removed first, then reinserted, so
    /// `to` names its final index in the resulting collection.
    pub fn move_task(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let len = self.tasks.len();
        if from >= len || to >= len {
            return Err(StoreError::InvalidPosition(format!(
                "{} -> {} (have {} tasks)",
                from, to, len
            )));
        }
        if from != to {
            let task = self.tasks.remove(from);
            self.tasks.insert(to, task);
        }
        self.persist()
    }

    /// Move by positions within the current filtered view.
    ///
    /// `from` and `to` index the view under the active filter; they are
    /// remapped to authoritative indices and the move runs on the full
    /// collection, so tasks hidden by the filter keep their places.
    /// Under `Filter::All` this is exactly [`TaskStore::move_task`].
    pub fn move_filtered(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let visible: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| self.filter.passes(t))
            .map(|(i, _)| i)
            .collect();
        if from >= visible.len() || to >= visible.len() {
            return Err(StoreError::InvalidPosition(format!(
                "{} -> {} (view has {} tasks)",
                from,
                to,
                visible.len()
            )));
        }
        self.move_task(visible[from], visible[to])
    }

    /// Set the active filter. Never touches the slot.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// The authoritative, unfiltered collection
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// The collection as seen through the active filter, recomputed on
    /// every call, relative order preserved
    pub fn filtered_view(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| self.filter.passes(t)).collect()
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Millisecond-timestamp id, bumped past any collision.
    ///
    /// Creation is user-paced, so collisions only arise in tests that add
    /// several tasks within one millisecond.
    fn next_id(&self) -> String {
        let mut n = Utc::now().timestamp_millis();
        loop {
            let id = n.to_string();
            if !self.tasks.iter().any(|t| t.id == id) {
                return id;
            }
            n += 1;
        }
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.slot.save(&self.tasks)?;
        Ok(())
    }
}

/// Same length and same set of unique ids
fn is_permutation(current: &[Task], proposed: &[Task]) -> bool {
    if current.len() != proposed.len() {
        return false;
    }
    let current_ids: HashSet<&str> = current.iter().map(|t| t.id.as_str()).collect();
    let proposed_ids: HashSet<&str> = proposed.iter().map(|t| t.id.as_str()).collect();
    proposed_ids.len() == proposed.len() && current_ids == proposed_ids
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use super::*;
    use crate::io::slot::MemorySlot;

    /// Slot whose every save fails, as if the disk were full
    struct FailingSlot;

    impl Slot for FailingSlot {
        fn load(&self) -> Result<Vec<Task>, SlotError> {
            Ok(Vec::new())
        }

        fn save(&self, _tasks: &[Task]) -> Result<(), SlotError> {
            Err(SlotError::Write {
                path: PathBuf::from("deck.json"),
                source: io::Error::other("disk full"),
            })
        }
    }

    fn store_with(titles: &[(&str, bool)]) -> TaskStore<MemorySlot> {
        let tasks: Vec<Task> = titles
            .iter()
            .enumerate()
            .map(|(i, (title, completed))| {
                let mut t = Task::new(format!("id-{}", i + 1), title.to_string(), String::new());
                t.completed = *completed;
                t
            })
            .collect();
        TaskStore::open(MemorySlot::with_tasks(tasks)).unwrap()
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    // --- add ---

    #[test]
    fn test_add_appends_with_unique_ids() {
        let mut store = TaskStore::empty(MemorySlot::new());
        for i in 0..20 {
            store.add(format!("task {}", i), String::new()).unwrap();
        }
        assert_eq!(store.tasks().len(), 20);

        let ids: HashSet<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(store.tasks()[0].title, "task 0");
        assert_eq!(store.tasks()[19].title, "task 19");
    }

    #[test]
    fn test_add_takes_fields_verbatim() {
        let mut store = TaskStore::empty(MemorySlot::new());
        store.add("  padded  ".into(), "".into()).unwrap();
        let task = &store.tasks()[0];
        assert_eq!(task.title, "  padded  ");
        assert_eq!(task.description, "");
        assert!(!task.completed);
    }

    #[test]
    fn test_add_saves_to_slot() {
        let mut store = TaskStore::empty(MemorySlot::new());
        store.add("Buy milk".into(), "2%".into()).unwrap();
        assert_eq!(store.slot.load().unwrap().len(), 1);
    }

    // --- toggle ---

    #[test]
    fn test_toggle_is_an_involution() {
        let mut store = store_with(&[("a", false)]);
        store.toggle("id-1").unwrap();
        assert!(store.tasks()[0].completed);
        store.toggle("id-1").unwrap();
        assert!(!store.tasks()[0].completed);
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let mut store = store_with(&[("a", false)]);
        store.toggle("missing").unwrap();
        assert!(!store.tasks()[0].completed);
        assert_eq!(store.tasks().len(), 1);
    }

    // --- remove ---

    #[test]
    fn test_remove_preserves_order_of_rest() {
        let mut store = store_with(&[("a", false), ("b", false), ("c", false)]);
        store.remove("id-2").unwrap();
        assert_eq!(titles(&store.tasks().iter().collect::<Vec<_>>()), ["a", "c"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = store_with(&[("a", false), ("b", false)]);
        store.remove("id-1").unwrap();
        store.remove("id-1").unwrap();
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, "id-2");
    }

    // --- edit ---

    #[test]
    fn test_edit_replaces_fields_only() {
        let mut store = store_with(&[("a", true), ("b", false)]);
        store.edit("id-1", "new title".into(), "new desc".into()).unwrap();

        let task = &store.tasks()[0];
        assert_eq!(task.title, "new title");
        assert_eq!(task.description, "new desc");
        assert!(task.completed, "completed must not change");
        assert_eq!(task.id, "id-1", "position and id must not change");
    }

    #[test]
    fn test_edit_unknown_id_is_noop() {
        let mut store = store_with(&[("a", false)]);
        store.edit("missing", "x".into(), "y".into()).unwrap();
        assert_eq!(store.tasks()[0].title, "a");
    }

    // --- reorder ---

    #[test]
    fn test_reorder_swaps_order() {
        let mut store = store_with(&[("a", false), ("b", false)]);
        let swapped = vec![store.tasks()[1].clone(), store.tasks()[0].clone()];
        store.reorder(swapped).unwrap();
        assert_eq!(titles(&store.filtered_view()), ["b", "a"]);
    }

    #[test]
    fn test_reorder_rejects_shorter_list() {
        let mut store = store_with(&[("a", false), ("b", false)]);
        let partial = vec![store.tasks()[0].clone()];
        let err = store.reorder(partial).unwrap_err();
        assert!(matches!(err, StoreError::NotAPermutation));
        assert_eq!(store.tasks().len(), 2, "collection unchanged on rejection");
    }

    #[test]
    fn test_reorder_rejects_swapped_in_stranger() {
        let mut store = store_with(&[("a", false), ("b", false)]);
        let stranger = vec![
            store.tasks()[0].clone(),
            Task::new("other".into(), "x".into(), "".into()),
        ];
        assert!(matches!(
            store.reorder(stranger),
            Err(StoreError::NotAPermutation)
        ));
    }

    #[test]
    fn test_reorder_rejects_duplicated_id() {
        let mut store = store_with(&[("a", false), ("b", false)]);
        let dup = vec![store.tasks()[0].clone(), store.tasks()[0].clone()];
        assert!(matches!(
            store.reorder(dup),
            Err(StoreError::NotAPermutation)
        ));
    }

    // --- move ---

    #[test]
    fn test_move_task_down() {
        let mut store = store_with(&[("a", false), ("b", false), ("c", false)]);
        store.move_task(0, 2).unwrap();
        assert_eq!(titles(&store.filtered_view()), ["b", "c", "a"]);
    }

    #[test]
    fn test_move_task_up() {
        let mut store = store_with(&[("a", false), ("b", false), ("c", false)]);
        store.move_task(2, 0).unwrap();
        assert_eq!(titles(&store.filtered_view()), ["c", "a", "b"]);
    }

    #[test]
    fn test_move_task_same_index_is_noop() {
        let mut store = store_with(&[("a", false), ("b", false)]);
        store.move_task(1, 1).unwrap();
        assert_eq!(titles(&store.filtered_view()), ["a", "b"]);
    }

    #[test]
    fn test_move_task_out_of_range() {
        let mut store = store_with(&[("a", false)]);
        assert!(matches!(
            store.move_task(0, 5),
            Err(StoreError::InvalidPosition(_))
        ));
        assert!(matches!(
            store.move_task(3, 0),
            Err(StoreError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_move_filtered_keeps_hidden_tasks_in_place() {
        // Full order: a, B(done), c, d — active view is [a, c, d]
        let mut store = store_with(&[("a", false), ("B", true), ("c", false), ("d", false)]);
        store.set_filter(Filter::Active);

        // Drag "a" to the end of the active view
        store.move_filtered(0, 2).unwrap();
        assert_eq!(titles(&store.filtered_view()), ["c", "d", "a"]);

        store.set_filter(Filter::All);
        assert_eq!(titles(&store.filtered_view()), ["B", "c", "d", "a"]);
    }

    #[test]
    fn test_move_filtered_up_under_filter() {
        let mut store = store_with(&[("a", false), ("B", true), ("c", false), ("d", false)]);
        store.set_filter(Filter::Active);

        store.move_filtered(2, 0).unwrap();
        assert_eq!(titles(&store.filtered_view()), ["d", "a", "c"]);

        store.set_filter(Filter::All);
        assert_eq!(titles(&store.filtered_view()), ["d", "a", "B", "c"]);
    }

    #[test]
    fn test_move_filtered_out_of_range_counts_view_not_collection() {
        let mut store = store_with(&[("a", false), ("B", true), ("c", false)]);
        store.set_filter(Filter::Active);
        // Collection has 3 tasks but the view only 2
        assert!(matches!(
            store.move_filtered(0, 2),
            Err(StoreError::InvalidPosition(_))
        ));
    }

    // --- filter / view ---

    #[test]
    fn test_filtered_view_partitions() {
        let mut store = store_with(&[("a", false), ("b", true), ("c", false), ("d", true)]);

        assert_eq!(titles(&store.filtered_view()), ["a", "b", "c", "d"]);

        store.set_filter(Filter::Active);
        assert_eq!(titles(&store.filtered_view()), ["a", "c"]);

        store.set_filter(Filter::Completed);
        assert_eq!(titles(&store.filtered_view()), ["b", "d"]);
    }

    #[test]
    fn test_set_filter_does_not_save() {
        let mut store = TaskStore::open(MemorySlot::new()).unwrap();
        store.add("a".into(), "".into()).unwrap();
        // Empty the slot behind the store's back, then change the filter
        store.slot.save(&[]).unwrap();
        store.set_filter(Filter::Completed);
        assert!(store.slot.load().unwrap().is_empty(), "set_filter must not write");
    }

    #[test]
    fn test_mutations_mirror_to_slot() {
        let mut store = TaskStore::empty(MemorySlot::new());
        let id = store.add("Buy milk".into(), "2%".into()).unwrap();
        store.toggle(&id).unwrap();

        let saved = store.slot.load().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].completed);
    }

    // --- failed saves ---

    #[test]
    fn test_failed_save_keeps_the_added_task() {
        let mut store = TaskStore::empty(FailingSlot);
        let err = store.add("kept".into(), "".into()).unwrap_err();
        assert!(matches!(err, StoreError::Save(SlotError::Write { .. })));

        // The mutation stays authoritative for the session
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].title, "kept");
    }

    #[test]
    fn test_failed_save_keeps_a_toggle() {
        let mut store = TaskStore::empty(FailingSlot);
        store.add("flip me".into(), "".into()).unwrap_err();
        let id = store.tasks()[0].id.clone();

        let err = store.toggle(&id).unwrap_err();
        assert!(matches!(err, StoreError::Save(_)));
        assert!(store.tasks()[0].completed);
    }

    // --- spec scenario ---

    #[test]
    fn test_buy_milk_scenario() {
        let mut store = TaskStore::empty(MemorySlot::new());
        let id = store.add("Buy milk".into(), "2%".into()).unwrap();

        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].title, "Buy milk");
        assert_eq!(store.tasks()[0].description, "2%");
        assert!(!store.tasks()[0].completed);

        store.toggle(&id).unwrap();
        assert!(store.tasks()[0].completed);

        store.set_filter(Filter::Active);
        assert!(store.filtered_view().is_empty());

        store.set_filter(Filter::Completed);
        assert_eq!(titles(&store.filtered_view()), ["Buy milk"]);
    }
}
