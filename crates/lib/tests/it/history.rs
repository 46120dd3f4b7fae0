//! Undo recorder tests

use std::rc::Rc;

use quantum::{ContainerConfig, NodeContainer, NodeHandle, NodeIndex, UndoRecorder, Value};

use crate::helpers::*;

struct Fixture {
    graph: NodeContainer,
    recorder: Rc<UndoRecorder>,
    scores: quantum::HostRef,
    root: NodeHandle,
}

impl Fixture {
    fn new(capacity: usize) -> Self {
        let factory = factory();
        let scores = factory.instantiate(SCORES).unwrap();
        let graph = NodeContainer::new();
        let recorder = Rc::new(UndoRecorder::new(capacity));
        graph.subscribe(recorder.clone());
        let root = graph.get_or_create_node(&scores).unwrap();
        Self {
            graph,
            recorder,
            scores,
            root,
        }
    }

    fn collection(&self, member: &str) -> NodeHandle {
        let member = self.graph.member(self.root, member).unwrap();
        self.graph.target_node(member).unwrap().unwrap()
    }

    fn values(&self) -> Vec<i64> {
        ints(&object_member(&self.scores, "Values"))
    }
}

#[test]
fn test_undo_and_redo_list_changes() {
    let f = Fixture::new(0);
    let list = f.collection("Values");
    f.graph.add(list, 1).unwrap();
    f.graph.add(list, 2).unwrap();
    f.graph.update(list, 5, 0).unwrap();
    f.graph.remove(list, 2, 1).unwrap();
    assert_eq!(f.values(), vec![5]);

    assert!(f.recorder.undo(&f.graph).unwrap());
    assert_eq!(f.values(), vec![5, 2]);
    assert!(f.recorder.undo(&f.graph).unwrap());
    assert_eq!(f.values(), vec![1, 2]);
    assert!(f.recorder.undo(&f.graph).unwrap());
    assert!(f.recorder.undo(&f.graph).unwrap());
    assert!(f.values().is_empty());
    assert!(!f.recorder.undo(&f.graph).unwrap());

    assert_eq!(f.recorder.redo_len(), 4);
    while f.recorder.redo(&f.graph).unwrap() {}
    assert_eq!(f.values(), vec![5]);
    assert_eq!(f.recorder.undo_len(), 4);
}

#[test]
fn test_undo_member_replacement() {
    let f = Fixture::new(0);
    let count = f.graph.member(f.root, "Count").unwrap();
    f.graph.update(count, 10, NodeIndex::Empty).unwrap();

    f.recorder.undo(&f.graph).unwrap();
    assert_eq!(f.scores.get("Count").unwrap(), Value::Int(1));

    f.recorder.redo(&f.graph).unwrap();
    assert_eq!(f.scores.get("Count").unwrap(), Value::Int(10));
}

#[test]
fn test_undo_set_and_dictionary_changes() {
    let f = Fixture::new(0);
    let tags = f.collection("Tags");
    let lookup = f.collection("Lookup");
    f.graph.add(tags, "red").unwrap();
    f.graph.update(tags, "blue", "red").unwrap();
    f.graph.add_at(lookup, 1, "one").unwrap();
    f.graph.remove(lookup, 1, "one").unwrap();

    f.recorder.undo(&f.graph).unwrap();
    assert_eq!(f.graph.retrieve(lookup, "one").unwrap(), Value::Int(1));
    f.recorder.undo(&f.graph).unwrap();
    assert_eq!(f.graph.item_count(lookup).unwrap(), 0);

    f.recorder.undo(&f.graph).unwrap();
    let tag_values = object_member(&f.scores, "Tags").items();
    assert_eq!(tag_values, vec![Value::from("red")]);

    f.recorder.redo(&f.graph).unwrap();
    let tag_values = object_member(&f.scores, "Tags").items();
    assert_eq!(tag_values, vec![Value::from("blue")]);
}

#[test]
fn test_replayed_changes_are_not_recorded() {
    let f = Fixture::new(0);
    let list = f.collection("Values");
    f.graph.add(list, 1).unwrap();

    f.recorder.undo(&f.graph).unwrap();
    assert_eq!(f.recorder.undo_len(), 0);
    assert_eq!(f.recorder.redo_len(), 1);

    f.recorder.redo(&f.graph).unwrap();
    assert_eq!(f.recorder.undo_len(), 1);
    assert_eq!(f.recorder.redo_len(), 0);
}

#[test]
fn test_new_changes_clear_redo() {
    let f = Fixture::new(0);
    let list = f.collection("Values");
    f.graph.add(list, 1).unwrap();
    f.recorder.undo(&f.graph).unwrap();
    assert!(f.recorder.can_redo());

    f.graph.add(list, 2).unwrap();

    assert!(!f.recorder.can_redo());
    assert!(!f.recorder.redo(&f.graph).unwrap());
    assert_eq!(f.values(), vec![2]);
}

#[test]
fn test_transactions_undo_as_one_step() {
    let f = Fixture::new(0);
    let list = f.collection("Values");
    let count = f.graph.member(f.root, "Count").unwrap();

    f.recorder.begin_transaction();
    f.graph.add(list, 1).unwrap();
    f.recorder.begin_transaction();
    f.graph.add(list, 2).unwrap();
    f.recorder.end_transaction().unwrap();
    f.graph.update(count, 3, NodeIndex::Empty).unwrap();
    assert_eq!(f.recorder.undo_len(), 0);
    f.recorder.end_transaction().unwrap();

    assert_eq!(f.recorder.undo_len(), 1);
    f.recorder.undo(&f.graph).unwrap();
    assert!(f.values().is_empty());
    assert_eq!(f.scores.get("Count").unwrap(), Value::Int(1));

    f.recorder.redo(&f.graph).unwrap();
    assert_eq!(f.values(), vec![1, 2]);
    assert_eq!(f.scores.get("Count").unwrap(), Value::Int(3));
}

#[test]
fn test_unbalanced_transaction_end_fails() {
    let f = Fixture::new(0);
    let err = f.recorder.end_transaction().unwrap_err();
    assert!(err.is_history_error());
}

#[test]
fn test_capacity_drops_oldest_steps() {
    let f = Fixture::new(2);
    let list = f.collection("Values");
    for n in 1..=4 {
        f.graph.add(list, n).unwrap();
    }

    assert_eq!(f.recorder.undo_len(), 2);
    while f.recorder.undo(&f.graph).unwrap() {}
    assert_eq!(f.values(), vec![1, 2]);
}

#[test]
fn test_recorder_from_config() {
    let config = ContainerConfig {
        history_capacity: 1,
        ..ContainerConfig::default()
    };
    let recorder = UndoRecorder::from_config(&config);
    let graph = NodeContainer::with_config(config);
    let recorder = Rc::new(recorder);
    graph.subscribe(recorder.clone());
    let list = factory().new_collection(INT_LIST, vec![]).unwrap();
    let node = graph.get_or_create_node(&list).unwrap();

    graph.add(node, 1).unwrap();
    graph.add(node, 2).unwrap();

    assert_eq!(recorder.undo_len(), 1);
    recorder.clear();
    assert!(!recorder.can_undo());
}

#[test]
fn test_failed_replay_reports_the_cause() {
    let f = Fixture::new(0);
    let list = f.collection("Values");
    f.graph.add(list, 1).unwrap();

    // Edit the host behind the graph's back so the recorded index is gone
    let values = object_member(&f.scores, "Values");
    values.descriptor().remove_at(&values, 0).unwrap();
    f.graph.update_references(list).unwrap();

    let err = f.recorder.undo(&f.graph).unwrap_err();
    assert!(err.is_history_error());
    assert!(matches!(
        err,
        quantum::Error::History(quantum::history::HistoryError::ApplyFailed { .. })
    ));
    assert_eq!(f.recorder.undo_len(), 1);
    assert_eq!(f.recorder.redo_len(), 0);
}

#[test]
fn test_failed_step_is_rolled_back_and_kept() {
    let f = Fixture::new(0);
    let list = f.collection("Values");
    let count = f.graph.member(f.root, "Count").unwrap();

    f.recorder.begin_transaction();
    f.graph.add(list, 1).unwrap();
    f.graph.update(count, 3, NodeIndex::Empty).unwrap();
    f.recorder.end_transaction().unwrap();

    let values = object_member(&f.scores, "Values");
    values.descriptor().remove_at(&values, 0).unwrap();
    f.graph.update_references(list).unwrap();

    // The count is restored first, then removing the added item fails
    assert!(f.recorder.undo(&f.graph).is_err());

    assert_eq!(f.scores.get("Count").unwrap(), Value::Int(3));
    assert_eq!(f.recorder.undo_len(), 1);
    assert!(!f.recorder.can_redo());

    // Once the item is back the step undoes cleanly
    values.descriptor().add(&values, Value::Int(1)).unwrap();
    f.graph.update_references(list).unwrap();
    assert!(f.recorder.undo(&f.graph).unwrap());
    assert!(f.values().is_empty());
    assert_eq!(f.scores.get("Count").unwrap(), Value::Int(1));
}
