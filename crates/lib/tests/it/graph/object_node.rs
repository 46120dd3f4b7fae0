//! Object node mutation tests

use std::rc::Rc;

use quantum::{
    ChangeType, GraphNode, HostRef, IndexKey, NodeContainer, NodeHandle, NodeIndex, Value,
};

use crate::helpers::*;

/// Graph over a fresh `Scores` object, returning the node of one of its
/// collection members
fn scores_collection(member: &str) -> (NodeContainer, HostRef, HostRef, NodeHandle) {
    let factory = factory();
    let scores = factory.instantiate(SCORES).unwrap();
    let collection = object_member(&scores, member);
    let graph = NodeContainer::new();
    let root = graph.get_or_create_node(&scores).unwrap();
    let member = graph.member(root, member).unwrap();
    let node = graph.target_node(member).unwrap().unwrap();
    (graph, scores, collection, node)
}

#[test]
fn test_add_appends_to_lists() {
    let (graph, _scores, list, node) = scores_collection("Values");
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    graph.add(node, 5).unwrap();
    graph.add(node, 6).unwrap();

    assert_eq!(ints(&list), vec![5, 6]);
    let changed = log.changed();
    assert_eq!(changed.len(), 2);
    assert_eq!(changed[1].index, NodeIndex::from(1));
    assert_eq!(changed[1].change_type, ChangeType::Add);
    assert!(changed[1].old_value.is_null());
    assert_eq!(changed[1].new_value, Value::Int(6));
}

#[test]
fn test_add_then_remove_restores_list() {
    let (graph, _scores, list, node) = scores_collection("Values");
    graph.add(node, 1).unwrap();
    graph.add(node, 2).unwrap();
    let before = ints(&list);

    graph.add(node, 9).unwrap();
    let last = graph.item_count(node).unwrap() - 1;
    graph.remove(node, 9, last).unwrap();

    assert_eq!(ints(&list), before);
}

#[test]
fn test_add_at_inserts_or_appends() {
    let (graph, _scores, list, node) = scores_collection("Values");
    graph.add(node, 1).unwrap();
    graph.add(node, 3).unwrap();

    graph.add_at(node, 2, 1usize).unwrap();
    assert_eq!(ints(&list), vec![1, 2, 3]);

    graph.add_at(node, 4, 3usize).unwrap();
    assert_eq!(ints(&list), vec![1, 2, 3, 4]);

    let err = graph.add_at(node, 9, 10usize).unwrap_err();
    assert!(err.is_invalid_index());
    assert_eq!(list.len(), 4);
}

#[test]
fn test_add_at_falls_back_to_append_without_insert() {
    let factory = factory();
    let bag = factory
        .new_collection(INT_BAG, vec![Value::Int(1), Value::Int(2)])
        .unwrap();
    let graph = NodeContainer::new();
    let node = graph.get_or_create_node(&bag).unwrap();
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    graph.add_at(node, 0, 0usize).unwrap();

    assert_eq!(ints(&bag), vec![1, 2, 0]);
    assert_eq!(log.changed()[0].index, NodeIndex::from(2));
    log.clear();

    // Positions past the end and non-positional keys append as well
    graph.add_at(node, 7, 5usize).unwrap();
    graph.add_at(node, 8, "last").unwrap();

    assert_eq!(ints(&bag), vec![1, 2, 0, 7, 8]);
    let indices: Vec<NodeIndex> = log.changed().iter().map(|e| e.index.clone()).collect();
    assert_eq!(indices, vec![NodeIndex::from(3), NodeIndex::from(4)]);
}

#[test]
fn test_add_at_rejects_positions_past_the_end() {
    let (graph, _scores, list, node) = scores_collection("Values");
    graph.add(node, 1).unwrap();

    let err = graph.add_at(node, 2, 5usize).unwrap_err();

    assert!(err.is_invalid_index());
    assert_eq!(ints(&list), vec![1]);
}

#[test]
fn test_add_coerces_items() {
    let (graph, _scores, list, node) = scores_collection("Values");
    graph.add(node, 2.6).unwrap();
    assert_eq!(ints(&list), vec![3]);

    let err = graph.add(node, "text").unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(list.len(), 1);
}

#[test]
fn test_add_on_object_is_unsupported() {
    let factory = factory();
    let scores = factory.instantiate(SCORES).unwrap();
    let graph = NodeContainer::new();
    let node = graph.get_or_create_node(&scores).unwrap();

    let err = graph.add(node, 1).unwrap_err();
    assert!(err.is_unsupported());
    let err = graph.remove(node, 1, 0).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_remove_requires_an_index() {
    let (graph, _scores, list, node) = scores_collection("Values");
    graph.add(node, 1).unwrap();
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    let err = graph.remove(node, 1, NodeIndex::Empty).unwrap_err();
    assert!(err.is_invalid_index());
    let err = graph.remove(node, 1, 4).unwrap_err();
    assert!(err.is_invalid_index());

    assert_eq!(list.len(), 1);
    assert!(log.callbacks().is_empty());
}

#[test]
fn test_remove_without_remove_at_removes_by_value() {
    let factory = factory();
    let bag = factory
        .new_collection(INT_BAG, vec![Value::Int(4), Value::Int(5), Value::Int(6)])
        .unwrap();
    let graph = NodeContainer::new();
    let node = graph.get_or_create_node(&bag).unwrap();
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    graph.remove(node, 5, 1).unwrap();

    assert_eq!(ints(&bag), vec![4, 6]);
    let changing = log
        .callbacks()
        .iter()
        .filter(|name| **name == "item_changing")
        .count();
    assert_eq!(changing, 1);
    let changed = log.changed();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].change_type, ChangeType::Remove);
    assert_eq!(changed[0].old_value, Value::Int(5));
    assert!(changed[0].new_value.is_null());

    let err = graph.remove(node, 42, 0).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_update_on_object_node_needs_an_index() {
    let (graph, _scores, list, node) = scores_collection("Values");
    graph.add(node, 1).unwrap();

    let err = graph.update(node, 2, NodeIndex::Empty).unwrap_err();
    assert!(err.is_invalid_index());

    graph.update(node, 2, 0).unwrap();
    assert_eq!(ints(&list), vec![2]);
}

#[test]
fn test_update_reports_old_and_new_values() {
    let (graph, _scores, _list, node) = scores_collection("Values");
    graph.add(node, 1).unwrap();
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    graph.update(node, 8, 0).unwrap();

    let changed = log.changed();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].change_type, ChangeType::Update);
    assert_eq!(changed[0].old_value, Value::Int(1));
    assert_eq!(changed[0].new_value, Value::Int(8));
}

#[test]
fn test_set_add_derives_index_from_value() {
    let (graph, _scores, set, node) = scores_collection("Tags");
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    graph.add(node, "red").unwrap();
    graph.add_at(node, "blue", 0usize).unwrap();

    assert_eq!(set.len(), 2);
    let changed = log.changed();
    assert_eq!(changed[0].index, NodeIndex::from("red"));
    assert_eq!(changed[1].index, NodeIndex::from("blue"));
}

#[test]
fn test_set_ignores_present_values() {
    let (graph, _scores, set, node) = scores_collection("Tags");
    graph.add(node, "red").unwrap();
    graph.add(node, "blue").unwrap();
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    graph.add(node, "red").unwrap();
    graph.update(node, "blue", "red").unwrap();

    assert_eq!(set.len(), 2);
    assert!(log.callbacks().is_empty());

    graph.update(node, "green", "red").unwrap();
    let items: Vec<Value> = set.items();
    assert!(items.contains(&Value::from("green")));
    assert!(!items.contains(&Value::from("red")));
    assert_eq!(log.changed().len(), 1);
}

#[test]
fn test_set_remove_by_value() {
    let (graph, _scores, set, node) = scores_collection("Tags");
    graph.add(node, "red").unwrap();
    graph.add(node, "blue").unwrap();

    graph.remove(node, "red", "red").unwrap();

    assert_eq!(set.items(), vec![Value::from("blue")]);
}

#[test]
fn test_dictionary_add_is_keyed() {
    let (graph, _scores, dict, node) = scores_collection("Lookup");
    let log = Rc::new(EventLog::default());
    graph.subscribe(log.clone());

    graph.add_at(node, 1, "one").unwrap();
    graph.add_at(node, 2, "two").unwrap();

    assert_eq!(dict.len(), 2);
    assert_eq!(graph.retrieve(node, "two").unwrap(), Value::Int(2));
    assert_eq!(log.changed()[1].index, NodeIndex::from("two"));

    let err = graph.add_at(node, 3, "one").unwrap_err();
    assert!(matches!(
        err,
        quantum::Error::Descriptor(quantum::descriptor::DescriptorError::DuplicateKey { .. })
    ));
    assert_eq!(log.changed().len(), 2);

    let err = graph.add(node, 3).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_dictionary_update_and_remove() {
    let (graph, _scores, dict, node) = scores_collection("Lookup");
    graph.add_at(node, 1, "one").unwrap();

    graph.update(node, 10, "one").unwrap();
    assert_eq!(graph.retrieve(node, "one").unwrap(), Value::Int(10));

    let err = graph.update(node, 10, "zero").unwrap_err();
    assert!(err.is_not_found());

    graph.remove(node, 10, "one").unwrap();
    assert!(dict.is_empty());
}

#[test]
fn test_indices_and_counts() {
    let (graph, _scores, _dict, node) = scores_collection("Lookup");
    graph.add_at(node, 1, "a").unwrap();
    graph.add_at(node, 2, "b").unwrap();

    assert_eq!(graph.item_count(node).unwrap(), 2);
    assert_eq!(
        graph.indices(node).unwrap().unwrap(),
        vec![
            NodeIndex::Key(IndexKey::from("a")),
            NodeIndex::Key(IndexKey::from("b"))
        ]
    );
}

#[test]
fn test_object_node_id_survives_mutation() {
    let (graph, _scores, _list, node) = scores_collection("Values");
    let id = graph.node_id(node).unwrap();

    graph.add(node, 1).unwrap();
    graph.update(node, 2, 0).unwrap();
    graph.remove(node, 2, 0).unwrap();

    assert_eq!(graph.node_id(node).unwrap(), id);
}

#[test]
fn test_nodes_answer_their_kind() {
    let (graph, scores, list, node) = scores_collection("Values");
    let root = graph.get_node(&scores).unwrap();

    assert!(matches!(&*graph.node(node).unwrap(), GraphNode::Object(_)));
    assert!(graph.object(node).unwrap().is_enumerable());
    assert!(!graph.object(root).unwrap().is_enumerable());
    assert_eq!(graph.host(node).unwrap(), list);

    let err = graph.member_node(root).unwrap_err();
    assert!(matches!(
        err,
        quantum::Error::Graph(quantum::graph::GraphError::NotAMemberNode { .. })
    ));
    let member = graph.member(root, "Values").unwrap();
    let err = graph.object(member).unwrap_err();
    assert!(matches!(
        err,
        quantum::Error::Graph(quantum::graph::GraphError::NotAnObjectNode { .. })
    ));
}
