//! Graph traversal tests

use std::rc::Rc;

use quantum::{
    AssetGraphVisitor, CollectingVisitor, GraphNodePath, GraphVisitor, NodeContainer, NodeHandle,
    PropertyGraphDefinition, Value, visitor,
};

use crate::helpers::*;

struct Fixture {
    graph: NodeContainer,
    root: NodeHandle,
    asset: quantum::HostRef,
    owned: quantum::HostRef,
}

fn fixture() -> Fixture {
    let factory = factory();
    let asset = factory.instantiate(ASSET_WITH_REF).unwrap();
    asset.set("NonReference", &referenceable(&factory, "inline")).unwrap();
    asset.set("Reference", &referenceable(&factory, "linked")).unwrap();
    let references = object_member(&asset, "References");
    references
        .descriptor()
        .add(&references, Value::from(referenceable(&factory, "listed")))
        .unwrap();
    let owned = referenceable(&factory, "owned");
    let owned_items = object_member(&asset, "OwnedItems");
    owned_items
        .descriptor()
        .add(&owned_items, Value::from(&owned))
        .unwrap();

    let graph = NodeContainer::new();
    let root = graph
        .get_or_create_node_with(&asset, Rc::new(MyAssetWithRefDefinition))
        .unwrap();
    Fixture {
        graph,
        root,
        asset,
        owned,
    }
}

fn node_of(graph: &NodeContainer, host: &quantum::HostRef, member: &str) -> NodeHandle {
    graph.get_node(&object_member(host, member)).unwrap()
}

#[test]
fn test_plain_walk_reaches_every_object() {
    let f = fixture();
    let mut collector = CollectingVisitor::new();
    visitor::visit(&f.graph, f.root, &mut collector).unwrap();

    assert_eq!(collector.nodes()[0], f.root);
    assert!(collector.contains(node_of(&f.graph, &f.asset, "Reference")));
    assert!(collector.contains(node_of(&f.graph, &f.asset, "NonReference")));
    assert!(collector.contains(f.graph.get_node(&f.owned).unwrap()));
    // root, two members, two lists, one listed item, one owned item
    assert_eq!(collector.visited().len(), 7);
}

#[test]
fn test_asset_walk_prunes_reference_members() {
    let f = fixture();
    let mut asset_visitor =
        AssetGraphVisitor::new(Rc::new(MyAssetWithRefDefinition), CollectingVisitor::new());
    visitor::visit(&f.graph, f.root, &mut asset_visitor).unwrap();
    let collector = asset_visitor.into_inner();

    assert!(!collector.contains(node_of(&f.graph, &f.asset, "Reference")));
    assert!(collector.contains(node_of(&f.graph, &f.asset, "NonReference")));
}

#[test]
fn test_asset_walk_prunes_reference_items() {
    let f = fixture();
    let mut asset_visitor =
        AssetGraphVisitor::new(Rc::new(MyAssetWithRefDefinition), CollectingVisitor::new());
    visitor::visit(&f.graph, f.root, &mut asset_visitor).unwrap();
    let collector = asset_visitor.inner();

    let references = object_member(&f.asset, "References");
    let listed = references.items()[0].as_object().cloned().unwrap();
    // The list itself is owned, its items are references
    assert!(collector.contains(f.graph.get_node(&references).unwrap()));
    assert!(!collector.contains(f.graph.get_node(&listed).unwrap()));
    // Non-identifiable items are owned and visited
    assert!(collector.contains(f.graph.get_node(&f.owned).unwrap()));
}

#[test]
fn test_walk_records_paths() {
    let f = fixture();
    let mut collector = CollectingVisitor::new();
    visitor::visit(&f.graph, f.root, &mut collector).unwrap();

    let owned = f.graph.get_node(&f.owned).unwrap();
    let (_, path) = collector
        .visited()
        .iter()
        .find(|(node, _)| *node == owned)
        .unwrap();
    assert_eq!(path.to_string(), ".OwnedItems->[0]");
    assert_eq!(path.root(), f.root);
    assert_eq!(path.resolve(&f.graph), Some(owned));
    assert_eq!(GraphNodePath::new(f.root).resolve(&f.graph), Some(f.root));
    assert_eq!(
        GraphNodePath::new(f.root)
            .with_member("Missing")
            .resolve(&f.graph),
        None
    );
}

#[test]
fn test_back_links_do_not_loop() {
    let factory = factory();
    let parent = part(&factory, "parent");
    let child = part(&factory, "child");
    child.set("Parent", &parent).unwrap();
    let children = object_member(&parent, "Children");
    children
        .descriptor()
        .add(&children, Value::from(&child))
        .unwrap();
    let graph = NodeContainer::new();
    let root = graph.get_or_create_node(&parent).unwrap();

    let mut collector = CollectingVisitor::new();
    visitor::visit(&graph, root, &mut collector).unwrap();

    let child_node = graph.get_node(&child).unwrap();
    let visits = collector
        .nodes()
        .iter()
        .filter(|node| **node == root || **node == child_node)
        .count();
    assert_eq!(visits, 2);
}

/// Skips the targets of members with the given name
struct SkipMember(&'static str, CollectingVisitor);

impl GraphVisitor for SkipMember {
    fn visit_object(&mut self, graph: &NodeContainer, node: NodeHandle, path: &GraphNodePath) {
        self.1.visit_object(graph, node, path);
    }

    fn should_visit_member_target(&mut self, graph: &NodeContainer, member: NodeHandle) -> bool {
        graph
            .member_node(member)
            .map(|member| member.name() != self.0)
            .unwrap_or(true)
    }
}

#[test]
fn test_visitors_prune_member_targets() {
    let f = fixture();
    let mut skip = SkipMember("NonReference", CollectingVisitor::new());
    visitor::visit(&f.graph, f.root, &mut skip).unwrap();

    assert!(!skip.1.contains(node_of(&f.graph, &f.asset, "NonReference")));
    assert!(skip.1.contains(node_of(&f.graph, &f.asset, "Reference")));
}

#[test]
fn test_definitions_are_shared_by_the_graph() {
    let f = fixture();
    let object = f.graph.object(f.root).unwrap();
    let definition: &Rc<dyn PropertyGraphDefinition> = object.definition();
    let owned = f.graph.get_node(&f.owned).unwrap();
    assert!(Rc::ptr_eq(
        definition,
        f.graph.object(owned).unwrap().definition()
    ));
}
