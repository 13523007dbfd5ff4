//! Tests for PluginTree navigation, value slots and re-parenting

mod common;

use std::sync::Arc;

use rstest::{fixture, rstest};

use common::Widget;
use plugtree::domain::{
    Builtin, DomainError, NodeId, NodeType, NodeValue, Plugin, PluginTree, Value,
};

struct Sample {
    tree: PluginTree,
    a: NodeId,
    b: NodeId,
    c: NodeId,
    d: NodeId,
}

/// `/A/B/C` and `/D`
#[fixture]
fn sample() -> Sample {
    let mut tree = PluginTree::new();
    let root = tree.root();
    let a = tree.add_node(root, "A", NodeValue::Empty).unwrap();
    let b = tree.add_node(a, "B", NodeValue::Empty).unwrap();
    let c = tree.add_node(b, "C", NodeValue::Empty).unwrap();
    let d = tree.add_node(root, "D", NodeValue::Empty).unwrap();
    Sample { tree, a, b, c, d }
}

fn full_path(tree: &PluginTree, id: Option<NodeId>) -> Option<String> {
    id.and_then(|id| tree.full_path(id)).map(str::to_string)
}

#[rstest]
#[case("/A/B/C", "/A/B/C")]
#[case("A/B", "/A/B")]
#[case("/A/./B", "/A/B")]
#[case("/A/B/..", "/A")]
#[case("/A/B/C/../../../..", "/")]
#[case("/A/B//D", "/D")]
#[case("/a/b", "/A/B")]
#[case("/", "/")]
fn given_path_from_root_when_finding_then_walks_segments(
    sample: Sample,
    #[case] path: &str,
    #[case] expected: &str,
) {
    let found = sample.tree.find(sample.tree.root(), path);
    assert_eq!(full_path(&sample.tree, found).as_deref(), Some(expected));
}

#[rstest]
fn given_relative_path_when_finding_from_node_then_moves_cursor(sample: Sample) {
    let tree = &sample.tree;

    assert_eq!(tree.find(sample.b, "C"), Some(sample.c));
    assert_eq!(tree.find(sample.b, ".."), Some(sample.a));
    assert_eq!(tree.find(sample.b, "."), Some(sample.b));
    assert_eq!(tree.find(sample.b, "../../D"), Some(sample.d));
    assert_eq!(tree.find(tree.root(), ".."), Some(tree.root()));
}

#[rstest]
fn given_several_paths_when_finding_all_then_applies_in_order(sample: Sample) {
    let tree = &sample.tree;

    // Arrange: each string starts where the previous one stopped
    let found = tree.find_all(tree.root(), &["A", "B/C", "..", "", "../../D"]);

    // Assert: blank strings are skipped
    assert_eq!(found, Some(sample.d));
}

#[rstest]
fn given_missing_segment_when_finding_all_then_whole_walk_fails(sample: Sample) {
    let tree = &sample.tree;

    assert_eq!(tree.find(tree.root(), "/A/X/C"), None);
    assert_eq!(tree.find_all(tree.root(), &["A", "Missing", "/D"]), None);
    assert_eq!(tree.find_all(tree.root(), &[]), None);
}

#[rstest]
fn given_sibling_with_same_name_when_adding_then_duplicate_error(mut sample: Sample) {
    let result = sample.tree.add_node(sample.a, "b", NodeValue::Empty);
    assert!(matches!(result, Err(DomainError::DuplicateChild { .. })));
}

#[rstest]
#[case("")]
#[case("x/y")]
#[case("..")]
fn given_invalid_name_when_adding_then_rejected(mut sample: Sample, #[case] name: &str) {
    let result = sample.tree.add_node(sample.a, name, NodeValue::Empty);
    assert!(matches!(result, Err(DomainError::InvalidName(_))));
}

#[rstest]
fn given_cached_paths_when_reparenting_then_subtree_recomputes(mut sample: Sample) {
    // Arrange: warm the caches
    assert_eq!(sample.tree.full_path(sample.c), Some("/A/B/C"));
    assert_eq!(sample.tree.path(sample.c), Some("/A/B"));

    // Act
    sample.tree.set_parent(sample.b, sample.d).unwrap();

    // Assert
    assert_eq!(sample.tree.full_path(sample.b), Some("/D/B"));
    assert_eq!(sample.tree.full_path(sample.c), Some("/D/B/C"));
    assert_eq!(sample.tree.path(sample.c), Some("/D/B"));
    assert!(sample.tree.node(sample.a).unwrap().children().is_empty());
    assert_eq!(sample.tree.find(sample.tree.root(), "/D/B/C"), Some(sample.c));
}

#[rstest]
fn given_descendant_as_new_parent_when_reparenting_then_cycle_error(mut sample: Sample) {
    let result = sample.tree.set_parent(sample.a, sample.c);
    assert!(matches!(result, Err(DomainError::CyclicParent(_))));
}

#[rstest]
fn given_detached_node_when_finding_then_unreachable(mut sample: Sample) {
    sample.tree.detach(sample.b).unwrap();

    assert_eq!(sample.tree.find(sample.tree.root(), "/A/B"), None);
    assert_eq!(sample.tree.node(sample.b).unwrap().parent(), None);
    assert_eq!(sample.tree.full_path(sample.c), Some("B/C"));
}

#[rstest]
fn given_nested_node_when_listing_ancestors_then_nearest_first(sample: Sample) {
    let ancestors: Vec<_> = sample.tree.ancestors(sample.c).collect();
    assert_eq!(ancestors, vec![sample.b, sample.a, sample.tree.root()]);
}

#[rstest]
fn given_valued_ancestor_when_finding_owner_then_skips_empty_nodes(mut sample: Sample) {
    sample
        .tree
        .set_value(sample.a, Value::object(Widget::default()))
        .unwrap();

    assert_eq!(sample.tree.owner_node(sample.c), Some(sample.a));
    assert_eq!(sample.tree.owner_node(sample.d), None);
}

#[test]
fn given_builtin_bound_to_node_when_binding_elsewhere_then_already_bound() {
    let mut tree = PluginTree::new();
    let root = tree.root();
    let builtin = Arc::new(Builtin::new("shared"));

    let a = tree.add_node(root, "A", builtin.clone()).unwrap();
    let result = tree.add_node(root, "B", builtin.clone());

    assert!(matches!(result, Err(DomainError::AlreadyBound { .. })));
    assert_eq!(builtin.node(), Some(a));
    assert_eq!(tree.find(root, "B"), None);
    // Re-setting the same builtin on its own node is a no-op
    tree.set_value(a, builtin.clone()).unwrap();
}

#[test]
fn given_declared_properties_when_setting_object_then_applies_immediately() {
    // Arrange
    let mut tree = PluginTree::new();
    let node = tree.add_node(tree.root(), "W", NodeValue::Empty).unwrap();
    let properties = tree.properties_mut(node).unwrap();
    properties.set("color", "Red");
    properties.set("Size", "7");
    properties.set("Missing", "ignored");
    properties.set("Size2", "x");

    // Act
    tree.set_value(node, Value::object(Widget::default())).unwrap();

    // Assert
    let NodeValue::Custom(value) = tree.node(node).unwrap().value() else {
        panic!("expected custom value");
    };
    let widget = value.downcast_ref::<Widget>().unwrap();
    assert_eq!(widget.color(), "Red");
    assert_eq!(widget.size(), 7);
}

#[test]
fn given_caller_keeps_handle_when_setting_object_then_properties_still_applied() {
    // Arrange
    let mut tree = PluginTree::new();
    let node = tree.add_node(tree.root(), "W", NodeValue::Empty).unwrap();
    tree.properties_mut(node).unwrap().set("Color", "Red");
    let widget = Value::object(Widget::default());
    let handle = widget.clone();

    // Act
    tree.set_value(node, widget).unwrap();

    // Assert: both handles see the same instance
    assert_eq!(handle.downcast_ref::<Widget>().unwrap().color(), "Red");
}

#[test]
fn given_custom_value_when_clearing_then_empty_and_properties_kept() {
    let mut tree = PluginTree::new();
    let node = tree
        .add_node(tree.root(), "W", Value::object(Widget::default()))
        .unwrap();
    tree.properties_mut(node).unwrap().set("Color", "Blue");

    tree.set_value(node, Value::Null).unwrap();

    let node = tree.node(node).unwrap();
    assert_eq!(node.node_type(), NodeType::Empty);
    assert!(node.plugin().is_none());
    assert_eq!(node.properties().raw("color"), Some("Blue"));
}

#[test]
fn given_builtin_with_plugin_when_displaying_node_then_shows_type_and_plugin() {
    let mut tree = PluginTree::new();
    let plugin = Arc::new(Plugin::new("Main", "/plugins/Main.plugin"));
    let a = tree.add_node(tree.root(), "A", NodeValue::Empty).unwrap();
    let b = tree
        .add_node(a, "B", Builtin::new("B").with_plugin(plugin))
        .unwrap();

    assert_eq!(tree.display(b).to_string(), "[Builtin]/A/B@Main");
    assert_eq!(tree.display(a).to_string(), "/A");
}

#[rstest]
fn given_tree_when_iterating_then_preorder(sample: Sample) {
    let names: Vec<_> = sample.tree.iter().map(|(_, n)| n.name().to_string()).collect();
    assert_eq!(names, vec!["/", "A", "B", "C", "D"]);
    assert_eq!(sample.tree.depth(), 4);
}
