use graft_core::{MemoryStore, SchemaRegistry, Walker, WalkerConfig};
use graft_model::{Node, ObjectRef, Value};
use proptest::prelude::*;
use std::sync::Arc;

/// Schema-less walker; bean properties come from introspection
fn walker(clone_objects: bool) -> Walker {
    Walker::new(Arc::new(MemoryStore::new()), Arc::new(SchemaRegistry::empty()))
        .with_config(WalkerConfig::new().with_clone_objects(clone_objects))
}

/// Cells with arbitrary `next` edges, cycles and self-loops included
fn graph(labels: &[String], edges: &[Option<usize>]) -> Vec<ObjectRef> {
    let cells: Vec<ObjectRef> = labels
        .iter()
        .map(|label| ObjectRef::new(Node::bean("Cell").with_attr("label", label.as_str())))
        .collect();
    for (cell, edge) in cells.iter().zip(edges) {
        if let Some(target) = edge {
            cell.set_attr("next", cells[target % cells.len()].clone());
        }
    }
    cells
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,12}".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn clone_disconnect_preserves_topology(
        labels in prop::collection::vec("[a-z]{1,6}", 1..8),
        edges in prop::collection::vec(prop::option::of(0usize..16), 8),
    ) {
        let cells = graph(&labels, &edges);
        let root = Value::object(Node::list(cells.iter().cloned().map(Value::from).collect()));

        let copy = walker(true).disconnect(&root).unwrap();
        let copies = copy.as_object().unwrap().items();
        prop_assert_eq!(copies.len(), cells.len());

        for (original, copied) in cells.iter().zip(&copies) {
            let copied = copied.as_object().unwrap();
            prop_assert!(!copied.ptr_eq(original));
            prop_assert_eq!(copied.attr("label"), original.attr("label"));

            let expected = original
                .attr("next")
                .as_object()
                .and_then(|target| cells.iter().position(|cell| cell.ptr_eq(target)))
                .map_or(Value::Null, |index| copies[index].clone());
            prop_assert_eq!(copied.attr("next"), expected);
        }
    }

    #[test]
    fn apply_of_unmanaged_graph_is_identity(
        labels in prop::collection::vec("[a-z]{1,6}", 1..8),
        edges in prop::collection::vec(prop::option::of(0usize..16), 8),
    ) {
        let cells = graph(&labels, &edges);
        let root = Value::object(Node::list(cells.iter().cloned().map(Value::from).collect()));

        let applied = walker(false).apply(&root).unwrap();
        let items = applied.as_object().unwrap().items();

        prop_assert_eq!(items, cells.into_iter().map(Value::from).collect::<Vec<_>>());
    }

    #[test]
    fn scalars_pass_through(value in scalar()) {
        let walker = walker(true);
        prop_assert_eq!(walker.disconnect(&value).unwrap(), value.clone());
        prop_assert_eq!(walker.apply(&value).unwrap(), value.clone());

        let expected = if value.is_null() { Value::from(0) } else { value.clone() };
        prop_assert_eq!(walker.apply_to(&value, &Value::from(0)).unwrap(), expected);
    }
}
