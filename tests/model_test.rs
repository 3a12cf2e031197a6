//! Tests for TreeModel

use std::cell::Cell;
use std::rc::Rc;

use rstest::{fixture, rstest};

use treemodel::structure::validate_depth_values;
use treemodel::util::testing::init_test_setup;
use treemodel::{SimpleElement, TreeError, TreeModel};

fn element(name: &str, depth: i32, id: i32) -> SimpleElement {
    SimpleElement::new(name, depth, id)
}

fn names(model: &TreeModel<SimpleElement>) -> Vec<&str> {
    model.data().iter().map(|e| e.name.as_str()).collect()
}

// root (id 0)
// ├── x (id 1)
// │   └── y (id 2)
// └── z (id 3)
#[fixture]
fn nested_model() -> TreeModel<SimpleElement> {
    init_test_setup();
    TreeModel::new(vec![
        element("root", -1, 0),
        element("x", 0, 1),
        element("y", 1, 2),
        element("z", 0, 3),
    ])
    .unwrap()
}

// ============================================================
// Adding Elements
// ============================================================

#[test]
fn given_root_only_when_adding_at_position_zero_then_preorder_matches() {
    init_test_setup();
    let mut model = TreeModel::new(vec![element("Root", -1, 0)]).unwrap();

    let a = model.generate_unique_id();
    model.add_element(element("A", 0, a), 0, 0).unwrap();
    let b = model.generate_unique_id();
    model.add_element(element("B", 0, b), 0, 0).unwrap();
    let c = model.generate_unique_id();
    model.add_element(element("C", 0, c), 0, 0).unwrap();
    // B is now the middle child of the root
    let d = model.generate_unique_id();
    model.add_element(element("D", 0, d), b, 0).unwrap();

    assert_eq!(names(&model), vec!["Root", "C", "B", "D", "A"]);
    let parent_depth = model.find(b).unwrap().depth;
    assert_eq!(model.find(d).unwrap().depth, parent_depth + 1);
    validate_depth_values(model.data()).unwrap();
}

#[rstest]
fn given_block_of_elements_when_adding_then_relative_order_is_kept(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let m = nested_model.generate_unique_id();
    let n = nested_model.generate_unique_id();

    nested_model
        .add_elements(vec![element("m", 0, m), element("n", 0, n)], 1, 1)
        .unwrap();

    assert_eq!(names(&nested_model), vec!["root", "x", "y", "m", "n", "z"]);
    assert_eq!(nested_model.find(m).unwrap().depth, 1);
    assert_eq!(nested_model.find(n).unwrap().depth, 1);
    validate_depth_values(nested_model.data()).unwrap();
}

#[rstest]
fn given_empty_block_when_adding_then_empty_input(mut nested_model: TreeModel<SimpleElement>) {
    let result = nested_model.add_elements(Vec::new(), 0, 0);

    assert!(matches!(result, Err(TreeError::EmptyInput(_))));
}

#[rstest]
fn given_unknown_parent_when_adding_then_element_not_found(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let id = nested_model.generate_unique_id();

    let result = nested_model.add_element(element("lost", 0, id), 42, 0);

    assert!(matches!(result, Err(TreeError::ElementNotFound(42))));
}

#[test]
fn given_empty_model_when_adding_root_then_root_established() {
    init_test_setup();
    let mut model: TreeModel<SimpleElement> = TreeModel::new(Vec::new()).unwrap();

    model.add_root(element("root", 0, 0)).unwrap();

    assert_eq!(model.len(), 1);
    let root = model.root().unwrap();
    assert_eq!(root.depth, -1);
    assert_eq!(root.id, 1);
}

#[rstest]
fn given_populated_model_when_adding_root_then_rejected(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let result = nested_model.add_root(element("another", 0, 0));

    assert!(matches!(result, Err(TreeError::InvalidOperation(_))));
}

// ============================================================
// Removing Elements
// ============================================================

#[test]
fn given_set_with_descendant_when_removing_then_ancestor_covers_it() {
    init_test_setup();
    let mut model = TreeModel::new(vec![
        element("R", -1, 0),
        element("X", 0, 1),
        element("Y", 1, 2),
    ])
    .unwrap();

    // Y is listed first but already covered by removing X
    model.remove_elements(&[2, 1]).unwrap();

    assert_eq!(names(&model), vec!["R"]);
    validate_depth_values(model.data()).unwrap();
}

#[rstest]
fn given_root_in_target_set_when_removing_then_rejected_and_unchanged(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let before = nested_model.data().to_vec();

    let result = nested_model.remove_elements(&[3, 0]);

    assert!(matches!(result, Err(TreeError::InvalidOperation(_))));
    assert_eq!(nested_model.data(), &before[..]);
}

#[rstest]
fn given_unknown_ids_when_removing_then_nothing_changes_but_notification_fires(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    nested_model.on_changed(move || counter.set(counter.get() + 1));

    nested_model.remove_elements(&[99]).unwrap();

    assert_eq!(names(&nested_model), vec!["root", "x", "y", "z"]);
    assert_eq!(fired.get(), 1);
}

// ============================================================
// Moving Elements
// ============================================================

#[test]
fn given_first_two_children_when_moving_to_index_two_then_order_is_unchanged() {
    init_test_setup();
    let mut model = TreeModel::new(vec![
        element("root", -1, 0),
        element("a", 0, 1),
        element("b", 0, 2),
        element("c", 0, 3),
    ])
    .unwrap();

    // a and b sit above the insertion point, so the index compensates to 0
    model.move_elements(Some(0), 2, &[1, 2]).unwrap();

    assert_eq!(names(&model), vec!["root", "a", "b", "c"]);
    validate_depth_values(model.data()).unwrap();
}

#[rstest]
fn given_move_under_sibling_subtree_then_depths_follow_new_parent(
    mut nested_model: TreeModel<SimpleElement>,
) {
    // Reparent z under y
    nested_model.move_elements(Some(2), 0, &[3]).unwrap();

    assert_eq!(names(&nested_model), vec!["root", "x", "y", "z"]);
    let parent_depth = nested_model.find(2).unwrap().depth;
    assert_eq!(nested_model.find(3).unwrap().depth, parent_depth + 1);
    validate_depth_values(nested_model.data()).unwrap();
}

#[rstest]
fn given_no_drop_target_when_moving_then_noop_without_notification(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    nested_model.on_changed(move || counter.set(counter.get() + 1));

    nested_model.move_elements(None, 0, &[1]).unwrap();

    assert_eq!(names(&nested_model), vec!["root", "x", "y", "z"]);
    assert_eq!(fired.get(), 0);
}

#[rstest]
fn given_target_inside_moved_subtree_when_moving_then_rejected(
    mut nested_model: TreeModel<SimpleElement>,
) {
    // y lives inside x, so x cannot be reparented under it
    let result = nested_model.move_elements(Some(2), 0, &[1]);

    assert!(matches!(result, Err(TreeError::InvalidOperation(_))));
}

#[rstest]
fn given_root_among_moved_when_moving_then_rejected(mut nested_model: TreeModel<SimpleElement>) {
    let result = nested_model.move_elements(Some(1), 0, &[0]);

    assert!(matches!(result, Err(TreeError::InvalidOperation(_))));
}

#[rstest]
fn given_oversized_insertion_index_when_moving_then_invalid_argument(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let result = nested_model.move_elements(Some(0), 5, &[3]);

    assert!(matches!(result, Err(TreeError::InvalidArgument(_))));
}

// ============================================================
// Queries
// ============================================================

#[rstest]
fn given_nested_element_when_getting_ancestors_then_nearest_first(
    nested_model: TreeModel<SimpleElement>,
) {
    assert_eq!(nested_model.get_ancestors(2), vec![1, 0]);
    assert!(nested_model.get_ancestors(0).is_empty());
    assert!(nested_model.get_ancestors(99).is_empty());
}

#[rstest]
fn given_subtree_when_collecting_descendants_then_only_nodes_with_children(
    nested_model: TreeModel<SimpleElement>,
) {
    assert_eq!(nested_model.get_descendants_that_have_children(0), vec![0, 1]);
    assert!(nested_model.get_descendants_that_have_children(3).is_empty());
    assert!(nested_model.get_descendants_that_have_children(99).is_empty());
}

#[rstest]
fn given_mutable_find_when_renaming_then_data_reflects_change(
    mut nested_model: TreeModel<SimpleElement>,
) {
    nested_model.find_mut(3).unwrap().name = "renamed".to_string();

    assert_eq!(names(&nested_model), vec!["root", "x", "y", "renamed"]);
}

// ============================================================
// Identifiers
// ============================================================

#[test]
fn given_existing_ids_when_generating_then_ids_stay_above_maximum() {
    init_test_setup();
    let mut model =
        TreeModel::new(vec![element("root", -1, 7), element("kid", 0, 3)]).unwrap();

    assert_eq!(model.generate_unique_id(), 8);
    assert_eq!(model.generate_unique_id(), 9);
}

#[rstest]
fn given_caller_numbered_element_when_adding_then_generated_ids_do_not_collide(
    mut nested_model: TreeModel<SimpleElement>,
) {
    nested_model.add_element(element("big", 0, 50), 0, 0).unwrap();

    assert_eq!(nested_model.generate_unique_id(), 51);
}

// ============================================================
// Notification Discipline
// ============================================================

#[rstest]
fn given_listener_when_mutating_then_fires_once_per_successful_call(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    nested_model.on_changed(move || counter.set(counter.get() + 1));

    let id = nested_model.generate_unique_id();
    nested_model.add_element(element("n1", 0, id), 0, 0).unwrap();
    assert_eq!(fired.get(), 1);

    nested_model.remove_elements(&[id]).unwrap();
    assert_eq!(fired.get(), 2);

    nested_model.move_elements(Some(1), 0, &[3]).unwrap();
    assert_eq!(fired.get(), 3);

    // A rejected call must not fire
    assert!(nested_model.remove_elements(&[0]).is_err());
    assert_eq!(fired.get(), 3);
}

// ============================================================
// Replacing Data
// ============================================================

#[rstest]
fn given_new_data_when_set_then_model_rebuilds(mut nested_model: TreeModel<SimpleElement>) {
    nested_model.set_data(vec![element("solo", -1, 10)]).unwrap();

    assert_eq!(nested_model.len(), 1);
    assert!(nested_model.find(1).is_none());
    assert_eq!(nested_model.find(10).unwrap().name, "solo");
    assert_eq!(nested_model.generate_unique_id(), 11);
}

#[rstest]
fn given_malformed_data_when_set_then_previous_state_survives(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let result = nested_model.set_data(vec![element("bad", 3, 5)]);

    assert!(result.is_err());
    assert_eq!(names(&nested_model), vec!["root", "x", "y", "z"]);
}

#[rstest]
fn given_finished_model_when_consuming_then_list_is_handed_back(
    nested_model: TreeModel<SimpleElement>,
) {
    let data = nested_model.into_data();

    assert_eq!(data.len(), 4);
    assert_eq!(data[0].depth, -1);
}

// ============================================================
// Invariants Across Sequences
// ============================================================

#[rstest]
fn given_mixed_mutation_sequence_when_done_then_depth_invariant_holds(
    mut nested_model: TreeModel<SimpleElement>,
) {
    let m = nested_model.generate_unique_id();
    nested_model.add_element(element("m", 0, m), 2, 0).unwrap();
    nested_model.move_elements(Some(3), 0, &[1]).unwrap();
    nested_model.remove_elements(&[2]).unwrap();

    validate_depth_values(nested_model.data()).unwrap();
    let roots = nested_model
        .data()
        .iter()
        .filter(|e| e.depth == -1)
        .count();
    assert_eq!(roots, 1);
}

// ============================================================
// Rendering
// ============================================================

#[rstest]
fn given_model_when_rendering_then_root_is_top_line(nested_model: TreeModel<SimpleElement>) {
    let rendered = nested_model.to_tree_string().to_string();

    assert!(rendered.starts_with("root"));
    assert!(rendered.contains('x'));
    assert!(rendered.contains('z'));
}

#[test]
fn given_empty_model_when_rendering_then_placeholder() {
    init_test_setup();
    let model: TreeModel<SimpleElement> = TreeModel::new(Vec::new()).unwrap();

    assert_eq!(model.to_tree_string().to_string().trim(), "Empty tree");
}
