//! Cloning, loop identity, alternation de-duplication and sequence ordering

mod common;

use common::fixtures::{looping_path, stmt};
use pretty_assertions::assert_eq;
use tracepath::parts::{AnyKind, AnyLeaf, CloneMemo, Form, Leaf, Part, PartGraph};

#[test]
fn test_leaf_clone_is_identical_branch_clone_is_equal() {
    let (mut g, seed, root) = looping_path();
    let mut memo = CloneMemo::new();

    assert_eq!(g.clone_part(seed, &mut memo).unwrap(), seed);

    let copy = g.clone_part(root, &mut memo).unwrap();
    assert_ne!(copy, root);
    assert!(g.part_eq(copy, root).unwrap());
}

#[test]
fn test_cyclic_clone_is_self_consistent() {
    let (mut g, _, root) = looping_path();
    let copy = g.deep_clone(root).unwrap();

    let children = g.child_parts(copy).unwrap();
    let lp = children[1];
    assert!(g.part(lp).unwrap().is_loop());
    // The cloned loop leads back to the cloned root, not the original.
    assert_eq!(g.child_parts(lp).unwrap(), vec![copy]);
}

#[test]
fn test_one_memo_shares_copies_across_calls() {
    let (mut g, _, root) = looping_path();
    let or = g.child_parts(root).unwrap()[0];
    let mut memo = CloneMemo::new();

    let root_copy = g.clone_part(root, &mut memo).unwrap();
    let or_copy = g.clone_part(or, &mut memo).unwrap();
    assert_eq!(g.child_parts(root_copy).unwrap()[0], or_copy);
}

#[test]
fn test_separate_loops_never_equal() {
    let mut g = PartGraph::new();
    let body = g.leaf(Leaf::string("x"));
    let a = g.loop_of(Some(body)).unwrap();
    let b = g.loop_of(Some(body)).unwrap();
    assert!(!g.part_eq(a, b).unwrap());

    let a_copy = g.deep_clone(a).unwrap();
    assert!(g.part_eq(a, a_copy).unwrap());
    assert_eq!(g.part(a).unwrap().loop_id(), g.part(a_copy).unwrap().loop_id());
}

#[test]
fn test_or_ignores_duplicates() {
    let mut g = PartGraph::new();
    let a = g.leaf(Leaf::string("a"));
    let a_again = g.leaf(Leaf::string("a"));
    let b = g.leaf(Leaf::string("b"));
    let or = g.or([a, b]).unwrap();

    assert!(!g.add(or, a_again).unwrap());
    assert_eq!(g.children(or).unwrap().len(), 2);
}

#[test]
fn test_or_merge_never_shrinks() {
    let mut g = PartGraph::new();
    let a = g.leaf(Leaf::string("a"));
    let b = g.leaf(Leaf::string("b"));
    let c = g.leaf(Leaf::string("c"));
    let inner = g.or([a, c]).unwrap();
    let outer = g.or([a, b]).unwrap();
    g.add(outer, inner).unwrap();
    let before = g.children(outer).unwrap().len();

    let node = g.children(outer).unwrap()[2];
    assert!(g.merge_child(outer, node).unwrap());
    let after = g.children(outer).unwrap().len();
    assert!(after >= before);
    assert_eq!(g.render(outer, Form::Full).unwrap(), "(a | b | c)");
}

#[test]
fn test_append_keeps_order_and_multiplicity() {
    let mut g = PartGraph::new();
    let a = g.leaf(Leaf::string("a"));
    let b = g.leaf(Leaf::string("b"));
    let inner = g.append([b, a]).unwrap();
    let outer = g.append([a, inner, a]).unwrap();

    let node = g.children(outer).unwrap()[1];
    assert!(g.merge_child(outer, node).unwrap());
    assert_eq!(g.render(outer, Form::Full).unwrap(), "{a + b + a + a}");
}

#[test]
fn test_merge_of_mismatched_kinds_is_noop() {
    let mut g = PartGraph::new();
    let a = g.leaf(Leaf::string("a"));
    let or = g.or([a]).unwrap();
    let app = g.append([or]).unwrap();
    let node = g.children(app).unwrap()[0];
    assert!(!g.merge_child(app, node).unwrap());
    assert!(matches!(g.part(app).unwrap(), Part::Append(_)));
}

#[test]
fn test_regex_skips_loops_and_matches_paths() {
    let (g, _, root) = looping_path();
    let re = g.matcher(root).unwrap();
    assert!(re.is_match("a"));
    assert!(re.is_match("/data/anything"));

    let mut g = PartGraph::new();
    let dir = g.leaf(Leaf::string("/data/"));
    let num = g.leaf(AnyLeaf::new(AnyKind::UserId, Some(stmt("<A: void f()>", 1))));
    let path = g.append([dir, num]).unwrap();
    let re = g.matcher(path).unwrap();
    assert!(re.is_match("/data/10"));
    assert!(!re.is_match("/data/x"));
}

#[test]
fn test_post_order_terminates_on_cycles() {
    let (g, _, root) = looping_path();
    let visited: Vec<_> = g.post_order(root).map(|v| v.part).collect();
    assert_eq!(visited.last(), Some(&root));
    assert!(visited.len() >= 5);
}
