use tracepath::ids::{EntryPoint, MemorySession, MethodRef, MethodSig, StmtSig};
use tracepath::parts::{AnyKind, AnyLeaf, Leaf, PartGraph, PartId, Placeholder};
use tracepath::storage::PathRecord;

pub fn sig(text: &str) -> MethodSig {
    MethodSig::parse(text).expect("valid method signature")
}

pub fn stmt(method: &str, index: u32) -> StmtSig {
    StmtSig::new(sig(method), index, format!("stmt{index}"))
}

/// Session knowing `f`, `g` and `h` of class `A`
pub fn session() -> MemorySession {
    let mut session = MemorySession::new();
    for name in ["f", "g", "h"] {
        session.add_method(sig(&format!("<A: void {name}()>")), false);
    }
    session
}

pub fn entry_point(method: &str) -> EntryPoint {
    EntryPoint::new(MethodRef::new(sig(method), false), None)
}

/// `Append(Or(Constant("a"), Any), Loop)` where the loop leads back to the append
///
/// Returns the graph, the seed placeholder and the append root.
pub fn looping_path() -> (PartGraph, PartId, PartId) {
    let mut g = PartGraph::new();
    let source = stmt("<A: void f()>", 3);
    let seed = g.leaf(Placeholder::Argument { source: source.clone(), index: 0 });
    let a = g.leaf(Leaf::string("a"));
    let any = g.leaf(AnyLeaf::new(AnyKind::FieldRef, Some(source)));
    let or = g.or([a, any]).expect("or of leaves");
    let root = g.append([or]).expect("append of or");
    let lp = g.loop_of(Some(root)).expect("loop to root");
    g.add(root, lp).expect("append accepts children");
    (g, seed, root)
}

pub fn looping_record() -> PathRecord {
    let (g, seed, root) = looping_path();
    PathRecord::new(&g, seed, root).expect("record of looping path")
}

/// Path record whose expression is `{text}`
pub fn string_record(text: &str, arg: u32) -> PathRecord {
    let mut g = PartGraph::new();
    let seed = g.leaf(Placeholder::Argument { source: stmt("<A: void f()>", 0), index: arg });
    let c = g.leaf(Leaf::string(text));
    let root = g.append([c]).expect("append of leaf");
    PathRecord::new(&g, seed, root).expect("record of string path")
}
