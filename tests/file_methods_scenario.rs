//! Classification of file methods into views

mod common;

use common::fixtures::{session, sig};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tracepath::ids::{MethodRef, MethodSig};
use tracepath::storage::{Actions, ApiOrigin, FileMethod, FileMethodStore};

fn signatures(records: &[FileMethod]) -> Vec<MethodSig> {
    records.iter().map(|r| r.signature().clone()).collect()
}

#[test]
fn test_open_and_android_api_views() {
    let store = FileMethodStore::new();
    store.add_all([
        FileMethod::new(
            MethodRef::new(sig("<A: void g()>"), false),
            Actions::remove(),
            ApiOrigin::AndroidApi,
        ),
        FileMethod::new(
            MethodRef::new(sig("<A: void f()>"), false),
            Actions::open(),
            ApiOrigin::JavaApi,
        ),
    ]);

    assert_eq!(signatures(&store.open_methods()), vec![sig("<A: void f()>")]);
    assert_eq!(signatures(&store.android_api_methods()), vec![sig("<A: void g()>")]);
    assert_eq!(
        signatures(&store.output_data()),
        vec![sig("<A: void f()>"), sig("<A: void g()>")]
    );
    assert!(store.android_system_methods().is_empty());
}

#[test]
fn test_text_dump_reads_back_with_session() {
    let text = "# File Methods Database:\n\
                open:access        JavaAPI       <A: void f()>\n\
                \x20 <A: void g()>\n\
                remove             AndroidAPI    <A: void g()>\n";
    let session = Arc::new(session());
    let store = FileMethodStore::parse_txt(text, session.as_ref()).unwrap();
    assert_eq!(store.to_text(""), text);

    store.load_resolved_data(session).unwrap();
    assert_eq!(store.data().unwrap().len(), 2);
}
