//! Concurrent writers racing readers that upgrade to rebuild stale caches

mod common;

use common::fixtures::{entry_point, sig, string_record};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tracepath::ids::{MemorySession, MethodRef};
use tracepath::storage::{
    Actions, ApiOrigin, FileMethod, FileMethodStore, MessageHandlerStore, PathStore, View,
};

const WRITERS: usize = 8;
const READERS: usize = 4;
const PER_WRITER: usize = 25;

fn method_name(writer: usize, i: usize) -> String {
    format!("<A: void m{writer:02}_{i:03}()>")
}

#[test]
fn test_path_store_keeps_every_addition() {
    let store = PathStore::new();
    thread::scope(|s| {
        for w in 0..WRITERS {
            let store = &store;
            s.spawn(move || {
                for i in 0..PER_WRITER {
                    store.add(entry_point(&method_name(w, i)), vec![string_record("/x", 0)]);
                }
            });
        }
        for _ in 0..READERS {
            let store = &store;
            s.spawn(move || {
                for _ in 0..PER_WRITER {
                    let out = store.output_data();
                    assert!(out.windows(2).all(|p| p[0] < p[1]));
                }
            });
        }
    });

    let out = store.output_data();
    assert_eq!(out.len(), WRITERS * PER_WRITER);
    let unique: HashSet<_> = out.iter().map(|r| r.method.clone()).collect();
    assert_eq!(unique.len(), WRITERS * PER_WRITER);
    assert!(out.windows(2).all(|p| p[0] < p[1]));
}

#[test]
fn test_resolved_path_view_tracks_concurrent_additions() {
    let mut session = MemorySession::new();
    for w in 0..WRITERS {
        for i in 0..PER_WRITER {
            session.add_method(sig(&method_name(w, i)), false);
        }
    }
    let store = PathStore::with_session(Arc::new(session));
    thread::scope(|s| {
        for w in 0..WRITERS {
            let store = &store;
            s.spawn(move || {
                for i in 0..PER_WRITER {
                    store.add(entry_point(&method_name(w, i)), vec![string_record("/x", 0)]);
                }
            });
        }
        for _ in 0..READERS {
            let store = &store;
            s.spawn(move || {
                for _ in 0..PER_WRITER {
                    let data = store.data().expect("every entry point resolves");
                    assert!(data.values().all(|paths| paths.len() == 1));
                }
            });
        }
    });

    assert_eq!(store.data().unwrap().len(), WRITERS * PER_WRITER);
    let entries = store.entry_points().unwrap();
    assert!(entries.windows(2).all(|p| p[0] < p[1]));
}

#[test]
fn test_file_method_views_keep_every_addition() {
    let store = FileMethodStore::new();
    thread::scope(|s| {
        for w in 0..WRITERS {
            let store = &store;
            s.spawn(move || {
                for i in 0..PER_WRITER {
                    let actions = if i % 2 == 0 { Actions::open() } else { Actions::remove() };
                    store.add(FileMethod::new(
                        MethodRef::new(sig(&method_name(w, i)), false),
                        actions,
                        ApiOrigin::JavaApi,
                    ));
                }
            });
        }
        for _ in 0..READERS {
            let store = &store;
            s.spawn(move || {
                for _ in 0..PER_WRITER {
                    let open = store.view(View::Open);
                    assert!(open.windows(2).all(|p| p[0] < p[1]));
                }
            });
        }
    });

    assert_eq!(store.output_data().len(), WRITERS * PER_WRITER);
    assert_eq!(store.open_methods().len(), WRITERS * PER_WRITER.div_ceil(2));
    assert_eq!(store.remove_methods().len(), WRITERS * (PER_WRITER / 2));
    assert_eq!(store.java_api_methods().len(), WRITERS * PER_WRITER);
}

#[test]
fn test_handler_store_deduplicates_across_threads() {
    let store = MessageHandlerStore::new();
    thread::scope(|s| {
        for _ in 0..WRITERS {
            let store = &store;
            s.spawn(move || {
                for i in 0..PER_WRITER {
                    store.add(MethodRef::new(sig(&method_name(0, i)), false));
                    let _ = store.methods().len();
                }
            });
        }
    });
    assert_eq!(store.output_data().len(), PER_WRITER);
}
