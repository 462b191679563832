//! Persistence round trips of the stores

mod common;

use common::fixtures::{entry_point, looping_record, session, sig, string_record};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use tracepath::parts::Form;
use tracepath::storage::{
    load_or_compute, Actions, ApiOrigin, FileHashList, FileMethod, FileMethodStore,
    PathStore, PersistentStore, StoreConfig, StoreKind,
};

#[test]
fn test_path_store_json_is_byte_stable() {
    let dir = tempdir().unwrap();
    let config = StoreConfig {
        output_dir: dir.path().to_path_buf(),
        ..StoreConfig::default()
    };
    let first = config.path_for(StoreKind::Paths);
    let second = dir.path().join("again.json");

    let store = PathStore::new();
    store.add(entry_point("<A: void g()>"), vec![string_record("/sdcard", 1)]);
    store.add(entry_point("<A: void f()>"), vec![looping_record(), string_record("/data", 0)]);
    store.write_json(&first, &config).unwrap();

    let reloaded = PathStore::read_json(&first).unwrap();
    reloaded.write_json(&second, &config).unwrap();
    assert_eq!(fs::read_to_string(&first).unwrap(), fs::read_to_string(&second).unwrap());
    assert_eq!(
        reloaded.to_text("", Form::Simple).unwrap(),
        store.to_text("", Form::Simple).unwrap()
    );
}

#[test]
fn test_reloaded_path_store_reattaches_to_session() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("paths.json");
    let store = PathStore::new();
    let f = entry_point("<A: void f()>");
    let record = looping_record();
    store.add(f.clone(), vec![record.clone()]);
    store.write_json(&file, &StoreConfig::default()).unwrap();

    let reloaded = PathStore::read_json(&file).unwrap();
    reloaded.load_resolved_data(Arc::new(session())).unwrap();
    assert_eq!(reloaded.entry_points().unwrap(), vec![f.clone()]);
    assert_eq!(reloaded.paths_for(&f).unwrap(), vec![record]);
}

#[test]
fn test_file_method_text_and_json_agree() {
    let dir = tempdir().unwrap();
    let config = StoreConfig {
        output_dir: dir.path().to_path_buf(),
        ..StoreConfig::default()
    };
    let session = session();

    let store = FileMethodStore::new();
    let mut f = FileMethod::new(
        tracepath::ids::MethodRef::new(sig("<A: void f()>"), false),
        Actions::new(true, true, false).unwrap(),
        ApiOrigin::JavaApi,
    );
    f.set_sinks([sig("<A: void h()>")]);
    store.add(f);
    store.add(FileMethod::new(
        tracepath::ids::MethodRef::new(sig("<A: void h()>"), false),
        Actions::remove(),
        ApiOrigin::AndroidSystem,
    ));

    let txt = config.path_for(StoreKind::FileMethodsText);
    store.write_txt(&txt, &config).unwrap();
    let from_text = FileMethodStore::read_txt(&txt, &session).unwrap();

    let json = config.path_for(StoreKind::FileMethods);
    from_text.write_json(&json, &config).unwrap();
    let from_json = FileMethodStore::read_json(&json).unwrap();
    assert_eq!(from_json.output_data(), store.output_data());
}

#[test]
fn test_load_or_compute_skips_current_path_store() {
    let dir = tempdir().unwrap();
    let dep = dir.path().join("apk.txt");
    fs::write(&dep, "classes").unwrap();
    let out = dir.path().join("paths.json");
    let config = StoreConfig::default();

    let built: PathStore = load_or_compute(&out, &[&dep], &config, || {
        let store = PathStore::new();
        store.add(entry_point("<A: void f()>"), vec![string_record("/data", 0)]);
        Ok(store)
    })
    .unwrap();
    assert_eq!(built.file_hashes(), FileHashList::compute([&dep]).unwrap());

    let reused: PathStore = load_or_compute(&out, &[&dep], &config, || {
        panic!("store with current dependencies was recomputed")
    })
    .unwrap();
    assert_eq!(reused.len(), 1);
}
