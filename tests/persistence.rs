use std::fs;

use clanhall::clan::{ClanError, ClanService, ErrorKind, Rank};
use clanhall::config::PersistMode;
use clanhall::storage::{decode_registry, encode_registry, ClanStore};

fn store_in(dir: &tempfile::TempDir) -> ClanStore {
    ClanStore::new(dir.path().join("data").join("clans.json"))
}

#[test]
fn missing_store_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let svc = ClanService::open(store_in(&dir), PersistMode::EveryMutation).unwrap();
    assert!(svc.list_clans().is_empty());
    assert!(!store_in(&dir).path().exists());
}

#[test]
fn every_mutation_is_written_through() {
    let dir = tempfile::tempdir().unwrap();
    {
        let svc = ClanService::open(store_in(&dir), PersistMode::EveryMutation).unwrap();
        svc.create_clan("Raptors", "alice").unwrap();
        svc.invite_player("alice", "bob").unwrap();
        svc.accept_invite("bob", "Raptors").unwrap();
        svc.change_rank("alice", "bob", "admin").unwrap();
        svc.invite_player("bob", "carol").unwrap();
        svc.create_clan("Owls", "dave").unwrap();
        assert!(!svc.is_dirty());

        // Reading the file mid-session already reflects the last change.
        let on_disk = store_in(&dir).load().unwrap();
        assert_eq!(on_disk, svc.snapshot());
    }

    let reopened = ClanService::open(store_in(&dir), PersistMode::EveryMutation).unwrap();
    let raptors = reopened.clan("Raptors").unwrap();
    assert_eq!(raptors.owner(), "alice");
    assert_eq!(raptors.get_member_rank("bob"), Rank::Admin);
    assert!(raptors.is_invited("carol"));
    assert_eq!(reopened.query_rank_of("dave"), Rank::Owner);
}

#[test]
fn manual_mode_writes_on_flush_and_drop() {
    let dir = tempfile::tempdir().unwrap();
    let svc = ClanService::open(store_in(&dir), PersistMode::Manual).unwrap();
    svc.create_clan("Raptors", "alice").unwrap();
    assert!(svc.is_dirty());
    assert!(store_in(&dir).load().unwrap().is_empty());

    assert!(svc.flush().unwrap());
    assert!(!svc.is_dirty());
    assert!(!svc.flush().unwrap());
    assert!(store_in(&dir).load().unwrap().contains("Raptors"));

    svc.create_clan("Owls", "carol").unwrap();
    drop(svc);
    assert_eq!(store_in(&dir).load().unwrap().len(), 2);
}

#[test]
fn corrupt_store_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();

    fs::write(store.path(), "Raptors,alice,alice:Owner\n").unwrap();
    let err = ClanService::open(store.clone(), PersistMode::EveryMutation).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::CorruptData);

    fs::write(
        store.path(),
        r#"{"schema_version":1,"clans":[
            {"name":"A","owner":"a","members":{"a":"Owner","x":"Member"}},
            {"name":"B","owner":"b","members":{"b":"Owner","x":"Admin"}}
        ]}"#,
    )
    .unwrap();
    let err = ClanService::open(store.clone(), PersistMode::EveryMutation).err().unwrap();
    assert!(matches!(err, ClanError::CorruptData(_)));

    fs::write(store.path(), r#"{"schema_version":2,"clans":[]}"#).unwrap();
    let err = ClanService::open(store, PersistMode::EveryMutation).err().unwrap();
    assert!(matches!(err, ClanError::SchemaMismatch { expected: 1, found: 2 }));
}

#[test]
fn failed_save_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let svc = ClanService::open(store.clone(), PersistMode::EveryMutation).unwrap();
    svc.create_clan("Raptors", "alice").unwrap();

    // Replace the store file with a directory so the next write fails.
    fs::remove_file(store.path()).unwrap();
    fs::create_dir(store.path()).unwrap();

    let err = svc.invite_player("alice", "bob").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(!svc.clan("Raptors").unwrap().is_invited("bob"));
}

#[test]
fn no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let svc = ClanService::open(store_in(&dir), PersistMode::EveryMutation).unwrap();
    svc.create_clan("Raptors", "alice").unwrap();
    svc.invite_player("alice", "bob").unwrap();
    let names: Vec<String> = fs::read_dir(dir.path().join("data"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["clans.json".to_string()]);
}

#[test]
fn names_with_symbols_round_trip() {
    let svc = ClanService::in_memory();
    svc.create_clan("[RPT]_\"Ünion\"", "ällice").unwrap();
    svc.invite_player("ällice", "bob,the:builder").unwrap();
    let reg = svc.snapshot();
    let loaded = decode_registry(&encode_registry(&reg).unwrap()).unwrap();
    assert_eq!(loaded, reg);
}

#[test]
fn empty_identity_in_store_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(
        store.path(),
        r#"{"schema_version":1,"clans":[{"name":"Raptors","owner":"","members":{"":"Owner"}}]}"#,
    )
    .unwrap();
    let err = ClanService::open(store, PersistMode::EveryMutation).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::CorruptData);
}
