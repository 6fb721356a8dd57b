mod common;

use common::setup_db;
use warbler_db::{DbError, User};

#[test]
fn failed_commit_writes_nothing() {
    let db = setup_db();
    let mut session = db.session();

    // second insert collides with the first, so neither may land
    session.add_user(User::new("a@test.com", "alice", "pw"));
    session.add_user(User::new("a@test.com", "alice2", "pw"));
    assert!(session.commit().unwrap_err().is_integrity());

    assert!(db.list_users(None).unwrap().is_empty());
}

#[test]
fn failed_commit_requires_rollback() {
    let db = setup_db();
    let mut session = db.session();

    session.add_user(User::new("a@test.com", "alice", "pw"));
    session.add_user(User::new("b@test.com", "alice", "pw"));
    assert!(session.commit().is_err());

    session.add_user(User::new("c@test.com", "carol", "pw"));
    assert!(matches!(session.commit(), Err(DbError::RollbackRequired)));

    session.rollback();
    assert!(!session.has_pending());

    session.add_user(User::new("c@test.com", "carol", "pw"));
    session.commit().unwrap();
    assert_eq!(db.list_users(None).unwrap().len(), 1);
}

#[test]
fn dropped_session_discards_staged_writes() {
    let db = setup_db();
    {
        let mut session = db.session();
        session.add_user(User::new("a@test.com", "alice", "pw"));
    }
    assert!(db.get_user_by_username("alice").unwrap().is_none());
}

#[test]
fn empty_commit_is_a_no_op() {
    let db = setup_db();
    let mut session = db.session();
    session.commit().unwrap();
    assert!(!session.has_pending());
}

#[test]
fn connect_accepts_memory_url() {
    let db = warbler_db::Database::connect("sqlite://:memory:").unwrap();
    assert!(db.list_users(None).unwrap().is_empty());
}

#[test]
fn open_file_database_persists_across_handles() {
    let path = std::env::temp_dir().join(format!("warbler-test-{}.db", uuid::Uuid::new_v4()));

    {
        let db = warbler_db::Database::open(&path).unwrap();
        let mut session = db.session();
        session.add_user(User::new("a@test.com", "alice", "pw"));
        session.commit().unwrap();
    }

    let db = warbler_db::Database::open(&path).unwrap();
    assert!(db.get_user_by_username("alice").unwrap().is_some());

    drop(db);
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
}
