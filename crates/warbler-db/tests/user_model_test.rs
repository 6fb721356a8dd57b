mod common;

use common::{setup_db, test_hasher, two_users};
use warbler_db::{AuthOutcome, DbError, Message, User, authenticate, check_credentials, signup};

#[test]
fn new_user_has_no_messages_or_followers() {
    let db = setup_db();
    let u = User::new("test@test.com", "testuser", "HASHED_PASSWORD");

    let mut session = db.session();
    session.add_user(u.clone());
    session.commit().unwrap();

    assert_eq!(u.messages(&db).unwrap().len(), 0);
    assert_eq!(u.followers(&db).unwrap().len(), 0);
    assert_eq!(u.following(&db).unwrap().len(), 0);
}

#[test]
fn display_contains_email_and_username() {
    let db = setup_db();
    let u = User::new("test@test.com", "testuser", "HASHED_PASSWORD");

    let mut session = db.session();
    session.add_user(u.clone());
    session.commit().unwrap();

    let stored = db.get_user_by_id(u.id).unwrap().unwrap();
    let repr = stored.to_string();
    assert!(repr.contains("test@test.com"));
    assert!(repr.contains("testuser"));
}

#[test]
fn is_following_tracks_follow_and_unfollow() {
    let db = setup_db();
    let (u1, u2) = two_users(&db);

    let mut session = db.session();
    session.follow(u1.id, u2.id);
    session.commit().unwrap();
    assert!(u1.is_following(&db, &u2).unwrap());
    assert!(!u2.is_following(&db, &u1).unwrap());

    session.unfollow(u1.id, u2.id);
    session.commit().unwrap();
    assert!(!u1.is_following(&db, &u2).unwrap());
}

#[test]
fn is_followed_by_tracks_follow_and_unfollow() {
    let db = setup_db();
    let (u1, u2) = two_users(&db);

    let mut session = db.session();
    session.follow(u1.id, u2.id);
    session.commit().unwrap();
    assert!(u2.is_followed_by(&db, &u1).unwrap());
    assert!(!u1.is_followed_by(&db, &u2).unwrap());

    session.unfollow(u1.id, u2.id);
    session.commit().unwrap();
    assert!(!u2.is_followed_by(&db, &u1).unwrap());
}

#[test]
fn followers_and_following_lists() {
    let db = setup_db();
    let (u1, u2) = two_users(&db);

    let mut session = db.session();
    session.follow(u1.id, u2.id);
    session.commit().unwrap();

    let following: Vec<_> = u1.following(&db).unwrap().into_iter().map(|u| u.id).collect();
    let followers: Vec<_> = u2.followers(&db).unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(following, vec![u2.id]);
    assert_eq!(followers, vec![u1.id]);
}

#[test]
fn follow_is_not_staged_visible_before_commit() {
    let db = setup_db();
    let (u1, u2) = two_users(&db);

    let mut session = db.session();
    session.follow(u1.id, u2.id);
    assert!(!u1.is_following(&db, &u2).unwrap());

    session.rollback();
    session.commit().unwrap();
    assert!(!u1.is_following(&db, &u2).unwrap());
}

#[test]
fn duplicate_follow_is_integrity_violation() {
    let db = setup_db();
    let (u1, u2) = two_users(&db);

    let mut session = db.session();
    session.follow(u1.id, u2.id);
    session.commit().unwrap();

    session.follow(u1.id, u2.id);
    let err = session.commit().unwrap_err();
    assert!(err.is_integrity(), "unexpected error: {err}");
    session.rollback();
}

#[test]
fn self_follow_is_allowed_by_the_store() {
    let db = setup_db();
    let (u1, _) = two_users(&db);

    let mut session = db.session();
    session.follow(u1.id, u1.id);
    session.commit().unwrap();
    assert!(u1.is_following(&db, &u1).unwrap());
}

#[test]
fn signup_returns_user_with_hashed_password() {
    let db = setup_db();
    let hasher = test_hasher();

    let mut session = db.session();
    let u = signup(&mut session, &hasher, "testuser", "test@test.com", "testuser", None).unwrap();
    session.commit().unwrap();

    let stored = db.get_user_by_username("testuser").unwrap().unwrap();
    assert_eq!(stored.id, u.id);
    assert_ne!(stored.password, "testuser");
    assert!(stored.password.starts_with("$argon2"));
    assert_eq!(stored.image_url, "/static/images/default-pic.png");
}

#[test]
fn signup_keeps_given_image_url() {
    let db = setup_db();
    let hasher = test_hasher();

    let mut session = db.session();
    let u = signup(&mut session, &hasher, "pic", "pic@test.com", "pw", Some("/me.png")).unwrap();
    session.commit().unwrap();

    assert_eq!(db.get_user_by_id(u.id).unwrap().unwrap().image_url, "/me.png");
}

#[test]
fn signup_is_staged_until_commit() {
    let db = setup_db();
    let hasher = test_hasher();

    let mut session = db.session();
    signup(&mut session, &hasher, "testuser", "test@test.com", "testuser", None).unwrap();
    assert!(db.get_user_by_username("testuser").unwrap().is_none());

    session.commit().unwrap();
    assert!(db.get_user_by_username("testuser").unwrap().is_some());
}

#[test]
fn signup_with_duplicate_username_fails_at_commit() {
    let db = setup_db();
    let hasher = test_hasher();

    let mut session = db.session();
    signup(&mut session, &hasher, "testuser", "test@test.com", "testuser", None).unwrap();
    session.commit().unwrap();

    // staging succeeds, the store rejects it
    signup(&mut session, &hasher, "testuser", "other@test.com", "testuser", None).unwrap();
    let err = session.commit().unwrap_err();
    assert!(matches!(err, DbError::Integrity(_)), "unexpected error: {err}");
    session.rollback();
}

#[test]
fn signup_with_duplicate_email_fails_at_commit() {
    let db = setup_db();
    let hasher = test_hasher();

    let mut session = db.session();
    signup(&mut session, &hasher, "testuser", "test@test.com", "testuser", None).unwrap();
    session.commit().unwrap();

    signup(&mut session, &hasher, "otheruser", "test@test.com", "testuser", None).unwrap();
    assert!(session.commit().unwrap_err().is_integrity());
}

#[test]
fn authenticate_valid_and_invalid_credentials() {
    let db = setup_db();
    let hasher = test_hasher();

    let mut session = db.session();
    let u = signup(
        &mut session,
        &hasher,
        "Test",
        "Test@Test.com",
        "TestPassword",
        Some("/static/images/default-pic.png"),
    )
    .unwrap();
    session.commit().unwrap();

    let found = authenticate(&db, &hasher, "Test", "TestPassword").unwrap();
    assert_eq!(found.map(|user| user.id), Some(u.id));

    assert!(authenticate(&db, &hasher, "FakeUsername", "TestPassword").unwrap().is_none());
    assert!(authenticate(&db, &hasher, "Test", "FakePassword").unwrap().is_none());
}

#[test]
fn check_credentials_distinguishes_failures_internally() {
    let db = setup_db();
    let hasher = test_hasher();

    let mut session = db.session();
    signup(&mut session, &hasher, "Test", "Test@Test.com", "TestPassword", None).unwrap();
    session.commit().unwrap();

    assert_eq!(
        check_credentials(&db, &hasher, "nobody", "TestPassword").unwrap(),
        AuthOutcome::UnknownUser
    );
    assert_eq!(
        check_credentials(&db, &hasher, "Test", "nope").unwrap(),
        AuthOutcome::WrongPassword
    );
    assert!(matches!(
        check_credentials(&db, &hasher, "Test", "TestPassword").unwrap(),
        AuthOutcome::Authenticated(_)
    ));
}

#[test]
fn authenticate_rejects_user_with_unhashed_password() {
    let db = setup_db();
    let (u1, _) = two_users(&db);

    assert!(authenticate(&db, &test_hasher(), &u1.username, "HASHED_PASSWORD").unwrap().is_none());
}

#[test]
fn deleting_user_cascades_to_messages_and_follows() {
    let db = setup_db();
    let (u1, u2) = two_users(&db);

    let msg = Message::new("bye", u1.id);
    let mut session = db.session();
    session.add_message(msg.clone());
    session.follow(u1.id, u2.id);
    session.follow(u2.id, u1.id);
    session.commit().unwrap();

    session.delete_user(u1.id);
    session.commit().unwrap();

    assert!(db.get_user_by_id(u1.id).unwrap().is_none());
    assert!(db.get_message(msg.id).unwrap().is_none());
    assert!(u2.followers(&db).unwrap().is_empty());
    assert!(u2.following(&db).unwrap().is_empty());
}

#[test]
fn update_user_changes_profile_fields() {
    let db = setup_db();
    let (mut u1, u2) = two_users(&db);

    u1.bio = Some("hello".into());
    u1.location = Some("Paris".into());
    let mut session = db.session();
    session.update_user(u1.clone());
    session.commit().unwrap();

    let stored = db.get_user_by_id(u1.id).unwrap().unwrap();
    assert_eq!(stored.bio.as_deref(), Some("hello"));
    assert_eq!(stored.location.as_deref(), Some("Paris"));

    // taking someone else's username violates uniqueness
    u1.username = u2.username.clone();
    session.update_user(u1);
    assert!(session.commit().unwrap_err().is_integrity());
}

#[test]
fn list_users_filters_by_username() {
    let db = setup_db();
    two_users(&db);

    assert_eq!(db.list_users(None).unwrap().len(), 2);
    assert_eq!(db.list_users(Some("")).unwrap().len(), 2);

    let found = db.list_users(Some("test2")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "test2user");
}

#[test]
fn delete_all_resets_every_table() {
    let db = setup_db();
    let (u1, u2) = two_users(&db);

    let mut session = db.session();
    session.follow(u1.id, u2.id);
    session.add_message(Message::new("hi", u1.id));
    session.commit().unwrap();

    db.delete_all().unwrap();
    assert!(db.list_users(None).unwrap().is_empty());
    assert!(!db.is_following(u1.id, u2.id).unwrap());
    assert!(db.get_user_messages(u1.id, None).unwrap().is_empty());
}
