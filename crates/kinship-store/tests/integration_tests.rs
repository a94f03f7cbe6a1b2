//! Integration tests for kinship-store
//!
//! These tests exercise the directory lookups and the relationship record
//! lifecycle against a real SQLite database.

use kinship_domain::traits::{RelationshipStore, UserDirectory};
use kinship_domain::{FriendState, ListKind, RelationshipId, StateUpdate, User, UserId};
use kinship_store::{SqliteStore, StoreError};

fn store_with_users(names: &[&str]) -> (SqliteStore, Vec<User>) {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let users: Vec<User> = names
        .iter()
        .map(|name| User::new(UserId::new(), format!("{}@example.com", name.to_lowercase()), *name))
        .collect();
    for user in &users {
        store.insert_user(user).unwrap();
    }
    (store, users)
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
    assert!(store.unwrap().ping().is_ok());
}

#[test]
fn test_directory_lookups() {
    let (store, users) = store_with_users(&["Alice"]);
    let alice = &users[0];

    let by_id = store.find_by_identity(alice.id).unwrap();
    assert_eq!(by_id.as_ref(), Some(alice));

    let by_contact = store.find_by_contact("alice@example.com").unwrap();
    assert_eq!(by_contact.as_ref(), Some(alice));

    assert!(store.find_by_identity(UserId::new()).unwrap().is_none());
    assert!(store.find_by_contact("nobody@example.com").unwrap().is_none());
}

#[test]
fn test_profile_fields_survive_storage() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let user = User::new(UserId::new(), "carol@example.com", "Carol")
        .with_avatar("avatars/carol.png")
        .with_bio("likes graphs");
    store.insert_user(&user).unwrap();

    let loaded = store.find_by_identity(user.id).unwrap().unwrap();
    assert_eq!(loaded.avatar.as_deref(), Some("avatars/carol.png"));
    assert_eq!(loaded.bio.as_deref(), Some("likes graphs"));
}

#[test]
fn test_duplicate_contact_is_a_conflict() {
    let (mut store, _) = store_with_users(&["Alice"]);
    let twin = User::new(UserId::new(), "alice@example.com", "Alice Again");

    let result = store.insert_user(&twin);
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}

#[test]
fn test_insert_and_find_by_either_ordering() {
    let (mut store, users) = store_with_users(&["Alice", "Bob"]);
    let (a, b) = (users[0].id, users[1].id);

    let created = store.insert_relationship(a, b, FriendState::PendingLeft).unwrap();
    assert_eq!(created.left, a);
    assert_eq!(created.right, b);

    let forward = store.find_active_by_pair(a, b).unwrap().unwrap();
    let backward = store.find_active_by_pair(b, a).unwrap().unwrap();
    assert_eq!(forward, backward);
    assert_eq!(forward.id, created.id);

    let by_id = store.find_active_by_id(created.id).unwrap().unwrap();
    assert_eq!(by_id.state, FriendState::PendingLeft);
}

#[test]
fn test_second_active_record_for_pair_is_rejected() {
    let (mut store, users) = store_with_users(&["Alice", "Bob"]);
    let (a, b) = (users[0].id, users[1].id);

    store.insert_relationship(a, b, FriendState::PendingLeft).unwrap();
    let reversed = store.insert_relationship(b, a, FriendState::PendingLeft);

    assert!(matches!(reversed, Err(StoreError::Conflict(_))));
    assert_eq!(store.count_active_relationships().unwrap(), 1);
}

#[test]
fn test_self_relationship_and_none_state_are_invalid() {
    let (mut store, users) = store_with_users(&["Alice", "Bob"]);
    let (a, b) = (users[0].id, users[1].id);

    assert!(matches!(
        store.insert_relationship(a, a, FriendState::PendingLeft),
        Err(StoreError::InvalidData(_))
    ));
    assert!(matches!(
        store.insert_relationship(a, b, FriendState::None),
        Err(StoreError::InvalidData(_))
    ));
}

#[test]
fn test_update_state_is_compare_and_swap() {
    let (mut store, users) = store_with_users(&["Alice", "Bob"]);
    let (a, b) = (users[0].id, users[1].id);
    let rel = store.insert_relationship(a, b, FriendState::PendingLeft).unwrap();

    let accept = StateUpdate {
        id: rel.id,
        expected: FriendState::PendingLeft,
        next: FriendState::Mutual,
        swap: false,
    };
    assert!(store.update_state(&accept).unwrap());

    // Same expectation again: the stored state moved on, nothing is written
    let stale = StateUpdate { next: FriendState::Rejected, ..accept };
    assert!(!store.update_state(&stale).unwrap());

    let current = store.find_active_by_id(rel.id).unwrap().unwrap();
    assert_eq!(current.state, FriendState::Mutual);
}

#[test]
fn test_update_state_swaps_left_and_right() {
    let (mut store, users) = store_with_users(&["Alice", "Bob"]);
    let (a, b) = (users[0].id, users[1].id);
    let rel = store.insert_relationship(a, b, FriendState::Rejected).unwrap();

    let rearm = StateUpdate {
        id: rel.id,
        expected: FriendState::Rejected,
        next: FriendState::PendingLeft,
        swap: true,
    };
    assert!(store.update_state(&rearm).unwrap());

    let current = store.find_active_by_id(rel.id).unwrap().unwrap();
    assert_eq!(current.left, b);
    assert_eq!(current.right, a);
    assert_eq!(current.state, FriendState::PendingLeft);
}

#[test]
fn test_update_missing_record_reports_not_applied() {
    let (mut store, _) = store_with_users(&[]);
    let update = StateUpdate {
        id: RelationshipId::new(404),
        expected: FriendState::Mutual,
        next: FriendState::LeftBlocksRight,
        swap: false,
    };
    assert!(!store.update_state(&update).unwrap());
}

#[test]
fn test_soft_deleted_records_are_invisible() {
    let (mut store, users) = store_with_users(&["Alice", "Bob"]);
    let (a, b) = (users[0].id, users[1].id);
    let rel = store.insert_relationship(a, b, FriendState::Mutual).unwrap();

    assert!(store.soft_delete_relationship(rel.id).unwrap());
    assert!(!store.soft_delete_relationship(rel.id).unwrap());

    assert!(store.find_active_by_pair(a, b).unwrap().is_none());
    assert!(store.find_active_by_id(rel.id).unwrap().is_none());
    assert!(store.list_active(a, ListKind::Friends).unwrap().is_empty());

    // The pair is free again once the old row is cleared
    let fresh = store.insert_relationship(b, a, FriendState::PendingLeft).unwrap();
    assert_ne!(fresh.id, rel.id);
}

#[test]
fn test_list_active_filters_and_orders_by_display_name() {
    let (mut store, users) = store_with_users(&["Me", "Zoe", "Adam", "Mia", "Ben"]);
    let me = users[0].id;
    let (zoe, adam, mia, ben) = (users[1].id, users[2].id, users[3].id, users[4].id);

    store.insert_relationship(me, zoe, FriendState::Mutual).unwrap();
    store.insert_relationship(adam, me, FriendState::Mutual).unwrap();
    store.insert_relationship(me, mia, FriendState::PendingLeft).unwrap();
    store.insert_relationship(ben, me, FriendState::PendingLeft).unwrap();

    let advisers = store.list_active(me, ListKind::Advisers).unwrap();
    let names: Vec<&str> = advisers.iter().map(|(_, u)| u.display_name.as_str()).collect();
    assert_eq!(names, vec!["Adam", "Zoe"]);

    let sent = store.list_active(me, ListKind::SentRequests).unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.id, mia);

    let received = store.list_active(me, ListKind::ReceivedRequests).unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].1.id, ben);
    assert_eq!(received[0].0.left, ben);
}

#[test]
fn test_file_backed_store_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kinship.db");
    let alice = User::new(UserId::new(), "alice@example.com", "Alice");
    let bob = User::new(UserId::new(), "bob@example.com", "Bob");

    let rel_id = {
        let mut store = SqliteStore::new(&path).unwrap();
        store.insert_user(&alice).unwrap();
        store.insert_user(&bob).unwrap();
        store.insert_relationship(alice.id, bob.id, FriendState::PendingLeft).unwrap().id
    };

    let store = SqliteStore::new(&path).unwrap();
    let rel = store.find_active_by_pair(bob.id, alice.id).unwrap().unwrap();
    assert_eq!(rel.id, rel_id);
    assert_eq!(rel.left, alice.id);
}
