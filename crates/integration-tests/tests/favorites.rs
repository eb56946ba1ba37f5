//! Favorites in both modes.

#![allow(clippy::unwrap_used)]

use kotob_client::ClientError;
use kotob_client::storage::{MemoryStorage, Storage, keys};
use kotob_core::UserRole;
use kotob_integration_tests::{FakeBackend, sign_in};

#[tokio::test]
async fn test_guest_toggle_adds_then_removes() {
    let backend = FakeBackend::start().await;
    let book = backend.add_book("Toggle", 10, 5);
    let storage = MemoryStorage::shared();
    let client = backend.client_with_storage(storage.clone()).await;

    let outcome = client.favorites().toggle_favorite(&book.id).await.unwrap();
    assert!(outcome.is_added);
    assert!(client.favorites().is_favorited(&book.id));
    assert!(storage.get(keys::GUEST_FAVORITES).unwrap().is_some());

    let outcome = client.favorites().toggle_favorite(&book.id).await.unwrap();
    assert!(outcome.is_removed);
    assert!(!client.favorites().is_favorited(&book.id));
}

#[tokio::test]
async fn test_guest_add_twice_keeps_one_entry() {
    let backend = FakeBackend::start().await;
    let book = backend.add_book("Once", 10, 5);
    let client = backend.client().await;

    assert!(client.favorites().add_to_favorites(&book.id).await.unwrap());
    assert!(!client.favorites().add_to_favorites(&book.id).await.unwrap());
    assert_eq!(client.favorites().items().len(), 1);
}

#[tokio::test]
async fn test_guest_remove_missing_favorite() {
    let backend = FakeBackend::start().await;
    let book = backend.add_book("Absent", 10, 5);
    let client = backend.client().await;

    let err = client
        .favorites()
        .remove_from_favorites(&book.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotInFavorites(_)));
}

#[tokio::test]
async fn test_guest_favorites_survive_restart() {
    let backend = FakeBackend::start().await;
    let book = backend.add_book("Saved", 10, 5);
    let storage = MemoryStorage::shared();

    let first = backend.client_with_storage(storage.clone()).await;
    first.favorites().add_to_favorites(&book.id).await.unwrap();

    let second = backend.client_with_storage(storage).await;
    assert!(second.favorites().is_favorited(&book.id));
}

#[tokio::test]
async fn test_signed_in_toggle_updates_account() {
    let backend = FakeBackend::start().await;
    let book = backend.add_book("Remote", 10, 5);
    let user = backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let storage = MemoryStorage::shared();
    let client = backend.client_with_storage(storage.clone()).await;
    sign_in(&client, "reader@example.com", "secret123").await;
    client.favorites().merge_favorites_on_login().await.unwrap();

    let outcome = client.favorites().toggle_favorite(&book.id).await.unwrap();
    assert!(outcome.is_added);
    assert_eq!(backend.favorites_of(&user).len(), 1);
    assert!(client.favorites().is_favorited(&book.id));
    assert!(storage.get(keys::GUEST_FAVORITES).unwrap().is_none());

    let outcome = client.favorites().toggle_favorite(&book.id).await.unwrap();
    assert!(outcome.is_removed);
    assert!(backend.favorites_of(&user).is_empty());
    assert!(client.favorites().items().is_empty());
}

#[tokio::test]
async fn test_signed_in_clear() {
    let backend = FakeBackend::start().await;
    let first = backend.add_book("One", 10, 5);
    let second = backend.add_book("Two", 10, 5);
    let user = backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let client = backend.client().await;
    sign_in(&client, "reader@example.com", "secret123").await;
    client.favorites().merge_favorites_on_login().await.unwrap();
    client.favorites().add_to_favorites(&first.id).await.unwrap();
    client.favorites().add_to_favorites(&second.id).await.unwrap();

    client.favorites().clear_favorites().await.unwrap();

    assert!(backend.favorites_of(&user).is_empty());
    assert!(client.favorites().items().is_empty());
}
