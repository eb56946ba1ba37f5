//! Sign-in, sign-out and the fallback to guest mode on rejected credentials.

#![allow(clippy::unwrap_used)]

use kotob_client::ClientError;
use kotob_client::services::Mode;
use kotob_client::storage::{MemoryStorage, Storage, keys};
use kotob_client::validation::{LoginForm, RegisterForm};
use kotob_core::{Email, UserRole};
use kotob_integration_tests::{FakeBackend, sign_in};
use secrecy::SecretString;

#[tokio::test]
async fn test_login_persists_session_across_restart() {
    let backend = FakeBackend::start().await;
    backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let storage = MemoryStorage::shared();
    let client = backend.client_with_storage(storage.clone()).await;
    let mut users = client.auth().subscribe();

    let user = sign_in(&client, "reader@example.com", "secret123").await;
    assert!(client.auth().is_logged_in());
    assert!(!client.auth().is_admin());
    assert_eq!(users.borrow_and_update().as_ref(), Some(&user));
    assert!(storage.get(keys::TOKEN).unwrap().is_some());

    let restarted = backend.client_with_storage(storage).await;
    assert_eq!(restarted.auth().current_user(), Some(user));
    assert_eq!(restarted.cart().mode().await, Mode::Authenticated);
    assert_eq!(restarted.favorites().mode().await, Mode::Authenticated);
}

#[tokio::test]
async fn test_logout_clears_session_immediately() {
    let backend = FakeBackend::start().await;
    backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let storage = MemoryStorage::shared();
    let client = backend.client_with_storage(storage.clone()).await;
    sign_in(&client, "reader@example.com", "secret123").await;
    let users = client.auth().subscribe();

    client.auth().logout().unwrap();

    assert!(!client.auth().is_logged_in());
    assert!(client.auth().current_user().is_none());
    assert!(users.borrow().is_none());
    assert!(storage.get(keys::TOKEN).unwrap().is_none());
    assert!(storage.get(keys::CURRENT_USER).unwrap().is_none());
}

#[tokio::test]
async fn test_rejected_login_carries_backend_message() {
    let backend = FakeBackend::start().await;
    backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let client = backend.client().await;

    let credentials = LoginForm {
        email: "reader@example.com".to_string(),
        password: "wrong1234".to_string(),
    }
    .validate()
    .unwrap();
    let err = client.auth().login(&credentials).await.unwrap_err();

    assert_eq!(err.user_message(), "البريد الإلكتروني أو كلمة المرور غير صحيحة");
    assert!(!client.auth().is_logged_in());
}

#[tokio::test]
async fn test_register_signs_in() {
    let backend = FakeBackend::start().await;
    let client = backend.client().await;

    let registration = RegisterForm {
        name: "Mona Adel".to_string(),
        email: "mona@example.com".to_string(),
        password: "secret123".to_string(),
        confirm_password: "secret123".to_string(),
        phone: "+201012345678".to_string(),
        address: "12 Nile St".to_string(),
        age: Some(24),
    }
    .validate()
    .unwrap();
    let user = client.auth().register(&registration).await.unwrap();

    assert_eq!(user.name, "Mona Adel");
    assert!(client.auth().is_logged_in());

    let err = client.auth().register(&registration).await.unwrap_err();
    assert_eq!(err.user_message(), "البريد الإلكتروني مستخدم بالفعل");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let backend = FakeBackend::start().await;
    backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let client = backend.client().await;

    let email = Email::parse("reader@example.com").unwrap();
    let message = client.auth().forgot_password(&email).await.unwrap();
    assert!(message.is_some());

    let token = backend.last_reset_token().unwrap();
    client
        .auth()
        .reset_password(&token, &SecretString::from("newpass99"))
        .await
        .unwrap();

    sign_in(&client, "reader@example.com", "newpass99").await;
    assert!(client.auth().is_logged_in());
}

// =============================================================================
// 401 fallback
// =============================================================================

#[tokio::test]
async fn test_rejected_token_falls_back_to_guest_cart() {
    let backend = FakeBackend::start().await;
    let book = backend.add_book("Fallback", 40, 5);
    backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let storage = MemoryStorage::shared();
    let client = backend.client_with_storage(storage.clone()).await;
    sign_in(&client, "reader@example.com", "secret123").await;
    client.cart().merge_cart_on_login().await.unwrap();
    assert_eq!(client.cart().mode().await, Mode::Authenticated);

    backend.reject_tokens();
    let items = client.cart().add_to_cart(&book.id, 1).await.unwrap();

    assert_eq!(client.cart().mode().await, Mode::Guest);
    assert!(!client.auth().is_logged_in());
    assert_eq!(items.len(), 1);
    assert!(storage.get(keys::GUEST_CART).unwrap().is_some());
    assert!(storage.get(keys::TOKEN).unwrap().is_none());
}

#[tokio::test]
async fn test_rejected_token_on_startup_loads_guest_state() {
    let backend = FakeBackend::start().await;
    backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let storage = MemoryStorage::shared();
    let client = backend.client_with_storage(storage.clone()).await;
    sign_in(&client, "reader@example.com", "secret123").await;

    backend.reject_tokens();
    let restarted = backend.client_with_storage(storage).await;

    assert_eq!(restarted.cart().mode().await, Mode::Guest);
    assert_eq!(restarted.favorites().mode().await, Mode::Guest);
    assert!(!restarted.auth().is_logged_in());
}

#[tokio::test]
async fn test_other_backend_errors_are_not_swallowed() {
    let backend = FakeBackend::start().await;
    let book = backend.add_book("Few", 10, 1);
    backend.add_user("reader@example.com", "secret123", UserRole::Customer);
    let client = backend.client().await;
    sign_in(&client, "reader@example.com", "secret123").await;
    client.cart().merge_cart_on_login().await.unwrap();

    let err = client.cart().add_to_cart(&book.id, 2).await.unwrap_err();

    assert!(matches!(err, ClientError::Request { .. }));
    assert_eq!(err.user_message(), "الكمية المطلوبة غير متوفرة في المخزون");
    assert_eq!(client.cart().mode().await, Mode::Authenticated);
}
