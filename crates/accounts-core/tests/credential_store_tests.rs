//! Tests for the credential store
//! These tests serve as both verification and developer examples

use accounts_core::{
    AccountsConfig, CreateUserRequest, Error, PasswordConfig, Role, SessionAuthority,
    UpdateProfileRequest,
};
use tempfile::TempDir;

/// Helper to create a service on a throwaway database
async fn create_test_service() -> (SessionAuthority, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let config = AccountsConfig {
        database_url: db_url,
        password: PasswordConfig::fast_for_tests(),
        ..Default::default()
    };

    let service = accounts_core::init(config).await.expect("Failed to create test database");
    (service, temp_dir)
}

fn request(email: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        first_name: "Alice".to_string(),
        last_name: "Smith".to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role: None,
    }
}

#[tokio::test]
async fn test_create_user() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    let user = credentials.create(request("Alice@Example.com ", "abcdef")).await.unwrap();

    assert!(user.id.starts_with("user_"));
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, Role::Customer);
    assert!(user.active);
    assert!(user.refresh_token_hash.is_none());
    assert_ne!(user.password_hash.as_str(), "abcdef");
}

#[tokio::test]
async fn test_duplicate_email_error() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    credentials.create(request("bob@example.com", "abcdef")).await.unwrap();

    // Same email, different everything else, different case
    let mut second = request("BOB@example.com", "zyxwvu");
    second.first_name = "Robert".to_string();
    second.role = Some(Role::Seller);

    match credentials.create(second).await {
        Err(Error::UserAlreadyExists(email)) => assert_eq!(email, "bob@example.com"),
        other => panic!("Expected UserAlreadyExists error, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn test_duplicate_email_reported_before_field_errors() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    credentials.create(request("bob@example.com", "abcdef")).await.unwrap();

    let mut second = request("bob@example.com", "abc");
    second.first_name = "A".to_string();

    match credentials.create(second).await {
        Err(Error::UserAlreadyExists(email)) => assert_eq!(email, "bob@example.com"),
        other => panic!("Expected UserAlreadyExists error, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn test_find_by_email_and_id() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    let user = credentials.create(request("carol@example.com", "abcdef")).await.unwrap();

    let by_email = credentials.find_by_email("CAROL@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    let by_id = credentials.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "carol@example.com");

    assert!(credentials.find_by_email("nobody@example.com").await.unwrap().is_none());
    assert!(credentials.find_by_id("user_missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_verify_secret() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    let user = credentials.create(request("dave@example.com", "correct-horse")).await.unwrap();

    assert!(credentials.verify_secret(Some(&user), "correct-horse").await.unwrap());
    assert!(!credentials.verify_secret(Some(&user), "wrong-horse").await.unwrap());
    assert!(!credentials.verify_secret(None, "correct-horse").await.unwrap());
}

#[tokio::test]
async fn test_validation_failures() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    let mut bad = request("not-an-email", "abc");
    bad.first_name = "A".to_string();

    match credentials.create(bad).await {
        Err(Error::Validation(fields)) => {
            assert!(fields.iter().any(|f| f.field == "email"));
            assert!(fields.iter().any(|f| f.field == "firstName"));
            assert!(fields.iter().any(|f| f.message.contains("First name")));
        }
        other => panic!("Expected Validation error, got {:?}", other.map(|u| u.id)),
    }

    match credentials.create(request("eve@example.com", "abc")).await {
        Err(Error::Validation(fields)) => assert_eq!(fields[0].field, "password"),
        other => panic!("Expected Validation error, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn test_change_secret_keeps_refresh_token() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    let user = credentials.create(request("frank@example.com", "abcdef")).await.unwrap();
    let login = service.login("frank@example.com", "abcdef").await.unwrap();

    credentials.change_secret(&user.id, "ghijkl").await.unwrap();

    let reloaded = credentials.find_by_id(&user.id).await.unwrap().unwrap();
    assert!(credentials.verify_secret(Some(&reloaded), "ghijkl").await.unwrap());
    assert!(!credentials.verify_secret(Some(&reloaded), "abcdef").await.unwrap());
    assert!(reloaded.refresh_token_hash.is_some());

    // Refresh still works after a password change
    assert!(service.refresh(Some(&login.refresh_token)).await.is_ok());

    assert!(matches!(
        credentials.change_secret("user_missing", "ghijkl").await,
        Err(Error::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_set_refresh_token_hash_overwrites() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    let user = credentials.create(request("gina@example.com", "abcdef")).await.unwrap();

    let first = credentials.hash_token("token-one").await.unwrap();
    let second = credentials.hash_token("token-two").await.unwrap();

    assert!(credentials.set_refresh_token_hash(&user.id, Some(&first)).await.unwrap());
    assert!(credentials.set_refresh_token_hash(&user.id, Some(&second)).await.unwrap());

    let stored = credentials.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token_hash.as_ref(), Some(&second));

    assert!(credentials.set_refresh_token_hash(&user.id, None).await.unwrap());
    let cleared = credentials.find_by_id(&user.id).await.unwrap().unwrap();
    assert!(cleared.refresh_token_hash.is_none());

    assert!(!credentials.set_refresh_token_hash("user_missing", None).await.unwrap());
}

#[tokio::test]
async fn test_update_profile() {
    let (service, _temp_dir) = create_test_service().await;
    let credentials = service.credentials();

    let user = credentials.create(request("hank@example.com", "abcdef")).await.unwrap();

    let updated = credentials
        .update_profile(
            &user.id,
            UpdateProfileRequest {
                first_name: Some("Henry".to_string()),
                last_name: Some("".to_string()),
                phone_number: Some("555-0100".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.first_name, "Henry");
    assert_eq!(updated.last_name, "Smith");
    assert_eq!(updated.phone_number.as_deref(), Some("555-0100"));
    assert!(updated.updated_at >= user.updated_at);

    assert!(matches!(
        credentials
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    first_name: Some("H".to_string()),
                    ..Default::default()
                },
            )
            .await,
        Err(Error::Validation(_))
    ));

    assert!(matches!(
        credentials.update_profile("user_missing", UpdateProfileRequest::default()).await,
        Err(Error::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_serialized_user_hides_secrets() {
    let (service, _temp_dir) = create_test_service().await;
    let user = service.credentials().create(request("ivy@example.com", "abcdef")).await.unwrap();

    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["userId"], user.id.as_str());
    assert_eq!(json["email"], "ivy@example.com");
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("refreshTokenHash").is_none());
}
