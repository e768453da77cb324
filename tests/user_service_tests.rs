use recipe_api::{
    models::AttrKind,
    repositories::{SqliteTokenRepository, SqliteUserRepository},
    services::{
        AuthService, AuthServiceError, CreateUserRequest, LoginRequest, UpdateProfileRequest,
        UserService, UserServiceError,
    },
    test_utils::test_helpers,
};
use std::sync::Arc;

fn create_request(email: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: String::new(),
    }
}

#[tokio::test]
async fn test_create_user_with_email_successful() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let user = service
        .create_user(create_request("test@example.com", "testpass123"))
        .await
        .unwrap();

    assert_eq!(user.email, "test@example.com");
    assert!(user.is_active);
    assert!(!user.is_staff);
    assert!(!user.is_superuser);
    assert!(service.check_password(&user, "testpass123"));
    assert!(!service.check_password(&user, "wrongpass"));
    assert_ne!(user.password_hash, "testpass123");
}

#[tokio::test]
async fn test_new_user_email_normalized() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let samples = [
        ("test1@EXAMPLE.com", "test1@example.com"),
        ("Test2@Example.com", "Test2@example.com"),
        ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
        ("test4@example.COM", "test4@example.com"),
    ];

    for (email, expected) in samples {
        let user = service
            .create_user(create_request(email, "sample123"))
            .await
            .unwrap();
        assert_eq!(user.email, expected);
    }
}

#[tokio::test]
async fn test_new_user_without_email_raises_error() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let result = service.create_user(create_request("", "test123")).await;
    assert!(matches!(result, Err(UserServiceError::EmptyEmail)));
}

#[tokio::test]
async fn test_create_superuser() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let user = service
        .create_superuser(create_request("test@example.com", "test123"))
        .await
        .unwrap();

    assert!(user.is_superuser);
    assert!(user.is_staff);
    assert_eq!(user.to_string(), "test@example.com");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    service
        .create_user(create_request("dup@example.com", "password123"))
        .await
        .unwrap();

    // Same address, different domain casing
    let result = service
        .create_user(create_request("dup@EXAMPLE.com", "password123"))
        .await;
    assert!(matches!(result, Err(UserServiceError::EmailTaken)));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let result = service.register(create_request("short@example.com", "pw")).await;
    assert!(matches!(result, Err(UserServiceError::WeakPassword)));

    let found = service.find_user_by_email("short@example.com").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_update_profile() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let user = service
        .create_user(create_request("old@example.com", "password123"))
        .await
        .unwrap();

    let updated = service
        .update_profile(UpdateProfileRequest {
            user_id: user.id,
            email: Some("New@EXAMPLE.com".to_string()),
            password: Some("newpassword".to_string()),
            name: Some("Updated Name".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(updated.email, "New@example.com");
    assert_eq!(updated.name, "Updated Name");
    assert!(service.check_password(&updated, "newpassword"));
    assert!(!service.check_password(&updated, "password123"));
}

#[tokio::test]
async fn test_update_profile_email_taken() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    service
        .create_user(create_request("user1@example.com", "password123"))
        .await
        .unwrap();
    let user2 = service
        .create_user(create_request("user2@example.com", "password123"))
        .await
        .unwrap();

    let result = service
        .update_profile(UpdateProfileRequest {
            user_id: user2.id,
            email: Some("user1@example.com".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(UserServiceError::EmailTaken)));
}

#[tokio::test]
async fn test_delete_user_cascades_to_owned_records() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let service = UserService::new(repository);

    let user = service
        .create_user(create_request("owner@example.com", "password123"))
        .await
        .unwrap();
    let recipe_id = test_helpers::create_test_recipe(&pool, user.id, "Steak and mushroom sauce")
        .await
        .unwrap();
    let tag_id = test_helpers::create_test_attr(&pool, AttrKind::Tag, user.id, "Vegan")
        .await
        .unwrap();
    test_helpers::link_test_attr(&pool, AttrKind::Tag, recipe_id, tag_id)
        .await
        .unwrap();
    test_helpers::create_test_attr(&pool, AttrKind::Ingredient, user.id, "Cucumber")
        .await
        .unwrap();

    service.delete_user(user.id).await.unwrap();

    for table in ["recipes", "tags", "ingredients"] {
        let count = test_helpers::count_for_user(&pool, table, user.id)
            .await
            .unwrap();
        assert_eq!(count, 0, "{} rows survived user deletion", table);
    }

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_tags")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, 0);

    let result = service.delete_user(user.id).await;
    assert!(matches!(result, Err(UserServiceError::UserNotFound)));
}

#[tokio::test]
async fn test_token_roundtrip() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let token_repository = Arc::new(SqliteTokenRepository::new(pool.clone()));
    let user_service = UserService::new(user_repository.clone());
    let auth_service = AuthService::new(user_repository, token_repository);

    let created = user_service
        .create_user(create_request("auth@example.com", "correctpassword"))
        .await
        .unwrap();

    let user = auth_service
        .authenticate(LoginRequest {
            email: "auth@example.com".to_string(),
            password: "correctpassword".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, created.id);

    let first = auth_service.issue_token(&user).await.unwrap();
    assert_eq!(first.len(), 40);
    assert_eq!(
        auth_service.authenticate_token(&first).await.unwrap().id,
        created.id
    );

    // A new login replaces the previous token
    let second = auth_service.issue_token(&user).await.unwrap();
    assert_ne!(first, second);
    assert!(matches!(
        auth_service.authenticate_token(&first).await,
        Err(AuthServiceError::InvalidToken)
    ));
    assert!(auth_service.authenticate_token(&second).await.is_ok());

    assert!(auth_service.revoke_token(created.id).await.unwrap());
    assert!(auth_service.authenticate_token(&second).await.is_err());
}

#[tokio::test]
async fn test_authenticate_wrong_password_or_inactive() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let token_repository = Arc::new(SqliteTokenRepository::new(pool.clone()));
    let user_service = UserService::new(user_repository.clone());
    let auth_service = AuthService::new(user_repository, token_repository);

    let user = user_service
        .create_user(create_request("wrongpass@example.com", "correctpassword"))
        .await
        .unwrap();

    let result = auth_service
        .authenticate(LoginRequest {
            email: "wrongpass@example.com".to_string(),
            password: "wrongpassword".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));

    user_service.set_active(user.id, false).await.unwrap();
    let result = auth_service
        .authenticate(LoginRequest {
            email: "wrongpass@example.com".to_string(),
            password: "correctpassword".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_deactivate_blocks_login_and_token() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let token_repository = Arc::new(SqliteTokenRepository::new(pool.clone()));
    let user_service = UserService::new(user_repository.clone());
    let auth_service = AuthService::new(user_repository, token_repository);

    let user = user_service
        .create_user(create_request("leaving@example.com", "correctpassword"))
        .await
        .unwrap();
    let token = auth_service.issue_token(&user).await.unwrap();

    auth_service.deactivate(user.id).await.unwrap();

    assert!(matches!(
        auth_service.authenticate_token(&token).await,
        Err(AuthServiceError::InvalidToken)
    ));
    let stored = user_service
        .find_user_by_email("leaving@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active);

    // Reactivating restores login but not the revoked token
    user_service.set_active(user.id, true).await.unwrap();
    let result = auth_service
        .authenticate(LoginRequest {
            email: "leaving@example.com".to_string(),
            password: "correctpassword".to_string(),
        })
        .await;
    assert!(result.is_ok());
    assert!(auth_service.authenticate_token(&token).await.is_err());
}

#[tokio::test]
async fn test_deleting_user_leaves_no_recipe_images() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let media = tempfile::TempDir::new().unwrap();
    let state = test_helpers::test_state(&pool, media.path());

    let user_id = test_helpers::insert_test_user(&pool, "owner@example.com", "testpass123")
        .await
        .unwrap();
    let other_id = test_helpers::insert_test_user(&pool, "other@example.com", "testpass123")
        .await
        .unwrap();
    let png: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    let mut stored = Vec::new();
    for title in ["Soup", "Stew"] {
        let recipe_id = test_helpers::create_test_recipe(&pool, user_id, title)
            .await
            .unwrap();
        let recipe = state
            .recipe_service
            .upload_image(recipe_id, user_id, png)
            .await
            .unwrap();
        stored.push(recipe.image.unwrap());
    }
    let other_recipe = test_helpers::create_test_recipe(&pool, other_id, "Salad")
        .await
        .unwrap();
    let kept = state
        .recipe_service
        .upload_image(other_recipe, other_id, png)
        .await
        .unwrap()
        .image
        .unwrap();

    let images = state.recipe_service.image_paths(user_id).await.unwrap();
    assert_eq!(images, stored);

    state.user_service.delete_user(user_id).await.unwrap();
    assert_eq!(state.recipe_service.remove_images(&images).await, 2);

    for path in &stored {
        assert!(!media.path().join(path).exists());
    }
    assert!(media.path().join(&kept).exists());
    assert_eq!(
        test_helpers::count_for_user(&pool, "recipes", user_id)
            .await
            .unwrap(),
        0
    );
}
