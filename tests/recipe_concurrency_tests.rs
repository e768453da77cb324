use recipe_api::{
    db,
    models::{AttrPayload, RecipePayload},
    test_utils::test_helpers,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

const WRITERS: usize = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_share_one_new_tag() {
    let dir = TempDir::new().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("recipes.db").display());
    let pool = db::create_pool(&database_url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let state = test_helpers::test_state(&pool, &dir.path().join("media"));
    let user_id = test_helpers::insert_test_user(&pool, "busy@example.com", "testpass123")
        .await
        .unwrap();

    let mut handles = Vec::with_capacity(WRITERS);
    for i in 0..WRITERS {
        let service = state.recipe_service.clone();
        handles.push(tokio::spawn(async move {
            let payload = RecipePayload {
                title: Some(format!("Recipe {}", i)),
                time_minutes: Some(10),
                price: Some(Decimal::new(250, 2)),
                tags: Some(vec![AttrPayload::new("Shared")]),
                ingredients: Some(vec![AttrPayload::new("Salt")]),
                ..Default::default()
            };
            service.create(user_id, payload).await
        }));
    }

    for handle in handles {
        let recipe = handle.await.unwrap().unwrap();
        assert_eq!(recipe.tags.len(), 1);
        assert_eq!(recipe.tags[0].name, "Shared");
    }

    assert_eq!(
        test_helpers::count_for_user(&pool, "tags", user_id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        test_helpers::count_for_user(&pool, "ingredients", user_id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        test_helpers::count_for_user(&pool, "recipes", user_id)
            .await
            .unwrap(),
        WRITERS as i64
    );

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_tags")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, WRITERS as i64);
    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_ingredients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, WRITERS as i64);
}
