use crate::error::{AppError, Result};
use crate::models::recipe::{PRICE_INTEGER_DIGITS, PRICE_SCALE};
use crate::models::{
    AttrKind, AttrPayload, NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeListQuery,
    RecipePayload,
};
use crate::repositories::RecipeRepository;
use crate::services::media_service::{MediaError, MediaStorage};
use crate::services::recipe_attr_service::validate_attr_name;
use rust_decimal::Decimal;
use std::sync::Arc;

const MAX_TITLE_LENGTH: usize = 255;
const MAX_LINK_LENGTH: usize = 255;

/// How much of a recipe a write must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// PUT: title, time_minutes and price are required.
    Full,
    /// PATCH: every field is optional.
    Partial,
}

pub struct RecipeService {
    repository: Arc<dyn RecipeRepository>,
    media: MediaStorage,
}

impl RecipeService {
    pub fn new(repository: Arc<dyn RecipeRepository>, media: MediaStorage) -> Self {
        Self { repository, media }
    }

    pub async fn list(&self, user_id: i64, query: &RecipeListQuery) -> Result<Vec<Recipe>> {
        let filter = RecipeFilter {
            tag_ids: query.tag_ids().map_err(AppError::Validation)?,
            ingredient_ids: query.ingredient_ids().map_err(AppError::Validation)?,
        };
        self.repository.list_by_user(user_id, filter).await
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<Recipe> {
        self.repository
            .get_by_id(id, user_id)
            .await?
            .ok_or(AppError::NotFound("Recipe"))
    }

    /// Creates a recipe owned by `user_id`, getting or creating each nested
    /// tag and ingredient for that user.
    pub async fn create(&self, user_id: i64, payload: RecipePayload) -> Result<Recipe> {
        let new_recipe = NewRecipe {
            title: validate_title(require(payload.title, "title")?)?,
            time_minutes: require(payload.time_minutes, "time_minutes")?,
            price: validate_price(require(payload.price, "price")?)?,
            link: validate_link(payload.link.unwrap_or_default())?,
            description: payload.description.unwrap_or_default(),
            tags: validate_names(AttrKind::Tag, payload.tags)?.unwrap_or_default(),
            ingredients: validate_names(AttrKind::Ingredient, payload.ingredients)?
                .unwrap_or_default(),
        };

        let recipe = self.repository.create(user_id, new_recipe).await?;
        tracing::info!("User {} created recipe {}", user_id, recipe.id);
        Ok(recipe)
    }

    /// Updates a recipe. A `tags`/`ingredients` field that is present (even
    /// empty) replaces the existing links; an absent one leaves them alone.
    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        payload: RecipePayload,
        mode: WriteMode,
    ) -> Result<Recipe> {
        if mode == WriteMode::Full {
            if payload.title.is_none() {
                return Err(required("title"));
            }
            if payload.time_minutes.is_none() {
                return Err(required("time_minutes"));
            }
            if payload.price.is_none() {
                return Err(required("price"));
            }
        }

        let changes = RecipeChanges {
            title: payload.title.map(validate_title).transpose()?,
            time_minutes: payload.time_minutes,
            price: payload.price.map(validate_price).transpose()?,
            link: payload.link.map(validate_link).transpose()?,
            description: payload.description,
            tags: validate_names(AttrKind::Tag, payload.tags)?,
            ingredients: validate_names(AttrKind::Ingredient, payload.ingredients)?,
        };

        self.repository
            .update(id, user_id, changes)
            .await?
            .ok_or(AppError::NotFound("Recipe"))
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<()> {
        let recipe = self.get(id, user_id).await?;

        if !self.repository.delete(id, user_id).await? {
            return Err(AppError::NotFound("Recipe"));
        }

        if let Some(image) = recipe.image {
            if let Err(e) = self.media.remove(&image).await {
                tracing::warn!("Failed to remove image {} of recipe {}: {}", image, id, e);
            }
        }

        Ok(())
    }

    /// Stores `bytes` as the recipe's image, replacing any previous one.
    pub async fn upload_image(&self, id: i64, user_id: i64, bytes: &[u8]) -> Result<Recipe> {
        let recipe = self.get(id, user_id).await?;

        let path = self
            .media
            .save_recipe_image(bytes)
            .await
            .map_err(|e| match e {
                MediaError::Io(io_err) => {
                    tracing::error!("Failed to store recipe image: {}", io_err);
                    AppError::InternalError
                }
                other => AppError::Validation(format!("image: {}", other)),
            })?;

        if !self
            .repository
            .set_image(id, user_id, Some(path.clone()))
            .await?
        {
            self.media.remove(&path).await.ok();
            return Err(AppError::NotFound("Recipe"));
        }

        if let Some(previous) = recipe.image {
            if let Err(e) = self.media.remove(&previous).await {
                tracing::warn!("Failed to remove replaced image {}: {}", previous, e);
            }
        }

        self.get(id, user_id).await
    }

    /// Image paths of every recipe the user owns. Recipe rows cascade with
    /// their owner, so collect these before deleting the user.
    pub async fn image_paths(&self, user_id: i64) -> Result<Vec<String>> {
        self.repository.list_images_by_user(user_id).await
    }

    /// Removes stored images and returns how many were removed.
    pub async fn remove_images(&self, paths: &[String]) -> usize {
        let mut removed = 0;
        for path in paths {
            match self.media.remove(path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove image {}: {}", path, e),
            }
        }
        removed
    }
}

fn required(field: &str) -> AppError {
    AppError::Validation(format!("{}: This field is required.", field))
}

fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| required(field))
}

fn validate_title(title: String) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation(
            "title: This field may not be blank.".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "title: Ensure this field has no more than {} characters.",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

fn validate_link(link: String) -> Result<String> {
    let link = link.trim();
    if link.chars().count() > MAX_LINK_LENGTH {
        return Err(AppError::Validation(format!(
            "link: Ensure this field has no more than {} characters.",
            MAX_LINK_LENGTH
        )));
    }
    Ok(link.to_string())
}

fn validate_price(price: Decimal) -> Result<Decimal> {
    if price.normalize().scale() > PRICE_SCALE {
        return Err(AppError::Validation(format!(
            "price: Ensure that there are no more than {} decimal places.",
            PRICE_SCALE
        )));
    }
    if price.abs().trunc() >= Decimal::from(10i64.pow(PRICE_INTEGER_DIGITS)) {
        return Err(AppError::Validation(format!(
            "price: Ensure that there are no more than {} digits before the decimal point.",
            PRICE_INTEGER_DIGITS
        )));
    }
    Ok(price)
}

/// Validates nested names and drops repeats, keeping first-seen order.
fn validate_names(
    kind: AttrKind,
    payload: Option<Vec<AttrPayload>>,
) -> Result<Option<Vec<String>>> {
    let Some(items) = payload else {
        return Ok(None);
    };

    let mut names: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let name = validate_attr_name(kind, &item.name)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(Some(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::recipe_repository::MockRecipeRepository;
    use mockall::predicate::*;
    use std::str::FromStr;

    fn service(mock_repo: MockRecipeRepository) -> RecipeService {
        RecipeService::new(Arc::new(mock_repo), MediaStorage::new("unused-media-root"))
    }

    fn recipe_from(user_id: i64, new_recipe: &NewRecipe) -> Recipe {
        Recipe {
            id: 1,
            user_id,
            title: new_recipe.title.clone(),
            time_minutes: new_recipe.time_minutes,
            price: new_recipe.price,
            link: new_recipe.link.clone(),
            description: new_recipe.description.clone(),
            image: None,
            tags: vec![],
            ingredients: vec![],
        }
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::from_str("5.50").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("5.500").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("999.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("5.555").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("1000").unwrap()).is_err());
    }

    #[test]
    fn test_validate_names_dedupes() {
        let names = validate_names(
            AttrKind::Tag,
            Some(vec![
                AttrPayload::new("Thai"),
                AttrPayload::new(" Thai "),
                AttrPayload::new("Dinner"),
            ]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(names, vec!["Thai".to_string(), "Dinner".to_string()]);

        assert_eq!(validate_names(AttrKind::Tag, None).unwrap(), None);
        assert_eq!(
            validate_names(AttrKind::Tag, Some(vec![])).unwrap(),
            Some(vec![])
        );
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let svc = service(MockRecipeRepository::new());
        let payload = RecipePayload {
            time_minutes: Some(5),
            price: Some(Decimal::from_str("1.00").unwrap()),
            ..Default::default()
        };

        let result = svc.create(1, payload).await;
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.starts_with("title")));
    }

    #[tokio::test]
    async fn test_create_passes_validated_names() {
        let mut mock_repo = MockRecipeRepository::new();
        mock_repo
            .expect_create()
            .withf(|user_id, recipe| {
                *user_id == 3
                    && recipe.tags == vec!["Thai".to_string()]
                    && recipe.ingredients.is_empty()
                    && recipe.link.is_empty()
            })
            .times(1)
            .returning(|user_id, recipe| {
                let created = recipe_from(user_id, &recipe);
                Box::pin(async move { Ok(created) })
            });

        let svc = service(mock_repo);
        let payload = RecipePayload {
            title: Some("Thai Prawn Curry".to_string()),
            time_minutes: Some(30),
            price: Some(Decimal::from_str("2.50").unwrap()),
            tags: Some(vec![AttrPayload::new("Thai"), AttrPayload::new("Thai")]),
            ..Default::default()
        };

        let recipe = svc.create(3, payload).await.unwrap();
        assert_eq!(recipe.title, "Thai Prawn Curry");
        assert_eq!(recipe.user_id, 3);
    }

    #[tokio::test]
    async fn test_full_update_requires_price() {
        let svc = service(MockRecipeRepository::new());
        let payload = RecipePayload {
            title: Some("New".to_string()),
            time_minutes: Some(5),
            ..Default::default()
        };

        let result = svc.update(1, 1, payload, WriteMode::Full).await;
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.starts_with("price")));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_omitted_links() {
        let mut mock_repo = MockRecipeRepository::new();
        mock_repo
            .expect_update()
            .with(
                eq(9),
                eq(1),
                eq(RecipeChanges {
                    title: Some("Renamed".to_string()),
                    ingredients: Some(vec![]),
                    ..Default::default()
                }),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async move { Ok(None) }));

        let svc = service(mock_repo);
        let payload = RecipePayload {
            title: Some("Renamed".to_string()),
            ingredients: Some(vec![]),
            ..Default::default()
        };

        let result = svc.update(9, 1, payload, WriteMode::Partial).await;
        assert!(matches!(result, Err(AppError::NotFound("Recipe"))));
    }

    #[tokio::test]
    async fn test_remove_user_images() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(dir.path());
        let stored = media
            .save_recipe_image(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR")
            .await
            .unwrap();

        let mut mock_repo = MockRecipeRepository::new();
        let listed = stored.clone();
        mock_repo
            .expect_list_images_by_user()
            .with(eq(4))
            .times(1)
            .returning(move |_| {
                let images = vec![listed.clone()];
                Box::pin(async move { Ok(images) })
            });

        let svc = RecipeService::new(Arc::new(mock_repo), media);
        let paths = svc.image_paths(4).await.unwrap();
        assert_eq!(paths, vec![stored.clone()]);

        assert_eq!(svc.remove_images(&paths).await, 1);
        assert!(!dir.path().join(&stored).exists());
    }
}
