use crate::error::{AppError, Result};
use crate::models::{AttrKind, AttrListQuery, RecipeAttr, UpdateAttrRequest};
use crate::repositories::RecipeAttrRepository;
use std::sync::Arc;

pub const MAX_ATTR_NAME_LENGTH: usize = 255;

/// Trims and checks a tag/ingredient name, returning the stored form.
pub fn validate_attr_name(kind: AttrKind, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!(
            "{} name: This field may not be blank.",
            kind.label()
        )));
    }
    if name.chars().count() > MAX_ATTR_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "{} name: Ensure this field has no more than {} characters.",
            kind.label(),
            MAX_ATTR_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

/// List, rename and delete for tags and ingredients. Creation only
/// happens through recipe writes.
pub struct RecipeAttrService {
    repository: Arc<dyn RecipeAttrRepository>,
}

impl RecipeAttrService {
    pub fn new(repository: Arc<dyn RecipeAttrRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(
        &self,
        kind: AttrKind,
        user_id: i64,
        query: &AttrListQuery,
    ) -> Result<Vec<RecipeAttr>> {
        self.repository
            .list_by_user(kind, user_id, query.assigned_only())
            .await
    }

    /// PUT requires `name`; PATCH may omit it and leaves the record as is.
    pub async fn update(
        &self,
        kind: AttrKind,
        id: i64,
        user_id: i64,
        request: UpdateAttrRequest,
        partial: bool,
    ) -> Result<RecipeAttr> {
        let existing = self
            .repository
            .get_by_id(kind, id, user_id)
            .await?
            .ok_or(AppError::NotFound(kind.label()))?;

        let name = match request.name {
            Some(name) => validate_attr_name(kind, &name)?,
            None if partial => return Ok(existing),
            None => {
                return Err(AppError::Validation(
                    "name: This field is required.".to_string(),
                ))
            }
        };

        if name == existing.name {
            return Ok(existing);
        }

        if !self
            .repository
            .rename(kind, id, user_id, name.clone())
            .await?
        {
            return Err(AppError::NotFound(kind.label()));
        }

        tracing::debug!("Renamed {} {} for user {}", kind.label(), id, user_id);
        Ok(RecipeAttr {
            id,
            user_id,
            name,
        })
    }

    pub async fn delete(&self, kind: AttrKind, id: i64, user_id: i64) -> Result<()> {
        if !self.repository.delete(kind, id, user_id).await? {
            return Err(AppError::NotFound(kind.label()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::recipe_attr_repository::MockRecipeAttrRepository;
    use mockall::predicate::*;

    fn attr(id: i64, name: &str) -> RecipeAttr {
        RecipeAttr {
            id,
            user_id: 1,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_validate_attr_name() {
        assert_eq!(
            validate_attr_name(AttrKind::Tag, "  Vegan ").unwrap(),
            "Vegan"
        );
        assert!(validate_attr_name(AttrKind::Tag, "   ").is_err());
        assert!(validate_attr_name(AttrKind::Ingredient, &"x".repeat(256)).is_err());
    }

    #[tokio::test]
    async fn test_update_other_users_record_is_not_found() {
        let mut mock_repo = MockRecipeAttrRepository::new();
        mock_repo
            .expect_get_by_id()
            .with(eq(AttrKind::Tag), eq(5), eq(2))
            .times(1)
            .returning(|_, _, _| Box::pin(async move { Ok(None) }));

        let service = RecipeAttrService::new(Arc::new(mock_repo));
        let request = UpdateAttrRequest {
            name: Some("Dessert".to_string()),
        };

        let result = service.update(AttrKind::Tag, 5, 2, request, true).await;
        assert!(matches!(result, Err(AppError::NotFound("Tag"))));
    }

    #[tokio::test]
    async fn test_put_requires_name() {
        let mut mock_repo = MockRecipeAttrRepository::new();
        mock_repo
            .expect_get_by_id()
            .times(1)
            .returning(|_, _, _| Box::pin(async move { Ok(Some(attr(1, "Kale"))) }));

        let service = RecipeAttrService::new(Arc::new(mock_repo));
        let result = service
            .update(
                AttrKind::Ingredient,
                1,
                1,
                UpdateAttrRequest::default(),
                false,
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rename() {
        let mut mock_repo = MockRecipeAttrRepository::new();
        mock_repo
            .expect_get_by_id()
            .times(1)
            .returning(|_, _, _| Box::pin(async move { Ok(Some(attr(1, "colatro"))) }));
        mock_repo
            .expect_rename()
            .with(eq(AttrKind::Ingredient), eq(1), eq(1), eq("coriander".to_string()))
            .times(1)
            .returning(|_, _, _, _| Box::pin(async move { Ok(true) }));

        let service = RecipeAttrService::new(Arc::new(mock_repo));
        let updated = service
            .update(
                AttrKind::Ingredient,
                1,
                1,
                UpdateAttrRequest {
                    name: Some("coriander".to_string()),
                },
                true,
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "coriander");
    }
}
