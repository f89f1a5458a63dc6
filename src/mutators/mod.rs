// ABOUTME: Validated write paths for every entity, each built over an explicit connection
// ABOUTME: Input is validated before any storage call; failures propagate unchanged

pub mod container;
pub mod history;
pub mod image;
pub mod image_metadata;
pub mod item;
pub mod label;
pub mod user;

pub use container::ContainerMutator;
pub use image::ImageMutator;
pub use image_metadata::ImageMetadataMutator;
pub use item::{ItemFilters, ItemMutator};
pub use label::LabelMutator;
pub use user::UserMutator;

use sea_orm::sea_query::LikeExpr;

use crate::error::{AppError, Result};

const LIKE_ESCAPE: char = '\\';

/// Owner-scoped writes need an acting user before anything else happens.
pub(crate) fn require_user(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::Precondition("User ID is required".to_string()));
    }
    Ok(())
}

/// `LIKE` pattern matching `query` anywhere, with its own wildcards escaped.
pub(crate) fn contains_pattern(query: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape(LIKE_ESCAPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_user_rejects_blank_ids() {
        assert!(matches!(require_user(""), Err(AppError::Precondition(_))));
        assert!(matches!(require_user("  "), Err(AppError::Precondition(_))));
        assert!(require_user("user123456789ab").is_ok());
    }
}
