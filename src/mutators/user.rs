// ABOUTME: User registration and password login
// ABOUTME: The password pair is checked by validation, so a mismatch never reaches storage

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde_json::Value;

use crate::crypto::{hash_password, verify_password};
use crate::entities::user;
use crate::error::{AppError, Result};
use crate::schema::{LoginInput, RegisterInput};
use crate::utils::new_record_id;
use crate::validation::validate;

pub struct UserMutator<'a, C> {
    db: &'a C,
}

impl<'a, C> UserMutator<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &Value) -> Result<user::Model> {
        let input: RegisterInput = validate(input)?;

        if self.find_by_email(&input.email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = hash_password(&input.password)?;
        let now = chrono::Utc::now().timestamp();

        let model = user::ActiveModel {
            id: Set(new_record_id()),
            email: Set(input.email),
            name: Set(input.name),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .map_err(|e| match e.sql_err() {
            // A concurrent registration won between the lookup and the insert
            Some(SqlErr::UniqueConstraintViolation(_)) => email_taken(),
            _ => AppError::from(e),
        })?;

        tracing::info!(user_id = %model.id, "Registered user");
        Ok(model)
    }

    /// Same error for an unknown email and a wrong password.
    pub async fn authenticate(&self, input: &Value) -> Result<user::Model> {
        let input: LoginInput = validate(input)?;

        let user = self
            .find_by_email(&input.email)
            .await?
            .filter(|user| verify_password(&input.password, &user.password_hash))
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<user::Model> {
        user::Entity::find_by_id(id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?;

        Ok(found)
    }
}

fn email_taken() -> AppError {
    AppError::Conflict("Email is already registered".to_string())
}
