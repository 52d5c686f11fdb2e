use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, ValidationError, users, util::normalize_text};

use super::{Engine, with_tx};

impl Engine {
    /// Create a user that can authenticate with `username:password`.
    pub async fn register_user(&self, username: &str, password: &str) -> ResultEngine<()> {
        let username = normalize_text(username, "username", 2, 50)?;
        if username.contains(':') || username.chars().any(char::is_whitespace) {
            return Err(ValidationError::field(
                "username",
                "must not contain ':' or whitespace",
            )
            .into());
        }
        let password_len = password.chars().count();
        if !(6..=64).contains(&password_len) {
            return Err(
                ValidationError::field("password", "must be 6 to 64 characters").into(),
            );
        }

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(password.to_string()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(%username, "registered user");
            Ok(())
        })
    }
}
