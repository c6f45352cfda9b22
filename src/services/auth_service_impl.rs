//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User};
use crate::domain::FieldErrors;
use crate::services::auth_service::{
    AuthError, AuthService, AuthUser, ProfileUpdate, Registration, UserInfo,
};
use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use tracing::info;

const MAX_NAME_LENGTH: usize = 255;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn check_password(&self, password: &str, errors: &mut FieldErrors) {
        if password.is_empty() {
            errors.add("password", "This field may not be blank.");
        } else if password.chars().count() < self.security.min_password_length {
            errors.add(
                "password",
                format!(
                    "Ensure this field has at least {} characters.",
                    self.security.min_password_length
                ),
            );
        }
    }
}

fn check_name(name: &str, errors: &mut FieldErrors) {
    if name.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        );
    }
}

fn user_info(user: User) -> UserInfo {
    UserInfo {
        email: user.email,
        name: user.name,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<UserInfo, AuthError> {
        let mut errors = FieldErrors::new();

        let email = registration.email.trim();
        if email.is_empty() {
            errors.add("email", "This field may not be blank.");
        } else if !email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }
        self.check_password(&registration.password, &mut errors);
        check_name(&registration.name, &mut errors);
        errors.into_result()?;

        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        // A concurrent registration can still win the insert.
        let user = match self
            .store
            .create_user(
                NewUser::regular(email, &registration.password, registration.name.trim()),
                &self.security,
            )
            .await
        {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, "Account created");
        Ok(user_info(user))
    }

    async fn issue_token(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let mut errors = FieldErrors::new();
        if email.trim().is_empty() {
            errors.add("email", "This field may not be blank.");
        }
        if password.is_empty() {
            errors.add("password", "This field may not be blank.");
        }
        errors.into_result()?;

        let user = self
            .store
            .verify_user_password(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(user.api_key)
    }

    async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthorized);
        }

        let user = self
            .store
            .verify_api_key(token)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            name: user.name,
            is_staff: user.is_staff,
        })
    }

    async fn get_user_info(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user_info(user))
    }

    async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<UserInfo, AuthError> {
        let mut errors = FieldErrors::new();
        if let Some(password) = &update.password {
            self.check_password(password, &mut errors);
        }
        if let Some(name) = &update.name {
            check_name(name, &mut errors);
        }
        errors.into_result()?;

        let user = self
            .store
            .update_user_profile(
                user_id,
                update.name.as_deref().map(str::trim),
                update.password.as_deref(),
                &self.security,
            )
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if update.password.is_some() {
            info!(user_id, "Password changed");
        }

        Ok(user_info(user))
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<DbErr>().and_then(DbErr::sql_err),
            Some(SqlErr::UniqueConstraintViolation(_))
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_service() -> (SeaOrmAuthService, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("pantry-auth-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display())).await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        (SeaOrmAuthService::new(store, security), path)
    }

    #[tokio::test]
    async fn duplicate_insert_is_reported_as_email_taken() {
        let (service, path) = test_service().await;

        let first = service
            .store
            .create_user(NewUser::regular("cook@example.com", "testpass123", ""), &service.security)
            .await;
        assert!(first.is_ok());

        // Straight to the store, as a racing registration would be.
        let err = service
            .store
            .create_user(NewUser::regular("cook@EXAMPLE.com", "testpass123", ""), &service.security)
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));

        let other = anyhow::anyhow!("disk full");
        assert!(!is_unique_violation(&other));

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn concurrent_registrations_yield_one_account() {
        let (service, path) = test_service().await;
        let service = std::sync::Arc::new(service);

        let attempts: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .register(Registration {
                            email: "race@example.com".to_string(),
                            password: "testpass123".to_string(),
                            name: String::new(),
                        })
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => created += 1,
                Err(AuthError::EmailTaken) => {}
                Err(other) => panic!("unexpected registration error: {other:?}"),
            }
        }
        assert_eq!(created, 1);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn long_names_are_rejected() {
        let mut errors = FieldErrors::new();
        check_name(&"x".repeat(MAX_NAME_LENGTH + 1), &mut errors);
        assert!(errors.get("name").is_some());

        let mut errors = FieldErrors::new();
        check_name("Chef", &mut errors);
        assert!(errors.is_empty());
    }
}
