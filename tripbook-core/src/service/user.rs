use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::password;
use crate::repository::{UserRecord, UserRepository};
use crate::user::{NewUser, User};
use crate::{CoreError, CoreResult};

/// Registration and lookup of users.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Registers a user.
    ///
    /// Invalid input is rejected before storage is touched. Returns `false`,
    /// leaving the existing record untouched, when the email is already taken.
    pub async fn create_user(&self, user: NewUser) -> CoreResult<bool> {
        let violations = user.validate();
        if !violations.is_empty() {
            warn!(email = %user.email, %violations, "Rejected invalid registration");
            return Err(CoreError::Validation(violations));
        }

        let hash = password::hash_password(&user.password)?;
        let record = UserRecord::new(user, hash);

        let created = self
            .repo
            .insert_user(&record)
            .await
            .map_err(CoreError::storage)?;

        if created {
            info!(email = %record.email, "User registered");
        } else {
            warn!(email = %record.email, "Email already registered");
        }
        Ok(created)
    }

    pub async fn get_user(&self, email: &str, with_purchases: bool) -> CoreResult<User> {
        debug!(email, with_purchases, "Fetching user");
        self.repo
            .find_user(email, with_purchases)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::not_found("User", email))
    }

    pub async fn get_all_users(&self, with_purchases: bool) -> CoreResult<Vec<User>> {
        self.repo
            .list_users(with_purchases)
            .await
            .map_err(CoreError::storage)
    }

    /// Deletes a user and all of its purchases. Returns how many purchases went with it.
    pub async fn delete_user(&self, email: &str) -> CoreResult<u64> {
        let removed = self
            .repo
            .delete_user(email)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::not_found("User", email))?;

        info!(email, purchases_removed = removed, "User deleted");
        Ok(removed)
    }

    /// True only for an enabled user whose password verifies.
    /// Unknown emails answer `false` like a wrong password does, and every
    /// path runs exactly one Argon2 verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<bool> {
        let user = match self
            .repo
            .find_user(email, false)
            .await
            .map_err(CoreError::storage)?
        {
            Some(user) => user,
            None => {
                password::verify_placeholder(password);
                return Ok(false);
            }
        };

        let verified = user.password_hash.verify(password);
        if !user.enabled {
            warn!(email, "Login attempt for disabled user");
            return Ok(false);
        }

        Ok(verified)
    }
}
