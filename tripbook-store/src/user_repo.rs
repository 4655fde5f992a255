use async_trait::async_trait;
use sqlx::PgPool;
use tripbook_core::password::HashedPassword;
use tripbook_core::repository::{RepoResult, UserRecord, UserRepository};
use tripbook_core::user::{Purchases, User};

use crate::purchase_repo::load_purchases;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    firstname: String,
    middle_name: String,
    surname: String,
    address: String,
    postal_code: String,
    password_hash: String,
    enabled: bool,
}

impl UserRow {
    fn into_user(self, purchases: Purchases) -> User {
        User {
            id: self.id,
            email: self.email,
            firstname: self.firstname,
            middle_name: self.middle_name,
            surname: self.surname,
            address: self.address,
            postal_code: self.postal_code,
            password_hash: HashedPassword::from_stored(self.password_hash),
            enabled: self.enabled,
            purchases,
        }
    }
}

const USER_COLUMNS: &str =
    "id, email, firstname, middle_name, surname, address, postal_code, password_hash, enabled";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert_user(&self, user: &UserRecord) -> RepoResult<bool> {
        // The unique constraint on email decides; no separate existence check.
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, firstname, middle_name, surname, address, postal_code, password_hash, enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(&user.email)
        .bind(&user.firstname)
        .bind(&user.middle_name)
        .bind(&user.surname)
        .bind(&user.address)
        .bind(&user.postal_code)
        .bind(user.password_hash.as_str())
        .bind(user.enabled)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_user(&self, email: &str, with_purchases: bool) -> RepoResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let purchases = if with_purchases {
            let mut by_user = load_purchases(&mut *tx, &[row.id]).await?;
            Purchases::Loaded(by_user.remove(&row.id).unwrap_or_default())
        } else {
            Purchases::NotFetched
        };

        tx.commit().await?;
        Ok(Some(row.into_user(purchases)))
    }

    async fn list_users(&self, with_purchases: bool) -> RepoResult<Vec<User>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;

        let users = if with_purchases {
            let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
            let mut by_user = load_purchases(&mut *tx, &ids).await?;
            rows.into_iter()
                .map(|row| {
                    let purchases = by_user.remove(&row.id).unwrap_or_default();
                    row.into_user(Purchases::Loaded(purchases))
                })
                .collect()
        } else {
            rows.into_iter()
                .map(|row| row.into_user(Purchases::NotFetched))
                .collect()
        };

        tx.commit().await?;
        Ok(users)
    }

    async fn delete_user(&self, email: &str) -> RepoResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1 FOR UPDATE")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let removed = sqlx::query("DELETE FROM purchases WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(removed))
    }
}
