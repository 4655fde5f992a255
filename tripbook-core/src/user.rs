use serde::{Deserialize, Serialize, Serializer};

use crate::password::HashedPassword;
use crate::purchase::Purchase;
use crate::validation::{self, Violations};

/// Registration input, checked by [`validation::validate_user`] before anything is stored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub firstname: String,
    #[serde(default)]
    pub middle_name: String,
    pub surname: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Violations {
        validation::validate_user(self)
    }
}

/// Returned when a caller reads purchases that were not requested from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Purchases were not fetched for user {email}")]
pub struct PurchasesNotLoaded {
    pub email: String,
}

/// Fetch state of a user's purchases.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Purchases {
    #[default]
    NotFetched,
    Loaded(Vec<Purchase>),
}

impl Serialize for Purchases {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Purchases::NotFetched => serializer.serialize_none(),
            Purchases::Loaded(list) => list.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub firstname: String,
    pub middle_name: String,
    pub surname: String,
    pub address: String,
    pub postal_code: String,
    #[serde(skip_serializing)]
    pub password_hash: HashedPassword,
    pub enabled: bool,
    pub purchases: Purchases,
}

impl User {
    /// Purchases in booking order.
    ///
    /// Fails when the user was read without its purchases, so "none booked"
    /// and "not fetched" can never be confused.
    pub fn purchases(&self) -> Result<&[Purchase], PurchasesNotLoaded> {
        match &self.purchases {
            Purchases::Loaded(list) => Ok(list),
            Purchases::NotFetched => Err(PurchasesNotLoaded {
                email: self.email.clone(),
            }),
        }
    }
}
