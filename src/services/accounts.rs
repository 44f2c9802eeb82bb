use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::models::{DeleteResult, InsertResult, UpdateResult, User};
use crate::store::UserStore;
use std::sync::Arc;

/// CRUD over user account documents, keyed by email.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    credentials: Credentials,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, credentials: Credentials) -> Self {
        Self { store, credentials }
    }

    /// Whether an account with this email exists. A failed lookup counts as
    /// existing so that registration is blocked rather than duplicated.
    pub async fn exists(&self, email: &str) -> bool {
        match self.store.count_by_email(email).await {
            Ok(count) => {
                if count != 0 {
                    tracing::debug!(email, "Email already exists");
                }
                count != 0
            }
            Err(e) => {
                tracing::error!(email, "Encountered error while looking up email: {}", e);
                true
            }
        }
    }

    /// Insert a new user whose `hash` is already hashed.
    pub async fn create(&self, mut user: User) -> Result<InsertResult> {
        user.email_confirmed = false;

        if self.exists(&user.email).await {
            tracing::warn!(email = %user.email, "Registration refused, email in use");
            return Err(Error::Conflict);
        }

        let inserted_id = self.store.insert_user(&user).await.map_err(|e| {
            tracing::error!(email = %user.email, "Encountered error while saving user data: {}", e);
            e
        })?;

        tracing::info!(email = %user.email, %inserted_id, "Successfully saved user data");
        Ok(InsertResult { inserted_id })
    }

    /// Validate a registration body, hash its plaintext password and create
    /// the account.
    pub async fn register(&self, mut user: User) -> Result<InsertResult> {
        if user.email.trim().is_empty() {
            return Err(Error::validation("Email is missing."));
        }
        if user.hash.is_empty() {
            return Err(Error::validation("Password is missing."));
        }
        if !user.balance.is_finite() || user.balance < 0.0 {
            return Err(Error::validation("Balance must be a non-negative number."));
        }

        user.hash = self.credentials.hash(&user.hash)?;
        user.shares = None;
        if user.created_date.is_empty() {
            user.created_date = chrono::Utc::now().to_rfc3339();
        }

        self.create(user).await
    }

    pub async fn fetch_by_email(&self, email: &str) -> Result<User> {
        tracing::debug!(email, "Searching user");
        self.store
            .find_user(email)
            .await?
            .ok_or_else(|| Error::not_found("User does not exist."))
    }

    /// Store-internal id of the account, as hex.
    pub async fn fetch_id(&self, email: &str) -> Result<String> {
        self.store
            .find_id(email)
            .await?
            .ok_or_else(|| Error::not_found("User does not exist."))
    }

    pub async fn fetch_hash(&self, email: &str) -> Result<String> {
        self.store
            .find_hash(email)
            .await?
            .ok_or_else(|| Error::not_found("User does not exist."))
    }

    pub async fn fetch_balance(&self, email: &str) -> Result<f64> {
        self.store
            .find_balance(email)
            .await?
            .ok_or_else(|| Error::not_found("User does not exist."))
    }

    /// Overwrite the free-form account status. The account must exist.
    pub async fn update_status(&self, email: &str, status: &str) -> Result<UpdateResult> {
        if !self.exists(email).await {
            return Err(Error::validation("Unable to update. User does not exist."));
        }

        let result = self.store.set_status(email, status).await.map_err(|e| {
            tracing::error!(email, "Unable to update the status of user: {}", e);
            e
        })?;
        tracing::info!(email, status, "Account status updated");
        Ok(result)
    }

    pub async fn delete(&self, email: &str) -> Result<DeleteResult> {
        let result = self.store.delete_user(email).await.map_err(|e| {
            tracing::error!(email, "Unable to delete user from db: {}", e);
            e
        })?;
        tracing::info!(email, "User has been deleted");
        Ok(result)
    }

    /// Check a plaintext password against the stored hash. A missing account,
    /// a failed lookup and a wrong password all give `Unauthenticated`.
    pub async fn authenticate(&self, email: &str, plaintext: &str) -> Result<()> {
        let hash = self.fetch_hash(email).await.map_err(|e| {
            tracing::warn!(email, "Unable to get user credentials: {}", e);
            Error::Unauthenticated
        })?;

        self.credentials.verify(&hash, plaintext).map_err(|e| {
            tracing::warn!(email, "Unable to authenticate the user");
            e
        })?;

        tracing::info!(email, "User has been authenticated");
        Ok(())
    }

    /// Delete an account after authenticating with its password.
    pub async fn close(&self, email: &str, plaintext: &str) -> Result<DeleteResult> {
        self.authenticate(email, plaintext).await?;
        self.delete(email).await
    }
}
