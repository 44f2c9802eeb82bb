use crate::error::{Error, Result};
use crate::models::Direction;
use crate::store::UserStore;
use std::sync::Arc;

/// Read-modify-write access to the single balance field of a user.
///
/// An adjustment reads the current balance, computes the new value and
/// overwrites the field. The read and the write are two separate store calls,
/// so concurrent adjustments of one account can lose an update; callers that
/// need exact sequencing have to serialize per account themselves. Nothing
/// here stops a debit from taking the balance below zero.
#[derive(Clone)]
pub struct BalanceLedger {
    store: Arc<dyn UserStore>,
}

impl BalanceLedger {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get_balance(&self, email: &str) -> Result<f64> {
        self.store
            .find_balance(email)
            .await
            .map_err(|e| {
                tracing::error!(email, "Unable to get current balance: {}", e);
                e
            })?
            .ok_or_else(|| Error::not_found(format!("User {} does not exist.", email)))
    }

    /// Apply `amount` in `direction` and return the balance written.
    pub async fn adjust_balance(
        &self,
        email: &str,
        amount: f64,
        direction: Direction,
    ) -> Result<f64> {
        let current = self.get_balance(email).await?;
        let new_balance = match direction {
            Direction::Credit => current + amount,
            Direction::Debit => current - amount,
        };
        if !new_balance.is_finite() {
            tracing::warn!(email, current, amount, ?direction, "Balance adjustment out of range");
            return Err(Error::validation("Resulting balance is out of range."));
        }

        let result = self
            .store
            .set_balance(email, new_balance)
            .await
            .map_err(|e| {
                tracing::error!(email, "Unable to update balance: {}", e);
                e
            })?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("User {} does not exist.", email)));
        }

        tracing::info!(email, ?direction, amount, new_balance, "Balance has been updated");
        Ok(new_balance)
    }
}
