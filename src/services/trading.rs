use crate::error::{Error, Result};
use crate::models::{Direction, Share, SoldIndicator, TransactionType, UpdateResult, OWNED};
use crate::services::ledger::BalanceLedger;
use crate::store::UserStore;
use std::sync::Arc;

/// Buys and sells share lots against a user's balance.
///
/// Each operation is a balance write followed by a share-list write. When the
/// second write fails the balance write is reversed once; if the reversal
/// fails too it is logged and the account is left inconsistent.
#[derive(Clone)]
pub struct TradingEngine {
    store: Arc<dyn UserStore>,
    ledger: BalanceLedger,
}

impl TradingEngine {
    pub fn new(store: Arc<dyn UserStore>, ledger: BalanceLedger) -> Self {
        Self { store, ledger }
    }

    pub async fn transact(
        &self,
        email: &str,
        kind: TransactionType,
        share: Share,
    ) -> Result<UpdateResult> {
        match kind {
            TransactionType::Buy => self.buy(email, share).await,
            TransactionType::Sell => self.sell(email, share).await,
        }
    }

    /// Buy a new lot of `share.quantity` at `share.price_bought`.
    pub async fn buy(&self, email: &str, mut share: Share) -> Result<UpdateResult> {
        if share.quantity < 1 {
            return Err(Error::validation("Quantity must be at least 1."));
        }
        if !share.price_bought.is_finite() || share.price_bought < 0.0 {
            return Err(Error::validation("Price must be a non-negative number."));
        }

        let cost = share.price_bought * share.quantity as f64;
        let balance = self.ledger.get_balance(email).await?;
        if balance < cost {
            tracing::warn!(email, balance, cost, "Insufficient balance to purchase the shares");
            return Err(Error::InsufficientFunds);
        }

        self.ledger
            .adjust_balance(email, cost, Direction::Debit)
            .await?;

        share.share_id = uuid::Uuid::new_v4().to_string();
        share.sold_indicator = SoldIndicator::Open;
        share.date_bought = chrono::Utc::now().to_rfc3339();
        share.owned_or_sold = OWNED.to_string();
        share.date_sold = String::new();
        share.price_sold = 0.0;

        match self.append_share(email, &share).await {
            Ok(result) => {
                tracing::info!(email, share_id = %share.share_id, symbol = %share.symbol, cost, "Share bought");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(email, "Unable to save bought share: {}", e);
                self.compensate(email, cost, Direction::Credit).await;
                Err(e)
            }
        }
    }

    async fn append_share(&self, email: &str, share: &Share) -> Result<UpdateResult> {
        let list = self
            .store
            .find_shares(email)
            .await?
            .ok_or_else(|| Error::not_found(format!("User {} does not exist.", email)))?;

        let result = match list.shares {
            None => self.store.set_shares(email, std::slice::from_ref(share)).await?,
            Some(_) => self.store.push_share(email, share).await?,
        };
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("User {} does not exist.", email)));
        }
        Ok(result)
    }

    /// Close the lot `share.share_id` at `share.price_sold`. Proceeds use the
    /// stored lot's quantity.
    pub async fn sell(&self, email: &str, share: Share) -> Result<UpdateResult> {
        if share.share_id.is_empty() {
            return Err(Error::validation("shareID is missing."));
        }
        if !share.price_sold.is_finite() || share.price_sold < 0.0 {
            return Err(Error::validation("Price must be a non-negative number."));
        }

        let lot = self.find_lot(email, &share.share_id).await?;
        if lot.sold_indicator == SoldIndicator::Closed {
            tracing::warn!(email, share_id = %lot.share_id, "Share has already been sold");
            return Err(Error::AlreadySold(lot.share_id));
        }

        let proceeds = share.price_sold * lot.quantity as f64;
        self.ledger
            .adjust_balance(email, proceeds, Direction::Credit)
            .await?;

        let date_sold = chrono::Utc::now().to_rfc3339();
        let closed = self
            .store
            .close_share(email, &lot.share_id, share.price_sold, &date_sold)
            .await
            .and_then(|result| {
                if result.matched_count == 0 {
                    Err(Error::AlreadySold(lot.share_id.clone()))
                } else {
                    Ok(result)
                }
            });

        match closed {
            Ok(result) => {
                tracing::info!(email, share_id = %lot.share_id, proceeds, "Share sold");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(email, share_id = %lot.share_id, "Unable to save sold share: {}", e);
                self.compensate(email, proceeds, Direction::Debit).await;
                Err(e)
            }
        }
    }

    /// First lot in the user's list with this id.
    async fn find_lot(&self, email: &str, share_id: &str) -> Result<Share> {
        let list = self
            .store
            .find_shares(email)
            .await
            .map_err(|e| {
                tracing::error!(email, "Unable to get sold indicator for the share: {}", e);
                e
            })?
            .ok_or_else(|| Error::not_found(format!("User {} does not exist.", email)))?;

        list.shares
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.share_id == share_id)
            .ok_or_else(|| Error::ShareNotFound(share_id.to_string()))
    }

    async fn compensate(&self, email: &str, amount: f64, direction: Direction) {
        if let Err(e) = self.ledger.adjust_balance(email, amount, direction).await {
            tracing::error!(
                email,
                amount,
                ?direction,
                "Compensating balance update failed, account left inconsistent: {}",
                e
            );
        }
    }
}
