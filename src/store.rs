use crate::error::{Error, Result};
use crate::models::{DeleteResult, Share, ShareList, SoldIndicator, UpdateResult, User, SOLD};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

/// Document-store operations on the users collection. Every call is keyed by
/// email and is a single-document operation; nothing spans two calls.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Number of users with this email.
    async fn count_by_email(&self, email: &str) -> Result<u64>;

    /// Insert a new user document, returning the store id as hex.
    async fn insert_user(&self, user: &User) -> Result<String>;

    async fn find_user(&self, email: &str) -> Result<Option<User>>;

    /// Store-internal id of the user, as hex.
    async fn find_id(&self, email: &str) -> Result<Option<String>>;

    async fn find_hash(&self, email: &str) -> Result<Option<String>>;

    async fn find_balance(&self, email: &str) -> Result<Option<f64>>;

    async fn find_shares(&self, email: &str) -> Result<Option<ShareList>>;

    async fn set_status(&self, email: &str, status: &str) -> Result<UpdateResult>;

    /// Overwrite the balance field.
    async fn set_balance(&self, email: &str, balance: f64) -> Result<UpdateResult>;

    /// Replace the whole share list.
    async fn set_shares(&self, email: &str, shares: &[Share]) -> Result<UpdateResult>;

    /// Append one lot to an existing share list.
    async fn push_share(&self, email: &str, share: &Share) -> Result<UpdateResult>;

    /// Close the first open lot with this id in place. Matches nothing when
    /// the lot is missing or already closed.
    async fn close_share(
        &self,
        email: &str,
        share_id: &str,
        price_sold: f64,
        date_sold: &str,
    ) -> Result<UpdateResult>;

    async fn delete_user(&self, email: &str) -> Result<DeleteResult>;
}

/// Store operations that can be made to fail in a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Count,
    Insert,
    Find,
    SetStatus,
    SetBalance,
    SetShares,
    PushShare,
    CloseShare,
    Delete,
}

#[derive(Default)]
struct Inner {
    // (id, document) in insertion order
    users: Vec<(String, User)>,
    // calls left before the armed failure fires
    failures: HashMap<Operation, usize>,
    // updates that report zero matches once without writing
    misses: HashSet<Operation>,
}

impl Inner {
    fn trip(&mut self, op: Operation) -> Result<()> {
        if let Some(left) = self.failures.get_mut(&op) {
            *left -= 1;
            if *left == 0 {
                self.failures.remove(&op);
                return Err(Error::store(format!("injected failure on {:?}", op)));
            }
        }
        Ok(())
    }

    fn missed(&mut self, op: Operation) -> bool {
        self.misses.remove(&op)
    }

    fn user_mut(&mut self, email: &str) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|(_, u)| u.email == email)
            .map(|(_, u)| u)
    }

    fn user(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|(_, u)| u.email == email).map(|(_, u)| u)
    }
}

fn matched(hit: bool) -> UpdateResult {
    let n = u64::from(hit);
    UpdateResult {
        matched_count: n,
        modified_count: n,
    }
}

/// In-process users collection. Failures and zero-match results can be armed
/// per operation; each fires once.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with a store error.
    pub async fn fail_next(&self, op: Operation) {
        self.fail_nth(op, 1).await;
    }

    /// Make the `n`th call of `op` from now fail with a store error.
    pub async fn fail_nth(&self, op: Operation, n: usize) {
        if n > 0 {
            self.inner.lock().await.failures.insert(op, n);
        }
    }

    /// Make the next update of `op` match nothing and write nothing, as if
    /// the document changed between a read and the write.
    pub async fn miss_next(&self, op: Operation) {
        self.inner.lock().await.misses.insert(op);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn count_by_email(&self, email: &str) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Count)?;
        Ok(inner.users.iter().filter(|(_, u)| u.email == email).count() as u64)
    }

    async fn insert_user(&self, user: &User) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Insert)?;
        let id = bson::oid::ObjectId::new().to_hex();
        inner.users.push((id.clone(), user.clone()));
        Ok(id)
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Find)?;
        Ok(inner.user(email).cloned())
    }

    async fn find_id(&self, email: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Find)?;
        Ok(inner
            .users
            .iter()
            .find(|(_, u)| u.email == email)
            .map(|(id, _)| id.clone()))
    }

    async fn find_hash(&self, email: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Find)?;
        Ok(inner.user(email).map(|u| u.hash.clone()))
    }

    async fn find_balance(&self, email: &str) -> Result<Option<f64>> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Find)?;
        Ok(inner.user(email).map(|u| u.balance))
    }

    async fn find_shares(&self, email: &str) -> Result<Option<ShareList>> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Find)?;
        Ok(inner.user(email).map(|u| ShareList {
            shares: u.shares.clone(),
        }))
    }

    async fn set_status(&self, email: &str, status: &str) -> Result<UpdateResult> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::SetStatus)?;
        if inner.missed(Operation::SetStatus) {
            return Ok(matched(false));
        }
        let user = inner.user_mut(email);
        let hit = user.is_some();
        if let Some(user) = user {
            user.account_status = status.to_string();
        }
        Ok(matched(hit))
    }

    async fn set_balance(&self, email: &str, balance: f64) -> Result<UpdateResult> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::SetBalance)?;
        if inner.missed(Operation::SetBalance) {
            return Ok(matched(false));
        }
        let user = inner.user_mut(email);
        let hit = user.is_some();
        if let Some(user) = user {
            user.balance = balance;
        }
        Ok(matched(hit))
    }

    async fn set_shares(&self, email: &str, shares: &[Share]) -> Result<UpdateResult> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::SetShares)?;
        if inner.missed(Operation::SetShares) {
            return Ok(matched(false));
        }
        let user = inner.user_mut(email);
        let hit = user.is_some();
        if let Some(user) = user {
            user.shares = Some(shares.to_vec());
        }
        Ok(matched(hit))
    }

    async fn push_share(&self, email: &str, share: &Share) -> Result<UpdateResult> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::PushShare)?;
        if inner.missed(Operation::PushShare) {
            return Ok(matched(false));
        }
        let user = inner.user_mut(email);
        let hit = user.is_some();
        if let Some(user) = user {
            user.shares.get_or_insert_with(Vec::new).push(share.clone());
        }
        Ok(matched(hit))
    }

    async fn close_share(
        &self,
        email: &str,
        share_id: &str,
        price_sold: f64,
        date_sold: &str,
    ) -> Result<UpdateResult> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::CloseShare)?;
        if inner.missed(Operation::CloseShare) {
            return Ok(matched(false));
        }
        let lot = inner
            .user_mut(email)
            .and_then(|u| u.shares.as_mut())
            .and_then(|shares| {
                shares.iter_mut().find(|s| {
                    s.share_id == share_id && s.sold_indicator == SoldIndicator::Open
                })
            });
        let hit = lot.is_some();
        if let Some(lot) = lot {
            lot.sold_indicator = SoldIndicator::Closed;
            lot.date_sold = date_sold.to_string();
            lot.owned_or_sold = SOLD.to_string();
            lot.price_sold = price_sold;
        }
        Ok(matched(hit))
    }

    async fn delete_user(&self, email: &str) -> Result<DeleteResult> {
        let mut inner = self.inner.lock().await;
        inner.trip(Operation::Delete)?;
        let before = inner.users.len();
        if let Some(pos) = inner.users.iter().position(|(_, u)| u.email == email) {
            inner.users.remove(pos);
        }
        Ok(DeleteResult {
            deleted_count: (before - inner.users.len()) as u64,
        })
    }
}
