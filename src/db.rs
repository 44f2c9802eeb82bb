use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{DeleteResult, Share, ShareList, SoldIndicator, UpdateResult, User, SOLD};
use crate::store::UserStore;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde::Deserialize;
use std::future::IntoFuture;
use std::time::Duration;

#[derive(Deserialize)]
struct IdProjection {
    #[serde(rename = "_id")]
    id: ObjectId,
}

#[derive(Deserialize)]
struct HashProjection {
    #[serde(default)]
    hash: String,
}

#[derive(Deserialize)]
struct BalanceProjection {
    #[serde(default)]
    balance: f64,
}

/// Long-lived handle on the users collection. Cloning shares the underlying
/// connection pool.
#[derive(Clone)]
pub struct DatabasePool {
    users: Collection<User>,
    timeout: Duration,
}

impl DatabasePool {
    /// Connect to MongoDB and bind to the configured users collection.
    pub async fn new(config: &Config) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.mongo_uri).await?;
        options.app_name = Some("coin-dbutil".to_string());
        options.connect_timeout = Some(config.store_timeout);
        options.server_selection_timeout = Some(config.store_timeout);

        let client = Client::with_options(options)?;
        let users = client
            .database(&config.database)
            .collection::<User>(&config.collection);

        tracing::info!(
            "Connected to MongoDB database {} collection {}",
            config.database,
            config.collection
        );

        Ok(Self {
            users,
            timeout: config.store_timeout,
        })
    }

    /// Run one store call under the per-operation deadline.
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!("MongoDB {} failed: {}", op, e);
                Err(e.into())
            }
            Err(_) => {
                tracing::error!("MongoDB {} timed out after {:?}", op, self.timeout);
                Err(Error::store(format!("{} timed out", op)))
            }
        }
    }

    async fn update(&self, op: &str, email: &str, update: Document) -> Result<UpdateResult> {
        let result = self
            .bounded(op, self.users.update_one(by_email(email), update))
            .await?;
        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }
}

fn by_email(email: &str) -> Document {
    doc! { "email": { "$eq": email } }
}

#[async_trait]
impl UserStore for DatabasePool {
    async fn count_by_email(&self, email: &str) -> Result<u64> {
        self.bounded("count", self.users.count_documents(by_email(email)))
            .await
    }

    async fn insert_user(&self, user: &User) -> Result<String> {
        let result = self.bounded("insert", self.users.insert_one(user)).await?;
        Ok(match result.inserted_id {
            Bson::ObjectId(id) => id.to_hex(),
            other => other.to_string(),
        })
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        self.bounded("find user", self.users.find_one(by_email(email)))
            .await
    }

    async fn find_id(&self, email: &str) -> Result<Option<String>> {
        let found = self
            .bounded(
                "find id",
                self.users
                    .clone_with_type::<IdProjection>()
                    .find_one(by_email(email))
                    .projection(doc! { "_id": 1 }),
            )
            .await?;
        Ok(found.map(|p| p.id.to_hex()))
    }

    async fn find_hash(&self, email: &str) -> Result<Option<String>> {
        let found = self
            .bounded(
                "find hash",
                self.users
                    .clone_with_type::<HashProjection>()
                    .find_one(by_email(email))
                    .projection(doc! { "email": 1, "hash": 1 }),
            )
            .await?;
        Ok(found.map(|p| p.hash))
    }

    async fn find_balance(&self, email: &str) -> Result<Option<f64>> {
        let found = self
            .bounded(
                "find balance",
                self.users
                    .clone_with_type::<BalanceProjection>()
                    .find_one(by_email(email))
                    .projection(doc! { "balance": 1 }),
            )
            .await?;
        Ok(found.map(|p| p.balance))
    }

    async fn find_shares(&self, email: &str) -> Result<Option<ShareList>> {
        self.bounded(
            "find shares",
            self.users
                .clone_with_type::<ShareList>()
                .find_one(by_email(email))
                .projection(doc! { "shares": 1 }),
        )
        .await
    }

    async fn set_status(&self, email: &str, status: &str) -> Result<UpdateResult> {
        self.update(
            "set status",
            email,
            doc! { "$set": { "accountStatus": status } },
        )
        .await
    }

    async fn set_balance(&self, email: &str, balance: f64) -> Result<UpdateResult> {
        self.update("set balance", email, doc! { "$set": { "balance": balance } })
            .await
    }

    async fn set_shares(&self, email: &str, shares: &[Share]) -> Result<UpdateResult> {
        let shares = bson::to_bson(shares)?;
        self.update("set shares", email, doc! { "$set": { "shares": shares } })
            .await
    }

    async fn push_share(&self, email: &str, share: &Share) -> Result<UpdateResult> {
        let share = bson::to_bson(share)?;
        self.update("push share", email, doc! { "$push": { "shares": share } })
            .await
    }

    async fn close_share(
        &self,
        email: &str,
        share_id: &str,
        price_sold: f64,
        date_sold: &str,
    ) -> Result<UpdateResult> {
        let filter = doc! {
            "email": email,
            "shares": {
                "$elemMatch": {
                    "shareID": share_id,
                    "soldIndicator": SoldIndicator::Open.as_str(),
                }
            },
        };
        let update = doc! {
            "$set": {
                "shares.$.ownedOrSold": SOLD,
                "shares.$.dateSold": date_sold,
                "shares.$.soldIndicator": SoldIndicator::Closed.as_str(),
                "shares.$.priceSold": price_sold,
            }
        };
        let result = self
            .bounded("close share", self.users.update_one(filter, update))
            .await?;
        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_user(&self, email: &str) -> Result<DeleteResult> {
        let result = self
            .bounded("delete", self.users.delete_one(by_email(email)))
            .await?;
        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }
}
