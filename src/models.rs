use serde::{Deserialize, Serialize};

/// User is one account document. The email is the lookup key for every
/// operation; shares are embedded in the document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub phone: String,
    /// Password hash once stored. On registration the client sends the
    /// plaintext password here.
    #[serde(alias = "password")]
    pub hash: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub account_status: String,
    pub balance: f64,
    pub created_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<Vec<Share>>,
}

/// User as returned by `GET /user/{email}`: everything but the hash.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub phone: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub account_status: String,
    pub balance: f64,
    pub created_date: String,
    pub shares: Vec<Share>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            username: user.username,
            email: user.email,
            email_confirmed: user.email_confirmed,
            phone: user.phone,
            first_name: user.first_name,
            middle_name: user.middle_name,
            last_name: user.last_name,
            account_status: user.account_status,
            balance: user.balance,
            created_date: user.created_date,
            shares: user.shares.unwrap_or_default(),
        }
    }
}

/// Whether a lot is still held. Stored as "N" (open) or "Y" (closed).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SoldIndicator {
    #[default]
    #[serde(rename = "N")]
    Open,
    #[serde(rename = "Y")]
    Closed,
}

impl SoldIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoldIndicator::Open => "N",
            SoldIndicator::Closed => "Y",
        }
    }
}

pub const OWNED: &str = "Owned";
pub const SOLD: &str = "Sold";

/// Share is one purchase lot embedded in a user document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Share {
    #[serde(rename = "shareID")]
    pub share_id: String,
    pub symbol: String,
    pub company: String,
    pub quantity: i64,
    #[serde(rename = "priceBaught", alias = "priceBought")]
    pub price_bought: f64,
    pub price_sold: f64,
    pub sold_indicator: SoldIndicator,
    #[serde(rename = "dateBaught", alias = "dateBought")]
    pub date_bought: String,
    pub date_sold: String,
    pub owned_or_sold: String,
}

/// Projection holding only the share list of a user.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ShareList {
    #[serde(default)]
    pub shares: Option<Vec<Share>>,
}

/// Which way a balance adjustment moves the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

/// The `transactiontype` path segment of `PUT /user/share/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Buy,
    Sell,
}

impl std::str::FromStr for TransactionType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            other => Err(crate::error::Error::validation(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub inserted_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}
