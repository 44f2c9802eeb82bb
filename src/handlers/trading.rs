use crate::error::Error;
use crate::handlers::AppState;
use crate::models::{Direction, Share, TransactionType, UpdateResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{http::StatusCode, Json};

/// Buy or sell a share lot. `transactiontype` is `buy` or `sell`; the body is
/// the share (symbol, quantity and priceBaught for a buy; shareID and
/// priceSold for a sell).
#[axum::debug_handler]
pub async fn save_share(
    State(state): State<AppState>,
    Path((email, transaction_type)): Path<(String, String)>,
    payload: Result<Json<Share>, JsonRejection>,
) -> Result<(StatusCode, Json<UpdateResult>), Error> {
    if email.trim().is_empty() {
        return Err(Error::validation("Email is missing."));
    }
    let kind: TransactionType = transaction_type.parse()?;
    let Json(share) = payload.map_err(|e| Error::validation(e.body_text()))?;

    let result = state
        .trading
        .transact(&email, kind, share)
        .await
        .map_err(absent_as_bad_request)?;
    Ok((StatusCode::OK, Json(result)))
}

/// Credit an account's balance with the amount in the path.
#[axum::debug_handler]
pub async fn add_to_balance(
    State(state): State<AppState>,
    Path((email, amount)): Path<(String, String)>,
) -> Result<(StatusCode, Json<String>), Error> {
    if email.trim().is_empty() || amount.trim().is_empty() {
        return Err(Error::validation("Email or amount is missing in the url"));
    }

    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| Error::validation("Failed while parsing the amount to float"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::validation("Amount must be a non-negative number"));
    }

    state
        .ledger
        .adjust_balance(&email, amount, Direction::Credit)
        .await
        .map_err(absent_as_bad_request)?;
    Ok((
        StatusCode::OK,
        Json("Amount has been added to the balance successfully.".to_string()),
    ))
}

// Share and balance writes on an absent account answer 400, not 404.
fn absent_as_bad_request(e: Error) -> Error {
    match e {
        Error::NotFound(msg) => Error::Validation(msg),
        other => other,
    }
}
