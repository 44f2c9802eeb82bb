pub mod accounts;
pub mod trading;

use crate::auth::Credentials;
use crate::services::{AccountService, BalanceLedger, TradingEngine};
use crate::store::UserStore;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Shared by every request. All services hold the same store handle.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub ledger: BalanceLedger,
    pub trading: TradingEngine,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, credentials: Credentials) -> Self {
        let ledger = BalanceLedger::new(store.clone());
        Self {
            accounts: AccountService::new(store.clone(), credentials),
            trading: TradingEngine::new(store, ledger.clone()),
            ledger,
        }
    }
}

/// All `/user` routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Account routes
        .route("/user/register", post(accounts::register))
        .route("/user/:email", get(accounts::get_user))
        .route("/user/update/:email/:status", put(accounts::update_status))
        .route("/user/delete/:email/:password", delete(accounts::delete_user))
        .route(
            "/user/authenticate/:email/:password",
            get(accounts::authenticate),
        )
        .route(
            "/user/update/emailconfirmation/:email",
            put(accounts::confirm_email),
        )
        // Trading routes
        .route(
            "/user/share/:email/:transactiontype",
            put(trading::save_share),
        )
        .route(
            "/user/update/addbalance/:email/:amount",
            put(trading::add_to_balance),
        )
        .with_state(state)
}
