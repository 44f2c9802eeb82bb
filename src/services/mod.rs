//! Account, balance and share-lot operations over a [`UserStore`](crate::store::UserStore).

pub mod accounts;
pub mod ledger;
pub mod trading;

pub use accounts::AccountService;
pub use ledger::BalanceLedger;
pub use trading::TradingEngine;
