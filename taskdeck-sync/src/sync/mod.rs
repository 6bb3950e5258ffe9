pub mod categories;
pub mod engine;
pub mod ledger;
pub mod mapper;
pub mod replica;
pub mod state;
