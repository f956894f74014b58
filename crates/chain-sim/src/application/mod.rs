mod ledger;

pub use ledger::{SimChain, pair_account};
