// core.rs splits the ledger into the block tree and the per-block unspent-output
// snapshot.
pub mod chain;
pub mod state;

pub use chain::*;
pub use state::*;
