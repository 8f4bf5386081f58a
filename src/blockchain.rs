// Thin re-export module: the single-threaded ledger lives in `blockchain/core.rs`,
// the lock-protected wrapper in `blockchain/shared.rs`.

pub mod core;
pub mod shared;

pub use self::core::*;
pub use shared::SharedBlockchain;
