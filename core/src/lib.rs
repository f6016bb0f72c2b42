pub mod cell;
pub mod config;
pub mod jetton;
pub mod meta;
pub mod tlb;
pub mod types;

pub use crate::types::{TonAddress, TonAddressParseError, TonHash};
