use thiserror::Error;

use crate::cell::TonCellError;
use crate::meta::MetaDataError;
use crate::TonAddressParseError;

#[derive(Error, Debug)]
pub enum JettonError {
    #[error("TonCellError ({0})")]
    Cell(#[from] TonCellError),

    #[error("MetaDataError ({0})")]
    MetaData(#[from] MetaDataError),

    #[error("TonAddressParseError ({0})")]
    Address(#[from] TonAddressParseError),

    #[error("Invalid deploy config ({0})")]
    Config(#[from] serde_json::Error),

    #[error("Unexpected opcode {actual:#010x}, {expected:#010x} expected")]
    InvalidOpCode { expected: u32, actual: u32 },
}
