// Constants from jetton standard and the reference minter contract
// https://github.com/ton-blockchain/TEPs/blob/master/text/0074-jettons-standard.md
// https://github.com/ton-blockchain/token-contract/blob/main/ft/op-codes.fc

// crc32('internal_transfer query_id:uint64 amount:VarUInteger 16 from:MsgAddress response_address:MsgAddress forward_ton_amount:VarUInteger 16 forward_payload:Either Cell ^Cell = InternalMsgBody') = 0x978d4519 & 0x7fffffff = 0x178d4519

pub const JETTON_INTERNAL_TRANSFER: u32 = 0x178d4519;
pub const JETTON_MINT: u32 = 21;
pub const JETTON_CHANGE_ADMIN: u32 = 3;
pub const JETTON_CHANGE_CONTENT: u32 = 4;

mod admin;
mod data;
mod error;
mod internal_transfer;
mod mint;

pub use admin::*;
pub use data::*;
pub use error::*;
pub use internal_transfer::*;
pub use mint::*;

use crate::cell::{Cell, CellParser};

/// Body of an internal message handled by the jetton minter.
pub trait JettonMessage: Sized {
    const OPCODE: u32;

    fn build(&self) -> Result<Cell, JettonError>;

    fn parse(cell: &Cell) -> Result<Self, JettonError>;
}

/// Reads the 32-bit opcode and checks it against `M::OPCODE`.
pub(crate) fn load_opcode<M: JettonMessage>(parser: &mut CellParser) -> Result<(), JettonError> {
    let actual = parser.load_u32(32)?;
    if actual != M::OPCODE {
        return Err(JettonError::InvalidOpCode {
            expected: M::OPCODE,
            actual,
        });
    }
    Ok(())
}
