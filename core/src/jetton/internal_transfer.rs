use num_bigint::BigUint;
use num_traits::Zero;

use super::{load_opcode, JettonError, JettonMessage, JETTON_INTERNAL_TRANSFER};
use crate::cell::{ArcCell, Cell, CellBuilder, CellParser, TonCellError};
use crate::TonAddress;

/// Message the minter sends to a jetton wallet to credit it:
///
/// ```raw
/// internal_transfer#178d4519 query_id:uint64 amount:(VarUInteger 16) from:MsgAddress
///                            response_address:MsgAddress forward_ton_amount:(VarUInteger 16)
///                            forward_payload:(Either Cell ^Cell) = InternalMsgBody;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JettonInternalTransferMessage {
    pub query_id: u64,
    pub amount: BigUint,
    pub from_address: TonAddress,
    pub response_address: TonAddress,
    pub forward_ton_amount: BigUint,
    /// Stored by reference. An inline payload is read into a separate cell.
    pub forward_payload: Option<ArcCell>,
}

impl JettonInternalTransferMessage {
    pub fn new(amount: &BigUint) -> Self {
        JettonInternalTransferMessage {
            query_id: 0,
            amount: amount.clone(),
            from_address: TonAddress::NULL,
            response_address: TonAddress::NULL,
            forward_ton_amount: BigUint::zero(),
            forward_payload: None,
        }
    }

    pub fn with_query_id(&mut self, query_id: u64) -> &mut Self {
        self.query_id = query_id;
        self
    }

    pub fn with_from_address(&mut self, from_address: &TonAddress) -> &mut Self {
        self.from_address = from_address.clone();
        self
    }

    pub fn with_response_address(&mut self, response_address: &TonAddress) -> &mut Self {
        self.response_address = response_address.clone();
        self
    }

    pub fn with_forward_payload(
        &mut self,
        forward_ton_amount: &BigUint,
        forward_payload: &ArcCell,
    ) -> &mut Self {
        self.forward_ton_amount = forward_ton_amount.clone();
        self.forward_payload = Some(forward_payload.clone());
        self
    }

    fn read_body(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let query_id = parser.load_u64(64)?;
        let amount = parser.load_coins()?;
        let from_address = parser.load_address()?;
        let response_address = parser.load_address()?;
        let forward_ton_amount = parser.load_coins()?;
        let forward_payload = if parser.load_bit()? {
            Some(parser.next_reference()?)
        } else if parser.remaining_bits() == 0 && parser.remaining_refs() == 0 {
            None
        } else {
            Some(parser.load_remaining()?.to_arc())
        };
        Ok(JettonInternalTransferMessage {
            query_id,
            amount,
            from_address,
            response_address,
            forward_ton_amount,
            forward_payload,
        })
    }
}

impl JettonMessage for JettonInternalTransferMessage {
    const OPCODE: u32 = JETTON_INTERNAL_TRANSFER;

    fn build(&self) -> Result<Cell, JettonError> {
        let mut message = CellBuilder::new();
        message
            .store_u32(32, Self::OPCODE)?
            .store_u64(64, self.query_id)?
            .store_coins(&self.amount)?
            .store_address(&self.from_address)?
            .store_address(&self.response_address)?
            .store_coins(&self.forward_ton_amount)?
            .store_maybe_cell_ref(&self.forward_payload)?;
        Ok(message.build()?)
    }

    fn parse(cell: &Cell) -> Result<Self, JettonError> {
        let mut parser = cell.parser();
        load_opcode::<Self>(&mut parser)?;
        let message = Self::read_body(&mut parser)?;
        parser.ensure_empty()?;
        Ok(message)
    }
}
