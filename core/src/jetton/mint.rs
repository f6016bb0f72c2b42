use num_bigint::BigUint;

use super::{load_opcode, JettonError, JettonInternalTransferMessage, JettonMessage, JETTON_MINT};
use crate::cell::{Cell, CellBuilder};
use crate::TonAddress;

/// Admin request to mint jettons into the wallet of `destination`:
///
/// ```raw
/// mint#15 query_id:uint64 to_address:MsgAddress amount:(VarUInteger 16)
///         master_msg:^InternalMsgBody = InternalMsgBody;
/// ```
///
/// `ton_amount` is attached to `master_msg` when the minter forwards it to the wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JettonMintMessage {
    pub query_id: u64,
    pub destination: TonAddress,
    pub ton_amount: BigUint,
    pub master_msg: JettonInternalTransferMessage,
}

impl JettonMintMessage {
    pub fn new(destination: &TonAddress, ton_amount: &BigUint, jetton_amount: &BigUint) -> Self {
        JettonMintMessage {
            query_id: 0,
            destination: destination.clone(),
            ton_amount: ton_amount.clone(),
            master_msg: JettonInternalTransferMessage::new(jetton_amount),
        }
    }

    pub fn with_query_id(&mut self, query_id: u64) -> &mut Self {
        self.query_id = query_id;
        self.master_msg.with_query_id(query_id);
        self
    }

    pub fn with_master_msg(&mut self, master_msg: JettonInternalTransferMessage) -> &mut Self {
        self.master_msg = master_msg;
        self
    }
}

impl JettonMessage for JettonMintMessage {
    const OPCODE: u32 = JETTON_MINT;

    fn build(&self) -> Result<Cell, JettonError> {
        let master_msg = self.master_msg.build()?.to_arc();
        let mut message = CellBuilder::new();
        message
            .store_u32(32, Self::OPCODE)?
            .store_u64(64, self.query_id)?
            .store_address(&self.destination)?
            .store_coins(&self.ton_amount)?
            .store_reference(&master_msg)?;
        Ok(message.build()?)
    }

    fn parse(cell: &Cell) -> Result<Self, JettonError> {
        let mut parser = cell.parser();
        load_opcode::<Self>(&mut parser)?;
        let query_id = parser.load_u64(64)?;
        let destination = parser.load_address()?;
        let ton_amount = parser.load_coins()?;
        let master_msg = parser.next_reference()?;
        parser.ensure_empty()?;

        Ok(JettonMintMessage {
            query_id,
            destination,
            ton_amount,
            master_msg: JettonInternalTransferMessage::parse(&master_msg)?,
        })
    }
}
