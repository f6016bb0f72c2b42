use crate::cell::{ArcCell, CellBuilder, CellParser, TonCellError};
use crate::tlb::TLBObject;
use crate::types::workchain_id;
use crate::TonAddress;

const SPLIT_DEPTH_BITS: usize = 5;

/// `StateInit` of a contract: the code and data its address is derived from.
///
/// `split_depth` and `special` are never set by this crate; parsing rejects them.
// https://github.com/ton-blockchain/ton/blob/59a8cf0ae5c3062d14ec4c89a04fee80b5fd05c1/crypto/block/block.tlb#L281
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    pub code: Option<ArcCell>,
    pub data: Option<ArcCell>,
    // library:(HashmapE 256 SimpleLib), kept as the raw root
    pub library: Option<ArcCell>,
}

impl StateInit {
    pub fn new(code: ArcCell, data: ArcCell) -> Self {
        StateInit {
            code: Some(code),
            data: Some(data),
            library: None,
        }
    }

    /// Address the contract gets when deployed with this state init.
    pub fn address(&self, workchain: i32) -> Result<TonAddress, TonCellError> {
        workchain_id(workchain)?;
        Ok(TonAddress::derive(workchain, &self.to_cell()?))
    }
}

impl TLBObject for StateInit {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        if parser.load_bit()? {
            let split_depth = parser.load_u8(SPLIT_DEPTH_BITS)?;
            return Err(TonCellError::InvalidCellData(format!(
                "split_depth {split_depth} is not supported"
            )));
        }
        if parser.load_bit()? {
            return Err(TonCellError::InvalidCellData(
                "tick-tock contracts are not supported".to_string(),
            ));
        }
        Ok(StateInit {
            code: parser.load_maybe_cell_ref()?,
            data: parser.load_maybe_cell_ref()?,
            library: parser.load_maybe_cell_ref()?,
        })
    }

    fn write(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        // split_depth and special are absent
        dst.store_bit(false)?;
        dst.store_bit(false)?;
        dst.store_maybe_cell_ref(&self.code)?;
        dst.store_maybe_cell_ref(&self.data)?;
        dst.store_maybe_cell_ref(&self.library)?;
        Ok(())
    }
}
