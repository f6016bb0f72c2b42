use std::ops::Deref;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;

use crate::cell::{BagOfCells, Cell, CellBuilder, CellParser, TonCellError};
use crate::TonHash;

/// Object with a fixed TL-B layout inside a cell.
///
/// Only `read` and `write` must be implemented, the rest are conversions built on them.
pub trait TLBObject: Sized {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError>;

    fn write(&self, dst: &mut CellBuilder) -> Result<(), TonCellError>;

    /// Utilities
    ///
    fn cell_hash(&self) -> Result<TonHash, TonCellError> {
        Ok(self.to_cell()?.cell_hash())
    }

    /// Parsing
    ///
    fn from_cell(cell: &Cell) -> Result<Self, TonCellError> {
        cell.parse_fully(Self::read)
    }

    fn from_boc(boc: &[u8]) -> Result<Self, TonCellError> {
        let cell = BagOfCells::parse(boc)?.single_root()?;
        Self::from_cell(cell.deref())
    }

    fn from_boc_hex(boc_hex: &str) -> Result<Self, TonCellError> {
        let cell = BagOfCells::parse_hex(boc_hex)?.single_root()?;
        Self::from_cell(cell.deref())
    }

    fn from_boc_b64(boc_b64: &str) -> Result<Self, TonCellError> {
        let cell = BagOfCells::parse_base64(boc_b64)?.single_root()?;
        Self::from_cell(cell.deref())
    }

    /// Serialization
    ///
    fn to_cell(&self) -> Result<Cell, TonCellError> {
        let mut builder = CellBuilder::new();
        self.write(&mut builder)?;
        builder.build()
    }

    fn to_boc(&self, add_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        BagOfCells::from_root(self.to_cell()?).serialize(add_crc32)
    }

    fn to_boc_hex(&self, add_crc32: bool) -> Result<String, TonCellError> {
        Ok(hex::encode(self.to_boc(add_crc32)?))
    }

    fn to_boc_b64(&self, add_crc32: bool) -> Result<String, TonCellError> {
        Ok(BASE64_STANDARD.encode(self.to_boc(add_crc32)?))
    }
}

impl CellParser<'_> {
    pub fn load_tlb<T: TLBObject>(&mut self) -> Result<T, TonCellError> {
        T::read(self)
    }
}

impl CellBuilder {
    pub fn store_tlb<T: TLBObject>(&mut self, val: &T) -> Result<&mut Self, TonCellError> {
        val.write(self)?;
        Ok(self)
    }
}
