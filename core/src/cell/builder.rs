use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use bitstream_io::{BigEndian, BitWrite, BitWriter, Numeric};
use num_bigint::BigUint;
use num_traits::Zero;

use crate::cell::dict::{DictBuilder, Dictionary, ValWriter};
use crate::cell::error::{MapTonCellError, TonCellError};
use crate::cell::{ArcCell, Cell, CellParser, MAX_CELL_BITS, MAX_CELL_REFERENCES};
use crate::types::workchain_id;
use crate::TonAddress;

/// Max byte length of a `VarUInteger 16` value.
const MAX_COINS_BYTES: usize = 15;

/// Accumulates bits and references of a cell under construction.
///
/// Capacity is checked before anything is written, so a failed store leaves
/// the builder unchanged.
pub struct CellBuilder {
    bit_writer: BitWriter<Vec<u8>, BigEndian>,
    bits_to_write: usize,
    references: Vec<ArcCell>,
}

impl CellBuilder {
    pub fn new() -> CellBuilder {
        let bit_writer = BitWriter::endian(Vec::new(), BigEndian);
        CellBuilder {
            bit_writer,
            bits_to_write: 0,
            references: Vec::new(),
        }
    }

    pub fn store_bit(&mut self, val: bool) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(1)?;
        self.bit_writer.write_bit(val).map_cell_builder_error()?;
        self.bits_to_write += 1;
        Ok(self)
    }

    pub fn store_u8(&mut self, bit_len: usize, val: u8) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val)
    }

    pub fn store_u16(&mut self, bit_len: usize, val: u16) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val)
    }

    pub fn store_u32(&mut self, bit_len: usize, val: u32) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val)
    }

    pub fn store_u64(&mut self, bit_len: usize, val: u64) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val)
    }

    /// Stores `val` big-endian in exactly `bit_len` bits, padding with leading zeros.
    pub fn store_uint(&mut self, bit_len: usize, val: &BigUint) -> Result<&mut Self, TonCellError> {
        let value_bits = val.bits() as usize;
        if value_bits > bit_len {
            return Err(TonCellError::ValueOutOfRange {
                value: val.to_string(),
                bit_len,
            });
        }
        self.ensure_capacity(bit_len)?;

        self.write_zeros(bit_len - value_bits)?;
        if value_bits > 0 {
            let value_bytes = val.to_bytes_be();
            let first_byte_bits = value_bits - (value_bytes.len() - 1) * 8;
            self.bit_writer
                .write(first_byte_bits as u32, value_bytes[0])
                .map_cell_builder_error()?;
            self.bit_writer
                .write_bytes(&value_bytes[1..])
                .map_cell_builder_error()?;
        }
        self.bits_to_write += bit_len;
        Ok(self)
    }

    pub fn store_byte(&mut self, val: u8) -> Result<&mut Self, TonCellError> {
        self.store_u8(8, val)
    }

    pub fn store_slice(&mut self, slice: &[u8]) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(slice.len() * 8)?;
        self.bit_writer
            .write_bytes(slice)
            .map_cell_builder_error()?;
        self.bits_to_write += slice.len() * 8;
        Ok(self)
    }

    /// Stores the first `bit_len` bits of `slice`, most significant bit first.
    pub fn store_bits(&mut self, bit_len: usize, slice: &[u8]) -> Result<&mut Self, TonCellError> {
        let full_bytes = bit_len / 8;
        let last_byte_len = bit_len % 8;
        if slice.len() < bit_len.div_ceil(8) {
            return Err(TonCellError::InvalidInput(format!(
                "Can't take {} bits from {} bytes",
                bit_len,
                slice.len()
            )));
        }
        self.ensure_capacity(bit_len)?;
        self.store_slice(&slice[0..full_bytes])?;
        if last_byte_len != 0 {
            let last_byte = slice[full_bytes] >> (8 - last_byte_len);
            self.store_u8(last_byte_len, last_byte)?;
        }
        Ok(self)
    }

    pub fn store_string(&mut self, val: &str) -> Result<&mut Self, TonCellError> {
        self.store_slice(val.as_bytes())
    }

    /// Stores `val` as `VarUInteger 16`: 4-bit byte length, then the value bytes.
    pub fn store_coins(&mut self, val: &BigUint) -> Result<&mut Self, TonCellError> {
        if val.is_zero() {
            self.store_u8(4, 0)
        } else {
            let num_bytes = (val.bits() as usize).div_ceil(8);
            if num_bytes > MAX_COINS_BYTES {
                return Err(TonCellError::ValueOutOfRange {
                    value: val.to_string(),
                    bit_len: MAX_COINS_BYTES * 8,
                });
            }
            self.ensure_capacity(4 + num_bytes * 8)?;
            self.store_u8(4, num_bytes as u8)?;
            self.store_uint(num_bytes * 8, val)
        }
    }

    /// Stores address as `addr_std` even if it is the null address
    pub fn store_raw_address(&mut self, val: &TonAddress) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(2 + 1 + 8 + 256)?;
        self.store_u8(2, 0b10u8)?;
        self.store_bit(false)?;
        let wc = workchain_id(val.workchain)?;
        self.store_u8(8, wc as u8)?;
        self.store_slice(&val.hash_part)?;
        Ok(self)
    }

    /// Stores the null address as `addr_none` (two zero bits)
    pub fn store_address(&mut self, val: &TonAddress) -> Result<&mut Self, TonCellError> {
        if val == &TonAddress::NULL {
            self.store_u8(2, 0)?;
        } else {
            self.store_raw_address(val)?;
        }
        Ok(self)
    }

    /// Adds reference to an existing `Cell`.
    ///
    /// The reference is passed as `ArcCell` so it might be references from other cells.
    pub fn store_reference(&mut self, cell: &ArcCell) -> Result<&mut Self, TonCellError> {
        let ref_count = self.references.len() + 1;
        if ref_count > MAX_CELL_REFERENCES {
            return Err(TonCellError::RefsOverflow { ref_count });
        }
        self.references.push(cell.clone());
        Ok(self)
    }

    pub fn store_references(&mut self, refs: &[ArcCell]) -> Result<&mut Self, TonCellError> {
        let ref_count = self.references.len() + refs.len();
        if ref_count > MAX_CELL_REFERENCES {
            return Err(TonCellError::RefsOverflow { ref_count });
        }
        for r in refs {
            self.store_reference(r)?;
        }
        Ok(self)
    }

    /// Adds a reference to a newly constructed `Cell`.
    ///
    /// The cell is wrapped it the `Arc`.
    pub fn store_child(&mut self, cell: Cell) -> Result<&mut Self, TonCellError> {
        self.store_reference(&Arc::new(cell))
    }

    pub fn store_remaining_bits(
        &mut self,
        parser: &mut CellParser,
    ) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(parser.remaining_bits())?;
        let num_full_bytes = parser.remaining_bits() / 8;
        let bytes = parser.load_bytes(num_full_bytes)?;
        self.store_slice(bytes.as_slice())?;
        let num_bits = parser.remaining_bits() % 8;
        let tail = parser.load_u8(num_bits)?;
        self.store_u8(num_bits, tail)?;
        Ok(self)
    }

    pub fn store_cell_data(&mut self, cell: &Cell) -> Result<&mut Self, TonCellError> {
        let mut parser = cell.parser();
        self.store_remaining_bits(&mut parser)?;
        Ok(self)
    }

    /// Appends both the bits and the references of `cell` to this builder.
    pub fn store_cell(&mut self, cell: &Cell) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(cell.bit_len())?;
        let ref_count = self.references.len() + cell.references().len();
        if ref_count > MAX_CELL_REFERENCES {
            return Err(TonCellError::RefsOverflow { ref_count });
        }
        self.store_cell_data(cell)?;
        self.store_references(cell.references())?;
        Ok(self)
    }

    // https://docs.ton.org/develop/data-formats/tl-b-types#maybe
    pub fn store_maybe_cell_ref(
        &mut self,
        maybe_cell: &Option<ArcCell>,
    ) -> Result<&mut Self, TonCellError> {
        if let Some(cell) = maybe_cell {
            if self.references.len() >= MAX_CELL_REFERENCES {
                return Err(TonCellError::RefsOverflow {
                    ref_count: self.references.len() + 1,
                });
            }
            self.store_bit(true)?;
            self.store_reference(cell)?;
        } else {
            self.store_bit(false)?;
        }

        Ok(self)
    }

    /// Stores `Hashmap n X` inline, i.e. the root node is written into this builder.
    pub fn store_dict_data<K, V>(
        &mut self,
        key_len_bits: usize,
        value_writer: ValWriter<V>,
        data: HashMap<K, V>,
    ) -> Result<&mut Self, TonCellError>
    where
        BigUint: From<K>,
    {
        let dict_builder = DictBuilder::new(key_len_bits, value_writer, data)?;
        let dict_cell = dict_builder.build()?;
        self.store_cell(&dict_cell)
    }

    /// Stores `HashmapE n X`: a single 0 bit for an empty map,
    /// otherwise 1 bit and a root reference.
    pub fn store_dict<K, V>(
        &mut self,
        key_len_bits: usize,
        value_writer: ValWriter<V>,
        data: HashMap<K, V>,
    ) -> Result<&mut Self, TonCellError>
    where
        BigUint: From<K>,
    {
        if data.is_empty() {
            self.store_bit(false)
        } else {
            let dict_data = Arc::new(
                CellBuilder::new()
                    .store_dict_data(key_len_bits, value_writer, data)?
                    .build()?,
            );
            self.store_maybe_cell_ref(&Some(dict_data))
        }
    }

    /// Stores `dict` in `HashmapE` form.
    pub fn store_dictionary(&mut self, dict: &Dictionary) -> Result<&mut Self, TonCellError> {
        if dict.is_empty() {
            self.store_bit(false)
        } else {
            let root = dict.serialize()?.to_arc();
            self.store_maybe_cell_ref(&Some(root))
        }
    }

    pub fn remaining_bits(&self) -> usize {
        MAX_CELL_BITS - self.bits_to_write
    }

    pub fn remaining_refs(&self) -> usize {
        MAX_CELL_REFERENCES - self.references.len()
    }

    /// Produces the cell and leaves the builder empty.
    pub fn build(&mut self) -> Result<Cell, TonCellError> {
        let mut builder = mem::take(self);
        let bit_len = builder.bits_to_write;
        builder
            .bit_writer
            .byte_align()
            .map_cell_builder_error()?;
        let data = builder.bit_writer.into_writer();
        Cell::new(data, bit_len, builder.references)
    }

    fn store_number<N: Numeric + Into<u64>>(
        &mut self,
        bit_len: usize,
        val: N,
    ) -> Result<&mut Self, TonCellError> {
        let wide: u64 = val.into();
        if bit_len > N::BITS_SIZE as usize {
            return self.store_uint(bit_len, &BigUint::from(wide));
        }
        if bit_len < 64 && wide >> bit_len != 0 {
            return Err(TonCellError::ValueOutOfRange {
                value: wide.to_string(),
                bit_len,
            });
        }
        self.ensure_capacity(bit_len)?;
        if bit_len > 0 {
            self.bit_writer
                .write(bit_len as u32, val)
                .map_cell_builder_error()?;
        }
        self.bits_to_write += bit_len;
        Ok(self)
    }

    fn write_zeros(&mut self, mut bit_len: usize) -> Result<(), TonCellError> {
        while bit_len > 0 {
            let chunk = bit_len.min(32);
            self.bit_writer
                .write(chunk as u32, 0u32)
                .map_cell_builder_error()?;
            bit_len -= chunk;
        }
        Ok(())
    }

    fn ensure_capacity(&self, bit_len: usize) -> Result<(), TonCellError> {
        let total = self.bits_to_write + bit_len;
        if total > MAX_CELL_BITS {
            return Err(TonCellError::BitsOverflow { bit_len: total });
        }
        Ok(())
    }
}

impl Default for CellBuilder {
    fn default() -> Self {
        Self::new()
    }
}
