use std::collections::HashMap;
use std::hash::Hash;
use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader, Numeric};
use num_bigint::BigUint;
use num_traits::identities::Zero;

use crate::cell::dict::{DictParser, Dictionary, KeyReader, ValReader};
use crate::cell::util::*;
use crate::cell::{ArcCell, Cell, CellBuilder, MapTonCellError, TonCellError};
use crate::TonAddress;

/// Read cursor over the bits and references of a single cell.
pub struct CellParser<'a> {
    pub(crate) bit_len: usize,
    pub(crate) bit_reader: BitReader<Cursor<&'a [u8]>, BigEndian>,
    pub(crate) references: &'a [ArcCell],
    next_ref: usize,
}

impl<'a> CellParser<'a> {
    pub fn new(bit_len: usize, data: &'a [u8], references: &'a [ArcCell]) -> Self {
        let bit_reader = BitReader::endian(Cursor::new(data), BigEndian);
        CellParser {
            bit_len,
            bit_reader,
            references,
            next_ref: 0,
        }
    }

    pub fn remaining_bits(&mut self) -> usize {
        let pos = self.bit_reader.position_in_bits().unwrap_or_default() as usize;
        self.bit_len.saturating_sub(pos)
    }

    /// Return number of full bytes remaining
    pub fn remaining_bytes(&mut self) -> usize {
        self.remaining_bits() / 8
    }

    pub fn remaining_refs(&self) -> usize {
        self.references.len() - self.next_ref
    }

    pub fn load_bit(&mut self) -> Result<bool, TonCellError> {
        self.ensure_enough_bits(1)?;
        self.bit_reader.read_bit().map_cell_parser_error()
    }

    pub fn load_u8(&mut self, bit_len: usize) -> Result<u8, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_u16(&mut self, bit_len: usize) -> Result<u16, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_u32(&mut self, bit_len: usize) -> Result<u32, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_u64(&mut self, bit_len: usize) -> Result<u64, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_uint(&mut self, bit_len: usize) -> Result<BigUint, TonCellError> {
        self.ensure_enough_bits(bit_len)?;
        if bit_len == 0 {
            return Ok(BigUint::zero());
        }
        let num_words = bit_len.div_ceil(32);
        let high_word_bits = if bit_len % 32 == 0 { 32 } else { bit_len % 32 };
        let mut words: Vec<u32> = vec![0_u32; num_words];
        words[num_words - 1] = self.load_u32(high_word_bits)?;
        for i in (0..num_words - 1).rev() {
            words[i] = self.load_u32(32)?;
        }
        Ok(BigUint::new(words))
    }

    pub fn load_byte(&mut self) -> Result<u8, TonCellError> {
        self.load_u8(8)
    }

    pub fn load_slice(&mut self, slice: &mut [u8]) -> Result<(), TonCellError> {
        self.ensure_enough_bits(slice.len() * 8)?;
        self.bit_reader.read_bytes(slice).map_cell_parser_error()
    }

    pub fn load_bytes(&mut self, num_bytes: usize) -> Result<Vec<u8>, TonCellError> {
        let mut res = vec![0_u8; num_bytes];
        self.load_slice(res.as_mut_slice())?;
        Ok(res)
    }

    pub fn load_bits_to_slice(
        &mut self,
        num_bits: usize,
        slice: &mut [u8],
    ) -> Result<(), TonCellError> {
        self.ensure_enough_bits(num_bits)?;
        self.bit_reader.read_bits(num_bits, slice)?;
        Ok(())
    }

    pub fn load_bits(&mut self, num_bits: usize) -> Result<Vec<u8>, TonCellError> {
        let mut res = vec![0_u8; num_bits.div_ceil(8)];
        self.load_bits_to_slice(num_bits, res.as_mut_slice())?;
        Ok(res)
    }

    pub fn load_utf8(&mut self, num_bytes: usize) -> Result<String, TonCellError> {
        let bytes = self.load_bytes(num_bytes)?;
        String::from_utf8(bytes).map_cell_parser_error()
    }

    pub fn load_coins(&mut self) -> Result<BigUint, TonCellError> {
        let num_bytes = self.load_u8(4)?;
        self.load_uint(num_bytes as usize * 8)
    }

    /// Loads `MsgAddressInt` (`addr_std` without anycast) or `addr_none`.
    pub fn load_address(&mut self) -> Result<TonAddress, TonCellError> {
        let tp = self.load_u8(2)?;
        match tp {
            0 => Ok(TonAddress::null()),
            2 => {
                self.ensure_enough_bits(1 + 8 + 32 * 8)?;
                let anycast = self.load_bit()?;
                if anycast {
                    return Err(TonCellError::cell_parser_error(
                        "Anycast addresses are not supported",
                    ));
                }
                let wc = self.load_u8(8)? as i8;
                let mut hash_part = [0_u8; 32];
                self.load_slice(&mut hash_part)?;
                Ok(TonAddress::new(wc as i32, &hash_part))
            }
            _ => Err(TonCellError::InvalidAddressType(tp)),
        }
    }

    pub fn load_unary_length(&mut self) -> Result<usize, TonCellError> {
        let mut res = 0;
        while self.load_bit()? {
            res += 1;
        }
        Ok(res)
    }

    /// Copies all unread bits and references into a new cell.
    pub fn load_remaining(&mut self) -> Result<Cell, TonCellError> {
        let mut builder = CellBuilder::new();
        builder.store_remaining_bits(self)?;
        while self.remaining_refs() > 0 {
            let reference = self.next_reference()?;
            builder.store_reference(&reference)?;
        }
        builder.build()
    }

    pub fn next_reference(&mut self) -> Result<ArcCell, TonCellError> {
        let reference = self
            .references
            .get(self.next_ref)
            .ok_or(TonCellError::RefsUnderflow {
                idx: self.next_ref,
                ref_count: self.references.len(),
            })?;
        self.next_ref += 1;
        Ok(reference.clone())
    }

    // https://docs.ton.org/develop/data-formats/tl-b-types#maybe
    pub fn load_maybe_cell_ref(&mut self) -> Result<Option<ArcCell>, TonCellError> {
        if self.load_bit()? {
            Ok(Some(self.next_reference()?))
        } else {
            Ok(None)
        }
    }

    /// Loads `Hashmap n X` whose root node starts at the current position.
    pub fn load_dict_data<K: Eq + Hash, V>(
        &mut self,
        key_len_bits: usize,
        key_reader: KeyReader<K>,
        val_reader: ValReader<V>,
    ) -> Result<HashMap<K, V>, TonCellError> {
        let mut dict_parser = DictParser::new(key_len_bits, key_reader, val_reader);
        dict_parser.parse(self)
    }

    /// Loads `HashmapE n X`: presence bit, then the root node in a reference.
    pub fn load_dict<K: Eq + Hash, V>(
        &mut self,
        key_len_bits: usize,
        key_reader: KeyReader<K>,
        val_reader: ValReader<V>,
    ) -> Result<HashMap<K, V>, TonCellError> {
        match self.load_maybe_cell_ref()? {
            Some(root) => {
                root.parse(|parser| parser.load_dict_data(key_len_bits, key_reader, val_reader))
            }
            None => Ok(HashMap::new()),
        }
    }

    /// Loads a `HashmapE n ^Cell` into a [`Dictionary`].
    pub fn load_dictionary(&mut self, key_len_bits: usize) -> Result<Dictionary, TonCellError> {
        match self.load_maybe_cell_ref()? {
            Some(root) => root.parse(|parser| Dictionary::parse(parser, key_len_bits)),
            None => Ok(Dictionary::new(key_len_bits)),
        }
    }

    pub fn ensure_empty(&mut self) -> Result<(), TonCellError> {
        let remaining_bits = self.remaining_bits();
        let remaining_refs = self.remaining_refs();
        if remaining_bits == 0 && remaining_refs == 0 {
            Ok(())
        } else {
            Err(TonCellError::NonEmptyReader {
                remaining_bits,
                remaining_refs,
            })
        }
    }

    pub fn skip_bits(&mut self, num_bits: usize) -> Result<(), TonCellError> {
        self.ensure_enough_bits(num_bits)?;
        self.bit_reader
            .skip(num_bits as u32)
            .map_cell_parser_error()
    }

    fn load_number<N: Numeric>(&mut self, bit_len: usize) -> Result<N, TonCellError> {
        self.ensure_enough_bits(bit_len)?;
        if bit_len == 0 {
            return Ok(N::default());
        }
        if bit_len > N::BITS_SIZE as usize {
            return Err(TonCellError::cell_parser_error(format!(
                "Can't load {} bits into {}",
                bit_len,
                std::any::type_name::<N>()
            )));
        }

        self.bit_reader
            .read::<N>(bit_len as u32)
            .map_cell_parser_error()
    }

    fn ensure_enough_bits(&mut self, bit_len: usize) -> Result<(), TonCellError> {
        let remaining = self.remaining_bits();
        if remaining < bit_len {
            return Err(TonCellError::BitsUnderflow {
                requested: bit_len,
                remaining,
            });
        }
        Ok(())
    }
}
