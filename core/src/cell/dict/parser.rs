use std::collections::HashMap;
use std::hash::Hash;

use num_bigint::BigUint;
use num_traits::One;

use super::types::LabelType;
use crate::cell::dict::{KeyReader, ValReader};
use crate::cell::{bits_for_max_value, CellParser, TonCellError};

/// Walks a `Hashmap n X` trie and collects its entries.
pub(crate) struct DictParser<K, V> {
    key_len_bits: usize,
    key_reader: KeyReader<K>,
    val_reader: ValReader<V>,
    cur_key_prefix: BigUint, // store leading 1 to determinate len properly
}

impl<K: Eq + Hash, V> DictParser<K, V> {
    pub(crate) fn new(
        key_len_bits: usize,
        key_reader: KeyReader<K>,
        val_reader: ValReader<V>,
    ) -> DictParser<K, V> {
        DictParser {
            key_len_bits,
            key_reader,
            val_reader,
            cur_key_prefix: BigUint::one(),
        }
    }

    pub(crate) fn parse(&mut self, parser: &mut CellParser) -> Result<HashMap<K, V>, TonCellError> {
        // reset state in case of reusing
        self.cur_key_prefix = BigUint::one();

        let mut result = HashMap::new();
        self.parse_impl(parser, &mut result)?;
        Ok(result)
    }

    fn parse_impl(
        &mut self,
        parser: &mut CellParser,
        dst: &mut HashMap<K, V>,
    ) -> Result<(), TonCellError> {
        // will rollback prefix to original value at the end of the function
        let origin_key_prefix_len = self.cur_key_prefix.bits();
        let key_bits_left = self.key_bits_left();
        let label_len_len = bits_for_max_value(key_bits_left);

        match self.detect_label_type(parser)? {
            LabelType::Same => {
                let prefix_val = parser.load_bit()?;
                let prefix_len = Self::load_label_len(parser, label_len_len, key_bits_left)?;
                if prefix_val {
                    self.cur_key_prefix += 1u32;
                    self.cur_key_prefix <<= prefix_len;
                    self.cur_key_prefix -= 1u32;
                } else {
                    self.cur_key_prefix <<= prefix_len;
                }
            }
            LabelType::Short => {
                let prefix_len = parser.load_unary_length()?;
                Self::ensure_label_fits(prefix_len, key_bits_left)?;
                self.append_prefix(parser, prefix_len)?;
            }
            LabelType::Long => {
                let prefix_len = Self::load_label_len(parser, label_len_len, key_bits_left)?;
                self.append_prefix(parser, prefix_len)?;
            }
        }

        if self.cur_key_prefix.bits() as usize == (self.key_len_bits + 1) {
            let mut key = BigUint::one() << self.key_len_bits;
            key ^= &self.cur_key_prefix;
            let user_key = (self.key_reader)(&key)?;
            let user_value = (self.val_reader)(parser)?;
            dst.insert(user_key, user_value);
        } else {
            let remaining_bits = parser.remaining_bits();
            let remaining_refs = parser.remaining_refs();
            if remaining_bits != 0 || remaining_refs != 2 {
                return Err(TonCellError::malformed_dict(format!(
                    "fork node must hold only its label and 2 references, \
                     found {remaining_bits} extra bits and {remaining_refs} references"
                )));
            }

            let left_ref = parser.next_reference()?;
            self.cur_key_prefix <<= 1;
            self.parse_impl(&mut left_ref.parser(), dst)?;

            let right_ref = parser.next_reference()?;
            self.cur_key_prefix += BigUint::one();
            self.parse_impl(&mut right_ref.parser(), dst)?;
        }
        self.cur_key_prefix >>= self.cur_key_prefix.bits() - origin_key_prefix_len;
        Ok(())
    }

    fn detect_label_type(&self, parser: &mut CellParser) -> Result<LabelType, TonCellError> {
        let label = if parser.load_bit()? {
            if parser.load_bit()? {
                LabelType::Same
            } else {
                LabelType::Long
            }
        } else {
            LabelType::Short
        };
        Ok(label)
    }

    fn append_prefix(
        &mut self,
        parser: &mut CellParser,
        prefix_len: usize,
    ) -> Result<(), TonCellError> {
        let val = parser.load_uint(prefix_len)?;
        self.cur_key_prefix <<= prefix_len;
        self.cur_key_prefix |= val;
        Ok(())
    }

    fn load_label_len(
        parser: &mut CellParser,
        label_len_len: usize,
        key_bits_left: usize,
    ) -> Result<usize, TonCellError> {
        let prefix_len = parser.load_u64(label_len_len)? as usize;
        Self::ensure_label_fits(prefix_len, key_bits_left)?;
        Ok(prefix_len)
    }

    fn ensure_label_fits(prefix_len: usize, key_bits_left: usize) -> Result<(), TonCellError> {
        if prefix_len > key_bits_left {
            return Err(TonCellError::malformed_dict(format!(
                "label of {prefix_len} bits exceeds {key_bits_left} remaining key bits"
            )));
        }
        Ok(())
    }

    fn key_bits_left(&self) -> usize {
        // cur_key_prefix contains leading bit
        self.key_len_bits + 1 - self.cur_key_prefix.bits() as usize
    }
}
