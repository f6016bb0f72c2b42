use std::collections::{BTreeMap, HashMap};

use num_bigint::BigUint;

use super::predefined_readers::key_reader_uint;
use super::predefined_writers::val_writer_ref_cell;
use super::{DictBuilder, DictParser};
use crate::cell::{ArcCell, Cell, CellParser, TonCellError};
use crate::TonHash;

/// Fixed-width unsigned dictionary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictKey {
    bit_len: usize,
    value: BigUint,
}

impl DictKey {
    pub fn new(bit_len: usize, value: BigUint) -> Result<Self, TonCellError> {
        if value.bits() as usize > bit_len {
            return Err(TonCellError::ValueOutOfRange {
                value: value.to_string(),
                bit_len,
            });
        }
        Ok(DictKey { bit_len, value })
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }
}

impl From<TonHash> for DictKey {
    fn from(hash: TonHash) -> Self {
        DictKey {
            bit_len: hash.len() * 8,
            value: BigUint::from_bytes_be(&hash),
        }
    }
}

/// `HashmapE n ^Cell`: fixed key width, values are cells stored as references of the leaves.
///
/// Entries are kept ordered, and the serialized form depends only on the entry set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    key_len_bits: usize,
    entries: BTreeMap<BigUint, ArcCell>,
}

impl Dictionary {
    pub fn new(key_len_bits: usize) -> Self {
        Dictionary {
            key_len_bits,
            entries: BTreeMap::new(),
        }
    }

    pub fn key_len_bits(&self) -> usize {
        self.key_len_bits
    }

    /// Inserts or overwrites an entry, returning the previous value.
    pub fn set(&mut self, key: DictKey, value: ArcCell) -> Result<Option<ArcCell>, TonCellError> {
        self.check_key(&key)?;
        Ok(self.entries.insert(key.value, value))
    }

    pub fn get(&self, key: &DictKey) -> Option<&ArcCell> {
        if key.bit_len != self.key_len_bits {
            return None;
        }
        self.entries.get(&key.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&BigUint, &ArcCell)> {
        self.entries.iter()
    }

    pub fn to_map(&self) -> HashMap<BigUint, ArcCell> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Root cell of the `Hashmap n ^Cell` trie. Fails for an empty dictionary,
    /// which has no root; use `CellBuilder::store_dictionary` for the `HashmapE` form.
    pub fn serialize(&self) -> Result<Cell, TonCellError> {
        if self.is_empty() {
            return Err(TonCellError::InvalidInput(
                "Empty dictionary has no root cell".to_string(),
            ));
        }
        DictBuilder::new(self.key_len_bits, val_writer_ref_cell, self.to_map())?.build()
    }

    /// Rebuilds a dictionary from the root node at the parser position.
    pub fn parse(parser: &mut CellParser, key_len_bits: usize) -> Result<Self, TonCellError> {
        let mut dict_parser = DictParser::new(key_len_bits, key_reader_uint, val_reader_leaf_ref);
        let entries = dict_parser.parse(parser)?;
        Ok(Dictionary {
            key_len_bits,
            entries: entries.into_iter().collect(),
        })
    }

    fn check_key(&self, key: &DictKey) -> Result<(), TonCellError> {
        if key.bit_len != self.key_len_bits {
            return Err(TonCellError::KeyWidthMismatch {
                expected: self.key_len_bits,
                actual: key.bit_len,
            });
        }
        Ok(())
    }
}

fn val_reader_leaf_ref(parser: &mut CellParser) -> Result<ArcCell, TonCellError> {
    let value = parser
        .next_reference()
        .map_err(|_| TonCellError::malformed_dict("leaf has no value reference"))?;
    parser
        .ensure_empty()
        .map_err(|e| TonCellError::malformed_dict(format!("unexpected leaf content: {e}")))?;
    Ok(value)
}
