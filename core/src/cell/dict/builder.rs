use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use super::leading_bit_utils::{
    add_leading_bit, all_bits_same, common_prefix_len, remove_leading_bit,
};
use super::types::LabelType;
use crate::cell::dict::ValWriter;
use crate::cell::{bits_for_max_value, Cell, CellBuilder, TonCellError};

/// Serializes a map into a `Hashmap n X` root cell.
///
/// Keys are sorted up front, so the produced trie depends only on the set of entries.
pub(crate) struct DictBuilder<V> {
    key_len_bits: usize,
    value_writer: ValWriter<V>,
    // sorted by key; taken out when the leaf is written
    values: Vec<Option<V>>,
    // marked keys, same order as `values`
    keys: Vec<BigUint>,
}

// Position in `values` paired with the not yet consumed key bits (marked).
type PendingKey = (usize, BigUint);

impl<V> DictBuilder<V> {
    pub(crate) fn new<K>(
        key_len_bits: usize,
        value_writer: ValWriter<V>,
        data: HashMap<K, V>,
    ) -> Result<Self, TonCellError>
    where
        BigUint: From<K>,
    {
        let mut entries = data
            .into_iter()
            .map(|(key, value)| Ok((mark_key(key_len_bits, key)?, value)))
            .collect::<Result<Vec<_>, TonCellError>>()?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let (keys, values) = entries
            .into_iter()
            .map(|(key, value)| (key, Some(value)))
            .unzip();

        Ok(DictBuilder {
            key_len_bits,
            value_writer,
            values,
            keys,
        })
    }

    /// Builds the root node. An empty map produces an empty cell.
    pub(crate) fn build(mut self) -> Result<Cell, TonCellError> {
        let mut root = CellBuilder::new();
        if !self.keys.is_empty() {
            let pending = self.keys.iter().cloned().enumerate().collect();
            self.write_node(&mut root, pending, self.key_len_bits)?;
        }
        root.build()
    }

    fn write_node(
        &mut self,
        builder: &mut CellBuilder,
        pending: Vec<PendingKey>,
        bits_left: usize,
    ) -> Result<(), TonCellError> {
        let (first, last) = match pending.as_slice() {
            [] => {
                return Err(TonCellError::InternalError(
                    "Dictionary node without keys".to_string(),
                ))
            }
            [(pos, key)] => return self.write_leaf(builder, *pos, key, bits_left),
            [(_, first), .., (_, last)] => (first, last),
        };

        let prefix_len = common_prefix_len(first, last);
        let label = first >> (bits_left - prefix_len);
        write_label(builder, &label, bits_left)?;

        // the fork bit follows the label; what remains after it is re-marked
        let rest_len = bits_left - prefix_len - 1;
        let rest_mask = (BigUint::one() << rest_len) - 1u32;
        let fork_bit = BigUint::one() << rest_len;
        let mut left = Vec::with_capacity(pending.len() / 2);
        let mut right = Vec::with_capacity(pending.len() / 2);
        for (pos, key) in pending {
            let rest = add_leading_bit(&(&key & &rest_mask), rest_len);
            if (&key & &fork_bit).is_zero() {
                left.push((pos, rest));
            } else {
                right.push((pos, rest));
            }
        }

        for branch in [left, right] {
            let mut child = CellBuilder::new();
            self.write_node(&mut child, branch, rest_len)?;
            builder.store_child(child.build()?)?;
        }
        Ok(())
    }

    fn write_leaf(
        &mut self,
        builder: &mut CellBuilder,
        pos: usize,
        label: &BigUint,
        bits_left: usize,
    ) -> Result<(), TonCellError> {
        write_label(builder, label, bits_left)?;
        let value = self
            .values
            .get_mut(pos)
            .and_then(Option::take)
            .ok_or_else(|| TonCellError::InternalError(format!("No value for key #{pos}")))?;
        (self.value_writer)(builder, value)
    }
}

/// Writes the shortest `HmLabel` for a marked `label`; ties prefer short, then long.
fn write_label(
    builder: &mut CellBuilder,
    label: &BigUint,
    bits_left: usize,
) -> Result<(), TonCellError> {
    if label.is_zero() {
        return Err(TonCellError::InternalError(
            "Dictionary label must carry a leading bit".to_string(),
        ));
    }
    let len = label.bits() as usize - 1;
    let len_bits = bits_for_max_value(bits_left);
    let bits = remove_leading_bit(label);

    let short_cost = 2 + 2 * len;
    let long_cost = 2 + len_bits + len;
    let same_cost = 3 + len_bits;

    let mut label_type = if long_cost < short_cost {
        LabelType::Long
    } else {
        LabelType::Short
    };
    if same_cost < short_cost.min(long_cost) && all_bits_same(label) {
        label_type = LabelType::Same;
    }

    match label_type {
        LabelType::Short => {
            // hml_short$0 len:(Unary ~n) s:(n * Bit)
            builder.store_bit(false)?;
            for _ in 0..len {
                builder.store_bit(true)?;
            }
            builder.store_bit(false)?;
            builder.store_uint(len, &bits)?;
        }
        LabelType::Long => {
            // hml_long$10 n:(#<= m) s:(n * Bit)
            builder.store_bit(true)?.store_bit(false)?;
            builder.store_u32(len_bits, len as u32)?;
            builder.store_uint(len, &bits)?;
        }
        LabelType::Same => {
            // hml_same$11 v:Bit n:(#<= m)
            builder.store_bit(true)?.store_bit(true)?;
            builder.store_bit(!bits.is_zero())?;
            builder.store_u32(len_bits, len as u32)?;
        }
    }
    Ok(())
}

fn mark_key<K>(key_len_bits: usize, key: K) -> Result<BigUint, TonCellError>
where
    BigUint: From<K>,
{
    let key = BigUint::from(key);
    if key.bits() as usize > key_len_bits {
        return Err(TonCellError::ValueOutOfRange {
            value: key.to_string(),
            bit_len: key_len_bits,
        });
    }
    Ok(add_leading_bit(&key, key_len_bits))
}
