use std::cmp::max;

use num_bigint::BigUint;

use crate::cell::{ArcCell, CellBuilder, TonCellError};

pub fn val_writer_ref_cell(builder: &mut CellBuilder, val: ArcCell) -> Result<(), TonCellError> {
    builder.store_reference(&val)?;
    Ok(())
}

/// Stores the value in the fewest bits that hold it, at least one.
pub fn val_writer_unsigned_min_size<V>(
    builder: &mut CellBuilder,
    val: V,
) -> Result<(), TonCellError>
where
    BigUint: From<V>,
{
    let internal_val = BigUint::from(val);
    let len_bits = max(1, internal_val.bits()) as usize;
    builder.store_uint(len_bits, &internal_val)?;
    Ok(())
}

/// Stores the bytes as a snake cell referenced from the leaf.
pub fn val_writer_snake_data(builder: &mut CellBuilder, val: Vec<u8>) -> Result<(), TonCellError> {
    let snake = crate::cell::build_snake_cell(&val)?;
    builder.store_child(snake)?;
    Ok(())
}
