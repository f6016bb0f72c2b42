//! Dictionary keys are handled as `BigUint` with one extra marker bit set above the
//! most significant key bit, so that leading zeros of the key are not lost.
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Expects the marker bit; true when every key bit below it is the same.
pub(super) fn all_bits_same(val: &BigUint) -> bool {
    if val.bits() <= 1 {
        return true;
    }
    let key_bits = val.bits() - 1;
    let key = remove_leading_bit(val);
    key.is_zero() || (key.bits() == key_bits && key.count_ones() == key_bits)
}

/// Length of the common prefix of two marked keys of equal length, marker excluded.
pub(super) fn common_prefix_len(a: &BigUint, b: &BigUint) -> usize {
    let xor = a ^ b;
    (a.bits() - xor.bits() - 1) as usize
}

pub(super) fn remove_leading_bit(val: &BigUint) -> BigUint {
    if val.is_zero() {
        return BigUint::zero();
    }
    let mask = BigUint::one() << (val.bits() - 1);
    val ^ mask
}

/// Sets the marker bit above a key of `val_bit_len` bits.
pub(super) fn add_leading_bit(val: &BigUint, val_bit_len: usize) -> BigUint {
    let leading_bit = BigUint::one() << val_bit_len;
    leading_bit | val
}
