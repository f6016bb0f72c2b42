use std::io;

use bitstream_io::{BitRead, BitReader, Endianness};

use crate::cell::{MapTonCellError, TonCellError};

pub trait BitReadExt {
    /// Reads `num_bits` into `slice`, left-aligned; unused low bits of the last byte are zero.
    fn read_bits(&mut self, num_bits: usize, slice: &mut [u8]) -> Result<(), TonCellError>;
}

impl<R: io::Read, E: Endianness> BitReadExt for BitReader<R, E> {
    fn read_bits(&mut self, num_bits: usize, slice: &mut [u8]) -> Result<(), TonCellError> {
        let total_bytes = num_bits.div_ceil(8);
        if total_bytes > slice.len() {
            let msg = format!(
                "Attempt to read {} bits into buffer {} bytes",
                num_bits,
                slice.len()
            );
            return Err(TonCellError::CellParserError(msg));
        }
        let full_bytes = num_bits / 8;
        self.read_bytes(&mut slice[0..full_bytes])
            .map_cell_parser_error()?;
        let last_byte_len = num_bits % 8;
        if last_byte_len != 0 {
            let last_byte = self
                .read::<u8>(last_byte_len as u32)
                .map_cell_parser_error()?;
            slice[full_bytes] = last_byte << (8 - last_byte_len);
        }
        Ok(())
    }
}

/// Number of bits needed to store any value in `0..=max_value`, i.e. `ceil(log2(max_value + 1))`.
pub fn bits_for_max_value(max_value: usize) -> usize {
    (usize::BITS - max_value.leading_zeros()) as usize
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bitstream_io::{BigEndian, BitReader};

    use super::{bits_for_max_value, BitReadExt};

    #[test]
    fn test_read_bits() {
        let data = [0b1100_1100u8, 0b1010_1010];
        let mut reader = BitReader::endian(Cursor::new(&data[..]), BigEndian);
        let mut dst = [0u8; 2];
        reader.read_bits(11, &mut dst).unwrap();
        assert_eq!(dst, [0b1100_1100, 0b1010_0000]);

        let mut small = [0u8; 1];
        let mut reader = BitReader::endian(Cursor::new(&data[..]), BigEndian);
        assert!(reader.read_bits(9, &mut small).is_err());
    }

    #[test]
    fn test_bits_for_max_value() {
        assert_eq!(bits_for_max_value(0), 0);
        assert_eq!(bits_for_max_value(1), 1);
        assert_eq!(bits_for_max_value(2), 2);
        assert_eq!(bits_for_max_value(3), 2);
        assert_eq!(bits_for_max_value(4), 3);
        assert_eq!(bits_for_max_value(255), 8);
        assert_eq!(bits_for_max_value(256), 9);
    }
}
