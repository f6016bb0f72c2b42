use std::io::Cursor;

use bitstream_io::{BigEndian, BitWrite, BitWriter, ByteRead, ByteReader};
use crc::Crc;
use lazy_static::lazy_static;

use crate::cell::{MapTonCellError, TonCellError};

lazy_static! {
    pub static ref CRC_32_ISCSI: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_ISCSI);
}

/// Raw representation of Cell.
///
/// References are stored as indices in BagOfCells.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub(crate) struct RawCell {
    pub(crate) data: Vec<u8>,
    pub(crate) bit_len: usize,
    pub(crate) references: Vec<usize>,
}

/// Raw representation of BagOfCells.
///
/// `cells` must be topologically sorted.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub(crate) struct RawBagOfCells {
    pub(crate) cells: Vec<RawCell>,
    pub(crate) roots: Vec<usize>,
}

const GENERIC_BOC_MAGIC: u32 = 0xb5ee9c72;
const CRC32_BYTES: usize = 4;

impl RawBagOfCells {
    pub(crate) fn parse(serial: &[u8]) -> Result<RawBagOfCells, TonCellError> {
        let cursor = Cursor::new(serial);

        let mut reader: ByteReader<Cursor<&[u8]>, BigEndian> =
            ByteReader::endian(cursor, BigEndian);
        // serialized_boc#b5ee9c72
        let magic = reader.read::<u32>().map_boc_deserialization_error()?;
        if magic != GENERIC_BOC_MAGIC {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Unsupported cell magic number: {:#x}",
                magic
            )));
        }

        // has_idx:(## 1) has_crc32c:(## 1) has_cache_bits:(## 1) flags:(## 2) { flags = 0 }
        let header = reader.read::<u8>().map_boc_deserialization_error()?;
        let has_idx = (header >> 7) & 1 == 1;
        let has_crc32c = (header >> 6) & 1 == 1;
        // size:(## 3) { size <= 4 }
        let size = header & 0b0000_0111;
        if size == 0 || size > 4 {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Invalid reference size: {size}"
            )));
        }
        if has_crc32c {
            verify_crc32(serial)?;
        }

        //   off_bytes:(## 8) { off_bytes <= 8 }
        let off_bytes = reader.read::<u8>().map_boc_deserialization_error()?;
        if off_bytes == 0 || off_bytes > 8 {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Invalid offset size: {off_bytes}"
            )));
        }
        //cells:(##(size * 8))
        let cells = read_var_size(&mut reader, size)?;
        //   roots:(##(size * 8)) { roots >= 1 }
        let roots = read_var_size(&mut reader, size)?;
        //   absent:(##(size * 8)) { roots + absent <= cells }
        let absent = read_var_size(&mut reader, size)?;
        if absent != 0 {
            return Err(TonCellError::boc_deserialization_error(
                "Bags of cells with absent cells are not supported",
            ));
        }
        if roots == 0 || roots > cells {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Invalid root count {roots} for {cells} cells"
            )));
        }
        //   tot_cells_size:(##(off_bytes * 8))
        let _tot_cells_size = read_var_size(&mut reader, off_bytes)?;
        //   root_list:(roots * ##(size * 8))
        let mut root_list = Vec::with_capacity(roots.min(serial.len()));
        for _ in 0..roots {
            let root = read_var_size(&mut reader, size)?;
            if root >= cells {
                return Err(TonCellError::boc_deserialization_error(format!(
                    "Root index {root} is out of range"
                )));
            }
            root_list.push(root);
        }
        //   index:has_idx?(cells * ##(off_bytes * 8))
        if has_idx {
            let index_len = cells
                .checked_mul(off_bytes as usize)
                .filter(|len| *len <= serial.len())
                .ok_or_else(|| {
                    TonCellError::boc_deserialization_error(format!(
                        "Index of {cells} cells does not fit into {} bytes",
                        serial.len()
                    ))
                })?;
            reader
                .skip(index_len as u32)
                .map_boc_deserialization_error()?;
        }
        //   cell_data:(tot_cells_size * [ uint8 ])
        let mut cell_vec = Vec::with_capacity(cells.min(serial.len()));
        for _ in 0..cells {
            cell_vec.push(read_cell(&mut reader, size)?);
        }
        log::trace!("Parsed raw BoC: {} cells, {} roots", cells, roots);

        Ok(RawBagOfCells {
            cells: cell_vec,
            roots: root_list,
        })
    }

    pub(crate) fn serialize(&self, has_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        let root = match self.roots.as_slice() {
            [root] => *root as u32,
            roots => {
                return Err(TonCellError::boc_serialization_error(format!(
                    "Single root expected, got {}",
                    roots.len()
                )))
            }
        };

        let num_ref_bits = 32 - (self.cells.len() as u32).leading_zeros();
        let num_ref_bytes = num_ref_bits.div_ceil(8).max(1);

        let full_size: u32 = self
            .cells
            .iter()
            .map(|cell| raw_cell_size(cell, num_ref_bytes))
            .sum();

        let num_offset_bits = 32 - full_size.leading_zeros();
        let num_offset_bytes = num_offset_bits.div_ceil(8).max(1);

        let mut writer = BitWriter::endian(Vec::new(), BigEndian);

        writer
            .write(32, GENERIC_BOC_MAGIC)
            .map_boc_serialization_error()?;

        // has_idx = 0, has_crc32c, has_cache_bits = 0, flags = 0, size
        writer.write_bit(false).map_boc_serialization_error()?;
        writer.write_bit(has_crc32).map_boc_serialization_error()?;
        writer.write_bit(false).map_boc_serialization_error()?;
        writer.write(2, 0u8).map_boc_serialization_error()?;
        writer
            .write(3, num_ref_bytes)
            .map_boc_serialization_error()?;
        writer
            .write(8, num_offset_bytes)
            .map_boc_serialization_error()?;
        writer
            .write(8 * num_ref_bytes, self.cells.len() as u32)
            .map_boc_serialization_error()?;
        writer
            .write(8 * num_ref_bytes, 1u32)
            .map_boc_serialization_error()?;
        // complete BoCs only
        writer
            .write(8 * num_ref_bytes, 0u32)
            .map_boc_serialization_error()?;
        writer
            .write(8 * num_offset_bytes, full_size)
            .map_boc_serialization_error()?;
        writer
            .write(8 * num_ref_bytes, root)
            .map_boc_serialization_error()?;

        for cell in &self.cells {
            write_raw_cell(&mut writer, cell, num_ref_bytes)?;
        }

        let mut res = writer.into_writer();
        if has_crc32 {
            let cs = CRC_32_ISCSI.checksum(res.as_slice());
            res.extend_from_slice(cs.to_le_bytes().as_slice());
        }
        log::trace!(
            "Serialized raw BoC: {} cells, {} bytes",
            self.cells.len(),
            res.len()
        );
        Ok(res)
    }
}

fn verify_crc32(serial: &[u8]) -> Result<(), TonCellError> {
    let split = serial.len().checked_sub(CRC32_BYTES).ok_or_else(|| {
        TonCellError::boc_deserialization_error("Bag of cells is too short for crc32c")
    })?;
    let (body, crc_bytes) = serial.split_at(split);
    let mut expected = [0u8; CRC32_BYTES];
    expected.copy_from_slice(crc_bytes);
    let expected = u32::from_le_bytes(expected);
    let actual = CRC_32_ISCSI.checksum(body);
    if expected != actual {
        return Err(TonCellError::boc_deserialization_error(format!(
            "crc32c mismatch: expected {expected:#010x}, calculated {actual:#010x}"
        )));
    }
    Ok(())
}

fn read_cell(
    reader: &mut ByteReader<Cursor<&[u8]>, BigEndian>,
    size: u8,
) -> Result<RawCell, TonCellError> {
    let d1 = reader.read::<u8>().map_boc_deserialization_error()?;
    let d2 = reader.read::<u8>().map_boc_deserialization_error()?;

    let level = d1 >> 5;
    let has_hashes = (d1 & 0x10) != 0;
    let is_exotic = (d1 & 8) != 0;
    let ref_num = d1 & 0x07;
    if is_exotic || has_hashes || level != 0 {
        return Err(TonCellError::boc_deserialization_error(
            "Only ordinary cells are supported",
        ));
    }
    if ref_num > 4 {
        return Err(TonCellError::boc_deserialization_error(format!(
            "Cell with {ref_num} references"
        )));
    }
    let data_size = ((d2 >> 1) + (d2 & 1)).into();
    let full_bytes = (d2 & 0x01) == 0;

    let mut data = reader
        .read_to_vec(data_size)
        .map_boc_deserialization_error()?;

    let padding_len = match data.last_mut() {
        Some(last) if !full_bytes => {
            // completion tag: the lowest set bit of the last byte
            let num_zeros = last.trailing_zeros();
            if num_zeros >= 8 {
                return Err(TonCellError::boc_deserialization_error(
                    "Last byte of binary must not be zero if full_byte flag is not set",
                ));
            }
            *last &= !(1 << num_zeros);
            num_zeros as usize + 1
        }
        _ => 0,
    };
    let bit_len = data.len() * 8 - padding_len;
    let mut references: Vec<usize> = Vec::with_capacity(ref_num as usize);
    for _ in 0..ref_num {
        references.push(read_var_size(reader, size)?);
    }
    Ok(RawCell {
        data,
        bit_len,
        references,
    })
}

fn raw_cell_size(cell: &RawCell, ref_size_bytes: u32) -> u32 {
    let data_len = cell.bit_len.div_ceil(8);
    2 + data_len as u32 + cell.references.len() as u32 * ref_size_bytes
}

fn write_raw_cell(
    writer: &mut BitWriter<Vec<u8>, BigEndian>,
    cell: &RawCell,
    ref_size_bytes: u32,
) -> Result<(), TonCellError> {
    let d1 = cell.references.len() as u8;

    let padding_bits = cell.bit_len % 8;
    let full_bytes = padding_bits == 0;
    let data_len = cell.bit_len.div_ceil(8);
    let data = cell.data.get(..data_len).ok_or_else(|| {
        TonCellError::boc_serialization_error(format!(
            "Cell data is shorter than {} bits",
            cell.bit_len
        ))
    })?;
    // d2 is odd when the last byte is incomplete
    let d2 = (cell.bit_len / 8 + data_len) as u8;

    writer.write(8, d1).map_boc_serialization_error()?;
    writer.write(8, d2).map_boc_serialization_error()?;
    match data.split_last() {
        Some((last_byte, head)) if !full_bytes => {
            writer.write_bytes(head).map_boc_serialization_error()?;
            let last = *last_byte | (1 << (8 - padding_bits - 1));
            writer.write(8, last).map_boc_serialization_error()?;
        }
        _ => writer.write_bytes(data).map_boc_serialization_error()?,
    }

    for r in cell.references.as_slice() {
        writer
            .write(8 * ref_size_bytes, *r as u32)
            .map_boc_serialization_error()?;
    }

    Ok(())
}

fn read_var_size(
    reader: &mut ByteReader<Cursor<&[u8]>, BigEndian>,
    n: u8,
) -> Result<usize, TonCellError> {
    let bytes = reader
        .read_to_vec(n.into())
        .map_boc_deserialization_error()?;

    let mut result = 0;
    for &byte in &bytes {
        result <<= 8;
        result |= usize::from(byte);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_cell_serialize_parse() -> Result<(), TonCellError> {
        let raw = RawBagOfCells {
            cells: vec![
                RawCell {
                    data: vec![0b1010_0000],
                    bit_len: 4,
                    references: vec![1],
                },
                RawCell {
                    data: vec![0xAB, 0xCD],
                    bit_len: 16,
                    references: vec![],
                },
            ],
            roots: vec![0],
        };
        for has_crc32 in [false, true] {
            let serial = raw.serialize(has_crc32)?;
            assert_eq!(&serial[..4], &GENERIC_BOC_MAGIC.to_be_bytes());
            let parsed = RawBagOfCells::parse(&serial)?;
            assert_eq!(parsed, raw);
        }
        Ok(())
    }

    #[test]
    fn test_crc_mismatch() -> Result<(), TonCellError> {
        let raw = RawBagOfCells {
            cells: vec![RawCell {
                data: vec![0x01],
                bit_len: 8,
                references: vec![],
            }],
            roots: vec![0],
        };
        let mut serial = raw.serialize(true)?;
        let last = serial.len() - 1;
        serial[last] ^= 0xff;
        assert!(matches!(
            RawBagOfCells::parse(&serial),
            Err(TonCellError::BagOfCellsDeserializationError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_multi_root_rejected() {
        let cell = RawCell {
            data: vec![],
            bit_len: 0,
            references: vec![],
        };
        let raw = RawBagOfCells {
            cells: vec![cell.clone(), cell],
            roots: vec![0, 1],
        };
        assert!(matches!(
            raw.serialize(false),
            Err(TonCellError::BagOfCellsSerializationError(_))
        ));
    }

    #[test]
    fn test_wrong_magic() {
        let res = RawBagOfCells::parse(&[0x68, 0xff, 0x65, 0xf3, 0x01]);
        assert!(matches!(
            res,
            Err(TonCellError::BagOfCellsDeserializationError(_))
        ));
    }

    #[test]
    fn test_oversized_index_rejected() {
        // has_idx, size 4, off_bytes 8, 0xffffffff cells, 1 root, 0 absent
        let mut serial = GENERIC_BOC_MAGIC.to_be_bytes().to_vec();
        serial.extend_from_slice(&[0x84, 0x08]);
        serial.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        serial.extend_from_slice(&[0, 0, 0, 1]);
        serial.extend_from_slice(&[0, 0, 0, 0]);
        serial.extend_from_slice(&[0; 8]);
        serial.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            RawBagOfCells::parse(&serial),
            Err(TonCellError::BagOfCellsDeserializationError(_))
        ));
    }

    #[test]
    fn test_cell_with_stored_hashes_rejected() -> Result<(), TonCellError> {
        let raw = RawBagOfCells {
            cells: vec![RawCell {
                data: vec![0x01],
                bit_len: 8,
                references: vec![],
            }],
            roots: vec![0],
        };
        let mut serial = raw.serialize(false)?;
        // d1 is the first byte after the root index
        let d1_pos = serial.len() - 3;
        assert_eq!(serial[d1_pos], 0);
        serial[d1_pos] |= 0x10;
        let res = RawBagOfCells::parse(&serial);
        assert!(matches!(
            res,
            Err(TonCellError::BagOfCellsDeserializationError(ref msg))
                if msg.contains("Only ordinary cells")
        ));
        Ok(())
    }
}
