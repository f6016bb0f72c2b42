use std::fmt;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::io;
use std::sync::Arc;

pub use bag_of_cells::*;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bitstream_io::{BigEndian, BitWrite, BitWriter};
pub use builder::*;
pub use error::*;
use lazy_static::lazy_static;
pub use parser::*;
pub use raw::*;
use sha2::{Digest, Sha256};
pub use snake::*;
pub use state_init::*;
pub use util::*;

use crate::types::DEFAULT_CELL_HASH;
use crate::TonHash;

mod bag_of_cells;
mod builder;
pub mod dict;
mod error;
mod parser;
mod raw;
mod raw_boc_from_boc;
mod snake;
mod state_init;
mod util;

pub const MAX_CELL_BITS: usize = 1023;
pub const MAX_CELL_REFERENCES: usize = 4;

const DEPTH_BYTES: usize = 2;

pub type ArcCell = Arc<Cell>;

lazy_static! {
    pub static ref EMPTY_CELL: Cell = Cell::default();
    pub static ref EMPTY_ARC_CELL: ArcCell = Arc::new(Cell::default());
}

/// Ordinary TON cell: up to 1023 data bits and up to 4 child references.
///
/// Cells are immutable once built. Representation hash and depth are computed
/// in [`Cell::new`], which is also the only place limits are validated.
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<ArcCell>,
    hash: TonHash,
    depth: u16,
}

impl Cell {
    pub fn new(
        mut data: Vec<u8>,
        bit_len: usize,
        references: Vec<ArcCell>,
    ) -> Result<Self, TonCellError> {
        if bit_len > MAX_CELL_BITS {
            return Err(TonCellError::BitsOverflow { bit_len });
        }
        if references.len() > MAX_CELL_REFERENCES {
            return Err(TonCellError::RefsOverflow {
                ref_count: references.len(),
            });
        }
        let byte_len = bit_len.div_ceil(8);
        if data.len() < byte_len {
            return Err(TonCellError::InvalidCellData(format!(
                "{} bytes of data can't hold {} bits",
                data.len(),
                bit_len
            )));
        }
        data.truncate(byte_len);
        let rest_bits = bit_len % 8;
        if rest_bits != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xffu8 << (8 - rest_bits);
            }
        }

        let depth = references
            .iter()
            .map(|reference| reference.depth + 1)
            .max()
            .unwrap_or(0);
        let hash = calculate_hash(&data, bit_len, &references)?;

        Ok(Self {
            data,
            bit_len,
            references,
            hash,
            depth,
        })
    }

    pub fn parser(&self) -> CellParser {
        CellParser::new(self.bit_len, &self.data, &self.references)
    }

    pub fn parse<F, T>(&self, parse: F) -> Result<T, TonCellError>
    where
        F: FnOnce(&mut CellParser) -> Result<T, TonCellError>,
    {
        let mut parser = self.parser();
        parse(&mut parser)
    }

    /// Same as [`Cell::parse`], but fails if any bit or reference is left unread.
    pub fn parse_fully<F, T>(&self, parse: F) -> Result<T, TonCellError>
    where
        F: FnOnce(&mut CellParser) -> Result<T, TonCellError>,
    {
        let mut reader = self.parser();
        let res = parse(&mut reader)?;
        reader.ensure_empty()?;
        Ok(res)
    }

    pub fn reference(&self, idx: usize) -> Result<&ArcCell, TonCellError> {
        self.references
            .get(idx)
            .ok_or(TonCellError::RefsUnderflow {
                idx,
                ref_count: self.references.len(),
            })
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn references(&self) -> &[ArcCell] {
        self.references.as_slice()
    }

    pub fn cell_depth(&self) -> u16 {
        self.depth
    }

    pub fn cell_hash(&self) -> TonHash {
        self.hash
    }

    pub fn cell_hash_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.cell_hash())
    }

    pub fn to_arc(self) -> ArcCell {
        Arc::new(self)
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Trailing underscore only marks an incomplete last byte,
        // the completion bit itself is not printed.
        let completion_tag = if self.bit_len % 8 != 0 { "_" } else { "" };
        writeln!(
            f,
            "Cell x{{ data: [{}{}]\n, bit_len: {}\n, references: [",
            hex::encode_upper(&self.data),
            completion_tag,
            self.bit_len,
        )?;

        for reference in &self.references {
            writeln!(
                f,
                "    {}\n",
                format!("{:?}", reference).replace('\n', "\n    ")
            )?;
        }

        write!(
            f,
            "]\n hash: {}\n depth: {}\n }}",
            hex::encode_upper(self.hash),
            self.depth
        )
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            data: Default::default(),
            bit_len: Default::default(),
            references: Default::default(),
            hash: DEFAULT_CELL_HASH,
            depth: Default::default(),
        }
    }
}

/// Standard cell representation, see https://docs.ton.org/tvm.pdf 3.1.4
fn get_repr(data: &[u8], bit_len: usize, refs: &[ArcCell]) -> Result<Vec<u8>, TonCellError> {
    let buffer_len = 2 + data.len() + (32 + DEPTH_BYTES) * refs.len();

    let mut writer = BitWriter::endian(Vec::with_capacity(buffer_len), BigEndian);
    let d1 = get_refs_descriptor(refs)?;
    let d2 = get_bits_descriptor(bit_len)?;

    writer.write(8, d1).map_cell_builder_error()?;
    writer.write(8, d2).map_cell_builder_error()?;
    write_data(&mut writer, data, bit_len).map_cell_builder_error()?;
    for reference in refs {
        writer
            .write(16, reference.cell_depth())
            .map_cell_builder_error()?;
    }
    for reference in refs {
        writer
            .write_bytes(&reference.cell_hash())
            .map_cell_builder_error()?;
    }

    writer
        .writer()
        .ok_or_else(|| TonCellError::cell_builder_error("Stream for cell repr is not byte-aligned"))
        .map(|b| b.to_vec())
}

fn calculate_hash(
    data: &[u8],
    bit_len: usize,
    references: &[ArcCell],
) -> Result<TonHash, TonCellError> {
    let repr = get_repr(data, bit_len, references)?;
    Sha256::new_with_prefix(repr).finalize()[..]
        .try_into()
        .map_err(|error| {
            TonCellError::InternalError(format!(
                "Can't get [u8; 32] from finalized hash with error: {error}"
            ))
        })
}

/// d1 descriptor of an ordinary cell: reference count, level 0.
fn get_refs_descriptor(references: &[ArcCell]) -> Result<u8, TonCellError> {
    if references.len() > MAX_CELL_REFERENCES {
        Err(TonCellError::InvalidCellData(
            "Cell should not contain more than 4 references".to_string(),
        ))
    } else {
        Ok(references.len() as u8)
    }
}

/// d2 descriptor: floor(b/8) + ceil(b/8).
fn get_bits_descriptor(bit_len: usize) -> Result<u8, TonCellError> {
    if bit_len > MAX_CELL_BITS {
        Err(TonCellError::InvalidCellData(
            "Cell data length should not contain more than 1023 bits".to_string(),
        ))
    } else {
        let d2 = (bit_len / 8 + bit_len.div_ceil(8)) as u8;
        Ok(d2)
    }
}

fn write_data(
    writer: &mut BitWriter<Vec<u8>, BigEndian>,
    data: &[u8],
    bit_len: usize,
) -> Result<(), io::Error> {
    let rest_bits = bit_len % 8;

    match data.split_last() {
        Some((last_byte, full)) if rest_bits != 0 => {
            writer.write_bytes(full)?;
            let last = *last_byte | (1 << (8 - rest_bits - 1));
            writer.write(8, last)?;
        }
        _ => writer.write_bytes(data)?,
    }

    Ok(())
}
