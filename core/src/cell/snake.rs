use std::sync::Arc;

use num_bigint::BigUint;

use crate::cell::dict::{DictKey, Dictionary};
use crate::cell::{Cell, CellBuilder, TonCellError, MAX_CELL_BITS};

/// Format tag of snake data (`tail#00`).
pub const SNAKE_DATA_TAG: u8 = 0x00;
/// Format tag of chunked data (`chunks#01`).
pub const CHUNKED_DATA_TAG: u8 = 0x01;
/// Bytes per snake cell: one byte of every cell is kept for the tag.
pub const SNAKE_CHUNK_BYTES: usize = (MAX_CELL_BITS - 8) / 8;
/// Bytes per chunk cell of the chunked layout.
pub const CHUNKED_CHUNK_BYTES: usize = MAX_CELL_BITS / 8;

const CHUNK_INDEX_BITS: usize = 32;

/// Encodes `data` as a snake chain starting with the `0x00` tag.
pub fn build_snake_cell(data: &[u8]) -> Result<Cell, TonCellError> {
    build_snake_chain(SNAKE_DATA_TAG, data)
}

/// Encodes `data` as a snake chain whose first cell starts with `tag`.
///
/// Every cell carries at most [`SNAKE_CHUNK_BYTES`] bytes and references the next one.
pub fn build_snake_chain(tag: u8, data: &[u8]) -> Result<Cell, TonCellError> {
    let mut chunks = data.chunks(SNAKE_CHUNK_BYTES).rev();
    let mut builder = CellBuilder::new();

    let first_chunk = chunks.next_back().unwrap_or_default();
    let mut next: Option<Arc<Cell>> = None;
    for chunk in chunks {
        builder.store_slice(chunk)?;
        if let Some(cell) = next.take() {
            builder.store_reference(&cell)?;
        }
        next = Some(builder.build()?.to_arc());
    }

    builder.store_u8(8, tag)?.store_slice(first_chunk)?;
    if let Some(cell) = next {
        builder.store_reference(&cell)?;
    }
    log::trace!(
        "Built snake chain of {} bytes in {} cells",
        data.len(),
        data.len().div_ceil(SNAKE_CHUNK_BYTES).max(1)
    );
    builder.build()
}

/// Encodes `data` in the chunked layout: `0x01` tag and `HashmapE 32 ^Cell` of raw chunks.
pub fn build_chunked_cell(data: &[u8]) -> Result<Cell, TonCellError> {
    let mut chunks = Dictionary::new(CHUNK_INDEX_BITS);
    for (idx, chunk) in data.chunks(CHUNKED_CHUNK_BYTES).enumerate() {
        let key = DictKey::new(CHUNK_INDEX_BITS, BigUint::from(idx))?;
        let chunk_cell = CellBuilder::new().store_slice(chunk)?.build()?;
        chunks.set(key, chunk_cell.to_arc())?;
    }
    CellBuilder::new()
        .store_u8(8, CHUNKED_DATA_TAG)?
        .store_dictionary(&chunks)?
        .build()
}

/// Decodes content data stored either as snake (`0x00`) or as chunks (`0x01`).
pub fn parse_content_data(cell: &Cell) -> Result<Vec<u8>, TonCellError> {
    let tag = read_tag(cell)?;
    match tag {
        SNAKE_DATA_TAG => cell.parse_snake_data(),
        CHUNKED_DATA_TAG => parse_chunked_data(cell),
        _ => Err(TonCellError::malformed_snake(format!(
            "unknown content data tag 0x{tag:02x}"
        ))),
    }
}

fn parse_chunked_data(cell: &Cell) -> Result<Vec<u8>, TonCellError> {
    let chunks = cell.parse_fully(|parser| {
        parser.load_u8(8)?;
        parser.load_dictionary(CHUNK_INDEX_BITS)
    })?;
    let mut buffer = Vec::new();
    for (expected_idx, (idx, chunk)) in chunks.iter().enumerate() {
        if *idx != BigUint::from(expected_idx) {
            return Err(TonCellError::malformed_snake(format!(
                "chunk #{expected_idx} is missing"
            )));
        }
        if !chunk.references().is_empty() || chunk.bit_len() % 8 != 0 {
            return Err(TonCellError::malformed_snake(format!(
                "chunk #{expected_idx} must hold whole bytes and no references"
            )));
        }
        buffer.extend_from_slice(chunk.data());
    }
    Ok(buffer)
}

fn read_tag(cell: &Cell) -> Result<u8, TonCellError> {
    cell.parser()
        .load_u8(8)
        .map_err(|_| TonCellError::malformed_snake("cell is too short for a format tag"))
}

impl Cell {
    /// Decodes a snake chain produced by [`build_snake_cell`].
    pub fn parse_snake_data(&self) -> Result<Vec<u8>, TonCellError> {
        self.parse_snake_chain(SNAKE_DATA_TAG)
    }

    /// Decodes a snake chain whose first cell starts with `tag`.
    pub fn parse_snake_chain(&self, tag: u8) -> Result<Vec<u8>, TonCellError> {
        let actual_tag = read_tag(self)?;
        if actual_tag != tag {
            return Err(TonCellError::malformed_snake(format!(
                "expected tag 0x{tag:02x}, got 0x{actual_tag:02x}"
            )));
        }

        let mut buffer = Vec::new();
        let mut cell = self;
        let mut skip_bits = 8;
        loop {
            let mut parser = cell.parser();
            parser.skip_bits(skip_bits)?;
            let remaining_bits = parser.remaining_bits();
            if remaining_bits % 8 != 0 {
                return Err(TonCellError::malformed_snake(format!(
                    "cell holds {remaining_bits} bits, not a whole number of bytes"
                )));
            }
            let mut data = parser.load_bytes(remaining_bits / 8)?;
            buffer.append(&mut data);
            match cell.references() {
                [] => return Ok(buffer),
                [next] => {
                    cell = next.as_ref();
                    skip_bits = 0;
                }
                refs => {
                    return Err(TonCellError::malformed_snake(format!(
                        "found cell with {} references",
                        refs.len()
                    )))
                }
            }
        }
    }

    /// Decodes snake data and requires it to be valid UTF-8.
    pub fn load_snake_formatted_string(&self) -> Result<String, TonCellError> {
        let bytes = self.parse_snake_data()?;
        String::from_utf8(bytes)
            .map_err(|e| TonCellError::malformed_snake(format!("invalid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn chain_len(cell: &Cell) -> usize {
        let mut len = 1;
        let mut cur = cell;
        while let Some(next) = cur.references().first() {
            len += 1;
            cur = next.as_ref();
        }
        len
    }

    #[test]
    fn snake_round_trip() -> Result<(), TonCellError> {
        for (len, cells) in [
            (0, 1),
            (1, 1),
            (126, 1),
            (127, 2),
            (128, 2),
            (252, 2),
            (253, 3),
            (1270, 11),
        ] {
            let data = sample(len);
            let cell = build_snake_cell(&data)?;
            assert_eq!(chain_len(&cell), cells, "len {len}");
            assert_eq!(cell.parse_snake_data()?, data, "len {len}");
        }
        Ok(())
    }

    #[test]
    fn snake_layout() -> Result<(), TonCellError> {
        let cell = build_snake_cell(&sample(127))?;
        assert_eq!(cell.bit_len(), 8 + 126 * 8);
        assert_eq!(cell.data()[0], SNAKE_DATA_TAG);
        let tail = cell.reference(0)?;
        assert_eq!(tail.bit_len(), 8);
        assert_eq!(tail.data(), [126u8]);
        assert!(tail.references().is_empty());

        let empty = build_snake_cell(&[])?;
        assert_eq!(empty.bit_len(), 8);
        assert_eq!(empty.data(), [SNAKE_DATA_TAG]);
        Ok(())
    }

    #[test]
    fn snake_string() -> Result<(), TonCellError> {
        let text = "Cook Token: Русский текст 中华人民共和国 😃".repeat(5);
        let cell = build_snake_cell(text.as_bytes())?;
        assert_eq!(cell.load_snake_formatted_string()?, text);

        let invalid = build_snake_cell(&[0xff, 0xfe])?;
        assert!(matches!(
            invalid.load_snake_formatted_string(),
            Err(TonCellError::MalformedSnakeChain(_))
        ));
        Ok(())
    }

    #[test]
    fn rejects_wrong_tag() -> Result<(), TonCellError> {
        let cell = CellBuilder::new().store_u8(8, 0x05)?.build()?;
        assert!(matches!(
            cell.parse_snake_data(),
            Err(TonCellError::MalformedSnakeChain(_))
        ));
        assert!(matches!(
            Cell::default().parse_snake_data(),
            Err(TonCellError::MalformedSnakeChain(_))
        ));
        Ok(())
    }

    #[test]
    fn rejects_branching_chain() -> Result<(), TonCellError> {
        let child = Arc::new(CellBuilder::new().store_u8(8, 1)?.build()?);
        let cell = CellBuilder::new()
            .store_u8(8, SNAKE_DATA_TAG)?
            .store_references(&[child.clone(), child])?
            .build()?;
        assert!(matches!(
            cell.parse_snake_data(),
            Err(TonCellError::MalformedSnakeChain(_))
        ));
        Ok(())
    }

    #[test]
    fn rejects_partial_bytes() -> Result<(), TonCellError> {
        let child = Arc::new(CellBuilder::new().store_u8(4, 1)?.build()?);
        let cell = CellBuilder::new()
            .store_u8(8, SNAKE_DATA_TAG)?
            .store_reference(&child)?
            .build()?;
        assert!(matches!(
            cell.parse_snake_data(),
            Err(TonCellError::MalformedSnakeChain(_))
        ));
        Ok(())
    }

    #[test]
    fn chunked_round_trip() -> Result<(), TonCellError> {
        for len in [0, 1, 127, 128, 600] {
            let data = sample(len);
            let cell = build_chunked_cell(&data)?;
            assert_eq!(cell.data()[0], CHUNKED_DATA_TAG);
            assert_eq!(parse_content_data(&cell)?, data, "len {len}");
        }
        let snake = build_snake_cell(&sample(300))?;
        assert_eq!(parse_content_data(&snake)?, sample(300));
        Ok(())
    }

    #[test]
    fn content_data_unknown_tag() -> Result<(), TonCellError> {
        let cell = CellBuilder::new().store_u8(8, 0x02)?.build()?;
        assert!(matches!(
            parse_content_data(&cell),
            Err(TonCellError::MalformedSnakeChain(_))
        ));
        Ok(())
    }

    #[test]
    fn chunked_with_gap() -> Result<(), TonCellError> {
        let mut chunks = Dictionary::new(32);
        let chunk = CellBuilder::new().store_slice(b"abc")?.build()?.to_arc();
        chunks.set(DictKey::new(32, BigUint::from(1u8))?, chunk)?;
        let cell = CellBuilder::new()
            .store_u8(8, CHUNKED_DATA_TAG)?
            .store_dictionary(&chunks)?
            .build()?;
        assert!(matches!(
            parse_content_data(&cell),
            Err(TonCellError::MalformedSnakeChain(_))
        ));
        Ok(())
    }
}
