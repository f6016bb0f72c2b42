use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cell::raw_boc_from_boc::convert_to_raw_boc;
use crate::cell::{ArcCell, Cell, MapTonCellError, RawBagOfCells, TonCellError};

/// Standard bag-of-cells envelope around one or more root cells.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct BagOfCells {
    pub roots: Vec<ArcCell>,
}

impl BagOfCells {
    pub fn new(roots: &[ArcCell]) -> BagOfCells {
        BagOfCells {
            roots: roots.to_vec(),
        }
    }

    pub fn from_root(root: Cell) -> BagOfCells {
        BagOfCells {
            roots: vec![Arc::new(root)],
        }
    }

    pub fn num_roots(&self) -> usize {
        self.roots.len()
    }

    pub fn root(&self, idx: usize) -> Result<&ArcCell, TonCellError> {
        self.roots.get(idx).ok_or_else(|| {
            TonCellError::boc_deserialization_error(format!(
                "Invalid root index: {}, BoC contains {} roots",
                idx,
                self.roots.len()
            ))
        })
    }

    pub fn single_root(mut self) -> Result<ArcCell, TonCellError> {
        match (self.roots.pop(), self.roots.is_empty()) {
            (Some(root), true) => Ok(root),
            (popped, _) => {
                let roots_count = self.roots.len() + usize::from(popped.is_some());
                Err(TonCellError::CellParserError(format!(
                    "Single root expected, got {roots_count}"
                )))
            }
        }
    }

    pub fn parse(serial: &[u8]) -> Result<BagOfCells, TonCellError> {
        let raw = RawBagOfCells::parse(serial)?;
        let num_cells = raw.cells.len();
        let mut cells: Vec<ArcCell> = Vec::with_capacity(num_cells);

        // cells are built from the last one, so `cells` is reversed
        for (cell_index, raw_cell) in raw.cells.into_iter().enumerate().rev() {
            let mut references = Vec::with_capacity(raw_cell.references.len());
            for &ref_index in &raw_cell.references {
                if ref_index <= cell_index || ref_index >= num_cells {
                    return Err(TonCellError::boc_deserialization_error(format!(
                        "Cell #{cell_index} references cell #{ref_index}, \
                         only later cells may be referenced"
                    )));
                }
                references.push(Arc::clone(&cells[num_cells - 1 - ref_index]));
            }

            let cell = Cell::new(raw_cell.data, raw_cell.bit_len, references)
                .map_boc_deserialization_error()?;
            cells.push(cell.to_arc());
        }

        let roots = raw
            .roots
            .into_iter()
            .map(|r| Arc::clone(&cells[num_cells - 1 - r]))
            .collect();

        Ok(BagOfCells { roots })
    }

    pub fn parse_hex(hex: &str) -> Result<BagOfCells, TonCellError> {
        let str: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
        let bin = hex::decode(str.as_str()).map_boc_deserialization_error()?;
        Self::parse(&bin)
    }

    pub fn parse_base64(base64: &str) -> Result<BagOfCells, TonCellError> {
        let bin = STANDARD.decode(base64).map_boc_deserialization_error()?;
        Self::parse(&bin)
    }

    pub fn serialize(&self, has_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        let raw = convert_to_raw_boc(self)?;
        raw.serialize(has_crc32)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::assert_ok;

    use super::BagOfCells;
    use crate::cell::{Cell, CellBuilder, TonCellError};

    const DICT_BOC: &str = "te6cckEBBgEAWgABGccNPKUADZm5MepOjMABAgHNAgMCASAEBQAnQAAAAAAAAAAAAAABMlF4tR2RgCAAJgAAAAAAAAAAAAABaFhaZZhr6AAAJgAAAAAAAAAAAAAAR8sYU4eC4AA1PIC5";

    fn sample_tree() -> Result<Cell, TonCellError> {
        let shared = CellBuilder::new().store_u32(32, 0xDEADBEEF)?.build()?.to_arc();
        let middle = CellBuilder::new()
            .store_u8(3, 5)?
            .store_reference(&shared)?
            .build()?
            .to_arc();
        CellBuilder::new()
            .store_u16(16, 0x1234)?
            .store_reference(&shared)?
            .store_reference(&middle)?
            .build()
    }

    #[test]
    fn round_trip_preserves_root_hash() -> Result<(), TonCellError> {
        let root = sample_tree()?;
        for has_crc32 in [false, true] {
            let serial = BagOfCells::from_root(root.clone()).serialize(has_crc32)?;
            let parsed = BagOfCells::parse(&serial)?.single_root()?;
            assert_eq!(parsed.cell_hash(), root.cell_hash());
            assert_eq!(parsed.as_ref(), &root);
        }
        Ok(())
    }

    #[test]
    fn shared_subtree_stored_once() -> Result<(), TonCellError> {
        let root = sample_tree()?;
        let serial = BagOfCells::from_root(root).serialize(false)?;
        // magic, flags and size, offset size, then `cells` with 1 byte width
        assert_eq!(serial[4] & 0x07, 1);
        assert_eq!(serial[6], 3);
        Ok(())
    }

    #[test]
    fn parse_blockchain_boc() -> anyhow::Result<()> {
        let boc = assert_ok!(BagOfCells::parse_base64(DICT_BOC));
        let root = boc.single_root()?;
        assert_eq!(root.references().len(), 1);
        let serial = BagOfCells::from_root(root.as_ref().clone()).serialize(true)?;
        let reparsed = BagOfCells::parse(&serial)?.single_root()?;
        assert_eq!(reparsed.cell_hash(), root.cell_hash());
        Ok(())
    }

    #[test]
    fn parse_hex_ignores_whitespace() -> anyhow::Result<()> {
        let cell = CellBuilder::new().store_u8(8, 0xAB)?.build()?;
        let serial = BagOfCells::from_root(cell.clone()).serialize(true)?;
        let hex_str = hex::encode(serial)
            .as_bytes()
            .chunks(8)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join(" \n");
        let parsed = BagOfCells::parse_hex(&hex_str)?.single_root()?;
        assert_eq!(parsed.as_ref(), &cell);
        Ok(())
    }

    #[test]
    fn single_root_requires_one_root() -> Result<(), TonCellError> {
        let cell = Arc::new(Cell::default());
        assert!(BagOfCells::new(&[]).single_root().is_err());
        assert!(BagOfCells::new(&[cell.clone(), cell.clone()])
            .single_root()
            .is_err());
        assert!(BagOfCells::new(&[cell.clone(), cell])
            .serialize(false)
            .is_err());
        Ok(())
    }

    #[test]
    fn rejects_backward_reference() {
        // two cells, the second one references the first
        let serial = [
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x02, 0x01, 0x00, 0x05, 0x00, // header
            0x00, 0x00, // cell #0: empty
            0x01, 0x00, 0x00, // cell #1: one ref to #0
        ];
        assert!(matches!(
            BagOfCells::parse(&serial),
            Err(TonCellError::BagOfCellsDeserializationError(_))
        ));
    }

    #[test]
    fn rejects_exotic_cell() {
        let serial = [
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x03, 0x00, // header
            0x08, 0x02, 0x01, // exotic cell with one byte
        ];
        assert!(matches!(
            BagOfCells::parse(&serial),
            Err(TonCellError::BagOfCellsDeserializationError(_))
        ));
    }
}
