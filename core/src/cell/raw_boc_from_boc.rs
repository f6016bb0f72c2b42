use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cell::{ArcCell, BagOfCells, RawBagOfCells, RawCell, TonCellError};
use crate::TonHash;

/// Flattens the cell graph into raw cells.
///
/// Each distinct cell (by hash) is stored once, and cells are ordered so that
/// every reference points to a later index. A single root gets index 0.
pub(crate) fn convert_to_raw_boc(boc: &BagOfCells) -> Result<RawBagOfCells, TonCellError> {
    let mut post_order: Vec<ArcCell> = Vec::new();
    let mut visited: HashSet<TonHash> = HashSet::new();
    for root in boc.roots.iter().rev() {
        visit(root, &mut visited, &mut post_order);
    }
    post_order.reverse();

    let index_by_hash: HashMap<TonHash, usize> = post_order
        .iter()
        .enumerate()
        .map(|(index, cell)| (cell.cell_hash(), index))
        .collect();

    let cells = post_order
        .iter()
        .map(|cell| {
            let references = cell
                .references()
                .iter()
                .map(|r| index_of(&index_by_hash, r))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RawCell {
                data: cell.data().to_vec(),
                bit_len: cell.bit_len(),
                references,
            })
        })
        .collect::<Result<Vec<_>, TonCellError>>()?;

    let roots = boc
        .roots
        .iter()
        .map(|root| index_of(&index_by_hash, root))
        .collect::<Result<Vec<_>, _>>()?;

    log::trace!(
        "Indexed {} unique cells for {} roots",
        cells.len(),
        roots.len()
    );
    Ok(RawBagOfCells { cells, roots })
}

fn visit(cell: &ArcCell, visited: &mut HashSet<TonHash>, post_order: &mut Vec<ArcCell>) {
    if !visited.insert(cell.cell_hash()) {
        return;
    }
    // reversed so that after the final reverse the first reference comes first
    for reference in cell.references().iter().rev() {
        visit(reference, visited, post_order);
    }
    post_order.push(Arc::clone(cell));
}

fn index_of(
    index_by_hash: &HashMap<TonHash, usize>,
    cell: &ArcCell,
) -> Result<usize, TonCellError> {
    let hash = cell.cell_hash();
    index_by_hash.get(&hash).copied().ok_or_else(|| {
        TonCellError::boc_serialization_error(format!(
            "Couldn't find cell with hash {} while building the index",
            hex::encode(hash)
        ))
    })
}
