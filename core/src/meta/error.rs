use thiserror::Error;

use crate::cell::TonCellError;

#[derive(Debug, Error)]
pub enum MetaDataError {
    #[error("Metadata must contain at least one non-empty field")]
    EmptyMetadata,

    #[error("Unsupported content layout (Tag: {0:#04x})")]
    UnsupportedContentLayout(u8),

    #[error("Cell error ({0})")]
    Cell(#[from] TonCellError),
}
