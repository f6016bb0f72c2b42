use thiserror::Error;

use crate::types::TonHashParseError;

#[derive(Error, Debug)]
pub enum TonCellError {
    // capacity
    #[error("Cell capacity exceeded: {bit_len} bits, limit is 1023")]
    BitsOverflow { bit_len: usize },

    #[error("Cell capacity exceeded: {ref_count} references, limit is 4")]
    RefsOverflow { ref_count: usize },

    #[error("Value {value} does not fit into {bit_len} bits")]
    ValueOutOfRange { value: String, bit_len: usize },

    // reading
    #[error("Cell has {remaining} bits left, {requested} requested")]
    BitsUnderflow { requested: usize, remaining: usize },

    #[error("Cell has {ref_count} references, reference #{idx} requested")]
    RefsUnderflow { idx: usize, ref_count: usize },

    #[error("Cell not fully consumed: {remaining_bits} bits and {remaining_refs} references left")]
    NonEmptyReader {
        remaining_bits: usize,
        remaining_refs: usize,
    },

    #[error("Unsupported address tag {0}")]
    InvalidAddressType(u8),

    #[error("Invalid cell data: {0}")]
    InvalidCellData(String),

    // structures
    #[error("Dictionary key is {actual} bits wide, dictionary uses {expected}")]
    KeyWidthMismatch { expected: usize, actual: usize },

    #[error("Malformed dictionary: {0}")]
    MalformedDictionary(String),

    #[error("Malformed snake chain: {0}")]
    MalformedSnakeChain(String),

    // bag of cells
    #[error("Bag of cells deserialization failed: {0}")]
    BagOfCellsDeserializationError(String),

    #[error("Bag of cells serialization failed: {0}")]
    BagOfCellsSerializationError(String),

    // bit stream and misc
    #[error("Cell builder failed: {0}")]
    CellBuilderError(String),

    #[error("Cell parser failed: {0}")]
    CellParserError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    TonHashParseError(#[from] TonHashParseError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

macro_rules! message_ctor {
    ($($name:ident => $variant:ident),* $(,)?) => {
        impl TonCellError {
            $(
                pub fn $name<T: ToString>(e: T) -> TonCellError {
                    TonCellError::$variant(e.to_string())
                }
            )*
        }
    };
}

message_ctor! {
    boc_serialization_error => BagOfCellsSerializationError,
    boc_deserialization_error => BagOfCellsDeserializationError,
    cell_builder_error => CellBuilderError,
    cell_parser_error => CellParserError,
    malformed_dict => MalformedDictionary,
    malformed_snake => MalformedSnakeChain,
}

/// Wraps foreign errors (bit stream I/O, base64, hex) into [`TonCellError`].
pub trait MapTonCellError<R> {
    fn map_boc_deserialization_error(self) -> Result<R, TonCellError>;
    fn map_boc_serialization_error(self) -> Result<R, TonCellError>;
    fn map_cell_builder_error(self) -> Result<R, TonCellError>;
    fn map_cell_parser_error(self) -> Result<R, TonCellError>;
}

impl<R, E: std::error::Error> MapTonCellError<R> for Result<R, E> {
    fn map_boc_deserialization_error(self) -> Result<R, TonCellError> {
        self.map_err(TonCellError::boc_deserialization_error)
    }

    fn map_boc_serialization_error(self) -> Result<R, TonCellError> {
        self.map_err(TonCellError::boc_serialization_error)
    }

    fn map_cell_builder_error(self) -> Result<R, TonCellError> {
        self.map_err(TonCellError::cell_builder_error)
    }

    fn map_cell_parser_error(self) -> Result<R, TonCellError> {
        self.map_err(TonCellError::cell_parser_error)
    }
}
