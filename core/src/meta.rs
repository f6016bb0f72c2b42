use lazy_static::lazy_static;
use sha2::{Digest, Sha256};

pub use error::*;
pub use jetton::*;

use crate::cell::dict::predefined_readers::{key_reader_256bit, val_reader_content_data};
use crate::cell::dict::{DictKey, Dictionary, SnakeFormatDict};
use crate::cell::{build_snake_cell, build_snake_chain, Cell, CellBuilder};
use crate::TonHash;

mod error;
mod jetton;

/// Tag of content stored in the contract data.
pub const ONCHAIN_CONTENT_TAG: u8 = 0x00;
/// Tag of content referenced by a URI.
pub const OFFCHAIN_CONTENT_TAG: u8 = 0x01;

const CONTENT_KEY_BITS: usize = 256;

pub(crate) struct MetaDataField {
    pub(crate) name: &'static str,
    pub(crate) key: TonHash,
}

impl MetaDataField {
    fn new(name: &'static str) -> MetaDataField {
        MetaDataField {
            name,
            key: Sha256::digest(name.as_bytes()).into(),
        }
    }
}

lazy_static! {
    pub(crate) static ref META_NAME: MetaDataField = MetaDataField::new("name");
    pub(crate) static ref META_DESCRIPTION: MetaDataField = MetaDataField::new("description");
    pub(crate) static ref META_IMAGE: MetaDataField = MetaDataField::new("image");
    pub(crate) static ref META_SYMBOL: MetaDataField = MetaDataField::new("symbol");
    pub(crate) static ref META_IMAGE_DATA: MetaDataField = MetaDataField::new("image_data");
    pub(crate) static ref META_DECIMALS: MetaDataField = MetaDataField::new("decimals");
    pub(crate) static ref META_URI: MetaDataField = MetaDataField::new("uri");
}

/// TEP-64 token content.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum MetaDataContent {
    /// `offchain#01 uri:Text`
    External { uri: String },
    /// `onchain#00 data:(HashmapE 256 ^ContentData)`, values already decoded.
    Internal { dict: SnakeFormatDict },
}

impl MetaDataContent {
    pub fn parse(cell: &Cell) -> Result<MetaDataContent, MetaDataError> {
        let mut parser = cell.parser();
        let tag = parser.load_u8(8)?;
        match tag {
            ONCHAIN_CONTENT_TAG => {
                let dict = parser.load_dict(
                    CONTENT_KEY_BITS,
                    key_reader_256bit,
                    val_reader_content_data,
                )?;
                parser.ensure_empty()?;
                log::debug!("Parsed on-chain content with {} fields", dict.len());
                Ok(MetaDataContent::Internal { dict })
            }
            OFFCHAIN_CONTENT_TAG => {
                let uri = cell.parse_snake_chain(OFFCHAIN_CONTENT_TAG)?;
                Ok(MetaDataContent::External {
                    uri: String::from_utf8_lossy(&uri).into_owned(),
                })
            }
            _ => Err(MetaDataError::UnsupportedContentLayout(tag)),
        }
    }

    /// Serializes the content; on-chain values are stored as snake cells.
    pub fn to_cell(&self) -> Result<Cell, MetaDataError> {
        match self {
            MetaDataContent::External { uri } => {
                Ok(build_snake_chain(OFFCHAIN_CONTENT_TAG, uri.as_bytes())?)
            }
            MetaDataContent::Internal { dict } => {
                let mut content = Dictionary::new(CONTENT_KEY_BITS);
                for (key, value) in dict {
                    content.set(DictKey::from(*key), build_snake_cell(value)?.to_arc())?;
                }
                let cell = CellBuilder::new()
                    .store_u8(8, ONCHAIN_CONTENT_TAG)?
                    .store_dictionary(&content)?
                    .build()?;
                Ok(cell)
            }
        }
    }
}
