use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::dict::SnakeFormatDict;
use crate::cell::Cell;
use crate::meta::*;

/// Decimals used when the metadata does not specify them.
pub const DEFAULT_DECIMALS: &str = "9";

#[derive(Serialize, PartialEq, Eq, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct JettonMetaData {
    ///Optional. UTF8 string. The name of the token - e.g. "Example Coin".
    pub name: Option<String>,
    ///Optional. ASCII string. A URI pointing to JSON document with metadata.
    pub uri: Option<String>,
    ///Optional. UTF8 string. The symbol of the token - e.g. "XMPL".
    pub symbol: Option<String>,
    ///Optional. UTF8 string. Describes the token.
    pub description: Option<String>,
    ///Optional. ASCII string. A URI pointing to a jetton icon.
    pub image: Option<String>,
    ///Optional. Binary representation of the image.
    pub image_data: Option<Vec<u8>>,
    ///Optional. UTF8 encoded number of decimals, "9" when not specified.
    pub decimals: Option<String>,
}

impl JettonMetaData {
    /// Builds the on-chain content cell.
    ///
    /// Absent and empty fields are not stored. Decimals fall back to
    /// [`DEFAULT_DECIMALS`], but that alone doesn't make the metadata non-empty.
    pub fn to_content_cell(&self) -> Result<Cell, MetaDataError> {
        let mut dict: SnakeFormatDict = HashMap::new();
        let text_fields = [
            (&*META_NAME, &self.name),
            (&*META_SYMBOL, &self.symbol),
            (&*META_DESCRIPTION, &self.description),
            (&*META_IMAGE, &self.image),
            (&*META_URI, &self.uri),
            (&*META_DECIMALS, &self.decimals),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                dict.insert(field.key, value.as_bytes().to_vec());
            }
        }
        if let Some(image_data) = self.image_data.as_ref().filter(|v| !v.is_empty()) {
            dict.insert(META_IMAGE_DATA.key, image_data.clone());
        }
        if dict.is_empty() {
            return Err(MetaDataError::EmptyMetadata);
        }
        dict.entry(META_DECIMALS.key)
            .or_insert_with(|| DEFAULT_DECIMALS.as_bytes().to_vec());

        log::debug!("Building jetton content with {} fields", dict.len());
        MetaDataContent::Internal { dict }.to_cell()
    }
}

impl From<&SnakeFormatDict> for JettonMetaData {
    fn from(dict: &SnakeFormatDict) -> Self {
        JettonMetaData {
            name: text_field(dict, &META_NAME),
            uri: text_field(dict, &META_URI),
            symbol: text_field(dict, &META_SYMBOL),
            description: text_field(dict, &META_DESCRIPTION),
            image: text_field(dict, &META_IMAGE),
            image_data: dict.get(&META_IMAGE_DATA.key).cloned(),
            decimals: text_field(dict, &META_DECIMALS),
        }
    }
}

fn text_field(dict: &SnakeFormatDict, field: &MetaDataField) -> Option<String> {
    let value = dict.get(&field.key)?;
    match String::from_utf8(value.clone()) {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("Metadata field {} is not valid UTF-8: {}", field.name, e);
            Some(String::from_utf8_lossy(value).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_ok;

    use super::*;

    fn decode(cell: &Cell) -> JettonMetaData {
        match assert_ok!(MetaDataContent::parse(cell)) {
            MetaDataContent::Internal { dict } => JettonMetaData::from(&dict),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn test_empty_fields_are_skipped() -> anyhow::Result<()> {
        let meta = JettonMetaData {
            name: Some("X".to_string()),
            symbol: Some("Y".to_string()),
            description: Some(String::new()),
            ..Default::default()
        };
        let cell = meta.to_content_cell()?;
        let MetaDataContent::Internal { dict } = MetaDataContent::parse(&cell)? else {
            panic!("on-chain content expected");
        };
        // name, symbol and the default decimals
        assert_eq!(dict.len(), 3);
        assert!(!dict.contains_key(&META_DESCRIPTION.key));

        let decoded = JettonMetaData::from(&dict);
        assert_eq!(decoded.description, None);
        assert_eq!(decoded.decimals.as_deref(), Some("9"));
        Ok(())
    }

    #[test]
    fn test_zero_decimals_is_kept() -> anyhow::Result<()> {
        let meta = JettonMetaData {
            name: Some("Indivisible".to_string()),
            decimals: Some("0".to_string()),
            ..Default::default()
        };
        let decoded = decode(&meta.to_content_cell()?);
        assert_eq!(decoded.decimals.as_deref(), Some("0"));
        Ok(())
    }

    #[test]
    fn test_empty_metadata() {
        let meta = JettonMetaData {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            meta.to_content_cell(),
            Err(MetaDataError::EmptyMetadata)
        ));
        assert!(matches!(
            JettonMetaData::default().to_content_cell(),
            Err(MetaDataError::EmptyMetadata)
        ));
    }

    #[test]
    fn test_all_fields_round_trip() -> anyhow::Result<()> {
        let meta = JettonMetaData {
            name: Some("Cook Token".to_string()),
            uri: Some("https://example.org/cook.json".to_string()),
            symbol: Some("COOK".to_string()),
            description: Some("Кулинарный токен 🍳 ".repeat(20)),
            image: Some("https://example.org/cook.png".to_string()),
            image_data: Some((0..=255u8).collect()),
            decimals: Some("6".to_string()),
        };
        assert_eq!(decode(&meta.to_content_cell()?), meta);
        Ok(())
    }

    #[test]
    fn test_lossy_utf8() {
        let dict = HashMap::from([(META_NAME.key, vec![b'A', 0xff, b'B'])]);
        let meta = JettonMetaData::from(&dict);
        assert_eq!(meta.name.as_deref(), Some("A\u{FFFD}B"));
        assert_eq!(meta.symbol, None);
    }

    #[test]
    fn test_serde() -> anyhow::Result<()> {
        let meta: JettonMetaData =
            serde_json::from_str(r#"{"name": "Cook Token", "symbol": "COOK"}"#)?;
        assert_eq!(meta.name.as_deref(), Some("Cook Token"));
        assert_eq!(meta.decimals, None);
        Ok(())
    }
}
