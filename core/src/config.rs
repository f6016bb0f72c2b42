use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cell::{ArcCell, BagOfCells, Cell, StateInit, TonCellError};
use crate::jetton::{JettonError, JettonMinterData};
use crate::meta::{JettonMetaData, MetaDataContent};
use crate::tlb::TLBObject;
use crate::TonAddress;

/// Description of a jetton minter deployment, usually loaded from JSON.
///
/// Contract code is given as a bag of cells in hex or base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JettonDeployConfig {
    #[serde(default)]
    pub workchain: i32,
    pub admin: TonAddress,
    #[serde(
        default,
        serialize_with = "serialize_biguint",
        deserialize_with = "deserialize_biguint"
    )]
    pub total_supply: BigUint,
    #[serde(default)]
    pub metadata: JettonMetaData,
    /// Off-chain content; takes precedence over `metadata` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_uri: Option<String>,
    pub minter_code: String,
    pub wallet_code: String,
}

/// Everything the wallet needs to send the deploy message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDeploy {
    pub address: TonAddress,
    pub state_init: Cell,
    pub state_init_boc_b64: String,
}

impl JettonDeployConfig {
    pub fn from_json(config: &str) -> Result<Self, JettonError> {
        Ok(serde_json::from_str(config)?)
    }

    pub fn to_json(&self) -> Result<String, JettonError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn content(&self) -> Result<Cell, JettonError> {
        let content = match &self.content_uri {
            Some(uri) => MetaDataContent::External { uri: uri.clone() }.to_cell()?,
            None => self.metadata.to_content_cell()?,
        };
        Ok(content)
    }

    pub fn minter_data(&self) -> Result<JettonMinterData, JettonError> {
        let mut data = JettonMinterData::new(
            &self.admin,
            self.content()?.to_arc(),
            parse_code(&self.wallet_code)?,
        );
        data.with_total_supply(&self.total_supply);
        Ok(data)
    }

    /// Builds the minter state init and the address it deploys to.
    pub fn prepare(&self) -> Result<PreparedDeploy, JettonError> {
        let minter_code = parse_code(&self.minter_code)?;
        let state_init = self.minter_data()?.state_init(minter_code)?;
        let address = state_init.address(self.workchain)?;
        log::debug!("Prepared jetton minter deploy to {}", address);
        Ok(PreparedDeploy {
            address,
            state_init: state_init.to_cell()?,
            state_init_boc_b64: state_init.to_boc_b64(true)?,
        })
    }
}

impl PreparedDeploy {
    pub fn parse_state_init(&self) -> Result<StateInit, TonCellError> {
        StateInit::from_cell(&self.state_init)
    }
}

fn parse_code(code: &str) -> Result<ArcCell, TonCellError> {
    let code = code.trim();
    let is_hex = code.len() % 2 == 0 && code.chars().all(|c| c.is_ascii_hexdigit());
    let boc = if is_hex {
        BagOfCells::parse_hex(code)?
    } else {
        BagOfCells::parse_base64(code)?
    };
    boc.single_root()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn deserialize_biguint<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(BigUint::from(n)),
        NumberOrString::String(s) => BigUint::from_str(s.trim()).map_err(serde::de::Error::custom),
    }
}

fn serialize_biguint<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use super::*;
    use crate::cell::CellBuilder;

    fn code_boc(tag: u32) -> Vec<u8> {
        let cell = CellBuilder::new()
            .store_u32(32, tag)
            .and_then(|b| b.build())
            .unwrap();
        BagOfCells::from_root(cell).serialize(true).unwrap()
    }

    #[test]
    fn test_parse_code_hex_and_base64() -> anyhow::Result<()> {
        let boc = code_boc(0xC0DE);
        let from_hex = parse_code(&hex::encode(&boc))?;
        let from_b64 = parse_code(&STANDARD.encode(&boc))?;
        assert_eq!(from_hex, from_b64);
        assert_eq!(from_hex.data(), 0xC0DEu32.to_be_bytes());
        assert!(parse_code("not a boc").is_err());
        Ok(())
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let json = format!(
            r#"{{
                "admin": "EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR",
                "metadata": {{"name": "Cook Token", "symbol": "COOK"}},
                "minter_code": "{}",
                "wallet_code": "{}"
            }}"#,
            hex::encode(code_boc(1)),
            STANDARD.encode(code_boc(2))
        );
        let config = JettonDeployConfig::from_json(&json)?;
        assert_eq!(config.workchain, 0);
        assert_eq!(config.total_supply, BigUint::from(0u8));
        assert_eq!(config.content_uri, None);

        let restored = JettonDeployConfig::from_json(&config.to_json()?)?;
        assert_eq!(restored, config);
        Ok(())
    }

    #[test]
    fn test_total_supply_forms() -> anyhow::Result<()> {
        for supply in [r#""1000000000000000000000""#, "1000"] {
            let json = format!(
                r#"{{"admin": "0:{}", "total_supply": {}, "minter_code": "", "wallet_code": ""}}"#,
                "11".repeat(32),
                supply
            );
            let config = JettonDeployConfig::from_json(&json)?;
            assert_eq!(config.total_supply.to_string(), supply.trim_matches('"'));
        }
        Ok(())
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            JettonDeployConfig::from_json(r#"{"admin": "garbage"}"#),
            Err(JettonError::Config(_))
        ));
    }

    #[test]
    fn test_off_chain_content() -> anyhow::Result<()> {
        let config = JettonDeployConfig {
            workchain: 0,
            admin: TonAddress::NULL,
            total_supply: BigUint::from(0u8),
            metadata: JettonMetaData::default(),
            content_uri: Some("https://example.org/jetton.json".to_string()),
            minter_code: hex::encode(code_boc(1)),
            wallet_code: hex::encode(code_boc(2)),
        };
        let content = MetaDataContent::parse(&config.content()?)?;
        assert_eq!(
            content,
            MetaDataContent::External {
                uri: "https://example.org/jetton.json".to_string()
            }
        );
        let prepared = config.prepare()?;
        assert_eq!(prepared.parse_state_init()?.code, Some(parse_code(&config.minter_code)?));
        Ok(())
    }

    #[test]
    fn test_prepare_rejects_wide_workchain() -> anyhow::Result<()> {
        let config = JettonDeployConfig {
            workchain: 256,
            admin: TonAddress::new(0, &[1; 32]),
            total_supply: BigUint::from(0u8),
            metadata: JettonMetaData {
                name: Some("Cook Token".to_string()),
                ..Default::default()
            },
            content_uri: None,
            minter_code: hex::encode(code_boc(1)),
            wallet_code: hex::encode(code_boc(2)),
        };
        assert!(matches!(
            config.prepare(),
            Err(JettonError::Cell(TonCellError::ValueOutOfRange { bit_len: 8, .. }))
        ));
        Ok(())
    }
}
