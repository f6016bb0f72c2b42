use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jetton_core::cell::{BagOfCells, Cell};
use jetton_core::meta::{JettonMetaData, MetaDataContent, MetaDataError};
use tokio_test::{assert_err, assert_ok};

mod common;

fn decode_content(cell: &Cell) -> anyhow::Result<JettonMetaData> {
    match MetaDataContent::parse(cell)? {
        MetaDataContent::Internal { dict } => Ok(JettonMetaData::from(&dict)),
        other => anyhow::bail!("on-chain content expected, got {other:?}"),
    }
}

#[test]
fn test_cook_token_content() -> anyhow::Result<()> {
    common::init_logging();
    let meta = JettonMetaData {
        name: Some("Cook Token".to_string()),
        symbol: Some("COOK".to_string()),
        decimals: Some("9".to_string()),
        ..Default::default()
    };
    let cell = assert_ok!(meta.to_content_cell());
    assert_eq!(cell.data()[0], 0x00);
    assert_eq!(decode_content(&cell)?, meta);

    // same content through a bag of cells, the way an indexer receives it
    let boc = STANDARD.encode(BagOfCells::from_root(cell.clone()).serialize(true)?);
    let root = BagOfCells::parse_base64(&boc)?.single_root()?;
    assert_eq!(root.cell_hash(), cell.cell_hash());
    assert_eq!(decode_content(&root)?, meta);
    Ok(())
}

#[test]
fn test_content_is_deterministic() -> anyhow::Result<()> {
    common::init_logging();
    let meta = JettonMetaData {
        name: Some("Cook Token".to_string()),
        symbol: Some("COOK".to_string()),
        description: Some("A token for cooks".to_string()),
        image: Some("https://example.org/cook.png".to_string()),
        ..Default::default()
    };
    let first = meta.to_content_cell()?;
    let second = meta.clone().to_content_cell()?;
    assert_eq!(first.cell_hash(), second.cell_hash());

    let mut other = meta;
    other.symbol = Some("COOKS".to_string());
    assert_ne!(other.to_content_cell()?.cell_hash(), first.cell_hash());
    Ok(())
}

#[test]
fn test_empty_fields_are_dropped() -> anyhow::Result<()> {
    common::init_logging();
    let meta = JettonMetaData {
        name: Some("X".to_string()),
        symbol: Some("Y".to_string()),
        description: Some(String::new()),
        ..Default::default()
    };
    let cell = meta.to_content_cell()?;
    let MetaDataContent::Internal { dict } = MetaDataContent::parse(&cell)? else {
        anyhow::bail!("on-chain content expected");
    };
    assert_eq!(dict.len(), 3);

    let empty = JettonMetaData {
        description: Some(String::new()),
        ..Default::default()
    };
    let err = assert_err!(empty.to_content_cell());
    assert!(matches!(err, MetaDataError::EmptyMetadata));
    Ok(())
}

#[test]
fn test_long_description_spans_snake_chain() -> anyhow::Result<()> {
    common::init_logging();
    let meta = JettonMetaData {
        name: Some("Cook Token".to_string()),
        description: Some("Cook Token is the token of the cooks. ".repeat(40)),
        ..Default::default()
    };
    let decoded = decode_content(&meta.to_content_cell()?)?;
    assert_eq!(decoded.description, meta.description);
    assert_eq!(decoded.decimals.as_deref(), Some("9"));
    Ok(())
}

#[test]
fn test_off_chain_content() -> anyhow::Result<()> {
    common::init_logging();
    let content = MetaDataContent::External {
        uri: "https://tarantini.dev/ston/moon.json".to_string(),
    };
    let boc = BagOfCells::from_root(content.to_cell()?).serialize(false)?;
    let root = BagOfCells::parse(&boc)?.single_root()?;
    assert_eq!(MetaDataContent::parse(&root)?, content);
    Ok(())
}
