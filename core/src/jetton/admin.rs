use super::{load_opcode, JettonError, JettonMessage, JETTON_CHANGE_ADMIN, JETTON_CHANGE_CONTENT};
use crate::cell::{ArcCell, Cell, CellBuilder};
use crate::TonAddress;

/// ```raw
/// change_admin#3 query_id:uint64 new_admin_address:MsgAddress = InternalMsgBody;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JettonChangeAdminMessage {
    pub query_id: u64,
    pub new_admin: TonAddress,
}

impl JettonChangeAdminMessage {
    pub fn new(new_admin: &TonAddress) -> Self {
        JettonChangeAdminMessage {
            query_id: 0,
            new_admin: new_admin.clone(),
        }
    }

    pub fn with_query_id(&mut self, query_id: u64) -> &mut Self {
        self.query_id = query_id;
        self
    }
}

impl JettonMessage for JettonChangeAdminMessage {
    const OPCODE: u32 = JETTON_CHANGE_ADMIN;

    fn build(&self) -> Result<Cell, JettonError> {
        let mut message = CellBuilder::new();
        message
            .store_u32(32, Self::OPCODE)?
            .store_u64(64, self.query_id)?
            .store_address(&self.new_admin)?;
        Ok(message.build()?)
    }

    fn parse(cell: &Cell) -> Result<Self, JettonError> {
        let mut parser = cell.parser();
        load_opcode::<Self>(&mut parser)?;
        let query_id = parser.load_u64(64)?;
        let new_admin = parser.load_address()?;
        parser.ensure_empty()?;
        Ok(JettonChangeAdminMessage {
            query_id,
            new_admin,
        })
    }
}

/// ```raw
/// change_content#4 query_id:uint64 new_content:^Cell = InternalMsgBody;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JettonChangeContentMessage {
    pub query_id: u64,
    pub content: ArcCell,
}

impl JettonChangeContentMessage {
    pub fn new(content: ArcCell) -> Self {
        JettonChangeContentMessage {
            query_id: 0,
            content,
        }
    }

    pub fn with_query_id(&mut self, query_id: u64) -> &mut Self {
        self.query_id = query_id;
        self
    }
}

impl JettonMessage for JettonChangeContentMessage {
    const OPCODE: u32 = JETTON_CHANGE_CONTENT;

    fn build(&self) -> Result<Cell, JettonError> {
        let mut message = CellBuilder::new();
        message
            .store_u32(32, Self::OPCODE)?
            .store_u64(64, self.query_id)?
            .store_reference(&self.content)?;
        Ok(message.build()?)
    }

    fn parse(cell: &Cell) -> Result<Self, JettonError> {
        let mut parser = cell.parser();
        load_opcode::<Self>(&mut parser)?;
        let query_id = parser.load_u64(64)?;
        let content = parser.next_reference()?;
        parser.ensure_empty()?;
        Ok(JettonChangeContentMessage { query_id, content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{JettonMetaData, MetaDataContent};

    #[test]
    fn test_change_admin() -> anyhow::Result<()> {
        let mut message = JettonChangeAdminMessage::new(&TonAddress::new(-1, &[9; 32]));
        message.with_query_id(1);
        let cell = message.build()?;
        // opcode, query_id and addr_std
        assert_eq!(cell.bit_len(), 32 + 64 + 267);
        assert_eq!(JettonChangeAdminMessage::parse(&cell)?, message);

        // renouncing ownership
        let renounce = JettonChangeAdminMessage::new(&TonAddress::NULL);
        let cell = renounce.build()?;
        assert_eq!(cell.bit_len(), 32 + 64 + 2);
        assert_eq!(JettonChangeAdminMessage::parse(&cell)?, renounce);
        Ok(())
    }

    #[test]
    fn test_change_content() -> anyhow::Result<()> {
        let meta = JettonMetaData {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let content = meta.to_content_cell()?.to_arc();
        let message = JettonChangeContentMessage::new(content.clone());
        let parsed = JettonChangeContentMessage::parse(&message.build()?)?;
        assert_eq!(parsed, message);
        assert!(matches!(
            MetaDataContent::parse(&parsed.content)?,
            MetaDataContent::Internal { .. }
        ));

        let wrong = JettonChangeAdminMessage::new(&TonAddress::NULL).build()?;
        assert!(matches!(
            JettonChangeContentMessage::parse(&wrong),
            Err(JettonError::InvalidOpCode {
                expected: JETTON_CHANGE_CONTENT,
                actual: JETTON_CHANGE_ADMIN
            })
        ));
        Ok(())
    }
}
