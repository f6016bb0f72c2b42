use num_bigint::BigUint;
use num_traits::Zero;

use crate::cell::{ArcCell, CellBuilder, CellParser, StateInit, TonCellError};
use crate::tlb::TLBObject;
use crate::TonAddress;

/// Persistent data of the jetton minter:
///
/// ```raw
/// total_supply:Coins admin_address:MsgAddress content:^Cell jetton_wallet_code:^Cell
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JettonMinterData {
    pub total_supply: BigUint,
    pub admin: TonAddress,
    pub content: ArcCell,
    pub wallet_code: ArcCell,
}

impl JettonMinterData {
    /// Data of a freshly deployed minter, nothing minted yet.
    pub fn new(admin: &TonAddress, content: ArcCell, wallet_code: ArcCell) -> Self {
        JettonMinterData {
            total_supply: BigUint::zero(),
            admin: admin.clone(),
            content,
            wallet_code,
        }
    }

    pub fn with_total_supply(&mut self, total_supply: &BigUint) -> &mut Self {
        self.total_supply = total_supply.clone();
        self
    }

    pub fn state_init(&self, minter_code: ArcCell) -> Result<StateInit, TonCellError> {
        Ok(StateInit::new(minter_code, self.to_cell()?.to_arc()))
    }

    /// Wallet address of `owner` for the minter deployed at `master`.
    pub fn wallet_address(
        &self,
        workchain: i32,
        owner: &TonAddress,
        master: &TonAddress,
    ) -> Result<TonAddress, TonCellError> {
        jetton_wallet_address(workchain, owner, master, &self.wallet_code)
    }
}

impl TLBObject for JettonMinterData {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(JettonMinterData {
            total_supply: parser.load_coins()?,
            admin: parser.load_address()?,
            content: parser.next_reference()?,
            wallet_code: parser.next_reference()?,
        })
    }

    fn write(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_coins(&self.total_supply)?
            .store_address(&self.admin)?
            .store_reference(&self.content)?
            .store_reference(&self.wallet_code)?;
        Ok(())
    }
}

/// Persistent data of a jetton wallet:
///
/// ```raw
/// balance:Coins owner_address:MsgAddress jetton_master_address:MsgAddress jetton_wallet_code:^Cell
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JettonWalletData {
    pub balance: BigUint,
    pub owner: TonAddress,
    pub master: TonAddress,
    pub wallet_code: ArcCell,
}

impl TLBObject for JettonWalletData {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(JettonWalletData {
            balance: parser.load_coins()?,
            owner: parser.load_address()?,
            master: parser.load_address()?,
            wallet_code: parser.next_reference()?,
        })
    }

    fn write(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_coins(&self.balance)?
            .store_address(&self.owner)?
            .store_address(&self.master)?
            .store_reference(&self.wallet_code)?;
        Ok(())
    }
}

/// Address of the wallet the minter at `master` deploys for `owner`.
pub fn jetton_wallet_address(
    workchain: i32,
    owner: &TonAddress,
    master: &TonAddress,
    wallet_code: &ArcCell,
) -> Result<TonAddress, TonCellError> {
    let data = JettonWalletData {
        balance: BigUint::zero(),
        owner: owner.clone(),
        master: master.clone(),
        wallet_code: wallet_code.clone(),
    };
    StateInit::new(wallet_code.clone(), data.to_cell()?.to_arc()).address(workchain)
}
