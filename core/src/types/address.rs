use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use crc::Crc;
use lazy_static::lazy_static;
use serde::de::{Error, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{ton_hash_from_slice, TonAddressParseError, TonHash, ZERO_HASH};
use crate::cell::{Cell, TonCellError};

lazy_static! {
    pub static ref CRC_16_XMODEM: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_XMODEM);
}

const USER_FRIENDLY_LEN: usize = 48;
const USER_FRIENDLY_BYTES: usize = 36;

const BOUNCEABLE_TAG: u8 = 0x11;
const NON_BOUNCEABLE_FLAG: u8 = 0x40;
const NON_PRODUCTION_FLAG: u8 = 0x80;

/// Checks that `workchain` fits the 8-bit field of `addr_std` and the user-friendly form.
pub fn workchain_id(workchain: i32) -> Result<i8, TonCellError> {
    i8::try_from(workchain).map_err(|_| TonCellError::ValueOutOfRange {
        value: workchain.to_string(),
        bit_len: 8,
    })
}

#[derive(PartialEq, Eq, Clone, Hash)]
pub struct TonAddress {
    pub workchain: i32,
    pub hash_part: TonHash,
}

impl TonAddress {
    pub const NULL: TonAddress = TonAddress {
        workchain: 0,
        hash_part: ZERO_HASH,
    };

    pub fn new(workchain: i32, hash_part: &TonHash) -> TonAddress {
        TonAddress {
            workchain,
            hash_part: *hash_part,
        }
    }

    pub fn null() -> TonAddress {
        TonAddress::NULL.clone()
    }

    /// Address of the contract whose serialized `StateInit` is `state_init`.
    ///
    /// The network computes exactly this value when the contract is deployed,
    /// so the result can be used as a deployment target beforehand.
    pub fn derive(workchain: i32, state_init: &Cell) -> TonAddress {
        let hash_part = state_init.cell_hash();
        log::debug!(
            "Derived address {}:{} from state init",
            workchain,
            hex::encode(hash_part)
        );
        TonAddress::new(workchain, &hash_part)
    }

    /// Parses the raw `workchain:hex` form.
    pub fn from_hex_str(s: &str) -> Result<TonAddress, TonAddressParseError> {
        let fail =
            |reason: &str| TonAddressParseError::new(s, format!("Invalid raw address: {reason}"));
        let (wc, hash_hex) = s.split_once(':').ok_or_else(|| fail("expected workchain:hash"))?;
        let workchain = wc
            .parse::<i8>()
            .map_err(|_| fail("workchain must be an 8-bit signed integer"))?;
        let hash_bytes = hex::decode(hash_hex).map_err(|_| fail("bad hex"))?;
        let hash_part =
            ton_hash_from_slice(&hash_bytes).map_err(|_| fail("hash must be 32 bytes"))?;
        Ok(TonAddress::new(workchain as i32, &hash_part))
    }

    pub fn from_base64_url(s: &str) -> Result<TonAddress, TonAddressParseError> {
        Ok(Self::from_base64_url_flags(s)?.0)
    }

    /// Parses the url-safe user-friendly form.
    ///
    /// Returns the address with its non-bounceable and non-production (test-only) flags.
    pub fn from_base64_url_flags(
        s: &str,
    ) -> Result<(TonAddress, bool, bool), TonAddressParseError> {
        Self::decode_user_friendly(s, &URL_SAFE_NO_PAD)
    }

    pub fn from_base64_std(s: &str) -> Result<TonAddress, TonAddressParseError> {
        Ok(Self::from_base64_std_flags(s)?.0)
    }

    /// Same as [`TonAddress::from_base64_url_flags`] for the standard base64 alphabet.
    pub fn from_base64_std_flags(
        s: &str,
    ) -> Result<(TonAddress, bool, bool), TonAddressParseError> {
        Self::decode_user_friendly(s, &STANDARD_NO_PAD)
    }

    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    pub fn to_base64_url(&self) -> String {
        self.to_base64_url_flags(false, false)
    }

    pub fn to_base64_url_flags(&self, non_bounceable: bool, non_production: bool) -> String {
        URL_SAFE_NO_PAD.encode(self.user_friendly_bytes(non_bounceable, non_production))
    }

    pub fn to_base64_std(&self) -> String {
        self.to_base64_std_flags(false, false)
    }

    pub fn to_base64_std_flags(&self, non_bounceable: bool, non_production: bool) -> String {
        STANDARD_NO_PAD.encode(self.user_friendly_bytes(non_bounceable, non_production))
    }

    fn decode_user_friendly<E: Engine>(
        s: &str,
        engine: &E,
    ) -> Result<(TonAddress, bool, bool), TonAddressParseError> {
        let fail = |reason: &str| {
            TonAddressParseError::new(s, format!("Invalid user-friendly address: {reason}"))
        };
        if s.len() != USER_FRIENDLY_LEN {
            return Err(fail("expected 48 characters"));
        }
        let decoded = engine.decode(s).map_err(|_| fail("bad base64"))?;
        let bytes: [u8; USER_FRIENDLY_BYTES] =
            decoded.try_into().map_err(|_| fail("expected 36 bytes"))?;

        let tag = bytes[0];
        if tag & !(NON_BOUNCEABLE_FLAG | NON_PRODUCTION_FLAG) != BOUNCEABLE_TAG {
            return Err(fail("unknown tag byte"));
        }
        let crc = u16::from_be_bytes([bytes[34], bytes[35]]);
        if CRC_16_XMODEM.checksum(&bytes[..34]) != crc {
            return Err(fail("checksum mismatch"));
        }
        let address = TonAddress::new(bytes[1] as i8 as i32, &ton_hash_from_slice(&bytes[2..34])?);
        Ok((
            address,
            tag & NON_BOUNCEABLE_FLAG != 0,
            tag & NON_PRODUCTION_FLAG != 0,
        ))
    }

    // tag, workchain, hash, crc16; the workchain must fit into a byte
    fn user_friendly_bytes(
        &self,
        non_bounceable: bool,
        non_production: bool,
    ) -> [u8; USER_FRIENDLY_BYTES] {
        let mut tag = BOUNCEABLE_TAG;
        if non_bounceable {
            tag |= NON_BOUNCEABLE_FLAG;
        }
        if non_production {
            tag |= NON_PRODUCTION_FLAG;
        }
        let mut bytes = [0u8; USER_FRIENDLY_BYTES];
        bytes[0] = tag;
        bytes[1] = self.workchain as u8;
        bytes[2..34].copy_from_slice(&self.hash_part);
        let crc = CRC_16_XMODEM.checksum(&bytes[..34]);
        bytes[34..].copy_from_slice(&crc.to_be_bytes());
        bytes
    }
}

impl Display for TonAddress {
    /// Falls back to the raw form when the workchain has no user-friendly encoding.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match workchain_id(self.workchain) {
            Ok(_) => f.write_str(&self.to_base64_url()),
            Err(_) => f.write_str(&self.to_hex()),
        }
    }
}

impl Debug for TonAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for TonAddress {
    type Err = TonAddressParseError;

    /// Accepts the raw form and both base64 alphabets of the user-friendly form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.len() {
            USER_FRIENDLY_LEN if s.contains(|c| c == '-' || c == '_') => {
                TonAddress::from_base64_url(s)
            }
            USER_FRIENDLY_LEN => TonAddress::from_base64_std(s),
            _ => TonAddress::from_hex_str(s),
        }
    }
}

impl TryFrom<String> for TonAddress {
    type Error = TonAddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for TonAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct TonAddressVisitor;

impl Visitor<'_> for TonAddressVisitor {
    type Value = TonAddress;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a TON address in raw or user-friendly form")
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for TonAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(TonAddressVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::TonAddressParseError;
    use crate::cell::CellBuilder;
    use crate::{TonAddress, TonHash};

    fn sample_hash() -> TonHash {
        hex::decode("e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76")
            .unwrap()
            .as_slice()
            .try_into()
            .unwrap()
    }

    #[test]
    fn format_works() -> Result<(), TonAddressParseError> {
        let addr = TonAddress::new(0, &sample_hash());
        assert_eq!(
            addr.to_hex(),
            "0:e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76"
        );
        assert_eq!(
            addr.to_base64_url(),
            "EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR"
        );
        assert_eq!(
            addr.to_base64_std(),
            "EQDk2VTvn04SUKJrW7rXahzdF8/Qi6utb0wj43InCu9vdjrR"
        );
        Ok(())
    }

    #[test]
    fn parse_works() -> Result<(), TonAddressParseError> {
        let addr = TonAddress::new(0, &sample_hash());
        assert_eq!(
            "0:e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76"
                .parse::<TonAddress>()?,
            addr
        );
        assert_eq!(
            "EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR".parse::<TonAddress>()?,
            addr
        );
        assert_eq!(
            "EQDk2VTvn04SUKJrW7rXahzdF8/Qi6utb0wj43InCu9vdjrR".parse::<TonAddress>()?,
            addr
        );
        Ok(())
    }

    #[test]
    fn flags_round_trip() -> Result<(), TonAddressParseError> {
        let addr = TonAddress::new(-1, &sample_hash());
        let url = addr.to_base64_url_flags(true, true);
        let (parsed, non_bounceable, non_production) = TonAddress::from_base64_url_flags(&url)?;
        assert_eq!(parsed, addr);
        assert!(non_bounceable);
        assert!(non_production);
        Ok(())
    }

    #[test]
    fn parse_verifies_crc() {
        let res = "EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjra".parse::<TonAddress>();
        assert!(res.is_err());
    }

    #[test]
    fn parse_rejects_short_hash() {
        let res = TonAddress::from_hex_str("0:e4d954ef");
        assert!(res.is_err());
    }

    #[test]
    fn derive_uses_cell_hash() {
        let cell = CellBuilder::new().build().unwrap();
        let addr = TonAddress::derive(0, &cell);
        assert_eq!(addr.hash_part, cell.cell_hash());
        assert_eq!(addr.workchain, 0);
    }

    #[test]
    fn serde_works() -> Result<(), TonAddressParseError> {
        let expected = "\"EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR\"";
        let res = "0:e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76"
            .parse::<TonAddress>()?;
        let serial = serde_json::to_string(&res).unwrap();
        assert_eq!(serial.as_str(), expected);

        let deserial: TonAddress = serde_json::from_str(expected).unwrap();
        assert_eq!(deserial, res);

        let deserial: serde_json::Result<TonAddress> = serde_json::from_str("\"124\"");
        assert!(deserial.is_err());
        Ok(())
    }

    #[test]
    fn workchain_must_fit_into_byte() {
        let hash = "11".repeat(32);
        assert!(format!("256:{hash}").parse::<TonAddress>().is_err());
        assert!(format!("-129:{hash}").parse::<TonAddress>().is_err());
        let addr = format!("-128:{hash}").parse::<TonAddress>().unwrap();
        assert_eq!(addr.workchain, -128);
        assert_eq!(TonAddress::from_base64_url(&addr.to_base64_url()).unwrap(), addr);

        let wide = TonAddress::new(256, &[0x11; 32]);
        assert_eq!(wide.to_string(), format!("256:{hash}"));
    }
}
