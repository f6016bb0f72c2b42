use thiserror::Error;

#[derive(Error, Debug)]
#[error("Cannot parse address {address}: {message}")]
pub struct TonAddressParseError {
    address: String,
    message: String,
}

impl TonAddressParseError {
    pub fn new<A: ToString, M: ToString>(address: A, message: M) -> Self {
        Self {
            address: address.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
#[error("Cannot parse hash {hash}: {message}")]
pub struct TonHashParseError {
    hash: String,
    message: String,
}

impl TonHashParseError {
    pub fn new<H: ToString, M: ToString>(hash: H, message: M) -> Self {
        Self {
            hash: hash.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<TonHashParseError> for TonAddressParseError {
    fn from(err: TonHashParseError) -> Self {
        Self::new(err.hash, err.message)
    }
}
