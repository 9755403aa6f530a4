use alloy_primitives::{Bytes, U256};

use super::KeystoreAccount;
use crate::primitives::{quantity_from_be_slice, quantity_to_be_bytes};

/// An optional value together with its wire bytes, where absence is encoded
/// as empty bytes. Keeps the transaction field lists fixed-arity.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OptionBytes<T> {
    bytes: Bytes,
    option: Option<T>,
}

impl<T> OptionBytes<T> {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn option(&self) -> Option<&T> {
        self.option.as_ref()
    }

    pub fn is_some(&self) -> bool {
        self.option.is_some()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn into_option(self) -> Option<T> {
        self.option
    }
}

impl<T> Default for OptionBytes<T> {
    fn default() -> Self {
        Self {
            bytes: Bytes::new(),
            option: None,
        }
    }
}

impl OptionBytes<U256> {
    pub fn u256(&self) -> U256 {
        self.option.unwrap_or(U256::ZERO)
    }
}

#[derive(thiserror::Error, Debug)]
pub struct OptionBytesError(#[from] eyre::Report);

impl std::fmt::Display for OptionBytesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid option bytes: {}", self.0)
    }
}

impl From<Option<U256>> for OptionBytes<U256> {
    fn from(option: Option<U256>) -> Self {
        let bytes = option.map(quantity_to_be_bytes).unwrap_or_default();
        Self { bytes, option }
    }
}

impl TryFrom<Bytes> for OptionBytes<U256> {
    type Error = OptionBytesError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        let option = if bytes.is_empty() {
            None
        } else {
            Some(quantity_from_be_slice(&bytes).map_err(|err| OptionBytesError(err.into()))?)
        };
        Ok(Self { bytes, option })
    }
}

impl From<Option<KeystoreAccount>> for OptionBytes<KeystoreAccount> {
    fn from(option: Option<KeystoreAccount>) -> Self {
        let bytes = option
            .as_ref()
            .map(KeystoreAccount::rlp_encode)
            .unwrap_or_default();
        Self { bytes, option }
    }
}

impl TryFrom<Bytes> for OptionBytes<KeystoreAccount> {
    type Error = OptionBytesError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        let option = if bytes.is_empty() {
            None
        } else {
            Some(KeystoreAccount::rlp_decode(&bytes).map_err(|err| OptionBytesError(err.into()))?)
        };
        Ok(Self { bytes, option })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Bytes, FixedBytes, U256};

    use super::*;

    #[test]
    fn test_empty_bytes_is_none() {
        let fee: OptionBytes<U256> = Bytes::new().try_into().unwrap();
        assert!(fee.option().is_none());
        assert_eq!(fee.u256(), U256::ZERO);

        let sponsor: OptionBytes<KeystoreAccount> = Bytes::new().try_into().unwrap();
        assert!(sponsor.option().is_none());
        assert_eq!(sponsor, OptionBytes::from(None::<KeystoreAccount>));
    }

    #[test]
    fn test_sponsor_account_bytes() {
        let acct = KeystoreAccount::with_salt(
            FixedBytes::random(),
            FixedBytes::random(),
            Bytes::from_static(b"vkey"),
        );
        let sponsor = OptionBytes::from(Some(acct.clone()));
        assert_eq!(sponsor.bytes(), &acct.rlp_encode());

        let decoded = OptionBytes::<KeystoreAccount>::try_from(sponsor.bytes().clone()).unwrap();
        assert_eq!(decoded.option(), Some(&acct));

        let garbage = Bytes::from_static(&[0xc1, 0x80, 0x80]);
        assert!(OptionBytes::<KeystoreAccount>::try_from(garbage).is_err());
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let too_wide = Bytes::from(vec![1u8; 33]);
        assert!(OptionBytes::<U256>::try_from(too_wide).is_err());
    }
}
