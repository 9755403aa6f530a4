use alloy_primitives::{Bytes, U64};
use keystore_sdk_types::AuthInputs;
use serde::{Deserialize, Serialize};

use crate::error::KeystoreClientError;

/// Authentication inputs for a transaction paid for by a sponsor account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SponsoredAuthInputs {
    /// The prover authenticates both the user and the sponsor.
    #[serde(rename_all = "camelCase")]
    ProveSponsored {
        user_auth_inputs: AuthInputs,
        sponsor_auth_inputs: AuthInputs,
    },
    /// The user proof was generated elsewhere; only the sponsor is proven.
    #[serde(rename_all = "camelCase")]
    ProveOnlySponsored {
        user_proof: Bytes,
        sponsor_auth_inputs: AuthInputs,
    },
    /// The prover's own sponsor account signs off on the transaction.
    #[serde(rename = "sponsorAndProve", rename_all = "camelCase")]
    AutoSponsor { user_auth_inputs: AuthInputs },
}

impl SponsoredAuthInputs {
    /// Picks the variant matching the supplied parts. Any other combination,
    /// including none at all, is rejected.
    pub fn from_parts(
        user_auth_inputs: Option<AuthInputs>,
        user_proof: Option<Bytes>,
        sponsor_auth_inputs: Option<AuthInputs>,
    ) -> Result<Self, KeystoreClientError> {
        match (user_auth_inputs, user_proof, sponsor_auth_inputs) {
            (Some(user_auth_inputs), None, Some(sponsor_auth_inputs)) => Ok(Self::ProveSponsored {
                user_auth_inputs,
                sponsor_auth_inputs,
            }),
            (None, Some(user_proof), Some(sponsor_auth_inputs)) => Ok(Self::ProveOnlySponsored {
                user_proof,
                sponsor_auth_inputs,
            }),
            (Some(user_auth_inputs), None, None) => Ok(Self::AutoSponsor { user_auth_inputs }),
            _ => Err(KeystoreClientError::InvalidAuthInputsCombination),
        }
    }

    pub fn user_auth_inputs(&self) -> Option<&AuthInputs> {
        match self {
            Self::ProveSponsored {
                user_auth_inputs, ..
            }
            | Self::AutoSponsor { user_auth_inputs } => Some(user_auth_inputs),
            Self::ProveOnlySponsored { .. } => None,
        }
    }

    pub fn sponsor_auth_inputs(&self) -> Option<&AuthInputs> {
        match self {
            Self::ProveSponsored {
                sponsor_auth_inputs,
                ..
            }
            | Self::ProveOnlySponsored {
                sponsor_auth_inputs,
                ..
            } => Some(sponsor_auth_inputs),
            Self::AutoSponsor { .. } => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Status of an authentication request as reported by the signature prover.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationStatus {
    status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authenticated_transaction: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AuthenticationStatus {
    fn new(status: Status, authenticated_transaction: Option<Bytes>, error: Option<String>) -> Self {
        Self {
            status,
            authenticated_transaction,
            error,
        }
    }

    pub fn pending() -> Self {
        Self::new(Status::Pending, None, None)
    }

    pub fn completed(tx: Bytes) -> Self {
        Self::new(Status::Completed, Some(tx), None)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::new(Status::Failed, None, Some(error.into()))
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn authenticated_transaction(&self) -> Option<&Bytes> {
        self.authenticated_transaction.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `None` while pending, otherwise the authenticated transaction or the
    /// reason authentication did not produce one.
    pub fn into_outcome(self) -> Option<Result<Bytes, KeystoreClientError>> {
        match self.status {
            Status::Pending => None,
            Status::Completed => Some(
                self.authenticated_transaction
                    .ok_or(KeystoreClientError::MissingAuthenticatedTransaction),
            ),
            Status::Failed => Some(Err(KeystoreClientError::RemoteAuthenticationFailed(
                self.error
                    .unwrap_or_else(|| "no error message reported".to_string()),
            ))),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    #[default]
    Latest,
    Committed,
    Finalized,
    Earliest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTagOrNumber {
    Tag(BlockTag),
    Number(U64),
}

impl Default for BlockTagOrNumber {
    fn default() -> Self {
        Self::Tag(BlockTag::Latest)
    }
}

impl From<BlockTag> for BlockTagOrNumber {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

impl From<u64> for BlockTagOrNumber {
    fn from(number: u64) -> Self {
        Self::Number(U64::from(number))
    }
}
