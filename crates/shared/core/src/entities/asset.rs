use serde::{Deserialize, Serialize};

use crate::values::TokenId;

/// Something an account can hold a balance of
///
/// The chain's native currency is a separate balance entry from its
/// wrapped token, even though both map to the same graph node when a
/// swap path is built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Native currency, also used to pay fees
    Native,
    /// A token contract
    Token(TokenId),
}

impl Asset {
    /// Token identifier, if this is not the native currency
    pub fn token(&self) -> Option<&TokenId> {
        match self {
            Asset::Native => None,
            Asset::Token(t) => Some(t),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }
}

impl From<TokenId> for Asset {
    fn from(token: TokenId) -> Self {
        Asset::Token(token)
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Asset::Native => write!(f, "NATIVE"),
            Asset::Token(t) => write!(f, "{}", t),
        }
    }
}
