use serde::{Deserialize, Serialize};

/// Token or native-currency amount in the chain's smallest unit
pub type Amount = u128;

/// Symbol shown for a token that has no on-chain metadata
pub type Symbol = String;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Address of a token contract
    ///
    /// Ordering is plain string ordering, which is also the canonical
    /// ordering used to key trading pairs.
    TokenId
);

string_id!(
    /// Address of an on-chain account or contract (router, factory, trader)
    AccountId
);

string_id!(
    /// Opaque handle of a pair contract linking two tokens
    PairHandle
);
