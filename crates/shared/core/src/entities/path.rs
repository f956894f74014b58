use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::values::TokenId;

/// Ordered sequence of tokens a swap travels through
///
/// Always holds at least the start token. A path of length 1 has no hop
/// and cannot be traded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TokenId>")]
pub struct Path(Vec<TokenId>);

impl Path {
    /// Path consisting only of `start`
    pub fn starting_at(start: TokenId) -> Self {
        Self(vec![start])
    }

    /// Wrap an explicit token sequence; `None` if it is empty
    pub fn from_tokens(tokens: Vec<TokenId>) -> Option<Self> {
        if tokens.is_empty() {
            None
        } else {
            Some(Self(tokens))
        }
    }

    pub(crate) fn push(&mut self, token: TokenId) {
        self.0.push(token);
    }

    pub fn first(&self) -> &TokenId {
        &self.0[0]
    }

    pub fn last(&self) -> &TokenId {
        &self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of swaps along the path
    pub fn hops(&self) -> usize {
        self.0.len() - 1
    }

    /// A path is never empty; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.0.contains(token)
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.0
    }

    pub fn into_tokens(self) -> Vec<TokenId> {
        self.0
    }
}

impl TryFrom<Vec<TokenId>> for Path {
    type Error = GraphError;

    fn try_from(tokens: Vec<TokenId>) -> Result<Self, Self::Error> {
        Self::from_tokens(tokens).ok_or(GraphError::EmptyPath)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(|t| t.as_str()).collect();
        write!(f, "{}", joined.join("->"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token_path() {
        let path = Path::starting_at(TokenId::new("A"));
        assert_eq!(path.len(), 1);
        assert_eq!(path.hops(), 0);
        assert_eq!(path.first(), path.last());
    }

    #[test]
    fn test_display_joins_with_arrows() {
        let mut path = Path::starting_at(TokenId::new("A"));
        path.push(TokenId::new("B"));
        path.push(TokenId::new("C"));
        assert_eq!(path.to_string(), "A->B->C");
        assert_eq!(path.hops(), 2);
    }

    #[test]
    fn test_decoding_keeps_path_non_empty() {
        assert!(serde_json::from_str::<Path>("[]").is_err());

        let path: Path = serde_json::from_str(r#"["A","B"]"#).unwrap();
        assert_eq!(path.hops(), 1);
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["A","B"]"#);
    }
}
