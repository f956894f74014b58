use stampede_core::{AccountId, Amount, PairHandle, TokenId};

/// Deadline sentinel meaning "never expires"
pub const DEADLINE_FOREVER: u64 = 1_000_000_000_000_000_000;

/// Minimum output accepted by every swap: anything strictly positive
pub const MIN_AMOUNT_OUT: Amount = 1;

/// Router swap entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapKind {
    /// Spend native currency (sent as call value), receive tokens
    ExactNativeForTokens,
    /// Spend tokens, receive native currency
    ExactTokensForNative,
    /// Spend tokens, receive other tokens
    ExactTokensForTokens,
}

impl SwapKind {
    /// Method name on the router contract
    pub fn method(&self) -> &'static str {
        match self {
            SwapKind::ExactNativeForTokens => "Router::swap_exact_native_for_tokens",
            SwapKind::ExactTokensForNative => "Router::swap_exact_tokens_for_native",
            SwapKind::ExactTokensForTokens => "Router::swap_exact_tokens_for_tokens",
        }
    }
}

/// Arguments of one router swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCall {
    pub kind: SwapKind,
    pub path: Vec<TokenId>,
    pub amount_in: Amount,
    pub amount_out_min: Amount,
    pub to: AccountId,
    pub deadline: u64,
}

/// A state-changing call submitted to the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Multi-hop swap through the router
    Swap(SwapCall),
    /// Plain token transfer
    Transfer {
        token: TokenId,
        to: AccountId,
        amount: Amount,
    },
    /// Low-level swap on a single pair contract, paid for by a prior transfer
    PairSwap {
        pair: PairHandle,
        amount_0_out: Amount,
        amount_1_out: Amount,
        to: AccountId,
    },
}

/// Execution details of an included transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptMeta {
    pub weight: u64,
    pub fee: Amount,
    pub block: u64,
}

impl std::fmt::Display for ReceiptMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "weight {}  fee {}  block {}",
            self.weight, self.fee, self.block
        )
    }
}

/// Outcome of a submitted operation that reached the chain
///
/// An unsuccessful receipt means the transaction was included but its
/// call failed (for example the output was below `amount_out_min`).
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub success: bool,
    pub meta: Option<ReceiptMeta>,
}

impl Receipt {
    pub fn succeeded(meta: ReceiptMeta) -> Self {
        Self {
            success: true,
            meta: Some(meta),
        }
    }

    pub fn failed(meta: Option<ReceiptMeta>) -> Self {
        Self {
            success: false,
            meta,
        }
    }
}
