//! Ready-made demo market
//!
//! A small exchange with one wrapped native token, five listed tokens and a
//! handful of pools wired so that every token is reachable from every other,
//! some of them only through two or more hops.

use log::info;

use stampede_core::{AccountId, Amount, Asset, DexAddresses, TokenId};
use stampede_ports::AgentIdentity;

use crate::application::SimChain;
use crate::error::Result;
use crate::model::SimConfig;

pub const ROUTER: &str = "0x00000000000000000000000000000000000000e1";
pub const FACTORY: &str = "0x00000000000000000000000000000000000000f1";
pub const WNATIVE: &str = "0x0000000000000000000000000000000000000a11";

/// Listed tokens with their symbols
pub const TOKENS: [(&str, &str); 5] = [
    ("0x0000000000000000000000000000000000000b01", "USDC"),
    ("0x0000000000000000000000000000000000000b02", "DAI"),
    ("0x0000000000000000000000000000000000000b03", "WBTC"),
    ("0x0000000000000000000000000000000000000b04", "ETH"),
    ("0x0000000000000000000000000000000000000b05", "LINK"),
];

/// Pools as (token index, token index), with `None` standing for wrapped native
const POOLS: [(Option<usize>, Option<usize>); 7] = [
    (None, Some(0)),
    (None, Some(1)),
    (Some(0), Some(1)),
    (Some(0), Some(2)),
    (Some(2), Some(3)),
    (Some(3), Some(4)),
    (Some(1), Some(4)),
];

pub const POOL_RESERVE: Amount = 1_000_000_000_000_000_000_000_000;
pub const AGENT_NATIVE: Amount = 1_000_000_000_000_000_000_000;
pub const AGENT_TOKENS: Amount = 100_000_000_000_000_000_000;

pub fn addresses() -> DexAddresses {
    DexAddresses {
        router: AccountId::new(ROUTER),
        factory: AccountId::new(FACTORY),
        wnative: TokenId::new(WNATIVE),
    }
}

fn token_at(index: Option<usize>) -> TokenId {
    match index {
        Some(i) => TokenId::new(TOKENS[i].0),
        None => TokenId::new(WNATIVE),
    }
}

/// Build the demo exchange on a fresh chain
pub fn demo_chain(config: SimConfig) -> Result<SimChain> {
    let chain = SimChain::new(addresses(), config);
    chain.set_symbol(TokenId::new(WNATIVE), Some("WNATIVE".to_string()));
    for (address, symbol) in TOKENS {
        chain.set_symbol(TokenId::new(address), Some(symbol.to_string()));
    }
    for (a, b) in POOLS {
        chain.add_pool(token_at(a), token_at(b), POOL_RESERVE, POOL_RESERVE)?;
    }
    info!("Demo exchange deployed with {} pools", POOLS.len());
    Ok(chain)
}

/// Give the first `agents` accounts derived from `phrase` native currency
/// and `tokens` of every listed token
pub fn fund_agents(chain: &SimChain, phrase: &str, agents: usize, native: Amount, tokens: Amount) {
    for index in 0..agents {
        let account = AccountId::new(AgentIdentity::derive(phrase, index, None).uri);
        chain.mint(&account, Asset::Native, native);
        if tokens > 0 {
            for (address, _) in TOKENS {
                chain.mint(&account, Asset::Token(TokenId::new(address)), tokens);
            }
        }
    }
}
