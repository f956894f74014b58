//! Simulated chain tests
//!
//! Fee charging, router swaps, direct pair swaps, failure classification and
//! connection drops.

use stampede_core::{AccountId, Amount, Asset, PairHandle, TokenId, amount_out};
use stampede_ports::{
    AgentIdentity, ChainClient, ChainConnector, ChainError, DEADLINE_FOREVER, GraphBuilder,
    MIN_AMOUNT_OUT, Operation, SwapCall, SwapKind,
};

use crate::scenario::{self, AGENT_NATIVE, POOL_RESERVE, TOKENS, WNATIVE};
use crate::{SimChain, SimConfig, SimConnector, SimGraphBuilder, pair_account};

const PHRASE: &str = "//Test";

fn token(i: usize) -> TokenId {
    TokenId::new(TOKENS[i].0)
}

fn wnative() -> TokenId {
    TokenId::new(WNATIVE)
}

fn setup() -> (SimChain, stampede_core::AccountId, crate::SimClient) {
    let chain = scenario::demo_chain(SimConfig::default()).unwrap();
    scenario::fund_agents(&chain, PHRASE, 1, AGENT_NATIVE, 0);
    let connector = SimConnector::new(chain.clone());
    let client = connector
        .connect(&AgentIdentity::derive(PHRASE, 0, None))
        .unwrap();
    let account = client.account().clone();
    (chain, account, client)
}

fn swap(kind: SwapKind, path: Vec<TokenId>, amount_in: Amount, to: &AccountId) -> Operation {
    Operation::Swap(SwapCall {
        kind,
        path,
        amount_in,
        amount_out_min: MIN_AMOUNT_OUT,
        to: to.clone(),
        deadline: DEADLINE_FOREVER,
    })
}

#[test]
fn test_native_for_tokens_swap() {
    let (chain, me, mut client) = setup();
    let fee = chain.config().fee_per_call;
    let amount = 1_000_000_000_000_000_000;

    let receipt = client
        .submit(&swap(
            SwapKind::ExactNativeForTokens,
            vec![wnative(), token(0), token(2)],
            amount,
            &me,
        ))
        .unwrap();

    assert!(receipt.success);
    let meta = receipt.meta.unwrap();
    assert_eq!(meta.block, 1);
    assert_eq!(meta.fee, fee);
    assert_eq!(meta.weight, 150_000 + 2 * 250_000);

    let first_hop = amount_out(amount, POOL_RESERVE, POOL_RESERVE);
    let expected = amount_out(first_hop, POOL_RESERVE, POOL_RESERVE);
    assert_eq!(chain.balance(&me, &Asset::Token(token(2))), expected);
    assert_eq!(chain.balance(&me, &Asset::Native), AGENT_NATIVE - amount - fee);
}

#[test]
fn test_token_swap_needs_allowance() {
    let (chain, me, mut client) = setup();
    let fee = chain.config().fee_per_call;
    chain.mint(&me, Asset::Token(token(0)), 1_000_000);
    let op = swap(
        SwapKind::ExactTokensForTokens,
        vec![token(0), token(1)],
        500_000,
        &me,
    );

    let receipt = client.submit(&op).unwrap();
    assert!(!receipt.success, "swap without allowance must revert");
    assert_eq!(chain.balance(&me, &Asset::Token(token(0))), 1_000_000);
    assert_eq!(chain.balance(&me, &Asset::Native), AGENT_NATIVE - fee);

    let router = chain.addresses().router;
    assert!(client.approve(&token(0), &router, Amount::MAX).unwrap().success);
    let receipt = client.submit(&op).unwrap();
    assert!(receipt.success);
    assert_eq!(chain.balance(&me, &Asset::Token(token(0))), 500_000);
    assert!(chain.balance(&me, &Asset::Token(token(1))) > 0);
    assert_eq!(chain.block_number(), 3);
}

#[test]
fn test_tokens_for_native_credits_native() {
    let (chain, me, mut client) = setup();
    let fee = chain.config().fee_per_call;
    let router = chain.addresses().router;
    chain.mint(&me, Asset::Token(token(1)), 10_000_000_000);
    client.approve(&token(1), &router, Amount::MAX).unwrap();

    let receipt = client
        .submit(&swap(
            SwapKind::ExactTokensForNative,
            vec![token(1), wnative()],
            10_000_000_000,
            &me,
        ))
        .unwrap();
    assert!(receipt.success);
    let received = amount_out(10_000_000_000, POOL_RESERVE, POOL_RESERVE);
    assert_eq!(
        chain.balance(&me, &Asset::Native),
        AGENT_NATIVE - 2 * fee + received
    );
}

#[test]
fn test_exhausted_account() {
    let chain = scenario::demo_chain(SimConfig::default()).unwrap();
    let connector = SimConnector::new(chain.clone());
    let mut client = connector
        .connect(&AgentIdentity::derive(PHRASE, 9, None))
        .unwrap();
    let me = client.account().clone();
    chain.mint(&me, Asset::Native, chain.config().fee_per_call - 1);

    let err = client
        .submit(&swap(
            SwapKind::ExactNativeForTokens,
            vec![wnative(), token(0)],
            1,
            &me,
        ))
        .unwrap_err();
    assert!(matches!(err, ChainError::AccountExhausted(_)));
    assert_eq!(chain.block_number(), 0);
}

#[test]
fn test_malformed_swaps_are_rejected() {
    let (chain, me, mut client) = setup();

    let short = swap(SwapKind::ExactNativeForTokens, vec![wnative()], 10, &me);
    assert!(matches!(client.submit(&short), Err(ChainError::Rejected(_))));

    let wrong_start = swap(
        SwapKind::ExactNativeForTokens,
        vec![token(0), token(1)],
        10,
        &me,
    );
    assert!(matches!(
        client.submit(&wrong_start),
        Err(ChainError::Rejected(_))
    ));

    // rejected calls are never included
    assert_eq!(chain.included(), 0);
    assert_eq!(chain.balance(&me, &Asset::Native), AGENT_NATIVE);
}

#[test]
fn test_missing_hop_reverts_without_moving_funds() {
    let (chain, me, mut client) = setup();
    let fee = chain.config().fee_per_call;
    // USDC and ETH share no pool
    let receipt = client
        .submit(&swap(
            SwapKind::ExactNativeForTokens,
            vec![wnative(), token(0), token(3)],
            1_000_000,
            &me,
        ))
        .unwrap();
    assert!(!receipt.success);
    assert_eq!(chain.balance(&me, &Asset::Native), AGENT_NATIVE - fee);
    assert_eq!(chain.balance(&me, &Asset::Token(token(0))), 0);
}

#[test]
fn test_transfer_then_pair_swap() {
    let (chain, me, mut client) = setup();
    let dai = token(1);
    let link = token(4);
    let pair = PairHandle::new(format!("pair:{}:{}", dai, link));
    let amount = 1_000_000_000;
    chain.mint(&me, Asset::Token(dai.clone()), amount);

    let transfer = Operation::Transfer {
        token: dai.clone(),
        to: pair_account(&pair),
        amount,
    };
    assert!(client.submit(&transfer).unwrap().success);

    let (reserve_0, reserve_1) = client.reserves(&pair).unwrap();
    let out = amount_out(amount, reserve_0, reserve_1);
    let receipt = client
        .submit(&Operation::PairSwap {
            pair: pair.clone(),
            amount_0_out: 0,
            amount_1_out: out,
            to: me.clone(),
        })
        .unwrap();

    assert!(receipt.success);
    assert_eq!(chain.balance(&me, &Asset::Token(link)), out);
    assert_eq!(chain.balance(&pair_account(&pair), &Asset::Token(dai)), 0);
    let pool = chain.pool(&pair).unwrap();
    assert_eq!(pool.reserve_0, POOL_RESERVE + amount);
    assert_eq!(pool.reserve_1, POOL_RESERVE - out);
}

#[test]
fn test_pair_swap_asking_too_much_reverts() {
    let (chain, me, mut client) = setup();
    let pair = PairHandle::new(format!("pair:{}:{}", token(1), token(4)));
    chain.mint(&pair_account(&pair), Asset::Token(token(1)), 1_000);

    let receipt = client
        .submit(&Operation::PairSwap {
            pair: pair.clone(),
            amount_0_out: 0,
            amount_1_out: 1_000,
            to: me,
        })
        .unwrap();
    assert!(!receipt.success);
    assert_eq!(chain.pool(&pair).unwrap().reserve_1, POOL_RESERVE);
}

#[test]
fn test_injected_disconnect() {
    let (chain, me, mut client) = setup();
    chain.inject_disconnects(1);
    let op = swap(
        SwapKind::ExactNativeForTokens,
        vec![wnative(), token(0)],
        1_000_000,
        &me,
    );

    let err = client.submit(&op).unwrap_err();
    assert!(err.is_transient());
    assert!(!client.is_connected());
    assert!(client.balance_of(&me, &Asset::Native).unwrap_err().is_transient());

    client.reconnect().unwrap();
    assert!(client.submit(&op).unwrap().success);
}

#[test]
fn test_discovery_matches_pools() {
    let chain = scenario::demo_chain(SimConfig::default()).unwrap();
    let graph = SimGraphBuilder::new(chain.clone()).fetch().unwrap();

    assert_eq!(graph.pair_count(), chain.pools().len());
    assert_eq!(graph.token_count(), TOKENS.len() + 1);
    assert_eq!(graph.wnative(), &wnative());
    assert_eq!(graph.symbol(&token(2)), "WBTC");
    for (handle, pool) in chain.pools() {
        assert_eq!(graph.get_pair(&pool.token_1, &pool.token_0).unwrap(), &handle);
    }
}

#[test]
fn test_duplicate_pool_rejected() {
    let chain = scenario::demo_chain(SimConfig::default()).unwrap();
    assert!(chain.add_pool(token(1), wnative(), 10, 10).is_err());
    assert!(chain.add_pool(token(1), token(1), 10, 10).is_err());
    assert!(chain.add_pool(token(2), token(4), 0, 10).is_err());
}
