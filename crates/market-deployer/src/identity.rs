//! Question and condition identifiers
//!
//! Both are keccak-256 over Solidity-packed arguments, so they can be
//! recomputed off-chain and must match what ConditionalTokens derives.

use alloy_primitives::{keccak256, Address, B256, U256};

/// keccak256(abi.encodePacked(string title, string description))
///
/// Packed strings are raw UTF-8 bytes with no length prefix. Empty strings
/// are valid and hash to keccak256("").
pub fn question_id(title: &str, description: &str) -> B256 {
    let mut packed = Vec::with_capacity(title.len() + description.len());
    packed.extend_from_slice(title.as_bytes());
    packed.extend_from_slice(description.as_bytes());
    keccak256(packed)
}

/// keccak256(abi.encodePacked(address oracle, bytes32 questionId, uint256 outcomeSlotCount))
///
/// Same derivation as `ConditionalTokens.getConditionId`.
pub fn condition_id(oracle: Address, question_id: B256, outcome_count: usize) -> B256 {
    let mut packed = Vec::with_capacity(20 + 32 + 32);
    packed.extend_from_slice(oracle.as_slice());
    packed.extend_from_slice(question_id.as_slice());
    packed.extend_from_slice(&U256::from(outcome_count).to_be_bytes::<32>());
    keccak256(packed)
}
