//! Decoding for `getSwapRequestParameters`, which is observed in the wild in
//! two different encodings: a named struct (`srcChainId` first) and a raw
//! positional tuple (`sender` first). The named-struct decode is canonical;
//! the positional decode is a fallback that is logged loudly every time it's
//! taken, since it signals an unexpected router deployment.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolValue};
use thiserror::Error;
use tracing::warn;

use crate::abi::IRouter;

/// Errors decoding a router's `getSwapRequestParameters` response.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Neither the named-struct nor the positional-tuple layout matched.
    #[error("could not decode swap request parameters: {0}")]
    Unrecognized(String),

    /// A chain ID did not fit in 64 bits - treated as corrupt data rather
    /// than silently wrapped, per the decode-time validation policy.
    #[error("chain id {0} does not fit in 64 bits")]
    ChainIdOutOfRange(U256),
}

/// Decoded and chain-id-normalized `SwapRequestParameters`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSwapRequestParameters {
    /// Normalized (mod 2^64) source chain ID.
    pub src_chain_id: u64,
    /// Normalized (mod 2^64) destination chain ID.
    pub dst_chain_id: u64,
    /// Requester address.
    pub sender: Address,
    /// Recipient address on the destination chain.
    pub recipient: Address,
    /// Token sent on the source chain.
    pub token_in: Address,
    /// Token the recipient must receive on the destination chain.
    pub token_out: Address,
    /// Amount the recipient must receive, in `token_out`'s smallest unit.
    pub amount_out: U256,
    /// Fee paid to the verification layer.
    pub verification_fee: U256,
    /// Fee paid to the solver.
    pub solver_fee: U256,
    /// Nonce scoping uniqueness within (sender, dest, token, amount).
    pub nonce: U256,
    /// Whether the source chain has already refunded the solver for this request.
    pub executed: bool,
    /// Unix-second timestamp the request was submitted.
    pub requested_at: U256,
    /// `true` if this record came back all-zero (i.e. "not yet verified").
    pub is_empty: bool,
}

/// Decode `getSwapRequestParameters`'s ABI-encoded return data.
///
/// Tries the named-struct layout first (canonical); if that fails, falls
/// back to the positional-tuple layout (`sender` at index 0) and logs a
/// warning each time, since that fallback indicates an unexpected ABI.
pub fn decode_swap_request_parameters(
    data: &Bytes,
) -> Result<DecodedSwapRequestParameters, DecodeError> {
    if let Ok(ret) = IRouter::getSwapRequestParametersCall::abi_decode_returns(data) {
        return assemble(
            ret.srcChainId,
            ret.dstChainId,
            ret.sender,
            ret.recipient,
            ret.tokenIn,
            ret.tokenOut,
            ret.amountOut,
            ret.verificationFee,
            ret.solverFee,
            ret.nonce,
            ret.executed,
            ret.requestedAt,
        );
    }

    warn!("named-struct decode of getSwapRequestParameters failed, trying positional tuple");

    type Positional = (
        Address,
        Address,
        Address,
        Address,
        U256,
        U256,
        U256,
        U256,
        U256,
        bool,
        U256,
    );

    let (sender, recipient, token_in, token_out, amount_out, src_chain_id, dst_chain_id, verification_fee, solver_fee, nonce, executed) =
        Positional::abi_decode(data).map_err(|e| DecodeError::Unrecognized(e.to_string()))?;

    warn!("decoded getSwapRequestParameters via positional-tuple fallback");

    assemble(
        src_chain_id,
        dst_chain_id,
        sender,
        recipient,
        token_in,
        token_out,
        amount_out,
        verification_fee,
        solver_fee,
        nonce,
        executed,
        U256::ZERO,
    )
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    src_chain_id: U256,
    dst_chain_id: U256,
    sender: Address,
    recipient: Address,
    token_in: Address,
    token_out: Address,
    amount_out: U256,
    verification_fee: U256,
    solver_fee: U256,
    nonce: U256,
    executed: bool,
    requested_at: U256,
) -> Result<DecodedSwapRequestParameters, DecodeError> {
    let is_empty = src_chain_id.is_zero() || sender.is_zero();

    Ok(DecodedSwapRequestParameters {
        src_chain_id: normalize_chain_id(src_chain_id)?,
        dst_chain_id: normalize_chain_id(dst_chain_id)?,
        sender,
        recipient,
        token_in,
        token_out,
        amount_out,
        verification_fee,
        solver_fee,
        nonce,
        executed,
        requested_at,
        is_empty,
    })
}

/// Reject chain IDs that don't fit in 64 bits rather than silently masking
/// them - a value this large on a freshly observed router record is far more
/// likely to be corrupt data than a legitimate chain ID.
fn normalize_chain_id(raw: U256) -> Result<u64, DecodeError> {
    if raw > U256::from(u64::MAX) {
        return Err(DecodeError::ChainIdOutOfRange(raw));
    }
    Ok(raw.to::<u64>())
}

/// Recover an address from a 256-bit word by taking the low 20 bytes.
///
/// Some RPC paths return addresses widened to a full word; this is the
/// "addresses returned as large integers" edge case.
#[must_use]
pub fn address_from_word(word: U256) -> Address {
    let bytes: [u8; 32] = word.to_be_bytes();
    Address::from_slice(&bytes[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    fn sample_call(sender_first: bool) -> Bytes {
        if sender_first {
            type Positional = (
                Address,
                Address,
                Address,
                Address,
                U256,
                U256,
                U256,
                U256,
                U256,
                bool,
                U256,
            );
            let tuple: Positional = (
                Address::repeat_byte(0x11),
                Address::repeat_byte(0x22),
                Address::repeat_byte(0x33),
                Address::repeat_byte(0x44),
                U256::from(1_000u64),
                U256::from(31337u64),
                U256::from(31338u64),
                U256::from(1u64),
                U256::from(2u64),
                U256::from(7u64),
                false,
            );
            Bytes::from(tuple.abi_encode())
        } else {
            let ret = IRouter::getSwapRequestParametersReturn {
                srcChainId: U256::from(31337u64),
                dstChainId: U256::from(31338u64),
                sender: Address::repeat_byte(0x11),
                recipient: Address::repeat_byte(0x22),
                tokenIn: Address::repeat_byte(0x33),
                tokenOut: Address::repeat_byte(0x44),
                amountOut: U256::from(1_000u64),
                verificationFee: U256::from(1u64),
                solverFee: U256::from(2u64),
                nonce: U256::from(7u64),
                executed: false,
                requestedAt: U256::from(123u64),
            };
            Bytes::from(ret.abi_encode())
        }
    }

    #[test]
    fn decodes_named_struct_layout() {
        let data = sample_call(false);
        let decoded = decode_swap_request_parameters(&data).expect("decode");
        assert_eq!(decoded.src_chain_id, 31337);
        assert_eq!(decoded.sender, Address::repeat_byte(0x11));
        assert!(!decoded.is_empty);
    }

    #[test]
    fn falls_back_to_positional_tuple() {
        let data = sample_call(true);
        let decoded = decode_swap_request_parameters(&data).expect("decode");
        assert_eq!(decoded.sender, Address::repeat_byte(0x11));
        assert_eq!(decoded.src_chain_id, 31337);
    }

    #[test]
    fn rejects_oversized_chain_id() {
        let too_big = U256::from(u64::MAX) + U256::from(1u64);
        let err = normalize_chain_id(too_big).unwrap_err();
        assert!(matches!(err, DecodeError::ChainIdOutOfRange(_)));
    }

    #[test]
    fn recovers_address_from_widened_word() {
        let addr = Address::repeat_byte(0xab);
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(addr.as_slice());
        let word = U256::from_be_bytes(bytes);
        assert_eq!(address_from_word(word), addr);
    }
}
