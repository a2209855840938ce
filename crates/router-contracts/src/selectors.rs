//! Known revert selectors for the Router contract.
//!
//! The Executor decodes these out of `eth_call`/`eth_sendRawTransaction`
//! revert data so logs say "stale relay, nonce already consumed" instead of
//! an opaque four-byte hex string.

use std::fmt;

use alloy::primitives::Bytes;

/// A revert selector recognized from the Router's ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterRevert {
    /// `SwapRequestParametersMismatch()` - the parameters the solver read no
    /// longer match what the destination router has on file, most likely
    /// because the request was already relayed by another solver.
    SwapRequestParametersMismatch,
    /// `AlreadyFulfilled()` - another solver settled this request first.
    AlreadyFulfilled,
    /// `InsufficientRelayerBalance()` - the router itself lacks the verification fee.
    InsufficientRelayerBalance,
    /// A selector not in the known table.
    Unknown([u8; 4]),
}

impl fmt::Display for RouterRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(selector) => write!(f, "Unknown(0x{})", hex::encode(selector)),
            known => write!(f, "{}", known.name()),
        }
    }
}

const SWAP_REQUEST_PARAMETERS_MISMATCH: [u8; 4] = [0xc4, 0xfe, 0xc7, 0xe0];
const ALREADY_FULFILLED: [u8; 4] = [0x4c, 0x67, 0x1d, 0x1c];
const INSUFFICIENT_RELAYER_BALANCE: [u8; 4] = [0x3d, 0x01, 0x5b, 0x9a];

impl RouterRevert {
    /// Human-readable name, for log lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SwapRequestParametersMismatch => "SwapRequestParametersMismatch",
            Self::AlreadyFulfilled => "AlreadyFulfilled",
            Self::InsufficientRelayerBalance => "InsufficientRelayerBalance",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Whether retrying this exact relay call would be pointless - the
    /// request has already been settled by someone else.
    #[must_use]
    pub const fn is_already_settled(self) -> bool {
        matches!(
            self,
            Self::SwapRequestParametersMismatch | Self::AlreadyFulfilled
        )
    }
}

/// Decode the leading 4-byte selector out of EVM revert data.
///
/// Returns `None` if `data` is shorter than 4 bytes (e.g. a plain
/// `require(false)` with no reason string).
#[must_use]
pub fn decode_revert_selector(data: &Bytes) -> Option<RouterRevert> {
    let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(match selector {
        SWAP_REQUEST_PARAMETERS_MISMATCH => RouterRevert::SwapRequestParametersMismatch,
        ALREADY_FULFILLED => RouterRevert::AlreadyFulfilled,
        INSUFFICIENT_RELAYER_BALANCE => RouterRevert::InsufficientRelayerBalance,
        other => RouterRevert::Unknown(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_selector() {
        let data = Bytes::from(SWAP_REQUEST_PARAMETERS_MISMATCH.to_vec());
        let revert = decode_revert_selector(&data).expect("selector");
        assert_eq!(revert, RouterRevert::SwapRequestParametersMismatch);
        assert!(revert.is_already_settled());
    }

    #[test]
    fn decodes_unknown_selector() {
        let data = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]);
        let revert = decode_revert_selector(&data).expect("selector");
        assert_eq!(revert, RouterRevert::Unknown([0xde, 0xad, 0xbe, 0xef]));
        assert!(!revert.is_already_settled());
    }

    #[test]
    fn returns_none_for_short_data() {
        let data = Bytes::from(vec![0x01, 0x02]);
        assert!(decode_revert_selector(&data).is_none());
    }
}
