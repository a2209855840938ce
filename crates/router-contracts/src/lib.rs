//! ABI bindings for the on-chain Router and ERC20 contracts the solver talks
//! to. The contracts themselves are out of scope for this workspace - this
//! crate only builds calldata and decodes return data.
//!
//! # Modules
//!
//! - [`abi`] - raw `sol!` interface definitions
//! - [`decode`] - the named-struct/positional-tuple decode-ambiguity helper
//!   for `getSwapRequestParameters`
//! - [`selectors`] - known revert selectors, decoded for error logging

#![doc(html_root_url = "https://docs.onlyswaps.io/router-contracts")]

pub mod abi;
pub mod decode;
pub mod selectors;

pub use abi::{IERC20, IRouter};
pub use decode::{decode_swap_request_parameters, DecodedSwapRequestParameters};
pub use selectors::decode_revert_selector;
