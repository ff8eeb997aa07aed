//! Solidity interface definitions for on-chain reads.
//!
//! Only the zero-argument ERC-20 metadata accessors and `balanceOf` are
//! declared. The generated call types provide both the selectors and the
//! return-value decoders.

use alloy_sol_types::sol;

sol! {
    /// ERC-20 with the optional metadata extension.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-20>
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }
}
