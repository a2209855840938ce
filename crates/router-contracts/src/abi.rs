//! Raw ABI interface definitions via alloy's `sol!` macro.

use alloy::sol;

sol! {
    /// The swap router. Verifies and relays cross-chain swap requests.
    #[sol(rpc)]
    interface IRouter {
        function getFulfilledTransfers() external view returns (bytes32[] memory);
        function getUnfulfilledSolverRefunds() external view returns (bytes32[] memory);

        function getSwapRequestParameters(bytes32 requestId) external view returns (
            uint256 srcChainId,
            uint256 dstChainId,
            address sender,
            address recipient,
            address tokenIn,
            address tokenOut,
            uint256 amountOut,
            uint256 verificationFee,
            uint256 solverFee,
            uint256 nonce,
            bool executed,
            uint256 requestedAt
        );

        function relayTokens(
            address solver,
            bytes32 requestId,
            address sender,
            address recipient,
            address tokenIn,
            address tokenOut,
            uint256 amountOut,
            uint256 srcChainId,
            uint256 nonce
        ) external returns (bool);
    }
}

sol! {
    /// Standard ERC20 surface the solver needs (balance + approval).
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}
