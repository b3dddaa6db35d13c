use alloy_sol_types::sol;

sol! {
    /// Emitted once per token deployed through the factory
    #[derive(Debug)]
    event TokenCreated(
        address indexed token,
        address indexed creator,
        string name,
        string symbol,
        uint256 timestamp
    );

    /// Emitted on every bonding-curve buy
    #[derive(Debug)]
    event TokensPurchased(
        address indexed token,
        address indexed buyer,
        uint256 ethIn,
        uint256 tokensOut,
        uint256 fee,
        uint256 newReserveETH,
        uint256 newReserveTokens
    );

    /// Emitted on every bonding-curve sell
    #[derive(Debug)]
    event TokensSold(
        address indexed token,
        address indexed seller,
        uint256 tokensIn,
        uint256 ethOut,
        uint256 newReserveETH,
        uint256 newReserveTokens
    );

    /// Emitted when a token leaves the curve for its liquidity pool
    #[derive(Debug)]
    event TokenGraduated(
        address indexed token,
        address indexed pool,
        uint256 ethLiquidity,
        uint256 tokenLiquidity,
        uint256 positionId
    );

    /// Point-in-time curve state for a token
    function getTokenInfo(address token) external view returns (
        address creator,
        uint256 reserveETH,
        uint256 reserveTokens,
        uint256 creatorFees,
        bool graduated,
        address pool,
        uint256 positionId
    );
}
