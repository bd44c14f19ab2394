//! Compile-time ABI definitions for the leverage contracts via Alloy `sol!`.
//!
//! The registry publishes JSON ABIs as well, but calls are encoded from these
//! definitions so a shape mismatch is a compile error rather than a runtime
//! lookup failure.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

// ---------------------------------------------------------------------------
// Leverage engine structs and interfaces
//
// Interfaces reference the structs by name, so both live in one `sol!` block.
// ---------------------------------------------------------------------------

sol! {
    /// Position record held by the ledger.
    #[derive(Debug, PartialEq, Eq)]
    struct LedgerEntry {
        uint256 collateralAmount;
        address strategyAddress;
        uint256 strategyShares;
        uint256 wbtcDebtAmount;
        uint256 positionOpenBlock;
        uint256 positionExpirationBlock;
        uint256 liquidationBuffer;
        uint8 state;
        uint256 claimableAmount;
    }

    /// Argument struct of `PositionOpener.openPosition`.
    #[derive(Debug, PartialEq, Eq)]
    struct OpenPositionParams {
        uint256 collateralAmount;
        uint256 wbtcToBorrow;
        address strategy;
        uint256 minStrategyShares;
        uint8 swapRoute;
        bytes swapData;
        address exchange;
    }

    /// Argument struct of `PositionCloser.closePosition`.
    #[derive(Debug, PartialEq, Eq)]
    struct ClosePositionParams {
        uint256 nftId;
        uint256 minWBTC;
        uint8 swapRoute;
        bytes swapData;
        address exchange;
    }

    /// Swap data decoded by the Uniswap V3 swap adapter.
    #[derive(Debug, PartialEq, Eq)]
    struct UniswapV3Data {
        bytes path;
        uint256 deadline;
        uint256 amountOutMinimum;
    }

    /// Swap data without a minimum, the layout of the open payload.
    #[derive(Debug, PartialEq, Eq)]
    struct UniswapV3PreviewData {
        bytes path;
        uint256 deadline;
    }

    // -- Leverage engine ----------------------------------------------------

    interface IPositionOpener {
        function openPosition(OpenPositionParams calldata params) external returns (uint256 nftId);
    }

    interface IPositionCloser {
        function closePosition(ClosePositionParams calldata params) external;
    }

    interface IPositionLedger {
        function getPosition(uint256 nftId) external view returns (LedgerEntry memory entry);
    }

    interface IExpiredVault {
        function claim(uint256 nftId) external returns (uint256 claimed);
    }
}

// ---------------------------------------------------------------------------
// Strategy vault (ERC-4626 style)
// ---------------------------------------------------------------------------

sol! {
    interface IMultiPoolStrategy {
        function asset() external view returns (address);
        function convertToAssets(uint256 shares) external view returns (uint256 assets);
        function previewDeposit(uint256 assets) external view returns (uint256 shares);
    }
}

// ---------------------------------------------------------------------------
// ERC-20
// ---------------------------------------------------------------------------

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
    }
}
