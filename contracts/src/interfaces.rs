//! Solidity interfaces of the contracts the policies talk to.
//!
//! Only the functions and events actually used are declared. Calldata and
//! return data are encoded and decoded by the generated `*Call` types.

use alloy::sol;

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function balanceOf(address owner) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function totalSupply() external view returns (uint256 supply);
        function approve(address spender, uint256 amount) external returns (bool ok);
    }

    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address token);
        function token1() external view returns (address token);
    }

    interface IUniswapV2Router {
        function addLiquidity(
            address tokenA,
            address tokenB,
            uint256 amountADesired,
            uint256 amountBDesired,
            uint256 amountAMin,
            uint256 amountBMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);

        function addLiquidityETH(
            address token,
            uint256 amountTokenDesired,
            uint256 amountTokenMin,
            uint256 amountETHMin,
            address to,
            uint256 deadline
        ) external payable returns (uint256 amountToken, uint256 amountETH, uint256 liquidity);

        function removeLiquidity(
            address tokenA,
            address tokenB,
            uint256 liquidity,
            uint256 amountAMin,
            uint256 amountBMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB);

        function removeLiquidityETH(
            address token,
            uint256 liquidity,
            uint256 amountTokenMin,
            uint256 amountETHMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountToken, uint256 amountETH);
    }

    /// Tomb Finance boardroom.
    interface IMasonry {
        function balanceOf(address mason) external view returns (uint256 balance);
        function earned(address mason) external view returns (uint256 reward);
        function canWithdraw(address mason) external view returns (bool allowed);
        function canClaimReward(address mason) external view returns (bool allowed);
        function epoch() external view returns (uint256 current);
        function nextEpochPoint() external view returns (uint256 point);
        function masons(address mason) external view returns (uint256 lastSnapshotIndex, uint256 rewardEarned, uint256 epochTimerStart);
        function withdrawLockupEpochs() external view returns (uint256 epochs);
        function rewardLockupEpochs() external view returns (uint256 epochs);
        function stake(uint256 amount) external;
        function withdraw(uint256 amount) external;
        function claimReward() external;
    }

    interface ITreasury {
        function PERIOD() external view returns (uint256 period);
    }

    /// Cemetery-style LP reward pool.
    interface IRewardPool {
        function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
        function pendingShare(uint256 pid, address user) external view returns (uint256 pending);
        function deposit(uint256 pid, uint256 amount) external;
        function withdraw(uint256 pid, uint256 amount) external;
    }
}
