use alloy::{primitives::B256, sol_types::SolEvent};

#[allow(clippy::too_many_arguments)]
pub mod manager {
    alloy::sol!(
        /// Protocol root announcing module addresses and ownership.
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface ConfigurationManager {
            event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
            event ModuleSet(bytes32 indexed name, address indexed newAddress);
            event ParameterSet(bytes32 name, uint256 value);
        }
    );
}

#[allow(clippy::too_many_arguments)]
pub mod factory {
    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface OptionFactory {
            event OptionCreated(
                address indexed deployer,
                address option,
                uint8 optionType,
                uint8 exerciseType,
                address underlyingAsset,
                address strikeAsset,
                uint256 strikePrice,
                uint256 expiration,
                uint256 exerciseWindowSize
            );
        }
    );

    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface OptionAMMFactory {
            event PoolCreated(address indexed deployer, address pool, address option);
        }
    );
}

#[allow(clippy::too_many_arguments)]
pub mod helper {
    alloy::sol!(
        /// Periphery contract bundling mint/trade flows for end users.
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface OptionHelper {
            event OptionsBought(
                address indexed buyer,
                address indexed optionAddress,
                uint256 optionsBought,
                address inputToken,
                uint256 inputSold
            );
            event OptionsSold(
                address indexed seller,
                address indexed optionAddress,
                uint256 optionsSold,
                address outputToken,
                uint256 outputReceived
            );
            event OptionsMintedAndSold(
                address indexed seller,
                address indexed optionAddress,
                uint256 optionsMintedAndSold,
                address outputToken,
                uint256 outputBought
            );
        }
    );
}

#[allow(clippy::too_many_arguments)]
pub mod option {
    alloy::sol!(
        /// Option series token.
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface PodOption {
            event Mint(address indexed minter, uint256 amount);
            event Unmint(address indexed minter, uint256 optionAmount, uint256 strikeAmount, uint256 underlyingAmount);
            event Exercise(address indexed exerciser, uint256 amount);
            event Withdraw(address indexed minter, uint256 strikeAmount, uint256 underlyingAmount);
            event Transfer(address indexed from, address indexed to, uint256 value);

            function underlyingAssetDecimals() external view returns (uint8);
            function strikeAssetDecimals() external view returns (uint8);
        }
    );
}

#[allow(clippy::too_many_arguments)]
pub mod pool {
    alloy::sol!(
        /// AMM pool trading one option series against a stable token.
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface OptionAMMPool {
            event AddLiquidity(address indexed caller, address indexed owner, uint256 amountA, uint256 amountB);
            event RemoveLiquidity(address indexed caller, uint256 amountA, uint256 amountB);
            event TradeInfo(uint256 spotPrice, uint256 newIV);

            function tokenA() external view returns (address);
            function tokenB() external view returns (address);
            function tokenADecimals() external view returns (uint8);
            function tokenBDecimals() external view returns (uint8);
            function feePoolA() external view returns (address);
            function feePoolB() external view returns (address);

            function priceProperties() external view returns (
                uint256 expiration,
                uint256 startOfExerciseWindow,
                uint256 strikePrice,
                address underlyingAsset,
                uint8 optionType,
                uint256 currentSigma,
                uint256 riskFree,
                uint256 initialIVGuess
            );
            function getOptionTradeDetailsExactAOutput(uint256 exactAmountAOut) external view returns (
                uint256 amountBIn,
                uint256 newIV,
                uint256 feesTokenA,
                uint256 feesTokenB
            );
            function getOptionTradeDetailsExactAInput(uint256 exactAmountAIn) external view returns (
                uint256 amountBOut,
                uint256 newIV,
                uint256 feesTokenA,
                uint256 feesTokenB
            );
            function getABPrice() external view returns (uint256);
            function deamortizedTokenABalance() external view returns (uint256);
            function deamortizedTokenBBalance() external view returns (uint256);
            function getRemoveLiquidityAmounts(uint256 percentA, uint256 percentB, address user) external view returns (
                uint256 withdrawAmountA,
                uint256 withdrawAmountB
            );
            function getUserDepositSnapshot(address user) external view returns (
                uint256 tokenABalance,
                uint256 tokenBBalance,
                uint256 fImpOpening
            );
        }
    );

    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface FeePool {
            event FeeWithdrawn(address token, address to, uint256 feeWithdrawn, uint256 share);
        }
    );
}

#[allow(clippy::too_many_arguments)]
pub mod erc20 {
    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface ERC20 {
            function symbol() external view returns (string);
            function decimals() external view returns (uint8);
            function balanceOf(address owner) external view returns (uint256);
        }
    );
}

/// Signature hashes (topic 0) of every event the indexer reduces.
pub fn event_signatures() -> Vec<B256> {
    vec![
        manager::ConfigurationManager::OwnershipTransferred::SIGNATURE_HASH,
        manager::ConfigurationManager::ModuleSet::SIGNATURE_HASH,
        manager::ConfigurationManager::ParameterSet::SIGNATURE_HASH,
        factory::OptionFactory::OptionCreated::SIGNATURE_HASH,
        factory::OptionAMMFactory::PoolCreated::SIGNATURE_HASH,
        helper::OptionHelper::OptionsBought::SIGNATURE_HASH,
        helper::OptionHelper::OptionsSold::SIGNATURE_HASH,
        helper::OptionHelper::OptionsMintedAndSold::SIGNATURE_HASH,
        option::PodOption::Mint::SIGNATURE_HASH,
        option::PodOption::Unmint::SIGNATURE_HASH,
        option::PodOption::Exercise::SIGNATURE_HASH,
        option::PodOption::Withdraw::SIGNATURE_HASH,
        option::PodOption::Transfer::SIGNATURE_HASH,
        pool::OptionAMMPool::AddLiquidity::SIGNATURE_HASH,
        pool::OptionAMMPool::RemoveLiquidity::SIGNATURE_HASH,
        pool::OptionAMMPool::TradeInfo::SIGNATURE_HASH,
        pool::FeePool::FeeWithdrawn::SIGNATURE_HASH,
    ]
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn test_event_signatures_are_distinct() {
        let signatures = event_signatures();
        assert_eq!(signatures.iter().unique().count(), signatures.len());
        assert_eq!(
            option::PodOption::Transfer::SIGNATURE,
            "Transfer(address,address,uint256)"
        );
    }
}
