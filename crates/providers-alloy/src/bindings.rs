//! Contract bindings for the L1 contracts the validator talks to.

#![allow(missing_docs, unreachable_pub, clippy::too_many_arguments)]

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract L2OutputOracle {
        struct OutputProposal {
            bytes32 outputRoot;
            uint128 timestamp;
            uint128 l2BlockNumber;
        }

        event OutputSubmitted(
            bytes32 indexed outputRoot,
            uint256 indexed l2OutputIndex,
            uint256 indexed l2BlockNumber,
            uint256 l1Timestamp
        );

        function SUBMISSION_INTERVAL() external view returns (uint256);
        function startingBlockNumber() external view returns (uint256);
        function latestOutputIndex() external view returns (uint256);
        function nextOutputIndex() external view returns (uint256);
        function latestBlockNumber() external view returns (uint256);
        function nextBlockNumber() external view returns (uint256);
        function getL2Output(uint256 _l2OutputIndex) external view returns (OutputProposal memory);
        function getL2OutputIndexAfter(uint256 _l2BlockNumber) external view returns (uint256);
        function submitL2Output(
            bytes32 _outputRoot,
            uint256 _l2BlockNumber,
            bytes32 _l1BlockHash,
            uint256 _l1BlockNumber
        ) external payable;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract ValidatorPool {
        function nextValidator() external view returns (address);
        function balanceOf(address _addr) external view returns (uint256);
        function deposit() external payable;
        function withdraw(uint256 _amount) external;
        function unbond() external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract Colosseum {
        enum ChallengeStatus {
            NONE,
            CHALLENGER_TURN,
            ASSERTER_TURN,
            CHALLENGER_TIMEOUT,
            ASSERTER_TIMEOUT,
            READY_TO_PROVE,
            PROVEN
        }

        struct Challenge {
            uint8 turn;
            uint64 timeoutAt;
            address asserter;
            address challenger;
            bytes32[] segments;
            uint256 segSize;
            uint256 segStart;
        }

        function getStatus(uint256 _outputIndex, address _challenger) external view returns (ChallengeStatus);
        function getChallenge(uint256 _outputIndex, address _challenger) external view returns (Challenge memory);
        function createChallenge(
            uint256 _outputIndex,
            bytes32 _l1BlockHash,
            uint256 _l1BlockNumber,
            bytes32[] calldata _segments
        ) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract ValidatorManager {
        function registerValidator(uint128 assets, uint8 commissionRate, uint8 commissionMaxChangeRate) external;
        function changeCommissionRate(uint8 newCommissionRate) external;
        function tryUnjail() external;
        function inJail(address validator) external view returns (bool);
        function getCommissionRate(address validator) external view returns (uint8);
        function getCommissionMaxChangeRate(address validator) external view returns (uint8);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract AssetManager {
        function ASSET_TOKEN() external view returns (address);
        function delegate(address validator, uint128 assets) external returns (uint128);
        function initUndelegate(address validator, uint128 assets) external;
        function finalizeUndelegate(address validator) external returns (uint128);
        function initClaimValidatorReward(uint128 amount) external;
        function finalizeClaimValidatorReward() external;
        function totalKroAssets(address validator) external view returns (uint128);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract GovernanceToken {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}
