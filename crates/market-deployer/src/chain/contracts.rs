//! Contract bindings
//!
//! Minimal interfaces for the two contracts a deployment touches.

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    contract ConditionalTokens {
        function prepareCondition(address oracle, bytes32 questionId, uint256 outcomeSlotCount) external;
        function getConditionId(address oracle, bytes32 questionId, uint256 outcomeSlotCount) external pure returns (bytes32);
    }
}

sol! {
    #[sol(rpc)]
    contract PolymarketMarketMakerFactory {
        struct QuestionData {
            string title;
            string description;
        }

        struct ConditionData {
            string[] outcomes;
            address oracle;
        }

        /// `{ question, conditions: [condition] }` payload stored with the market maker
        struct MarketQuestion {
            QuestionData question;
            ConditionData[] conditions;
        }

        event FixedProductMarketMakerCreation(
            address indexed creator,
            address fixedProductMarketMaker,
            address indexed conditionalTokens,
            address indexed collateralToken,
            bytes32[] conditionIds,
            uint256 fee
        );

        function createPolymarketFixedProductMarketMaker(
            address conditionalTokens,
            address collateralToken,
            MarketQuestion question,
            uint256 fee
        ) external returns (address);
    }
}

pub use PolymarketMarketMakerFactory::{
    ConditionData, FixedProductMarketMakerCreation, MarketQuestion, QuestionData,
};

impl MarketQuestion {
    /// Payload for a market with a single condition
    pub fn from_market(market: &crate::types::Market) -> Self {
        MarketQuestion {
            question: QuestionData {
                title: market.question.title.clone(),
                description: market.question.description.clone(),
            },
            conditions: vec![ConditionData {
                outcomes: market.condition.outcomes.clone(),
                oracle: market.condition.oracle,
            }],
        }
    }
}
