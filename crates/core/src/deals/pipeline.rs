//! Read models derived from the deal collection: kanban board and headline figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Deal, DealStage};

/// Stages rendered as board columns, left to right. Lost deals drop off the board.
pub const BOARD_COLUMNS: [DealStage; 5] = [
    DealStage::Lead,
    DealStage::Qualified,
    DealStage::Proposal,
    DealStage::Negotiation,
    DealStage::ClosedWon,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineColumn {
    pub stage: DealStage,
    pub deals: Vec<Deal>,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub total_value: Decimal,
    pub active_deals: usize,
    pub average_ticket: Decimal,
}

/// Groups deals into board columns, keeping collection order inside each column.
pub fn build_board(deals: &[Deal]) -> Vec<PipelineColumn> {
    BOARD_COLUMNS
        .iter()
        .map(|stage| {
            let column: Vec<Deal> = deals.iter().filter(|d| d.stage == *stage).cloned().collect();
            let total_value = column.iter().map(|d| d.value).sum();
            PipelineColumn {
                stage: *stage,
                deals: column,
                total_value,
            }
        })
        .collect()
}

pub fn summarize(deals: &[Deal]) -> PipelineSummary {
    let total_value: Decimal = deals.iter().map(|d| d.value).sum();
    let active_deals = deals.len();
    let average_ticket = if active_deals > 0 {
        total_value / Decimal::from(active_deals)
    } else {
        Decimal::ZERO
    };
    PipelineSummary {
        total_value,
        active_deals,
        average_ticket,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;
    use rust_decimal_macros::dec;

    #[test]
    fn board_has_five_columns_in_stage_order() {
        let board = build_board(&Deal::seed());
        let stages: Vec<DealStage> = board.iter().map(|c| c.stage).collect();
        assert_eq!(stages, BOARD_COLUMNS.to_vec());

        let negotiation = &board[3];
        assert_eq!(negotiation.deals.len(), 1);
        assert_eq!(negotiation.deals[0].id, "d1");
        assert_eq!(negotiation.total_value, dec!(125000));
        assert!(board[1].deals.is_empty());
    }

    #[test]
    fn lost_deals_are_not_on_the_board() {
        let mut deals = Deal::seed();
        deals[0].stage = DealStage::ClosedLost;
        let on_board: usize = build_board(&deals).iter().map(|c| c.deals.len()).sum();
        assert_eq!(on_board, 3);
    }

    #[test]
    fn summary_of_seed_pipeline() {
        let summary = summarize(&Deal::seed());
        assert_eq!(summary.total_value, dec!(203000));
        assert_eq!(summary.active_deals, 4);
        assert_eq!(summary.average_ticket, dec!(50750));
    }

    #[test]
    fn summary_of_empty_pipeline_is_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.active_deals, 0);
        assert_eq!(summary.average_ticket, Decimal::ZERO);
    }
}
