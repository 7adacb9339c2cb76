// =============================================================================
// Trade Setup & P&L Projection
// =============================================================================
//
// Pure arithmetic on the latest bar and the user's position:
//
//   entry       = latest close
//   stop_loss   = latest low   - stop_loss_pct   * close   (5 % default)
//   take_profit = latest close + take_profit_pct * close   (2 % default)
//
//   max_loss = (entry - stop_loss)   * shares
//   max_gain = (take_profit - entry) * shares
//
// Realised P&L against the purchase price:
//   pnl     = (current - purchase) * shares
//   pnl_pct = pnl / (purchase * shares) * 100, undefined when purchase == 0
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine_config::TradeSetupParams;
use crate::types::{PositionInput, PriceBar};

/// Stop / target levels and the money at stake for a long entry at the close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSetup {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_per_share: f64,
    pub reward_per_share: f64,
    /// Reward as a multiple of risk (the "R" of the target); `None` when the
    /// stop sits at or above the entry.
    pub reward_to_risk: Option<f64>,
    pub shares: u32,
    pub max_loss: f64,
    pub max_gain: f64,
}

impl TradeSetup {
    /// Project the setup from the latest bar.
    pub fn project(latest: &PriceBar, shares: u32, params: &TradeSetupParams) -> Self {
        let entry = latest.close;
        let stop_loss = latest.low - params.stop_loss_pct * entry;
        let take_profit = entry + params.take_profit_pct * entry;

        let risk_per_share = entry - stop_loss;
        let reward_per_share = take_profit - entry;
        let qty = f64::from(shares);

        let reward_to_risk = if risk_per_share > 0.0 {
            Some(reward_per_share / risk_per_share)
        } else {
            None
        };

        let setup = Self {
            entry,
            stop_loss,
            take_profit,
            risk_per_share,
            reward_per_share,
            reward_to_risk,
            shares,
            max_loss: risk_per_share * qty,
            max_gain: reward_per_share * qty,
        };

        debug!(
            entry,
            stop_loss = format!("{:.4}", stop_loss),
            take_profit = format!("{:.4}", take_profit),
            shares,
            "trade setup projected"
        );

        setup
    }
}

/// Realised P&L of the user's position at the current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionPnl {
    pub current_price: f64,
    pub purchase_price: f64,
    pub shares: u32,
    /// `false` when the purchase price is 0 ("not tracked").
    pub tracked: bool,
    pub pnl: f64,
    /// Percentage P&L; `None` (not applicable) when the purchase price is 0.
    pub pnl_pct: Option<f64>,
}

impl PositionPnl {
    pub fn compute(current_price: f64, position: &PositionInput) -> Self {
        let qty = f64::from(position.shares);
        let pnl = (current_price - position.purchase_price) * qty;

        let pnl_pct = if position.purchase_price > 0.0 {
            let pct = (current_price - position.purchase_price) / position.purchase_price * 100.0;
            pct.is_finite().then_some(pct)
        } else {
            None
        };

        Self {
            current_price,
            purchase_price: position.purchase_price,
            shares: position.shares,
            tracked: position.tracks_purchase(),
            pnl,
            pnl_pct,
        }
    }
}
