//! Trading strategies driven by market data ticks.
//!
//! A strategy is owned by the exchange and invoked from the market data
//! pump. Callbacks receive a [`StrategyContext`] for order submission and
//! portfolio queries; no exchange lock is held while a strategy runs, so
//! submitting from inside a callback is safe.

pub mod market_maker;
pub mod momentum;

pub use market_maker::{MarketMakerConfig, MarketMakerStrategy};
pub use momentum::MomentumStrategy;

use tracing::warn;

use crate::exchange::ExchangeCore;
use crate::types::{MarketData, Order, OrderId, Price, Quantity, Side, Trade};

/// A trading participant reacting to market events.
pub trait Strategy: Send {
    fn participant_id(&self) -> &str;

    /// Called for every market data tick.
    fn on_market_data(&mut self, ctx: &StrategyContext<'_>, market_data: &MarketData);

    /// Called for every trade on the exchange, after the callback that
    /// produced it has returned.
    fn on_trade(&mut self, ctx: &StrategyContext<'_>, trade: &Trade);

    /// Called when one of this strategy's orders is rejected.
    fn on_order_rejection(&mut self, ctx: &StrategyContext<'_>, order: &Order, reason: &str);
}

/// Strategy-facing view of the exchange.
pub struct StrategyContext<'a> {
    core: &'a ExchangeCore,
}

impl<'a> StrategyContext<'a> {
    pub(crate) fn new(core: &'a ExchangeCore) -> Self {
        Self { core }
    }

    /// Submit a limit order. Returns the order when it was admitted.
    pub fn submit_limit_order(
        &self,
        participant_id: &str,
        symbol: &str,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Option<Order> {
        self.submit(Order::new_limit(
            participant_id.to_string(),
            symbol.to_string(),
            side,
            quantity,
            price,
        ))
    }

    /// Submit a market order. Returns the order when it was admitted.
    pub fn submit_market_order(
        &self,
        participant_id: &str,
        symbol: &str,
        side: Side,
        quantity: Quantity,
    ) -> Option<Order> {
        self.submit(Order::new_market(
            participant_id.to_string(),
            symbol.to_string(),
            side,
            quantity,
        ))
    }

    pub fn cancel_order(&self, symbol: &str, order_id: OrderId) -> bool {
        match self.core.book(symbol) {
            Some(book) => book.cancel_order(order_id),
            None => false,
        }
    }

    pub fn position(&self, participant_id: &str, symbol: &str) -> i64 {
        self.core.portfolio().get_position(participant_id, symbol).unwrap_or(0)
    }

    pub fn cash(&self, participant_id: &str) -> f64 {
        self.core.portfolio().get_cash(participant_id).unwrap_or(0.0)
    }

    pub fn pnl(&self, participant_id: &str) -> f64 {
        let prices = self.core.prices();
        self.core.portfolio().get_pnl(participant_id, &prices).unwrap_or(0.0)
    }

    pub fn portfolio_value(&self, participant_id: &str) -> f64 {
        let prices = self.core.prices();
        self.core
            .portfolio()
            .get_portfolio_value(participant_id, &prices)
            .unwrap_or(0.0)
    }

    /// Latest engine reference price, 0.0 for unknown symbols.
    pub fn current_price(&self, symbol: &str) -> Price {
        self.core.current_price(symbol)
    }

    fn submit(&self, order: Order) -> Option<Order> {
        let Some(book) = self.core.book(&order.symbol) else {
            warn!(symbol = %order.symbol, "no order book for symbol");
            return None;
        };
        if book.add_order(order.clone()) {
            Some(order)
        } else {
            None
        }
    }
}
