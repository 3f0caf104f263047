use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::strategy::{Strategy, StrategyContext};
use crate::types::{MarketData, Order, Price, Quantity, Side, Symbol, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Buy,
    Sell,
}

/// Buys into rising prices and sells into falling ones: compares the
/// current tick against the oldest price in a rolling lookback window and
/// flips position when the move exceeds a threshold.
pub struct MomentumStrategy {
    participant_id: String,
    lookback_period: usize,
    momentum_threshold: f64,
    position_size: Quantity,
    history: HashMap<Symbol, VecDeque<Price>>,
    last_signal: HashMap<Symbol, Signal>,
}

impl MomentumStrategy {
    pub fn new(
        participant_id: &str,
        symbols: &[Symbol],
        lookback_period: usize,
        momentum_threshold: f64,
        position_size: Quantity,
    ) -> Self {
        let mut history = HashMap::new();
        for symbol in symbols {
            history.insert(symbol.clone(), VecDeque::with_capacity(lookback_period));
        }
        Self {
            participant_id: participant_id.to_string(),
            lookback_period,
            momentum_threshold,
            position_size,
            history,
            last_signal: HashMap::new(),
        }
    }

    fn execute_signal(&self, ctx: &StrategyContext<'_>, symbol: &str, signal: Signal) {
        let position = ctx.position(&self.participant_id, symbol);

        match signal {
            Signal::Buy if position <= 0 => {
                // cover any short before going long
                let quantity = self.position_size + position.unsigned_abs();
                if ctx
                    .submit_market_order(&self.participant_id, symbol, Side::Buy, quantity)
                    .is_some()
                {
                    debug!(participant = %self.participant_id, symbol, quantity, "momentum buy");
                }
            }
            Signal::Sell if position > 0 => {
                // shorting is disallowed, so a sell signal unwinds the long
                let quantity = position.unsigned_abs();
                if ctx
                    .submit_market_order(&self.participant_id, symbol, Side::Sell, quantity)
                    .is_some()
                {
                    debug!(participant = %self.participant_id, symbol, quantity, "momentum sell");
                }
            }
            _ => {}
        }
    }
}

impl Strategy for MomentumStrategy {
    fn participant_id(&self) -> &str {
        &self.participant_id
    }

    fn on_market_data(&mut self, ctx: &StrategyContext<'_>, market_data: &MarketData) {
        let Some(history) = self.history.get_mut(&market_data.symbol) else {
            return;
        };

        history.push_back(market_data.price);
        if history.len() > self.lookback_period {
            history.pop_front();
        }
        if history.len() < self.lookback_period {
            return;
        }

        let oldest = history.front().copied().unwrap_or(market_data.price);
        if oldest <= 0.0 {
            return;
        }
        let momentum = (market_data.price - oldest) / oldest;

        let signal = if momentum > self.momentum_threshold {
            Some(Signal::Buy)
        } else if momentum < -self.momentum_threshold {
            Some(Signal::Sell)
        } else {
            None
        };

        // act once per signal edge
        if let Some(signal) = signal {
            if self.last_signal.get(&market_data.symbol) != Some(&signal) {
                self.execute_signal(ctx, &market_data.symbol, signal);
                self.last_signal.insert(market_data.symbol.clone(), signal);
            }
        }
    }

    fn on_trade(&mut self, _ctx: &StrategyContext<'_>, _trade: &Trade) {}

    fn on_order_rejection(&mut self, _ctx: &StrategyContext<'_>, order: &Order, reason: &str) {
        debug!(participant = %self.participant_id, order_id = %order.id, reason, "order rejected");
    }
}
