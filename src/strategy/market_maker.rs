use std::collections::HashMap;
use tracing::debug;

use crate::strategy::{Strategy, StrategyContext};
use crate::types::{MarketData, Order, Price, Quantity, Side, Symbol, Trade};

/// Quoting parameters for [`MarketMakerStrategy`].
#[derive(Debug, Clone)]
pub struct MarketMakerConfig {
    /// Full quoted spread in basis points.
    pub spread_bps: u32,
    /// Size of each quote.
    pub quote_size: Quantity,
    /// Maximum absolute position per symbol.
    pub max_position: i64,
    /// How strongly inventory shifts both quotes (0 = none, 1 = a full
    /// half-spread at max position).
    pub inventory_skew: f64,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            spread_bps: 50,
            quote_size: 100,
            max_position: 1000,
            inventory_skew: 0.5,
        }
    }
}

#[derive(Debug, Default)]
struct SymbolQuotes {
    bid: Option<Order>,
    ask: Option<Order>,
}

/// Provides liquidity by quoting both sides around the tick price,
/// skewing quotes against accumulated inventory.
pub struct MarketMakerStrategy {
    participant_id: String,
    config: MarketMakerConfig,
    quotes: HashMap<Symbol, SymbolQuotes>,
    last_price: HashMap<Symbol, Price>,
    last_quoted_price: HashMap<Symbol, Price>,
}

impl MarketMakerStrategy {
    pub fn new(participant_id: &str, symbols: &[Symbol], config: MarketMakerConfig) -> Self {
        let mut quotes = HashMap::new();
        for symbol in symbols {
            quotes.insert(symbol.clone(), SymbolQuotes::default());
        }
        Self {
            participant_id: participant_id.to_string(),
            config,
            quotes,
            last_price: HashMap::new(),
            last_quoted_price: HashMap::new(),
        }
    }

    fn should_update_quotes(&self, symbol: &str, current_price: Price) -> bool {
        let Some(quotes) = self.quotes.get(symbol) else {
            return false;
        };
        if quotes.bid.is_none() || quotes.ask.is_none() {
            return true;
        }
        match self.last_quoted_price.get(symbol) {
            // re-quote on a 0.1% move
            Some(quoted) if *quoted > 0.0 => (current_price - quoted).abs() / quoted > 0.001,
            _ => true,
        }
    }

    fn update_quotes(&mut self, ctx: &StrategyContext<'_>, symbol: &str, current_price: Price) {
        self.cancel_quotes(ctx, symbol);

        let position = ctx.position(&self.participant_id, symbol);
        let half_spread = current_price * (self.config.spread_bps as f64 / 10_000.0) / 2.0;
        let inventory_ratio = position as f64 / self.config.max_position as f64;
        let skew = inventory_ratio * self.config.inventory_skew * half_spread;

        let bid_price = (current_price - half_spread - skew).max(0.01);
        let ask_price = (current_price + half_spread - skew).max(bid_price + 0.01);

        let quote_size = self.config.quote_size as i64;
        let can_bid = (position + quote_size).abs() <= self.config.max_position
            && position < self.config.max_position;
        let can_ask = (position - quote_size).abs() <= self.config.max_position
            && position > -self.config.max_position;

        if can_bid {
            if let Some(order) = ctx.submit_limit_order(
                &self.participant_id,
                symbol,
                Side::Buy,
                self.config.quote_size,
                bid_price,
            ) {
                debug!(
                    participant = %self.participant_id,
                    symbol,
                    price = bid_price,
                    size = self.config.quote_size,
                    "bid quoted"
                );
                self.quotes.entry(symbol.to_string()).or_default().bid = Some(order);
            }
        }

        if can_ask {
            if let Some(order) = ctx.submit_limit_order(
                &self.participant_id,
                symbol,
                Side::Sell,
                self.config.quote_size,
                ask_price,
            ) {
                debug!(
                    participant = %self.participant_id,
                    symbol,
                    price = ask_price,
                    size = self.config.quote_size,
                    "ask quoted"
                );
                self.quotes.entry(symbol.to_string()).or_default().ask = Some(order);
            }
        }

        self.last_quoted_price.insert(symbol.to_string(), current_price);
    }

    fn cancel_quotes(&mut self, ctx: &StrategyContext<'_>, symbol: &str) {
        let Some(quotes) = self.quotes.get_mut(symbol) else {
            return;
        };
        if let Some(bid) = quotes.bid.take() {
            ctx.cancel_order(symbol, bid.id);
        }
        if let Some(ask) = quotes.ask.take() {
            ctx.cancel_order(symbol, ask.id);
        }
    }
}

impl Strategy for MarketMakerStrategy {
    fn participant_id(&self) -> &str {
        &self.participant_id
    }

    fn on_market_data(&mut self, ctx: &StrategyContext<'_>, market_data: &MarketData) {
        let symbol = market_data.symbol.clone();
        if !self.quotes.contains_key(&symbol) {
            return;
        }
        self.last_price.insert(symbol.clone(), market_data.price);

        if self.should_update_quotes(&symbol, market_data.price) {
            self.update_quotes(ctx, &symbol, market_data.price);
        }
    }

    fn on_trade(&mut self, ctx: &StrategyContext<'_>, trade: &Trade) {
        let Some(quotes) = self.quotes.get_mut(&trade.symbol) else {
            return;
        };

        let bought = quotes.bid.as_ref().is_some_and(|o| o.id == trade.buy_order_id);
        let sold = quotes.ask.as_ref().is_some_and(|o| o.id == trade.sell_order_id);
        if !bought && !sold {
            return;
        }

        if bought {
            quotes.bid = None;
            debug!(participant = %self.participant_id, symbol = %trade.symbol,
                quantity = trade.quantity, price = trade.price, "bought");
        }
        if sold {
            quotes.ask = None;
            debug!(participant = %self.participant_id, symbol = %trade.symbol,
                quantity = trade.quantity, price = trade.price, "sold");
        }

        let price = self
            .last_price
            .get(&trade.symbol)
            .copied()
            .unwrap_or(trade.price);
        let symbol = trade.symbol.clone();
        self.update_quotes(ctx, &symbol, price);
    }

    fn on_order_rejection(&mut self, _ctx: &StrategyContext<'_>, order: &Order, reason: &str) {
        debug!(participant = %self.participant_id, order_id = %order.id, reason, "quote rejected");
        if let Some(quotes) = self.quotes.get_mut(&order.symbol) {
            if quotes.bid.as_ref().is_some_and(|o| o.id == order.id) {
                quotes.bid = None;
            }
            if quotes.ask.as_ref().is_some_and(|o| o.id == order.id) {
                quotes.ask = None;
            }
        }
    }
}
