use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::orderbook::matching::{BookEvent, BookLadder};
use crate::portfolio::Portfolio;
use crate::types::{Order, OrderId, OrderType, Price, Quantity, Side, Symbol, Trade};

pub type TradeCallback = Arc<dyn Fn(&Trade) + Send + Sync>;
pub type OrderRejectionCallback = Arc<dyn Fn(&Order, &str) + Send + Sync>;

/// One price level of a depth report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: usize,
}

/// Aggregate resting quantity for the best levels of each side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookDepth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// Point-in-time book statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookStats {
    pub symbol: Symbol,
    pub total_orders: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub last_trade_price: Option<Price>,
    pub total_trades: u64,
    pub total_volume: Quantity,
}

/// Price-time priority limit order book for one symbol.
///
/// All resting state sits behind one reader-writer lock; matching and the
/// coupled ledger updates happen inside a single write section. Trade and
/// rejection callbacks are collected into a local buffer and dispatched
/// after every book lock is released, so handlers may submit new orders.
pub struct OrderBook {
    pub symbol: Symbol,

    ladder: RwLock<BookLadder>,
    portfolio: RwLock<Option<Arc<Portfolio>>>,

    /// Latest reference price from the market data engine. Used to estimate
    /// market-order cost when the opposite side is empty.
    market_price: Mutex<Price>,

    trade_callback: Mutex<Option<TradeCallback>>,
    rejection_callback: Mutex<Option<OrderRejectionCallback>>,

    last_trade_price: Mutex<Option<Price>>,
    total_trades: AtomicU64,
    total_volume: AtomicU64,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        debug!(symbol = %symbol, "creating order book");
        Self {
            ladder: RwLock::new(BookLadder::new(symbol.clone())),
            symbol,
            portfolio: RwLock::new(None),
            market_price: Mutex::new(0.0),
            trade_callback: Mutex::new(None),
            rejection_callback: Mutex::new(None),
            last_trade_price: Mutex::new(None),
            total_trades: AtomicU64::new(0),
            total_volume: AtomicU64::new(0),
        }
    }

    /// Attach the ledger that gates admission and receives trade legs.
    pub fn set_portfolio(&self, portfolio: Arc<Portfolio>) {
        *self.portfolio.write() = Some(portfolio);
    }

    pub fn set_trade_callback<F>(&self, callback: F)
    where
        F: Fn(&Trade) + Send + Sync + 'static,
    {
        *self.trade_callback.lock() = Some(Arc::new(callback));
    }

    pub fn set_rejection_callback<F>(&self, callback: F)
    where
        F: Fn(&Order, &str) + Send + Sync + 'static,
    {
        *self.rejection_callback.lock() = Some(Arc::new(callback));
    }

    /// Submit an order. Returns true when the order was admitted; fills and
    /// rejections are reported through the callbacks. A market order that
    /// finds partial liquidity is still admitted; its fills are visible as
    /// trade events and the remainder is discarded.
    pub fn add_order(&self, order: Order) -> bool {
        if order.quantity == 0 || (order.order_type == OrderType::Limit && order.price <= 0.0) {
            debug!(order_id = %order.id, "malformed order dropped");
            return false;
        }

        if !self.validate(&order) {
            let reason = format!(
                "insufficient funds or position for participant {}",
                order.participant_id
            );
            self.dispatch(vec![BookEvent::Rejected(order, reason)]);
            return false;
        }

        let portfolio = self.portfolio.read().clone();
        let mut events = Vec::new();

        let admitted = {
            let mut ladder = self.ladder.write();
            match order.order_type {
                OrderType::Market => ladder.execute_market(&order, portfolio.as_deref(), &mut events),
                OrderType::Limit => {
                    ladder.insert_limit(order, portfolio.as_deref(), &mut events);
                    true
                }
            }
        };

        self.record_trades(&events);
        self.dispatch(events);
        admitted
    }

    /// Remove a resting order. Unknown or already-filled ids are a benign
    /// false.
    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        let removed = self.ladder.write().cancel(order_id);
        if removed {
            debug!(symbol = %self.symbol, order_id = %order_id, "order cancelled");
        }
        removed
    }

    /// Highest resting bid, or 0 when the side is empty.
    pub fn get_bid_price(&self) -> Price {
        self.best_bid().unwrap_or(0.0)
    }

    /// Lowest resting ask, or 0 when the side is empty.
    pub fn get_ask_price(&self) -> Price {
        self.best_ask().unwrap_or(0.0)
    }

    /// Midpoint of the top of book, or 0 unless both sides are present.
    pub fn get_mid_price(&self) -> Price {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => (bid + ask) / 2.0,
            _ => 0.0,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.ladder.read().best_bid()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.ladder.read().best_ask()
    }

    /// Aggregate quantity for up to `levels` best prices per side.
    pub fn get_book_depth(&self, levels: usize) -> BookDepth {
        let ladder = self.ladder.read();
        let to_depth = |entries: Vec<(Price, Quantity, usize)>| {
            entries
                .into_iter()
                .map(|(price, quantity, order_count)| DepthLevel { price, quantity, order_count })
                .collect()
        };
        BookDepth {
            bids: to_depth(ladder.depth_side(Side::Buy, levels)),
            asks: to_depth(ladder.depth_side(Side::Sell, levels)),
        }
    }

    /// Record the engine's latest reference price for admission estimates.
    pub fn update_market_price(&self, price: Price) {
        *self.market_price.lock() = price;
    }

    pub fn total_orders(&self) -> usize {
        self.ladder.read().total_orders()
    }

    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.ladder.read().contains_order(order_id)
    }

    pub fn stats(&self) -> BookStats {
        let ladder = self.ladder.read();
        BookStats {
            symbol: self.symbol.clone(),
            total_orders: ladder.total_orders(),
            bid_levels: ladder.bid_level_count(),
            ask_levels: ladder.ask_level_count(),
            best_bid: ladder.best_bid(),
            best_ask: ladder.best_ask(),
            last_trade_price: *self.last_trade_price.lock(),
            total_trades: self.total_trades.load(Ordering::Relaxed),
            total_volume: self.total_volume.load(Ordering::Relaxed),
        }
    }

    /// Admission check against the attached ledger. Without a ledger the
    /// book runs open (unit-test mode). A pure snapshot read: admission is
    /// advisory and is not re-checked under the write lock.
    fn validate(&self, order: &Order) -> bool {
        let portfolio = self.portfolio.read();
        let Some(portfolio) = portfolio.as_ref() else {
            return true;
        };

        match order.side {
            Side::Buy => {
                let execution_price = self.estimate_buy_execution_price();
                if execution_price == 0.0 {
                    // no resting ask and no reference price: a market
                    // order's cost cannot be estimated, a limit order is
                    // admitted and checked when a price exists
                    return order.order_type == OrderType::Limit;
                }
                let price_to_check = match order.order_type {
                    OrderType::Market => execution_price,
                    OrderType::Limit => order.price,
                };
                portfolio.can_buy(&order.participant_id, &order.symbol, order.quantity, price_to_check)
            }
            Side::Sell => portfolio.can_sell(&order.participant_id, &order.symbol, order.quantity),
        }
    }

    /// Best ask when present, else the last reference price (0 when neither
    /// is known).
    fn estimate_buy_execution_price(&self) -> Price {
        if let Some(ask) = self.ladder.read().best_ask() {
            return ask;
        }
        *self.market_price.lock()
    }

    fn record_trades(&self, events: &[BookEvent]) {
        let mut last_price = None;
        let mut trades = 0u64;
        let mut volume = 0u64;
        for event in events {
            if let BookEvent::Trade(trade) = event {
                trades += 1;
                volume += trade.quantity;
                last_price = Some(trade.price);
            }
        }
        if trades > 0 {
            self.total_trades.fetch_add(trades, Ordering::Relaxed);
            self.total_volume.fetch_add(volume, Ordering::Relaxed);
            *self.last_trade_price.lock() = last_price;
        }
    }

    /// Deliver buffered events in matching order. Callback references are
    /// cloned out of their slots so no lock is held while user code runs.
    fn dispatch(&self, events: Vec<BookEvent>) {
        if events.is_empty() {
            return;
        }
        let trade_cb = self.trade_callback.lock().clone();
        let rejection_cb = self.rejection_callback.lock().clone();

        for event in events {
            match event {
                BookEvent::Trade(trade) => {
                    if let Some(cb) = &trade_cb {
                        cb(&trade);
                    }
                }
                BookEvent::Rejected(order, reason) => {
                    if let Some(cb) = &rejection_cb {
                        cb(&order, &reason);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("symbol", &self.symbol)
            .field("total_orders", &self.total_orders())
            .finish()
    }
}
