use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::utils::time::Clock;

pub type Symbol = String;
pub type ParticipantId = String;
pub type Price = f64;
pub type Quantity = u64;
/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Process-wide monotonic order id allocator.
static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique, monotonically increasing order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Allocate the next id. Unique within the process.
    pub fn next() -> Self {
        OrderId(NEXT_ORDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORDER-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub participant_id: ParticipantId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    /// Limit price; ignored for market orders.
    pub price: Price,
    pub timestamp: Timestamp,
}

impl Order {
    pub fn new_limit(
        participant_id: ParticipantId,
        symbol: Symbol,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            id: OrderId::next(),
            participant_id,
            symbol,
            side,
            order_type: OrderType::Limit,
            quantity,
            remaining_quantity: quantity,
            price,
            timestamp: Clock::millis(),
        }
    }

    pub fn new_market(
        participant_id: ParticipantId,
        symbol: Symbol,
        side: Side,
        quantity: Quantity,
    ) -> Self {
        Self {
            id: OrderId::next(),
            participant_id,
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            remaining_quantity: quantity,
            // market orders carry no price
            price: 0.0,
            timestamp: Clock::millis(),
        }
    }

    /// Reduce the remaining quantity by a fill. Caller guarantees
    /// `quantity <= remaining_quantity`.
    pub fn fill(&mut self, quantity: Quantity) {
        debug_assert!(quantity <= self.remaining_quantity);
        self.remaining_quantity -= quantity;
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// One match event between a resting and an incoming order. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub symbol: Symbol,
    pub quantity: Quantity,
    pub price: Price,
    pub timestamp: Timestamp,
}

impl Trade {
    pub fn new(
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        symbol: Symbol,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            buy_order_id,
            sell_order_id,
            symbol,
            quantity,
            price,
            timestamp: Clock::millis(),
        }
    }

    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// A market data tick for one symbol: the reference price plus a derived
/// bid/ask pair around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: Symbol,
    pub price: Price,
    pub volume: Quantity,
    pub timestamp: Timestamp,
    pub bid: Price,
    pub ask: Price,
}

impl MarketData {
    pub fn new(symbol: Symbol, price: Price, volume: Quantity, timestamp: Timestamp) -> Self {
        Self {
            symbol,
            price,
            volume,
            timestamp,
            bid: price * 0.999,
            ask: price * 1.001,
        }
    }
}
