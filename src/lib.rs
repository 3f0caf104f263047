//! Multi-Symbol Stock Market Simulator
//!
//! An in-memory simulated exchange built from three subsystems:
//!
//! - **Order books**: one price-time priority limit book per symbol, with
//!   admission gating, cancellation, and depth snapshots
//! - **Portfolio ledger**: participant cash and positions, updated
//!   atomically for both sides of every execution
//! - **Market data engine**: a background producer that drives each
//!   symbol's reference price under geometric Brownian motion and fans out
//!   ticks at 10 Hz
//!
//! The [`Exchange`] wires the three together and pumps ticks into trading
//! strategies.
//!
//! # Quick Start
//!
//! ```rust
//! use market_simulator::{Exchange, Order, Side};
//!
//! let exchange = Exchange::with_seed(42);
//! exchange.add_symbol("AAPL", 150.0);
//! exchange.add_participant("alice", 10_000.0);
//! exchange.add_participant("bob", 10_000.0);
//! exchange.portfolio().set_initial_position("bob", "AAPL", 100, 0.0);
//!
//! exchange.submit_order(Order::new_limit(
//!     "bob".to_string(), "AAPL".to_string(), Side::Sell, 50, 149.0,
//! ));
//! exchange.submit_order(Order::new_limit(
//!     "alice".to_string(), "AAPL".to_string(), Side::Buy, 50, 150.0,
//! ));
//!
//! assert_eq!(exchange.trade_history().len(), 1);
//! ```
//!
//! # Architecture
//!
//! Each order book keeps its two price ladders and active-order index
//! behind a single reader-writer lock; matching and the coupled ledger
//! updates happen in one write section, and callbacks fire only after the
//! locks are released, so handlers can submit new orders freely. The
//! market data engine owns one producer thread and a seedable generator.

pub mod exchange;
pub mod marketdata;
pub mod metrics;
pub mod orderbook;
pub mod portfolio;
pub mod strategy;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use exchange::{Exchange, ExchangeError, ParticipantSummary, SymbolSummary};
pub use marketdata::MarketDataEngine;
pub use metrics::SimulatorMetrics;
pub use orderbook::{BookDepth, BookStats, DepthLevel, OrderBook};
pub use portfolio::{Portfolio, PortfolioError};
pub use strategy::{MarketMakerStrategy, MomentumStrategy, Strategy, StrategyContext};
pub use types::{
    MarketData, Order, OrderId, OrderType, ParticipantId, Price, Quantity, Side, Symbol,
    Timestamp, Trade,
};
