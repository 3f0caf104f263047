//! Coordination glue: wires the portfolio ledger, per-symbol order books,
//! and the market data engine into one exchange instance, and pumps market
//! data ticks into registered strategies and external observers.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{info, warn};

use crate::marketdata::MarketDataEngine;
use crate::orderbook::{BookDepth, OrderBook};
use crate::portfolio::Portfolio;
use crate::strategy::{Strategy, StrategyContext};
use crate::types::{MarketData, Order, OrderId, ParticipantId, Price, Symbol, Trade};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeError {
    /// Start was requested before symbols or participants were registered
    NotConfigured(String),
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::NotConfigured(what) => {
                write!(f, "exchange not configured: {}", what)
            }
        }
    }
}

impl std::error::Error for ExchangeError {}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Per-participant report used by [`Exchange::portfolio_summary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub cash: f64,
    pub portfolio_value: f64,
    pub pnl: f64,
    pub positions: HashMap<Symbol, i64>,
}

/// Per-symbol report used by [`Exchange::market_summary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub current_price: Price,
    pub bid: Price,
    pub ask: Price,
    pub mid: Price,
    pub spread: Price,
    pub depth: BookDepth,
}

type TradeObserver = Arc<dyn Fn(&Trade) + Send + Sync>;
type MarketDataObserver = Arc<dyn Fn(&MarketData) + Send + Sync>;
type RejectionObserver = Arc<dyn Fn(&Order, &str) + Send + Sync>;

type SharedStrategy = Arc<Mutex<Box<dyn Strategy>>>;

pub(crate) struct ExchangeCore {
    portfolio: Arc<Portfolio>,
    books: DashMap<Symbol, Arc<OrderBook>>,
    market_data: MarketDataEngine,
    strategies: Mutex<Vec<SharedStrategy>>,

    trade_log: Mutex<Vec<Trade>>,
    /// Trades awaiting delivery to strategies. Filled by book callbacks,
    /// drained after the strategy callback on the stack has returned, so a
    /// strategy mutex is never re-entered.
    pending_trades: Mutex<VecDeque<Trade>>,
    pending_rejections: Mutex<VecDeque<(Order, String)>>,

    trade_observers: Mutex<Vec<TradeObserver>>,
    market_data_observers: Mutex<Vec<MarketDataObserver>>,
    rejection_observers: Mutex<Vec<RejectionObserver>>,

    running: AtomicBool,
    market_maker_count: AtomicUsize,
}

impl ExchangeCore {
    pub(crate) fn book(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.books.get(symbol).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub(crate) fn prices(&self) -> HashMap<Symbol, Price> {
        self.market_data.get_all_prices()
    }

    pub(crate) fn current_price(&self, symbol: &str) -> Price {
        self.market_data.get_current_price(symbol)
    }

    /// Book-callback entry: log the trade, notify observers, and queue it
    /// for strategy delivery.
    fn record_trade(&self, trade: &Trade) {
        self.trade_log.lock().push(trade.clone());
        self.pending_trades.lock().push_back(trade.clone());

        let observers = self.trade_observers.lock().clone();
        for observer in observers {
            observer(trade);
        }
    }

    fn record_rejection(&self, order: &Order, reason: &str) {
        self.pending_rejections
            .lock()
            .push_back((order.clone(), reason.to_string()));

        let observers = self.rejection_observers.lock().clone();
        for observer in observers {
            observer(order, reason);
        }
    }

    fn handle_market_data(&self, market_data: &MarketData) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        if let Some(book) = self.book(&market_data.symbol) {
            book.update_market_price(market_data.price);
        }

        let strategies = self.strategies.lock().clone();
        for strategy in &strategies {
            {
                let ctx = StrategyContext::new(self);
                strategy.lock().on_market_data(&ctx, market_data);
            }
            // fills and rejections produced by this strategy are delivered
            // before the next one runs
            self.deliver_pending();
        }

        let observers = self.market_data_observers.lock().clone();
        for observer in observers {
            observer(market_data);
        }
    }

    /// Drain queued trades and rejections to strategies. Deliveries may
    /// generate further trades; the loop runs until the queues are dry.
    fn deliver_pending(&self) {
        loop {
            let next_trade = self.pending_trades.lock().pop_front();
            if let Some(trade) = next_trade {
                let strategies = self.strategies.lock().clone();
                for strategy in &strategies {
                    let ctx = StrategyContext::new(self);
                    strategy.lock().on_trade(&ctx, &trade);
                }
                continue;
            }

            let next_rejection = self.pending_rejections.lock().pop_front();
            if let Some((order, reason)) = next_rejection {
                let strategies = self.strategies.lock().clone();
                for strategy in &strategies {
                    let mut strategy = strategy.lock();
                    if strategy.participant_id() == order.participant_id {
                        let ctx = StrategyContext::new(self);
                        strategy.on_order_rejection(&ctx, &order, &reason);
                    }
                }
                continue;
            }

            break;
        }
    }
}

/// A complete in-memory exchange: ledger, books, and synthetic market data.
pub struct Exchange {
    core: Arc<ExchangeCore>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::build(MarketDataEngine::new())
    }

    /// Exchange with a deterministically seeded market data engine.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(MarketDataEngine::with_seed(seed))
    }

    fn build(market_data: MarketDataEngine) -> Self {
        Self {
            core: Arc::new(ExchangeCore {
                portfolio: Arc::new(Portfolio::new()),
                books: DashMap::new(),
                market_data,
                strategies: Mutex::new(Vec::new()),
                trade_log: Mutex::new(Vec::new()),
                pending_trades: Mutex::new(VecDeque::new()),
                pending_rejections: Mutex::new(VecDeque::new()),
                trade_observers: Mutex::new(Vec::new()),
                market_data_observers: Mutex::new(Vec::new()),
                rejection_observers: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                market_maker_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Register a symbol: creates its order book and seeds the market data
    /// engine with the initial price.
    pub fn add_symbol(&self, symbol: &str, initial_price: Price) {
        self.core.market_data.add_symbol(symbol, initial_price);

        let book = Arc::new(OrderBook::new(symbol.to_string()));
        book.set_portfolio(Arc::clone(&self.core.portfolio));

        let weak: Weak<ExchangeCore> = Arc::downgrade(&self.core);
        book.set_trade_callback(move |trade| {
            if let Some(core) = weak.upgrade() {
                core.record_trade(trade);
            }
        });

        let weak: Weak<ExchangeCore> = Arc::downgrade(&self.core);
        book.set_rejection_callback(move |order, reason| {
            if let Some(core) = weak.upgrade() {
                core.record_rejection(order, reason);
            }
        });

        self.core.books.insert(symbol.to_string(), book);
        info!(symbol, price = initial_price, "symbol listed");
    }

    pub fn add_participant(&self, participant_id: &str, initial_cash: f64) {
        self.core.portfolio.add_participant(participant_id, initial_cash);
    }

    pub fn add_participants(&self, participants: &HashMap<ParticipantId, f64>) {
        for (pid, cash) in participants {
            self.add_participant(pid, *cash);
        }
    }

    /// Seed positions at the current market price as cost basis.
    pub fn set_initial_positions(&self, participant_id: &str, positions: &HashMap<Symbol, i64>) {
        for (symbol, quantity) in positions {
            let cost_basis = self.core.market_data.get_current_price(symbol);
            self.core
                .portfolio
                .set_initial_position(participant_id, symbol, *quantity, cost_basis);
        }
    }

    pub fn add_strategy(&self, strategy: Box<dyn Strategy>) {
        self.core.strategies.lock().push(Arc::new(Mutex::new(strategy)));
    }

    /// Register a liquidity-providing market maker with its own funded
    /// participant. Returns the generated participant id.
    pub fn add_market_maker(
        &self,
        initial_cash: f64,
        initial_positions: &HashMap<Symbol, i64>,
    ) -> ParticipantId {
        let n = self.core.market_maker_count.fetch_add(1, Ordering::SeqCst) + 1;
        let participant_id = format!("__market_maker_{n}");

        self.add_participant(&participant_id, initial_cash);
        self.set_initial_positions(&participant_id, initial_positions);

        let symbols = self.core.market_data.symbols();
        let config = crate::strategy::MarketMakerConfig {
            spread_bps: 30,
            quote_size: 50,
            max_position: 500,
            inventory_skew: 0.3,
        };
        self.add_strategy(Box::new(crate::strategy::MarketMakerStrategy::new(
            &participant_id,
            &symbols,
            config,
        )));
        participant_id
    }

    pub fn on_trade<F>(&self, observer: F)
    where
        F: Fn(&Trade) + Send + Sync + 'static,
    {
        self.core.trade_observers.lock().push(Arc::new(observer));
    }

    pub fn on_market_data<F>(&self, observer: F)
    where
        F: Fn(&MarketData) + Send + Sync + 'static,
    {
        self.core.market_data_observers.lock().push(Arc::new(observer));
    }

    pub fn on_order_rejection<F>(&self, observer: F)
    where
        F: Fn(&Order, &str) + Send + Sync + 'static,
    {
        self.core.rejection_observers.lock().push(Arc::new(observer));
    }

    /// Route an order to its symbol's book. Strategies are notified of any
    /// resulting fills before this returns.
    pub fn submit_order(&self, order: Order) -> bool {
        let Some(book) = self.core.book(&order.symbol) else {
            warn!(symbol = %order.symbol, "no order book for symbol");
            return false;
        };
        let admitted = book.add_order(order);
        self.core.deliver_pending();
        admitted
    }

    pub fn cancel_order(&self, symbol: &str, order_id: OrderId) -> bool {
        match self.core.book(symbol) {
            Some(book) => book.cancel_order(order_id),
            None => false,
        }
    }

    pub fn order_book(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.core.book(symbol)
    }

    pub fn portfolio(&self) -> Arc<Portfolio> {
        Arc::clone(&self.core.portfolio)
    }

    pub fn get_current_price(&self, symbol: &str) -> Price {
        self.core.market_data.get_current_price(symbol)
    }

    pub fn get_all_prices(&self) -> HashMap<Symbol, Price> {
        self.core.market_data.get_all_prices()
    }

    /// Start the market data engine and begin pumping ticks to strategies.
    pub fn start(&self) -> ExchangeResult<()> {
        if self.core.books.is_empty() {
            return Err(ExchangeError::NotConfigured("no symbols registered".to_string()));
        }
        if self.core.portfolio.participant_ids().is_empty() {
            return Err(ExchangeError::NotConfigured("no participants registered".to_string()));
        }

        self.core.running.store(true, Ordering::SeqCst);

        let weak: Weak<ExchangeCore> = Arc::downgrade(&self.core);
        self.core.market_data.set_callback(move |market_data| {
            if let Some(core) = weak.upgrade() {
                core.handle_market_data(market_data);
            }
        });
        self.core.market_data.start();

        info!(
            symbols = self.core.books.len(),
            strategies = self.core.strategies.lock().len(),
            "simulation started"
        );
        Ok(())
    }

    pub fn stop(&self) {
        self.core.running.store(false, Ordering::SeqCst);
        self.core.market_data.stop();
        info!("simulation stopped");
    }

    pub fn is_running(&self) -> bool {
        self.core.running.load(Ordering::SeqCst)
    }

    /// Start, run for `duration`, stop.
    pub fn run_for(&self, duration: Duration) -> ExchangeResult<()> {
        self.start()?;
        std::thread::sleep(duration);
        self.stop();
        Ok(())
    }

    /// Every trade executed so far, in log order.
    pub fn trade_history(&self) -> Vec<Trade> {
        self.core.trade_log.lock().clone()
    }

    /// Cash, value, PnL, and positions for every participant.
    pub fn portfolio_summary(&self) -> HashMap<ParticipantId, ParticipantSummary> {
        let prices = self.core.market_data.get_all_prices();
        let symbols: Vec<Symbol> = self.core.market_data.symbols();

        let mut summary = HashMap::new();
        for pid in self.core.portfolio.participant_ids() {
            let positions = symbols
                .iter()
                .filter_map(|symbol| {
                    self.core
                        .portfolio
                        .get_position(&pid, symbol)
                        .ok()
                        .filter(|qty| *qty != 0)
                        .map(|qty| (symbol.clone(), qty))
                })
                .collect();

            let entry = ParticipantSummary {
                cash: self.core.portfolio.get_cash(&pid).unwrap_or(0.0),
                portfolio_value: self
                    .core
                    .portfolio
                    .get_portfolio_value(&pid, &prices)
                    .unwrap_or(0.0),
                pnl: self.core.portfolio.get_pnl(&pid, &prices).unwrap_or(0.0),
                positions,
            };
            summary.insert(pid, entry);
        }
        summary
    }

    /// Current price, top of book, and depth for every listed symbol.
    pub fn market_summary(&self) -> HashMap<Symbol, SymbolSummary> {
        let prices = self.core.market_data.get_all_prices();

        self.core
            .books
            .iter()
            .map(|entry| {
                let (symbol, book) = (entry.key().clone(), entry.value());
                let bid = book.get_bid_price();
                let ask = book.get_ask_price();
                let summary = SymbolSummary {
                    current_price: prices.get(&symbol).copied().unwrap_or(0.0),
                    bid,
                    ask,
                    mid: book.get_mid_price(),
                    spread: if bid > 0.0 && ask > 0.0 { ask - bid } else { 0.0 },
                    depth: book.get_book_depth(5),
                };
                (symbol, summary)
            })
            .collect()
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn limit(pid: &str, symbol: &str, side: Side, quantity: u64, price: f64) -> Order {
        Order::new_limit(pid.to_string(), symbol.to_string(), side, quantity, price)
    }

    #[test]
    fn test_start_requires_configuration() {
        let exchange = Exchange::with_seed(1);
        assert!(matches!(exchange.start(), Err(ExchangeError::NotConfigured(_))));

        exchange.add_symbol("AAPL", 150.0);
        assert!(matches!(exchange.start(), Err(ExchangeError::NotConfigured(_))));

        exchange.add_participant("alice", 10_000.0);
        assert!(exchange.start().is_ok());
        assert!(exchange.is_running());
        exchange.stop();
        assert!(!exchange.is_running());
    }

    #[test]
    fn test_cancel_through_exchange() {
        let exchange = Exchange::with_seed(1);
        exchange.add_symbol("AAPL", 150.0);
        exchange.add_participant("A", 10_000.0);

        let order = limit("A", "AAPL", Side::Buy, 10, 100.0);
        let id = order.id;
        assert!(exchange.submit_order(order));

        assert!(exchange.cancel_order("AAPL", id));
        assert!(!exchange.cancel_order("AAPL", id));
        assert!(!exchange.cancel_order("GHOST", id));
    }

    #[test]
    fn test_simple_cross_through_exchange() {
        let exchange = Exchange::with_seed(1);
        exchange.add_symbol("AAPL", 150.0);
        exchange.add_participant("A", 10_000.0);
        exchange.add_participant("B", 10_000.0);

        let portfolio = exchange.portfolio();
        portfolio.set_initial_position("B", "AAPL", 60, 0.0);

        assert!(exchange.submit_order(limit("A", "AAPL", Side::Buy, 100, 150.0)));
        assert!(exchange.submit_order(limit("B", "AAPL", Side::Sell, 60, 149.0)));

        let trades = exchange.trade_history();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "AAPL");
        assert_eq!(trades[0].quantity, 60);
        assert_eq!(trades[0].price, 149.0);

        assert_eq!(portfolio.get_cash("A").unwrap(), 1_060.0);
        assert_eq!(portfolio.get_position("A", "AAPL").unwrap(), 60);
        assert_eq!(portfolio.get_cash("B").unwrap(), 18_940.0);
        assert_eq!(portfolio.get_position("B", "AAPL").unwrap(), 0);

        let book = exchange.order_book("AAPL").unwrap();
        let depth = book.get_book_depth(5);
        assert_eq!(depth.bids.len(), 1);
        assert_eq!(depth.bids[0].price, 150.0);
        assert_eq!(depth.bids[0].quantity, 40);
        assert!(depth.asks.is_empty());
    }

    #[test]
    fn test_rejection_observer_fires() {
        let exchange = Exchange::with_seed(1);
        exchange.add_symbol("AAPL", 150.0);
        exchange.add_participant("A", 100.0);

        let reasons = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reasons);
        exchange.on_order_rejection(move |_, reason| sink.lock().push(reason.to_string()));

        // reference price exists, so the limit is checked at its own price
        let book = exchange.order_book("AAPL").unwrap();
        book.update_market_price(150.0);

        assert!(!exchange.submit_order(limit("A", "AAPL", Side::Buy, 10, 50.0)));
        let reasons = reasons.lock();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("insufficient funds or position"));
    }

    #[test]
    fn test_trade_observer_and_log_agree() {
        let exchange = Exchange::with_seed(1);
        exchange.add_symbol("MSFT", 300.0);
        exchange.add_participant("maker", 100_000.0);
        exchange.add_participant("taker", 100_000.0);
        exchange.portfolio().set_initial_position("maker", "MSFT", 100, 0.0);

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        exchange.on_trade(move |trade| sink.lock().push(trade.clone()));

        assert!(exchange.submit_order(limit("maker", "MSFT", Side::Sell, 100, 299.0)));
        assert!(exchange.submit_order(limit("taker", "MSFT", Side::Buy, 40, 300.0)));

        let observed = observed.lock();
        let log = exchange.trade_history();
        assert_eq!(observed.len(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(observed[0].quantity, log[0].quantity);
        assert_eq!(observed[0].price, 299.0);
    }

    #[test]
    fn test_cash_and_positions_conserved_across_trades() {
        let exchange = Exchange::with_seed(1);
        exchange.add_symbol("AAPL", 150.0);
        exchange.add_participant("A", 50_000.0);
        exchange.add_participant("B", 50_000.0);
        exchange.add_participant("C", 50_000.0);
        let portfolio = exchange.portfolio();
        portfolio.set_initial_position("B", "AAPL", 200, 0.0);
        portfolio.set_initial_position("C", "AAPL", 200, 0.0);

        assert!(exchange.submit_order(limit("B", "AAPL", Side::Sell, 80, 149.5)));
        assert!(exchange.submit_order(limit("C", "AAPL", Side::Sell, 80, 149.0)));
        assert!(exchange.submit_order(limit("A", "AAPL", Side::Buy, 120, 150.0)));

        let total_cash: f64 = ["A", "B", "C"]
            .iter()
            .map(|pid| portfolio.get_cash(pid).unwrap())
            .sum();
        assert!((total_cash - 150_000.0).abs() < 1e-6);

        let total_position: i64 = ["A", "B", "C"]
            .iter()
            .map(|pid| portfolio.get_position(pid, "AAPL").unwrap())
            .sum();
        assert_eq!(total_position, 400);
    }

    #[test]
    fn test_market_summary_reports_top_of_book() {
        let exchange = Exchange::with_seed(1);
        exchange.add_symbol("AAPL", 150.0);
        exchange.add_participant("A", 1_000_000.0);
        exchange.portfolio().set_initial_position("A", "AAPL", 1_000, 0.0);

        assert!(exchange.submit_order(limit("A", "AAPL", Side::Sell, 10, 151.0)));
        assert!(exchange.submit_order(limit("A", "AAPL", Side::Buy, 10, 149.0)));

        let summary = exchange.market_summary();
        let aapl = &summary["AAPL"];
        assert_eq!(aapl.current_price, 150.0);
        assert_eq!(aapl.bid, 149.0);
        assert_eq!(aapl.ask, 151.0);
        assert_eq!(aapl.mid, 150.0);
        assert!((aapl.spread - 2.0).abs() < 1e-9);
        assert_eq!(aapl.depth.bids.len(), 1);
        assert_eq!(aapl.depth.asks.len(), 1);
    }

    #[test]
    fn test_portfolio_summary_shape() {
        let exchange = Exchange::with_seed(1);
        exchange.add_symbol("AAPL", 100.0);
        exchange.add_participant("A", 5_000.0);
        exchange.portfolio().set_initial_position("A", "AAPL", 10, 100.0);

        let summary = exchange.portfolio_summary();
        let a = &summary["A"];
        assert_eq!(a.cash, 4_000.0);
        assert_eq!(a.positions["AAPL"], 10);
        assert_eq!(a.portfolio_value, 5_000.0);
        assert_eq!(a.pnl, 0.0);

        // summaries serialize for the demo binary
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"cash\""));
    }

    #[test]
    fn test_market_maker_quotes_on_ticks() {
        let exchange = Exchange::with_seed(7);
        exchange.add_symbol("AAPL", 150.0);
        exchange.add_participant("retail", 10_000.0);

        let mm = exchange.add_market_maker(1_000_000.0, &{
            let mut positions = HashMap::new();
            positions.insert("AAPL".to_string(), 400);
            positions
        });
        assert_eq!(mm, "__market_maker_1");

        exchange.run_for(Duration::from_millis(400)).unwrap();

        // the maker has been quoting around the reference price
        let book = exchange.order_book("AAPL").unwrap();
        assert!(book.total_orders() > 0);
        let depth = book.get_book_depth(5);
        assert!(!depth.bids.is_empty() || !depth.asks.is_empty());
    }

    #[test]
    fn test_strategy_fills_are_delivered_after_callback() {
        use crate::strategy::{Strategy, StrategyContext};
        use std::sync::atomic::AtomicUsize;

        struct Crosser {
            pid: String,
            fills: Arc<AtomicUsize>,
        }

        impl Strategy for Crosser {
            fn participant_id(&self) -> &str {
                &self.pid
            }

            fn on_market_data(&mut self, ctx: &StrategyContext<'_>, md: &MarketData) {
                // cross our own book: the resulting trade must arrive via
                // on_trade without deadlocking
                ctx.submit_limit_order(&self.pid, &md.symbol, Side::Sell, 10, 100.0);
                ctx.submit_limit_order(&self.pid, &md.symbol, Side::Buy, 10, 100.0);
            }

            fn on_trade(&mut self, _ctx: &StrategyContext<'_>, _trade: &Trade) {
                self.fills.fetch_add(1, Ordering::SeqCst);
            }

            fn on_order_rejection(&mut self, _: &StrategyContext<'_>, _: &Order, _: &str) {}
        }

        let exchange = Exchange::with_seed(3);
        exchange.add_symbol("AAPL", 100.0);
        exchange.add_participant("crosser", 1_000_000.0);
        exchange
            .portfolio()
            .set_initial_position("crosser", "AAPL", 100, 0.0);

        let fills = Arc::new(AtomicUsize::new(0));
        exchange.add_strategy(Box::new(Crosser {
            pid: "crosser".to_string(),
            fills: Arc::clone(&fills),
        }));

        exchange.run_for(Duration::from_millis(350)).unwrap();
        assert!(fills.load(Ordering::SeqCst) > 0);
        assert!(!exchange.trade_history().is_empty());
    }
}
