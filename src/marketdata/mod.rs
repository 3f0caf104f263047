//! Market data engine: a background producer that advances each symbol's
//! reference price under geometric Brownian motion and fans out ticks.
//!
//! Each tick the producer snapshots the price table, draws one N(0,1)
//! shock per symbol from a shared seedable generator, applies all updates
//! in a single write transaction, and dispatches callbacks with every lock
//! released.

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

use crate::types::{MarketData, Price, Symbol};
use crate::utils::time::Clock;

pub type MarketDataCallback = Arc<dyn Fn(&MarketData) + Send + Sync>;

/// Producer cadence: 10 Hz.
const TICK_PERIOD: Duration = Duration::from_millis(100);

/// One second expressed in trading-year units (252 sessions of 6.5 hours).
/// Fixed for the life of the process so runs are comparable.
const DT: f64 = 1.0 / (252.0 * 6.5 * 60.0 * 60.0);

/// Prices never fall below this floor.
const PRICE_FLOOR: f64 = 0.01;

/// GBM drift term.
const DRIFT: f64 = 0.0;

/// Volatility assigned to a symbol unless overridden.
const DEFAULT_VOLATILITY: f64 = 0.2;

/// Synthetic volume attached to each tick.
const TICK_VOLUME: u64 = 1000;

#[derive(Debug, Clone)]
struct SymbolMarketState {
    price: Price,
    volatility: f64,
}

struct EngineShared {
    symbols: RwLock<HashMap<Symbol, SymbolMarketState>>,
    callback: Mutex<Option<MarketDataCallback>>,
    rng: Mutex<ChaCha8Rng>,
    running: AtomicBool,
}

/// Drives synthetic reference prices for a set of symbols.
pub struct MarketDataEngine {
    shared: Arc<EngineShared>,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl MarketDataEngine {
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Deterministic engine for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                symbols: RwLock::new(HashMap::new()),
                callback: Mutex::new(None),
                rng: Mutex::new(rng),
                running: AtomicBool::new(false),
            }),
            producer: Mutex::new(None),
        }
    }

    /// Register a symbol at an initial price. Overwrites any existing
    /// registration; the default volatility is 0.2.
    pub fn add_symbol(&self, symbol: &str, initial_price: Price) {
        let mut symbols = self.shared.symbols.write();
        symbols.insert(
            symbol.to_string(),
            SymbolMarketState { price: initial_price, volatility: DEFAULT_VOLATILITY },
        );
        debug!(symbol, price = initial_price, "symbol registered");
    }

    /// Override a symbol's volatility. No effect on unknown symbols.
    pub fn set_volatility(&self, symbol: &str, volatility: f64) {
        let mut symbols = self.shared.symbols.write();
        if let Some(state) = symbols.get_mut(symbol) {
            state.volatility = volatility;
        }
    }

    /// Install the tick consumer. May be replaced while running.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&MarketData) + Send + Sync + 'static,
    {
        *self.shared.callback.lock() = Some(Arc::new(callback));
    }

    /// Start the producer thread. Idempotent.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("market data engine starting");

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("market-data".to_string())
            .spawn(move || Self::produce(shared))
            .expect("failed to spawn market data producer");
        *self.producer.lock() = Some(handle);
    }

    /// Signal the producer to stop and join it before returning.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.producer.lock().take() {
            let _ = handle.join();
            info!("market data engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Current price for a symbol, 0.0 when unknown.
    pub fn get_current_price(&self, symbol: &str) -> Price {
        let symbols = self.shared.symbols.read();
        symbols.get(symbol).map(|s| s.price).unwrap_or(0.0)
    }

    /// Atomic snapshot of the whole price table.
    pub fn get_all_prices(&self) -> HashMap<Symbol, Price> {
        let symbols = self.shared.symbols.read();
        symbols.iter().map(|(sym, state)| (sym.clone(), state.price)).collect()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.shared.symbols.read().keys().cloned().collect()
    }

    fn produce(shared: Arc<EngineShared>) {
        let normal = Normal::new(0.0, 1.0).expect("unit normal");

        while shared.running.load(Ordering::SeqCst) {
            let updates = Self::next_prices(&shared, &normal);

            {
                let mut symbols = shared.symbols.write();
                for (symbol, price) in &updates {
                    if let Some(state) = symbols.get_mut(symbol) {
                        state.price = *price;
                    }
                }
            }

            // the callback reference is cloned out of its slot so user code
            // runs with every engine lock released
            let callback = shared.callback.lock().clone();
            if let Some(callback) = callback {
                let timestamp = Clock::millis();
                for (symbol, price) in &updates {
                    let tick = MarketData::new(symbol.clone(), *price, TICK_VOLUME, timestamp);
                    callback(&tick);
                }
            }

            thread::sleep(TICK_PERIOD);
        }
    }

    /// Advance every symbol one GBM step: `ΔS = S·(μ·Δt + σ·√Δt·ε)` with
    /// μ = 0, clamped at the price floor.
    fn next_prices(shared: &EngineShared, normal: &Normal) -> Vec<(Symbol, Price)> {
        use rand::distributions::Distribution;

        let symbols = shared.symbols.read();
        let mut rng = shared.rng.lock();

        symbols
            .iter()
            .map(|(symbol, state)| {
                let shock: f64 = normal.sample(&mut *rng);
                let change = state.price * (DRIFT * DT + state.volatility * DT.sqrt() * shock);
                let price = (state.price + change).max(PRICE_FLOOR);
                (symbol.clone(), price)
            })
            .collect()
    }
}

impl Default for MarketDataEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MarketDataEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
