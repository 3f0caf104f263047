//! Portfolio ledger: per-participant cash and positions.
//!
//! The ledger gates order admission (`can_buy`/`can_sell`) and applies trade
//! effects for both sides of an execution. All state lives behind a single
//! mutex; the ledger performs no callbacks and no I/O.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::types::{ParticipantId, Price, Quantity, Side, Symbol, Trade};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortfolioError {
    /// Query or trade posting against an unregistered participant
    UnknownParticipant(ParticipantId),
}

impl fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortfolioError::UnknownParticipant(pid) => {
                write!(f, "Participant not found: {}", pid)
            }
        }
    }
}

impl std::error::Error for PortfolioError {}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

#[derive(Debug, Clone)]
struct ParticipantState {
    cash: f64,
    initial_cash: f64,
    positions: HashMap<Symbol, i64>,
}

impl ParticipantState {
    fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            positions: HashMap::new(),
        }
    }

    fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    fn apply(&mut self, symbol: &Symbol, quantity: Quantity, price: Price, side: Side) {
        let sign: i64 = match side {
            Side::Buy => 1,
            Side::Sell => -1,
        };
        *self.positions.entry(symbol.clone()).or_insert(0) += sign * quantity as i64;
        self.cash -= sign as f64 * quantity as f64 * price;
    }
}

/// Thread-safe ledger of participant cash and positions.
#[derive(Debug, Default)]
pub struct Portfolio {
    participants: Mutex<HashMap<ParticipantId, ParticipantState>>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger seeded with initial cash per participant.
    pub fn with_participants(initial_cash_by_participant: HashMap<ParticipantId, f64>) -> Self {
        let participants = initial_cash_by_participant
            .into_iter()
            .map(|(pid, cash)| (pid, ParticipantState::new(cash)))
            .collect();
        Self {
            participants: Mutex::new(participants),
        }
    }

    /// Insert a participant. Replaces any existing state for the id.
    pub fn add_participant(&self, participant_id: &str, initial_cash: f64) {
        let mut participants = self.participants.lock();
        participants.insert(participant_id.to_string(), ParticipantState::new(initial_cash));
        debug!(participant = participant_id, cash = initial_cash, "participant added");
    }

    /// Seed a position, debiting cash by `quantity * cost_basis` when the
    /// cost basis is positive.
    pub fn set_initial_position(
        &self,
        participant_id: &str,
        symbol: &str,
        quantity: i64,
        cost_basis: Price,
    ) {
        let mut participants = self.participants.lock();
        let participant = participants
            .entry(participant_id.to_string())
            .or_insert_with(|| ParticipantState::new(0.0));

        participant.positions.insert(symbol.to_string(), quantity);
        if cost_basis > 0.0 {
            participant.cash -= quantity as f64 * cost_basis;
        }
    }

    /// True iff the participant exists and `qty * price` fits in cash.
    pub fn can_buy(&self, participant_id: &str, _symbol: &str, qty: Quantity, price: Price) -> bool {
        let participants = self.participants.lock();
        match participants.get(participant_id) {
            Some(p) => qty as f64 * price <= p.cash,
            None => false,
        }
    }

    /// True iff the participant exists and holds at least `qty` of `symbol`.
    /// Shorting is not permitted.
    pub fn can_sell(&self, participant_id: &str, symbol: &str, qty: Quantity) -> bool {
        let participants = self.participants.lock();
        match participants.get(participant_id) {
            Some(p) => p.position(symbol) >= qty as i64,
            None => false,
        }
    }

    /// Apply one leg of a trade to a participant: position moves by
    /// `±quantity`, cash by `∓quantity * price`.
    pub fn execute_trade(
        &self,
        participant_id: &str,
        trade: &Trade,
        side: Side,
    ) -> PortfolioResult<()> {
        let mut participants = self.participants.lock();
        let participant = participants
            .get_mut(participant_id)
            .ok_or_else(|| PortfolioError::UnknownParticipant(participant_id.to_string()))?;

        participant.apply(&trade.symbol, trade.quantity, trade.price, side);
        Ok(())
    }

    /// Post both legs of a trade under a single lock acquisition. Verifies
    /// both participants exist before mutating either, so a failed
    /// settlement leaves the ledger untouched.
    pub fn settle(&self, buyer: &str, seller: &str, trade: &Trade) -> PortfolioResult<()> {
        let mut participants = self.participants.lock();

        if !participants.contains_key(buyer) {
            return Err(PortfolioError::UnknownParticipant(buyer.to_string()));
        }
        if !participants.contains_key(seller) {
            return Err(PortfolioError::UnknownParticipant(seller.to_string()));
        }

        participants
            .get_mut(buyer)
            .expect("buyer checked above")
            .apply(&trade.symbol, trade.quantity, trade.price, Side::Buy);
        participants
            .get_mut(seller)
            .expect("seller checked above")
            .apply(&trade.symbol, trade.quantity, trade.price, Side::Sell);

        debug!(
            buyer,
            seller,
            symbol = %trade.symbol,
            quantity = trade.quantity,
            price = trade.price,
            "trade settled"
        );
        Ok(())
    }

    pub fn get_cash(&self, participant_id: &str) -> PortfolioResult<f64> {
        let participants = self.participants.lock();
        participants
            .get(participant_id)
            .map(|p| p.cash)
            .ok_or_else(|| PortfolioError::UnknownParticipant(participant_id.to_string()))
    }

    pub fn get_position(&self, participant_id: &str, symbol: &str) -> PortfolioResult<i64> {
        let participants = self.participants.lock();
        participants
            .get(participant_id)
            .map(|p| p.position(symbol))
            .ok_or_else(|| PortfolioError::UnknownParticipant(participant_id.to_string()))
    }

    /// Buying power is uncommitted cash.
    pub fn get_buying_power(&self, participant_id: &str) -> PortfolioResult<f64> {
        self.get_cash(participant_id)
    }

    /// Mark-to-market profit: position value plus cash, minus initial cash.
    pub fn get_pnl(
        &self,
        participant_id: &str,
        prices: &HashMap<Symbol, Price>,
    ) -> PortfolioResult<f64> {
        let participants = self.participants.lock();
        let participant = participants
            .get(participant_id)
            .ok_or_else(|| PortfolioError::UnknownParticipant(participant_id.to_string()))?;

        let position_value = Self::position_value(participant, prices);
        Ok(position_value + participant.cash - participant.initial_cash)
    }

    /// Cash plus mark-to-market position value.
    pub fn get_portfolio_value(
        &self,
        participant_id: &str,
        prices: &HashMap<Symbol, Price>,
    ) -> PortfolioResult<f64> {
        let participants = self.participants.lock();
        let participant = participants
            .get(participant_id)
            .ok_or_else(|| PortfolioError::UnknownParticipant(participant_id.to_string()))?;

        Ok(participant.cash + Self::position_value(participant, prices))
    }

    /// Gross exposure: `Σ |position| * price` over symbols with a known price.
    pub fn get_total_exposure(
        &self,
        participant_id: &str,
        prices: &HashMap<Symbol, Price>,
    ) -> PortfolioResult<f64> {
        let participants = self.participants.lock();
        let participant = participants
            .get(participant_id)
            .ok_or_else(|| PortfolioError::UnknownParticipant(participant_id.to_string()))?;

        let exposure = participant
            .positions
            .iter()
            .filter_map(|(symbol, qty)| prices.get(symbol).map(|p| qty.unsigned_abs() as f64 * p))
            .sum();
        Ok(exposure)
    }

    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        let participants = self.participants.lock();
        participants.keys().cloned().collect()
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.participants.lock().contains_key(participant_id)
    }

    fn position_value(participant: &ParticipantState, prices: &HashMap<Symbol, Price>) -> f64 {
        participant
            .positions
            .iter()
            .filter_map(|(symbol, qty)| prices.get(symbol).map(|p| *qty as f64 * p))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderId;

    fn trade(symbol: &str, quantity: Quantity, price: Price) -> Trade {
        Trade::new(OrderId::next(), OrderId::next(), symbol.to_string(), quantity, price)
    }

    #[test]
    fn test_add_participant_and_cash() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("alice", 10_000.0);

        assert_eq!(portfolio.get_cash("alice").unwrap(), 10_000.0);
        assert_eq!(portfolio.get_buying_power("alice").unwrap(), 10_000.0);
        assert!(portfolio.get_cash("bob").is_err());
    }

    #[test]
    fn test_can_buy_checks_notional_against_cash() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("alice", 1_000.0);

        assert!(portfolio.can_buy("alice", "AAPL", 10, 100.0));
        assert!(!portfolio.can_buy("alice", "AAPL", 11, 100.0));
        assert!(!portfolio.can_buy("ghost", "AAPL", 1, 1.0));
    }

    #[test]
    fn test_can_sell_requires_full_position() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("alice", 0.0);
        portfolio.set_initial_position("alice", "AAPL", 50, 0.0);

        assert!(portfolio.can_sell("alice", "AAPL", 50));
        assert!(!portfolio.can_sell("alice", "AAPL", 51));
        assert!(!portfolio.can_sell("alice", "MSFT", 1));
        assert!(!portfolio.can_sell("ghost", "AAPL", 1));
    }

    #[test]
    fn test_initial_position_debits_cost_basis() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("alice", 10_000.0);
        portfolio.set_initial_position("alice", "AAPL", 10, 150.0);

        assert_eq!(portfolio.get_position("alice", "AAPL").unwrap(), 10);
        assert_eq!(portfolio.get_cash("alice").unwrap(), 8_500.0);
    }

    #[test]
    fn test_execute_trade_sign_convention() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("alice", 10_000.0);

        let t = trade("AAPL", 60, 149.0);
        portfolio.execute_trade("alice", &t, Side::Buy).unwrap();
        assert_eq!(portfolio.get_position("alice", "AAPL").unwrap(), 60);
        assert_eq!(portfolio.get_cash("alice").unwrap(), 10_000.0 - 60.0 * 149.0);

        portfolio.execute_trade("alice", &t, Side::Sell).unwrap();
        assert_eq!(portfolio.get_position("alice", "AAPL").unwrap(), 0);
        assert_eq!(portfolio.get_cash("alice").unwrap(), 10_000.0);
    }

    #[test]
    fn test_settle_is_double_entry() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("buyer", 10_000.0);
        portfolio.add_participant("seller", 10_000.0);
        portfolio.set_initial_position("seller", "AAPL", 60, 0.0);

        let t = trade("AAPL", 60, 149.0);
        portfolio.settle("buyer", "seller", &t).unwrap();

        // cash conserved, positions conserved per symbol
        let buyer_cash = portfolio.get_cash("buyer").unwrap();
        let seller_cash = portfolio.get_cash("seller").unwrap();
        assert_eq!(buyer_cash, 10_000.0 - 8_940.0);
        assert_eq!(seller_cash, 10_000.0 + 8_940.0);
        assert_eq!(buyer_cash + seller_cash, 20_000.0);

        assert_eq!(portfolio.get_position("buyer", "AAPL").unwrap(), 60);
        assert_eq!(portfolio.get_position("seller", "AAPL").unwrap(), 0);
    }

    #[test]
    fn test_settle_unknown_participant_leaves_ledger_untouched() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("buyer", 10_000.0);

        let t = trade("AAPL", 10, 100.0);
        let err = portfolio.settle("buyer", "ghost", &t).unwrap_err();
        assert_eq!(err, PortfolioError::UnknownParticipant("ghost".to_string()));

        assert_eq!(portfolio.get_cash("buyer").unwrap(), 10_000.0);
        assert_eq!(portfolio.get_position("buyer", "AAPL").unwrap(), 0);
    }

    #[test]
    fn test_pnl_and_portfolio_value() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("alice", 10_000.0);

        let t = trade("AAPL", 100, 50.0);
        portfolio.execute_trade("alice", &t, Side::Buy).unwrap();

        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), 60.0);

        // bought at 50, marked at 60
        assert_eq!(portfolio.get_pnl("alice", &prices).unwrap(), 1_000.0);
        assert_eq!(portfolio.get_portfolio_value("alice", &prices).unwrap(), 11_000.0);
        assert_eq!(portfolio.get_total_exposure("alice", &prices).unwrap(), 6_000.0);
    }

    #[test]
    fn test_pnl_ignores_unpriced_symbols() {
        let portfolio = Portfolio::new();
        portfolio.add_participant("alice", 1_000.0);
        portfolio.set_initial_position("alice", "XYZ", 10, 0.0);

        let prices = HashMap::new();
        assert_eq!(portfolio.get_pnl("alice", &prices).unwrap(), 0.0);
    }

    #[test]
    fn test_error_display_and_serialization() {
        let err = PortfolioError::UnknownParticipant("ghost".to_string());
        assert_eq!(err.to_string(), "Participant not found: ghost");

        let json = serde_json::to_string(&err).unwrap();
        let back: PortfolioError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
