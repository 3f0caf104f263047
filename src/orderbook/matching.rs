use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::orderbook::price_level::{PriceKey, PriceLevel};
use crate::portfolio::Portfolio;
use crate::types::{Order, OrderId, Price, Quantity, Side, Symbol, Trade};

/// Rejection reason for a market order that finds no opposite side.
pub const REASON_NO_LIQUIDITY: &str = "no liquidity available";

/// Events produced during matching while the book's writer lock is held.
/// The owning book dispatches them to callbacks only after the lock is
/// released.
#[derive(Debug, Clone)]
pub enum BookEvent {
    Trade(Trade),
    Rejected(Order, String),
}

/// Resting state of one book: both price ladders plus the active-order
/// index. Mutated only under the owning book's writer lock.
///
/// Invariants maintained across every operation: an order id is in
/// `order_locations` iff it is in exactly one level queue on the recorded
/// side at the recorded price, `active_orders` mirrors `order_locations`,
/// and the sides never cross once matching has run.
#[derive(Debug)]
pub(crate) struct BookLadder {
    symbol: Symbol,
    bids: BTreeMap<PriceKey, PriceLevel>,
    asks: BTreeMap<PriceKey, PriceLevel>,
    active_orders: HashMap<OrderId, Order>,
    order_locations: HashMap<OrderId, (PriceKey, Side)>,
}

impl BookLadder {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            active_orders: HashMap::new(),
            order_locations: HashMap::new(),
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().map(PriceKey::value)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().map(PriceKey::value)
    }

    pub fn total_orders(&self) -> usize {
        self.active_orders.len()
    }

    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.active_orders.contains_key(&order_id)
    }

    /// Best `levels` prices on one side as (price, aggregate quantity,
    /// order count), best first.
    pub fn depth_side(&self, side: Side, levels: usize) -> Vec<(Price, Quantity, usize)> {
        match side {
            Side::Buy => Self::collect_depth(self.bids.iter().rev(), levels),
            Side::Sell => Self::collect_depth(self.asks.iter(), levels),
        }
    }

    fn collect_depth<'a>(
        iter: impl Iterator<Item = (&'a PriceKey, &'a PriceLevel)>,
        levels: usize,
    ) -> Vec<(Price, Quantity, usize)> {
        iter.take(levels)
            .map(|(key, level)| (key.value(), level.total_quantity(), level.order_count()))
            .collect()
    }

    /// Book a limit order at its price, then match any crossing.
    pub fn insert_limit(
        &mut self,
        order: Order,
        portfolio: Option<&Portfolio>,
        events: &mut Vec<BookEvent>,
    ) {
        let key = PriceKey::new(order.price);
        debug!(order_id = %order.id, side = %order.side, price = order.price, "booking limit order");

        self.active_orders.insert(order.id, order.clone());
        self.order_locations.insert(order.id, (key, order.side));
        let levels = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels.entry(key).or_default().push_back(order);

        self.match_crossing(portfolio, events);
    }

    /// Match while the best bid meets or exceeds the best ask. The standing
    /// ask sets the trade price, so an aggressive buyer gets the price
    /// improvement. Within a level, the front of the queue trades first.
    fn match_crossing(&mut self, portfolio: Option<&Portfolio>, events: &mut Vec<BookEvent>) {
        loop {
            let Some(&bid_key) = self.bids.keys().next_back() else { break };
            let Some(&ask_key) = self.asks.keys().next() else { break };
            if bid_key.value() < ask_key.value() {
                break;
            }

            let buy = self
                .bids
                .get(&bid_key)
                .and_then(PriceLevel::front)
                .cloned()
                .expect("non-empty bid level");
            let sell = self
                .asks
                .get(&ask_key)
                .and_then(PriceLevel::front)
                .cloned()
                .expect("non-empty ask level");

            let quantity = buy.remaining_quantity.min(sell.remaining_quantity);
            let price = ask_key.value();

            self.report_execution(&buy, &sell, quantity, price, portfolio, events);
            self.apply_fill(Side::Buy, bid_key, quantity);
            self.apply_fill(Side::Sell, ask_key, quantity);
        }
    }

    /// Execute a market order against the opposite side, best price first.
    /// Unfilled remainder never rests. Returns false (with a rejection
    /// event) when the opposite side is empty on arrival.
    pub fn execute_market(
        &mut self,
        order: &Order,
        portfolio: Option<&Portfolio>,
        events: &mut Vec<BookEvent>,
    ) -> bool {
        let opposite_empty = match order.side {
            Side::Buy => self.asks.is_empty(),
            Side::Sell => self.bids.is_empty(),
        };
        if opposite_empty {
            debug!(order_id = %order.id, side = %order.side, "market order with empty opposite side");
            events.push(BookEvent::Rejected(order.clone(), REASON_NO_LIQUIDITY.to_string()));
            return false;
        }

        let mut remaining = order.quantity;
        while remaining > 0 {
            let next_key = match order.side {
                Side::Buy => self.asks.keys().next().copied(),
                Side::Sell => self.bids.keys().next_back().copied(),
            };
            let Some(key) = next_key else { break };

            let resting = match order.side {
                Side::Buy => self.asks.get(&key),
                Side::Sell => self.bids.get(&key),
            }
            .and_then(PriceLevel::front)
            .cloned()
            .expect("non-empty level");

            let quantity = remaining.min(resting.remaining_quantity);
            let price = key.value();

            match order.side {
                Side::Buy => self.report_execution(order, &resting, quantity, price, portfolio, events),
                Side::Sell => self.report_execution(&resting, order, quantity, price, portfolio, events),
            }
            self.apply_fill(order.side.opposite(), key, quantity);
            remaining -= quantity;
        }

        true
    }

    /// Remove a resting order. Unknown or already-filled ids return false.
    /// An index entry that disagrees with the level queues is erased and
    /// reported as false.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        if !self.active_orders.contains_key(&order_id) {
            return false;
        }

        let Some(&(key, side)) = self.order_locations.get(&order_id) else {
            warn!(order_id = %order_id, "active order missing from location index; erasing");
            self.active_orders.remove(&order_id);
            return false;
        };

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        let removed = match levels.get_mut(&key) {
            Some(level) => {
                let removed = level.remove_order(order_id).is_some();
                if level.is_empty() {
                    levels.remove(&key);
                }
                removed
            }
            None => false,
        };

        self.active_orders.remove(&order_id);
        self.order_locations.remove(&order_id);

        if !removed {
            warn!(order_id = %order_id, "order index disagreed with level queues; erased stale entry");
        }
        removed
    }

    /// Settle the trade with the ledger (when attached) and buffer the
    /// event. A failed settlement suppresses the report: no trade reaches
    /// callbacks unless both legs posted.
    fn report_execution(
        &self,
        buy: &Order,
        sell: &Order,
        quantity: Quantity,
        price: Price,
        portfolio: Option<&Portfolio>,
        events: &mut Vec<BookEvent>,
    ) {
        let trade = Trade::new(buy.id, sell.id, self.symbol.clone(), quantity, price);

        if let Some(portfolio) = portfolio {
            if let Err(e) = portfolio.settle(&buy.participant_id, &sell.participant_id, &trade) {
                warn!(error = %e, symbol = %self.symbol, "trade settlement failed; not reporting");
                return;
            }
        }

        events.push(BookEvent::Trade(trade));
    }

    /// Consume `quantity` from the front order at `key`, popping it when
    /// filled and erasing the level when emptied. Keeps the active-order
    /// index in step.
    fn apply_fill(&mut self, side: Side, key: PriceKey, quantity: Quantity) {
        let Self { bids, asks, active_orders, order_locations, .. } = self;
        let levels = match side {
            Side::Buy => bids,
            Side::Sell => asks,
        };
        let Some(level) = levels.get_mut(&key) else { return };
        let Some(front) = level.front_mut() else { return };

        front.fill(quantity);
        let id = front.id;

        if front.is_filled() {
            level.pop_front();
            active_orders.remove(&id);
            order_locations.remove(&id);
        } else if let Some(tracked) = active_orders.get_mut(&id) {
            tracked.remaining_quantity = front.remaining_quantity;
        }

        if level.is_empty() {
            levels.remove(&key);
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        // index -> queue
        for (id, (key, side)) in &self.order_locations {
            let levels = match side {
                Side::Buy => &self.bids,
                Side::Sell => &self.asks,
            };
            let level = levels.get(key).unwrap_or_else(|| panic!("missing level for {id}"));
            assert!(level.contains(*id), "order {id} not in its recorded level");
            assert!(self.active_orders.contains_key(id));
        }
        // queue -> index
        for (key, level) in self.bids.iter().chain(self.asks.iter()) {
            for order in level.iter() {
                let (recorded_key, _) = self.order_locations[&order.id];
                assert_eq!(recorded_key, *key);
            }
        }
        // non-crossed book
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            assert!(bid < ask, "book crossed: bid {bid} >= ask {ask}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(side: Side, quantity: Quantity, price: Price) -> Order {
        Order::new_limit("p1".to_string(), "TEST".to_string(), side, quantity, price)
    }

    fn market(side: Side, quantity: Quantity) -> Order {
        Order::new_market("p1".to_string(), "TEST".to_string(), side, quantity)
    }

    fn trades(events: &[BookEvent]) -> Vec<&Trade> {
        events
            .iter()
            .filter_map(|e| match e {
                BookEvent::Trade(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_non_crossing_limits_rest() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        ladder.insert_limit(limit(Side::Buy, 100, 99.0), None, &mut events);
        ladder.insert_limit(limit(Side::Sell, 100, 101.0), None, &mut events);

        assert!(events.is_empty());
        assert_eq!(ladder.best_bid(), Some(99.0));
        assert_eq!(ladder.best_ask(), Some(101.0));
        assert_eq!(ladder.total_orders(), 2);
        ladder.assert_consistent();
    }

    #[test]
    fn test_crossing_limit_trades_at_resting_ask() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        ladder.insert_limit(limit(Side::Sell, 60, 149.0), None, &mut events);
        ladder.insert_limit(limit(Side::Buy, 100, 150.0), None, &mut events);

        let trades = trades(&events);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 149.0);
        assert_eq!(trades[0].quantity, 60);

        // remainder of the buy rests at its own price
        assert_eq!(ladder.best_bid(), Some(150.0));
        assert_eq!(ladder.best_ask(), None);
        assert_eq!(ladder.total_orders(), 1);
        ladder.assert_consistent();
    }

    #[test]
    fn test_crossing_buy_sweeps_asks_lowest_first() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        ladder.insert_limit(limit(Side::Sell, 10, 101.0), None, &mut events);
        ladder.insert_limit(limit(Side::Sell, 10, 100.0), None, &mut events);
        ladder.insert_limit(limit(Side::Sell, 10, 102.0), None, &mut events);

        ladder.insert_limit(limit(Side::Buy, 25, 101.5), None, &mut events);

        let trades = trades(&events);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, 100.0);
        assert_eq!(trades[0].quantity, 10);
        assert_eq!(trades[1].price, 101.0);
        assert_eq!(trades[1].quantity, 10);

        // 5 remaining rests as the new best bid below the untouched 102 ask
        assert_eq!(ladder.best_bid(), Some(101.5));
        assert_eq!(ladder.best_ask(), Some(102.0));
        ladder.assert_consistent();
    }

    #[test]
    fn test_fifo_within_level() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        let first = limit(Side::Sell, 10, 100.0);
        let second = limit(Side::Sell, 10, 100.0);
        let (first_id, second_id) = (first.id, second.id);

        ladder.insert_limit(first, None, &mut events);
        ladder.insert_limit(second, None, &mut events);

        assert!(ladder.execute_market(&market(Side::Buy, 10), None, &mut events));

        let trades = trades(&events);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sell_order_id, first_id);

        assert!(!ladder.contains_order(first_id));
        assert!(ladder.contains_order(second_id));
        ladder.assert_consistent();
    }

    #[test]
    fn test_market_buy_empty_book_rejects() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        let order = market(Side::Buy, 1);
        assert!(!ladder.execute_market(&order, None, &mut events));

        assert_eq!(events.len(), 1);
        match &events[0] {
            BookEvent::Rejected(rejected, reason) => {
                assert_eq!(rejected.id, order.id);
                assert_eq!(reason, REASON_NO_LIQUIDITY);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(ladder.total_orders(), 0);
    }

    #[test]
    fn test_market_sell_sweeps_bids_highest_first() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        ladder.insert_limit(limit(Side::Buy, 10, 99.0), None, &mut events);
        ladder.insert_limit(limit(Side::Buy, 10, 100.0), None, &mut events);

        assert!(ladder.execute_market(&market(Side::Sell, 15), None, &mut events));

        let trades = trades(&events);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, 100.0);
        assert_eq!(trades[0].quantity, 10);
        assert_eq!(trades[1].price, 99.0);
        assert_eq!(trades[1].quantity, 5);
        ladder.assert_consistent();
    }

    #[test]
    fn test_partial_market_order_leaves_no_remainder() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        ladder.insert_limit(limit(Side::Sell, 10, 100.0), None, &mut events);
        assert!(ladder.execute_market(&market(Side::Buy, 25), None, &mut events));

        assert_eq!(trades(&events).len(), 1);
        assert_eq!(ladder.total_orders(), 0);
        assert_eq!(ladder.best_bid(), None);
        assert_eq!(ladder.best_ask(), None);
    }

    #[test]
    fn test_cancel_removes_order_and_level() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        let order = limit(Side::Buy, 100, 99.0);
        let id = order.id;
        ladder.insert_limit(order, None, &mut events);

        assert!(ladder.cancel(id));
        assert!(!ladder.contains_order(id));
        assert_eq!(ladder.best_bid(), None);
        assert_eq!(ladder.bid_level_count(), 0);

        // second cancel is a benign false
        assert!(!ladder.cancel(id));
        ladder.assert_consistent();
    }

    #[test]
    fn test_cancel_preserves_fifo_of_remaining_orders() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        let o1 = limit(Side::Buy, 10, 100.0);
        let o2 = limit(Side::Buy, 10, 100.0);
        let o3 = limit(Side::Buy, 10, 100.0);
        let (id1, id2, id3) = (o1.id, o2.id, o3.id);

        ladder.insert_limit(o1, None, &mut events);
        ladder.insert_limit(o2, None, &mut events);
        ladder.insert_limit(o3, None, &mut events);

        assert!(ladder.cancel(id2));
        assert!(!ladder.contains_order(id2));

        assert!(ladder.execute_market(&market(Side::Sell, 20), None, &mut events));
        let trades = trades(&events);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].buy_order_id, id1);
        assert_eq!(trades[1].buy_order_id, id3);
        ladder.assert_consistent();
    }

    #[test]
    fn test_fill_conservation_across_partial_fills() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        let resting = limit(Side::Sell, 100, 50.0);
        let resting_id = resting.id;
        ladder.insert_limit(resting, None, &mut events);

        for _ in 0..3 {
            assert!(ladder.execute_market(&market(Side::Buy, 30), None, &mut events));
        }
        assert!(ladder.execute_market(&market(Side::Buy, 30), None, &mut events));

        let filled: Quantity = trades(&events)
            .iter()
            .filter(|t| t.sell_order_id == resting_id)
            .map(|t| t.quantity)
            .sum();
        assert_eq!(filled, 100);
        assert!(!ladder.contains_order(resting_id));
    }

    #[test]
    fn test_depth_side_reports_best_first() {
        let mut ladder = BookLadder::new("TEST".to_string());
        let mut events = Vec::new();

        ladder.insert_limit(limit(Side::Buy, 10, 98.0), None, &mut events);
        ladder.insert_limit(limit(Side::Buy, 20, 99.0), None, &mut events);
        ladder.insert_limit(limit(Side::Buy, 30, 99.0), None, &mut events);
        ladder.insert_limit(limit(Side::Sell, 40, 101.0), None, &mut events);

        let bids = ladder.depth_side(Side::Buy, 5);
        assert_eq!(bids, vec![(99.0, 50, 2), (98.0, 10, 1)]);

        let asks = ladder.depth_side(Side::Sell, 1);
        assert_eq!(asks, vec![(101.0, 40, 1)]);
    }
}
