use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::types::{Order, OrderId, Price, Quantity};

/// Map key for price levels. Book prices are strictly positive finite
/// values, so `total_cmp` gives the natural ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceKey(f64);

impl PriceKey {
    pub fn new(price: Price) -> Self {
        debug_assert!(price.is_finite());
        PriceKey(price)
    }

    pub fn value(&self) -> Price {
        self.0
    }
}

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Orders resting at one price, in arrival order (FIFO).
///
/// The level is plain data; the owning book's writer lock guards all
/// mutation so that matching, cancellation, and ledger posting stay atomic
/// across levels.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order at the back of the queue (time priority).
    pub fn push_back(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Remove the first order with the given id, preserving the arrival
    /// order of the rest.
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == order_id)?;
        self.orders.remove(pos)
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.iter().any(|o| o.id == order_id)
    }

    pub fn total_quantity(&self) -> Quantity {
        self.orders.iter().map(|o| o.remaining_quantity).sum()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
