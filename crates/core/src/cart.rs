//! Stock-aware shopping cart.
//!
//! The cart is an ordered list of [`CartItem`] lines. It is mutated only
//! through [`Cart::add_item`], [`Cart::update_quantity`], [`Cart::remove_item`]
//! and [`Cart::clear`]; every mutation returns the [`CartMutation`] that undoes
//! it, so a caller applying changes optimistically can roll back exactly the
//! change that the remote store rejected.
//!
//! # Invariants
//!
//! - No line ever holds quantity 0; setting a quantity below 1 removes the line.
//! - For products with tracked inventory, a line's quantity never exceeds the
//!   product's stock. Exceeding it is rejected, not clamped.
//! - `subtotal`, `savings` and `item_count` are computed from the current
//!   lines on every call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CartId, LineId, Product, ProductId};

/// Errors raised by local cart mutations.
///
/// These are detected before anything is sent to the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The requested quantity exceeds tracked stock.
    #[error("only {available} of product {product_id} in stock (requested {requested})")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Adding zero units.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The line does not exist in this cart.
    #[error("cart line not found: {0}")]
    LineNotFound(LineId),
}

/// One product entry in the cart with a quantity and price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line ID (provisional until the remote cart confirms it).
    pub id: LineId,
    /// Product ID.
    pub product_id: ProductId,
    /// Product snapshot taken when the line was created.
    pub product: Product,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Price per unit at the time the line was created.
    pub unit_price: Decimal,
}

impl CartItem {
    /// Create a line priced at the product's current price.
    #[must_use]
    pub fn new(id: LineId, product: Product, quantity: u32) -> Self {
        Self {
            id,
            product_id: product.id,
            unit_price: product.price,
            product,
            quantity,
        }
    }

    /// Line total (`quantity * unit_price`).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Savings against the compare-at price for the whole line.
    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.product.unit_savings() * Decimal::from(self.quantity)
    }
}

/// The inverse of an applied cart mutation.
///
/// Passing it to [`Cart::revert`] undoes the mutation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMutation {
    /// The mutation changed nothing.
    Noop,
    /// Undo a newly created line.
    RemoveLine(LineId),
    /// Undo a quantity change on an existing line.
    RestoreQuantity { line: LineId, quantity: u32 },
    /// Undo a removal, putting the line back at its old position.
    ReinsertLine { index: usize, item: CartItem },
    /// Undo a clear.
    RestoreLines(Vec<CartItem>),
}

impl CartMutation {
    /// Whether reverting this would change anything.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

/// A shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: Option<CartId>,
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart not yet known to the remote store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from an authoritative list of lines.
    ///
    /// Lines with quantity 0 are dropped; the remote store treats them as
    /// removed.
    #[must_use]
    pub fn from_lines(id: Option<CartId>, items: Vec<CartItem>) -> Self {
        Self {
            id,
            items: items.into_iter().filter(|item| item.quantity > 0).collect(),
        }
    }

    /// Remote cart ID, once the cart has been created remotely.
    #[must_use]
    pub const fn id(&self) -> Option<CartId> {
        self.id
    }

    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, line_id: &LineId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == line_id)
    }

    /// Look up the line holding a product.
    #[must_use]
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::total).sum()
    }

    /// Sum of compare-at savings.
    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.items.iter().map(CartItem::savings).sum()
    }

    /// Add `quantity` units of `product`.
    ///
    /// Merges into the existing line for the product, otherwise appends a new
    /// line with a provisional ID.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is 0.
    /// - [`CartError::OutOfStock`] if the resulting quantity exceeds tracked
    ///   stock. The cart is unchanged.
    pub fn add_item(&mut self, product: Product, quantity: u32) -> Result<CartMutation, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            let requested = item.quantity.saturating_add(quantity);
            check_stock(&product, requested)?;
            let previous = std::mem::replace(&mut item.quantity, requested);
            return Ok(CartMutation::RestoreQuantity {
                line: item.id.clone(),
                quantity: previous,
            });
        }

        check_stock(&product, quantity)?;
        let item = CartItem::new(LineId::provisional(), product, quantity);
        let line = item.id.clone();
        self.items.push(item);
        Ok(CartMutation::RemoveLine(line))
    }

    /// Set a line's quantity. Below 1 removes the line.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`] if the line doesn't exist (only when
    ///   `quantity >= 1`; removal is idempotent).
    /// - [`CartError::OutOfStock`] if `quantity` exceeds tracked stock. The
    ///   line keeps its old quantity.
    pub fn update_quantity(
        &mut self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartMutation, CartError> {
        if quantity < 1 {
            return Ok(self.remove_item(line_id));
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| &item.id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.clone()))?;

        check_stock(&item.product, quantity)?;
        let previous = std::mem::replace(&mut item.quantity, quantity);
        Ok(CartMutation::RestoreQuantity {
            line: line_id.clone(),
            quantity: previous,
        })
    }

    /// Remove a line. Removing an absent line is a no-op.
    pub fn remove_item(&mut self, line_id: &LineId) -> CartMutation {
        match self.items.iter().position(|item| &item.id == line_id) {
            Some(index) => CartMutation::ReinsertLine {
                index,
                item: self.items.remove(index),
            },
            None => CartMutation::Noop,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) -> CartMutation {
        if self.items.is_empty() {
            CartMutation::Noop
        } else {
            CartMutation::RestoreLines(std::mem::take(&mut self.items))
        }
    }

    /// Undo a previously applied mutation.
    ///
    /// Lines touched by a later mutation are reconciled rather than
    /// duplicated: a restored line that already exists only has its quantity
    /// reset.
    pub fn revert(&mut self, inverse: CartMutation) {
        match inverse {
            CartMutation::Noop => {}
            CartMutation::RemoveLine(line) => {
                self.items.retain(|item| item.id != line);
            }
            CartMutation::RestoreQuantity { line, quantity } => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id == line) {
                    item.quantity = quantity;
                }
            }
            CartMutation::ReinsertLine { index, item } => self.reinsert(index, item),
            CartMutation::RestoreLines(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    self.reinsert(index, item);
                }
            }
        }
    }

    /// Install an authoritative snapshot from the remote store.
    pub fn replace_with(&mut self, snapshot: Self) {
        *self = snapshot;
    }

    fn reinsert(&mut self, index: usize, restored: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|item| item.id == restored.id) {
            existing.quantity = restored.quantity;
        } else {
            let index = index.min(self.items.len());
            self.items.insert(index, restored);
        }
    }
}

fn check_stock(product: &Product, requested: u32) -> Result<(), CartError> {
    match product.available_stock() {
        Some(available) if requested > available => Err(CartError::OutOfStock {
            product_id: product.id,
            requested,
            available,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn product(id: i64, cents: i64, stock: u32, track_inventory: bool) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            handle: format!("product-{id}"),
            image_url: None,
            category: None,
            price: Decimal::new(cents, 2),
            compare_at_price: None,
            stock,
            track_inventory,
        }
    }

    #[test]
    fn test_add_merges_into_existing_line() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 500, 10, true), 2).unwrap();
        cart.add_item(product(1, 500, 10, true), 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_add_beyond_stock_is_rejected_not_clamped() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 500, 5, true), 4).unwrap();
        let err = cart.add_item(product(1, 500, 5, true), 2).unwrap_err();

        assert_eq!(
            err,
            CartError::OutOfStock {
                product_id: ProductId::new(1),
                requested: 6,
                available: 5,
            }
        );
        assert_eq!(cart.lines()[0].quantity, 4);
    }

    #[test]
    fn test_untracked_inventory_ignores_stock() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 100, 0, false), 50).unwrap();
        assert_eq!(cart.item_count(), 50);
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add_item(product(1, 100, 5, true), 0),
            Err(CartError::InvalidQuantity)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_below_one_removes_line() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 100, 5, true), 2).unwrap();
        let line = cart.lines()[0].id.clone();

        let inverse = cart.update_quantity(&line, 0).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(inverse, CartMutation::ReinsertLine { index: 0, .. }));
    }

    #[test]
    fn test_update_over_stock_leaves_line_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 100, 5, true), 3).unwrap();
        let line = cart.lines()[0].id.clone();

        let err = cart.update_quantity(&line, 6).unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { available: 5, .. }));
        assert_eq!(cart.lines()[0].quantity, 3);

        cart.update_quantity(&line, 5).unwrap();
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_update_unknown_line() {
        let mut cart = Cart::new();
        let missing = LineId::new("nope");
        assert_eq!(
            cart.update_quantity(&missing, 2),
            Err(CartError::LineNotFound(missing.clone()))
        );
        assert_eq!(cart.update_quantity(&missing, 0), Ok(CartMutation::Noop));
    }

    #[test]
    fn test_remove_and_clear_are_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 100, 5, true), 1).unwrap();
        let line = cart.lines()[0].id.clone();

        assert!(!cart.remove_item(&line).is_noop());
        assert!(cart.remove_item(&line).is_noop());
        assert!(cart.clear().is_noop());
    }

    #[test]
    fn test_revert_restores_exact_lines() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 100, 5, true), 1).unwrap();
        cart.add_item(product(2, 250, 5, true), 2).unwrap();
        cart.add_item(product(3, 999, 5, true), 3).unwrap();
        let before = cart.clone();

        let middle = cart.lines()[1].id.clone();
        let inverse = cart.remove_item(&middle);
        cart.revert(inverse);
        assert_eq!(cart, before);

        let inverse = cart.clear();
        cart.revert(inverse);
        assert_eq!(cart, before);

        let inverse = cart.add_item(product(4, 100, 5, true), 1).unwrap();
        cart.revert(inverse);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_savings_uses_compare_at_price() {
        let mut discounted = product(1, 800, 10, false);
        discounted.compare_at_price = Some(Decimal::new(1000, 2));
        let mut cart = Cart::new();
        cart.add_item(discounted, 3).unwrap();
        cart.add_item(product(2, 500, 10, false), 1).unwrap();

        assert_eq!(cart.savings(), Decimal::new(600, 2));
    }

    #[test]
    fn test_from_lines_drops_zero_quantity() {
        let lines = vec![
            CartItem::new(LineId::new("a"), product(1, 100, 5, true), 0),
            CartItem::new(LineId::new("b"), product(2, 100, 5, true), 2),
        ];
        let cart = Cart::from_lines(Some(CartId::new(9)), lines);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.id(), Some(CartId::new(9)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize, u32),
        Update(usize, u32),
        Remove(usize),
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0usize..4, 0u32..8).prop_map(|(p, q)| Op::Add(p, q)),
            3 => (0usize..6, 0u32..8).prop_map(|(l, q)| Op::Update(l, q)),
            2 => (0usize..6).prop_map(Op::Remove),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_cart_invariants_hold(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let catalog = [
                product(1, 199, 5, true),
                product(2, 1250, 3, true),
                product(3, 42, 0, false),
                product(4, 999, 1, true),
            ];
            let mut cart = Cart::new();

            for op in ops {
                let before = cart.clone();
                let result = match op {
                    Op::Add(p, q) => cart.add_item(catalog[p].clone(), q),
                    Op::Update(l, q) => match cart.lines().get(l).map(|item| item.id.clone()) {
                        Some(line) => cart.update_quantity(&line, q),
                        None => Ok(CartMutation::Noop),
                    },
                    Op::Remove(l) => match cart.lines().get(l).map(|item| item.id.clone()) {
                        Some(line) => Ok(cart.remove_item(&line)),
                        None => Ok(CartMutation::Noop),
                    },
                    Op::Clear => Ok(cart.clear()),
                };

                match result {
                    Ok(inverse) => {
                        let mut reverted = cart.clone();
                        reverted.revert(inverse);
                        prop_assert_eq!(&reverted, &before);
                    }
                    Err(_) => prop_assert_eq!(&cart, &before),
                }

                let expected: Decimal = cart
                    .lines()
                    .iter()
                    .map(|item| Decimal::from(item.quantity) * item.unit_price)
                    .sum();
                prop_assert_eq!(cart.subtotal(), expected);

                for item in cart.lines() {
                    prop_assert!(item.quantity > 0);
                    if let Some(stock) = item.product.available_stock() {
                        prop_assert!(item.quantity <= stock);
                    }
                }
            }
        }
    }
}
