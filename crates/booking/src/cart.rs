//! Cart model with minor-unit totals.
//!
//! The cart lives in the booking store (`cart.<slug>`), filled on the
//! treatments step and snapshotted into order metadata at checkout. All
//! amounts are integer minor units; a cart is single-currency.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fernhill_core::{CurrencyCode, MedicineId, Money, MoneyError};

use crate::platform::Medicine;

/// Errors from cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantity must be at least 1 on admission.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Item currency differs from the cart's currency.
    #[error("item currency {item} does not match cart currency {cart}")]
    CurrencyMismatch {
        cart: CurrencyCode,
        item: CurrencyCode,
    },
    /// Item is out of stock.
    #[error("item is out of stock")]
    OutOfStock,
    /// Minor-unit arithmetic overflow.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Identity key: medicine id, else sku, else name+variation composite.
    pub key: String,
    #[serde(default)]
    pub medicine_id: Option<MedicineId>,
    #[serde(default)]
    pub sku: Option<String>,
    pub name: String,
    #[serde(default)]
    pub variation: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub min_quantity: Option<u32>,
    #[serde(default)]
    pub max_quantity: Option<u32>,
}

impl CartItem {
    /// Compute the identity key for an item candidate.
    ///
    /// Medicine id wins, then sku, then a name+variation composite, so the
    /// same treatment merges regardless of which fields the catalog filled.
    #[must_use]
    pub fn identity(
        medicine_id: Option<&MedicineId>,
        sku: Option<&str>,
        name: &str,
        variation: Option<&str>,
    ) -> String {
        if let Some(id) = medicine_id {
            return id.as_str().to_owned();
        }
        if let Some(sku) = sku {
            return sku.to_owned();
        }
        match variation {
            Some(v) => format!("{name}::{v}"),
            None => name.to_owned(),
        }
    }

    /// Clamp a quantity to the item's stock bounds.
    #[must_use]
    pub fn clamp_quantity(&self, quantity: u32) -> u32 {
        let mut q = quantity;
        if let Some(max) = self.max_quantity {
            q = q.min(max);
        }
        if let Some(min) = self.min_quantity {
            q = q.max(min);
        }
        q
    }

    /// Line total (unit price × quantity).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` on minor-unit overflow.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A customer's cart for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub currency: CurrencyCode,
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart in the given currency.
    #[must_use]
    pub const fn new(currency: CurrencyCode) -> Self {
        Self {
            currency,
            items: Vec::new(),
        }
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Add a medicine to the cart.
    ///
    /// Colliding identities merge by summing quantities; the result is
    /// clamped to the item's stock bounds.
    ///
    /// # Errors
    ///
    /// Rejects zero quantities, out-of-stock medicines, and currency
    /// mismatches before touching the cart.
    pub fn add(&mut self, medicine: &Medicine, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if !medicine.in_stock {
            return Err(CartError::OutOfStock);
        }
        if medicine.currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                cart: self.currency,
                item: medicine.currency,
            });
        }

        let key = CartItem::identity(
            Some(&medicine.id),
            medicine.sku.as_deref(),
            &medicine.name,
            medicine.variation.as_deref(),
        );

        if let Some(existing) = self.items.iter_mut().find(|item| item.key == key) {
            let merged = existing.quantity.saturating_add(quantity);
            existing.quantity = existing.clamp_quantity(merged);
            return Ok(());
        }

        let item = CartItem {
            key,
            medicine_id: Some(medicine.id.clone()),
            sku: medicine.sku.clone(),
            name: medicine.name.clone(),
            variation: medicine.variation.clone(),
            quantity,
            unit_price: Money::from_minor(medicine.price_minor, medicine.currency),
            min_quantity: medicine.min_quantity,
            max_quantity: medicine.max_quantity,
        };
        let clamped = item.clamp_quantity(quantity);
        self.items.push(CartItem {
            quantity: clamped,
            ..item
        });
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line; other values clamp to
    /// the item's stock bounds. Unknown keys are ignored.
    pub fn set_quantity(&mut self, key: &str, quantity: u32) {
        if quantity == 0 {
            self.remove(key);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.key == key) {
            item.quantity = item.clamp_quantity(quantity);
        }
    }

    /// Remove a line by identity key.
    pub fn remove(&mut self, key: &str) {
        self.items.retain(|item| item.key != key);
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` on minor-unit overflow.
    pub fn subtotal(&self) -> Result<Money, MoneyError> {
        let mut total = Money::zero(self.currency);
        for item in &self.items {
            total = total.checked_add(item.line_total()?)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn medicine(id: &str, name: &str, variation: Option<&str>, price_minor: i64) -> Medicine {
        Medicine {
            id: MedicineId::new(id),
            sku: None,
            name: name.to_string(),
            variation: variation.map(String::from),
            price_minor,
            currency: CurrencyCode::GBP,
            min_quantity: None,
            max_quantity: None,
            in_stock: true,
        }
    }

    #[test]
    fn test_line_total_and_subtotal() {
        // quantity 2 at 500 minor -> line 1000; subtotal sums all lines
        let mut cart = Cart::new(CurrencyCode::GBP);
        cart.add(&medicine("med_1", "Finasteride", Some("1 mg"), 500), 2)
            .unwrap();
        cart.add(&medicine("med_2", "Minoxidil", None, 250), 1).unwrap();

        let lines: Vec<i64> = cart
            .items()
            .iter()
            .map(|i| i.line_total().unwrap().minor())
            .collect();
        assert_eq!(lines, vec![1000, 250]);
        assert_eq!(cart.subtotal().unwrap().minor(), 1250);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_merges_on_identity() {
        let mut cart = Cart::new(CurrencyCode::GBP);
        let med = medicine("med_1", "Finasteride", Some("1 mg"), 500);
        cart.add(&med, 1).unwrap();
        cart.add(&med, 2).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_identity_fallback_chain() {
        let id = MedicineId::new("med_1");
        assert_eq!(
            CartItem::identity(Some(&id), Some("SKU-9"), "Name", None),
            "med_1"
        );
        assert_eq!(
            CartItem::identity(None, Some("SKU-9"), "Name", None),
            "SKU-9"
        );
        assert_eq!(
            CartItem::identity(None, None, "Name", Some("2.5 mg")),
            "Name::2.5 mg"
        );
        assert_eq!(CartItem::identity(None, None, "Name", None), "Name");
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut cart = Cart::new(CurrencyCode::GBP);
        let med = medicine("med_1", "Finasteride", None, 500);
        assert_eq!(cart.add(&med, 0), Err(CartError::ZeroQuantity));

        let mut sold_out = med.clone();
        sold_out.in_stock = false;
        assert_eq!(cart.add(&sold_out, 1), Err(CartError::OutOfStock));

        let mut usd = med;
        usd.currency = CurrencyCode::USD;
        assert!(matches!(
            cart.add(&usd, 1),
            Err(CartError::CurrencyMismatch { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_clamps_to_stock_bounds() {
        let mut cart = Cart::new(CurrencyCode::GBP);
        let mut med = medicine("med_1", "Finasteride", None, 500);
        med.max_quantity = Some(3);
        med.min_quantity = Some(1);

        cart.add(&med, 10).unwrap();
        assert_eq!(cart.items()[0].quantity, 3);

        cart.set_quantity("med_1", 2);
        assert_eq!(cart.items()[0].quantity, 2);

        cart.set_quantity("med_1", 99);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new(CurrencyCode::GBP);
        cart.add(&medicine("med_1", "Finasteride", None, 500), 1)
            .unwrap();
        cart.set_quantity("med_1", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new(CurrencyCode::GBP);
        cart.add(&medicine("med_1", "Finasteride", None, 500), 1)
            .unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().unwrap().minor(), 0);
    }
}
