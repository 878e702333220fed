//! # Drink Stock Arithmetic
//!
//! Drinks are stocked as whole packs plus loose units.
//!
//! ```text
//! total = packStock × unitsPerPack + unitStock          (never negative)
//!
//! take 5 from { packs: 2, units: 3, perPack: 24 }
//!   loose first:  3 units gone, 2 still needed
//!   open 1 pack:  24 − 2 = 22 loose units left
//!   result:       { packs: 1, units: 22 }
//!
//! returned units always go back to loose stock
//! ```

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_quantity;

/// Stock of one drink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub units_per_pack: i64,
    pub pack_stock: i64,
    pub unit_stock: i64,
}

impl StockLevel {
    pub const fn new(units_per_pack: i64, pack_stock: i64, unit_stock: i64) -> Self {
        StockLevel {
            units_per_pack,
            pack_stock,
            unit_stock,
        }
    }

    #[inline]
    pub const fn total_units(&self) -> i64 {
        self.pack_stock * self.units_per_pack + self.unit_stock
    }

    /// Removes `qty` units, loose units first, then whole packs.
    ///
    /// Returns `None` when fewer than `qty` units are in stock.
    pub fn take(self, qty: i64) -> Option<StockLevel> {
        if qty < 0 || qty > self.total_units() {
            return None;
        }

        if qty <= self.unit_stock {
            return Some(StockLevel {
                unit_stock: self.unit_stock - qty,
                ..self
            });
        }

        let needed = qty - self.unit_stock;
        let per_pack = self.units_per_pack.max(1);
        let packs_opened = (needed + per_pack - 1) / per_pack;

        Some(StockLevel {
            units_per_pack: self.units_per_pack,
            pack_stock: self.pack_stock - packs_opened,
            unit_stock: packs_opened * per_pack - needed,
        })
    }

    /// Puts `qty` units back as loose stock.
    pub fn give_back(self, qty: i64) -> StockLevel {
        StockLevel {
            unit_stock: self.unit_stock + qty.max(0),
            ..self
        }
    }
}

/// One requested drink line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrinkOrder {
    pub drink_id: String,
    pub quantity: i64,
}

/// Merges repeated drink ids, keeping first-seen order.
///
/// The whole order is checked against stock before any line is written, so
/// `[beer ×2, beer ×3]` must be checked as `beer ×5`.
pub fn aggregate_orders(orders: &[DrinkOrder]) -> CoreResult<Vec<DrinkOrder>> {
    let mut merged: Vec<DrinkOrder> = Vec::with_capacity(orders.len());

    for order in orders {
        validate_quantity(order.quantity)?;
        match merged.iter_mut().find(|m| m.drink_id == order.drink_id) {
            Some(existing) => existing.quantity += order.quantity,
            None => merged.push(order.clone()),
        }
    }

    for order in &merged {
        validate_quantity(order.quantity).map_err(CoreError::from)?;
    }

    Ok(merged)
}
