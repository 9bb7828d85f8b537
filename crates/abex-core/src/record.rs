//! Record types for shop listings extracted from a chat log

use serde::{Serialize, Serializer};
use std::fmt;

/// Placeholder used when an owner or land name is not present in the log
pub const UNKNOWN: &str = "Unknown";

/// A unit price held as exact hundredths of a coin
///
/// Keeping the rounded value as an integer makes prices usable in a hash
/// key and keeps equality exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Price {
    cents: u64,
}

impl Price {
    /// A zero price, used when no Buy/Sell line was found
    pub const ZERO: Price = Price { cents: 0 };

    /// Create a price from hundredths of a coin
    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Unit price of `quantity` items sold for `total` coins, rounded to
    /// two decimal places.
    ///
    /// The quotient is taken as a double and rounded on its exact binary
    /// value, so `1 / 40` (stored just above 0.025) becomes 0.03 while
    /// `3 / 40` (stored just below 0.075) becomes 0.07.
    ///
    /// A zero quantity yields [`Price::ZERO`]. Returns `None` if the
    /// rounded value does not fit in 64 bits of hundredths.
    pub fn unit(total: u64, quantity: u64) -> Option<Self> {
        if quantity == 0 {
            return Some(Self::ZERO);
        }

        let quotient = total as f64 / quantity as f64;
        let rounded = format!("{:.2}", quotient);
        let (whole, frac) = rounded.split_once('.')?;
        let cents = whole
            .parse::<u64>()
            .ok()?
            .checked_mul(100)?
            .checked_add(frac.parse::<u64>().ok()?)?;

        Some(Self { cents })
    }

    /// Value as a float (for JSON output)
    pub fn as_f64(self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Price {
    /// Always prints at least one fractional digit: `100.0`, `12.5`, `0.33`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.cents / 100;
        let frac = self.cents % 100;
        if frac % 10 == 0 {
            write!(f, "{}.{}", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}", whole, frac)
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// One listing occurrence read from an owner block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawShopRecord {
    /// Shop owner name, or [`UNKNOWN`]
    pub owner: String,
    /// Land the player was in when the block was read, or [`UNKNOWN`]
    pub land: String,
    /// Items in stock (0 if the Stock line was missing)
    pub stock: u64,
    /// Item name with color codes removed
    pub item: String,
    /// Raw digits from the Repair Cost line, empty if absent
    pub repair_cost: String,
    /// Canonical enchantment signature: sorted, joined with ", "
    pub enchantments: String,
    /// Unit buy price
    pub buy_price: Price,
    /// Unit sell price
    pub sell_price: Price,
}

impl RawShopRecord {
    /// True if any enchantment line was captured
    pub fn has_enchantments(&self) -> bool {
        !self.enchantments.is_empty()
    }

    /// Identity used to merge repeated sightings of the same listing
    pub fn merge_key(&self) -> MergeKey {
        MergeKey {
            owner: self.owner.clone(),
            land: self.land.clone(),
            item: self.item.clone(),
            repair_cost: self.repair_cost.clone(),
            enchantments: self.enchantments.clone(),
            buy_price: self.buy_price,
            sell_price: self.sell_price,
            has_enchantments: self.has_enchantments(),
        }
    }
}

/// Composite identity of a listing. Prices are part of the identity, so the
/// same item offered at two prices stays as two rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    pub owner: String,
    pub land: String,
    pub item: String,
    pub repair_cost: String,
    pub enchantments: String,
    pub buy_price: Price,
    pub sell_price: Price,
    pub has_enchantments: bool,
}

/// One row of the final report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedRecord {
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Land")]
    pub land: String,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Enchantments")]
    pub enchantments: String,
    /// Sum of stock over all merged sightings
    #[serde(rename = "Stock")]
    pub total_stock: u64,
    /// Capacity of the merged slots minus `total_stock`; negative when a
    /// shop holds more than the nominal capacity
    #[serde(rename = "Left Stock")]
    pub left_stock: i64,
    #[serde(rename = "Buy Price")]
    pub buy_price: Price,
    #[serde(rename = "Sell Price")]
    pub sell_price: Price,
    /// floor(log2(cost + 1)), `None` when that is zero
    #[serde(rename = "Repair Cost")]
    pub repair_cost_display: Option<u32>,
    #[serde(rename = "Merged Count")]
    pub merged_count: usize,
    #[serde(skip)]
    pub has_enchantments: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_unit_rounding() {
        assert_eq!(Price::unit(100, 3), Some(Price::from_cents(3333)));
        assert_eq!(Price::unit(200, 3), Some(Price::from_cents(6667)));
        assert_eq!(Price::unit(640, 64), Some(Price::from_cents(1000)));
    }

    #[test]
    fn test_price_unit_rounds_binary_value() {
        // 1/40 is stored as 0.025000000000000001, 3/40 as 0.074999999999999997
        assert_eq!(Price::unit(1, 40), Some(Price::from_cents(3)));
        assert_eq!(Price::unit(3, 40), Some(Price::from_cents(7)));
        // 0.375 is exact and rounds to the even hundredth
        assert_eq!(Price::unit(3, 8), Some(Price::from_cents(38)));
    }

    #[test]
    fn test_price_unit_zero_quantity() {
        assert_eq!(Price::unit(500, 0), Some(Price::ZERO));
    }

    #[test]
    fn test_price_unit_overflow() {
        assert_eq!(Price::unit(u64::MAX, 1), None);
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(10000).to_string(), "100.0");
        assert_eq!(Price::from_cents(1250).to_string(), "12.5");
        assert_eq!(Price::from_cents(33).to_string(), "0.33");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert_eq!(Price::ZERO.to_string(), "0.0");
    }

    #[test]
    fn test_merge_key_has_enchantments() {
        let record = RawShopRecord {
            owner: "Steve".to_string(),
            land: "Spawn".to_string(),
            stock: 1,
            item: "Diamond Sword".to_string(),
            repair_cost: String::new(),
            enchantments: "Sharpness V".to_string(),
            buy_price: Price::ZERO,
            sell_price: Price::ZERO,
        };

        assert!(record.has_enchantments());
        assert!(record.merge_key().has_enchantments);
    }
}
