//! Merging of repeated listing sightings into report rows

use crate::record::{AggregatedRecord, MergeKey, RawShopRecord};
use std::collections::HashMap;
use tracing::debug;

/// Nominal capacity of one shop slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCapacity {
    /// Capacity of a slot holding enchanted items (do not stack)
    pub enchanted: u64,
    /// Capacity of a slot holding plain items (stack to 64 in 54 slots)
    pub plain: u64,
}

impl Default for SlotCapacity {
    fn default() -> Self {
        Self {
            enchanted: 54,
            plain: 3456,
        }
    }
}

impl SlotCapacity {
    /// Capacity of a single sighting
    pub fn per_slot(&self, has_enchantments: bool) -> u64 {
        if has_enchantments {
            self.enchanted
        } else {
            self.plain
        }
    }

    /// Capacity left after `merged_count` sightings holding `total_stock`
    pub fn left_stock(&self, has_enchantments: bool, merged_count: usize, total_stock: u64) -> i64 {
        let capacity = i128::from(self.per_slot(has_enchantments)) * merged_count as i128;
        let left = capacity - i128::from(total_stock);
        left.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

/// Repair cost shown in the report: floor(log2(cost + 1)), or `None` when
/// that is zero. Empty or non-numeric costs count as 0.
///
/// The cost is taken as a double so digit strings of any length still
/// produce a level.
pub fn repair_cost_display(repair_cost: &str) -> Option<u32> {
    let numeric = !repair_cost.is_empty() && repair_cost.bytes().all(|b| b.is_ascii_digit());
    let cost: f64 = if numeric {
        repair_cost.parse().unwrap_or(0.0)
    } else {
        0.0
    };

    let level = (cost + 1.0).log2().floor() as u32;
    (level > 0).then_some(level)
}

#[derive(Debug)]
struct Group {
    key: MergeKey,
    total_stock: u64,
    merged_count: usize,
}

/// Group records by [`MergeKey`] and derive the report fields
///
/// Groups come out in order of first sighting, which keeps the later sort
/// stable for rows that compare equal on land, item and enchantments.
pub fn aggregate(records: &[RawShopRecord], capacity: SlotCapacity) -> Vec<AggregatedRecord> {
    let mut index: HashMap<MergeKey, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for record in records {
        let key = record.merge_key();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                total_stock: 0,
                merged_count: 0,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.total_stock = group.total_stock.saturating_add(record.stock);
        group.merged_count += 1;
    }

    debug!(records = records.len(), groups = groups.len(), "aggregated records");

    groups
        .into_iter()
        .map(|group| {
            let Group {
                key,
                total_stock,
                merged_count,
            } = group;

            AggregatedRecord {
                left_stock: capacity.left_stock(key.has_enchantments, merged_count, total_stock),
                repair_cost_display: repair_cost_display(&key.repair_cost),
                owner: key.owner,
                land: key.land,
                item: key.item,
                enchantments: key.enchantments,
                total_stock,
                buy_price: key.buy_price,
                sell_price: key.sell_price,
                merged_count,
                has_enchantments: key.has_enchantments,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Price;

    fn record(owner: &str, item: &str, stock: u64, enchantments: &str) -> RawShopRecord {
        RawShopRecord {
            owner: owner.to_string(),
            land: "Avalon".to_string(),
            stock,
            item: item.to_string(),
            repair_cost: String::new(),
            enchantments: enchantments.to_string(),
            buy_price: Price::from_cents(100),
            sell_price: Price::ZERO,
        }
    }

    #[test]
    fn test_left_stock_formula() {
        let capacity = SlotCapacity::default();
        assert_eq!(capacity.left_stock(true, 3, 100), 62);
        assert_eq!(capacity.left_stock(false, 1, 64), 3392);
        assert_eq!(capacity.left_stock(true, 1, 100), -46);
    }

    #[test]
    fn test_repair_cost_display() {
        assert_eq!(repair_cost_display(""), None);
        assert_eq!(repair_cost_display("0"), None);
        assert_eq!(repair_cost_display("1"), Some(1));
        assert_eq!(repair_cost_display("3"), Some(2));
        assert_eq!(repair_cost_display("1000"), Some(9));
        assert_eq!(repair_cost_display("abc"), None);
        assert_eq!(repair_cost_display("-5"), None);
    }

    #[test]
    fn test_repair_cost_display_wider_than_u64() {
        // log2(1e20) = 66.4
        assert_eq!(repair_cost_display("99999999999999999999"), Some(66));
        assert_eq!(repair_cost_display("18446744073709551616"), Some(64));
    }

    #[test]
    fn test_aggregate_sums_stock() {
        let records = vec![
            record("A", "Stone", 10, ""),
            record("A", "Stone", 32, ""),
            record("B", "Stone", 5, ""),
            record("A", "Stone", 1, ""),
        ];

        let rows = aggregate(&records, SlotCapacity::default());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].owner, "A");
        assert_eq!(rows[0].total_stock, 43);
        assert_eq!(rows[0].merged_count, 3);
        assert_eq!(rows[0].left_stock, 3456 * 3 - 43);

        assert_eq!(rows[1].owner, "B");
        assert_eq!(rows[1].total_stock, 5);
        assert_eq!(rows[1].merged_count, 1);
    }

    #[test]
    fn test_aggregate_keeps_prices_apart() {
        let mut cheap = record("A", "Stone", 10, "");
        cheap.buy_price = Price::from_cents(50);
        let records = vec![cheap, record("A", "Stone", 10, "")];

        let rows = aggregate(&records, SlotCapacity::default());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.merged_count == 1));
    }

    #[test]
    fn test_aggregate_enchanted_capacity() {
        let records = vec![
            record("A", "Diamond Sword", 40, "Sharpness V"),
            record("A", "Diamond Sword", 30, "Sharpness V"),
            record("A", "Diamond Sword", 30, "Sharpness V"),
        ];

        let rows = aggregate(&records, SlotCapacity::default());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].has_enchantments);
        assert_eq!(rows[0].left_stock, 62);
    }

    #[test]
    fn test_aggregate_custom_capacity() {
        let capacity = SlotCapacity {
            enchanted: 1,
            plain: 100,
        };
        let rows = aggregate(&[record("A", "Stone", 40, "")], capacity);
        assert_eq!(rows[0].left_stock, 60);
    }
}
