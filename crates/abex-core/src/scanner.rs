//! Owner block scanner
//!
//! An owner block looks like this in the log:
//!
//! ```text
//! [CHAT] Owner: Notch
//! [CHAT] Stock: 1,024
//! [CHAT] Item: [§bDiamond]
//! [CHAT] Buy §a64 for §e1,280 Coins
//! [CHAT] Sell §a64 for §e640 Coins
//! [CHAT] Repair Cost: 3
//! [CHAT] §7Sharpness V
//! ```
//!
//! The first three lines are positional. Everything after them up to the
//! next owner header belongs to the block. The current land is threaded
//! through the scan explicitly; a teleport inside a block changes the land
//! of that block and of every block after it.

use crate::classify::{classify, is_owner_header, owner_name, strip_color_codes, LineKind};
use crate::record::{Price, RawShopRecord, UNKNOWN};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Buy line with color codes before each number
pub const BUY_COLORED_PATTERN: &str = r"Buy\s+§[0-9a-f](\d+)\s+for\s+§[0-9a-f]([\d,]+)\s+Coins";
/// Buy line without color codes
pub const BUY_PLAIN_PATTERN: &str = r"Buy\s+(\d+)\s+for\s+([\d,]+)\s+Coins";
/// Sell line with color codes before each number
pub const SELL_COLORED_PATTERN: &str =
    r"Sell\s+§[0-9a-f](\d+)\s+for\s+§[0-9a-f]([\d,]+)\s+Coins";
/// Sell line without color codes
pub const SELL_PLAIN_PATTERN: &str = r"Sell\s+(\d+)\s+for\s+([\d,]+)\s+Coins";
/// Capitalized words ending in a roman numeral I to V
pub const ENCHANTMENT_PATTERN: &str = r"^[A-Za-z\s']+\s(?:I|II|III|IV|V)$";

const STOCK_PATTERN: &str = r"Stock:\s*([\d,]+)";
const ITEM_PATTERN: &str = r"Item:\s*\[(.+?)\]";
const REPAIR_COST_PATTERN: &str = r"Repair Cost:\s*(\d+)";

/// Lines containing any of these are field lines, never enchantments
const KNOWN_FIELD_KEYWORDS: &[&str] = &["Owner:", "Stock:", "Item:", "Buy", "Sell", "Repair Cost:"];

const CHAT_MARKER: &str = "[CHAT]";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid scanner regex")
}

/// Price patterns in the order they are tried; first match wins
static BUY_PATTERNS: LazyLock<[Regex; 2]> =
    LazyLock::new(|| [compile(BUY_COLORED_PATTERN), compile(BUY_PLAIN_PATTERN)]);
static SELL_PATTERNS: LazyLock<[Regex; 2]> =
    LazyLock::new(|| [compile(SELL_COLORED_PATTERN), compile(SELL_PLAIN_PATTERN)]);
static ENCHANTMENT_RE: LazyLock<Regex> = LazyLock::new(|| compile(ENCHANTMENT_PATTERN));
static STOCK_RE: LazyLock<Regex> = LazyLock::new(|| compile(STOCK_PATTERN));
static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| compile(ITEM_PATTERN));
static REPAIR_COST_RE: LazyLock<Regex> = LazyLock::new(|| compile(REPAIR_COST_PATTERN));

/// Outcome of scanning one owner block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockScan {
    /// The record, or `None` if the block was too short
    pub record: Option<RawShopRecord>,
    /// Land in effect after the block (a teleport inside the block moves it)
    pub land: String,
    /// Index at which the outer scan resumes
    pub next: usize,
}

/// Scan a whole log and return one record per complete owner block
///
/// Lines are expected to be trimmed. The land starts out as
/// [`UNKNOWN`] and follows every teleport notice, including ones that
/// appear between the fields of an owner block.
pub fn scan_lines<S: AsRef<str>>(lines: &[S]) -> Vec<RawShopRecord> {
    let mut records = Vec::new();
    let mut land = UNKNOWN.to_string();
    let mut i = 0;

    while i < lines.len() {
        match classify(lines[i].as_ref()) {
            LineKind::Teleport(new_land) => {
                debug!(line = i + 1, land = %new_land, "land changed");
                land = new_land;
                i += 1;
            }
            LineKind::OwnerHeader(_) => {
                let scan = scan_block(lines, i, land);
                land = scan.land;
                records.extend(scan.record);
                i = scan.next;
            }
            LineKind::Other => i += 1,
        }
    }

    debug!(records = records.len(), lines = lines.len(), "scan complete");
    records
}

/// Scan the owner block whose header is at `start`
///
/// Returns the record (if the Stock and Item lines exist), the land in
/// effect once the block ends, and the index of the next owner header or
/// `lines.len()`. The returned index is always greater than `start`.
pub fn scan_block<S: AsRef<str>>(lines: &[S], start: usize, land: String) -> BlockScan {
    let header = lines[start].as_ref();
    let owner = owner_name(header);

    if start + 2 >= lines.len() {
        warn!(
            line = start + 1,
            owner = %owner,
            "owner block is incomplete (missing Stock or Item line), skipped"
        );
        return BlockScan {
            record: None,
            land,
            next: start + 1,
        };
    }

    let stock = parse_stock(lines[start + 1].as_ref());
    let item = parse_item(lines[start + 2].as_ref());

    let mut land = land;
    let mut fields = BlockFields::default();
    let mut j = start + 3;

    while j < lines.len() {
        let line = lines[j].as_ref();

        if let LineKind::Teleport(new_land) = classify(line) {
            debug!(line = j + 1, land = %new_land, "land changed inside owner block");
            land = new_land;
        }

        if is_owner_header(line) {
            break;
        }

        fields.absorb(line);
        j += 1;
    }

    let record = RawShopRecord {
        owner,
        land: land.clone(),
        stock,
        item,
        repair_cost: fields.repair_cost,
        enchantments: enchantment_signature(fields.enchantments),
        buy_price: fields.buy_price,
        sell_price: fields.sell_price,
    };

    BlockScan {
        record: Some(record),
        land,
        next: j,
    }
}

/// Fields collected from the free-form tail of an owner block
#[derive(Debug, Default)]
struct BlockFields {
    buy_price: Price,
    sell_price: Price,
    repair_cost: String,
    enchantments: Vec<String>,
}

impl BlockFields {
    fn absorb(&mut self, line: &str) {
        if line.contains("Buy") {
            if let Some(price) = parse_price(line, BUY_PATTERNS.as_slice()) {
                self.buy_price = price;
            }
        } else if line.contains("Sell") {
            if let Some(price) = parse_price(line, SELL_PATTERNS.as_slice()) {
                self.sell_price = price;
            }
        } else if line.contains("Repair Cost:") {
            // A later Repair Cost line wins, even if it has no digits
            self.repair_cost = REPAIR_COST_RE
                .captures(line)
                .map(|caps| caps[1].to_string())
                .unwrap_or_default();
        } else if line.contains(CHAT_MARKER) {
            if let Some(enchantment) = parse_enchantment(line) {
                self.enchantments.push(enchantment);
            }
        }
    }
}

/// Parse "1,234" style integers; empty input is 0
fn parse_int(digits: &str) -> Option<u64> {
    let cleaned: String = digits.chars().filter(|&c| c != ',').collect();
    if cleaned.is_empty() {
        return Some(0);
    }
    cleaned.parse().ok()
}

/// Stock count from the line after the header, 0 if absent
pub fn parse_stock(line: &str) -> u64 {
    STOCK_RE
        .captures(line)
        .and_then(|caps| parse_int(&caps[1]))
        .unwrap_or(0)
}

/// Item name from the second line after the header, color codes removed
pub fn parse_item(line: &str) -> String {
    ITEM_RE
        .captures(line)
        .map(|caps| strip_color_codes(caps[1].trim()))
        .unwrap_or_default()
}

/// Unit price from a Buy or Sell line, trying `patterns` in order
///
/// Returns `None` when no pattern matches, so the caller keeps its current
/// value.
pub fn parse_price(line: &str, patterns: &[Regex]) -> Option<Price> {
    let caps = patterns.iter().find_map(|re| re.captures(line))?;
    let quantity: u64 = caps[1].parse().ok()?;
    let total = parse_int(&caps[2])?;
    Price::unit(total, quantity)
}

/// Enchantment text from a chat line, if the line is one
pub fn parse_enchantment(line: &str) -> Option<String> {
    let content = line.rsplit(CHAT_MARKER).next().unwrap_or(line).trim();
    let content = strip_color_codes(content);

    if content.is_empty() || KNOWN_FIELD_KEYWORDS.iter().any(|kw| line.contains(kw)) {
        return None;
    }

    ENCHANTMENT_RE.is_match(&content).then_some(content)
}

/// Sort enchantments and join them into the canonical signature
pub fn enchantment_signature(mut enchantments: Vec<String>) -> String {
    enchantments.sort();
    enchantments.join(", ")
}
