//! Static lookup from player sheet names to batting-order slot codes

use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

/// Sheet name to slot code assignments, applied in order.
///
/// "2310 Player" is assigned twice; the later assignment (`a_9`) wins, so `h_9`
/// is never produced.
const ASSIGNMENTS: &[(&str, &str)] = &[
    // first-base side (home)
    ("2302 Player", "h_1"),
    ("2303 Player", "h_2"),
    ("2304 Player", "h_3"),
    ("2305 Player", "h_4"),
    ("2306 Player", "h_5"),
    ("2307 Player", "h_6"),
    ("2308 Player", "h_7"),
    ("2309 Player", "h_8"),
    ("2310 Player", "h_9"),
    // third-base side (away)
    ("2322 Player", "a_1"),
    ("2323 Player", "a_2"),
    ("2324 Player", "a_3"),
    ("2325 Player", "a_4"),
    ("2326 Player", "a_5"),
    ("2327 Player", "a_6"),
    ("2328 Player", "a_7"),
    ("2329 Player", "a_8"),
    ("2310 Player", "a_9"),
];

static DEFAULT_TABLE: LazyLock<BatOrderTable> =
    LazyLock::new(|| BatOrderTable::from_assignments(ASSIGNMENTS));

/// Immutable sheet-name to slot-code mapping
#[derive(Debug, Clone)]
pub struct BatOrderTable {
    slots: BTreeMap<&'static str, &'static str>,
    overwritten: Vec<&'static str>,
}

impl BatOrderTable {
    /// The process-wide table
    pub fn global() -> &'static BatOrderTable {
        &DEFAULT_TABLE
    }

    /// Build a table; later assignments to the same sheet name replace earlier ones
    pub fn from_assignments(assignments: &[(&'static str, &'static str)]) -> Self {
        let mut slots = BTreeMap::new();
        let mut overwritten = Vec::new();

        for &(sheet, slot) in assignments {
            if let Some(previous) = slots.insert(sheet, slot) {
                debug!(sheet, previous, slot, "bat order key assigned twice, keeping last");
                overwritten.push(sheet);
            }
        }

        Self { slots, overwritten }
    }

    /// Slot code for a sheet, if mapped
    pub fn lookup(&self, sheet_name: &str) -> Option<&'static str> {
        self.slots.get(sheet_name).copied()
    }

    /// Slot code for a sheet, falling back to the sheet name itself
    pub fn slot_for<'a>(&self, sheet_name: &'a str) -> &'a str {
        self.lookup(sheet_name).unwrap_or(sheet_name)
    }

    /// Number of distinct sheet names
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sheet names whose assignment was replaced by a later one
    pub fn overwritten_keys(&self) -> &[&'static str] {
        &self.overwritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_and_away_slots() {
        let table = BatOrderTable::global();
        assert_eq!(table.lookup("2302 Player"), Some("h_1"));
        assert_eq!(table.lookup("2309 Player"), Some("h_8"));
        assert_eq!(table.lookup("2322 Player"), Some("a_1"));
        assert_eq!(table.lookup("2329 Player"), Some("a_8"));
    }

    #[test]
    fn test_duplicate_key_last_assignment_wins() {
        let table = BatOrderTable::global();
        assert_eq!(table.len(), 17);
        assert_eq!(table.lookup("2310 Player"), Some("a_9"));
        assert_eq!(table.overwritten_keys(), &["2310 Player"]);
    }

    #[test]
    fn test_unmapped_sheet_falls_back_to_name() {
        let table = BatOrderTable::global();
        assert_eq!(table.lookup("Bullpen"), None);
        assert_eq!(table.slot_for("Bullpen"), "Bullpen");
        assert_eq!(table.slot_for("2303 Player"), "h_2");
    }

    #[test]
    fn test_exact_match_only() {
        let table = BatOrderTable::global();
        assert_eq!(table.lookup("2302 player"), None);
        assert_eq!(table.lookup(" 2302 Player"), None);
    }
}
