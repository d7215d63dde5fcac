//! Append-merge of alerts into a ledger entry, idempotent by alert type

use crate::models::alert::{Alert, AlertLedgerEntry};

/// Append every alert whose type is not yet in `entry`. Returns how many
/// were added; re-merging the same alerts adds nothing.
pub fn merge_alerts(entry: &mut AlertLedgerEntry, alerts: impl IntoIterator<Item = Alert>) -> usize {
    let mut added = 0;
    for alert in alerts {
        if entry.has(&alert.kind) {
            continue;
        }
        entry.alerts.push(alert);
        added += 1;
    }
    added
}
