use std::collections::BTreeMap;

pub mod application;
pub mod profile;
pub mod session;
pub mod user;

/// Turns `GROUP BY status` rows into a map holding every known status,
/// with zero for statuses that had no rows. Unknown keys are dropped.
pub fn zero_filled_counts<'a>(
    statuses: impl IntoIterator<Item = &'a str>,
    rows: Vec<(String, i64)>,
) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = statuses
        .into_iter()
        .map(|status| (status.to_string(), 0))
        .collect();
    for (status, count) in rows {
        if let Some(slot) = counts.get_mut(&status) {
            *slot += count;
        }
    }
    counts
}
