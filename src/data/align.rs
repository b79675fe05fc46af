use crate::models::{Bar, IndexedBar};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Pair each stock bar with the index close of the same date
///
/// Dates present in only one of the two series are dropped.
pub fn align_with_index(stock: &[Bar], index: &[Bar]) -> Vec<IndexedBar> {
    let index_closes: HashMap<NaiveDate, f64> = index.iter().map(|b| (b.date, b.close)).collect();

    let aligned: Vec<IndexedBar> = stock
        .iter()
        .filter_map(|bar| {
            index_closes.get(&bar.date).map(|&index_close| IndexedBar {
                bar: *bar,
                index_close,
            })
        })
        .collect();

    let dropped = stock.len() - aligned.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} stock bars with no index close", dropped);
    }

    aligned
}
