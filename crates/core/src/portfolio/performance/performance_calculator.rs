use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;

use super::performance_model::{PeriodPerformance, PerformanceReport};
use crate::portfolio::history::HistoryPoint;

/// Buckets a date-ascending history series into yearly and monthly periods.
///
/// Each period ends at its last point and starts at the last point strictly
/// before the period's first point (a zero baseline when the period opens
/// the series). Gain is value change net of contribution change.
pub fn aggregate(history: &[HistoryPoint]) -> PerformanceReport {
    if history.is_empty() {
        return PerformanceReport::default();
    }

    let mut years: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    let mut months: BTreeMap<(i32, u32), (usize, usize)> = BTreeMap::new();
    for (index, point) in history.iter().enumerate() {
        years
            .entry(point.date.year())
            .and_modify(|(_, last)| *last = index)
            .or_insert((index, index));
        months
            .entry((point.date.year(), point.date.month()))
            .and_modify(|(_, last)| *last = index)
            .or_insert((index, index));
    }

    let yearly = years
        .iter()
        .map(|(year, &(first, last))| {
            period_performance(year.to_string(), baseline(history, first), &history[last])
        })
        .collect();
    let monthly = months
        .iter()
        .map(|(&(year, month), &(first, last))| {
            period_performance(
                format!("{:04}-{:02}", year, month),
                baseline(history, first),
                &history[last],
            )
        })
        .collect();

    PerformanceReport { yearly, monthly }
}

/// Invested and value just before the period opens; zero when the period
/// starts the series.
fn baseline(history: &[HistoryPoint], first_index: usize) -> (Decimal, Decimal) {
    if first_index == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let point = &history[first_index - 1];
        (point.invested, point.value)
    }
}

fn period_performance(
    period: String,
    (start_invested, start_value): (Decimal, Decimal),
    end: &HistoryPoint,
) -> PeriodPerformance {
    let gain = (end.value - start_value) - (end.invested - start_invested);
    let average_invested = (start_invested + end.invested) / Decimal::TWO;
    let roi = if average_invested.is_zero() {
        Decimal::ZERO
    } else {
        gain / average_invested * Decimal::ONE_HUNDRED
    };
    PeriodPerformance {
        period,
        gain,
        roi,
        invested: end.invested,
        value: end.value,
    }
}
