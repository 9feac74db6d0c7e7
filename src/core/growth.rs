use chrono::{Datelike, Months};

use super::error::{CoreError, CoreResult};
use super::sip::percent_return;
use super::types::{GrowthPoint, GrowthReport, InvestmentMode, NavPoint};

/// Replays a NAV history as either a monthly SIP or a single lump sum.
///
/// `years > 0` keeps only the trailing `years` calendar years before the last
/// point. SIP contributions land on the first available point of each month.
pub fn simulate_growth(
    history: &[NavPoint],
    mode: InvestmentMode,
    amount: f64,
    years: u32,
) -> CoreResult<GrowthReport> {
    let window = trailing_window(history, years);
    let Some(first) = window.first() else {
        return Err(CoreError::InsufficientHistory);
    };
    if window.len() < 2 {
        return Err(CoreError::InsufficientHistory);
    }

    let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    let mut points = Vec::with_capacity(window.len());

    match mode {
        InvestmentMode::Lumpsum => {
            let units = if first.nav > 0.0 { amount / first.nav } else { 0.0 };
            for point in window {
                points.push(GrowthPoint {
                    date: point.date,
                    nav: point.nav,
                    invested: amount,
                    value: units * point.nav,
                });
            }
        }
        InvestmentMode::Sip => {
            let mut units = 0.0;
            let mut invested = 0.0;
            let mut last_month = None;
            for point in window {
                let month = (point.date.year(), point.date.month());
                if last_month != Some(month) {
                    if point.nav > 0.0 {
                        units += amount / point.nav;
                    }
                    invested += amount;
                    last_month = Some(month);
                }
                points.push(GrowthPoint {
                    date: point.date,
                    nav: point.nav,
                    invested,
                    value: units * point.nav,
                });
            }
        }
    }

    let (total_invested, current_value) = points
        .last()
        .map(|p| (p.invested, p.value))
        .unwrap_or((0.0, 0.0));
    let absolute_return = percent_return(current_value, total_invested);

    tracing::debug!(?mode, points = points.len(), total_invested, "simulated growth");

    Ok(GrowthReport {
        mode,
        total_invested,
        current_value,
        absolute_return,
        is_profit: absolute_return >= 0.0,
        points,
    })
}

fn trailing_window(history: &[NavPoint], years: u32) -> &[NavPoint] {
    if years == 0 {
        return history;
    }
    let Some(last) = history.last() else {
        return history;
    };
    let Some(cutoff) = years
        .checked_mul(12)
        .and_then(|months| last.date.checked_sub_months(Months::new(months)))
    else {
        return history;
    };
    let start = history.partition_point(|p| p.date < cutoff);
    &history[start..]
}

/// Indian-style currency label: crore above 1e7, lakh above 1e5.
pub fn format_inr(value: f64) -> String {
    if value >= 10_000_000.0 {
        format!("₹{:.2} Cr", value / 10_000_000.0)
    } else if value >= 100_000.0 {
        format!("₹{:.2} L", value / 100_000.0)
    } else {
        format!("₹{}", group_thousands(value.round() as i64))
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
