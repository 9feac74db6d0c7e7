use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rand::Rng;

use super::error::{CoreError, CoreResult};
use super::selection::COMPARE_LIMIT;
use super::synth::{generate_history, round_dp};
use super::types::{
    Comparison, ComparisonPoint, ComparisonRow, DiversityRating, FundRecord, NavPoint,
};

pub const MIN_COMPARE: usize = 2;

pub fn comparison_row(fund: &FundRecord) -> ComparisonRow {
    ComparisonRow {
        id: fund.id.clone(),
        name: fund.name.clone(),
        category: fund.category.clone(),
        risk: fund.risk,
        nav: fund.nav,
        cagr_1y: fund.cagr_1y,
        cagr_3y: fund.cagr_3y,
        expense_ratio: fund.expense_ratio,
        std_dev: fund.std_dev,
        sharpe_ratio: fund.sharpe_ratio,
        alpha: fund.alpha,
        benchmark: fund.benchmark.clone(),
        manager: fund.manager.name.clone(),
        aum: fund.aum.clone(),
        age: fund.age.clone(),
        exit_load: fund.exit_load.clone(),
        sectors: fund.sectors.clone(),
        holdings: fund.holdings.iter().map(|h| h.name.clone()).collect(),
    }
}

/// Daily log returns; non-positive prices break the chain and yield 0.
pub fn log_returns(history: &[NavPoint]) -> Vec<f64> {
    history
        .windows(2)
        .map(|w| {
            if w[0].nav > 0.0 && w[1].nav > 0.0 {
                (w[1].nav / w[0].nav).ln()
            } else {
                0.0
            }
        })
        .collect()
}

/// Running sum of daily log returns, starting at 0 on the first date.
pub fn cumulative_log_returns(history: &[NavPoint]) -> Vec<NavPoint> {
    let mut total = 0.0;
    let mut out = Vec::with_capacity(history.len());
    if let Some(first) = history.first() {
        out.push(NavPoint {
            date: first.date,
            nav: 0.0,
        });
    }
    for (point, ret) in history.iter().skip(1).zip(log_returns(history)) {
        total += ret;
        out.push(NavPoint {
            date: point.date,
            nav: round_dp(total, 6),
        });
    }
    out
}

fn merge_by_date(funds: &[&FundRecord], series: &[Vec<NavPoint>]) -> Vec<ComparisonPoint> {
    let mut merged: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
    for (fund, points) in funds.iter().zip(series) {
        for point in points {
            merged
                .entry(point.date)
                .or_default()
                .insert(fund.name.clone(), point.nav);
        }
    }
    merged
        .into_iter()
        .map(|(date, values)| ComparisonPoint { date, values })
        .collect()
}

/// Pearson correlation over the common prefix of `a` and `b`.
///
/// Returns `None` when fewer than two samples overlap or either side has no
/// variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

/// 0-10 score where uncorrelated funds score high.
pub fn diversity_rating(average_correlation: f64) -> DiversityRating {
    let raw = ((1.0 - average_correlation) * 10.0).floor();
    let score = raw.clamp(0.0, 10.0) as u8;
    let message = if score >= 7 {
        "Excellent Diversity! These funds behave very differently."
    } else if score >= 4 {
        "Moderate Diversity. Some overlap in behavior."
    } else {
        "Low Diversity. These funds move very similarly."
    };
    DiversityRating {
        average_correlation: round_dp(average_correlation, 4),
        score,
        message: message.to_string(),
    }
}

/// Holding names present in every fund, sorted.
pub fn common_holdings(funds: &[&FundRecord]) -> Vec<String> {
    let mut sets = funds
        .iter()
        .map(|f| f.holdings.iter().map(|h| h.name.as_str()).collect::<BTreeSet<_>>());
    let Some(first) = sets.next() else {
        return Vec::new();
    };
    sets.fold(first, |acc, set| acc.intersection(&set).copied().collect())
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Average pairwise return correlation across all histories.
fn average_pairwise_correlation(histories: &[Vec<NavPoint>]) -> f64 {
    let returns: Vec<Vec<f64>> = histories.iter().map(|h| log_returns(h)).collect();
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..returns.len() {
        for j in (i + 1)..returns.len() {
            if let Some(rho) = pearson(&returns[i], &returns[j]) {
                sum += rho;
                pairs += 1;
            }
        }
    }
    if pairs == 0 { 1.0 } else { sum / pairs as f64 }
}

/// Side-by-side comparison of 2 to 4 funds over `days` of synthesized NAV.
pub fn compare<R: Rng + ?Sized>(
    funds: &[&FundRecord],
    days: usize,
    today: NaiveDate,
    rng: &mut R,
) -> CoreResult<Comparison> {
    if funds.len() < MIN_COMPARE {
        return Err(CoreError::SelectionTooSmall { min: MIN_COMPARE });
    }
    if funds.len() > COMPARE_LIMIT {
        return Err(CoreError::SelectionFull {
            limit: COMPARE_LIMIT,
        });
    }

    let histories: Vec<Vec<NavPoint>> = funds
        .iter()
        .map(|f| generate_history(f.nav, days, today, rng))
        .collect();

    let chart = merge_by_date(funds, &histories);
    let cumulative: Vec<Vec<NavPoint>> = histories
        .iter()
        .map(|h| cumulative_log_returns(h))
        .collect();
    let returns_chart = merge_by_date(funds, &cumulative);

    let diversity = diversity_rating(average_pairwise_correlation(&histories));
    tracing::debug!(
        funds = funds.len(),
        days,
        score = diversity.score,
        "built fund comparison"
    );

    Ok(Comparison {
        funds: funds.iter().map(|f| comparison_row(f)).collect(),
        chart,
        returns_chart,
        common_holdings: common_holdings(funds),
        diversity,
    })
}
