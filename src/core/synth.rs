//! Mock time-series generators behind the fund views and the dashboard.
//!
//! Every generator takes the random source and the reference date from the
//! caller, so a seeded RNG reproduces a series exactly.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rand::Rng;

use super::types::{
    CorrelationCell, ForecastPoint, FundRecord, NavPoint, RiskContribution,
    RollingCorrelationPoint, SectorExposure, VolatilityPoint,
};

const DAILY_DRIFT: f64 = 0.0005;
const DAILY_SPREAD: f64 = 0.01;

const BENCHMARK_START_RATIO: f64 = 0.95;

const FORECAST_HISTORY_POINTS: u64 = 90;
const FORECAST_BASE_VALUE: f64 = 100.0;
const CI_START_WIDTH: f64 = 2.0;
const CI_WIDENING: f64 = 0.15;

const VOL_HISTORY_POINTS: u64 = 60;
const VOL_START: f64 = 12.0;
const VOL_REALIZED_TARGET: f64 = 15.0;
const VOL_REALIZED_PERSISTENCE: f64 = 0.9;
const VOL_NOISE: f64 = 2.0;
const VOL_FLOOR: f64 = 5.0;
const VOL_FORECAST_TARGET: f64 = 14.0;
const VOL_FORECAST_PERSISTENCE: f64 = 0.95;

const ROLLING_POINTS: u64 = 30;
const ROLLING_STEP_DAYS: u64 = 5;

pub(crate) fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Reconstructs `num_days` of daily NAV ending at `current_value` on `today`.
///
/// The walk runs backwards from today, dividing by `1 + r` at each step, so the
/// final (most recent) point is exactly `current_value` rounded to 2 places.
pub fn generate_history<R: Rng + ?Sized>(
    current_value: f64,
    num_days: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<NavPoint> {
    let mut points = Vec::with_capacity(num_days);
    let mut nav = current_value;

    for offset in 0..num_days {
        let Some(date) = today.checked_sub_days(Days::new(offset as u64)) else {
            break;
        };
        points.push(NavPoint {
            date,
            nav: round_dp(nav, 2),
        });
        let daily_return = DAILY_DRIFT + rng.random_range(-DAILY_SPREAD..DAILY_SPREAD);
        nav /= 1.0 + daily_return;
    }

    points.reverse();
    points
}

/// Benchmark line plotted next to a fund's NAV history.
pub fn benchmark_series<R: Rng + ?Sized>(history: &[NavPoint], rng: &mut R) -> Vec<NavPoint> {
    let Some(first) = history.first() else {
        return Vec::new();
    };

    let mut value = first.nav * BENCHMARK_START_RATIO;
    history
        .iter()
        .map(|point| {
            value *= 1.0 + rng.random_range(-0.009..0.011);
            NavPoint {
                date: point.date,
                nav: round_dp(value, 2),
            }
        })
        .collect()
}

/// Ninety days of index history followed by `horizon` days of two diverging
/// model branches and a widening confidence band around the first branch.
pub fn forecast<R: Rng + ?Sized>(
    today: NaiveDate,
    horizon: u32,
    rng: &mut R,
) -> Vec<ForecastPoint> {
    let mut points = Vec::with_capacity(FORECAST_HISTORY_POINTS as usize + horizon as usize);
    let mut last = FORECAST_BASE_VALUE;

    for back in (1..=FORECAST_HISTORY_POINTS).rev() {
        let Some(date) = today.checked_sub_days(Days::new(back)) else {
            continue;
        };
        last *= 1.0 + rng.random_range(-0.008..0.012);
        points.push(ForecastPoint {
            date,
            historical: Some(round_dp(last, 2)),
            arima: None,
            lstm: None,
            upper_ci: None,
            lower_ci: None,
        });
    }

    let mut arima = last;
    let mut lstm = last;
    let mut ci_width = CI_START_WIDTH;
    for ahead in 1..=u64::from(horizon) {
        let Some(date) = today.checked_add_days(Days::new(ahead)) else {
            break;
        };
        arima *= 1.0005 + rng.random_range(-0.0025..0.0025);
        lstm *= 1.0008 + rng.random_range(-0.004..0.006);
        ci_width += CI_WIDENING;

        points.push(ForecastPoint {
            date,
            historical: None,
            arima: Some(round_dp(arima, 2)),
            lstm: Some(round_dp(lstm, 2)),
            upper_ci: Some(round_dp(arima + ci_width, 2)),
            lower_ci: Some(round_dp(arima - ci_width, 2)),
        });
    }

    points
}

/// Realized volatility as a noisy AR(1) around 15, then a noise-free forecast
/// decaying toward 14.
pub fn volatility<R: Rng + ?Sized>(
    today: NaiveDate,
    horizon: u32,
    rng: &mut R,
) -> Vec<VolatilityPoint> {
    let mut points = Vec::with_capacity(VOL_HISTORY_POINTS as usize + horizon as usize);
    let mut vol = VOL_START;

    for back in (1..=VOL_HISTORY_POINTS).rev() {
        let Some(date) = today.checked_sub_days(Days::new(back)) else {
            continue;
        };
        vol = vol * VOL_REALIZED_PERSISTENCE
            + VOL_REALIZED_TARGET * (1.0 - VOL_REALIZED_PERSISTENCE)
            + rng.random_range(-VOL_NOISE..VOL_NOISE);
        points.push(VolatilityPoint {
            date,
            realized: round_dp(vol.max(VOL_FLOOR), 2),
            garch_forecast: None,
        });
    }

    let mut garch = vol;
    for ahead in 1..=u64::from(horizon) {
        let Some(date) = today.checked_add_days(Days::new(ahead)) else {
            break;
        };
        garch = garch * VOL_FORECAST_PERSISTENCE
            + VOL_FORECAST_TARGET * (1.0 - VOL_FORECAST_PERSISTENCE);
        points.push(VolatilityPoint {
            date,
            realized: 0.0,
            garch_forecast: Some(round_dp(garch, 2)),
        });
    }

    points
}

/// Symmetric `n x n` matrix with a unit diagonal and off-diagonal entries drawn
/// from `[0.1, 0.9)`.
pub fn correlation_values<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Vec<f64>> {
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let v = round_dp(rng.random_range(0.1..0.9), 2);
            values[i][j] = v;
            values[j][i] = v;
        }
    }
    values
}

/// Flattens a correlation matrix into heatmap cells, row by row.
pub fn correlation_cells(labels: &[String], values: &[Vec<f64>]) -> Vec<CorrelationCell> {
    let mut cells = Vec::with_capacity(labels.len() * labels.len());
    for (i, row_label) in labels.iter().enumerate() {
        for (j, col_label) in labels.iter().enumerate() {
            let value = values
                .get(i)
                .and_then(|row| row.get(j))
                .copied()
                .unwrap_or(if i == j { 1.0 } else { 0.0 });
            cells.push(CorrelationCell {
                x: row_label.clone(),
                y: col_label.clone(),
                value,
            });
        }
    }
    cells
}

pub fn correlation_matrix<R: Rng + ?Sized>(labels: &[String], rng: &mut R) -> Vec<CorrelationCell> {
    let values = correlation_values(labels.len(), rng);
    correlation_cells(labels, &values)
}

/// Mean of the strictly-upper triangle; `None` for fewer than two series.
pub fn mean_off_diagonal(values: &[Vec<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (i, row) in values.iter().enumerate() {
        for v in row.iter().skip(i + 1) {
            sum += v;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f64)
}

pub fn rolling_correlation<R: Rng + ?Sized>(
    today: NaiveDate,
    labels: &[String],
    rng: &mut R,
) -> Vec<RollingCorrelationPoint> {
    let mut points = Vec::with_capacity(ROLLING_POINTS as usize);
    for step in (1..=ROLLING_POINTS).rev() {
        let Some(date) = today.checked_sub_days(Days::new(step * ROLLING_STEP_DAYS)) else {
            continue;
        };
        let values: BTreeMap<String, f64> = labels
            .iter()
            .map(|label| (label.clone(), round_dp(rng.random_range(0.5..0.9), 2)))
            .collect();
        points.push(RollingCorrelationPoint { date, values });
    }
    points
}

pub fn risk_decomposition<R: Rng + ?Sized>(
    names: &[String],
    rng: &mut R,
) -> Vec<RiskContribution> {
    if names.is_empty() {
        return Vec::new();
    }
    let weight = (100.0 / names.len() as f64).round();
    names
        .iter()
        .map(|name| RiskContribution {
            name: name.clone(),
            weight,
            contribution: round_dp(rng.random_range(10.0..40.0), 1),
        })
        .collect()
}

/// Average sector weight across the basket, largest first.
///
/// Weights are summed per sector and divided by `basket_size`, which may be
/// larger than `funds.len()` when some basket ids did not resolve.
pub fn sector_exposure(funds: &[&FundRecord], basket_size: usize) -> Vec<SectorExposure> {
    if basket_size == 0 {
        return Vec::new();
    }

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for fund in funds {
        for sector in &fund.sectors {
            *totals.entry(sector.name.as_str()).or_insert(0.0) += sector.asset;
        }
    }

    let mut exposure: Vec<SectorExposure> = totals
        .into_iter()
        .map(|(name, total)| SectorExposure {
            name: name.to_string(),
            value: round_dp(total / basket_size as f64, 1),
        })
        .collect();
    exposure.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    exposure
}

/// Short chart label: the second word of a fund name, else its first 4 chars.
pub fn short_label(name: &str) -> String {
    name.split(' ')
        .nth(1)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| name.chars().take(4).collect())
}
