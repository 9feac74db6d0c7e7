use chrono::NaiveDate;
use rand::Rng;

use super::catalog::FundCatalog;
use super::synth::{
    correlation_cells, correlation_values, forecast, mean_off_diagonal, risk_decomposition,
    rolling_correlation, round_dp, sector_exposure, short_label, volatility,
};
use super::types::{DashboardData, DashboardKpis, FundRecord};

pub const DEFAULT_HORIZON: u32 = 90;
pub const RISK_FREE_RATE: f64 = 6.5;
const VAR_95_Z: f64 = 1.645;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Assembles every dashboard panel for the basket `ids`.
///
/// Ids that do not resolve are skipped, but still count toward the basket size
/// used to average sector exposure.
pub fn build_dashboard<R: Rng + ?Sized>(
    catalog: &FundCatalog,
    ids: &[String],
    horizon: u32,
    today: NaiveDate,
    rng: &mut R,
) -> DashboardData {
    let funds: Vec<&FundRecord> = ids
        .iter()
        .filter_map(|id| {
            let fund = catalog.get(id);
            if fund.is_none() {
                tracing::warn!(%id, "basket id not in catalog, skipping");
            }
            fund
        })
        .collect();

    let labels: Vec<String> = funds.iter().map(|f| short_label(&f.name)).collect();
    let names: Vec<String> = funds.iter().map(|f| f.name.clone()).collect();

    let nav_forecast = forecast(today, horizon, rng);
    let volatility = volatility(today, horizon, rng);
    let correlation = correlation_values(labels.len(), rng);
    let correlation_matrix = correlation_cells(&labels, &correlation);
    let rolling_correlation = rolling_correlation(today, &labels, rng);
    let risk_decomposition = risk_decomposition(&names, rng);
    let sector_exposure = sector_exposure(&funds, ids.len());
    let kpis = basket_kpis(&funds, &correlation);

    tracing::debug!(
        requested = ids.len(),
        resolved = funds.len(),
        horizon,
        "assembled dashboard"
    );

    DashboardData {
        nav_forecast,
        volatility,
        correlation_matrix,
        rolling_correlation,
        risk_decomposition,
        sector_exposure,
        kpis,
    }
}

/// Equal-weight portfolio standard deviation.
pub fn portfolio_volatility(std_devs: &[f64], correlation: &[Vec<f64>]) -> f64 {
    let n = std_devs.len();
    if n == 0 {
        return 0.0;
    }
    let weight = 1.0 / n as f64;
    let mut variance = 0.0;
    for (i, si) in std_devs.iter().enumerate() {
        for (j, sj) in std_devs.iter().enumerate() {
            let rho = correlation
                .get(i)
                .and_then(|row| row.get(j))
                .copied()
                .unwrap_or(if i == j { 1.0 } else { 0.0 });
            variance += weight * weight * si * sj * rho;
        }
    }
    variance.max(0.0).sqrt()
}

pub fn basket_kpis(funds: &[&FundRecord], correlation: &[Vec<f64>]) -> DashboardKpis {
    if funds.is_empty() {
        return DashboardKpis {
            expected_return: 0.0,
            expected_vol: 0.0,
            sharpe: 0.0,
            diversification_score: 0.0,
            var_95: 0.0,
        };
    }

    let expected_return = funds.iter().map(|f| f.cagr_3y).sum::<f64>() / funds.len() as f64;
    let std_devs: Vec<f64> = funds.iter().map(|f| f.std_dev).collect();
    let vol = portfolio_volatility(&std_devs, correlation);
    let sharpe = if vol > 0.0 {
        (expected_return - RISK_FREE_RATE) / vol
    } else {
        0.0
    };
    let diversification = mean_off_diagonal(correlation).map_or(0.0, |mean| 1.0 - mean);

    DashboardKpis {
        expected_return: round_dp(expected_return, 2),
        expected_vol: round_dp(vol, 2),
        sharpe: round_dp(sharpe, 2),
        diversification_score: round_dp(diversification, 2),
        var_95: round_dp(VAR_95_Z * vol / MONTHS_PER_YEAR.sqrt(), 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "actual={actual} expected={expected}"
        );
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date")
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn portfolio_volatility_matches_closed_form() {
        // Two funds, sigma 10 and 20, rho 0.5: var = 0.25 * (100 + 400 + 2 * 100).
        let vol = portfolio_volatility(&[10.0, 20.0], &[vec![1.0, 0.5], vec![0.5, 1.0]]);
        assert_approx(vol, 175f64.sqrt());
        assert_approx(portfolio_volatility(&[12.0], &[vec![1.0]]), 12.0);
        assert_approx(portfolio_volatility(&[], &[]), 0.0);
    }

    #[test]
    fn single_fund_kpis() {
        let catalog = FundCatalog::builtin();
        let fund = catalog.resolve("1");
        let kpis = basket_kpis(&[fund], &[vec![1.0]]);

        assert_approx(kpis.expected_return, round_dp(fund.cagr_3y, 2));
        assert_approx(kpis.expected_vol, round_dp(fund.std_dev, 2));
        assert_approx(kpis.diversification_score, 0.0);
        assert_approx(
            kpis.var_95,
            round_dp(1.645 * fund.std_dev / 12f64.sqrt(), 2),
        );
    }

    #[test]
    fn dashboard_skips_unknown_ids() {
        let catalog = FundCatalog::builtin();
        let mut rng = StdRng::seed_from_u64(21);
        let data = build_dashboard(&catalog, &ids(&["1", "missing", "3"]), 30, today(), &mut rng);

        assert_eq!(data.nav_forecast.len(), 90 + 30);
        assert_eq!(data.volatility.len(), 60 + 30);
        assert_eq!(data.correlation_matrix.len(), 4);
        assert_eq!(data.risk_decomposition.len(), 2);
        assert!(data.rolling_correlation.iter().all(|p| p.values.len() == 2));
        assert!(data.rolling_correlation[0].values.contains_key("Bluechip"));
        assert!(
            data.sector_exposure
                .windows(2)
                .all(|w| w[0].value >= w[1].value)
        );
    }

    #[test]
    fn empty_basket_yields_empty_panels() {
        let catalog = FundCatalog::builtin();
        let mut rng = StdRng::seed_from_u64(0);
        let data = build_dashboard(&catalog, &[], 10, today(), &mut rng);

        assert!(data.correlation_matrix.is_empty());
        assert!(data.risk_decomposition.is_empty());
        assert!(data.sector_exposure.is_empty());
        assert_approx(data.kpis.expected_vol, 0.0);
        assert_eq!(data.nav_forecast.len(), 100);
    }

    #[test]
    fn seeded_dashboards_are_identical() {
        let catalog = FundCatalog::builtin();
        let basket = ids(&["1", "2", "3"]);
        let a = build_dashboard(&catalog, &basket, 45, today(), &mut StdRng::seed_from_u64(8));
        let b = build_dashboard(&catalog, &basket, 45, today(), &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_diversification_between_zero_and_one(seed in 0u64..10_000, size in 1usize..=3) {
            let catalog = FundCatalog::builtin();
            let basket: Vec<String> = catalog
                .funds()
                .iter()
                .take(size)
                .map(|f| f.id.clone())
                .collect();
            let mut rng = StdRng::seed_from_u64(seed);
            let data = build_dashboard(&catalog, &basket, 5, today(), &mut rng);

            prop_assert_eq!(data.correlation_matrix.len(), size * size);
            prop_assert!(data.kpis.diversification_score >= 0.0);
            prop_assert!(data.kpis.diversification_score <= 1.0);
            prop_assert!(data.kpis.expected_vol >= 0.0);
            let max_sigma = catalog.funds().iter().map(|f| f.std_dev).fold(0.0, f64::max);
            prop_assert!(data.kpis.expected_vol <= max_sigma + 0.01);
        }
    }
}
