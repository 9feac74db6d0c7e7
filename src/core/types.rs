use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    #[serde(rename = "Moderately Low")]
    ModeratelyLow,
    Moderate,
    #[serde(rename = "Moderately High")]
    ModeratelyHigh,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskTier {
    pub const ALL: [RiskTier; 6] = [
        RiskTier::Low,
        RiskTier::ModeratelyLow,
        RiskTier::Moderate,
        RiskTier::ModeratelyHigh,
        RiskTier::High,
        RiskTier::VeryHigh,
    ];

    /// Zero-based position on the riskometer dial.
    pub fn level(self) -> usize {
        self as usize
    }

    /// Needle angle in degrees, -90 for `Low` through +90 for `VeryHigh`.
    pub fn needle_degrees(self) -> f64 {
        let steps = (Self::ALL.len() - 1) as f64;
        -90.0 + self.level() as f64 * (180.0 / steps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub name: String,
    pub sector: String,
    pub asset: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorWeight {
    pub name: String,
    pub asset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocation {
    pub equity: f64,
    pub debt: f64,
    pub others: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPerformance {
    pub period: String,
    pub amount: f64,
    pub scheme: f64,
    pub benchmark: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundManager {
    pub name: String,
    pub education: String,
    pub experience: String,
    pub schemes_count: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub amc: String,
    pub nav: f64,
    pub cagr_1y: f64,
    pub cagr_3y: f64,
    pub risk: RiskTier,
    pub expense_ratio: f64,
    pub std_dev: f64,
    pub sharpe_ratio: f64,
    pub alpha: f64,
    pub exit_load: String,
    pub entry_load: String,
    pub aum: String,
    pub nature: String,
    pub benchmark: String,
    pub inception_date: String,
    pub age: String,
    pub min_lumpsum: f64,
    pub min_sip: f64,
    pub options: String,
    pub manager: FundManager,
    pub holdings: Vec<Holding>,
    pub sectors: Vec<SectorWeight>,
    pub asset_allocation: AssetAllocation,
    #[serde(default)]
    pub lumpsum_performance: Vec<PeriodPerformance>,
    #[serde(default)]
    pub sip_performance: Vec<PeriodPerformance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TopUpFrequency {
    Yearly,
    #[serde(rename = "Half Yearly")]
    HalfYearly,
}

impl TopUpFrequency {
    pub fn interval_months(self) -> u32 {
        match self {
            TopUpFrequency::Yearly => 12,
            TopUpFrequency::HalfYearly => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopUpPlan {
    pub amount: f64,
    pub frequency: TopUpFrequency,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SipRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub contribution_day: u32,
    pub contribution_amount: f64,
    pub top_up: Option<TopUpPlan>,
}

/// One side of an installment: either the plain SIP or its top-up variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipLeg {
    pub amount: f64,
    pub units: f64,
    pub cumulative_units: f64,
    pub current_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipLedgerRow {
    pub sequence: u32,
    pub date: NaiveDate,
    pub nav: f64,
    pub regular: SipLeg,
    pub top_up: Option<SipLeg>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipTotals {
    pub total_amount: f64,
    pub total_units: f64,
    pub current_value: f64,
    pub profit: f64,
    pub returns: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipSummary {
    pub installments: u32,
    pub regular: SipTotals,
    pub top_up: Option<SipTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipReport {
    pub summary: SipSummary,
    pub ledger: Vec<SipLedgerRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub historical: Option<f64>,
    pub arima: Option<f64>,
    pub lstm: Option<f64>,
    #[serde(rename = "upperCI")]
    pub upper_ci: Option<f64>,
    #[serde(rename = "lowerCI")]
    pub lower_ci: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityPoint {
    pub date: NaiveDate,
    pub realized: f64,
    pub garch_forecast: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationCell {
    pub x: String,
    pub y: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingCorrelationPoint {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskContribution {
    pub name: String,
    pub contribution: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorExposure {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub expected_return: f64,
    pub expected_vol: f64,
    pub sharpe: f64,
    pub diversification_score: f64,
    pub var_95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub nav_forecast: Vec<ForecastPoint>,
    pub volatility: Vec<VolatilityPoint>,
    pub correlation_matrix: Vec<CorrelationCell>,
    pub rolling_correlation: Vec<RollingCorrelationPoint>,
    pub risk_decomposition: Vec<RiskContribution>,
    pub sector_exposure: Vec<SectorExposure>,
    pub kpis: DashboardKpis,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentMode {
    Sip,
    Lumpsum,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub nav: f64,
    pub invested: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthReport {
    pub mode: InvestmentMode,
    pub total_invested: f64,
    pub current_value: f64,
    pub absolute_return: f64,
    pub is_profit: bool,
    pub points: Vec<GrowthPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub risk: RiskTier,
    pub nav: f64,
    pub cagr_1y: f64,
    pub cagr_3y: f64,
    pub expense_ratio: f64,
    pub std_dev: f64,
    pub sharpe_ratio: f64,
    pub alpha: f64,
    pub benchmark: String,
    pub manager: String,
    pub aum: String,
    pub age: String,
    pub exit_load: String,
    pub sectors: Vec<SectorWeight>,
    pub holdings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityRating {
    pub average_correlation: f64,
    pub score: u8,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub funds: Vec<ComparisonRow>,
    pub chart: Vec<ComparisonPoint>,
    /// Cumulative daily log return per fund, on the same dates as `chart`.
    pub returns_chart: Vec<ComparisonPoint>,
    pub common_holdings: Vec<String>,
    pub diversity: DiversityRating,
}
