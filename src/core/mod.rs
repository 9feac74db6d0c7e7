mod catalog;
mod compare;
mod dashboard;
mod error;
mod growth;
mod selection;
mod sip;
mod synth;
mod types;

pub use catalog::{ALL_CATEGORIES, FundCatalog};
pub use compare::{
    MIN_COMPARE, common_holdings, compare, cumulative_log_returns, diversity_rating, log_returns,
    pearson,
};
pub use dashboard::{
    DEFAULT_HORIZON, RISK_FREE_RATE, basket_kpis, build_dashboard, portfolio_volatility,
};
pub use error::{CoreError, CoreResult};
pub use growth::{format_inr, simulate_growth};
pub use selection::{BASKET_LIMIT, COMPARE_LIMIT, Selection};
pub use sip::{
    MAX_CONTRIBUTION_DAY, MIN_CONTRIBUTION_DAY, clamped_date, days_in_month, installment_dates,
    percent_return, project,
};
pub use synth::{
    benchmark_series, correlation_matrix, forecast, generate_history, risk_decomposition,
    rolling_correlation, sector_exposure, short_label, volatility,
};
pub use types::{
    AssetAllocation, Comparison, ComparisonPoint, ComparisonRow, CorrelationCell, DashboardData,
    DashboardKpis, DiversityRating, ForecastPoint, FundManager, FundRecord, GrowthPoint,
    GrowthReport, Holding, InvestmentMode, NavPoint, PeriodPerformance, RiskContribution,
    RiskTier, RollingCorrelationPoint, SectorExposure, SectorWeight, SipLedgerRow, SipLeg,
    SipReport, SipRequest, SipSummary, SipTotals, TopUpFrequency, TopUpPlan, VolatilityPoint,
};
