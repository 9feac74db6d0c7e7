use axum::{
    Router,
    extract::{
        Json, Path, Query, Request, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    BASKET_LIMIT, COMPARE_LIMIT, Comparison, CoreError, DEFAULT_HORIZON, DashboardData,
    FundCatalog, FundRecord, GrowthReport, InvestmentMode, NavPoint, RiskTier, Selection,
    SipReport, SipRequest, TopUpFrequency, TopUpPlan, benchmark_series, build_dashboard, compare,
    generate_history, project, simulate_growth,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DETAIL_HISTORY_DAYS: usize = 90;
const DEFAULT_COMPARE_DAYS: usize = 365;
const MAX_HISTORY_DAYS: usize = 3650;
const MAX_HORIZON: u32 = 365;
const MAX_GROWTH_YEARS: u32 = (MAX_HISTORY_DAYS / 365) as u32;

/// Longest SIP window accepted, in monthly installments (100 years).
pub const MAX_SIP_INSTALLMENTS: i64 = 1200;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliTopUpFrequency {
    Yearly,
    HalfYearly,
}

impl From<CliTopUpFrequency> for TopUpFrequency {
    fn from(value: CliTopUpFrequency) -> Self {
        match value {
            CliTopUpFrequency::Yearly => TopUpFrequency::Yearly,
            CliTopUpFrequency::HalfYearly => TopUpFrequency::HalfYearly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
enum ApiTopUpFrequency {
    #[serde(alias = "yearly", alias = "YEARLY")]
    Yearly,
    #[serde(
        rename = "Half Yearly",
        alias = "HalfYearly",
        alias = "halfYearly",
        alias = "half-yearly",
        alias = "half_yearly"
    )]
    HalfYearly,
}

impl From<ApiTopUpFrequency> for CliTopUpFrequency {
    fn from(value: ApiTopUpFrequency) -> Self {
        match value {
            ApiTopUpFrequency::Yearly => CliTopUpFrequency::Yearly,
            ApiTopUpFrequency::HalfYearly => CliTopUpFrequency::HalfYearly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiInvestmentMode {
    #[serde(alias = "SIP")]
    Sip,
    #[serde(alias = "lump-sum", alias = "lumpSum", alias = "lump_sum")]
    Lumpsum,
}

impl From<ApiInvestmentMode> for InvestmentMode {
    fn from(value: ApiInvestmentMode) -> Self {
        match value {
            ApiInvestmentMode::Sip => InvestmentMode::Sip,
            ApiInvestmentMode::Lumpsum => InvestmentMode::Lumpsum,
        }
    }
}

/// A number sent either as a JSON number or as text.
///
/// Text that does not parse to a finite number reads as 0.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    fn value(&self) -> f64 {
        let raw = match self {
            LenientNumber::Number(v) => *v,
            LenientNumber::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if raw.is_finite() { raw } else { 0.0 }
    }

    fn as_count(&self) -> usize {
        self.value().max(0.0) as usize
    }

    fn as_u32(&self) -> u32 {
        self.value().clamp(0.0, f64::from(u32::MAX)) as u32
    }
}

/// Fund ids as a JSON array or a comma-separated string (for query strings).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum IdList {
    Many(Vec<String>),
    Joined(String),
}

impl IdList {
    fn into_ids(self) -> Vec<String> {
        match self {
            IdList::Many(ids) => ids
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            IdList::Joined(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FundsQuery {
    q: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DetailQuery {
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipReportPayload {
    fund_id: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
    sip_day: Option<LenientNumber>,
    amount: Option<LenientNumber>,
    enable_top_up: Option<bool>,
    top_up_amount: Option<LenientNumber>,
    top_up_frequency: Option<ApiTopUpFrequency>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    ids: Option<IdList>,
    days: Option<LenientNumber>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DashboardPayload {
    basket: Option<IdList>,
    horizon: Option<LenientNumber>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GrowthPayload {
    fund_id: Option<String>,
    mode: Option<ApiInvestmentMode>,
    amount: Option<LenientNumber>,
    years: Option<LenientNumber>,
    history_days: Option<LenientNumber>,
    seed: Option<u64>,
}

/// SIP projection inputs shared by the `sip` subcommand and `/api/sip-report`.
#[derive(Args, Debug, Clone)]
pub struct SipArgs {
    #[arg(long, default_value = "1", help = "Fund id; unknown ids use the first fund")]
    pub fund: String,
    #[arg(long, help = "Start of the SIP window, YYYY-MM-DD")]
    pub from: NaiveDate,
    #[arg(long, help = "End of the SIP window, YYYY-MM-DD")]
    pub to: NaiveDate,
    #[arg(
        long,
        default_value_t = 10,
        help = "Day of month for each installment (1-31, clamped to month end)"
    )]
    pub day: u32,
    #[arg(long, default_value_t = 10000.0, help = "Monthly contribution")]
    pub amount: f64,
    #[arg(long, help = "Enables a top-up SIP stepping up by this amount")]
    pub top_up_amount: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliTopUpFrequency::Yearly)]
    pub top_up_frequency: CliTopUpFrequency,
    #[arg(long, help = "Seed for a reproducible NAV path")]
    pub seed: Option<u64>,
}

#[derive(Debug)]
struct SipApiRequest {
    fund_id: String,
    request: SipRequest,
    seed: Option<u64>,
}

#[derive(Debug)]
struct CompareRequest {
    ids: Vec<String>,
    days: usize,
    seed: Option<u64>,
}

#[derive(Debug)]
struct DashboardRequest {
    basket: Vec<String>,
    horizon: u32,
    seed: Option<u64>,
}

#[derive(Debug)]
struct GrowthRequest {
    fund_id: String,
    mode: InvestmentMode,
    amount: f64,
    years: u32,
    history_days: usize,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundsResponse<'a> {
    categories: Vec<String>,
    funds: Vec<&'a FundRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Riskometer {
    tier: RiskTier,
    level: usize,
    needle_degrees: f64,
    tiers: [RiskTier; 6],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundDetailResponse<'a> {
    fund: &'a FundRecord,
    riskometer: Riskometer,
    history: Vec<NavPoint>,
    benchmark: Vec<NavPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SipReportResponse<'a> {
    fund_id: &'a str,
    fund_name: &'a str,
    #[serde(flatten)]
    report: SipReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    basket: Vec<String>,
    #[serde(flatten)]
    data: DashboardData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrowthResponse<'a> {
    fund_id: &'a str,
    fund_name: &'a str,
    #[serde(flatten)]
    report: GrowthReport,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match err {
            CoreError::UnknownFund(_) => StatusCode::NOT_FOUND,
            CoreError::CatalogIo(_) | CoreError::CatalogFormat(_) | CoreError::EmptyCatalog => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = self.status.as_u16(), error = %self.message, "rejected request");
        error_response(self.status, &self.message)
    }
}

#[derive(Clone)]
struct AppState {
    catalog: Arc<FundCatalog>,
}

pub fn build_sip_request(args: &SipArgs) -> Result<SipRequest, String> {
    if !args.amount.is_finite() {
        return Err("amount must be a finite number".to_string());
    }
    let months = i64::from(args.to.year() - args.from.year()) * 12
        + i64::from(args.to.month())
        - i64::from(args.from.month());
    if months >= MAX_SIP_INSTALLMENTS {
        return Err(format!(
            "SIP window must cover at most {MAX_SIP_INSTALLMENTS} monthly installments"
        ));
    }
    let top_up = match args.top_up_amount {
        Some(amount) if !amount.is_finite() || amount < 0.0 => {
            return Err("top-up amount must be >= 0".to_string());
        }
        Some(amount) => Some(TopUpPlan {
            amount,
            frequency: args.top_up_frequency.into(),
        }),
        None => None,
    };

    Ok(SipRequest {
        start_date: args.from,
        end_date: args.to,
        contribution_day: args.day,
        contribution_amount: args.amount,
        top_up,
    })
}

pub fn default_sip_args() -> SipArgs {
    SipArgs {
        fund: "1".to_string(),
        from: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        to: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or_default(),
        day: 10,
        amount: 10_000.0,
        top_up_amount: None,
        top_up_frequency: CliTopUpFrequency::Yearly,
        seed: None,
    }
}

/// Per-request random source; a seed makes the response reproducible.
pub fn request_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn router(catalog: Arc<FundCatalog>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/funds", get(funds_handler))
        .route("/api/funds/:id", get(fund_detail_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route(
            "/api/sip-report",
            get(sip_report_get_handler).post(sip_report_post_handler),
        )
        .route(
            "/api/dashboard",
            get(dashboard_get_handler).post(dashboard_post_handler),
        )
        .route("/api/growth", post(growth_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn(log_request))
        .with_state(AppState { catalog })
}

pub async fn run_http_server(port: u16, catalog: FundCatalog) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let funds = catalog.len();
    let app = router(Arc::new(catalog));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, funds, "RAPS Wealth HTTP API listening");
    tracing::info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "handled request");
    response
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn funds_handler(
    State(state): State<AppState>,
    query: Result<Query<FundsQuery>, QueryRejection>,
) -> Response {
    respond(
        query
            .map_err(ApiError::from)
            .map(|Query(query)| build_funds_response(&state.catalog, &query)),
    )
}

async fn fund_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Response {
    respond(query.map_err(ApiError::from).map(|Query(query)| {
        let mut rng = request_rng(query.seed);
        build_fund_detail_response(&state.catalog, &id, today(), &mut rng)
    }))
}

async fn compare_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<ComparePayload>, QueryRejection>,
) -> Response {
    respond(
        payload
            .map_err(ApiError::from)
            .and_then(|Query(payload)| compare_handler_impl(&state.catalog, payload)),
    )
}

async fn compare_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComparePayload>, JsonRejection>,
) -> Response {
    respond(
        payload
            .map_err(ApiError::from)
            .and_then(|Json(payload)| compare_handler_impl(&state.catalog, payload)),
    )
}

async fn sip_report_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<SipReportPayload>, QueryRejection>,
) -> Response {
    respond(
        payload
            .map_err(ApiError::from)
            .and_then(|Query(payload)| sip_report_handler_impl(&state.catalog, payload)),
    )
}

async fn sip_report_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<SipReportPayload>, JsonRejection>,
) -> Response {
    respond(
        payload
            .map_err(ApiError::from)
            .and_then(|Json(payload)| sip_report_handler_impl(&state.catalog, payload)),
    )
}

async fn dashboard_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<DashboardPayload>, QueryRejection>,
) -> Response {
    respond(
        payload
            .map_err(ApiError::from)
            .and_then(|Query(payload)| dashboard_handler_impl(&state.catalog, payload)),
    )
}

async fn dashboard_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<DashboardPayload>, JsonRejection>,
) -> Response {
    respond(
        payload
            .map_err(ApiError::from)
            .and_then(|Json(payload)| dashboard_handler_impl(&state.catalog, payload)),
    )
}

async fn growth_handler(
    State(state): State<AppState>,
    payload: Result<Json<GrowthPayload>, JsonRejection>,
) -> Response {
    respond(
        payload
            .map_err(ApiError::from)
            .and_then(|Json(payload)| growth_handler_impl(&state.catalog, payload)),
    )
}

fn respond<T: Serialize>(result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    }
}

fn compare_handler_impl(
    catalog: &FundCatalog,
    payload: ComparePayload,
) -> Result<Comparison, ApiError> {
    let request = compare_request_from_payload(payload).map_err(ApiError::bad_request)?;
    let funds = request
        .ids
        .iter()
        .map(|id| catalog.require(id))
        .collect::<Result<Vec<_>, _>>()?;
    let mut rng = request_rng(request.seed);
    Ok(compare(&funds, request.days, today(), &mut rng)?)
}

fn sip_report_handler_impl(
    catalog: &FundCatalog,
    payload: SipReportPayload,
) -> Result<SipReportResponse<'_>, ApiError> {
    let request = sip_request_from_payload(payload).map_err(ApiError::bad_request)?;
    Ok(build_sip_report_response(catalog, &request))
}

fn dashboard_handler_impl(
    catalog: &FundCatalog,
    payload: DashboardPayload,
) -> Result<DashboardResponse, ApiError> {
    let request = dashboard_request_from_payload(payload).map_err(ApiError::bad_request)?;
    let mut rng = request_rng(request.seed);
    let data = build_dashboard(catalog, &request.basket, request.horizon, today(), &mut rng);
    Ok(DashboardResponse {
        basket: request.basket,
        data,
    })
}

fn growth_handler_impl(
    catalog: &FundCatalog,
    payload: GrowthPayload,
) -> Result<GrowthResponse<'_>, ApiError> {
    let request = growth_request_from_payload(payload).map_err(ApiError::bad_request)?;
    build_growth_response(catalog, &request, today())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{field} must be a YYYY-MM-DD date, got {raw:?}"))
}

fn build_funds_response<'a>(catalog: &'a FundCatalog, query: &FundsQuery) -> FundsResponse<'a> {
    FundsResponse {
        categories: catalog.categories(),
        funds: catalog.filter(
            query.q.as_deref().unwrap_or_default(),
            query.category.as_deref().unwrap_or_default(),
        ),
    }
}

fn build_fund_detail_response<'a>(
    catalog: &'a FundCatalog,
    id: &str,
    today: NaiveDate,
    rng: &mut StdRng,
) -> FundDetailResponse<'a> {
    let fund = catalog.resolve(id);
    let history = generate_history(fund.nav, DETAIL_HISTORY_DAYS, today, rng);
    let benchmark = benchmark_series(&history, rng);
    FundDetailResponse {
        fund,
        riskometer: Riskometer {
            tier: fund.risk,
            level: fund.risk.level(),
            needle_degrees: fund.risk.needle_degrees(),
            tiers: RiskTier::ALL,
        },
        history,
        benchmark,
    }
}

fn build_sip_report_response<'a>(
    catalog: &'a FundCatalog,
    request: &SipApiRequest,
) -> SipReportResponse<'a> {
    let fund = catalog.resolve(&request.fund_id);
    let mut rng = request_rng(request.seed);
    SipReportResponse {
        fund_id: &fund.id,
        fund_name: &fund.name,
        report: project(fund, &request.request, &mut rng),
    }
}

fn build_growth_response<'a>(
    catalog: &'a FundCatalog,
    request: &GrowthRequest,
    today: NaiveDate,
) -> Result<GrowthResponse<'a>, ApiError> {
    let fund = catalog.require(&request.fund_id)?;
    let mut rng = request_rng(request.seed);
    let history = generate_history(fund.nav, request.history_days, today, &mut rng);
    let report = simulate_growth(&history, request.mode, request.amount, request.years)?;
    Ok(GrowthResponse {
        fund_id: &fund.id,
        fund_name: &fund.name,
        report,
    })
}

#[cfg(test)]
fn sip_request_from_json(json: &str) -> Result<SipApiRequest, String> {
    let payload = serde_json::from_str::<SipReportPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    sip_request_from_payload(payload)
}

fn sip_request_from_payload(payload: SipReportPayload) -> Result<SipApiRequest, String> {
    let mut args = default_sip_args();

    if let Some(v) = payload.fund_id {
        args.fund = v;
    }
    if let Some(v) = payload.from_date {
        args.from = parse_date("fromDate", &v)?;
    }
    if let Some(v) = payload.to_date {
        args.to = parse_date("toDate", &v)?;
    }
    if let Some(v) = payload.sip_day {
        args.day = v.as_u32();
    }
    if let Some(v) = payload.amount {
        args.amount = v.value();
    }
    if let Some(v) = payload.top_up_frequency {
        args.top_up_frequency = v.into();
    }
    if payload.enable_top_up.unwrap_or(false) {
        args.top_up_amount = Some(
            payload
                .top_up_amount
                .map(|v| v.value())
                .unwrap_or(1_000.0),
        );
    }
    args.seed = payload.seed;

    let request = build_sip_request(&args)?;
    Ok(SipApiRequest {
        fund_id: args.fund,
        request,
        seed: args.seed,
    })
}

fn compare_request_from_payload(payload: ComparePayload) -> Result<CompareRequest, String> {
    let ids = payload.ids.map(IdList::into_ids).unwrap_or_default();
    let selection = Selection::from_ids(COMPARE_LIMIT, &ids).map_err(|e| e.to_string())?;
    selection.require_at_least(2).map_err(|e| e.to_string())?;

    let days = payload
        .days
        .map(|v| v.as_count())
        .unwrap_or(DEFAULT_COMPARE_DAYS);
    if days > MAX_HISTORY_DAYS {
        return Err(format!("days must be <= {MAX_HISTORY_DAYS}"));
    }

    Ok(CompareRequest {
        ids: selection.ids().to_vec(),
        days,
        seed: payload.seed,
    })
}

fn dashboard_request_from_payload(payload: DashboardPayload) -> Result<DashboardRequest, String> {
    let ids = payload.basket.map(IdList::into_ids).unwrap_or_default();
    let selection = Selection::from_ids(BASKET_LIMIT, &ids).map_err(|e| e.to_string())?;
    selection.require_at_least(1).map_err(|e| e.to_string())?;

    let horizon = payload
        .horizon
        .map(|v| v.as_u32())
        .unwrap_or(DEFAULT_HORIZON);
    if horizon > MAX_HORIZON {
        return Err(format!("horizon must be <= {MAX_HORIZON}"));
    }

    Ok(DashboardRequest {
        basket: selection.ids().to_vec(),
        horizon,
        seed: payload.seed,
    })
}

fn growth_request_from_payload(payload: GrowthPayload) -> Result<GrowthRequest, String> {
    let years = payload.years.map(|v| v.as_u32()).unwrap_or(5);
    if years > MAX_GROWTH_YEARS {
        return Err(format!("years must be <= {MAX_GROWTH_YEARS}"));
    }
    let history_days = payload
        .history_days
        .map(|v| v.as_count())
        .unwrap_or(5 * 365);
    if history_days > MAX_HISTORY_DAYS {
        return Err(format!("historyDays must be <= {MAX_HISTORY_DAYS}"));
    }
    if history_days < 2 {
        return Err("historyDays must be >= 2".to_string());
    }

    Ok(GrowthRequest {
        fund_id: payload.fund_id.unwrap_or_else(|| "1".to_string()),
        mode: payload.mode.map(Into::into).unwrap_or(InvestmentMode::Sip),
        amount: payload.amount.map(|v| v.value()).unwrap_or(100_000.0),
        years,
        history_days,
        seed: payload.seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn query<T: serde::de::DeserializeOwned>(path_and_query: &str) -> T {
        let uri: Uri = path_and_query.parse().expect("valid uri");
        Query::<T>::try_from_uri(&uri).expect("query should parse").0
    }

    #[test]
    fn lenient_numbers_accept_numbers_and_numeric_text() {
        let parse = |json: &str| serde_json::from_str::<LenientNumber>(json).expect("parses");
        assert_approx(parse("12.5").value(), 12.5);
        assert_approx(parse("\"  42 \"").value(), 42.0);
        assert_approx(parse("\"abc\"").value(), 0.0);
        assert_approx(parse("\"NaN\"").value(), 0.0);
        assert_eq!(parse("-3").as_count(), 0);
        assert_eq!(parse("\"7.9\"").as_u32(), 7);
    }

    #[test]
    fn sip_request_from_json_parses_web_keys() {
        let json = r#"{
          "fundId": "2",
          "fromDate": "2023-01-01",
          "toDate": "2023-04-01",
          "sipDay": "10",
          "amount": "10000",
          "enableTopUp": true,
          "topUpAmount": 500,
          "topUpFrequency": "Half Yearly",
          "seed": 7
        }"#;
        let request = sip_request_from_json(json).expect("json should parse");

        assert_eq!(request.fund_id, "2");
        assert_eq!(request.seed, Some(7));
        assert_eq!(request.request.start_date, date(2023, 1, 1));
        assert_eq!(request.request.end_date, date(2023, 4, 1));
        assert_eq!(request.request.contribution_day, 10);
        assert_approx(request.request.contribution_amount, 10_000.0);
        let top_up = request.request.top_up.expect("top-up enabled");
        assert_approx(top_up.amount, 500.0);
        assert_eq!(top_up.frequency, TopUpFrequency::HalfYearly);
    }

    #[test]
    fn sip_request_treats_garbage_numbers_as_zero() {
        let json = r#"{"amount": "lots", "sipDay": "soon", "enableTopUp": false}"#;
        let request = sip_request_from_json(json).expect("json should parse");
        assert_approx(request.request.contribution_amount, 0.0);
        assert_eq!(request.request.contribution_day, 0);
        assert!(request.request.top_up.is_none());
    }

    #[test]
    fn sip_request_rejects_malformed_dates() {
        let err = sip_request_from_json(r#"{"fromDate": "01/02/2023"}"#)
            .expect_err("must reject non-ISO date");
        assert!(err.contains("fromDate"));
    }

    #[test]
    fn build_sip_request_rejects_negative_top_up() {
        let mut args = default_sip_args();
        args.top_up_amount = Some(-5.0);
        let err = build_sip_request(&args).expect_err("must reject negative top-up");
        assert!(err.contains("top-up amount"));
    }

    #[test]
    fn sip_payload_rejects_negative_top_up_without_cli_wording() {
        let err = sip_request_from_json(r#"{"enableTopUp": true, "topUpAmount": -5}"#)
            .expect_err("must reject negative top-up");
        assert!(err.contains("top-up amount"));
        assert!(!err.contains("--"));
    }

    #[test]
    fn sip_window_is_capped_at_a_century() {
        let err = sip_request_from_json(r#"{"fromDate": "0001-01-01", "toDate": "9999-12-31"}"#)
            .expect_err("millennia of installments");
        assert!(err.contains("1200"));

        let mut args = default_sip_args();
        args.from = date(2000, 1, 1);
        args.to = date(2099, 12, 31);
        let request = build_sip_request(&args).expect("exactly 1200 installments");
        assert_eq!(request.end_date, date(2099, 12, 31));

        args.to = date(2100, 1, 1);
        assert!(build_sip_request(&args).is_err());
    }

    #[test]
    fn sip_report_response_covers_each_month() {
        let catalog = FundCatalog::builtin();
        let request = sip_request_from_json(
            r#"{"fundId": "1", "fromDate": "2023-01-01", "toDate": "2023-04-01",
                "sipDay": 10, "amount": 10000, "seed": 3}"#,
        )
        .expect("json should parse");
        let response = build_sip_report_response(&catalog, &request);

        assert_eq!(response.report.ledger.len(), 4);
        assert_eq!(response.report.summary.installments, 4);
        assert_approx(response.report.summary.regular.total_amount, 40_000.0);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"fundName\""));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"ledger\""));
        assert!(json.contains("\"cumulativeUnits\""));
        assert!(json.contains("\"2023-04-10\""));
    }

    #[test]
    fn unknown_sip_fund_falls_back_to_first() {
        let catalog = FundCatalog::builtin();
        let mut request = sip_request_from_json("{}").expect("defaults parse");
        request.fund_id = "missing".to_string();
        let response = build_sip_report_response(&catalog, &request);
        assert_eq!(response.fund_id, catalog.first().id);
    }

    #[test]
    fn sip_report_query_string_parses() {
        let payload: SipReportPayload = query(
            "/api/sip-report?fundId=3&fromDate=2024-01-01&toDate=2024-06-30&sipDay=31&amount=2500&enableTopUp=true&topUpFrequency=Yearly",
        );
        let request = sip_request_from_payload(payload).expect("query should map");
        assert_eq!(request.fund_id, "3");
        assert_eq!(request.request.contribution_day, 31);
        assert_approx(request.request.contribution_amount, 2_500.0);
        assert_eq!(
            request.request.top_up.map(|t| t.frequency),
            Some(TopUpFrequency::Yearly)
        );
    }

    #[test]
    fn compare_query_accepts_comma_separated_ids() {
        let payload: ComparePayload = query("/api/compare?ids=1,%202,3&days=30");
        let request = compare_request_from_payload(payload).expect("valid compare");
        assert_eq!(request.ids, ["1", "2", "3"]);
        assert_eq!(request.days, 30);
    }

    #[test]
    fn compare_rejects_too_few_or_too_many_funds() {
        let one = serde_json::from_str::<ComparePayload>(r#"{"ids": ["1"]}"#).expect("parses");
        let err = compare_request_from_payload(one).expect_err("one fund is not a comparison");
        assert!(err.contains('2'));

        let five = serde_json::from_str::<ComparePayload>(r#"{"ids": ["1","2","3","4","5"]}"#)
            .expect("parses");
        let err = compare_request_from_payload(five).expect_err("five funds exceed the limit");
        assert!(err.contains('4'));
    }

    #[test]
    fn compare_unknown_fund_is_not_found() {
        let catalog = FundCatalog::builtin();
        let payload = serde_json::from_str::<ComparePayload>(r#"{"ids": ["1", "nope"], "seed": 1}"#)
            .expect("parses");
        let err = compare_handler_impl(&catalog, payload).expect_err("unknown id");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn compare_response_serialization_contains_expected_fields() {
        let catalog = FundCatalog::builtin();
        let payload = serde_json::from_str::<ComparePayload>(
            r#"{"ids": ["1", "2"], "days": "20", "seed": 4}"#,
        )
        .expect("parses");
        let comparison = compare_handler_impl(&catalog, payload).expect("valid comparison");
        let json = serde_json::to_string(&comparison).expect("response should serialize");
        assert!(json.contains("\"funds\""));
        assert!(json.contains("\"chart\""));
        assert!(json.contains("\"commonHoldings\""));
        assert!(json.contains("\"diversity\""));
        assert!(json.contains("\"expenseRatio\""));
        assert!(json.contains("\"returnsChart\""));
        assert!(json.contains("\"exitLoad\""));
        assert!(json.contains("\"sectors\""));
        assert!(json.contains("\"holdings\""));
        assert_eq!(comparison.returns_chart.len(), comparison.chart.len());
    }

    #[test]
    fn dashboard_rejects_sixth_basket_fund() {
        let payload = serde_json::from_str::<DashboardPayload>(
            r#"{"basket": ["1","2","3","4","5","6"]}"#,
        )
        .expect("parses");
        let err = dashboard_request_from_payload(payload).expect_err("basket overflow");
        assert!(err.contains('5'));

        let empty = serde_json::from_str::<DashboardPayload>("{}").expect("parses");
        assert!(dashboard_request_from_payload(empty).is_err());
    }

    #[test]
    fn dashboard_defaults_horizon_and_parses_query() {
        let payload: DashboardPayload = query("/api/dashboard?basket=1,3&seed=9");
        let request = dashboard_request_from_payload(payload).expect("valid basket");
        assert_eq!(request.basket, ["1", "3"]);
        assert_eq!(request.horizon, 90);
        assert_eq!(request.seed, Some(9));

        let too_far =
            serde_json::from_str::<DashboardPayload>(r#"{"basket": "1", "horizon": 9999}"#)
                .expect("parses");
        assert!(dashboard_request_from_payload(too_far).is_err());
    }

    #[test]
    fn dashboard_response_serialization_contains_expected_fields() {
        let catalog = FundCatalog::builtin();
        let payload = serde_json::from_str::<DashboardPayload>(
            r#"{"basket": ["1", "2"], "horizon": "30", "seed": 5}"#,
        )
        .expect("parses");
        let response = dashboard_handler_impl(&catalog, payload).expect("valid dashboard");
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"basket\""));
        assert!(json.contains("\"navForecast\""));
        assert!(json.contains("\"upperCI\""));
        assert!(json.contains("\"correlationMatrix\""));
        assert!(json.contains("\"rollingCorrelation\""));
        assert!(json.contains("\"riskDecomposition\""));
        assert!(json.contains("\"sectorExposure\""));
        assert!(json.contains("\"kpis\""));
    }

    #[test]
    fn growth_request_defaults_and_modes() {
        let payload = serde_json::from_str::<GrowthPayload>(
            r#"{"fundId": "2", "mode": "lumpsum", "amount": "50000", "years": 1}"#,
        )
        .expect("parses");
        let request = growth_request_from_payload(payload).expect("valid growth");
        assert_eq!(request.mode, InvestmentMode::Lumpsum);
        assert_approx(request.amount, 50_000.0);
        assert_eq!(request.years, 1);
        assert_eq!(request.history_days, 5 * 365);

        let catalog = FundCatalog::builtin();
        let report =
            build_growth_response(&catalog, &request, date(2024, 6, 1)).expect("growth report");
        assert!(report.report.points.iter().all(|p| p.invested == 50_000.0));
        assert_approx(report.report.points.last().expect("points").nav, 89.45);
    }

    #[test]
    fn growth_rejects_unknown_fund() {
        let payload =
            serde_json::from_str::<GrowthPayload>(r#"{"fundId": "nope"}"#).expect("parses");
        let request = growth_request_from_payload(payload).expect("valid shape");
        let catalog = FundCatalog::builtin();
        let err = build_growth_response(&catalog, &request, date(2024, 6, 1))
            .expect_err("unknown fund");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn growth_years_are_capped_by_history_window() {
        let huge = serde_json::from_str::<GrowthPayload>(r#"{"years": "1e12"}"#).expect("parses");
        let err = growth_request_from_payload(huge).expect_err("years beyond the cap");
        assert!(err.contains("years"));

        let max = serde_json::from_str::<GrowthPayload>(r#"{"years": 10}"#).expect("parses");
        let request = growth_request_from_payload(max).expect("ten years");
        assert_eq!(request.years, 10);
    }

    #[test]
    fn fund_detail_falls_back_and_reports_riskometer() {
        let catalog = FundCatalog::builtin();
        let mut rng = request_rng(Some(1));
        let detail = build_fund_detail_response(&catalog, "missing", date(2024, 6, 1), &mut rng);

        assert_eq!(detail.fund.id, catalog.first().id);
        assert_eq!(detail.history.len(), 90);
        assert_eq!(detail.benchmark.len(), 90);
        assert_eq!(detail.riskometer.level, detail.fund.risk.level());

        let json = serde_json::to_string(&detail).expect("response should serialize");
        assert!(json.contains("\"needleDegrees\""));
        assert!(json.contains("\"benchmark\""));
    }

    #[test]
    fn funds_response_filters_by_query_and_category() {
        let catalog = FundCatalog::builtin();
        let everything = build_funds_response(&catalog, &FundsQuery::default());
        assert_eq!(everything.funds.len(), catalog.len());
        assert_eq!(everything.categories[0], "All");

        let midcap: FundsQuery = query("/api/funds?q=midcap&category=All");
        let filtered = build_funds_response(&catalog, &midcap);
        assert_eq!(filtered.funds.len(), 1);
        assert_eq!(filtered.funds[0].id, "2");
    }

    #[test]
    fn seeded_rngs_repeat() {
        use rand::Rng;
        let a: u64 = request_rng(Some(42)).random();
        let b: u64 = request_rng(Some(42)).random();
        assert_eq!(a, b);
    }

    #[test]
    fn core_errors_map_to_status_codes() {
        let missing: ApiError = CoreError::UnknownFund("x".to_string()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        let full: ApiError = CoreError::SelectionFull { limit: 4 }.into();
        assert_eq!(full.status, StatusCode::BAD_REQUEST);
        assert!(full.message.contains('4'));
    }

    #[test]
    fn malformed_json_body_answers_with_json_error() {
        let rejection = Json::<SipReportPayload>::from_bytes(br#"{"topUpFrequency": "Monthly"}"#)
            .expect_err("unknown frequency");
        let err = ApiError::from(rejection);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("topUpFrequency") || err.message.contains("Monthly"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.contains("application/json"));
    }

    #[test]
    fn malformed_query_answers_bad_request() {
        let uri: Uri = "/api/compare?ids=1,2&seed=abc".parse().expect("valid uri");
        let rejection =
            Query::<ComparePayload>::try_from_uri(&uri).expect_err("seed is not a number");
        let err = ApiError::from(rejection);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.into_response()
                .headers()
                .get(header::CACHE_CONTROL)
                .map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
    }
}
