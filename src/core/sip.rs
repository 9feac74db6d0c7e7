use chrono::{Datelike, Months, NaiveDate};
use rand::Rng;

use super::synth::round_dp;
use super::types::{
    FundRecord, SipLedgerRow, SipLeg, SipReport, SipRequest, SipSummary, SipTotals, TopUpPlan,
};

/// Starting point of the reconstructed NAV path, as a fraction of today's NAV.
const SEED_NAV_RATIO: f64 = 0.7;
const NAV_NOISE: f64 = 0.02;
const DAYS_PER_MONTH: f64 = 30.0;

pub const MIN_CONTRIBUTION_DAY: u32 = 1;
pub const MAX_CONTRIBUTION_DAY: u32 = 31;

#[derive(Debug, Default, Clone, Copy)]
struct LegState {
    invested: f64,
    units: f64,
}

impl LegState {
    fn buy(&mut self, amount: f64, nav: f64) -> SipLeg {
        let units = if nav > 0.0 { amount / nav } else { 0.0 };
        self.invested += amount;
        self.units += units;
        SipLeg {
            amount,
            units,
            cumulative_units: self.units,
            current_value: self.units * nav,
        }
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// `day` of the given month, or the month's last day when it is shorter.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

/// First day of the month holding the first installment.
fn anchor_month(start: NaiveDate, day: u32) -> Option<NaiveDate> {
    let first = start.with_day(1)?;
    if start.day() > day {
        first.checked_add_months(Months::new(1))
    } else {
        Some(first)
    }
}

/// Installment dates from the normalized start through the end month.
///
/// Every date is computed from the anchor month, so a clamped short month
/// (day 31 in April) never shifts the following installments.
pub fn installment_dates(
    start: NaiveDate,
    end: NaiveDate,
    contribution_day: u32,
) -> Vec<NaiveDate> {
    if end <= start {
        return Vec::new();
    }
    let day = contribution_day.clamp(MIN_CONTRIBUTION_DAY, MAX_CONTRIBUTION_DAY);
    let (Some(anchor), Some(end_month)) = (anchor_month(start, day), end.with_day(1)) else {
        return Vec::new();
    };

    let mut dates = Vec::new();
    let mut offset = 0u32;
    while let Some(month) = anchor.checked_add_months(Months::new(offset)) {
        if month > end_month {
            break;
        }
        let Some(date) = clamped_date(month.year(), month.month(), day) else {
            break;
        };
        dates.push(date);
        offset += 1;
    }
    dates
}

fn elapsed_months(start: NaiveDate, end: NaiveDate) -> f64 {
    ((end - start).num_days() as f64 / DAYS_PER_MONTH).max(1.0)
}

fn monthly_growth(current_nav: f64, seed_nav: f64, months: f64) -> f64 {
    if !(current_nav.is_finite() && current_nav > 0.0 && seed_nav > 0.0) {
        return 1.0;
    }
    (current_nav / seed_nav).powf(1.0 / months)
}

fn non_negative(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Percentage gain over the invested amount, 0 when nothing was invested.
pub fn percent_return(current_value: f64, invested: f64) -> f64 {
    if invested > 0.0 {
        round_dp((current_value - invested) / invested * 100.0, 2)
    } else {
        0.0
    }
}

fn summarize(state: LegState, current_value: f64) -> SipTotals {
    SipTotals {
        total_amount: state.invested,
        total_units: round_dp(state.units, 4),
        current_value: current_value.round(),
        profit: (current_value - state.invested).round(),
        returns: percent_return(current_value, state.invested),
    }
}

/// Month-by-month SIP ledger for `fund`, with an optional top-up variant
/// sharing the same simulated NAV path.
pub fn project<R: Rng + ?Sized>(fund: &FundRecord, request: &SipRequest, rng: &mut R) -> SipReport {
    let dates = installment_dates(
        request.start_date,
        request.end_date,
        request.contribution_day,
    );
    let amount = non_negative(request.contribution_amount);
    let top_up_plan = request.top_up.map(|plan| TopUpPlan {
        amount: non_negative(plan.amount),
        frequency: plan.frequency,
    });

    let mut nav = fund.nav * SEED_NAV_RATIO;
    let growth = monthly_growth(
        fund.nav,
        nav,
        elapsed_months(request.start_date, request.end_date),
    );

    let mut regular = LegState::default();
    let mut top_up = top_up_plan.map(|plan| (plan, LegState::default(), amount));
    let mut ledger = Vec::with_capacity(dates.len());

    for (idx, date) in dates.into_iter().enumerate() {
        let sequence = idx as u32 + 1;
        nav *= growth * (1.0 + rng.random_range(-NAV_NOISE..NAV_NOISE));

        let regular_leg = regular.buy(amount, nav);
        let top_up_leg = top_up.as_mut().map(|(plan, state, running_amount)| {
            if sequence > 1 && (sequence - 1) % plan.frequency.interval_months() == 0 {
                *running_amount += plan.amount;
            }
            state.buy(*running_amount, nav)
        });

        ledger.push(SipLedgerRow {
            sequence,
            date,
            nav,
            regular: regular_leg,
            top_up: top_up_leg,
        });
    }

    let last = ledger.last();
    let summary = SipSummary {
        installments: ledger.len() as u32,
        regular: summarize(
            regular,
            last.map(|row| row.regular.current_value).unwrap_or(0.0),
        ),
        top_up: top_up.map(|(_, state, _)| {
            let value = last
                .and_then(|row| row.top_up)
                .map(|leg| leg.current_value)
                .unwrap_or(0.0);
            summarize(state, value)
        }),
    };

    tracing::debug!(
        fund = %fund.id,
        installments = summary.installments,
        invested = summary.regular.total_amount,
        top_up = summary.top_up.is_some(),
        "projected SIP ledger"
    );

    SipReport { summary, ledger }
}
