use std::fs;
use std::path::Path;

use super::error::{CoreError, CoreResult};
use super::types::{
    AssetAllocation, FundManager, FundRecord, Holding, PeriodPerformance, RiskTier, SectorWeight,
};

/// Category filter value that matches every fund.
pub const ALL_CATEGORIES: &str = "All";

/// Read-only set of fund records shared by every view.
///
/// A catalog always holds at least one fund so that unresolvable lookups can
/// fall back to the first entry.
#[derive(Debug, Clone)]
pub struct FundCatalog {
    funds: Vec<FundRecord>,
}

impl FundCatalog {
    pub fn new(funds: Vec<FundRecord>) -> CoreResult<Self> {
        if funds.is_empty() {
            return Err(CoreError::EmptyCatalog);
        }
        Ok(Self { funds })
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        let funds: Vec<FundRecord> = serde_json::from_str(json)?;
        Self::new(funds)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let raw = fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), funds = catalog.len(), "loaded fund catalog");
        Ok(catalog)
    }

    pub fn funds(&self) -> &[FundRecord] {
        &self.funds
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    pub fn first(&self) -> &FundRecord {
        &self.funds[0]
    }

    pub fn get(&self, id: &str) -> Option<&FundRecord> {
        self.funds.iter().find(|f| f.id == id)
    }

    pub fn require(&self, id: &str) -> CoreResult<&FundRecord> {
        self.get(id)
            .ok_or_else(|| CoreError::UnknownFund(id.to_string()))
    }

    /// Looks up `id`, falling back to the first fund when it is unknown.
    pub fn resolve(&self, id: &str) -> &FundRecord {
        self.get(id).unwrap_or_else(|| {
            tracing::debug!(id, "unknown fund id, using first catalog entry");
            self.first()
        })
    }

    /// Distinct categories in catalog order, preceded by [`ALL_CATEGORIES`].
    pub fn categories(&self) -> Vec<String> {
        let mut out = vec![ALL_CATEGORIES.to_string()];
        for fund in &self.funds {
            if !out.contains(&fund.category) {
                out.push(fund.category.clone());
            }
        }
        out
    }

    /// Case-insensitive search over name, category and AMC, combined with an
    /// exact category filter.
    pub fn filter(&self, query: &str, category: &str) -> Vec<&FundRecord> {
        let needle = query.trim().to_lowercase();
        self.funds
            .iter()
            .filter(|f| {
                needle.is_empty()
                    || f.name.to_lowercase().contains(&needle)
                    || f.category.to_lowercase().contains(&needle)
                    || f.amc.to_lowercase().contains(&needle)
            })
            .filter(|f| category.is_empty() || category == ALL_CATEGORIES || f.category == category)
            .collect()
    }

    pub fn builtin() -> Self {
        Self {
            funds: vec![bluechip_equity(), midcap_opportunities(), flexi_cap_saver()],
        }
    }
}

impl Default for FundCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn holding(name: &str, sector: &str, asset: f64, cumulative: f64) -> Holding {
    Holding {
        name: name.to_string(),
        sector: sector.to_string(),
        asset,
        cumulative,
    }
}

fn sector(name: &str, asset: f64) -> SectorWeight {
    SectorWeight {
        name: name.to_string(),
        asset,
    }
}

fn perf(period: &str, amount: f64, scheme: f64, benchmark: f64) -> PeriodPerformance {
    PeriodPerformance {
        period: period.to_string(),
        amount,
        scheme,
        benchmark,
    }
}

fn bluechip_equity() -> FundRecord {
    FundRecord {
        id: "1".to_string(),
        name: "RAPS Bluechip Equity Fund".to_string(),
        category: "Large Cap".to_string(),
        amc: "RAPS Capital".to_string(),
        nav: 145.23,
        cagr_1y: 15.4,
        cagr_3y: 12.8,
        risk: RiskTier::ModeratelyHigh,
        expense_ratio: 0.75,
        std_dev: 14.2,
        sharpe_ratio: 1.1,
        alpha: 2.5,
        exit_load: "1% if redeemed within 1 year".to_string(),
        entry_load: "Nil".to_string(),
        aum: "15,420.50".to_string(),
        nature: "Open Ended".to_string(),
        benchmark: "NIFTY 50 TRI".to_string(),
        inception_date: "01-01-2015".to_string(),
        age: "9.2 Years".to_string(),
        min_lumpsum: 5_000.0,
        min_sip: 500.0,
        options: "Growth/Dividend".to_string(),
        manager: FundManager {
            name: "Mr. Rajesh Gupta".to_string(),
            education: "B.Tech, MBA (Finance)".to_string(),
            experience: "May 2012 - Present".to_string(),
            schemes_count: "Managing 3 schemes".to_string(),
        },
        holdings: vec![
            holding("HDFC Bank Ltd.", "Financial Services", 9.5, 9.5),
            holding("Reliance Industries Ltd.", "Energy", 8.2, 17.7),
            holding("ICICI Bank Ltd.", "Financial Services", 7.1, 24.8),
            holding("Infosys Ltd.", "Technology", 5.8, 30.6),
            holding("Larsen & Toubro Ltd.", "Construction", 4.5, 35.1),
        ],
        sectors: vec![
            sector("Financial Services", 32.5),
            sector("Technology", 14.2),
            sector("Energy", 11.8),
            sector("Consumer Goods", 9.5),
        ],
        asset_allocation: AssetAllocation {
            equity: 98.5,
            debt: 0.0,
            others: 1.5,
        },
        lumpsum_performance: vec![
            perf("1 Year", 11_540.0, 15.4, 12.1),
            perf("3 Year", 14_350.0, 12.8, 11.5),
            perf("5 Year", 19_500.0, 14.2, 13.1),
            perf("Since Inception", 38_000.0, 13.5, 12.2),
        ],
        sip_performance: vec![
            perf("1 Year", 120_000.0, 18.2, 14.5),
            perf("3 Year", 360_000.0, 42.5, 38.1),
            perf("5 Year", 600_000.0, 75.2, 68.4),
        ],
    }
}

fn midcap_opportunities() -> FundRecord {
    FundRecord {
        id: "2".to_string(),
        name: "RAPS Midcap Opportunities".to_string(),
        category: "Mid Cap".to_string(),
        amc: "RAPS Capital".to_string(),
        nav: 89.45,
        cagr_1y: 22.1,
        cagr_3y: 18.5,
        risk: RiskTier::High,
        expense_ratio: 0.85,
        std_dev: 18.5,
        sharpe_ratio: 0.9,
        alpha: 3.8,
        exit_load: "1% if redeemed within 1 year".to_string(),
        entry_load: "Nil".to_string(),
        aum: "8,240.10".to_string(),
        nature: "Open Ended".to_string(),
        benchmark: "NIFTY Midcap 150 TRI".to_string(),
        inception_date: "15-03-2017".to_string(),
        age: "7.5 Years".to_string(),
        min_lumpsum: 5_000.0,
        min_sip: 1_000.0,
        options: "Growth".to_string(),
        manager: FundManager {
            name: "Ms. Priya Sharma".to_string(),
            education: "B.Com, CA".to_string(),
            experience: "Aug 2015 - Present".to_string(),
            schemes_count: "Managing 5 schemes".to_string(),
        },
        holdings: vec![
            holding("Trent Ltd.", "Consumer Services", 4.5, 4.5),
            holding("TVS Motor Company", "Automobile", 3.8, 8.3),
            holding("Indian Hotels Co.", "Consumer Services", 3.5, 11.8),
            holding("Federal Bank", "Financial Services", 3.2, 15.0),
            holding("Bharat Forge", "Capital Goods", 3.0, 18.0),
        ],
        sectors: vec![
            sector("Automobile", 18.5),
            sector("Financial Services", 16.2),
            sector("Capital Goods", 14.8),
            sector("Consumer Services", 12.5),
        ],
        asset_allocation: AssetAllocation {
            equity: 96.2,
            debt: 0.0,
            others: 3.8,
        },
        lumpsum_performance: vec![
            perf("1 Year", 12_210.0, 22.1, 19.5),
            perf("3 Year", 16_500.0, 18.5, 16.2),
            perf("5 Year", 24_000.0, 19.8, 17.5),
            perf("Since Inception", 42_000.0, 20.5, 18.1),
        ],
        sip_performance: vec![
            perf("1 Year", 120_000.0, 24.5, 21.2),
            perf("3 Year", 360_000.0, 55.2, 48.5),
            perf("5 Year", 600_000.0, 92.1, 84.2),
        ],
    }
}

fn flexi_cap_saver() -> FundRecord {
    FundRecord {
        id: "3".to_string(),
        name: "RAPS Flexi Cap Saver".to_string(),
        category: "Flexi Cap".to_string(),
        amc: "RAPS Capital".to_string(),
        nav: 210.11,
        cagr_1y: 14.2,
        cagr_3y: 15.1,
        risk: RiskTier::VeryHigh,
        expense_ratio: 0.95,
        std_dev: 16.2,
        sharpe_ratio: 0.8,
        alpha: 1.5,
        exit_load: "1% if redeemed within 1 year".to_string(),
        entry_load: "Nil".to_string(),
        aum: "6,500.00".to_string(),
        nature: "Open Ended".to_string(),
        benchmark: "NIFTY 500 TRI".to_string(),
        inception_date: "10-06-2016".to_string(),
        age: "8.2 Years".to_string(),
        min_lumpsum: 1_000.0,
        min_sip: 500.0,
        options: "Growth".to_string(),
        manager: FundManager {
            name: "Mr. Amit Patel".to_string(),
            education: "M.Sc Finance".to_string(),
            experience: "Jan 2010 - Present".to_string(),
            schemes_count: "Managing 2 schemes".to_string(),
        },
        holdings: vec![
            holding("Bajaj Finance", "Financial Services", 5.5, 5.5),
            holding("Asian Paints", "Consumer Goods", 4.8, 10.3),
        ],
        sectors: vec![
            sector("Financial Services", 28.5),
            sector("Consumer Goods", 18.2),
        ],
        asset_allocation: AssetAllocation {
            equity: 92.5,
            debt: 5.0,
            others: 2.5,
        },
        lumpsum_performance: vec![
            perf("1 Year", 11_420.0, 14.2, 13.5),
            perf("3 Year", 15_100.0, 15.1, 14.2),
        ],
        sip_performance: vec![
            perf("1 Year", 120_000.0, 16.5, 15.1),
            perf("3 Year", 360_000.0, 45.2, 40.5),
        ],
    }
}
