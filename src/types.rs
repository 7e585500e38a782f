use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Omzet (turnover) export row as it comes out of the CSV. Every field is
/// optional text; the loader cleans it into an [`OmzetOutletRecord`].
#[derive(Debug, Deserialize)]
pub struct RawOmzetRow {
    #[serde(rename = "ID_OUTLET")]
    pub id_outlet: Option<String>,
    #[serde(rename = "NO_RS")]
    pub no_rs: Option<String>,
    #[serde(rename = "NAMA_OUTLET")]
    pub nama_outlet: Option<String>,
    #[serde(rename = "TAP")]
    pub tap: Option<String>,
    #[serde(rename = "SALESFORCE")]
    pub salesforce: Option<String>,
    #[serde(rename = "KABUPATEN")]
    pub kabupaten: Option<String>,
    #[serde(rename = "KECAMATAN")]
    pub kecamatan: Option<String>,
    #[serde(rename = "HARI_PJP")]
    pub hari_pjp: Option<String>,
    #[serde(rename = "TRANSACTION_DATE")]
    pub transaction_date: Option<String>,
    #[serde(rename = "RECHARGE_FM_1")]
    pub recharge_fm_1: Option<String>,
    #[serde(rename = "RECHARGE_M_1")]
    pub recharge_m_1: Option<String>,
    #[serde(rename = "RECHARGE_M")]
    pub recharge_m: Option<String>,
    #[serde(rename = "INJECT_VF_FM_1")]
    pub inject_vf_fm_1: Option<String>,
    #[serde(rename = "INJECT_VF_M_1")]
    pub inject_vf_m_1: Option<String>,
    #[serde(rename = "INJECT_VF_M")]
    pub inject_vf_m: Option<String>,
    #[serde(rename = "ST_FM_1")]
    pub st_fm_1: Option<String>,
    #[serde(rename = "ST_M_1")]
    pub st_m_1: Option<String>,
    #[serde(rename = "ST_M")]
    pub st_m: Option<String>,
}

/// FM-1 / M-1 / M figures for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFigures {
    pub fm_1: f64,
    pub m_1: f64,
    pub m: f64,
}

impl MonthlyFigures {
    pub fn new(fm_1: f64, m_1: f64, m: f64) -> Self {
        MonthlyFigures { fm_1, m_1, m }
    }

    pub fn growth(&self) -> f64 {
        crate::metrics::growth(self.m, self.m_1)
    }
}

impl std::ops::Add for MonthlyFigures {
    type Output = MonthlyFigures;

    fn add(self, rhs: MonthlyFigures) -> MonthlyFigures {
        MonthlyFigures::new(self.fm_1 + rhs.fm_1, self.m_1 + rhs.m_1, self.m + rhs.m)
    }
}

/// One outlet's turnover, split into recharge, inject voucher-fisik and
/// sell-through. The total is always the sum of the three.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmzetOutletRecord {
    pub id_outlet: String,
    pub no_rs: String,
    pub nama_outlet: String,
    pub tap: String,
    pub salesforce: String,
    pub kabupaten: String,
    pub kecamatan: String,
    pub hari_pjp: String,
    pub transaction_date: Option<NaiveDate>,
    pub recharge: MonthlyFigures,
    pub inject_vf: MonthlyFigures,
    pub st: MonthlyFigures,
}

impl OmzetOutletRecord {
    pub fn total_omzet(&self) -> MonthlyFigures {
        self.recharge + self.inject_vf + self.st
    }
}

/// Plan figures for one week (or the whole month): FM1 is the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodFigures {
    #[serde(rename = "FM1")]
    pub fm1: f64,
    #[serde(rename = "M1")]
    pub m1: f64,
    #[serde(rename = "M")]
    pub m: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPlan {
    #[serde(rename = "W1")]
    pub w1: PeriodFigures,
    #[serde(rename = "W2")]
    pub w2: PeriodFigures,
    #[serde(rename = "W3")]
    pub w3: PeriodFigures,
    #[serde(rename = "W4")]
    pub w4: PeriodFigures,
    #[serde(rename = "W5")]
    pub w5: PeriodFigures,
    #[serde(rename = "Total")]
    pub total: PeriodFigures,
}

impl ProductPlan {
    pub fn period(&self, period: Period) -> &PeriodFigures {
        match period {
            Period::W1 => &self.w1,
            Period::W2 => &self.w2,
            Period::W3 => &self.w3,
            Period::W4 => &self.w4,
            Period::W5 => &self.w5,
            Period::Total => &self.total,
        }
    }
}

/// Reporting period inside a month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    W1,
    W2,
    W3,
    W4,
    W5,
    #[default]
    Total,
}

impl Period {
    pub const ALL: [Period; 6] = [Period::Total, Period::W1, Period::W2, Period::W3, Period::W4, Period::W5];
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::W1 => "W1",
            Period::W2 => "W2",
            Period::W3 => "W3",
            Period::W4 => "W4",
            Period::W5 => "W5",
            Period::Total => "Total",
        };
        f.write_str(s)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "W1" => Ok(Period::W1),
            "W2" => Ok(Period::W2),
            "W3" => Ok(Period::W3),
            "W4" => Ok(Period::W4),
            "W5" => Ok(Period::W5),
            "TOTAL" => Ok(Period::Total),
            other => Err(format!("unknown period '{}'", other)),
        }
    }
}

/// Voucher sales plan for one outlet, per product and week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPlanRecord {
    #[serde(rename = "ID_DIGIPOS")]
    pub id_digipos: String,
    #[serde(rename = "NO_RS", default)]
    pub no_rs: String,
    #[serde(rename = "NAMA_OUTLET", default)]
    pub nama_outlet: String,
    #[serde(rename = "SALESFORCE", default)]
    pub salesforce: String,
    #[serde(rename = "TAP", default)]
    pub tap: String,
    #[serde(rename = "KABUPATEN", default)]
    pub kabupaten: String,
    #[serde(rename = "KECAMATAN", default)]
    pub kecamatan: String,
    #[serde(rename = "FLAG", default)]
    pub flag: String,
    #[serde(rename = "HARI_PJP", default)]
    pub hari_pjp: String,
    #[serde(rename = "PLAN_DATE", default)]
    pub plan_date: Option<NaiveDate>,
    #[serde(rename = "VALIDITY", default)]
    pub validity: String,
    #[serde(rename = "PAKET", default)]
    pub paket: String,
    #[serde(rename = "Simpati")]
    pub simpati: ProductPlan,
    #[serde(rename = "byU")]
    pub byu: ProductPlan,
    #[serde(rename = "TotalVoucher")]
    pub total_voucher: ProductPlan,
}

/// Target / FM-1 / M-1 / M for a sell-through product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SellThruFigures {
    pub target: f64,
    #[serde(rename = "FM_1")]
    pub fm_1: f64,
    #[serde(rename = "M_1")]
    pub m_1: f64,
    #[serde(rename = "M")]
    pub m: f64,
}

impl SellThruFigures {
    pub fn derived(&self) -> crate::metrics::DerivedMetric {
        crate::metrics::DerivedMetric::compute(self.m, self.m_1, self.target)
    }
}

/// Digipos sell-through for one outlet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellThruRecord {
    #[serde(rename = "ID_DIGIPOS")]
    pub id_digipos: String,
    #[serde(rename = "NO_RS", default)]
    pub no_rs: String,
    #[serde(rename = "NAMA_OUTLET", default)]
    pub nama_outlet: String,
    #[serde(rename = "SALESFORCE", default)]
    pub salesforce: String,
    #[serde(rename = "TAP", default)]
    pub tap: String,
    #[serde(rename = "KABUPATEN", default)]
    pub kabupaten: String,
    #[serde(rename = "KECAMATAN", default)]
    pub kecamatan: String,
    #[serde(rename = "FLAG", default)]
    pub flag: String,
    pub simpati: SellThruFigures,
    pub byu: SellThruFigures,
    pub total: SellThruFigures,
}

/// Stock voucher summary for one salesforce, as delivered by the stock
/// export. Rates are not read from the file; they are recomputed on every
/// summary level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSummaryRecord {
    #[serde(rename = "SALESFORCE")]
    pub salesforce: String,
    #[serde(rename = "TAP")]
    pub tap: String,
    #[serde(rename = "PJP")]
    pub pjp: f64,
    #[serde(rename = "SELLTHRU_OUTLET")]
    pub sellthru_outlet: f64,
    #[serde(rename = "SELLTHRU_QTY")]
    pub sellthru_qty: f64,
    #[serde(rename = "STOCK_GT_0_OUTLET")]
    pub stock_gt0_outlet: f64,
    #[serde(rename = "STOCK_GT_0_QTY_OUTLET")]
    pub stock_gt0_qty_outlet: f64,
    /// Outlets that bought this month but hold no stock.
    #[serde(rename = "STOCK_0_TO_OUTLET_BELANJA")]
    pub stock0_outlet_belanja: f64,
    /// PJP outlets holding no stock.
    #[serde(rename = "STOCK_0_TO_OUTLET_PJP")]
    pub stock0_outlet_pjp: f64,
    #[serde(rename = "STOCK_DAYS_SO_DAILY")]
    pub so_daily: f64,
    #[serde(rename = "STOCK_DAYS_STOCK_DAYS")]
    pub stock_days: f64,
    #[serde(rename = "STOCK_PER_QTY_1")]
    pub qty_1: f64,
    #[serde(rename = "STOCK_PER_QTY_2_5")]
    pub qty_2_5: f64,
    #[serde(rename = "STOCK_PER_QTY_6_10")]
    pub qty_6_10: f64,
    #[serde(rename = "STOCK_PER_QTY_11_20")]
    pub qty_11_20: f64,
    #[serde(rename = "STOCK_PER_QTY_GT_20")]
    pub qty_gt_20: f64,
}

/// Remaining stock below this asks the salesforce to push an order.
pub const PUSH_ORDER_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    PushOrder,
    Sufficient,
}

impl StockStatus {
    pub fn of(remaining: f64) -> Self {
        if remaining < PUSH_ORDER_THRESHOLD {
            StockStatus::PushOrder
        } else {
            StockStatus::Sufficient
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::PushOrder => "Push Order",
            StockStatus::Sufficient => "Sudah Cukup",
        }
    }
}

/// Voucher stock and sales for one outlet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockDetailRecord {
    #[serde(rename = "ID_DIGIOS", alias = "ID_DIGIPOS")]
    pub id_digipos: String,
    #[serde(rename = "NO_RS")]
    pub no_rs: String,
    #[serde(rename = "NAMA_OUTLET")]
    pub nama_outlet: String,
    #[serde(rename = "TAP")]
    pub tap: String,
    #[serde(rename = "SALESFORCE")]
    pub salesforce: String,
    #[serde(rename = "KABUPATEN")]
    pub kabupaten: String,
    #[serde(rename = "KECAMATAN")]
    pub kecamatan: String,
    #[serde(rename = "HARI_PJP")]
    pub hari_pjp: String,
    #[serde(rename = "TOTAL_PEMBELIAN")]
    pub total_pembelian: f64,
    #[serde(rename = "TOTAL_SELLOUT_BARCODE")]
    pub total_sellout_barcode: f64,
    #[serde(rename = "TOTAL_SO_PAYLOAD")]
    pub total_so_payload: f64,
    #[serde(rename = "SISA_STOCK")]
    pub sisa_stock: f64,
    #[serde(rename = "SIMPATI_FM_1")]
    pub simpati_fm_1: f64,
    #[serde(rename = "SIMPATI_M_1")]
    pub simpati_m_1: f64,
    #[serde(rename = "SIMPATI_M")]
    pub simpati_m: f64,
    #[serde(rename = "BYU_FM_1")]
    pub byu_fm_1: f64,
    #[serde(rename = "BYU_M_1")]
    pub byu_m_1: f64,
    #[serde(rename = "BYU_M")]
    pub byu_m: f64,
}

impl StockDetailRecord {
    pub fn simpati(&self) -> MonthlyFigures {
        MonthlyFigures::new(self.simpati_fm_1, self.simpati_m_1, self.simpati_m)
    }

    pub fn byu(&self) -> MonthlyFigures {
        MonthlyFigures::new(self.byu_fm_1, self.byu_m_1, self.byu_m)
    }

    pub fn status(&self) -> StockStatus {
        StockStatus::of(self.sisa_stock)
    }
}

/// Target / FM-1 / M-1 / M for one direct-sales line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetric {
    pub target: f64,
    pub fm1: f64,
    pub m1: f64,
    pub m: f64,
}

impl PerformanceMetric {
    pub fn derived(&self) -> crate::metrics::DerivedMetric {
        crate::metrics::DerivedMetric::compute(self.m, self.m1, self.target)
    }
}

/// Monthly performance of one direct-to-consumer (D2C) sales agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct D2cSalesRecord {
    #[serde(rename = "namaD2C")]
    pub nama_d2c: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub simpati: PerformanceMetric,
    #[serde(default)]
    pub byu: PerformanceMetric,
    #[serde(default)]
    pub voucher_simpati: PerformanceMetric,
    #[serde(default)]
    pub voucher_byu: PerformanceMetric,
    #[serde(default)]
    pub recharge_amount: PerformanceMetric,
    #[serde(default)]
    pub modem: PerformanceMetric,
}
