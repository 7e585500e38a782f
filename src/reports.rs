// Concrete report definitions: scopes (pre-filters applied before any
// table or rollup), summary rollup specs and detail column sets for each
// report family.
use crate::rollup::{DerivedField, Dimension, Measure, RollupSpec};
use crate::table::{CellFormat, Column, FilterKind, Value};
use crate::types::{
    D2cSalesRecord, MonthlyFigures, OmzetOutletRecord, PerformanceMetric, Period, ProductPlan, SalesPlanRecord,
    SellThruFigures, SellThruRecord, StockDetailRecord, StockSummaryRecord,
};
use crate::util::DateRange;
use std::collections::BTreeSet;
use tracing::debug;

type OmzetMetric = fn(&OmzetOutletRecord) -> MonthlyFigures;
type PlanProduct = fn(&SalesPlanRecord) -> &ProductPlan;
type SellThruProduct = fn(&SellThruRecord) -> &SellThruFigures;

fn recharge(r: &OmzetOutletRecord) -> MonthlyFigures {
    r.recharge
}

fn inject_vf(r: &OmzetOutletRecord) -> MonthlyFigures {
    r.inject_vf
}

fn sell_through(r: &OmzetOutletRecord) -> MonthlyFigures {
    r.st
}

fn total_omzet(r: &OmzetOutletRecord) -> MonthlyFigures {
    r.total_omzet()
}

const OMZET_METRICS: [(&str, &str, OmzetMetric); 4] = [
    ("recharge", "Recharge", recharge),
    ("inject_vf", "Inject VF", inject_vf),
    ("st", "ST", sell_through),
    ("total_omzet", "Total Omzet", total_omzet),
];

fn plan_simpati(r: &SalesPlanRecord) -> &ProductPlan {
    &r.simpati
}

fn plan_byu(r: &SalesPlanRecord) -> &ProductPlan {
    &r.byu
}

fn plan_total(r: &SalesPlanRecord) -> &ProductPlan {
    &r.total_voucher
}

const PLAN_PRODUCTS: [(&str, &str, PlanProduct); 3] = [
    ("simpati", "Simpati", plan_simpati),
    ("byu", "byU", plan_byu),
    ("total", "Total", plan_total),
];

fn st_simpati(r: &SellThruRecord) -> &SellThruFigures {
    &r.simpati
}

fn st_byu(r: &SellThruRecord) -> &SellThruFigures {
    &r.byu
}

fn st_total(r: &SellThruRecord) -> &SellThruFigures {
    &r.total
}

const SELL_THRU_PRODUCTS: [(&str, &str, SellThruProduct); 3] = [
    ("simpati", "Simpati", st_simpati),
    ("byu", "byU", st_byu),
    ("total", "Total", st_total),
];

fn stock_simpati(r: &StockDetailRecord) -> MonthlyFigures {
    r.simpati()
}

fn stock_byu(r: &StockDetailRecord) -> MonthlyFigures {
    r.byu()
}

const STOCK_PRODUCTS: [(&str, &str, fn(&StockDetailRecord) -> MonthlyFigures); 2] =
    [("simpati", "Simpati", stock_simpati), ("byu", "byU", stock_byu)];

type D2cLine = fn(&D2cSalesRecord) -> &PerformanceMetric;

fn d2c_simpati(r: &D2cSalesRecord) -> &PerformanceMetric {
    &r.simpati
}

fn d2c_byu(r: &D2cSalesRecord) -> &PerformanceMetric {
    &r.byu
}

fn d2c_voucher_simpati(r: &D2cSalesRecord) -> &PerformanceMetric {
    &r.voucher_simpati
}

fn d2c_voucher_byu(r: &D2cSalesRecord) -> &PerformanceMetric {
    &r.voucher_byu
}

fn d2c_recharge(r: &D2cSalesRecord) -> &PerformanceMetric {
    &r.recharge_amount
}

fn d2c_modem(r: &D2cSalesRecord) -> &PerformanceMetric {
    &r.modem
}

const D2C_LINES: [(&str, &str, D2cLine, CellFormat); 6] = [
    ("simpati", "Simpati", d2c_simpati, CellFormat::Count),
    ("byu", "byU", d2c_byu, CellFormat::Count),
    ("voucher_simpati", "Voucher Simpati", d2c_voucher_simpati, CellFormat::Count),
    ("voucher_byu", "Voucher byU", d2c_voucher_byu, CellFormat::Count),
    ("recharge_amount", "Recharge Amount", d2c_recharge, CellFormat::Currency),
    ("modem", "Modem", d2c_modem, CellFormat::Count),
];

fn date_value(d: Option<chrono::NaiveDate>) -> Value {
    d.map_or(Value::Empty, |d| Value::text(d.format("%Y-%m-%d").to_string()))
}

/// Sorted distinct non-blank values, for pre-filter dropdowns.
fn option_list<'a, R: 'a>(records: impl IntoIterator<Item = &'a R>, f: impl Fn(&R) -> &str) -> Vec<String> {
    records
        .into_iter()
        .map(|r| f(r).trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One column of a rendered summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryColumn {
    /// Rollup measure or derived field name.
    pub key: String,
    pub header: String,
    pub group: Option<String>,
    pub format: CellFormat,
}

impl SummaryColumn {
    pub fn new(key: &str, header: &str, format: CellFormat) -> Self {
        SummaryColumn {
            key: key.to_string(),
            header: header.to_string(),
            group: None,
            format,
        }
    }

    pub fn grouped(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn export_header(&self) -> String {
        match &self.group {
            Some(g) => format!("{} {}", g, self.header),
            None => self.header.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Omzet Outlet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OmzetScope {
    pub dates: DateRange,
}

impl OmzetScope {
    pub fn matches(&self, r: &OmzetOutletRecord) -> bool {
        self.dates.contains(r.transaction_date)
    }

    pub fn apply(&self, records: &[OmzetOutletRecord]) -> Vec<OmzetOutletRecord> {
        let out: Vec<OmzetOutletRecord> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        debug!(total = records.len(), in_scope = out.len(), "omzet scope applied");
        out
    }
}

/// TAP → Salesforce summary: PJP is the number of outlet rows, OA counts the
/// outlets with positive total omzet in each period.
pub fn omzet_summary(grand_total_label: &str) -> RollupSpec<OmzetOutletRecord> {
    RollupSpec::new(vec![
        Dimension::new("tap", |r: &OmzetOutletRecord| Some(r.tap.clone())),
        Dimension::new("salesforce", |r: &OmzetOutletRecord| Some(r.salesforce.clone())),
    ])
    .measure(Measure::count_rows("pjp"))
    .measure(Measure::count_positive("oa_fm1", |r: &OmzetOutletRecord| r.total_omzet().fm_1))
    .measure(Measure::count_positive("oa_m1", |r: &OmzetOutletRecord| r.total_omzet().m_1))
    .measure(Measure::count_positive("oa_m", |r: &OmzetOutletRecord| r.total_omzet().m))
    .measure(Measure::sum("omzet_fm1", |r: &OmzetOutletRecord| r.total_omzet().fm_1))
    .measure(Measure::sum("omzet_m1", |r: &OmzetOutletRecord| r.total_omzet().m_1))
    .measure(Measure::sum("omzet_m", |r: &OmzetOutletRecord| r.total_omzet().m))
    .derived(DerivedField::growth("oa_growth", "oa_m", "oa_m1"))
    .derived(DerivedField::rate("oa_rate_pjp", "oa_m", "pjp"))
    .derived(DerivedField::growth("omzet_growth", "omzet_m", "omzet_m1"))
    .grand_total_label(grand_total_label)
}

pub fn omzet_summary_columns() -> Vec<SummaryColumn> {
    vec![
        SummaryColumn::new("pjp", "PJP", CellFormat::Count),
        SummaryColumn::new("oa_fm1", "FM-1", CellFormat::Count).grouped("OA"),
        SummaryColumn::new("oa_m1", "M-1", CellFormat::Count).grouped("OA"),
        SummaryColumn::new("oa_m", "M", CellFormat::Count).grouped("OA"),
        SummaryColumn::new("oa_growth", "Growth", CellFormat::Growth).grouped("OA"),
        SummaryColumn::new("oa_rate_pjp", "OA/PJP", CellFormat::Rate),
        SummaryColumn::new("omzet_fm1", "FM-1", CellFormat::Currency).grouped("Omzet"),
        SummaryColumn::new("omzet_m1", "M-1", CellFormat::Currency).grouped("Omzet"),
        SummaryColumn::new("omzet_m", "M", CellFormat::Currency).grouped("Omzet"),
        SummaryColumn::new("omzet_growth", "Growth", CellFormat::Growth).grouped("Omzet"),
    ]
}

pub fn omzet_columns() -> Vec<Column<OmzetOutletRecord>> {
    let mut cols = vec![
        Column::text("id_outlet", "ID Outlet", |r: &OmzetOutletRecord| r.id_outlet.as_str()),
        Column::text("no_rs", "No RS", |r: &OmzetOutletRecord| r.no_rs.as_str()),
        Column::text("nama_outlet", "Nama Outlet", |r: &OmzetOutletRecord| r.nama_outlet.as_str()),
        Column::text("tap", "TAP", |r: &OmzetOutletRecord| r.tap.as_str()).filter(FilterKind::Select),
        Column::text("salesforce", "Salesforce", |r: &OmzetOutletRecord| r.salesforce.as_str())
            .filter(FilterKind::Select),
        Column::text("kabupaten", "Kabupaten", |r: &OmzetOutletRecord| r.kabupaten.as_str())
            .filter(FilterKind::Select),
        Column::text("kecamatan", "Kecamatan", |r: &OmzetOutletRecord| r.kecamatan.as_str())
            .filter(FilterKind::Select),
        Column::text("hari_pjp", "Hari PJP", |r: &OmzetOutletRecord| r.hari_pjp.as_str())
            .filter(FilterKind::Select),
        Column::new("transaction_date", "Tanggal", |r: &OmzetOutletRecord| date_value(r.transaction_date)),
    ];
    for (key, group, metric) in OMZET_METRICS {
        cols.push(
            Column::number(&format!("{key}.fm_1"), "FM-1", move |r: &OmzetOutletRecord| metric(r).fm_1)
                .grouped(group)
                .format(CellFormat::Currency),
        );
        cols.push(
            Column::number(&format!("{key}.m_1"), "M-1", move |r: &OmzetOutletRecord| metric(r).m_1)
                .grouped(group)
                .format(CellFormat::Currency),
        );
        cols.push(
            Column::number(&format!("{key}.m"), "M", move |r: &OmzetOutletRecord| metric(r).m)
                .grouped(group)
                .format(CellFormat::Currency),
        );
        cols.push(
            Column::number(&format!("{key}.growth"), "Growth", move |r: &OmzetOutletRecord| metric(r).growth())
                .grouped(group)
                .format(CellFormat::Growth),
        );
    }
    cols
}

// ---------------------------------------------------------------------------
// Sales Plan Voucher
// ---------------------------------------------------------------------------

/// Pre-filters of the sales plan page. `None` (or an empty string) means
/// "all"; the categorical filters compare exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesPlanScope {
    pub period: Period,
    pub flag: Option<String>,
    pub validity: Option<String>,
    pub paket: Option<String>,
    pub dates: DateRange,
}

fn equals_selected(selected: &Option<String>, value: &str) -> bool {
    match selected.as_deref() {
        None | Some("") => true,
        Some(s) => s == value,
    }
}

impl SalesPlanScope {
    pub fn matches(&self, r: &SalesPlanRecord) -> bool {
        equals_selected(&self.flag, &r.flag)
            && equals_selected(&self.validity, &r.validity)
            && equals_selected(&self.paket, &r.paket)
            && self.dates.contains(r.plan_date)
    }

    pub fn apply(&self, records: &[SalesPlanRecord]) -> Vec<SalesPlanRecord> {
        let out: Vec<SalesPlanRecord> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        debug!(
            total = records.len(),
            in_scope = out.len(),
            period = %self.period,
            "sales plan scope applied"
        );
        out
    }

    /// Back to "all": every pre-filter cleared, period reset to Total.
    pub fn reset(&mut self) {
        *self = SalesPlanScope::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesPlanOptions {
    pub flags: Vec<String>,
    pub validities: Vec<String>,
    pub pakets: Vec<String>,
}

pub fn sales_plan_options(records: &[SalesPlanRecord]) -> SalesPlanOptions {
    SalesPlanOptions {
        flags: option_list(records, |r: &SalesPlanRecord| r.flag.as_str()),
        validities: option_list(records, |r: &SalesPlanRecord| r.validity.as_str()),
        pakets: option_list(records, |r: &SalesPlanRecord| r.paket.as_str()),
    }
}

/// TAP → Salesforce summary for one period. PJP counts distinct Digipos
/// ids; every product gets an OA block (outlets with a positive figure) and
/// a quantity block (summed figures), FM1 acting as the target.
pub fn sales_plan_summary(period: Period, grand_total_label: &str) -> RollupSpec<SalesPlanRecord> {
    let mut spec = RollupSpec::new(vec![
        Dimension::new("tap", |r: &SalesPlanRecord| Some(r.tap.clone())),
        Dimension::new("salesforce", |r: &SalesPlanRecord| Some(r.salesforce.clone())),
    ])
    .measure(Measure::count_distinct("pjp", |r: &SalesPlanRecord| r.id_digipos.clone()))
    .grand_total_label(grand_total_label);

    for (key, _, product) in PLAN_PRODUCTS {
        let oa = format!("{key}_oa");
        let qty = format!("{key}_qty");
        spec = spec
            .measure(Measure::count_positive(format!("{oa}_target"), move |r: &SalesPlanRecord| {
                product(r).period(period).fm1
            }))
            .measure(Measure::count_positive(format!("{oa}_m1"), move |r: &SalesPlanRecord| {
                product(r).period(period).m1
            }))
            .measure(Measure::count_positive(format!("{oa}_m"), move |r: &SalesPlanRecord| {
                product(r).period(period).m
            }))
            .measure(Measure::sum(format!("{qty}_target"), move |r: &SalesPlanRecord| {
                product(r).period(period).fm1
            }))
            .measure(Measure::sum(format!("{qty}_m1"), move |r: &SalesPlanRecord| {
                product(r).period(period).m1
            }))
            .measure(Measure::sum(format!("{qty}_m"), move |r: &SalesPlanRecord| {
                product(r).period(period).m
            }));
        for block in [&oa, &qty] {
            spec = spec
                .derived(DerivedField::achievement(
                    &format!("{block}_achv"),
                    &format!("{block}_m"),
                    &format!("{block}_target"),
                ))
                .derived(DerivedField::growth(
                    &format!("{block}_mom"),
                    &format!("{block}_m"),
                    &format!("{block}_m1"),
                ));
        }
    }
    spec
}

pub fn sales_plan_summary_columns() -> Vec<SummaryColumn> {
    let mut cols = vec![SummaryColumn::new("pjp", "PJP", CellFormat::Count)];
    for (key, group, _) in PLAN_PRODUCTS {
        for (block, label) in [("oa", "OA"), ("qty", "Qty")] {
            let g = format!("{group} {label}");
            let field = |suffix: &str| format!("{key}_{block}_{suffix}");
            cols.push(SummaryColumn::new(&field("target"), "Target", CellFormat::Count).grouped(&g));
            cols.push(SummaryColumn::new(&field("m1"), "M-1", CellFormat::Count).grouped(&g));
            cols.push(SummaryColumn::new(&field("m"), "M", CellFormat::Count).grouped(&g));
            cols.push(SummaryColumn::new(&field("achv"), "Achv", CellFormat::Achievement).grouped(&g));
            cols.push(SummaryColumn::new(&field("mom"), "MoM", CellFormat::Growth).grouped(&g));
        }
    }
    cols
}

pub fn sales_plan_columns(period: Period) -> Vec<Column<SalesPlanRecord>> {
    let mut cols = vec![
        Column::text("id_digipos", "ID Digipos", |r: &SalesPlanRecord| r.id_digipos.as_str()),
        Column::text("no_rs", "No RS", |r: &SalesPlanRecord| r.no_rs.as_str()),
        Column::text("nama_outlet", "Nama Outlet", |r: &SalesPlanRecord| r.nama_outlet.as_str()),
        Column::text("salesforce", "Salesforce", |r: &SalesPlanRecord| r.salesforce.as_str())
            .filter(FilterKind::Select),
        Column::text("tap", "TAP", |r: &SalesPlanRecord| r.tap.as_str()).filter(FilterKind::Select),
        Column::text("kabupaten", "Kabupaten", |r: &SalesPlanRecord| r.kabupaten.as_str())
            .filter(FilterKind::Select),
        Column::text("kecamatan", "Kecamatan", |r: &SalesPlanRecord| r.kecamatan.as_str())
            .filter(FilterKind::Select),
        Column::text("flag", "Flag", |r: &SalesPlanRecord| r.flag.as_str()).filter(FilterKind::Select),
        Column::text("hari_pjp", "Hari PJP", |r: &SalesPlanRecord| r.hari_pjp.as_str())
            .filter(FilterKind::Select),
    ];
    for (key, group, product) in PLAN_PRODUCTS {
        cols.push(
            Column::number(&format!("{key}.target"), "Target", move |r: &SalesPlanRecord| {
                product(r).period(period).fm1
            })
            .grouped(group)
            .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.m_1"), "M-1", move |r: &SalesPlanRecord| product(r).period(period).m1)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.m"), "M", move |r: &SalesPlanRecord| product(r).period(period).m)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.achv"), "Achv", move |r: &SalesPlanRecord| {
                let p = product(r).period(period);
                crate::metrics::achievement(p.m, p.fm1)
            })
            .grouped(group)
            .format(CellFormat::Achievement),
        );
        cols.push(
            Column::number(&format!("{key}.mom"), "MoM", move |r: &SalesPlanRecord| {
                let p = product(r).period(period);
                crate::metrics::growth(p.m, p.m1)
            })
            .grouped(group)
            .format(CellFormat::Growth),
        );
    }
    cols
}

// ---------------------------------------------------------------------------
// Sell-Thru Digipos
// ---------------------------------------------------------------------------

pub fn sell_thru_summary(grand_total_label: &str) -> RollupSpec<SellThruRecord> {
    let mut spec = RollupSpec::new(vec![
        Dimension::new("tap", |r: &SellThruRecord| Some(r.tap.clone())),
        Dimension::new("salesforce", |r: &SellThruRecord| Some(r.salesforce.clone())),
    ])
    .measure(Measure::count_distinct("pjp", |r: &SellThruRecord| r.id_digipos.clone()))
    .grand_total_label(grand_total_label);

    for (key, _, product) in SELL_THRU_PRODUCTS {
        spec = spec
            .measure(Measure::sum(format!("{key}_target"), move |r: &SellThruRecord| product(r).target))
            .measure(Measure::sum(format!("{key}_m1"), move |r: &SellThruRecord| product(r).m_1))
            .measure(Measure::sum(format!("{key}_m"), move |r: &SellThruRecord| product(r).m))
            .measure(Measure::count_positive(format!("{key}_oa"), move |r: &SellThruRecord| product(r).m))
            .derived(DerivedField::achievement(
                &format!("{key}_achv"),
                &format!("{key}_m"),
                &format!("{key}_target"),
            ))
            .derived(DerivedField::growth(
                &format!("{key}_growth"),
                &format!("{key}_m"),
                &format!("{key}_m1"),
            ));
    }
    spec
}

pub fn sell_thru_summary_columns() -> Vec<SummaryColumn> {
    let mut cols = vec![SummaryColumn::new("pjp", "PJP", CellFormat::Count)];
    for (key, group, _) in SELL_THRU_PRODUCTS {
        let field = |suffix: &str| format!("{key}_{suffix}");
        cols.push(SummaryColumn::new(&field("oa"), "OA", CellFormat::Count).grouped(group));
        cols.push(SummaryColumn::new(&field("target"), "Target", CellFormat::Count).grouped(group));
        cols.push(SummaryColumn::new(&field("m1"), "M-1", CellFormat::Count).grouped(group));
        cols.push(SummaryColumn::new(&field("m"), "M", CellFormat::Count).grouped(group));
        cols.push(SummaryColumn::new(&field("achv"), "Achv", CellFormat::Achievement).grouped(group));
        cols.push(SummaryColumn::new(&field("growth"), "Growth", CellFormat::Growth).grouped(group));
    }
    cols
}

pub fn sell_thru_columns() -> Vec<Column<SellThruRecord>> {
    let mut cols = vec![
        Column::text("id_digipos", "ID Digipos", |r: &SellThruRecord| r.id_digipos.as_str()),
        Column::text("no_rs", "No RS", |r: &SellThruRecord| r.no_rs.as_str()),
        Column::text("nama_outlet", "Nama Outlet", |r: &SellThruRecord| r.nama_outlet.as_str()),
        Column::text("salesforce", "Salesforce", |r: &SellThruRecord| r.salesforce.as_str())
            .filter(FilterKind::Select),
        Column::text("tap", "TAP", |r: &SellThruRecord| r.tap.as_str()).filter(FilterKind::Select),
        Column::text("kabupaten", "Kabupaten", |r: &SellThruRecord| r.kabupaten.as_str())
            .filter(FilterKind::Select),
        Column::text("kecamatan", "Kecamatan", |r: &SellThruRecord| r.kecamatan.as_str())
            .filter(FilterKind::Select),
        Column::text("flag", "Flag", |r: &SellThruRecord| r.flag.as_str()).filter(FilterKind::Select),
    ];
    for (key, group, product) in SELL_THRU_PRODUCTS {
        cols.push(
            Column::number(&format!("{key}.target"), "Target", move |r: &SellThruRecord| product(r).target)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.fm_1"), "FM-1", move |r: &SellThruRecord| product(r).fm_1)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.m_1"), "M-1", move |r: &SellThruRecord| product(r).m_1)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.m"), "M", move |r: &SellThruRecord| product(r).m)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.achv"), "Achv", move |r: &SellThruRecord| {
                product(r).derived().achievement
            })
            .grouped(group)
            .format(CellFormat::Achievement),
        );
        cols.push(
            Column::number(&format!("{key}.growth"), "Growth", move |r: &SellThruRecord| {
                product(r).derived().growth
            })
            .grouped(group)
            .format(CellFormat::Growth),
        );
    }
    cols
}

// ---------------------------------------------------------------------------
// Stock Voucher
// ---------------------------------------------------------------------------

/// TAP → Salesforce stock summary. Input rows are already per salesforce, so
/// every count is a plain sum; the three rates are recomputed per level and
/// read 0 when their denominator is empty.
pub fn stock_summary(grand_total_label: &str) -> RollupSpec<StockSummaryRecord> {
    let sums: [(&str, fn(&StockSummaryRecord) -> f64); 14] = [
        ("pjp", |r| r.pjp),
        ("sellthru_outlet", |r| r.sellthru_outlet),
        ("sellthru_qty", |r| r.sellthru_qty),
        ("stock_gt0_outlet", |r| r.stock_gt0_outlet),
        ("stock_gt0_qty_outlet", |r| r.stock_gt0_qty_outlet),
        ("stock0_outlet_belanja", |r| r.stock0_outlet_belanja),
        ("stock0_outlet_pjp", |r| r.stock0_outlet_pjp),
        ("so_daily", |r| r.so_daily),
        ("stock_days", |r| r.stock_days),
        ("qty_1", |r| r.qty_1),
        ("qty_2_5", |r| r.qty_2_5),
        ("qty_6_10", |r| r.qty_6_10),
        ("qty_11_20", |r| r.qty_11_20),
        ("qty_gt_20", |r| r.qty_gt_20),
    ];
    let mut spec = RollupSpec::new(vec![
        Dimension::new("tap", |r: &StockSummaryRecord| Some(r.tap.clone())),
        Dimension::new("salesforce", |r: &StockSummaryRecord| Some(r.salesforce.clone())),
    ])
    .grand_total_label(grand_total_label);
    for (name, f) in sums {
        spec = spec.measure(Measure::sum(name, f));
    }
    spec.derived(DerivedField::rate("stock_gt0_rate_pjp", "stock_gt0_outlet", "pjp"))
        .derived(DerivedField::rate("stock0_outlet_rate", "stock0_outlet_belanja", "sellthru_outlet"))
        .derived(DerivedField::rate("stock0_pjp_rate", "stock0_outlet_pjp", "pjp"))
}

pub fn stock_summary_columns() -> Vec<SummaryColumn> {
    vec![
        SummaryColumn::new("pjp", "PJP", CellFormat::Count),
        SummaryColumn::new("sellthru_outlet", "Outlet Belanja", CellFormat::Count).grouped("Sellthru"),
        SummaryColumn::new("sellthru_qty", "Qty Belanja", CellFormat::Count).grouped("Sellthru"),
        SummaryColumn::new("stock_gt0_outlet", "Outlet", CellFormat::Count).grouped("Stock > 0"),
        SummaryColumn::new("stock_gt0_rate_pjp", "Rate to PJP", CellFormat::GoodRate).grouped("Stock > 0"),
        SummaryColumn::new("stock_gt0_qty_outlet", "Qty / Outlet", CellFormat::Count).grouped("Stock > 0"),
        SummaryColumn::new("stock0_outlet_belanja", "to Outlet Belanja", CellFormat::Count).grouped("Stock 0"),
        SummaryColumn::new("stock0_outlet_rate", "Rate", CellFormat::BadRate).grouped("Stock 0"),
        SummaryColumn::new("stock0_outlet_pjp", "to Outlet PJP", CellFormat::Count).grouped("Stock 0"),
        SummaryColumn::new("stock0_pjp_rate", "PJP Rate", CellFormat::BadRate).grouped("Stock 0"),
        SummaryColumn::new("so_daily", "SO Daily", CellFormat::Count).grouped("Stock Days"),
        SummaryColumn::new("stock_days", "Stock Days", CellFormat::Count).grouped("Stock Days"),
        SummaryColumn::new("qty_1", "1", CellFormat::Count).grouped("Stock per Qty"),
        SummaryColumn::new("qty_2_5", "2 - 5", CellFormat::Count).grouped("Stock per Qty"),
        SummaryColumn::new("qty_6_10", "6 - 10", CellFormat::Count).grouped("Stock per Qty"),
        SummaryColumn::new("qty_11_20", "11 - 20", CellFormat::Count).grouped("Stock per Qty"),
        SummaryColumn::new("qty_gt_20", ">20", CellFormat::Count).grouped("Stock per Qty"),
    ]
}

pub fn stock_columns() -> Vec<Column<StockDetailRecord>> {
    let mut cols = vec![
        Column::text("id_digipos", "ID Digipos", |r: &StockDetailRecord| r.id_digipos.as_str()),
        Column::text("no_rs", "No RS", |r: &StockDetailRecord| r.no_rs.as_str()),
        Column::text("nama_outlet", "Nama Outlet", |r: &StockDetailRecord| r.nama_outlet.as_str()),
        Column::text("tap", "TAP", |r: &StockDetailRecord| r.tap.as_str()).filter(FilterKind::Select),
        Column::text("salesforce", "Salesforce", |r: &StockDetailRecord| r.salesforce.as_str())
            .filter(FilterKind::Select),
        Column::text("kabupaten", "Kabupaten", |r: &StockDetailRecord| r.kabupaten.as_str())
            .filter(FilterKind::Select),
        Column::text("kecamatan", "Kecamatan", |r: &StockDetailRecord| r.kecamatan.as_str())
            .filter(FilterKind::Select),
        Column::text("hari_pjp", "Hari PJP", |r: &StockDetailRecord| r.hari_pjp.as_str())
            .filter(FilterKind::Select),
    ];
    for (key, group, product) in STOCK_PRODUCTS {
        cols.push(
            Column::number(&format!("{key}.fm_1"), "FM-1", move |r: &StockDetailRecord| product(r).fm_1)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.m_1"), "M-1", move |r: &StockDetailRecord| product(r).m_1)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.m"), "M", move |r: &StockDetailRecord| product(r).m)
                .grouped(group)
                .format(CellFormat::Count),
        );
        cols.push(
            Column::number(&format!("{key}.growth"), "Growth", move |r: &StockDetailRecord| product(r).growth())
                .grouped(group)
                .format(CellFormat::Growth),
        );
    }
    cols.extend([
        Column::number("total_pembelian", "Total Pembelian", |r: &StockDetailRecord| r.total_pembelian)
            .format(CellFormat::Count),
        Column::number("total_sellout_barcode", "Total Sellout Barcode", |r: &StockDetailRecord| {
            r.total_sellout_barcode
        })
        .format(CellFormat::Count),
        Column::number("total_so_payload", "Total SO Payload", |r: &StockDetailRecord| r.total_so_payload)
            .format(CellFormat::Count),
        Column::number("sisa_stock", "Sisa Stock", |r: &StockDetailRecord| r.sisa_stock).format(CellFormat::Count),
        Column::text("status", "Status", |r: &StockDetailRecord| r.status().label()).filter(FilterKind::Select),
    ]);
    cols
}

// ---------------------------------------------------------------------------
// Penjualan D2C
// ---------------------------------------------------------------------------

/// Per-agent detail only; D2C sales have no TAP hierarchy to roll up.
pub fn d2c_columns() -> Vec<Column<D2cSalesRecord>> {
    let mut cols = vec![
        Column::text("nama_d2c", "Nama D2C", |r: &D2cSalesRecord| r.nama_d2c.as_str()),
        Column::text("city", "City", |r: &D2cSalesRecord| r.city.as_str()).filter(FilterKind::Select),
    ];
    for (key, group, line, format) in D2C_LINES {
        cols.push(
            Column::number(&format!("{key}.target"), "Target", move |r: &D2cSalesRecord| line(r).target)
                .grouped(group)
                .format(format),
        );
        cols.push(
            Column::number(&format!("{key}.fm1"), "FM-1", move |r: &D2cSalesRecord| line(r).fm1)
                .grouped(group)
                .format(format),
        );
        cols.push(
            Column::number(&format!("{key}.m1"), "M-1", move |r: &D2cSalesRecord| line(r).m1)
                .grouped(group)
                .format(format),
        );
        cols.push(
            Column::number(&format!("{key}.m"), "M", move |r: &D2cSalesRecord| line(r).m)
                .grouped(group)
                .format(format),
        );
        cols.push(
            Column::number(&format!("{key}.achv"), "Achv", move |r: &D2cSalesRecord| line(r).derived().achievement)
                .grouped(group)
                .format(CellFormat::Achievement),
        );
        cols.push(
            Column::number(&format!("{key}.mom"), "MoM", move |r: &D2cSalesRecord| line(r).derived().growth)
                .grouped(group)
                .format(CellFormat::Growth),
        );
    }
    cols
}
