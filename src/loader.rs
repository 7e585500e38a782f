use crate::error::Result;
use crate::types::{MonthlyFigures, OmzetOutletRecord, RawOmzetRow};
use crate::util::{clean_text, parse_date_safe, parse_metric};
use chrono::{DateTime, Local};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

/// Where a report's canonical records come from. A fetch returns the whole
/// data set; there is no server-side paging.
pub trait DataSource<R> {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Vec<R>>;
}

pub fn load_omzet_csv(path: &Path) -> Result<(Vec<OmzetOutletRecord>, LoadReport)> {
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    Ok(clean_omzet_rows(rdr))
}

pub fn load_omzet_reader<Rd: Read>(input: Rd) -> (Vec<OmzetOutletRecord>, LoadReport) {
    let rdr = ReaderBuilder::new().flexible(true).from_reader(input);
    clean_omzet_rows(rdr)
}

fn clean_omzet_rows<Rd: Read>(mut rdr: csv::Reader<Rd>) -> (Vec<OmzetOutletRecord>, LoadReport) {
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (idx, result) in rdr.deserialize::<RawOmzetRow>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = idx + 1, error = %e, "skipping unreadable omzet row");
                report.parse_errors += 1;
                continue;
            }
        };
        match clean_omzet_row(row) {
            Ok(rec) => records.push(rec),
            Err(bad) => {
                warn!(row = idx + 1, value = %bad, "skipping omzet row with non-numeric metric");
                report.parse_errors += 1;
            }
        }
    }

    report.loaded_rows = records.len();
    (records, report)
}

fn clean_omzet_row(row: RawOmzetRow) -> std::result::Result<OmzetOutletRecord, String> {
    let figures = |fm_1: &Option<String>, m_1: &Option<String>, m: &Option<String>| {
        Ok::<_, String>(MonthlyFigures::new(
            parse_metric(fm_1.as_deref())?,
            parse_metric(m_1.as_deref())?,
            parse_metric(m.as_deref())?,
        ))
    };
    let recharge = figures(&row.recharge_fm_1, &row.recharge_m_1, &row.recharge_m)?;
    let inject_vf = figures(&row.inject_vf_fm_1, &row.inject_vf_m_1, &row.inject_vf_m)?;
    let st = figures(&row.st_fm_1, &row.st_m_1, &row.st_m)?;
    let transaction_date = parse_date_safe(row.transaction_date.as_deref());

    Ok(OmzetOutletRecord {
        id_outlet: clean_text(row.id_outlet),
        no_rs: clean_text(row.no_rs),
        nama_outlet: clean_text(row.nama_outlet),
        tap: clean_text(row.tap),
        salesforce: clean_text(row.salesforce),
        kabupaten: clean_text(row.kabupaten),
        kecamatan: clean_text(row.kecamatan),
        hari_pjp: clean_text(row.hari_pjp),
        transaction_date,
        recharge,
        inject_vf,
        st,
    })
}

/// Omzet outlet export in CSV form.
pub struct OmzetCsvSource {
    pub path: PathBuf,
}

impl OmzetCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        OmzetCsvSource { path: path.into() }
    }
}

impl DataSource<OmzetOutletRecord> for OmzetCsvSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<OmzetOutletRecord>> {
        let (records, report) = load_omzet_csv(&self.path)?;
        info!(
            source = %self.describe(),
            total = report.total_rows,
            loaded = report.loaded_rows,
            skipped = report.parse_errors,
            "omzet data loaded"
        );
        Ok(records)
    }
}

/// A JSON array of nested records (sales plan, sell-through).
pub struct JsonSource<R> {
    pub path: PathBuf,
    _marker: PhantomData<fn() -> R>,
}

impl<R> JsonSource<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSource {
            path: path.into(),
            _marker: PhantomData,
        }
    }
}

impl<R: DeserializeOwned> DataSource<R> for JsonSource<R> {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<R>> {
        let text = std::fs::read_to_string(&self.path)?;
        let records: Vec<R> = serde_json::from_str(&text)?;
        info!(source = %self.describe(), loaded = records.len(), "json data loaded");
        Ok(records)
    }
}

/// The canonical record set behind one report.
///
/// A failed refresh keeps whatever was loaded before (or nothing, on the
/// first load) and remembers the error message for display.
#[derive(Debug, Clone)]
pub struct Dataset<R> {
    records: Vec<R>,
    last_error: Option<String>,
    last_updated: Option<DateTime<Local>>,
}

impl<R> Default for Dataset<R> {
    fn default() -> Self {
        Dataset {
            records: Vec::new(),
            last_error: None,
            last_updated: None,
        }
    }
}

impl<R> Dataset<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn is_loaded(&self) -> bool {
        self.last_updated.is_some()
    }

    /// Fetch from `source`, replacing the records only on success.
    pub fn refresh(&mut self, source: &dyn DataSource<R>) -> Result<usize> {
        match source.fetch() {
            Ok(records) => {
                self.records = records;
                self.last_error = None;
                self.last_updated = Some(Local::now());
                Ok(self.records.len())
            }
            Err(e) => {
                warn!(source = %source.describe(), error = %e, "refresh failed; keeping previous data");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
