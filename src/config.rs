use crate::access::UserRole;
use crate::error::{ReportError, Result};
use crate::rollup::DEFAULT_GRAND_TOTAL_LABEL;
use crate::table::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime settings. Every field has a default so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub stock_summary_file: String,
    pub stock_detail_file: String,
    pub omzet_file: String,
    pub sales_plan_file: String,
    pub sell_thru_perdana_file: String,
    pub sell_thru_voucher_file: String,
    pub d2c_file: String,
    pub page_size: usize,
    pub grand_total_label: String,
    pub role: UserRole,
    /// Rows shown in the console preview of each table.
    pub preview_rows: usize,
    /// TAP groups shown as their subtotal only in summary previews.
    pub collapsed_taps: Vec<String>,
    pub collapse_all: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("."),
            stock_summary_file: "stock_voucher_summary.json".to_string(),
            stock_detail_file: "stock_voucher_detail.json".to_string(),
            omzet_file: "omzet_outlet.csv".to_string(),
            sales_plan_file: "sales_plan_voucher.json".to_string(),
            sell_thru_perdana_file: "sell_thru_digipos_perdana.json".to_string(),
            sell_thru_voucher_file: "sell_thru_digipos_voucher.json".to_string(),
            d2c_file: "penjualan_d2c.json".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            grand_total_label: DEFAULT_GRAND_TOTAL_LABEL.to_string(),
            role: UserRole::Manager,
            preview_rows: 5,
            collapsed_taps: Vec::new(),
            collapse_all: false,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: AppConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ReportError::Config("page_size must be at least 1".to_string()));
        }
        if self.grand_total_label.trim().is_empty() {
            return Err(ReportError::Config("grand_total_label must not be blank".to_string()));
        }
        Ok(())
    }

    pub fn stock_summary_path(&self) -> PathBuf {
        self.data_dir.join(&self.stock_summary_file)
    }

    pub fn stock_detail_path(&self) -> PathBuf {
        self.data_dir.join(&self.stock_detail_file)
    }

    pub fn omzet_path(&self) -> PathBuf {
        self.data_dir.join(&self.omzet_file)
    }

    pub fn sales_plan_path(&self) -> PathBuf {
        self.data_dir.join(&self.sales_plan_file)
    }

    pub fn sell_thru_perdana_path(&self) -> PathBuf {
        self.data_dir.join(&self.sell_thru_perdana_file)
    }

    pub fn sell_thru_voucher_path(&self) -> PathBuf {
        self.data_dir.join(&self.sell_thru_voucher_file)
    }

    pub fn d2c_path(&self) -> PathBuf {
        self.data_dir.join(&self.d2c_file)
    }
}
