use chrono::NaiveDate;
use sales_report::loader::{load_omzet_csv, DataSource, Dataset, JsonSource};
use sales_report::metrics::{format_achievement, growth};
use sales_report::output::{export_rows, summary_records, summary_table, write_csv, write_json, write_xlsx};
use sales_report::reports::{self, OmzetScope};
use sales_report::rollup::{collapse, outer_keys, Dimension, Measure, RollupSpec, RowKind, UNKNOWN_KEY};
use sales_report::table::{paginate, TableView};
use sales_report::types::{MonthlyFigures, OmzetOutletRecord, SellThruFigures, SellThruRecord, StockSummaryRecord};
use std::collections::BTreeSet;
use sales_report::util::DateRange;

fn outlet(id: &str, tap: &str, sf: &str, kab: &str, m_1: f64, m: f64) -> OmzetOutletRecord {
    OmzetOutletRecord {
        id_outlet: id.to_string(),
        no_rs: format!("RS-{id}"),
        nama_outlet: format!("Outlet {id}"),
        tap: tap.to_string(),
        salesforce: sf.to_string(),
        kabupaten: kab.to_string(),
        kecamatan: String::new(),
        hari_pjp: "Senin".to_string(),
        transaction_date: NaiveDate::from_ymd_opt(2024, 5, 2),
        recharge: MonthlyFigures::new(0.0, m_1, m),
        inject_vf: MonthlyFigures::default(),
        st: MonthlyFigures::default(),
    }
}

/// Three Pemuda outlets over SF-A/SF-B and two Kuningan outlets under SF-C.
/// One outlet per group is idle, so each salesforce carries 100 against 50.
fn cluster() -> Vec<OmzetOutletRecord> {
    vec![
        outlet("K1", "Kuningan", "SF-C", "", 50.0, 100.0),
        outlet("P1", "Pemuda", "SF-A", "", 50.0, 100.0),
        outlet("P2", "Pemuda", "SF-B", "", 50.0, 100.0),
        outlet("K2", "Kuningan", "SF-C", "", 0.0, 0.0),
        outlet("P3", "Pemuda", "SF-B", "", 0.0, 0.0),
    ]
}

#[test]
fn pemuda_kuningan_rollup() {
    let rows = reports::omzet_summary("TOTAL CLUSTER").rollup(&cluster());
    let shape: Vec<(RowKind, &str, f64)> = rows
        .iter()
        .map(|r| (r.kind, r.label.as_str(), r.value("omzet_m").unwrap()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (RowKind::Detail, "SF-C", 100.0),
            (RowKind::Subtotal, "TOTAL KUNINGAN", 100.0),
            (RowKind::Detail, "SF-A", 100.0),
            (RowKind::Detail, "SF-B", 100.0),
            (RowKind::Subtotal, "TOTAL PEMUDA", 200.0),
            (RowKind::GrandTotal, "TOTAL CLUSTER", 300.0),
        ]
    );
    for row in rows.iter().filter(|r| r.kind == RowKind::Detail) {
        assert_eq!(row.value("omzet_growth"), Some(1.0));
    }
    assert_eq!(rows[1].value("omzet_growth"), Some(1.0));
    assert_eq!(rows[4].value("omzet_growth"), Some(1.0));
    assert_eq!(rows[5].value("omzet_growth"), Some(1.0));
    assert_eq!(rows[4].record_count, 3);
    assert_eq!(rows[4].value("pjp"), Some(3.0));
    assert_eq!(rows[4].value("oa_m"), Some(2.0));
}

#[test]
fn grouping_is_total_and_additive() {
    let mut data = cluster();
    data.push(outlet("X1", "", "SF-Z", "", 10.0, 30.0));
    data.push(outlet("X2", "  ", "", "", 5.0, 0.0));

    let spec = RollupSpec::new(vec![Dimension::new("tap", |r: &OmzetOutletRecord| Some(r.tap.clone()))])
        .measure(Measure::sum("recharge_m", |r: &OmzetOutletRecord| r.recharge.m));
    let groups = spec.group(0, &data.iter().collect::<Vec<_>>());
    let sizes: usize = groups.values().map(Vec::len).sum();
    assert_eq!(sizes, data.len());
    assert_eq!(groups[UNKNOWN_KEY].len(), 2);

    let rows = reports::omzet_summary("TOTAL CLUSTER").rollup(&data);
    let subtotal_sum: f64 = rows
        .iter()
        .filter(|r| r.kind == RowKind::Subtotal)
        .map(|r| r.value("omzet_m1").unwrap())
        .sum();
    let grand = rows.iter().find(|r| r.kind == RowKind::GrandTotal).unwrap();
    assert_eq!(grand.value("omzet_m1"), Some(subtotal_sum));
    assert_eq!(grand.record_count, data.len());
}

fn ten_outlets() -> Vec<OmzetOutletRecord> {
    let kabs = ["Bandung", "Cimahi", "Garut", "Bandung", "Sumedang", "Cimahi", "Bandung", "Garut", "Cimahi", "Sumedang"];
    kabs.iter()
        .enumerate()
        .map(|(i, kab)| outlet(&format!("O{:02}", i), "Pemuda", "SF-A", kab, i as f64, (10 - i) as f64))
        .collect()
}

#[test]
fn select_filter_then_paginate() {
    let data = ten_outlets();
    let mut view = TableView::new(reports::omzet_columns(), 2);
    view.set_filter("kabupaten", "bandung").unwrap();

    let sizes: Vec<usize> = (1..=3)
        .map(|p| {
            view.set_page(p);
            view.current_page(&data).items.len()
        })
        .collect();
    assert_eq!(sizes, vec![2, 1, 0]);
    assert_eq!(view.current_page(&data).total_pages, 2);
}

#[test]
fn filter_is_idempotent() {
    let data = ten_outlets();
    let mut view = TableView::new(reports::omzet_columns(), 10);
    view.set_filter("id_outlet", "o0").unwrap();
    let once: Vec<String> = view.apply_all(&data).iter().map(|r| r.id_outlet.clone()).collect();
    view.set_filter("id_outlet", "o0").unwrap();
    let twice: Vec<String> = view.apply_all(&data).iter().map(|r| r.id_outlet.clone()).collect();
    assert_eq!(once, twice);
    assert_eq!(once.len(), 10);
}

#[test]
fn sort_descending_reverses_ascending() {
    let data = ten_outlets();
    let mut view = TableView::new(reports::omzet_columns(), 10);
    view.set_sort("recharge.m").unwrap();
    let asc: Vec<String> = view.apply_all(&data).iter().map(|r| r.id_outlet.clone()).collect();
    view.set_sort("recharge.m").unwrap();
    let mut desc: Vec<String> = view.apply_all(&data).iter().map(|r| r.id_outlet.clone()).collect();
    desc.reverse();
    assert_eq!(asc, desc);
    assert_eq!(asc.first().map(String::as_str), Some("O09"));
}

#[test]
fn pages_cover_the_view_exactly_once() {
    let data = ten_outlets();
    let mut view = TableView::new(reports::omzet_columns(), 3);
    view.set_sort("nama_outlet").unwrap();
    let all: Vec<&OmzetOutletRecord> = view.apply_all(&data);
    let total_pages = paginate(&all, 1, 3).total_pages;
    assert_eq!(total_pages, 4);
    let joined: Vec<&OmzetOutletRecord> = (1..=total_pages)
        .flat_map(|p| paginate(&all, p, 3).items)
        .collect();
    assert_eq!(joined, all);
}

#[test]
fn zero_target_renders_not_applicable() {
    let rec = SellThruRecord {
        id_digipos: "D1".to_string(),
        no_rs: String::new(),
        nama_outlet: String::new(),
        salesforce: "SF-A".to_string(),
        tap: "Pemuda".to_string(),
        kabupaten: String::new(),
        kecamatan: String::new(),
        flag: String::new(),
        simpati: SellThruFigures { target: 0.0, fm_1: 0.0, m_1: 0.0, m: 5.0 },
        byu: SellThruFigures::default(),
        total: SellThruFigures::default(),
    };
    let d = rec.simpati.derived();
    assert_eq!(d.achievement, f64::INFINITY);
    assert_eq!(format_achievement(d.achievement), "N/A");
    assert_eq!(growth(5.0, 0.0), f64::INFINITY);
    assert_eq!(growth(0.0, 0.0), 0.0);
    assert_eq!(growth(42.0, 42.0), 0.0);
}

#[test]
fn csv_to_exports() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("omzet.csv");
    std::fs::write(
        &input,
        "ID_OUTLET,NO_RS,NAMA_OUTLET,TAP,SALESFORCE,KABUPATEN,KECAMATAN,HARI_PJP,TRANSACTION_DATE,RECHARGE_FM_1,RECHARGE_M_1,RECHARGE_M,INJECT_VF_FM_1,INJECT_VF_M_1,INJECT_VF_M,ST_FM_1,ST_M_1,ST_M\n\
         O1,RS1,Toko A,Pemuda,SF-A,Bandung,Coblong,Senin,2024-05-02,100,0,250,0,0,0,0,0,0\n\
         O2,RS2,Toko B,Pemuda,SF-B,Bandung,Coblong,Selasa,2024-06-10,100,50,100,0,0,0,0,0,0\n",
    )
    .unwrap();
    let (records, report) = load_omzet_csv(&input).unwrap();
    assert_eq!(report.loaded_rows, 2);

    let scope = OmzetScope {
        dates: DateRange::new(NaiveDate::from_ymd_opt(2024, 5, 1), NaiveDate::from_ymd_opt(2024, 5, 31)),
    };
    let in_scope = scope.apply(&records);
    assert_eq!(in_scope.len(), 1);

    let view = TableView::new(reports::omzet_columns(), 10);
    let detail = export_rows(&view, &in_scope);
    assert!(detail.headers.contains(&"Recharge M".to_string()));
    let xlsx = dir.path().join("detail.xlsx");
    write_xlsx(&xlsx, "Omzet Outlet", &detail).unwrap();
    assert!(xlsx.exists());

    let rows = reports::omzet_summary("TOTAL CLUSTER").rollup(&in_scope);
    let summary = summary_table(&rows, "Salesforce", &reports::omzet_summary_columns());
    let csv_path = dir.path().join("summary.csv");
    write_csv(&csv_path, &summary).unwrap();
    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert!(text.starts_with("Salesforce,PJP,OA FM-1"));
    assert!(text.contains("TOTAL CLUSTER"));
    assert!(text.contains("New ▲"));
}

#[test]
fn json_dataset_refresh_keeps_data_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sell_thru.json");
    std::fs::write(
        &path,
        r#"[{"ID_DIGIPOS": "D1", "TAP": "Pemuda", "SALESFORCE": "SF-A",
            "simpati": {"target": 10, "FM_1": 1, "M_1": 4, "M": 8},
            "byu": {"target": 0, "FM_1": 0, "M_1": 0, "M": 0},
            "total": {"target": 10, "FM_1": 1, "M_1": 4, "M": 8}}]"#,
    )
    .unwrap();
    let source: JsonSource<SellThruRecord> = JsonSource::new(&path);
    let mut ds: Dataset<SellThruRecord> = Dataset::new();
    assert_eq!(ds.refresh(&source).unwrap(), 1);

    std::fs::write(&path, "not json").unwrap();
    assert!(ds.refresh(&source).is_err());
    assert_eq!(ds.records().len(), 1);
    assert!(ds.last_error().is_some());
    assert!(source.describe().ends_with("sell_thru.json"));
}

fn stock_rows() -> Vec<StockSummaryRecord> {
    serde_json::from_str(
        r#"[{"SALESFORCE": "SF-A", "TAP": "Pemuda", "PJP": 10, "STOCK_GT_0_OUTLET": 9, "STOCK_0_TO_OUTLET_PJP": 1},
            {"SALESFORCE": "SF-B", "TAP": "Pemuda", "PJP": 10, "STOCK_GT_0_OUTLET": 5, "STOCK_0_TO_OUTLET_PJP": 5},
            {"SALESFORCE": "SF-C", "TAP": "Kuningan", "PJP": 0, "STOCK_GT_0_OUTLET": 0}]"#,
    )
    .unwrap()
}

#[test]
fn collapsed_stock_summary_keeps_totals() {
    let rows = reports::stock_summary("TOTAL CLUSTER").rollup(&stock_rows());
    assert_eq!(outer_keys(&rows), vec!["Kuningan".to_string(), "Pemuda".to_string()]);

    let pemuda: BTreeSet<String> = ["Pemuda".to_string()].into_iter().collect();
    let labels: Vec<String> = collapse(&rows, &pemuda).into_iter().map(|r| r.label).collect();
    assert_eq!(labels, vec!["SF-C", "TOTAL KUNINGAN", "TOTAL PEMUDA", "TOTAL CLUSTER"]);

    let all: BTreeSet<String> = outer_keys(&rows).into_iter().collect();
    let shown = collapse(&rows, &all);
    assert!(shown.iter().all(|r| r.kind != RowKind::Detail));
    let grand = shown.last().unwrap();
    assert_eq!(grand.value("stock_gt0_rate_pjp"), Some(0.7));
    assert_eq!(grand.value("stock0_pjp_rate"), Some(0.3));
}

#[test]
fn summary_json_writes_display_markers() {
    let data = vec![outlet("N1", "Pemuda", "SF-A", "", 0.0, 80.0)];
    let rows = reports::omzet_summary("TOTAL CLUSTER").rollup(&data);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.json");
    write_json(&path, &summary_records(&rows, &reports::omzet_summary_columns())).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("null"));
    let back: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(back[0]["values"]["omzet_growth"], "New ▲");
    assert_eq!(back[2]["label"], "TOTAL CLUSTER");
    assert_eq!(back[2]["values"]["omzet_m"], 80.0);
}
