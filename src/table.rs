// Detail-table view state: per-column filters, a single sort key and
// pagination.
//
// Columns resolve their cell through an accessor closure, so nested fields
// (`simpati.target`) and virtual columns (growth percentages) are addressed
// the same way as plain fields. `apply_all` always starts again from the full
// record set.
use crate::error::{ReportError, Result};
use crate::metrics::{format_achievement, format_growth, format_rate, RatioBand};
use crate::util::{format_currency, format_number};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A resolved cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Plain string form used for filtering and option lists.
    pub fn as_plain_string(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => plain_number(*n),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Empty => 0,
            Value::Number(_) => 1,
            Value::Text(_) => 2,
        }
    }

    /// Natural ordering: numbers numerically, text by bytes. Mixed kinds
    /// order Empty < Number < Text so sorting never fails. NaN sorts after
    /// every other number, including `+inf`.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (false, false) => a.total_cmp(b),
                (a_nan, b_nan) => a_nan.cmp(&b_nan),
            },
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn plain_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    #[default]
    Text,
    /// Case-insensitive exact match against a dropdown of known values.
    Select,
}

/// How a column's value is rendered for humans and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFormat {
    #[default]
    Plain,
    Count,
    Currency,
    /// Growth ratio; infinite renders as "New".
    Growth,
    /// Achievement ratio; infinite renders as "N/A".
    Achievement,
    /// Summary ratio such as OA per PJP.
    Rate,
    /// Rate where higher is better; banded for highlighting.
    GoodRate,
    /// Rate where lower is better; banded for highlighting.
    BadRate,
}

/// Human-readable text for `value` under `format`.
pub fn render(value: &Value, format: CellFormat) -> String {
    match (value, format) {
        (Value::Number(n), CellFormat::Count) => format_number(*n, 0),
        (Value::Number(n), CellFormat::Currency) => format_currency(*n),
        (Value::Number(n), CellFormat::Growth) => format_growth(*n),
        (Value::Number(n), CellFormat::Achievement) => format_achievement(*n),
        (Value::Number(n), CellFormat::Rate | CellFormat::GoodRate | CellFormat::BadRate) => format_rate(*n),
        (v, _) => v.as_plain_string(),
    }
}

/// Highlight band of a numeric cell, for formats that carry one.
pub fn band(value: &Value, format: CellFormat) -> Option<RatioBand> {
    let Value::Number(n) = value else {
        return None;
    };
    if n.is_nan() {
        return None;
    }
    match format {
        CellFormat::GoodRate => Some(RatioBand::good_ratio(*n)),
        CellFormat::BadRate => Some(RatioBand::bad_ratio(*n)),
        CellFormat::Achievement => Some(RatioBand::achievement(*n)),
        _ => None,
    }
}

pub struct Column<R> {
    pub key: String,
    pub header: String,
    /// Header group such as "Recharge" or "Simpati".
    pub group: Option<String>,
    pub sortable: bool,
    pub filterable: bool,
    pub filter_kind: FilterKind,
    pub format: CellFormat,
    accessor: Box<dyn Fn(&R) -> Value>,
}

impl<R> Column<R> {
    pub fn new(key: &str, header: &str, accessor: impl Fn(&R) -> Value + 'static) -> Self {
        Column {
            key: key.to_string(),
            header: header.to_string(),
            group: None,
            sortable: true,
            filterable: false,
            filter_kind: FilterKind::Text,
            format: CellFormat::Plain,
            accessor: Box::new(accessor),
        }
    }

    /// Text dimension column with a substring filter.
    pub fn text(key: &str, header: &str, accessor: impl Fn(&R) -> &str + 'static) -> Self {
        Column::new(key, header, move |r| Value::text(accessor(r))).filter(FilterKind::Text)
    }

    /// Numeric column.
    pub fn number(key: &str, header: &str, accessor: impl Fn(&R) -> f64 + 'static) -> Self {
        Column::new(key, header, move |r| Value::Number(accessor(r)))
    }

    pub fn filter(mut self, kind: FilterKind) -> Self {
        self.filterable = true;
        self.filter_kind = kind;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn grouped(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn format(mut self, format: CellFormat) -> Self {
        self.format = format;
        self
    }

    pub fn value(&self, record: &R) -> Value {
        (self.accessor)(record)
    }

    /// Header used in exports, e.g. "Recharge FM-1".
    pub fn export_header(&self) -> String {
        match &self.group {
            Some(g) => format!("{} {}", g, self.header),
            None => self.header.clone(),
        }
    }

    /// Human-readable cell text.
    pub fn display(&self, record: &R) -> String {
        render(&self.value(record), self.format)
    }

    fn matches(&self, record: &R, needle_lower: &str) -> bool {
        let hay = self.value(record).as_plain_string().to_lowercase();
        match self.filter_kind {
            FilterKind::Select => hay == needle_lower,
            FilterKind::Text => hay.contains(needle_lower),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

/// Slice `items` into the 1-based `page` of size `page_size`.
///
/// Out-of-range pages (including page 0) and a zero page size return an
/// empty slice instead of failing.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total_count = items.len();
    if page_size == 0 {
        return Page { items: Vec::new(), page, total_pages: 0, total_count };
    }
    let total_pages = total_count.div_ceil(page_size);
    let slice = if page == 0 {
        &[][..]
    } else {
        let start = (page - 1).saturating_mul(page_size);
        let end = start.saturating_add(page_size).min(total_count);
        if start >= total_count { &[][..] } else { &items[start..end] }
    };
    Page {
        items: slice.to_vec(),
        page,
        total_pages,
        total_count,
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 10;

pub struct TableView<R> {
    columns: Vec<Column<R>>,
    sort: Option<SortState>,
    filters: BTreeMap<String, String>,
    page: usize,
    page_size: usize,
}

impl<R> TableView<R> {
    pub fn new(columns: Vec<Column<R>>, page_size: usize) -> Self {
        TableView {
            columns,
            sort: None,
            filters: BTreeMap::new(),
            page: 1,
            page_size,
        }
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column<R>> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Set (or clear, with an empty value) the filter on `key`. Always
    /// returns to page 1.
    pub fn set_filter(&mut self, key: &str, value: &str) -> Result<()> {
        if self.column(key).is_none() {
            return Err(ReportError::UnknownColumn(key.to_string()));
        }
        if value.is_empty() {
            self.filters.remove(key);
        } else {
            self.filters.insert(key.to_string(), value.to_string());
        }
        self.page = 1;
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    /// Sort by `key`; selecting the active key again flips the direction.
    pub fn set_sort(&mut self, key: &str) -> Result<()> {
        let column = self
            .column(key)
            .ok_or_else(|| ReportError::UnknownColumn(key.to_string()))?;
        if !column.sortable {
            return Err(ReportError::ColumnNotSortable(key.to_string()));
        }
        let direction = match &self.sort {
            Some(s) if s.key == key && s.direction == SortDirection::Asc => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        self.sort = Some(SortState { key: key.to_string(), direction });
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Filter then sort the full record set.
    pub fn apply_all<'a>(&self, records: &'a [R]) -> Vec<&'a R> {
        let active: Vec<(&Column<R>, String)> = self
            .filters
            .iter()
            .filter_map(|(k, v)| self.column(k).map(|c| (c, v.to_lowercase())))
            .collect();

        let mut rows: Vec<&'a R> = records
            .iter()
            .filter(|r| active.iter().all(|(c, needle)| c.matches(r, needle)))
            .collect();

        if let Some(sort) = &self.sort {
            if let Some(col) = self.column(&sort.key) {
                // `sort_by` is stable, so ties keep the filtered order.
                rows.sort_by(|a, b| {
                    let ord = col.value(a).compare(&col.value(b));
                    match sort.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                });
            }
        }
        debug!(
            total = records.len(),
            visible = rows.len(),
            filters = self.filters.len(),
            "table view applied"
        );
        rows
    }

    /// The current page of the filtered and sorted records.
    pub fn current_page<'a>(&self, records: &'a [R]) -> Page<&'a R> {
        paginate(&self.apply_all(records), self.page, self.page_size)
    }

    /// Dropdown options for every select-filter column, drawn from the
    /// whole unfiltered data set so the lists stay stable while filtering.
    pub fn unique_options(&self, records: &[R]) -> BTreeMap<String, BTreeSet<String>> {
        self.columns
            .iter()
            .filter(|c| c.filterable && c.filter_kind == FilterKind::Select)
            .map(|c| {
                let values = records.iter().map(|r| c.value(r).as_plain_string()).collect();
                (c.key.clone(), values)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Outlet {
        id: String,
        tap: String,
        amount: f64,
    }

    fn outlet(id: &str, tap: &str, amount: f64) -> Outlet {
        Outlet { id: id.to_string(), tap: tap.to_string(), amount }
    }

    fn view() -> TableView<Outlet> {
        TableView::new(
            vec![
                Column::text("id", "ID Outlet", |o: &Outlet| o.id.as_str()),
                Column::text("tap", "TAP", |o: &Outlet| o.tap.as_str()).filter(FilterKind::Select),
                Column::number("amount", "Amount", |o: &Outlet| o.amount),
                Column::new("note", "Note", |_o: &Outlet| Value::Empty).unsortable(),
            ],
            2,
        )
    }

    fn data() -> Vec<Outlet> {
        vec![
            outlet("OUT-10", "Pemuda", 30.0),
            outlet("OUT-2", "pemuda raya", 10.0),
            outlet("X-3", "Kuningan", 20.0),
        ]
    }

    fn ids(rows: &[&Outlet]) -> Vec<String> {
        rows.iter().map(|o| o.id.clone()).collect()
    }

    #[test]
    fn text_filter_is_case_insensitive_substring() {
        let mut v = view();
        v.set_filter("id", "out").unwrap();
        let d = data();
        assert_eq!(ids(&v.apply_all(&d)), vec!["OUT-10", "OUT-2"]);
    }

    #[test]
    fn select_filter_is_exact() {
        let mut v = view();
        v.set_filter("tap", "PEMUDA").unwrap();
        let d = data();
        assert_eq!(ids(&v.apply_all(&d)), vec!["OUT-10"]);
    }

    #[test]
    fn numbers_filter_on_their_plain_text() {
        let mut v = view();
        v.set_filter("amount", "3").unwrap();
        let d = data();
        assert_eq!(ids(&v.apply_all(&d)), vec!["OUT-10"]);
    }

    #[test]
    fn filters_combine_with_and() {
        let mut v = view();
        v.set_filter("id", "out").unwrap();
        v.set_filter("tap", "pemuda raya").unwrap();
        let d = data();
        assert_eq!(ids(&v.apply_all(&d)), vec!["OUT-2"]);
    }

    #[test]
    fn empty_filter_value_clears() {
        let mut v = view();
        v.set_filter("tap", "kuningan").unwrap();
        v.set_filter("tap", "").unwrap();
        assert!(v.filters().is_empty());
        assert_eq!(v.apply_all(&data()).len(), 3);
    }

    #[test]
    fn setting_a_filter_resets_page() {
        let mut v = view();
        v.set_page(3);
        v.set_filter("id", "x").unwrap();
        assert_eq!(v.page(), 1);
    }

    #[test]
    fn sort_toggles_direction() {
        let mut v = view();
        let d = data();
        v.set_sort("amount").unwrap();
        assert_eq!(ids(&v.apply_all(&d)), vec!["OUT-2", "X-3", "OUT-10"]);
        v.set_sort("amount").unwrap();
        assert_eq!(v.sort_state().unwrap().direction, SortDirection::Desc);
        assert_eq!(ids(&v.apply_all(&d)), vec!["OUT-10", "X-3", "OUT-2"]);
        v.set_sort("amount").unwrap();
        assert_eq!(v.sort_state().unwrap().direction, SortDirection::Asc);
        v.set_sort("id").unwrap();
        assert_eq!(v.sort_state().unwrap().direction, SortDirection::Asc);
        // byte order, not natural order
        assert_eq!(ids(&v.apply_all(&d)), vec!["OUT-10", "OUT-2", "X-3"]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut v = view();
        let d = vec![outlet("a", "T", 1.0), outlet("b", "T", 0.0), outlet("c", "T", 1.0)];
        v.set_sort("tap").unwrap();
        assert_eq!(ids(&v.apply_all(&d)), vec!["a", "b", "c"]);
        v.set_sort("tap").unwrap();
        assert_eq!(ids(&v.apply_all(&d)), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_and_unsortable_columns_are_errors() {
        let mut v = view();
        assert!(matches!(v.set_filter("nope", "x"), Err(ReportError::UnknownColumn(_))));
        assert!(matches!(v.set_sort("nope"), Err(ReportError::UnknownColumn(_))));
        assert!(matches!(v.set_sort("note"), Err(ReportError::ColumnNotSortable(_))));
    }

    #[test]
    fn mixed_values_have_a_fixed_order() {
        let mut vals = vec![Value::text("b"), Value::Number(2.0), Value::Empty, Value::Number(f64::INFINITY), Value::Number(-1.0)];
        vals.sort_by(|a, b| a.compare(b));
        assert_eq!(
            vals,
            vec![Value::Empty, Value::Number(-1.0), Value::Number(2.0), Value::Number(f64::INFINITY), Value::text("b")]
        );
    }

    #[test]
    fn nan_cells_sort_last_without_disturbing_other_rows() {
        let d: Vec<Outlet> = (0..200)
            .map(|i| {
                let amount = if i % 7 == 0 { f64::NAN } else { ((i * 37) % 101) as f64 };
                outlet(&format!("O{i}"), "T", amount)
            })
            .collect();
        let nan_count = d.iter().filter(|o| o.amount.is_nan()).count();

        let mut v = view();
        v.set_sort("amount").unwrap();
        let asc: Vec<f64> = v.apply_all(&d).iter().map(|o| o.amount).collect();
        assert_eq!(asc.len(), 200);
        let (numbers, nans) = asc.split_at(asc.len() - nan_count);
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
        assert!(nans.iter().all(|n| n.is_nan()));

        v.set_sort("amount").unwrap();
        let desc: Vec<f64> = v.apply_all(&d).iter().map(|o| o.amount).collect();
        let (nans, numbers) = desc.split_at(nan_count);
        assert!(nans.iter().all(|n| n.is_nan()));
        assert!(numbers.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn rate_formats_carry_bands() {
        assert_eq!(render(&Value::Number(0.8), CellFormat::BadRate), "80.0%");
        assert_eq!(band(&Value::Number(0.8), CellFormat::GoodRate), Some(RatioBand::Good));
        assert_eq!(band(&Value::Number(0.8), CellFormat::BadRate), Some(RatioBand::Poor));
        assert_eq!(band(&Value::Number(0.8), CellFormat::Rate), None);
        assert_eq!(band(&Value::text("N/A"), CellFormat::Achievement), None);
    }

    #[test]
    fn paginate_handles_out_of_range() {
        let items = vec![1, 2, 3, 4, 5];
        let p = paginate(&items, 3, 2);
        assert_eq!(p.items, vec![5]);
        assert_eq!(p.total_pages, 3);
        assert!(paginate(&items, 4, 2).items.is_empty());
        assert!(paginate(&items, 0, 2).items.is_empty());
        assert!(paginate(&items, usize::MAX, 2).items.is_empty());
        let zero = paginate(&items, 1, 0);
        assert!(zero.items.is_empty());
        assert_eq!(zero.total_pages, 0);
        let empty: Vec<i32> = Vec::new();
        assert_eq!(paginate(&empty, 1, 10).total_pages, 0);
    }

    #[test]
    fn unique_options_ignore_active_filters() {
        let mut v = view();
        v.set_filter("tap", "kuningan").unwrap();
        let opts = v.unique_options(&data());
        assert_eq!(opts.len(), 1);
        let taps: Vec<&String> = opts["tap"].iter().collect();
        assert_eq!(taps, vec!["Kuningan", "Pemuda", "pemuda raya"]);
    }

    #[test]
    fn current_page_uses_view_state() {
        let mut v = view();
        v.set_sort("amount").unwrap();
        v.set_page(2);
        let d = data();
        let page = v.current_page(&d);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "OUT-10");
    }

    #[test]
    fn display_uses_cell_format() {
        let growth = Column::number("g", "Growth", |o: &Outlet| o.amount).format(CellFormat::Growth);
        assert_eq!(growth.display(&outlet("a", "t", f64::INFINITY)), "New ▲");
        let plain = Column::number("n", "N", |o: &Outlet| o.amount);
        assert_eq!(plain.display(&outlet("a", "t", 12.0)), "12");
        assert_eq!(plain.display(&outlet("a", "t", 1.5)), "1.5");
        let grouped = Column::number("m", "FM-1", |o: &Outlet| o.amount).grouped("Recharge");
        assert_eq!(grouped.export_header(), "Recharge FM-1");
    }
}
