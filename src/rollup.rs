// Hierarchical group-by with subtotals and a grand total.
//
// Groups are kept in `BTreeMap`s so iteration order is ascending byte order
// of the key, regardless of the input order. Every level (detail rows,
// subtotals, grand total) is aggregated from the raw records that belong to
// it; rows are never summed from already-aggregated child rows.
use crate::metrics::{achievement, growth, rate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

pub const UNKNOWN_KEY: &str = "Unknown";
pub const DEFAULT_GRAND_TOTAL_LABEL: &str = "TOTAL CLUSTER";

/// One grouping level, e.g. TAP or Salesforce.
pub struct Dimension<R> {
    pub name: String,
    accessor: Box<dyn Fn(&R) -> Option<String>>,
}

impl<R> Dimension<R> {
    pub fn new(name: impl Into<String>, accessor: impl Fn(&R) -> Option<String> + 'static) -> Self {
        Dimension {
            name: name.into(),
            accessor: Box::new(accessor),
        }
    }

    /// Bucket key for a record. Missing or blank values land in `Unknown`.
    pub fn key_of(&self, record: &R) -> String {
        match (self.accessor)(record) {
            Some(v) if !v.trim().is_empty() => v,
            _ => UNKNOWN_KEY.to_string(),
        }
    }
}

pub enum Aggregate<R> {
    /// Plain summation of a numeric field.
    Sum(Box<dyn Fn(&R) -> f64>),
    /// Number of records whose field is strictly positive ("active").
    CountPositive(Box<dyn Fn(&R) -> f64>),
    /// Number of distinct keys, e.g. unique outlet ids.
    CountDistinct(Box<dyn Fn(&R) -> String>),
    /// Number of records in the group.
    CountRows,
}

pub struct Measure<R> {
    pub name: String,
    pub aggregate: Aggregate<R>,
}

impl<R> Measure<R> {
    pub fn sum(name: impl Into<String>, f: impl Fn(&R) -> f64 + 'static) -> Self {
        Measure {
            name: name.into(),
            aggregate: Aggregate::Sum(Box::new(f)),
        }
    }

    pub fn count_positive(name: impl Into<String>, f: impl Fn(&R) -> f64 + 'static) -> Self {
        Measure {
            name: name.into(),
            aggregate: Aggregate::CountPositive(Box::new(f)),
        }
    }

    pub fn count_distinct(name: impl Into<String>, f: impl Fn(&R) -> String + 'static) -> Self {
        Measure {
            name: name.into(),
            aggregate: Aggregate::CountDistinct(Box::new(f)),
        }
    }

    pub fn count_rows(name: impl Into<String>) -> Self {
        Measure {
            name: name.into(),
            aggregate: Aggregate::CountRows,
        }
    }

    fn evaluate(&self, members: &[&R]) -> f64 {
        match &self.aggregate {
            Aggregate::Sum(f) => members.iter().map(|r| f(*r)).sum(),
            Aggregate::CountPositive(f) => members.iter().filter(|r| f(**r) > 0.0).count() as f64,
            Aggregate::CountDistinct(f) => {
                members.iter().map(|r| f(*r)).collect::<HashSet<_>>().len() as f64
            }
            Aggregate::CountRows => members.len() as f64,
        }
    }
}

/// Field computed from already-aggregated measures of the same row.
#[derive(Debug, Clone)]
pub enum DerivedField {
    /// `growth(current, previous)`; infinite when the baseline is zero.
    Growth { name: String, current: String, previous: String },
    /// `achievement(current, target)`; infinite when the target is zero.
    Achievement { name: String, current: String, target: String },
    /// `rate(numerator, denominator)`; zero when the denominator is zero.
    Rate { name: String, numerator: String, denominator: String },
}

impl DerivedField {
    pub fn growth(name: &str, current: &str, previous: &str) -> Self {
        DerivedField::Growth {
            name: name.to_string(),
            current: current.to_string(),
            previous: previous.to_string(),
        }
    }

    pub fn achievement(name: &str, current: &str, target: &str) -> Self {
        DerivedField::Achievement {
            name: name.to_string(),
            current: current.to_string(),
            target: target.to_string(),
        }
    }

    pub fn rate(name: &str, numerator: &str, denominator: &str) -> Self {
        DerivedField::Rate {
            name: name.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DerivedField::Growth { name, .. }
            | DerivedField::Achievement { name, .. }
            | DerivedField::Rate { name, .. } => name,
        }
    }

    fn evaluate(&self, values: &BTreeMap<String, f64>) -> f64 {
        let get = |k: &str| values.get(k).copied().unwrap_or(0.0);
        match self {
            DerivedField::Growth { current, previous, .. } => growth(get(current), get(previous)),
            DerivedField::Achievement { current, target, .. } => achievement(get(current), get(target)),
            DerivedField::Rate { numerator, denominator, .. } => rate(get(numerator), get(denominator)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Detail,
    Subtotal,
    GrandTotal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub kind: RowKind,
    /// Group key path from the outermost dimension down to this row.
    pub keys: Vec<String>,
    pub label: String,
    pub record_count: usize,
    pub values: BTreeMap<String, f64>,
}

impl SummaryRow {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn outer_key(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }
}

pub struct RollupSpec<R> {
    dimensions: Vec<Dimension<R>>,
    measures: Vec<Measure<R>>,
    derived: Vec<DerivedField>,
    grand_total_label: String,
}

impl<R> RollupSpec<R> {
    pub fn new(dimensions: Vec<Dimension<R>>) -> Self {
        RollupSpec {
            dimensions,
            measures: Vec::new(),
            derived: Vec::new(),
            grand_total_label: DEFAULT_GRAND_TOTAL_LABEL.to_string(),
        }
    }

    pub fn measure(mut self, measure: Measure<R>) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn derived(mut self, field: DerivedField) -> Self {
        self.derived.push(field);
        self
    }

    pub fn grand_total_label(mut self, label: impl Into<String>) -> Self {
        self.grand_total_label = label.into();
        self
    }

    /// Measure and derived field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.measures
            .iter()
            .map(|m| m.name.as_str())
            .chain(self.derived.iter().map(DerivedField::name))
            .collect()
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Produce the ordered summary rows for `records`.
    ///
    /// An empty record set produces no rows at all (not even a grand total).
    pub fn rollup(&self, records: &[R]) -> Vec<SummaryRow> {
        if records.is_empty() {
            return Vec::new();
        }
        let all: Vec<&R> = records.iter().collect();
        let mut rows = Vec::new();
        if !self.dimensions.is_empty() {
            let mut path = Vec::new();
            self.emit_level(&all, 0, &mut path, &mut rows);
        }
        rows.push(self.summarize(RowKind::GrandTotal, Vec::new(), self.grand_total_label.clone(), &all));
        debug!(
            records = records.len(),
            rows = rows.len(),
            dimensions = ?self.dimension_names(),
            "rollup complete"
        );
        rows
    }

    /// Group `records` by a single dimension, without subtotals.
    pub fn group<'a>(&self, depth: usize, records: &[&'a R]) -> BTreeMap<String, Vec<&'a R>> {
        let mut groups: BTreeMap<String, Vec<&'a R>> = BTreeMap::new();
        let Some(dim) = self.dimensions.get(depth) else {
            return groups;
        };
        for r in records.iter().copied() {
            groups.entry(dim.key_of(r)).or_default().push(r);
        }
        groups
    }

    fn emit_level(&self, members: &[&R], depth: usize, path: &mut Vec<String>, out: &mut Vec<SummaryRow>) {
        let innermost = depth + 1 == self.dimensions.len();
        for (key, group) in self.group(depth, members) {
            path.push(key.clone());
            if innermost {
                out.push(self.summarize(RowKind::Detail, path.clone(), key, &group));
            } else {
                self.emit_level(&group, depth + 1, path, out);
                let label = format!("TOTAL {}", key.to_uppercase());
                out.push(self.summarize(RowKind::Subtotal, path.clone(), label, &group));
            }
            path.pop();
        }
    }

    fn summarize(&self, kind: RowKind, keys: Vec<String>, label: String, members: &[&R]) -> SummaryRow {
        let mut values = BTreeMap::new();
        for m in &self.measures {
            values.insert(m.name.clone(), m.evaluate(members));
        }
        for d in &self.derived {
            let v = d.evaluate(&values);
            values.insert(d.name().to_string(), v);
        }
        SummaryRow {
            kind,
            keys,
            label,
            record_count: members.len(),
            values,
        }
    }
}

/// Hide the nested rows of collapsed outer groups.
///
/// Subtotals and the grand total stay visible so a collapsed group still
/// shows its totals.
pub fn collapse(rows: &[SummaryRow], collapsed: &BTreeSet<String>) -> Vec<SummaryRow> {
    rows.iter()
        .filter(|row| match row.kind {
            RowKind::GrandTotal => true,
            RowKind::Subtotal if row.keys.len() == 1 => true,
            _ => row.outer_key().map_or(true, |k| !collapsed.contains(k)),
        })
        .cloned()
        .collect()
}

/// Outer group keys in display order, used to drive expand/collapse-all.
pub fn outer_keys(rows: &[SummaryRow]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for row in rows {
        if let Some(k) = row.outer_key() {
            if keys.last().map(String::as_str) != Some(k) {
                keys.push(k.to_string());
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        tap: Option<&'static str>,
        sf: &'static str,
        outlet: &'static str,
        current: f64,
        previous: f64,
    }

    fn row(tap: Option<&'static str>, sf: &'static str, outlet: &'static str, current: f64, previous: f64) -> Row {
        Row { tap, sf, outlet, current, previous }
    }

    fn spec() -> RollupSpec<Row> {
        RollupSpec::new(vec![
            Dimension::new("tap", |r: &Row| r.tap.map(str::to_string)),
            Dimension::new("salesforce", |r: &Row| Some(r.sf.to_string())),
        ])
        .measure(Measure::count_rows("pjp"))
        .measure(Measure::count_distinct("outlets", |r: &Row| r.outlet.to_string()))
        .measure(Measure::count_positive("oa_m", |r: &Row| r.current))
        .measure(Measure::sum("m", |r: &Row| r.current))
        .measure(Measure::sum("m1", |r: &Row| r.previous))
        .derived(DerivedField::growth("growth", "m", "m1"))
        .derived(DerivedField::rate("oa_rate", "oa_m", "pjp"))
    }

    #[test]
    fn groups_are_sorted_regardless_of_input_order() {
        let data = vec![
            row(Some("b"), "y", "1", 1.0, 1.0),
            row(Some("a"), "z", "2", 1.0, 1.0),
            row(Some("B"), "x", "3", 1.0, 1.0),
            row(Some("a"), "w", "4", 1.0, 1.0),
        ];
        let labels: Vec<String> = spec().rollup(&data).into_iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec!["x", "TOTAL B", "w", "z", "TOTAL A", "y", "TOTAL B", "TOTAL CLUSTER"]
        );
    }

    #[test]
    fn missing_keys_go_to_unknown() {
        let data = vec![
            row(None, "a", "1", 1.0, 0.0),
            row(Some("  "), "b", "2", 1.0, 0.0),
            row(Some("T"), "", "3", 1.0, 0.0),
        ];
        let rows = spec().rollup(&data);
        let unknown = rows
            .iter()
            .find(|r| r.kind == RowKind::Subtotal && r.keys[0] == UNKNOWN_KEY)
            .unwrap();
        assert_eq!(unknown.record_count, 2);
        assert!(rows.iter().any(|r| r.keys == vec!["T".to_string(), UNKNOWN_KEY.to_string()]));

        let detail_total: usize = rows
            .iter()
            .filter(|r| r.kind == RowKind::Detail)
            .map(|r| r.record_count)
            .sum();
        assert_eq!(detail_total, data.len());
    }

    #[test]
    fn active_counts_are_recomputed_per_level() {
        // The same outlet listed under two salesforces must count once at TAP level.
        let data = vec![
            row(Some("T"), "a", "o1", 5.0, 0.0),
            row(Some("T"), "b", "o1", 0.0, 0.0),
            row(Some("T"), "b", "o2", 3.0, 0.0),
        ];
        let rows = spec().rollup(&data);
        let subtotal = rows.iter().find(|r| r.kind == RowKind::Subtotal).unwrap();
        assert_eq!(subtotal.value("outlets"), Some(2.0));
        assert_eq!(subtotal.value("oa_m"), Some(2.0));
        assert_eq!(subtotal.value("oa_rate"), Some(2.0 / 3.0));
        assert_eq!(subtotal.value("growth"), Some(f64::INFINITY));
    }

    #[test]
    fn rate_is_zero_without_denominator() {
        let spec = RollupSpec::new(vec![Dimension::new("tap", |r: &Row| r.tap.map(str::to_string))])
            .measure(Measure::sum("m", |r: &Row| r.current))
            .measure(Measure::sum("none", |_r: &Row| 0.0))
            .derived(DerivedField::rate("r", "m", "none"))
            .derived(DerivedField::achievement("achv", "m", "none"));
        let rows = spec.rollup(&[row(Some("T"), "a", "1", 4.0, 0.0)]);
        assert_eq!(rows[0].value("r"), Some(0.0));
        assert_eq!(rows[0].value("achv"), Some(f64::INFINITY));
    }

    #[test]
    fn single_dimension_has_no_subtotals() {
        let spec = RollupSpec::new(vec![Dimension::new("tap", |r: &Row| r.tap.map(str::to_string))])
            .measure(Measure::sum("m", |r: &Row| r.current))
            .grand_total_label("GRAND");
        let rows = spec.rollup(&[row(Some("b"), "a", "1", 1.0, 0.0), row(Some("a"), "a", "2", 2.0, 0.0)]);
        let kinds: Vec<RowKind> = rows.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RowKind::Detail, RowKind::Detail, RowKind::GrandTotal]);
        assert_eq!(rows[2].label, "GRAND");
        assert_eq!(rows[2].value("m"), Some(3.0));
    }

    #[test]
    fn empty_input_produces_nothing() {
        assert!(spec().rollup(&[]).is_empty());
    }

    #[test]
    fn collapse_keeps_totals() {
        let data = vec![
            row(Some("A"), "x", "1", 1.0, 1.0),
            row(Some("B"), "y", "2", 1.0, 1.0),
        ];
        let rows = spec().rollup(&data);
        assert_eq!(outer_keys(&rows), vec!["A".to_string(), "B".to_string()]);

        let collapsed: BTreeSet<String> = ["A".to_string()].into_iter().collect();
        let labels: Vec<String> = collapse(&rows, &collapsed).into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["TOTAL A", "y", "TOTAL B", "TOTAL CLUSTER"]);
    }

    #[test]
    fn field_names_follow_declaration_order() {
        assert_eq!(
            spec().field_names(),
            vec!["pjp", "outlets", "oa_m", "m", "m1", "growth", "oa_rate"]
        );
    }
}
