//! Aggregation over a filtered view.
//!
//! Every function here is total: an empty view produces empty row sets or
//! zeroed summaries, never an error. Grouping preserves first-seen order and
//! value sorts are stable, so equal totals keep a deterministic order.

use crate::types::{
    CityRankingRow, CityWeekdayRow, EfficiencyRow, GroupSummaryRow, Record, SaleRow, SummaryStats,
    WeekTotalRow, Weekday, WeekdayTotalRow,
};
use crate::util::{format_number, format_opt, mean_opt, ratio};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const TOP_CITIES: usize = 10;
pub const BOTTOM_CITIES: usize = 20;
pub const TOP_SALES: usize = 10;

#[derive(Debug, Default, Clone)]
struct GroupSums {
    count: usize,
    invoices: u64,
    items: u64,
    weight: f64,
    value: f64,
}

impl GroupSums {
    fn add(&mut self, r: &Record) {
        self.count += 1;
        self.invoices += u64::from(r.invoices);
        self.items += u64::from(r.items);
        self.weight += r.weight;
        self.value += r.value;
    }
}

/// Group the view by a string key, keeping groups in first-seen order.
fn group_sums<'a, F>(view: &[&'a Record], key_fn: F) -> Vec<(String, GroupSums)>
where
    F: Fn(&Record) -> &str,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, GroupSums)> = Vec::new();
    for r in view {
        let key = key_fn(r);
        let slot = match index.get(key) {
            Some(&i) => i,
            None => {
                index.insert(key.to_string(), groups.len());
                groups.push((key.to_string(), GroupSums::default()));
                groups.len() - 1
            }
        };
        groups[slot].1.add(r);
    }
    groups
}

/// Total value per city, sorted descending. The sort is stable, so cities
/// with equal totals stay in first-seen order.
pub fn city_value_totals(view: &[&Record]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = group_sums(view, |r| &r.city)
        .into_iter()
        .map(|(city, sums)| (city, sums.value))
        .collect();
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    totals
}

/// Head and tail of the descending city ranking: the best `top_n` sellers
/// and the worst `bottom_m`, both still in descending order.
pub fn top_bottom_cities(
    view: &[&Record],
    top_n: usize,
    bottom_m: usize,
) -> (Vec<(String, f64)>, Vec<(String, f64)>) {
    let totals = city_value_totals(view);
    let top: Vec<(String, f64)> = totals.iter().take(top_n).cloned().collect();
    let tail_start = totals.len().saturating_sub(bottom_m);
    let bottom: Vec<(String, f64)> = totals[tail_start..].to_vec();
    (top, bottom)
}

pub fn city_ranking_rows(totals: &[(String, f64)]) -> Vec<CityRankingRow> {
    totals
        .iter()
        .enumerate()
        .map(|(idx, (city, value))| CityRankingRow {
            rank: idx + 1,
            city: city.clone(),
            total_value: format_number(*value, 2),
        })
        .collect()
}

fn summary_rows(groups: Vec<(String, GroupSums)>) -> Vec<GroupSummaryRow> {
    let mut rows: Vec<GroupSummaryRow> = groups
        .into_iter()
        .map(|(key, s)| {
            let n = s.count as f64;
            GroupSummaryRow {
                key,
                total_invoices: format_number(s.invoices as f64, 0),
                avg_invoices: format_number(s.invoices as f64 / n, 2),
                total_value: format_number(s.value, 2),
                avg_value: format_number(s.value / n, 2),
                total_items: format_number(s.items as f64, 0),
                avg_items: format_number(s.items as f64 / n, 2),
                total_weight: format_number(s.weight, 2),
                avg_weight: format_number(s.weight / n, 2),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}

/// Per-city sums and means of invoices, value, items and weight.
pub fn city_summary(view: &[&Record]) -> Vec<GroupSummaryRow> {
    summary_rows(group_sums(view, |r| &r.city))
}

/// Per-route sums and means of invoices, value, items and weight.
pub fn route_summary(view: &[&Record]) -> Vec<GroupSummaryRow> {
    summary_rows(group_sums(view, |r| &r.route))
}

fn efficiency_rows(groups: Vec<(String, GroupSums)>) -> Vec<EfficiencyRow> {
    let mut rows: Vec<EfficiencyRow> = groups
        .into_iter()
        .map(|(key, s)| EfficiencyRow {
            key,
            total_value: format_number(s.value, 2),
            value_per_invoice: format_opt(ratio(s.value, s.invoices as f64), 2),
            value_per_item: format_opt(ratio(s.value, s.items as f64), 2),
            value_per_kg: format_opt(ratio(s.value, s.weight), 2),
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}

pub fn city_efficiency(view: &[&Record]) -> Vec<EfficiencyRow> {
    efficiency_rows(group_sums(view, |r| &r.city))
}

pub fn route_efficiency(view: &[&Record]) -> Vec<EfficiencyRow> {
    efficiency_rows(group_sums(view, |r| &r.route))
}

/// Total value per weekday in canonical Monday-to-Sunday order. Weekdays
/// absent from the view are omitted, not zero-filled.
pub fn weekday_totals(view: &[&Record]) -> Vec<(Weekday, f64)> {
    let mut totals: BTreeMap<Weekday, f64> = BTreeMap::new();
    for r in view {
        *totals.entry(r.weekday).or_insert(0.0) += r.value;
    }
    totals.into_iter().collect()
}

pub fn weekday_total_rows(totals: &[(Weekday, f64)]) -> Vec<WeekdayTotalRow> {
    totals
        .iter()
        .map(|(day, value)| WeekdayTotalRow {
            weekday: day.name().to_string(),
            total_value: format_number(*value, 2),
        })
        .collect()
}

/// Total value per week number, ascending.
pub fn weekly_totals(view: &[&Record]) -> Vec<(u32, f64)> {
    let mut totals: BTreeMap<u32, f64> = BTreeMap::new();
    for r in view {
        *totals.entry(r.week).or_insert(0.0) += r.value;
    }
    totals.into_iter().collect()
}

pub fn weekly_total_rows(totals: &[(u32, f64)]) -> Vec<WeekTotalRow> {
    totals
        .iter()
        .map(|(week, value)| WeekTotalRow {
            week: *week,
            total_value: format_number(*value, 2),
        })
        .collect()
}

/// Value summed per (city, weekday) cell for the given cities, zero-filled.
/// This feeds the heatmap, which wants a dense grid.
pub fn city_weekday_matrix(view: &[&Record], cities: &[String]) -> Vec<CityWeekdayRow> {
    let mut cells: HashMap<(&str, Weekday), f64> = HashMap::new();
    for r in view {
        *cells.entry((r.city.as_str(), r.weekday)).or_insert(0.0) += r.value;
    }
    let cell = |city: &str, day: Weekday| {
        format_number(cells.get(&(city, day)).copied().unwrap_or(0.0), 2)
    };
    cities
        .iter()
        .map(|city| CityWeekdayRow {
            city: city.clone(),
            segunda: cell(city, Weekday::Segunda),
            terca: cell(city, Weekday::Terca),
            quarta: cell(city, Weekday::Quarta),
            quinta: cell(city, Weekday::Quinta),
            sexta: cell(city, Weekday::Sexta),
            sabado: cell(city, Weekday::Sabado),
            domingo: cell(city, Weekday::Domingo),
        })
        .collect()
}

/// The `n` largest individual sales in the view, by value, descending.
pub fn top_sales(view: &[&Record], n: usize) -> Vec<SaleRow> {
    let mut sorted: Vec<&&Record> = view.iter().collect();
    sorted.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    sorted
        .into_iter()
        .take(n)
        .map(|r| SaleRow {
            route: r.route.clone(),
            city: r.city.clone(),
            weekday: r.weekday.name().to_string(),
            value: format_number(r.value, 2),
            invoices: r.invoices,
            items: r.items,
            weight: format_number(r.weight, 2),
        })
        .collect()
}

/// Headline metrics over the view. Averages of the derived ratios skip
/// records where the ratio is undefined.
pub fn summary_stats(view: &[&Record]) -> SummaryStats {
    let cities: HashSet<&str> = view.iter().map(|r| r.city.as_str()).collect();
    let routes: HashSet<&str> = view.iter().map(|r| r.route.as_str()).collect();
    SummaryStats {
        records: view.len(),
        total_value: view.iter().map(|r| r.value).sum(),
        total_invoices: view.iter().map(|r| u64::from(r.invoices)).sum(),
        total_items: view.iter().map(|r| u64::from(r.items)).sum(),
        total_weight: view.iter().map(|r| r.weight).sum(),
        avg_value_per_invoice: mean_opt(view.iter().map(|r| r.value_per_invoice)),
        avg_value_per_item: mean_opt(view.iter().map(|r| r.value_per_item)),
        avg_weight_per_item: mean_opt(view.iter().map(|r| r.weight_per_item)),
        distinct_cities: cities.len(),
        distinct_routes: routes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(route: &str, city: &str, weekday: Weekday, week: u32, value: f64) -> Record {
        let items = 2u32;
        let invoices = 1u32;
        Record {
            route: route.to_string(),
            route_code: 7,
            city: city.to_string(),
            weekday,
            month: 1,
            week,
            invoices,
            items,
            weight: 4.0,
            value,
            value_per_item: ratio(value, items as f64),
            weight_per_item: ratio(4.0, items as f64),
            value_per_invoice: ratio(value, invoices as f64),
        }
    }

    fn view(data: &[Record]) -> Vec<&Record> {
        data.iter().collect()
    }

    #[test]
    fn per_city_totals_partition_the_global_total() {
        let data = vec![
            record("R1", "A", Weekday::Segunda, 1, 10.0),
            record("R1", "B", Weekday::Terca, 1, 20.0),
            record("R2", "A", Weekday::Quarta, 2, 30.0),
        ];
        let v = view(&data);
        let per_city: f64 = city_value_totals(&v).iter().map(|(_, t)| t).sum();
        let global: f64 = summary_stats(&v).total_value;
        assert!((per_city - global).abs() < 1e-9);
    }

    #[test]
    fn top_and_bottom_follow_the_descending_ranking() {
        // City A sells [10, 20, 30], city B sells [5].
        let data = vec![
            record("R1", "A", Weekday::Segunda, 1, 10.0),
            record("R1", "A", Weekday::Terca, 1, 20.0),
            record("R1", "A", Weekday::Quarta, 1, 30.0),
            record("R1", "B", Weekday::Quinta, 1, 5.0),
        ];
        let v = view(&data);
        let (top, bottom) = top_bottom_cities(&v, 1, 1);
        assert_eq!(top, vec![("A".to_string(), 60.0)]);
        assert_eq!(bottom, vec![("B".to_string(), 5.0)]);
    }

    #[test]
    fn top_and_bottom_are_disjoint_when_they_fit() {
        let data = vec![
            record("R1", "A", Weekday::Segunda, 1, 30.0),
            record("R1", "B", Weekday::Segunda, 1, 20.0),
            record("R1", "C", Weekday::Segunda, 1, 10.0),
            record("R1", "D", Weekday::Segunda, 1, 5.0),
        ];
        let v = view(&data);
        let (top, bottom) = top_bottom_cities(&v, 2, 2);
        let top_names: Vec<&str> = top.iter().map(|(c, _)| c.as_str()).collect();
        let bottom_names: Vec<&str> = bottom.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(top_names, vec!["A", "B"]);
        assert_eq!(bottom_names, vec!["C", "D"]);
        assert!(top_names.iter().all(|c| !bottom_names.contains(c)));
        let union_value: f64 = top.iter().chain(bottom.iter()).map(|(_, t)| t).sum();
        assert!(union_value <= summary_stats(&v).total_value + 1e-9);
    }

    #[test]
    fn equal_totals_keep_first_seen_order() {
        let data = vec![
            record("R1", "X", Weekday::Segunda, 1, 10.0),
            record("R1", "Y", Weekday::Segunda, 1, 10.0),
            record("R1", "Z", Weekday::Segunda, 1, 10.0),
        ];
        let v = view(&data);
        let totals = city_value_totals(&v);
        let names: Vec<&str> = totals.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn weekday_totals_follow_week_order_and_omit_absent_days() {
        // Input deliberately out of week order, with no Wednesday at all.
        let data = vec![
            record("R1", "A", Weekday::Domingo, 1, 1.0),
            record("R1", "A", Weekday::Segunda, 1, 2.0),
            record("R1", "A", Weekday::Sexta, 1, 3.0),
            record("R1", "A", Weekday::Segunda, 1, 4.0),
        ];
        let v = view(&data);
        let totals = weekday_totals(&v);
        let days: Vec<Weekday> = totals.iter().map(|(d, _)| *d).collect();
        assert_eq!(days, vec![Weekday::Segunda, Weekday::Sexta, Weekday::Domingo]);
        assert_eq!(totals[0].1, 6.0);
    }

    #[test]
    fn weekly_totals_are_ascending_by_week() {
        let data = vec![
            record("R1", "A", Weekday::Segunda, 3, 1.0),
            record("R1", "A", Weekday::Segunda, 1, 2.0),
            record("R1", "A", Weekday::Segunda, 3, 4.0),
        ];
        let v = view(&data);
        assert_eq!(weekly_totals(&v), vec![(1, 2.0), (3, 5.0)]);
    }

    #[test]
    fn city_summary_means_and_sums() {
        let data = vec![
            record("R1", "A", Weekday::Segunda, 1, 10.0),
            record("R1", "A", Weekday::Terca, 1, 30.0),
        ];
        let v = view(&data);
        let rows = city_summary(&v);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_value, "40.00");
        assert_eq!(rows[0].avg_value, "20.00");
        assert_eq!(rows[0].total_invoices, "2");
        assert_eq!(rows[0].avg_invoices, "1.00");
    }

    #[test]
    fn undefined_ratios_are_excluded_from_averages() {
        let mut zero_items = record("R1", "A", Weekday::Segunda, 1, 50.0);
        zero_items.items = 0;
        zero_items.value_per_item = None;
        zero_items.weight_per_item = None;
        let data = vec![zero_items, record("R1", "A", Weekday::Terca, 1, 10.0)];
        let v = view(&data);
        let stats = summary_stats(&v);
        // Only the second record has a defined value-per-item (10 / 2).
        assert_eq!(stats.avg_value_per_item, Some(5.0));
    }

    #[test]
    fn efficiency_marks_zero_denominators_as_na() {
        let mut r = record("R1", "A", Weekday::Segunda, 1, 50.0);
        r.items = 0;
        r.weight = 0.0;
        let data = vec![r];
        let v = view(&data);
        let rows = city_efficiency(&v);
        assert_eq!(rows[0].value_per_item, "n/a");
        assert_eq!(rows[0].value_per_kg, "n/a");
        assert_eq!(rows[0].value_per_invoice, "50.00");
    }

    #[test]
    fn matrix_zero_fills_missing_cells() {
        let data = vec![
            record("R1", "A", Weekday::Segunda, 1, 10.0),
            record("R1", "B", Weekday::Domingo, 1, 7.0),
        ];
        let v = view(&data);
        let rows = city_weekday_matrix(&v, &["A".to_string(), "B".to_string()]);
        assert_eq!(rows[0].segunda, "10.00");
        assert_eq!(rows[0].domingo, "0.00");
        assert_eq!(rows[1].domingo, "7.00");
    }

    #[test]
    fn top_sales_are_individual_records_in_descending_order() {
        let data = vec![
            record("R1", "A", Weekday::Segunda, 1, 10.0),
            record("R2", "B", Weekday::Terca, 1, 99.0),
            record("R1", "C", Weekday::Quarta, 1, 50.0),
        ];
        let v = view(&data);
        let rows = top_sales(&v, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "B");
        assert_eq!(rows[1].city, "C");
    }

    #[test]
    fn empty_view_produces_empty_results_everywhere() {
        let v: Vec<&Record> = Vec::new();
        assert!(city_value_totals(&v).is_empty());
        assert!(city_summary(&v).is_empty());
        assert!(route_efficiency(&v).is_empty());
        assert!(weekday_totals(&v).is_empty());
        assert!(weekly_totals(&v).is_empty());
        assert!(top_sales(&v, 10).is_empty());
        let stats = summary_stats(&v);
        assert_eq!(stats.records, 0);
        assert_eq!(stats.total_value, 0.0);
        assert_eq!(stats.avg_value_per_item, None);
    }
}
