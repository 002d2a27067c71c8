//! Filter selection and view construction.
//!
//! A selection never mutates the dataset; applying it yields a borrowed
//! view, and re-applying the same selection yields the same view.

use crate::types::{Record, Weekday};
use std::collections::BTreeSet;

/// The user-chosen predicate: one route (or all), a set of weekdays and a
/// set of months. Empty sets match nothing, which is a valid, empty view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    /// `None` means "all routes".
    pub route: Option<String>,
    pub weekdays: BTreeSet<Weekday>,
    pub months: BTreeSet<u32>,
}

impl FilterSelection {
    /// The identity selection for a dataset: all routes, every weekday and
    /// month present in the data. Matches the widget defaults of the
    /// display layer.
    pub fn all_of(data: &[Record]) -> Self {
        FilterSelection {
            route: None,
            weekdays: data.iter().map(|r| r.weekday).collect(),
            months: data.iter().map(|r| r.month).collect(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let route_ok = match &self.route {
            Some(route) => record.route == *route,
            None => true,
        };
        route_ok && self.weekdays.contains(&record.weekday) && self.months.contains(&record.month)
    }
}

/// Apply a selection to the dataset, producing a view of borrowed records
/// in the dataset's original order.
pub fn apply<'a>(data: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    data.iter().filter(|r| selection.matches(r)).collect()
}

/// Distinct route names, sorted, for the selection prompt.
pub fn routes(data: &[Record]) -> Vec<String> {
    let set: BTreeSet<&str> = data.iter().map(|r| r.route.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(route: &str, city: &str, weekday: Weekday, month: u32, value: f64) -> Record {
        Record {
            route: route.to_string(),
            route_code: 1,
            city: city.to_string(),
            weekday,
            month,
            week: 1,
            invoices: 1,
            items: 1,
            weight: 1.0,
            value,
            value_per_item: Some(value),
            weight_per_item: Some(1.0),
            value_per_invoice: Some(value),
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("ROTA 1", "AMPERE", Weekday::Segunda, 1, 10.0),
            record("ROTA 1", "AMPERE", Weekday::Terca, 2, 20.0),
            record("ROTA 2", "REALEZA", Weekday::Sexta, 1, 30.0),
        ]
    }

    #[test]
    fn identity_selection_returns_everything() {
        let data = sample();
        let view = apply(&data, &FilterSelection::all_of(&data));
        assert_eq!(view.len(), data.len());
    }

    #[test]
    fn empty_weekday_set_yields_empty_view() {
        let data = sample();
        let mut sel = FilterSelection::all_of(&data);
        sel.weekdays.clear();
        assert!(apply(&data, &sel).is_empty());
    }

    #[test]
    fn empty_month_set_yields_empty_view() {
        let data = sample();
        let mut sel = FilterSelection::all_of(&data);
        sel.months.clear();
        assert!(apply(&data, &sel).is_empty());
    }

    #[test]
    fn route_selection_narrows_the_view() {
        let data = sample();
        let mut sel = FilterSelection::all_of(&data);
        sel.route = Some("ROTA 2".to_string());
        let view = apply(&data, &sel);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].city, "REALEZA");
    }

    #[test]
    fn filters_compose_with_and_semantics() {
        let data = sample();
        let mut sel = FilterSelection::all_of(&data);
        sel.route = Some("ROTA 1".to_string());
        sel.months = BTreeSet::from([2]);
        let view = apply(&data, &sel);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].value, 20.0);
    }

    #[test]
    fn apply_is_idempotent_and_side_effect_free() {
        let data = sample();
        let sel = FilterSelection::all_of(&data);
        let first: Vec<f64> = apply(&data, &sel).iter().map(|r| r.value).collect();
        let second: Vec<f64> = apply(&data, &sel).iter().map(|r| r.value).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn routes_are_distinct_and_sorted() {
        let data = sample();
        assert_eq!(routes(&data), vec!["ROTA 1".to_string(), "ROTA 2".to_string()]);
    }
}
