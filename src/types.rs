use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "ROTA")]
    pub route: Option<String>,
    #[serde(rename = "COD_ROTA")]
    pub route_code: Option<String>,
    #[serde(rename = "CIDADE")]
    pub city: Option<String>,
    #[serde(rename = "DIA_SEMANA")]
    pub weekday: Option<String>,
    #[serde(rename = "MES")]
    pub month: Option<String>,
    #[serde(rename = "SEMANA")]
    pub week: Option<String>,
    #[serde(rename = "QUANTIDADE_NF")]
    pub invoices: Option<String>,
    #[serde(rename = "QUDE_ITENS")]
    pub items: Option<String>,
    #[serde(rename = "PESO_TOTAL")]
    pub weight: Option<String>,
    #[serde(rename = "VALOR_TOTAL")]
    pub value: Option<String>,
}

/// Days of the week in the canonical Monday-to-Sunday business order.
///
/// `Ord` follows declaration order, so sorting weekday aggregates by key
/// yields the week order rather than the lexicographic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Segunda,
    Terca,
    Quarta,
    Quinta,
    Sexta,
    Sabado,
    Domingo,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Segunda,
        Weekday::Terca,
        Weekday::Quarta,
        Weekday::Quinta,
        Weekday::Sexta,
        Weekday::Sabado,
        Weekday::Domingo,
    ];

    /// Parse an uppercase Portuguese weekday name. Accent-stripped spellings
    /// show up in some exports, so both variants are accepted.
    pub fn parse(s: &str) -> Option<Weekday> {
        match s.trim().to_uppercase().as_str() {
            "SEGUNDA-FEIRA" => Some(Weekday::Segunda),
            "TERÇA-FEIRA" | "TERCA-FEIRA" => Some(Weekday::Terca),
            "QUARTA-FEIRA" => Some(Weekday::Quarta),
            "QUINTA-FEIRA" => Some(Weekday::Quinta),
            "SEXTA-FEIRA" => Some(Weekday::Sexta),
            "SÁBADO" | "SABADO" => Some(Weekday::Sabado),
            "DOMINGO" => Some(Weekday::Domingo),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Segunda => "SEGUNDA-FEIRA",
            Weekday::Terca => "TERÇA-FEIRA",
            Weekday::Quarta => "QUARTA-FEIRA",
            Weekday::Quinta => "QUINTA-FEIRA",
            Weekday::Sexta => "SEXTA-FEIRA",
            Weekday::Sabado => "SÁBADO",
            Weekday::Domingo => "DOMINGO",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One cleaned sales row. The three per-unit ratios are computed once at
/// load; a zero denominator is `None` and stays `None` through aggregation.
#[derive(Debug, Clone)]
pub struct Record {
    pub route: String,
    pub route_code: i32,
    pub city: String,
    pub weekday: Weekday,
    pub month: u32,
    pub week: u32,
    pub invoices: u32,
    pub items: u32,
    pub weight: f64,
    pub value: f64,
    pub value_per_item: Option<f64>,
    pub weight_per_item: Option<f64>,
    pub value_per_invoice: Option<f64>,
}

/// Row shape for the filtered-data CSV export. Mirrors the input header
/// names and appends the derived columns, so a re-import of the export
/// parses with the same loader.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    #[serde(rename = "ROTA")]
    pub route: String,
    #[serde(rename = "COD_ROTA")]
    pub route_code: i32,
    #[serde(rename = "CIDADE")]
    pub city: String,
    #[serde(rename = "DIA_SEMANA")]
    pub weekday: String,
    #[serde(rename = "MES")]
    pub month: u32,
    #[serde(rename = "SEMANA")]
    pub week: u32,
    #[serde(rename = "QUANTIDADE_NF")]
    pub invoices: u32,
    #[serde(rename = "QUDE_ITENS")]
    pub items: u32,
    #[serde(rename = "PESO_TOTAL")]
    pub weight: f64,
    #[serde(rename = "VALOR_TOTAL")]
    pub value: f64,
    #[serde(rename = "VALOR_MEDIO_ITEM")]
    pub value_per_item: Option<f64>,
    #[serde(rename = "PESO_MEDIO_ITEM")]
    pub weight_per_item: Option<f64>,
    #[serde(rename = "VALOR_MEDIO_NF")]
    pub value_per_invoice: Option<f64>,
}

impl From<&Record> for ExportRow {
    fn from(r: &Record) -> Self {
        ExportRow {
            route: r.route.clone(),
            route_code: r.route_code,
            city: r.city.clone(),
            weekday: r.weekday.name().to_string(),
            month: r.month,
            week: r.week,
            invoices: r.invoices,
            items: r.items,
            weight: r.weight,
            value: r.value,
            value_per_item: r.value_per_item,
            weight_per_item: r.weight_per_item,
            value_per_invoice: r.value_per_invoice,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CityRankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Cidade")]
    #[tabled(rename = "Cidade")]
    pub city: String,
    #[serde(rename = "TotalValor")]
    #[tabled(rename = "TotalValor")]
    pub total_value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupSummaryRow {
    #[serde(rename = "Grupo")]
    #[tabled(rename = "Grupo")]
    pub key: String,
    #[serde(rename = "TotalNFs")]
    #[tabled(rename = "TotalNFs")]
    pub total_invoices: String,
    #[serde(rename = "MediaNFs")]
    #[tabled(rename = "MediaNFs")]
    pub avg_invoices: String,
    #[serde(rename = "TotalValor")]
    #[tabled(rename = "TotalValor")]
    pub total_value: String,
    #[serde(rename = "MediaValor")]
    #[tabled(rename = "MediaValor")]
    pub avg_value: String,
    #[serde(rename = "TotalItens")]
    #[tabled(rename = "TotalItens")]
    pub total_items: String,
    #[serde(rename = "MediaItens")]
    #[tabled(rename = "MediaItens")]
    pub avg_items: String,
    #[serde(rename = "TotalPeso")]
    #[tabled(rename = "TotalPeso")]
    pub total_weight: String,
    #[serde(rename = "MediaPeso")]
    #[tabled(rename = "MediaPeso")]
    pub avg_weight: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct EfficiencyRow {
    #[serde(rename = "Grupo")]
    #[tabled(rename = "Grupo")]
    pub key: String,
    #[serde(rename = "TotalValor")]
    #[tabled(rename = "TotalValor")]
    pub total_value: String,
    #[serde(rename = "ValorPorNF")]
    #[tabled(rename = "ValorPorNF")]
    pub value_per_invoice: String,
    #[serde(rename = "ValorPorItem")]
    #[tabled(rename = "ValorPorItem")]
    pub value_per_item: String,
    #[serde(rename = "ValorPorKg")]
    #[tabled(rename = "ValorPorKg")]
    pub value_per_kg: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeekdayTotalRow {
    #[serde(rename = "DiaSemana")]
    #[tabled(rename = "DiaSemana")]
    pub weekday: String,
    #[serde(rename = "TotalValor")]
    #[tabled(rename = "TotalValor")]
    pub total_value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeekTotalRow {
    #[serde(rename = "Semana")]
    #[tabled(rename = "Semana")]
    pub week: u32,
    #[serde(rename = "TotalValor")]
    #[tabled(rename = "TotalValor")]
    pub total_value: String,
}

/// One line of the city-by-weekday value matrix. Cells for day/city pairs
/// with no sales are zero, matching the heatmap the display layer draws.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CityWeekdayRow {
    #[serde(rename = "Cidade")]
    #[tabled(rename = "Cidade")]
    pub city: String,
    #[serde(rename = "Segunda")]
    #[tabled(rename = "Segunda")]
    pub segunda: String,
    #[serde(rename = "Terca")]
    #[tabled(rename = "Terca")]
    pub terca: String,
    #[serde(rename = "Quarta")]
    #[tabled(rename = "Quarta")]
    pub quarta: String,
    #[serde(rename = "Quinta")]
    #[tabled(rename = "Quinta")]
    pub quinta: String,
    #[serde(rename = "Sexta")]
    #[tabled(rename = "Sexta")]
    pub sexta: String,
    #[serde(rename = "Sabado")]
    #[tabled(rename = "Sabado")]
    pub sabado: String,
    #[serde(rename = "Domingo")]
    #[tabled(rename = "Domingo")]
    pub domingo: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SaleRow {
    #[serde(rename = "Rota")]
    #[tabled(rename = "Rota")]
    pub route: String,
    #[serde(rename = "Cidade")]
    #[tabled(rename = "Cidade")]
    pub city: String,
    #[serde(rename = "DiaSemana")]
    #[tabled(rename = "DiaSemana")]
    pub weekday: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub value: String,
    #[serde(rename = "NFs")]
    #[tabled(rename = "NFs")]
    pub invoices: u32,
    #[serde(rename = "Itens")]
    #[tabled(rename = "Itens")]
    pub items: u32,
    #[serde(rename = "Peso")]
    #[tabled(rename = "Peso")]
    pub weight: String,
}

/// Headline metrics over the current filtered view, written to
/// `summary.json`. The three averages skip records whose ratio is undefined
/// and are `null` when no record has a defined ratio.
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub records: usize,
    pub total_value: f64,
    pub total_invoices: u64,
    pub total_items: u64,
    pub total_weight: f64,
    pub avg_value_per_invoice: Option<f64>,
    pub avg_value_per_item: Option<f64>,
    pub avg_weight_per_item: Option<f64>,
    pub distinct_cities: usize,
    pub distinct_routes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_parse_accepts_both_spellings() {
        assert_eq!(Weekday::parse("TERÇA-FEIRA"), Some(Weekday::Terca));
        assert_eq!(Weekday::parse("TERCA-FEIRA"), Some(Weekday::Terca));
        assert_eq!(Weekday::parse("SÁBADO"), Some(Weekday::Sabado));
        assert_eq!(Weekday::parse(" sábado "), Some(Weekday::Sabado));
        assert_eq!(Weekday::parse("FERIADO"), None);
    }

    #[test]
    fn weekday_order_is_monday_to_sunday() {
        let mut days = vec![Weekday::Domingo, Weekday::Quarta, Weekday::Segunda];
        days.sort();
        assert_eq!(
            days,
            vec![Weekday::Segunda, Weekday::Quarta, Weekday::Domingo]
        );
    }

    #[test]
    fn weekday_display_round_trips() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::parse(day.name()), Some(day));
        }
    }
}
