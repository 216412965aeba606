//! Portuguese period labels used in quotes and approval summaries.

use chrono::{Datelike, NaiveDate};

const MONTHS_PT: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

fn month_name(date: NaiveDate) -> &'static str {
    MONTHS_PT[date.month0() as usize]
}

/// `"15 de Janeiro de 2026"`
pub fn format_date_extended(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), month_name(date), date.year())
}

/// `"15 de Janeiro a 15 de Fevereiro de 2026"`, shortened when both ends
/// share the month or year.
pub fn format_period_extended(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() != end.year() {
        return format!(
            "{} de {} de {} a {} de {} de {}",
            start.day(),
            month_name(start),
            start.year(),
            end.day(),
            month_name(end),
            end.year()
        );
    }
    if start.month() == end.month() {
        return format!("{} a {} de {} de {}", start.day(), end.day(), month_name(end), end.year());
    }
    format!(
        "{} de {} a {} de {} de {}",
        start.day(),
        month_name(start),
        end.day(),
        month_name(end),
        end.year()
    )
}

/// Rough human duration: months when within 5 days of a 30-day multiple,
/// else bi-weeks, else days.
pub fn describe_duration(start: NaiveDate, end: NaiveDate) -> String {
    let days = (end - start).num_days();

    let months = (days as f64 / 30.0).round() as i64;
    if months >= 1 && (days - months * 30).abs() <= 5 {
        return if months == 1 {
            "1 mês".to_string()
        } else {
            format!("{months} meses")
        };
    }

    let biweeks = (days as f64 / 14.0).round() as i64;
    if biweeks >= 1 {
        return if biweeks == 1 {
            "1 bisemana".to_string()
        } else {
            format!("{biweeks} bisemanas")
        };
    }

    if days == 1 {
        "1 dia".to_string()
    } else {
        format!("{days} dias")
    }
}
