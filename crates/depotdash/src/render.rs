use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use depotdash_core::{AnomalyReport, KpiSummary, NormalizationReport, ShiftCard, TrendSeries};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "no data".to_string(), |v| format!("{v:.0}"))
}

pub fn normalization(report: &NormalizationReport) -> Table {
    let mut table = table(vec!["rows read", "unmapped shift", "bad date", "rows kept"]);
    table.add_row(vec![
        report.input_rows.to_string(),
        report.unmapped_shift_numbers.to_string(),
        report.unparseable_dates.to_string(),
        report.output_rows.to_string(),
    ]);
    table
}

pub fn kpis(kpis: &KpiSummary) -> Table {
    let mut table = table(vec![
        "records",
        "turnover",
        "mean turnover",
        "unloaded vehicles",
        "loaded vehicles",
    ]);
    table.add_row(vec![
        kpis.records.to_string(),
        format!("{:.0}", kpis.total_turnover),
        format!("{:.0}", kpis.mean_turnover),
        format!("{:.0}", kpis.unloaded_vehicles),
        format!("{:.0}", kpis.loaded_vehicles),
    ]);
    table
}

pub fn shift_cards(cards: &[ShiftCard]) -> Table {
    let mut table = table(vec![
        "shift", "records", "vehicles", "pallets", "turnover", "employees",
    ]);
    for card in cards {
        table.add_row(vec![
            card.shift_number.clone(),
            card.records.to_string(),
            number(card.vehicles),
            number(card.pallets),
            number(card.turnover),
            number(card.employees),
        ]);
    }
    table
}

pub fn trend(series: &TrendSeries) -> Table {
    let mut table = table(vec!["date / shift", series.metric.as_str(), "trend"]);
    for (idx, (key, value)) in series.keys.iter().zip(&series.values).enumerate() {
        let fitted = series
            .fit
            .as_ref()
            .and_then(|fit| fit.fitted.get(idx))
            .map_or_else(String::new, |v| format!("{v:.2}"));
        table.add_row(vec![
            key.clone(),
            value.map_or_else(String::new, |v| format!("{v}")),
            fitted,
        ]);
    }
    table
}

pub fn anomalies(report: &AnomalyReport) -> Table {
    let mut table = table(vec![
        "date",
        "shift time",
        "shift",
        report.metric.as_str(),
        "kind",
        "deviation",
        "σ",
    ]);
    for record in &report.records {
        table.add_row(vec![
            record.date.format("%Y-%m-%d").to_string(),
            record.shift_time.clone().unwrap_or_default(),
            record.shift_number.clone(),
            format!("{:.2}", record.value),
            record.kind.to_string(),
            format!("{:+.2}", record.deviation),
            format!("{:+.2}", record.deviation_in_sigma),
        ]);
    }
    table
}
