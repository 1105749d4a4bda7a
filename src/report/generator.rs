//! Markdown and JSON dashboard rendering.
//!
//! This module turns computed dashboards into documents: KPI cards become
//! a table, and every panel becomes a section with a field-named table
//! ready for charting.

use crate::models::{
    Dashboard, DistributionCount, GroupedAggregate, Kpi, Panel, ReportMetadata,
    StatusDistribution, TimeSeries, TopCustomer,
};
use anyhow::Result;
use serde::Serialize;

/// Generate a complete Markdown document for the rendered pages.
pub fn generate_markdown_report(pages: &[Dashboard], metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# 📊 OrderDash Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(metadata));

    for page in pages {
        output.push_str(&generate_page(page));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Rows Loaded:** {}\n", metadata.rows_loaded));
    section.push_str(&format!("- **Filters:** {}\n", metadata.filters));
    section.push_str(&format!(
        "- **Render Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the section for one page.
fn generate_page(page: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} {}\n\n", page.menu.emoji(), page.menu));

    if let Some(ref notice) = page.notice {
        section.push_str(&format!("> ℹ️ {}\n\n", notice));
        return section;
    }

    section.push_str(&format!(
        "*Rows analyzed: {} | Columns available: {}*\n\n",
        page.rows_analyzed,
        if page.available_columns.is_empty() {
            "none".to_string()
        } else {
            page.available_columns.join(", ")
        }
    ));

    section.push_str(&generate_kpi_section(&page.kpis));

    if page.panels.is_empty() {
        section.push_str("No panels can be rendered from the columns in this dataset.\n\n");
    }

    for panel in &page.panels {
        section.push_str(&generate_panel_section(panel));
    }

    section
}

/// Generate the KPI card table.
fn generate_kpi_section(kpis: &[Kpi]) -> String {
    if kpis.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("### Key Metrics\n\n");
    section.push_str("| Metric | Value | Change |\n");
    section.push_str("|:---|---:|---:|\n");
    for kpi in kpis {
        section.push_str(&format!(
            "| {} | **{}** | {} |\n",
            kpi.label,
            kpi.value,
            kpi.delta.as_deref().unwrap_or("")
        ));
    }
    section.push('\n');

    section
}

/// Generate the section for a single panel.
fn generate_panel_section(panel: &Panel) -> String {
    let mut section = String::new();

    section.push_str(&format!("### {} {}\n\n", panel.emoji(), panel.title()));

    let body = match panel {
        Panel::RevenueTrend(series) => render_time_series(series),
        Panel::OrderStatus(status) => render_status(status),
        Panel::PaymentMethods(dist) => render_distribution(dist),
        Panel::CategoryPerformance(agg) | Panel::TopProducts(agg) => render_grouped(agg),
        Panel::TopCustomers(rows) => render_top_customers(rows),
    };
    section.push_str(&body);
    section.push('\n');

    section
}

fn render_time_series(series: &TimeSeries) -> String {
    let mut table = format!(
        "*Frequency: {}*\n\n| {} | {} |\n|:---|---:|\n",
        series.frequency, series.date_field, series.value_field
    );
    if series.points.is_empty() {
        table.push_str("| – | – |\n");
    }
    for point in &series.points {
        table.push_str(&format!(
            "| {} | {} |\n",
            point.date.format("%Y-%m-%d"),
            format_number(point.value)
        ));
    }
    table
}

fn render_status(status: &StatusDistribution) -> String {
    let mut body = render_distribution(&status.counts);
    body.push_str(&format!(
        "\n*{} status entries across {} flag columns*\n",
        status.entries.len(),
        status.counts.rows.len()
    ));
    body
}

fn render_distribution(dist: &DistributionCount) -> String {
    let mut table = format!(
        "| {} | {} |\n|:---|---:|\n",
        dist.field, dist.count_field
    );
    if dist.rows.is_empty() {
        table.push_str("| – | – |\n");
    }
    for row in &dist.rows {
        table.push_str(&format!("| {} | {} |\n", escape_cell(&row.value), row.count));
    }
    table
}

fn render_grouped(agg: &GroupedAggregate) -> String {
    let mut table = format!(
        "| {} | {} |\n|:---|---:|\n",
        agg.key_field, agg.value_field
    );
    if agg.rows.is_empty() {
        table.push_str("| – | – |\n");
    }
    for row in &agg.rows {
        table.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&row.key),
            format_number(row.value)
        ));
    }
    table
}

fn render_top_customers(rows: &[TopCustomer]) -> String {
    let mut table = format!("| {} |\n", TopCustomer::HEADERS.join(" | "));
    table.push_str("|:---|---:|---:|---:|\n");
    if rows.is_empty() {
        table.push_str("| – | – | – | – |\n");
    }
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&row.customer_id),
            format_number(row.total_price),
            format_number(row.total_qty),
            format_number(row.total_revenue)
        ));
    }
    table
}

/// Whole numbers print without decimals, everything else with two.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Keep cell text from breaking the Markdown table.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by OrderDash*\n".to_string()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    pages: &'a [Dashboard],
}

/// Generate a JSON document for the rendered pages.
pub fn generate_json_report(pages: &[Dashboard], metadata: &ReportMetadata) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport { metadata, pages }).map_err(Into::into)
}
