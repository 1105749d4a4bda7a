//! Dashboard assembly.
//!
//! Turns one menu selection into the KPI cards and panels handed to the
//! report generator. Each call is a fresh, stateless pass over the table.

use crate::analysis::aggregator::{self, DEFAULT_RATING, DEFAULT_TOP_N};
use crate::analysis::filter::{apply_filters, category_options, Filters, TableView};
use crate::analysis::schema::probe;
use crate::models::{Dashboard, Frequency, Kpi, KpiDeltas, KpiSummary, MenuItem, Panel, Table};
use tracing::{debug, info};

/// Knobs that shape the computed panels.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    /// Rows kept in the Top Products and Top Customers tables.
    pub top_n: usize,
    /// Avg Rating used when no ratings are available.
    pub rating_fallback: f64,
    /// Bucket size of the revenue trend.
    pub frequency: Frequency,
    pub deltas: KpiDeltas,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            rating_fallback: DEFAULT_RATING,
            frequency: Frequency::Daily,
            deltas: KpiDeltas::default(),
        }
    }
}

impl From<&crate::config::DashboardConfig> for DashboardSettings {
    fn from(config: &crate::config::DashboardConfig) -> Self {
        Self {
            top_n: config.top_n,
            rating_fallback: config.rating_fallback,
            frequency: config.frequency,
            deltas: if config.show_deltas {
                config.deltas.clone()
            } else {
                KpiDeltas {
                    total_orders: None,
                    total_revenue: None,
                    active_customers: None,
                    avg_rating: None,
                }
            },
        }
    }
}

/// Build the page for a menu item.
///
/// Only the main dashboard has panels; the other pages carry a notice.
pub fn build_dashboard(
    table: &Table,
    menu: MenuItem,
    filters: &Filters,
    settings: &DashboardSettings,
) -> Dashboard {
    let availability = probe(table);
    debug!("Available columns: {:?}", availability.names());

    // The selector lists every category, not just the filtered ones
    let options = category_options(&TableView::all(table), &availability);
    let view = apply_filters(table, &availability, filters);

    if menu != MenuItem::MainDashboard {
        info!("Page '{}' has no panels yet", menu);
        return Dashboard {
            menu,
            rows_analyzed: view.len(),
            available_columns: availability.names(),
            category_options: options,
            kpis: Vec::new(),
            panels: Vec::new(),
            notice: Some(format!("{} is not available yet.", menu)),
        };
    }

    let summary = aggregator::kpi_summary(&view, &availability, settings.rating_fallback);
    let kpis = format_kpis(&summary, &settings.deltas);

    let panels: Vec<Panel> = [
        aggregator::revenue_trend(&view, &availability, settings.frequency)
            .map(Panel::RevenueTrend),
        aggregator::order_status(&view, &availability).map(Panel::OrderStatus),
        aggregator::payment_methods(&view, &availability).map(Panel::PaymentMethods),
        aggregator::category_performance(&view, &availability)
            .map(Panel::CategoryPerformance),
        aggregator::top_products(&view, &availability, settings.top_n)
            .map(Panel::TopProducts),
        aggregator::top_customers(&view, &availability, settings.top_n)
            .map(Panel::TopCustomers),
    ]
    .into_iter()
    .flatten()
    .collect();

    for panel in &panels {
        debug!("{}: {} records", panel.title(), panel.len());
    }
    info!(
        "Built {} with {} panels over {} rows",
        menu,
        panels.len(),
        view.len()
    );

    Dashboard {
        menu,
        rows_analyzed: view.len(),
        available_columns: availability.names(),
        category_options: options,
        kpis,
        panels,
        notice: None,
    }
}

/// Render the scalar KPIs as card triples.
pub fn format_kpis(summary: &KpiSummary, deltas: &KpiDeltas) -> Vec<Kpi> {
    vec![
        Kpi {
            label: "Total Orders".to_string(),
            value: format_count(summary.total_orders),
            delta: deltas.total_orders.clone(),
        },
        Kpi {
            label: "Total Revenue".to_string(),
            value: format_revenue(summary.total_revenue),
            delta: deltas.total_revenue.clone(),
        },
        Kpi {
            label: "Active Customers".to_string(),
            value: format_count(summary.active_customers),
            delta: deltas.active_customers.clone(),
        },
        Kpi {
            label: "Avg Rating".to_string(),
            value: format_rating(summary.avg_rating),
            delta: deltas.avg_rating.clone(),
        },
    ]
}

/// Group digits in thousands: `1234567` -> `1,234,567`.
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Shortest decimal form, keeping one place for whole numbers: `4.0`, `4.25`.
pub fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{:.1}", rating)
    } else {
        rating.to_string()
    }
}

/// Revenue in billions of rupiah ("M" = miliar), one decimal.
pub fn format_revenue(total: f64) -> String {
    format!("Rp {:.1}M", total / 1e9)
}
