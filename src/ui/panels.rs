use std::fmt::Write;

use crate::color::ColorMap;
use crate::data::filter::FilterSelection;
use crate::data::loader::LoadReport;
use crate::data::model::{Dataset, FilterAxis};
use crate::state::ViewRequest;
use crate::ui::format::{escape_html, format_number};
use crate::ui::plot;
use crate::view::aggregate::{GroupTotal, Summary};
use crate::view::table::{SortDirection, TableColumn, TablePage};
use crate::view::trend::{Period, Trend};

pub const PAGE_TITLE: &str = "Investment Funds Analysis Dashboard";

/// Most parse errors listed on the page; the log has all of them.
const MAX_LISTED_ERRORS: usize = 50;

/// All projections for one render cycle.
pub struct PageModel<'a> {
    pub dataset: &'a Dataset,
    pub report: &'a LoadReport,
    pub request: &'a ViewRequest,
    pub summary: Summary,
    pub segments: Vec<GroupTotal>,
    pub regions: Vec<GroupTotal>,
    pub fund_types: Vec<GroupTotal>,
    pub domestic: Vec<GroupTotal>,
    pub table: TablePage<'a>,
    pub segment_colors: &'a ColorMap,
    pub region_colors: &'a ColorMap,
    pub fund_type_colors: &'a ColorMap,
    pub domestic_colors: &'a ColorMap,
    pub comparison: Comparison<'a>,
    /// Period files, for their load reports.
    pub periods: &'a [Period],
}

/// State of the period comparison section.
pub enum Comparison<'a> {
    /// No `--period` files were given.
    Disabled,
    /// Fewer than two periods.
    NotEnough(usize),
    Ready {
        by_region: Trend,
        by_fund_type: Trend,
        region_colors: &'a ColorMap,
        fund_type_colors: &'a ColorMap,
    },
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub fn render_page(model: &PageModel<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="layout">
        <aside class="sidebar">{side_panel}</aside>
        <main>
            <h1>{title}</h1>
            {report}
            {metrics}
            {charts}
            {table}
            {comparison}
        </main>
    </div>
</body>
</html>"#,
        title = PAGE_TITLE,
        css = inline_css(),
        side_panel = side_panel(model.dataset, model.request),
        report = report_banner(model.report),
        metrics = metrics(&model.summary),
        charts = charts(model),
        table = table_section(&model.table, model.request),
        comparison = comparison_section(&model.comparison, model.periods),
    )
}

/// A failed render cycle: the message and a way back.
pub fn render_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <main class="error-page">
        <h1>Cannot render this view</h1>
        <p class="error">{message}</p>
        <p><a href="/">Back to the full dataset</a></p>
    </main>
</body>
</html>"#,
        title = PAGE_TITLE,
        css = inline_css(),
        message = escape_html(message),
    )
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

fn side_panel(dataset: &Dataset, request: &ViewRequest) -> String {
    let mut html = String::from(r#"<h2>Filters</h2><form method="get" action="/">"#);
    for axis in FilterAxis::ALL {
        html.push_str(&filter_select(dataset, &request.selection, axis));
    }
    let _ = write!(
        html,
        r#"<input type="hidden" name="sort" value="{}"><input type="hidden" name="dir" value="{}"><input type="hidden" name="page_size" value="{}"><button type="submit">Apply</button> <a href="/" class="reset">Reset</a></form>"#,
        request.sort.column.key(),
        request.sort.direction.key(),
        request.page.page_size,
    );
    html
}

fn filter_select(dataset: &Dataset, selection: &FilterSelection, axis: FilterAxis) -> String {
    let labels: Vec<&str> = dataset.labels(axis).collect();
    let n_selected = selection.values(axis).count();
    let header = if n_selected == 0 {
        format!("{} (all {})", axis.title(), labels.len())
    } else {
        format!("{} ({n_selected}/{})", axis.title(), labels.len())
    };

    let mut html = format!(
        r#"<label for="f-{key}">{header}</label><select id="f-{key}" name="{key}" multiple size="{size}">"#,
        key = axis.key(),
        header = escape_html(&header),
        size = labels.len().clamp(2, 8),
    );
    for label in labels {
        let selected = if selection.is_selected(axis, label) {
            " selected"
        } else {
            ""
        };
        let label = escape_html(label);
        let _ = write!(html, r#"<option value="{label}"{selected}>{label}</option>"#);
    }
    html.push_str("</select>");
    html
}

// ---------------------------------------------------------------------------
// Top of the page: load report and metrics
// ---------------------------------------------------------------------------

fn report_banner(report: &LoadReport) -> String {
    let mut html = format!(
        r#"<section class="report"><p>{}</p>"#,
        escape_html(&report.summary())
    );
    if !report.size_errors.is_empty() {
        let _ = write!(
            html,
            "<details><summary>{} rows had an invalid investment size</summary><ul>",
            report.size_errors.len()
        );
        for err in report.size_errors.iter().take(MAX_LISTED_ERRORS) {
            let _ = write!(html, "<li>{}</li>", escape_html(&err.to_string()));
        }
        if report.size_errors.len() > MAX_LISTED_ERRORS {
            let _ = write!(
                html,
                "<li>… and {} more (see the server log)</li>",
                report.size_errors.len() - MAX_LISTED_ERRORS
            );
        }
        html.push_str("</ul></details>");
    }
    html.push_str("</section>");
    html
}

fn metrics(summary: &Summary) -> String {
    format!(
        r#"<section class="metrics">
    <div><div class="metric-value">{total} ILS</div><div class="metric-label">Total NAV</div></div>
    <div><div class="metric-value">{count}</div><div class="metric-label">Total Investments</div></div>
    <div><div class="metric-value">{average} ILS</div><div class="metric-label">Average Investment Size</div></div>
</section>"#,
        total = format_number(summary.total_size),
        count = summary.count,
        average = format_number(summary.average_size),
    )
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn chart_card(title: &str, body: String) -> String {
    format!(
        r#"<figure class="card"><figcaption>{}</figcaption>{body}</figure>"#,
        escape_html(title)
    )
}

fn charts(model: &PageModel<'_>) -> String {
    let cards = [
        chart_card(
            "Distribution by Sub-segment",
            plot::donut_chart(&model.segments, model.segment_colors),
        ),
        chart_card(
            "NAV by Region",
            plot::bar_chart(&model.regions, model.region_colors),
        ),
        chart_card(
            "NAV by Fund Type",
            plot::bar_chart(&model.fund_types, model.fund_type_colors),
        ),
        chart_card(
            "Israel vs. International (all holdings)",
            plot::donut_chart(&model.domestic, model.domestic_colors),
        ),
    ];
    format!(r#"<section class="charts">{}</section>"#, cards.concat())
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

fn table_section(page: &TablePage<'_>, request: &ViewRequest) -> String {
    let mut html = String::from(r#"<section class="table"><h2>Investments</h2><table><thead><tr>"#);
    for column in TableColumn::ALL {
        let marker = if request.sort.column == column {
            match request.sort.direction {
                SortDirection::Asc => " ▲",
                SortDirection::Desc => " ▼",
            }
        } else {
            ""
        };
        let _ = write!(
            html,
            r#"<th><a href="/?{}">{}{marker}</a></th>"#,
            escape_html(&request.with_sort(column).to_query()),
            column.title()
        );
    }
    html.push_str("</tr></thead><tbody>");

    if page.rows.is_empty() {
        let _ = write!(
            html,
            r#"<tr><td colspan="{}" class="empty">No investments match the current filters.</td></tr>"#,
            TableColumn::ALL.len()
        );
    }
    for rec in &page.rows {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td></tr>"#,
            escape_html(&rec.fund_name),
            escape_html(&rec.description),
            escape_html(&rec.region),
            escape_html(&rec.fund_type),
            rec.sub_segment,
            format_number(rec.investment_size),
        );
    }
    html.push_str("</tbody></table>");

    let _ = write!(
        html,
        r#"<nav class="pager">{prev} <span>Page {page} of {pages} · {total} rows</span> {next} <a class="download" href="/export.csv?{export}">Download filtered data</a></nav></section>"#,
        prev = pager_link(page.prev_offset(), request, "« Previous"),
        next = pager_link(page.next_offset(), request, "Next »"),
        page = page.page_number(),
        pages = page.page_count(),
        total = page.total,
        export = escape_html(&request.filter_query()),
    );
    html
}

fn pager_link(offset: Option<usize>, request: &ViewRequest, text: &str) -> String {
    match offset {
        Some(offset) => format!(
            r#"<a href="/?{}">{text}</a>"#,
            escape_html(&request.with_offset(offset).to_query())
        ),
        None => format!(r#"<span class="disabled">{text}</span>"#),
    }
}

// ---------------------------------------------------------------------------
// Period comparison
// ---------------------------------------------------------------------------

fn period_reports(periods: &[Period]) -> String {
    periods
        .iter()
        .map(|period| {
            format!(
                r#"<div class="period-report"><h3>{}</h3>{}</div>"#,
                escape_html(&period.label),
                report_banner(&period.report)
            )
        })
        .collect()
}

fn comparison_section(comparison: &Comparison<'_>, periods: &[Period]) -> String {
    match comparison {
        Comparison::Disabled => String::new(),
        Comparison::NotEnough(n) => format!(
            r#"<section class="comparison"><h2>Quarterly Comparison</h2><p class="empty">{n} period file loaded; pass at least two --period files to view trends.</p>{}</section>"#,
            period_reports(periods)
        ),
        Comparison::Ready {
            by_region,
            by_fund_type,
            region_colors,
            fund_type_colors,
        } => format!(
            r#"<section class="comparison"><h2>Quarterly Comparison</h2><div class="charts">{}{}</div>{}</section>"#,
            chart_card(
                "Exposure by Region",
                plot::line_chart(by_region, region_colors)
            ),
            chart_card(
                "Exposure by Fund Type",
                plot::line_chart(by_fund_type, fund_type_colors)
            ),
            period_reports(periods),
        ),
    }
}

fn inline_css() -> &'static str {
    r#"
body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
       background: linear-gradient(135deg, #20242f 0%, #282D3C 100%); color: #F3F6FB; }
a { color: #67B7DC; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 240px; padding: 1rem; background: rgba(40, 45, 60, 0.8); border-right: 1px solid #3A4055; }
.sidebar label { display: block; margin-top: 1rem; font-weight: bold; color: #CED2D9; }
.sidebar select { width: 100%; margin-top: 0.25rem; background: #20242f; color: #F3F6FB; border: 1px solid #3A4055; }
.sidebar button { margin-top: 1rem; padding: 0.4rem 1rem; background: #67B7DC; border: none; border-radius: 0.25rem; }
main { flex: 1; max-width: 1200px; padding: 1rem 2rem; }
h2 { font-size: 1.3rem; padding-bottom: 0.5rem; border-bottom: 1px solid #3A4055; }
.report { background-color: rgba(40, 45, 60, 0.8); border-left: 4px solid #67B7DC; padding: 0.5rem 1rem; border-radius: 0.25rem; }
.metrics { display: flex; gap: 2rem; margin: 1.5rem 0; }
.metric-value { font-size: 2rem; font-weight: bold; color: #67B7DC; }
.metric-label { font-size: 1rem; color: #CED2D9; }
.charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(420px, 1fr)); gap: 1rem; }
.card { margin: 0; padding: 1rem; background: rgba(40, 45, 60, 0.8); border-radius: 0.25rem; }
.card figcaption { font-weight: bold; margin-bottom: 0.5rem; color: #8AD6CC; }
.chart { width: 100%; height: auto; }
.chart .axis { fill: #CED2D9; font-size: 12px; }
.chart .value { fill: #F3F6FB; font-size: 11px; }
.chart .grid { stroke: #3A4055; }
.legend { list-style: none; padding: 0; display: flex; flex-wrap: wrap; gap: 0.5rem 1rem; font-size: 0.9rem; }
.swatch { display: inline-block; width: 0.8rem; height: 0.8rem; margin-right: 0.3rem; border-radius: 2px; }
table { width: 100%; border-collapse: collapse; margin: 1rem 0; }
th, td { padding: 0.4rem 0.6rem; border-bottom: 1px solid #3A4055; text-align: start; }
th a { color: #F3F6FB; text-decoration: none; }
td.num { text-align: end; font-variant-numeric: tabular-nums; }
.pager { display: flex; gap: 1rem; align-items: center; }
.pager .download { margin-left: auto; }
.disabled, .empty { color: #8a8f9c; }
.error { color: #f95d6a; }
"#
}
