use std::f64::consts::PI;
use std::fmt::Write;

use crate::color::ColorMap;
use crate::ui::format::{escape_html, format_number, truncate_label};
use crate::view::aggregate::GroupTotal;
use crate::view::trend::Trend;

// ---------------------------------------------------------------------------
// Server-side SVG charts
// ---------------------------------------------------------------------------

const EMPTY_CHART: &str = r#"<p class="empty">No data for the current filters.</p>"#;

fn legend(entries: &[(String, String)]) -> String {
    let mut html = String::from(r#"<ul class="legend">"#);
    for (label, color) in entries {
        let _ = write!(
            html,
            r#"<li><span class="swatch" style="background:{color}"></span>{}</li>"#,
            escape_html(label)
        );
    }
    html.push_str("</ul>");
    html
}

fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}

/// Donut chart of group totals. Falls back to row counts when every total
/// is zero so the chart still shows the distribution.
pub fn donut_chart(groups: &[GroupTotal], colors: &ColorMap) -> String {
    if groups.is_empty() {
        return EMPTY_CHART.to_string();
    }
    let by_total: f64 = groups.iter().map(|g| g.total).sum();
    let values: Vec<f64> = if by_total > 0.0 {
        groups.iter().map(|g| g.total).collect()
    } else {
        groups.iter().map(|g| g.count as f64).collect()
    };
    let sum: f64 = values.iter().sum();

    let (cx, cy, r) = (160.0, 160.0, 140.0);
    let inner = r * 0.45;
    let mut svg = String::from(
        r#"<svg class="chart" viewBox="0 0 320 320" role="img" xmlns="http://www.w3.org/2000/svg">"#,
    );
    let mut angle = -PI / 2.0;

    for (group, value) in groups.iter().zip(&values) {
        let share = value / sum;
        let color = colors.color_for(&group.label);
        let title = format!(
            "{}: {} ({:.1}%, {} funds)",
            group.label,
            format_number(group.total),
            share * 100.0,
            group.count
        );

        if share >= 0.9999 {
            let mid = (r + inner) / 2.0;
            let _ = write!(
                svg,
                r#"<circle cx="{cx}" cy="{cy}" r="{mid}" fill="none" stroke="{color}" stroke-width="{}"><title>{}</title></circle>"#,
                r - inner,
                escape_html(&title)
            );
            continue;
        }
        if share <= 0.0 {
            continue;
        }

        let end = angle + share * 2.0 * PI;
        let large = if share > 0.5 { 1 } else { 0 };
        let (x0, y0) = polar(cx, cy, r, angle);
        let (x1, y1) = polar(cx, cy, r, end);
        let (x2, y2) = polar(cx, cy, inner, end);
        let (x3, y3) = polar(cx, cy, inner, angle);
        let _ = write!(
            svg,
            r#"<path d="M {x0:.2} {y0:.2} A {r} {r} 0 {large} 1 {x1:.2} {y1:.2} L {x2:.2} {y2:.2} A {inner:.2} {inner:.2} 0 {large} 0 {x3:.2} {y3:.2} Z" fill="{color}"><title>{}</title></path>"#,
            escape_html(&title)
        );
        angle = end;
    }
    svg.push_str("</svg>");

    let entries: Vec<(String, String)> = groups
        .iter()
        .zip(&values)
        .map(|(g, v)| {
            (
                format!("{} · {:.1}%", g.label, v / sum * 100.0),
                colors.color_for(&g.label).to_string(),
            )
        })
        .collect();
    svg + &legend(&entries)
}

/// Horizontal bar chart of group totals, drawn in the given order.
pub fn bar_chart(groups: &[GroupTotal], colors: &ColorMap) -> String {
    if groups.is_empty() {
        return EMPTY_CHART.to_string();
    }
    let row_h = 30.0;
    let label_w = 170.0;
    let bar_w = 300.0;
    let height = groups.len() as f64 * row_h + 10.0;
    let max = groups.iter().map(|g| g.total).fold(0.0_f64, f64::max);

    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 560 {height}" role="img" xmlns="http://www.w3.org/2000/svg">"#
    );
    for (i, group) in groups.iter().enumerate() {
        let y = i as f64 * row_h + 5.0;
        let w = if max > 0.0 { group.total / max * bar_w } else { 0.0 };
        let color = colors.color_for(&group.label);
        let label = escape_html(&truncate_label(&group.label, 24));
        let _ = write!(
            svg,
            r#"<g><title>{title}: {value} ({count} funds)</title><text x="{lx}" y="{ty}" text-anchor="end" class="axis">{label}</text><rect x="{label_w}" y="{y}" width="{w:.2}" height="{bh}" fill="{color}" rx="2"/><text x="{vx:.2}" y="{ty}" class="value">{value}</text></g>"#,
            title = escape_html(&group.label),
            value = format_number(group.total),
            count = group.count,
            lx = label_w - 8.0,
            ty = y + row_h * 0.55,
            bh = row_h * 0.8,
            vx = label_w + w + 6.0,
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Line chart with one series per label across the ordered periods.
pub fn line_chart(trend: &Trend, colors: &ColorMap) -> String {
    if trend.series.is_empty() || trend.periods.is_empty() {
        return EMPTY_CHART.to_string();
    }
    let (width, height) = (640.0, 320.0);
    let (left, right, top, bottom) = (70.0, 20.0, 20.0, 40.0);
    let plot_w = width - left - right;
    let plot_h = height - top - bottom;
    let max = trend
        .series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .fold(0.0_f64, f64::max);
    let n = trend.periods.len();

    let x_at = |i: usize| {
        if n == 1 {
            left + plot_w / 2.0
        } else {
            left + plot_w * i as f64 / (n - 1) as f64
        }
    };
    let y_at = |v: f64| {
        if max > 0.0 {
            top + plot_h - v / max * plot_h
        } else {
            top + plot_h
        }
    };

    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 {width} {height}" role="img" xmlns="http://www.w3.org/2000/svg">"#
    );
    for tick in [0.0, 0.5, 1.0] {
        let v = max * tick;
        let y = y_at(v);
        let _ = write!(
            svg,
            r#"<line x1="{left}" x2="{}" y1="{y:.2}" y2="{y:.2}" class="grid"/><text x="{}" y="{:.2}" text-anchor="end" class="axis">{}</text>"#,
            width - right,
            left - 6.0,
            y + 4.0,
            format_number(v)
        );
    }
    for (i, period) in trend.periods.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{}" text-anchor="middle" class="axis">{}</text>"#,
            x_at(i),
            height - 12.0,
            escape_html(period)
        );
    }
    for series in &trend.series {
        let color = colors.color_for(&series.label);
        let points: Vec<String> = series
            .points
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.2},{:.2}", x_at(i), y_at(*v)))
            .collect();
        let _ = write!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="2"><title>{}</title></polyline>"#,
            points.join(" "),
            escape_html(&series.label)
        );
        for (i, v) in series.points.iter().enumerate() {
            let _ = write!(
                svg,
                r#"<circle cx="{:.2}" cy="{:.2}" r="3.5" fill="{color}"><title>{} · {}: {}</title></circle>"#,
                x_at(i),
                y_at(*v),
                escape_html(&series.label),
                escape_html(&trend.periods[i]),
                format_number(*v)
            );
        }
    }
    svg.push_str("</svg>");

    let entries: Vec<(String, String)> = trend
        .series
        .iter()
        .map(|s| (s.label.clone(), colors.color_for(&s.label).to_string()))
        .collect();
    svg + &legend(&entries)
}
