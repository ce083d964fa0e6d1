use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::data::filter::FilteredView;
use crate::data::model::FilterAxis;
use crate::error::RenderError;
use crate::state::{AppState, ViewRequest};
use crate::ui::panels::{self, Comparison, PageModel};
use crate::view::{aggregate, table, trend};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/export.csv", get(export_csv))
        .route("/healthz", get(healthz))
        .with_state(state)
}

type QueryPairs = Query<Vec<(String, String)>>;

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        log::warn!("render failed: {self}");
        (
            StatusCode::BAD_REQUEST,
            Html(panels::render_error_page(&self.to_string())),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// One recompute-and-render cycle: parse the selection, filter, project.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(pairs): QueryPairs,
) -> Result<Html<String>, RenderError> {
    render_dashboard(&state, &pairs).map(Html)
}

pub fn render_dashboard(state: &AppState, pairs: &[(String, String)]) -> Result<String, RenderError> {
    let request = ViewRequest::from_query(&state.dataset, pairs, state.default_page_size)?;
    let view = FilteredView::new(&state.dataset, &request.selection);
    let table = table::table_page(&view, &request.sort, &request.page)?;

    let comparison = match state.periods.len() {
        0 => Comparison::Disabled,
        1 => Comparison::NotEnough(1),
        _ => Comparison::Ready {
            by_region: trend::trend(&state.periods, FilterAxis::Region),
            by_fund_type: trend::trend(&state.periods, FilterAxis::FundType),
            region_colors: state.period_colors(FilterAxis::Region),
            fund_type_colors: state.period_colors(FilterAxis::FundType),
        },
    };

    let model = PageModel {
        dataset: &state.dataset,
        report: &state.report,
        request: &request,
        summary: aggregate::summary(&view),
        segments: aggregate::by_sub_segment(&view),
        regions: aggregate::by_region(&view),
        fund_types: aggregate::by_fund_type(&view),
        // Exposure split is over all holdings, regardless of filters.
        domestic: aggregate::domestic_split(&FilteredView::all(&state.dataset)),
        table,
        segment_colors: state.colors(FilterAxis::SubSegment),
        region_colors: state.colors(FilterAxis::Region),
        fund_type_colors: state.colors(FilterAxis::FundType),
        domestic_colors: &state.domestic_colors,
        comparison,
        periods: &state.periods,
    };
    log::debug!(
        "rendered {} of {} rows (page {})",
        model.table.rows.len(),
        model.table.total,
        model.table.page_number()
    );
    Ok(panels::render_page(&model))
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(pairs): QueryPairs,
) -> Result<Response, RenderError> {
    let request = ViewRequest::from_query(&state.dataset, &pairs, state.default_page_size)?;
    let view = FilteredView::new(&state.dataset, &request.selection);
    let rows = table::sorted_rows(&view, &request.sort);

    let mut body = Vec::new();
    if let Err(e) = table::write_csv(&rows, &mut body) {
        log::error!("CSV export failed: {e}");
        return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"filtered_investments.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

async fn healthz() -> &'static str {
    "ok"
}
