use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::error;
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::dashboard::{page, Selection, Tab};
use crate::error::LoadError;
use crate::state::AppState;
use crate::table::{RevenueQuery, TaxTable};

/// JSON body of a 503: the table could not be loaded.
#[derive(Debug, Serialize)]
struct Unavailable {
    error: &'static str,
    source_url: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct RevenueParams {
    quarter: String,
    state: Option<String>,
    category: Option<String>,
}

impl From<RevenueParams> for RevenueQuery {
    fn from(p: RevenueParams) -> Self {
        RevenueQuery {
            fiscal_quarter: p.quarter,
            state: p.state,
            tax_category: p.category,
        }
    }
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// The raw query string, empty when the URL has none.
fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

fn unavailable(state: &AppState, err: &LoadError) -> warp::reply::WithStatus<warp::reply::Json> {
    error!(error = %err, "table unavailable");
    warp::reply::with_status(
        warp::reply::json(&Unavailable {
            error: "table unavailable",
            source_url: state.settings.source.url.clone(),
            reason: err.to_string(),
        }),
        StatusCode::SERVICE_UNAVAILABLE,
    )
}

/// Run `f` against the current table and serialize its result, or answer 503.
async fn json_from_table<T, F>(state: &AppState, f: F) -> warp::reply::WithStatus<warp::reply::Json>
where
    T: Serialize,
    F: FnOnce(&TaxTable) -> T,
{
    match state.table().await {
        Ok(table) => warp::reply::with_status(warp::reply::json(&f(table.as_ref())), StatusCode::OK),
        Err(e) => unavailable(state, &e),
    }
}

/// Liveness only: never triggers a load. Reports when the cached table was
/// loaded, if there is one.
async fn health_check(state: AppState) -> Result<impl Reply, Rejection> {
    let loaded_at = state
        .cache
        .cached(&state.settings.source.url)
        .await
        .map(|(_, at)| at.to_rfc3339());
    Ok(warp::reply::json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "table_loaded_at": loaded_at,
    })))
}

async fn dashboard_page(state: AppState, raw: String) -> Result<impl Reply, Rejection> {
    let sel = Selection::from_query(&raw);
    let (body, status) = match state.table().await {
        Ok(table) => (
            page::render_page(&table, &state.settings.source.layout, &sel),
            StatusCode::OK,
        ),
        Err(e) => {
            error!(error = %e, "dashboard unavailable");
            (
                page::render_error(sel.locale, &e.to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    };
    Ok(warp::reply::with_status(warp::reply::html(body), status))
}

async fn list_states(state: AppState) -> Result<impl Reply, Rejection> {
    Ok(json_from_table(&state, |t| t.states().to_vec()).await)
}

async fn list_categories(state: AppState) -> Result<impl Reply, Rejection> {
    Ok(json_from_table(&state, |t| t.tax_categories().to_vec()).await)
}

async fn list_quarters(state: AppState) -> Result<impl Reply, Rejection> {
    Ok(json_from_table(&state, |t| t.fiscal_quarters().to_vec()).await)
}

async fn query_revenue(state: AppState, params: RevenueParams) -> Result<impl Reply, Rejection> {
    let query = RevenueQuery::from(params);
    Ok(json_from_table(&state, |t| t.query(&query)).await)
}

async fn charts(state: AppState, tab: Tab, raw: String) -> Result<impl Reply, Rejection> {
    let sel = Selection {
        tab,
        ..Selection::from_query(&raw)
    };
    let layout = &state.settings.source.layout;
    Ok(json_from_table(&state, |t| sel.charts(t, layout)).await)
}

/// All dashboard and JSON API routes over one shared state.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(health_check);

    let page = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(raw_query())
        .and_then(dashboard_page);

    let api = warp::path("api");
    let states = api
        .and(warp::path("states"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_states);
    let categories = api
        .and(warp::path("categories"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_categories);
    let quarters = api
        .and(warp::path("quarters"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_quarters);
    let revenue = api
        .and(warp::path("revenue"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(warp::query::<RevenueParams>())
        .and_then(query_revenue);

    let chart_base = api.and(warp::path("charts"));
    let category_charts = chart_base
        .and(warp::path("category"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(warp::any().map(|| Tab::Category))
        .and(raw_query())
        .and_then(charts);
    let state_charts = chart_base
        .and(warp::path("state"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and(warp::any().map(|| Tab::State))
        .and(raw_query())
        .and_then(charts);

    health
        .or(page)
        .or(states)
        .or(categories)
        .or(quarters)
        .or(revenue)
        .or(category_charts)
        .or(state_charts)
        .with(warp::trace::request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dashboard::BarChart;
    use crate::table::tests::sample_table;
    use crate::table::RevenueRow;

    async fn seeded_state() -> AppState {
        let state = AppState::new(Settings::default());
        let table = state
            .cache
            .insert(&state.settings.source.url, sample_table())
            .await;
        assert_eq!(table.len(), 10);
        state
    }

    fn unreachable_state() -> AppState {
        let mut settings = Settings::default();
        // nothing listens on port 9 locally; the first attempt fails fast
        settings.source.url = "http://127.0.0.1:9/q3t3.xlsx".to_string();
        settings.fetch.max_retries = 0;
        settings.fetch.timeout_secs = 2;
        AppState::new(settings)
    }

    #[tokio::test]
    async fn test_health_check() {
        let res = warp::test::request()
            .path("/health")
            .reply(&routes(seeded_state().await))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body["table_loaded_at"].is_string());

        // no load is attempted, so an unreachable source is still alive
        let res = warp::test::request()
            .path("/health")
            .reply(&routes(unreachable_state()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["table_loaded_at"].is_null());
    }

    #[tokio::test]
    async fn test_list_endpoints() {
        let api = routes(seeded_state().await);
        let res = warp::test::request().path("/api/quarters").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
        let quarters: Vec<String> = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(quarters, vec!["2023 Q3", "2022 Q3"]);

        let res = warp::test::request().path("/api/states").reply(&api).await;
        let states: Vec<String> = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(states.len(), 3);

        let res = warp::test::request().path("/api/categories").reply(&api).await;
        let cats: Vec<String> = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(cats, vec!["Total Taxes", "Property taxes", "Individual income"]);
    }

    #[tokio::test]
    async fn test_revenue_query() {
        let api = routes(seeded_state().await);
        let res = warp::test::request()
            .path("/api/revenue?quarter=2023%20Q3&state=Ohio")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let rows: Vec<RevenueRow> = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.state == "Ohio"));

        // quarter is required
        let res = warp::test::request()
            .path("/api/revenue?state=Ohio")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chart_endpoints() {
        let api = routes(seeded_state().await);
        let res = warp::test::request()
            .path("/api/charts/category?quarter=2023%20Q3&category=Individual%20income&lang=en")
            .reply(&api)
            .await;
        let charts: Vec<BarChart> = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].bars[0].key, "Texas");

        let res = warp::test::request()
            .path("/api/charts/state")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let charts: Vec<BarChart> = serde_json::from_slice(res.body()).unwrap();
        assert!(charts.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let api = routes(seeded_state().await);
        let res = warp::test::request()
            .path("/?category=Property%20taxes")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = String::from_utf8_lossy(res.body());
        assert!(body.contains("id=\"chart-0\""));
        assert!(body.contains("各州税收收入：财产税"));

        let res = warp::test::request().path("/").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_load_failure_is_503() {
        let api = routes(unreachable_state());
        let res = warp::test::request().path("/?lang=en").reply(&api).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = String::from_utf8_lossy(res.body());
        assert!(body.contains("Failed to load data"));
        assert!(!body.contains("<form"));

        let res = warp::test::request().path("/api/states").reply(&api).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "table unavailable");
        assert_eq!(body["source_url"], "http://127.0.0.1:9/q3t3.xlsx");
        assert!(!body["reason"].as_str().unwrap().is_empty());
    }
}
