//! Orders list page handler.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use middify_core::OrderState;

use crate::components::data_table::{orders_table_config, TableColumn};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::orders::{OrderRow, TableSnapshot};
use crate::state::AppState;

use super::super::{build_shell, load_view, save_view, Shell};

/// Query parameters for the orders table.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// 1-based page in whichever pagination model is active.
    pub page: Option<u32>,
    /// Page size for the active model.
    pub page_size: Option<u32>,
    /// Free-text search term; a non-empty value activates client-side search.
    pub q: Option<String>,
}

/// One row prepared for the template: the display row plus selection state.
pub struct RowView {
    pub row: OrderRow,
    pub selected: bool,
}

/// One entry of the page-size selector.
pub struct PageSizeOption {
    pub value: u32,
    pub selected: bool,
}

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub shell: Shell,
    /// Heading for the active state filter ("Todos los estados" when none).
    pub state_label: String,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<RowView>,
    pub all_selected: bool,
    pub selected_count: usize,
    pub search_value: String,
    pub row_count: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub page_size_options: Vec<PageSizeOption>,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    /// Stale rows are on screen while a refresh runs.
    pub refreshing: bool,
    /// The search collection was cut off by a record/page cap.
    pub truncated: bool,
    pub error: Option<String>,
}

/// Orders list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAuth(token): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Result<Html<String>, AppError> {
    let mut view = load_view(&session).await;
    view.close_details();

    if let Some(q) = &query.q {
        view.table.set_search(q);
    }
    if let Some(page_size) = query.page_size {
        view.table.set_page_size(page_size);
    }
    if let Some(page) = query.page {
        view.table.set_page(page);
    }

    let shell = build_shell(&state, &token, &view).await;

    let snapshot: TableSnapshot = state
        .orders()
        .table(
            Some(&token),
            view.selected_tenant.as_ref(),
            view.selected_state,
            &view.table,
        )
        .await;

    if !snapshot.searching {
        view.table.clamp_server_page(snapshot.total_pages);
    }

    let visible = snapshot.visible_row_ids();
    view.selection.retain_visible(&visible);
    let all_selected = view.selection.all_selected(&visible);
    let selected_count = view.selection.len();

    let rows: Vec<RowView> = snapshot
        .rows
        .iter()
        .map(|row| RowView {
            selected: view.selection.contains(&row.row_id),
            row: row.clone(),
        })
        .collect();

    save_view(&session, &view).await?;

    let config = orders_table_config();
    let template = OrdersIndexTemplate {
        shell,
        state_label: OrderState::selected_label(view.selected_state).to_string(),
        columns: config.columns,
        rows,
        all_selected,
        selected_count,
        search_value: view.table.search.clone(),
        row_count: snapshot.row_count,
        page: snapshot.page,
        total_pages: snapshot.total_pages,
        page_size: snapshot.page_size,
        page_size_options: view
            .table
            .page_size_options()
            .into_iter()
            .map(|value| PageSizeOption {
                value,
                selected: value == snapshot.page_size,
            })
            .collect(),
        prev_page: (snapshot.page > 1).then(|| snapshot.page - 1),
        next_page: (snapshot.page < snapshot.total_pages).then(|| snapshot.page + 1),
        refreshing: snapshot.refreshing,
        truncated: snapshot.truncated,
        error: snapshot.error.as_ref().map(ToString::to_string),
    };

    Ok(Html(template.render()?))
}
