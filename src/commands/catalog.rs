use crate::app::AppState;
use crate::error::AppError;
use crate::models::catalog_types::{Category, PageLookup, SampleDescriptor};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ImageView {
    pub image_full_path: String,
    pub image_url: String,
    pub category: Category,
    pub is_fake_category: bool,
}

impl From<&SampleDescriptor> for ImageView {
    fn from(sample: &SampleDescriptor) -> Self {
        Self {
            image_full_path: sample.full_path().to_string_lossy().to_string(),
            image_url: format!("/data_static/{}", sample.relative_url()),
            category: sample.category(),
            is_fake_category: sample.is_fake_category(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub image_list: Vec<ImageView>,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_images: usize,
}

#[derive(Debug, Serialize)]
pub struct RefreshView {
    pub total_images: usize,
}

pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    render_page(&state, 1).await
}

/// Any segment that is not a positive integer is INVALID_ARGUMENT.
pub async fn page(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let page = raw.trim().parse::<usize>().map_err(|_| {
        AppError::invalid_argument(format!("page must be a positive integer, got {:?}", raw))
    })?;
    render_page(&state, page).await
}

async fn render_page(state: &AppState, page: usize) -> Result<Response, AppError> {
    match state.catalog.get_page(page, state.page_size).await? {
        PageLookup::Found(p) => Ok(Json(PageView {
            image_list: p.items.iter().map(ImageView::from).collect(),
            page: p.page_number,
            total_pages: p.total_pages,
            page_size: p.page_size,
            total_images: p.total_items,
        })
        .into_response()),
        PageLookup::OutOfRange { last_page } => {
            tracing::debug!(requested = page, last_page, "page out of range, redirecting");
            Ok(Redirect::to(&format!("/page/{}", last_page)).into_response())
        }
    }
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshView>, AppError> {
    let catalog = state.catalog.rebuild().await?;
    Ok(Json(RefreshView {
        total_images: catalog.len(),
    }))
}
