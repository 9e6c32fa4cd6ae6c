use crate::error::AppError;
use crate::models::catalog_types::{Catalog, Page, PageLookup};
use std::path::Path;

/// Project one 1-based page out of `catalog`. Pure: the catalog is not touched.
pub fn get_page(
    catalog: &Catalog,
    page_number: usize,
    page_size: usize,
    base_dir: &Path,
) -> Result<PageLookup, AppError> {
    if page_number < 1 {
        return Err(AppError::invalid_argument(format!(
            "page number must be at least 1, got {}",
            page_number
        )));
    }
    if page_size < 1 {
        return Err(AppError::invalid_argument("page size must be at least 1"));
    }

    let total_items = catalog.len();
    if total_items == 0 {
        return Err(AppError::CorpusEmpty {
            base_dir: base_dir.to_path_buf(),
        });
    }

    let total_pages = total_items.div_ceil(page_size);
    if page_number > total_pages {
        return Ok(PageLookup::OutOfRange {
            last_page: total_pages,
        });
    }

    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(total_items);

    Ok(PageLookup::Found(Page {
        items: catalog.samples()[start..end].to_vec(),
        page_number,
        total_pages,
        page_size,
        total_items,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::models::catalog_types::{Category, SampleDescriptor};
    use std::path::PathBuf;

    fn catalog_of(n: usize) -> Catalog {
        Catalog::new(
            (0..n)
                .map(|i| {
                    SampleDescriptor::new(
                        PathBuf::from(format!("/corpus/Real/{}.png", i)),
                        format!("Real/{}.png", i),
                        Category::Real,
                    )
                })
                .collect(),
        )
    }

    fn found(lookup: PageLookup) -> Page {
        match lookup {
            PageLookup::Found(p) => p,
            other => panic!("expected a page, got {:?}", other),
        }
    }

    #[test]
    fn twenty_five_items_by_ten() {
        let catalog = catalog_of(25);
        let base = Path::new("/corpus");

        let first = found(get_page(&catalog, 1, 10, base).unwrap());
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items[0].relative_url(), "Real/0.png");

        let last = found(get_page(&catalog, 3, 10, base).unwrap());
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.items[0].relative_url(), "Real/20.png");

        assert_eq!(
            get_page(&catalog, 4, 10, base).unwrap(),
            PageLookup::OutOfRange { last_page: 3 }
        );

        let err = get_page(&catalog, 0, 10, base).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let catalog = catalog_of(20);
        let base = Path::new("/corpus");
        assert_eq!(found(get_page(&catalog, 2, 10, base).unwrap()).items.len(), 10);
        assert_eq!(
            get_page(&catalog, 3, 10, base).unwrap(),
            PageLookup::OutOfRange { last_page: 2 }
        );
    }

    #[test]
    fn empty_catalog_reports_corpus_empty() {
        let err = get_page(&Catalog::default(), 1, 10, Path::new("/corpus")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CorpusEmpty);
    }

    #[test]
    fn invalid_argument_wins_over_empty_corpus() {
        let err = get_page(&Catalog::default(), 0, 10, Path::new("/corpus")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = get_page(&catalog_of(3), 1, 0, Path::new("/corpus")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }
}
