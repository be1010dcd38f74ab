use std::future::Future;

/// Page size requested from the notifications endpoint (the API maximum).
pub const PER_PAGE: u32 = 100;

/// Parameters for one page fetch. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn first() -> Self {
        Self {
            page: 1,
            per_page: PER_PAGE,
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }
}

/// One page of results plus whether the server advertised another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

/// Fetch every page, starting at page 1, until `has_next` is false.
///
/// Results are concatenated in page order. The first failing fetch aborts
/// the walk and its error is returned.
pub async fn paginate<T, E, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, E>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut request = PageRequest::first();
    let mut all = Vec::new();

    loop {
        let page = fetch_page(request).await?;
        tracing::debug!(
            page = request.page,
            items = page.items.len(),
            has_next = page.has_next,
            "Fetched page"
        );
        all.extend(page.items);
        if !page.has_next {
            return Ok(all);
        }
        request = request.next();
    }
}
