//! Lazy, paginated listings as streams.
//!
//! Every listing of the store is exposed page by page; `paginate` turns such a
//! page function into a flat stream of items that fetches the next page only
//! when the previous one has been consumed. A new stream always starts again at
//! the first page.

use std::future::Future;

use futures::{stream, Stream, TryStreamExt};

use crate::error::StoreError;
use crate::store::{BucketStore, ObjectVersion, Page, PageToken};

/// Flatten a page-fetching function into a stream of items.
pub fn paginate<T, F, Fut>(fetch_page: F) -> impl Stream<Item = Result<T, StoreError>>
where
    F: FnMut(Option<PageToken>) -> Fut,
    Fut: Future<Output = Result<Page<T>, StoreError>>,
{
    // `None` means the listing is exhausted, `Some(None)` asks for the first page
    let start: Option<Option<PageToken>> = Some(None);

    stream::try_unfold((fetch_page, start), |(mut fetch_page, cursor)| async move {
        let Some(token) = cursor else {
            return Ok::<_, StoreError>(None);
        };
        let page = fetch_page(token).await?;
        let cursor = page.next.map(Some);
        Ok::<_, StoreError>(Some((page.items, (fetch_page, cursor))))
    })
    .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, StoreError>)))
    .try_flatten()
}

/// All versions and delete markers of a bucket.
pub fn object_versions<'a, S>(store: &'a S, bucket_name: &'a str) -> impl Stream<Item = Result<ObjectVersion, StoreError>> + 'a
where
    S: BucketStore + ?Sized,
{
    paginate(move |token| store.list_object_versions_page(bucket_name, token))
}

/// All current object keys of a bucket.
pub fn object_keys<'a, S>(store: &'a S, bucket_name: &'a str) -> impl Stream<Item = Result<String, StoreError>> + 'a
where
    S: BucketStore + ?Sized,
{
    paginate(move |token| store.list_objects_page(bucket_name, token))
}
