//! Cursor-driven paging over remote collections.
//!
//! A [`PageSource`] knows how to fetch one page after a cursor. A
//! [`Paginator`] drives it one page per call, so callers can process items as
//! they arrive and stop whenever they like.

use std::collections::HashSet;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the remote side reports no further pages.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, has_next_page: bool, end_cursor: Option<String>) -> Self {
        let next_cursor = if has_next_page { end_cursor } else { None };
        Self { items, next_cursor }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

pub trait PageSource {
    type Item;
    type Error;

    fn fetch_page(
        &mut self,
        after: Option<String>,
    ) -> impl Future<Output = Result<Page<Self::Item>, Self::Error>>;
}

#[derive(Debug)]
pub struct Paginator<S> {
    source: S,
    cursor: Option<String>,
    seen: HashSet<String>,
    pages_fetched: usize,
    done: bool,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cursor: None,
            seen: HashSet::new(),
            pages_fetched: 0,
            done: false,
        }
    }

    /// Continues a sequence whose pages up to `cursor` were already consumed.
    pub fn resume(source: S, cursor: String) -> Self {
        let mut paginator = Self::new(source);
        paginator.seen.insert(cursor.clone());
        paginator.cursor = Some(cursor);
        paginator
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page. Returns `Ok(None)` once the sequence is exhausted.
    ///
    /// A failed fetch leaves the cursor untouched, so the same page is requested
    /// again on the next call.
    pub async fn next_page(&mut self) -> Result<Option<Vec<S::Item>>, S::Error> {
        if self.done {
            return Ok(None);
        }
        let page = self.source.fetch_page(self.cursor.clone()).await?;
        self.pages_fetched += 1;
        match page.next_cursor {
            // a repeated cursor would loop forever
            Some(next) if self.seen.insert(next.clone()) => self.cursor = Some(next),
            _ => self.done = true,
        }
        Ok(Some(page.items))
    }

    pub async fn collect_all(mut self) -> Result<Vec<S::Item>, S::Error> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}
