//! Page-indexed access to search results.
//!
//! [`HasPages`] turns anything that can fetch one page of results by index
//! into a paginated, rank-addressable result set. Pages are fetched on first
//! access and memoized in a [`PageCache`] owned by the implementor, so each
//! query keeps its own pages and asking for the same index twice never hits
//! the network twice.
//!
//! The cache uses `Rc`/`RefCell` and is therefore neither `Send` nor `Sync`:
//! a paginated query belongs to the thread that created it. Callers that
//! need to share one across threads must synchronize externally.

use crate::error::{Result, ShodanError};
use crate::types::{Host, Page};
use std::cell::RefCell;
use std::collections::HashMap;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;
use std::rc::Rc;
use tracing::{debug, trace};

/// Conversions between global result ranks and page positions.
///
/// Ranks and page indices are 1-based; in-page offsets are 0-based. For
/// every `rank >= 1`:
///
/// ```rust
/// use shodan_core::pages::rank::{page_index_of, result_index_of, result_offset_of};
/// use std::num::NonZeroUsize;
///
/// let per_page = NonZeroUsize::new(20).unwrap();
/// let rank = 25;
/// assert_eq!(page_index_of(rank, per_page), 2);
/// assert_eq!(result_index_of(rank, per_page), 4);
/// assert_eq!(
///     result_offset_of(page_index_of(rank, per_page), per_page) + result_index_of(rank, per_page),
///     rank - 1
/// );
/// ```
pub mod rank {
    use std::num::NonZeroUsize;

    /// The page index holding the result with the given `rank`
    #[must_use]
    pub const fn page_index_of(rank: usize, per_page: NonZeroUsize) -> usize {
        rank.saturating_sub(1) / per_page.get() + 1
    }

    /// The 0-based offset of `rank` within its page
    #[must_use]
    pub const fn result_index_of(rank: usize, per_page: NonZeroUsize) -> usize {
        rank.saturating_sub(1) % per_page.get()
    }

    /// The number of results that precede the page at `page_index`.
    ///
    /// Saturates at `usize::MAX` for indices far past any real result set.
    #[must_use]
    pub const fn result_offset_of(page_index: usize, per_page: NonZeroUsize) -> usize {
        page_index.saturating_sub(1).saturating_mul(per_page.get())
    }
}

/// Memoized pages, keyed by 1-based page index.
///
/// Entries are never evicted. Failed fetches are not stored.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: RefCell<HashMap<usize, Rc<Page>>>,
}

impl PageCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached page at `index`, calling `fetch` to fill it on a miss
    pub fn get_or_fetch<F>(&self, index: usize, fetch: F) -> Result<Rc<Page>>
    where
        F: FnOnce(usize) -> Result<Page>,
    {
        if index == 0 {
            return Err(ShodanError::InvalidIndex(index));
        }

        if let Some(page) = self.pages.borrow().get(&index) {
            trace!(index, "page cache hit");
            return Ok(Rc::clone(page));
        }

        // The borrow is released before fetching so the fetch may consult the cache.
        let page = fetch(index)?;
        debug!(index, hosts = page.len(), "cached page");

        Ok(Rc::clone(
            self.pages
                .borrow_mut()
                .entry(index)
                .or_insert_with(|| Rc::new(page)),
        ))
    }

    /// The cached page at `index`, without fetching
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Rc<Page>> {
        self.pages.borrow().get(&index).cloned()
    }

    /// Returns true if the page at `index` has been fetched
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.pages.borrow().contains_key(&index)
    }

    /// Number of cached pages
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.borrow().len()
    }

    /// Returns true if nothing has been fetched yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.borrow().is_empty()
    }
}

/// Paginated access to a result set.
///
/// Implementors supply [`results_per_page`](Self::results_per_page), a way
/// to [`fetch_page`](Self::fetch_page) and a [`PageCache`] of their own; all
/// other methods are provided.
///
/// A fetched page that is empty marks the end of the results. Fetch errors
/// are returned to the caller unchanged and are never treated as the end.
pub trait HasPages {
    /// Maximum number of hosts on one page
    fn results_per_page(&self) -> NonZeroUsize;

    /// Fetch the page at the 1-based `index`.
    ///
    /// Returns an empty page when `index` is past the last page.
    fn fetch_page(&self, index: usize) -> Result<Page>;

    /// The cache owned by this result set
    fn page_cache(&self) -> &PageCache;

    /// The first page of results
    fn first_page(&self) -> Result<Rc<Page>> {
        self.page_at(1)
    }

    /// The page at the 1-based `index`, fetched on first access
    fn page_at(&self, index: usize) -> Result<Rc<Page>> {
        self.page_cache().get_or_fetch(index, |index| {
            debug!(index, "fetching page");
            self.fetch_page(index)
        })
    }

    /// The pages at each of `indices`, in order
    fn pages_at<I>(&self, indices: I) -> Result<Vec<Rc<Page>>>
    where
        I: IntoIterator<Item = usize>,
    {
        indices.into_iter().map(|index| self.page_at(index)).collect()
    }

    /// Visit the pages at each of `indices`, in order
    fn each_page<I, F>(&self, indices: I, mut visit: F) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
        F: FnMut(&Page),
    {
        for index in indices {
            visit(&*self.page_at(index)?);
        }
        Ok(())
    }

    /// Visit every host on the page at `index`
    fn each_on_page<F>(&self, index: usize, visit: F) -> Result<()>
    where
        F: FnMut(&Host),
    {
        let page = self.page_at(index)?;
        page.iter().for_each(visit);
        Ok(())
    }

    /// Visit every host on the pages at each of `indices`
    fn each_on_pages<I, F>(&self, indices: I, mut visit: F) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
        F: FnMut(&Host),
    {
        self.each_page(indices, |page| page.iter().for_each(&mut visit))
    }

    /// Lazily iterate over pages from the first until an empty one.
    ///
    /// Iterating again replays the cached pages.
    fn iter_pages(&self) -> Pages<'_, Self> {
        Pages {
            source: self,
            next: 1,
            done: false,
        }
    }

    /// Lazily iterate over the hosts of every page
    fn iter_hosts(&self) -> Hosts<'_, Self> {
        Hosts {
            pages: self.iter_pages(),
            current: None,
            offset: 0,
        }
    }

    /// Visit every page from the first until an empty one
    fn for_each_page<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Page),
    {
        for page in self.iter_pages() {
            visit(&*page?);
        }
        Ok(())
    }

    /// Visit every host on every page, in rank order
    fn for_each_host<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Host),
    {
        self.for_each_page(|page| page.iter().for_each(&mut visit))
    }

    /// The first host of the first page
    fn first_host(&self) -> Result<Host> {
        self.host_at(1)
    }

    /// The host with the given 1-based global `rank`
    fn host_at(&self, rank: usize) -> Result<Host> {
        if rank == 0 {
            return Err(ShodanError::InvalidIndex(rank));
        }

        let page_index = self.page_index_of(rank);
        let offset = self.result_index_of(rank);
        let page = self.page_at(page_index)?;

        page.get(offset)
            .cloned()
            .ok_or_else(|| ShodanError::IndexOutOfRange {
                rank,
                page: page_index,
                offset,
                len: page.len(),
            })
    }

    /// The page index holding `rank`
    fn page_index_of(&self, rank: usize) -> usize {
        rank::page_index_of(rank, self.results_per_page())
    }

    /// The 0-based offset of `rank` within its page
    fn result_index_of(&self, rank: usize) -> usize {
        rank::result_index_of(rank, self.results_per_page())
    }

    /// The number of results preceding the page at `page_index`
    fn result_offset_of(&self, page_index: usize) -> usize {
        rank::result_offset_of(page_index, self.results_per_page())
    }
}

/// Iterator over the non-empty pages of a [`HasPages`] source.
///
/// Stops at the first empty page, or after yielding the first error.
pub struct Pages<'a, S: ?Sized> {
    source: &'a S,
    next: usize,
    done: bool,
}

impl<S: HasPages + ?Sized> Iterator for Pages<'_, S> {
    type Item = Result<Rc<Page>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.source.page_at(self.next) {
            Ok(page) if page.is_empty() => {
                debug!(index = self.next, "reached end of results");
                self.done = true;
                None
            }
            Ok(page) => {
                self.next += 1;
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: HasPages + ?Sized> FusedIterator for Pages<'_, S> {}

/// Iterator over every host of a [`HasPages`] source, in rank order
pub struct Hosts<'a, S: ?Sized> {
    pages: Pages<'a, S>,
    current: Option<Rc<Page>>,
    offset: usize,
}

impl<S: HasPages + ?Sized> Iterator for Hosts<'_, S> {
    type Item = Result<Host>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(host) = self.current.as_ref().and_then(|page| page.get(self.offset)) {
                self.offset += 1;
                return Some(Ok(host.clone()));
            }

            match self.pages.next()? {
                Ok(page) => {
                    self.current = Some(page);
                    self.offset = 0;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<S: HasPages + ?Sized> FusedIterator for Hosts<'_, S> {}
