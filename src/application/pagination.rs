//! Page-number pagination for post listings.
//!
//! Requested page numbers are resolved leniently: anything that is not an
//! integer yields the first page, integers outside `1..=num_pages` yield the
//! last page, and an empty listing still has one (empty) page.

use std::num::{IntErrorKind, NonZeroU32};

use serde::Serialize;

/// Query-string parameter carrying the requested page number.
pub const PAGE_QUERY_PARAM: &str = "page";

/// A page number as requested by the client, before it is resolved against
/// the size of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumber {
    #[default]
    Invalid,
    Number(i64),
}

impl PageNumber {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Invalid;
        };
        match raw.trim().parse::<i64>() {
            Ok(value) => Self::Number(value),
            Err(err) => match err.kind() {
                IntErrorKind::PosOverflow => Self::Number(i64::MAX),
                IntErrorKind::NegOverflow => Self::Number(i64::MIN),
                _ => Self::Invalid,
            },
        }
    }
}

/// Row range to fetch for a resolved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
}

impl Paginator {
    pub fn new(per_page: NonZeroU32) -> Self {
        Self {
            per_page: u64::from(per_page.get()),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }

    /// Resolve `requested` against a listing of `total` items.
    pub fn window(&self, total: u64, requested: PageNumber) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match requested {
            PageNumber::Invalid => 1,
            PageNumber::Number(value) if value >= 1 && (value as u64) <= num_pages => value as u64,
            PageNumber::Number(_) => num_pages,
        };
        let offset = (number - 1) * self.per_page;
        let limit = self.per_page.min(total.saturating_sub(offset));

        PageWindow {
            number,
            num_pages,
            total,
            offset,
            limit,
        }
    }
}

/// One page of a listing together with the navigation data templates need.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    pub fn previous_page_number(&self) -> u64 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u64 {
        (self.number + 1).min(self.num_pages)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
