// FeedService - filtered, newest-first, paginated views over posts
// Sits above the persistence port and is shared by every feed handler

use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    entities::{PostRecord, UserId},
    error::AppResult,
    infrastructure::database::{DatabaseInterface, PostFilter},
};

/// Fixed page size of every feed.
pub const POSTS_PER_PAGE: u64 = 10;

/// Page arithmetic over a collection of `count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolves a raw `?page=` value: missing or non-numeric is page 1,
    /// anything out of range is the last page.
    pub fn page_number(&self, requested: Option<&str>) -> u64 {
        let last = self.num_pages();
        let Some(raw) = requested.map(str::trim) else {
            return 1;
        };
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return 1;
        }
        if negative {
            return last;
        }
        // Digits too large for u64 are still past the last page.
        match digits.parse::<u64>() {
            Ok(number) if (1..=last).contains(&number) => number,
            _ => last,
        }
    }

    pub fn offset(&self, number: u64) -> u64 {
        number.saturating_sub(1) * self.per_page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }
}

/// One page of a feed plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, number: u64, paginator: &Paginator) -> Self {
        let num_pages = paginator.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;
        Self {
            object_list,
            number,
            num_pages,
            count: paginator.count(),
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then(|| number - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.object_list.iter()
    }
}

#[derive(Clone)]
pub struct FeedService {
    db: Arc<dyn DatabaseInterface>,
}

impl FeedService {
    pub fn new(db: Arc<dyn DatabaseInterface>) -> Self {
        Self { db }
    }

    /// Page `requested` of the posts matching `filter`, newest first.
    #[instrument(skip(self))]
    pub async fn page(&self, filter: PostFilter, requested: Option<&str>) -> AppResult<Page<PostRecord>> {
        let paginator = Paginator::new(self.db.count_posts(&filter).await?, POSTS_PER_PAGE);
        let number = paginator.page_number(requested);
        let posts = self
            .db
            .list_posts(&filter, paginator.offset(number), paginator.per_page())
            .await?;
        Ok(Page::new(posts, number, &paginator))
    }

    /// Posts of every author `user_id` follows.
    pub async fn follow_feed(&self, user_id: UserId, requested: Option<&str>) -> AppResult<Page<PostRecord>> {
        let authors = self.db.followed_author_ids(user_id).await?;
        self.page(PostFilter::Authors(authors), requested).await
    }
}
