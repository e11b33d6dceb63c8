pub mod feed_service;

pub use feed_service::{FeedService, Page, Paginator, POSTS_PER_PAGE};
