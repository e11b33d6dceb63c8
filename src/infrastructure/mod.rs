// Core infrastructure modules
pub mod cache;              // Page-fragment cache
pub mod database;           // Persistence port
pub mod media_storage;      // Uploaded image files
pub mod middleware;         // Viewer context middleware and identity port
pub mod presenter;          // Presentation port
pub mod sqlite_database;    // SQLite adapter of the persistence port
pub mod viewer;             // Viewer context

pub use cache::{index_page_key, CacheEntry, FragmentCache};
pub use database::{DatabaseInterface, PostFilter};
pub use media_storage::MediaStorage;
pub use middleware::{HasIdentityProvider, IdentityProvider, TrustedHeaderIdentity, Vc};
pub use presenter::{Context, JsonPresenter, Presenter};
pub use sqlite_database::SqliteDatabase;
pub use viewer::ViewerContext;
