pub mod error;
pub mod page;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use page::{ElementHandle, Locator, PageFactory, RenderablePage};
pub use storage::{HeadlineStorage, RowFilter};
pub use types::{content_hash, ArticleFields, ArticleRecord};
