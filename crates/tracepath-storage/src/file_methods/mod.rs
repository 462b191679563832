//! File methods classified by action and API origin

mod record;
mod store;
mod text;

pub use record::{Actions, ApiOrigin, FileMethod};
pub use store::{FileMethodStore, View};
