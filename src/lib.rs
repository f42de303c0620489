//! Ordered-list editing for the blog admin: FAQ entries, popular posts and
//! flexible-content sections are loaded from the admin API, edited locally
//! and saved back as a whole.
pub mod config;
pub mod editor;
pub mod icon;
pub mod model;
pub mod payload;
pub mod store;

pub use editor::{EditorError, EditorState, EmptyPolicy, ListEditor, RevertPolicy};
pub use model::{Direction, Item, ItemId};
pub use store::{ListStore, RestListStore};
