//! Favorite recipients.
//!
//! The target owner's name is looked up at read time, so a favorite whose
//! target disappeared still lists, without a name.

mod service;
mod types;

pub use service::{AddFavoriteRequest, FavoriteService, UpdateFavoriteRequest};
pub use types::{Favorite, FavoriteView, MAX_MEMO_CHARS, MAX_NICKNAME_CHARS};
