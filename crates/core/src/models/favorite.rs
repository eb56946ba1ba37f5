//! Favorite entries.

use serde::{Deserialize, Serialize};

use super::book::Book;
use crate::types::BookId;

/// A favorited book. Membership only; there is no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub book: Book,
}

impl FavoriteItem {
    /// Wrap a full book snapshot.
    #[must_use]
    pub const fn new(book: Book) -> Self {
        Self { book }
    }

    /// Identifier of the favorited book.
    #[must_use]
    pub const fn book_id(&self) -> &BookId {
        &self.book.id
    }
}
