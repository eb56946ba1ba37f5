//! Favorites commands.

use clap::Subcommand;
use kotob_client::{ClientError, ClientState};
use kotob_core::BookId;
use tracing::info;

use crate::output;

#[derive(Subcommand)]
pub enum FavoritesAction {
    /// List favorites
    Show,
    /// Add the book if it is not a favorite, remove it otherwise
    Toggle { id: BookId },
    /// Remove every favorite
    Clear,
    /// Move guest favorites into the signed-in account
    Merge,
}

pub async fn run(state: &ClientState, action: FavoritesAction) -> Result<(), ClientError> {
    let favorites = state.favorites();
    match action {
        FavoritesAction::Show => {
            let items = favorites.items();
            for item in &items {
                output::favorite(item);
            }
            info!(count = items.len(), mode = ?favorites.mode().await, "Favorites");
        }
        FavoritesAction::Toggle { id } => {
            let outcome = favorites.toggle_favorite(&id).await?;
            if outcome.is_added {
                info!("تمت إضافة الكتاب إلى المفضلة");
            } else if outcome.is_removed {
                info!("تمت إزالة الكتاب من المفضلة");
            } else {
                info!("الكتاب موجود بالفعل في المفضلة");
            }
        }
        FavoritesAction::Clear => {
            favorites.clear_favorites().await?;
            info!("تم مسح المفضلة");
        }
        FavoritesAction::Merge => {
            let report = favorites.merge_favorites_on_login().await?;
            output::merge("favorites", &report);
        }
    }
    Ok(())
}
