//! Cart commands. Work for guests and signed-in users alike.

use clap::Subcommand;
use kotob_client::checkout::apply_coupon;
use kotob_client::{ClientError, ClientState};
use kotob_core::BookId;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart, optionally pricing a coupon
    Show {
        #[arg(long)]
        coupon: Option<String>,
    },
    /// Add a book
    Add {
        id: BookId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity
    Update { id: BookId, quantity: u32 },
    /// Remove a line
    Remove { id: BookId },
    /// Empty the cart
    Clear,
    /// Move the guest cart into the signed-in account
    Merge,
}

pub async fn run(state: &ClientState, action: CartAction) -> Result<(), ClientError> {
    let cart = state.cart();
    match action {
        CartAction::Show { coupon } => {
            let items = cart.items();
            if items.is_empty() {
                info!(mode = ?cart.mode().await, "السلة فارغة");
                return Ok(());
            }
            for item in &items {
                output::cart_line(item);
            }
            let subtotal = cart.subtotal();
            let discount = match coupon.as_deref().map(|code| apply_coupon(code, subtotal)) {
                None => Decimal::ZERO,
                Some(Ok(discount)) => discount,
                Some(Err(e)) => {
                    warn!("{}", e.user_message());
                    Decimal::ZERO
                }
            };
            output::cart_totals(&items, subtotal, discount);
        }
        CartAction::Add { id, quantity } => {
            cart.add_to_cart(&id, quantity).await?;
            info!(items = cart.item_count(), "تمت إضافة الكتاب إلى السلة");
        }
        CartAction::Update { id, quantity } => {
            let items = cart.update_quantity(&id, quantity).await?;
            for item in &items {
                output::cart_line(item);
            }
        }
        CartAction::Remove { id } => {
            cart.remove_from_cart(&id).await?;
            info!(items = cart.item_count(), "تمت إزالة الكتاب من السلة");
        }
        CartAction::Clear => {
            cart.clear_cart().await?;
            info!("تم مسح السلة");
        }
        CartAction::Merge => {
            let report = cart.merge_cart_on_login().await?;
            output::merge("cart lines", &report);
        }
    }
    Ok(())
}
