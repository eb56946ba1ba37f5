//! Order commands.
//!
//! # Usage
//!
//! ```bash
//! kotob orders checkout --government الجيزة --full-name "Mona Adel" \
//!     --address "12 Nile St" --payment visa --coupon DISCOUNT10
//!
//! # Admin
//! kotob orders list --status pending --window week --search mona
//! kotob orders status 65f1c0a2e4 delivered --yes
//! kotob orders delete 65f1c0a2e4 --yes
//! ```

use chrono::Utc;
use clap::{Args, Subcommand};
use kotob_client::checkout::{GOVERNORATES, ShippingForm, apply_coupon};
use kotob_client::listing::{DateWindow, OrderFilter};
use kotob_client::{ClientError, ClientState};
use kotob_core::{OrderId, OrderStatus, OrderUpdate, PaymentMethod};
use tracing::{info, warn};

use crate::output;

#[derive(Subcommand)]
pub enum OrdersAction {
    /// Place an order for the signed-in cart
    Checkout {
        #[command(flatten)]
        shipping: ShippingArgs,

        /// Coupon code
        #[arg(long)]
        coupon: Option<String>,
    },
    /// List the governorates accepted at checkout
    Governorates,
    /// List orders (admin)
    List {
        /// Match on customer name, order ID or governorate
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        status: Option<OrderStatus>,

        #[arg(long)]
        payment: Option<PaymentMethod>,

        #[arg(long)]
        government: Option<String>,

        /// `today`, `week`, `month` or `year`
        #[arg(long)]
        window: Option<DateWindow>,
    },
    /// Show one order
    Show { id: OrderId },
    /// Change an order's status (admin)
    Status {
        id: OrderId,

        /// `pending`, `delivered` or `cancelled`
        status: OrderStatus,

        /// Confirm moves to delivered or cancelled
        #[arg(long)]
        yes: bool,
    },
    /// Edit an order's shipping details (admin)
    Update {
        id: OrderId,

        #[arg(long)]
        government: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        payment: Option<PaymentMethod>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Delete an order (admin)
    Delete {
        id: OrderId,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct ShippingArgs {
    #[arg(long)]
    government: String,

    #[arg(long)]
    full_name: String,

    #[arg(long)]
    address: String,

    #[arg(long, default_value = "cash")]
    payment: PaymentMethod,

    #[arg(long, default_value = "")]
    notes: String,
}

pub async fn run(state: &ClientState, action: OrdersAction) -> Result<(), ClientError> {
    match action {
        OrdersAction::Checkout { shipping, coupon } => {
            let sale_code = match coupon {
                Some(code) => {
                    let discount = apply_coupon(&code, state.cart().subtotal())?;
                    info!(discount = %discount, "تم تطبيق الكوبون");
                    code
                }
                None => String::new(),
            };
            let form = ShippingForm {
                government: shipping.government,
                full_name: shipping.full_name,
                address: shipping.address,
                payment_method: Some(shipping.payment),
                sale_code,
                notes: shipping.notes,
            };
            let order = state.checkout().checkout(form).await?;
            info!("تم تأكيد الطلب بنجاح!");
            output::order_detail(&order);
        }
        OrdersAction::Governorates => {
            for name in GOVERNORATES {
                info!("{name}");
            }
        }
        OrdersAction::List {
            search,
            status,
            payment,
            government,
            window,
        } => {
            let list = state.orders().list().await?;
            let filter = OrderFilter {
                search,
                status,
                payment_method: payment,
                government,
                window,
            };
            let matched = filter.apply(&list.orders, Utc::now());
            for order in &matched {
                output::order(order);
            }
            info!(shown = matched.len(), total = list.count, "Orders");
        }
        OrdersAction::Show { id } => {
            let order = state.orders().get(&id).await?;
            output::order_detail(&order);
            let choices: Vec<&str> = order
                .status
                .available_statuses()
                .into_iter()
                .map(OrderStatus::label)
                .collect();
            info!(locked = order.is_locked(), "Available statuses: {}", choices.join("، "));
        }
        OrdersAction::Status { id, status, yes } => {
            if status.requires_confirmation() && !yes {
                warn!(status = %status, "Pass --yes to confirm this status change");
                return Ok(());
            }
            let order = state.orders().update_status(&id, status).await?;
            info!("تم تحديث حالة الطلب");
            output::order(&order);
        }
        OrdersAction::Update {
            id,
            government,
            full_name,
            address,
            payment,
            notes,
            status,
        } => {
            let update = OrderUpdate {
                government,
                full_name,
                address,
                payment_method: payment,
                notes,
                status,
                ..OrderUpdate::default()
            };
            let order = state.orders().update(&id, &update).await?;
            info!("تم تحديث الطلب");
            output::order(&order);
        }
        OrdersAction::Delete { id, yes } => {
            if !yes {
                warn!(order_id = %id, "Pass --yes to confirm the deletion");
                return Ok(());
            }
            let message = state.orders().delete(&id).await?;
            info!("{}", message.as_deref().unwrap_or("تم حذف الطلب بنجاح"));
        }
    }
    Ok(())
}
