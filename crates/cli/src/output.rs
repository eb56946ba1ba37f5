//! Report results as `tracing` events.

use kotob_client::images::primary_image_url;
use kotob_client::services::MergeReport;
use kotob_core::{Book, CartItem, FavoriteItem, Order, Price};
use rust_decimal::Decimal;
use tracing::{info, warn};

pub fn book(api_base: &str, book: &Book) {
    info!(
        id = %book.id,
        name = %book.name,
        category = %book.category,
        price = %Price::new(book.price),
        offer = %book.offer,
        final_price = %Price::new(book.final_price()),
        quantity = book.quantity,
        image = %primary_image_url(api_base, &book.imgs),
        "{}",
        book.display_title()
    );
}

pub fn cart_line(item: &CartItem) {
    info!(
        id = %item.book_id(),
        quantity = item.quantity,
        unit_price = %Price::new(item.unit_price()),
        line_total = %Price::new(item.line_total()),
        "{}",
        item.book.display_title()
    );
}

pub fn cart_totals(items: &[CartItem], subtotal: Decimal, discount: Decimal) {
    info!(
        lines = items.len(),
        subtotal = %Price::new(subtotal),
        discount = %Price::new(discount),
        total = %Price::new(subtotal - discount),
        "Cart"
    );
}

pub fn favorite(item: &FavoriteItem) {
    info!(id = %item.book_id(), price = %Price::new(item.book.final_price()), "{}", item.book.display_title());
}

pub fn order(order: &Order) {
    info!(
        id = %order.id,
        reference = %order.short_id(),
        status = %order.status,
        customer = %order.full_name,
        government = %order.government,
        payment = %order.payment_method,
        total = %Price::new(order.total_amount),
        items = order.items.len(),
        created_at = %order.created_at,
        "Order"
    );
}

pub fn order_detail(order: &Order) {
    self::order(order);
    for item in &order.items {
        info!(
            book_id = %item.book.id,
            quantity = item.quantity,
            price = %Price::new(item.price),
            "  {}",
            item.book.name
        );
    }
    if let Some(code) = &order.sale_code {
        info!(sale_code = %code, "  Coupon");
    }
    if let Some(notes) = &order.notes {
        info!(notes = %notes, "  Notes");
    }
}

pub fn merge(what: &str, report: &MergeReport) {
    if report.merged > 0 {
        info!(merged = report.merged, "Guest {what} merged into account");
    }
    for failure in &report.failures {
        warn!(book_id = %failure.book_id, "Could not merge guest {what}: {}", failure.reason);
    }
}
