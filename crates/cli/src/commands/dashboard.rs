//! Admin dashboard command.

use kotob_client::{ClientError, ClientState};
use kotob_core::Price;
use tracing::info;

pub async fn run(state: &ClientState) -> Result<(), ClientError> {
    if !state.auth().is_admin() {
        return Err(ClientError::NotAuthenticated);
    }

    let stats = state.dashboard().stats().await?;
    info!(
        books = stats.total_books,
        orders = stats.total_orders,
        today_revenue = %Price::new(stats.today_revenue),
        "Dashboard"
    );
    for (status, count) in &stats.status_breakdown {
        info!(orders = count, "{status}");
    }
    Ok(())
}
