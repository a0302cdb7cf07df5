use std::env;

use tracing::{error, info, warn, Instrument};

use marketplace_console::app_system::{setup_tracing, ConsoleSystem};
use marketplace_console::auth::Role;
use marketplace_console::config::Config;
use marketplace_console::domain::OrderStatus;
use marketplace_console::query::{Direction, ListQuery};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = Config::load().map_err(|e| e.to_string())?;
    info!("Starting console demo");

    let mut system = ConsoleSystem::new(&config).map_err(|e| e.to_string())?;
    if let Some(session) = system.auth.cached_session().await {
        info!(email = %session.email, "Last signed in as");
    }

    let credentials = (env::var("CONSOLE_DEMO_EMAIL"), env::var("CONSOLE_DEMO_PASSWORD"));
    let (Ok(email), Ok(password)) = credentials else {
        warn!("CONSOLE_DEMO_EMAIL / CONSOLE_DEMO_PASSWORD not set, nothing to do");
        return system.shutdown().await;
    };
    let role = match env::var("CONSOLE_DEMO_ROLE").as_deref() {
        Ok("vendor") => Role::Vendor,
        _ => Role::Admin,
    };

    let span = tracing::info_span!("sign_in");
    let signed_in = async { system.sign_in(&email, &password, role).await }
        .instrument(span)
        .await;

    match signed_in {
        Ok(session) => {
            info!(uid = %session.uid, role = %session.role, "Signed in");
            let span = tracing::info_span!("load_orders");
            let loaded = async {
                system.orders.refresh().await?;
                let query = ListQuery::new()
                    .filter("status", OrderStatus::Placed.as_str())
                    .sort_by("created_at", Direction::Descending);
                system.orders.view(&query).await
            }
            .instrument(span)
            .await;
            match loaded {
                Ok(placed) => info!(count = placed.len(), "Orders awaiting acceptance"),
                Err(e) => error!(error = %e, "Could not load orders"),
            }
        }
        Err(e) => error!(error = %e, "Sign-in failed"),
    }

    system.shutdown().await?;

    info!("Console demo completed");
    Ok(())
}
