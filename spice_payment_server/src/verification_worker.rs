use std::time::Duration;

use log::*;
use spice_payment_engine::{SqliteDatabase, VerificationApi, VerificationStatus};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Starts the scheduled payment verification worker. Each tick runs the same sweep as `POST /verify-pending-payments`.
/// Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_verification_worker(api: VerificationApi<SqliteDatabase>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Payment verification worker started. Sweeping every {} min", period.as_secs() / 60);
        loop {
            timer.tick().await;
            info!("🕰️ Running scheduled payment verification");
            match api.verify_pending_payments().await {
                Ok(summary) => {
                    info!(
                        "🕰️ {} pending orders checked. {} confirmed, {} still pending, {} errors",
                        summary.verified, summary.confirmed, summary.still_pending, summary.errors
                    );
                    let failed = summary
                        .results
                        .iter()
                        .filter(|r| r.status == VerificationStatus::Error)
                        .map(|r| r.order_nsu.as_str())
                        .collect::<Vec<_>>();
                    if !failed.is_empty() {
                        debug!("🕰️ Orders that could not be verified: {}", failed.join(", "));
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running scheduled payment verification: {e}");
                },
            }
        }
    })
}
