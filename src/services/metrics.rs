use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec, Counter,
    CounterVec, Gauge, GaugeVec,
};
use sqlx::PgPool;
use tracing::{info, warn};

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Login attempts by status",
        &["status"]
    ).unwrap();

    pub static ref REGISTRATIONS_COUNTER: Counter = register_counter!(
        "api_registrations_total",
        "Shop accounts created"
    ).unwrap();

    pub static ref BOOKINGS_COUNTER: CounterVec = register_counter_vec!(
        "api_bookings_total",
        "Appointments booked through the public flow, per shop",
        &["shop"]
    ).unwrap();

    pub static ref BOOKING_CONFLICTS_COUNTER: CounterVec = register_counter_vec!(
        "api_booking_conflicts_total",
        "Booking attempts rejected because the slot was taken, per shop",
        &["shop"]
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref SHOPS_GAUGE: Gauge = register_gauge!(
        "shops_bookable_total",
        "Shops whose trial or subscription is current"
    ).unwrap();

    pub static ref APPOINTMENTS_GAUGE: GaugeVec = register_gauge_vec!(
        "shop_appointments_scheduled_total",
        "Appointments currently in scheduled status, per shop",
        &["shop"]
    ).unwrap();

    pub static ref SERVICES_GAUGE: GaugeVec = register_gauge_vec!(
        "shop_services_active_total",
        "Active catalog services, per shop",
        &["shop"]
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        // Initial collection on startup
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let bookable: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)::BIGINT FROM owners
         WHERE subscription_status = 'active'
            OR (subscription_status = 'trial' AND trial_expires_at > NOW())",
    )
    .fetch_one(pool)
    .await?;
    SHOPS_GAUGE.set(bookable as f64);

    let scheduled: Vec<(String, i64)> = sqlx::query_as(
        "SELECT o.shop_slug, COUNT(a.id)::BIGINT
         FROM owners o
         LEFT JOIN appointments a ON a.owner_id = o.id AND a.status = 'scheduled'
         GROUP BY o.shop_slug",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_default();
    for (slug, count) in &scheduled {
        APPOINTMENTS_GAUGE.with_label_values(&[slug]).set(*count as f64);
    }

    let services: Vec<(String, i64)> = sqlx::query_as(
        "SELECT o.shop_slug, COUNT(s.id)::BIGINT
         FROM owners o
         LEFT JOIN services s ON s.owner_id = o.id AND s.is_active = TRUE
         GROUP BY o.shop_slug",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_default();
    for (slug, count) in &services {
        SERVICES_GAUGE.with_label_values(&[slug]).set(*count as f64);
    }

    info!("Metrics: collected for {} shop(s)", scheduled.len());
    Ok(())
}
