//! Demo shop seed script
//!
//! Seeds a demo barbershop with realistic Brazilian-Portuguese data:
//! - Owner account with an active subscription
//! - 6 catalog services (one inactive, to exercise public filtering)
//! - Working week: Tuesday-Friday 09:00-19:00, Saturday 09:00-15:00
//! - Appointments on the surrounding open days: completed and cancelled in
//!   the past, scheduled ahead
//!
//! Usage:
//!   DATABASE_URL=... DEMO_PASSWORD=Demo2024! ./seed-demo [--slug demo-barbearia]
//!
//! Environment variables:
//!   DATABASE_URL   - PostgreSQL connection string (required)
//!   DEMO_PASSWORD  - Password for the demo owner (default: Demo2024!)

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::env;
use uuid::Uuid;

use trimly_api::models::appointment::AppointmentStatus;
use trimly_api::models::owner::SubscriptionStatus;

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed a demo barbershop into the trimly database")]
struct Args {
    /// Shop slug to seed (an existing shop with this slug is wiped first)
    #[arg(long, default_value = "demo-barbearia")]
    slug: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let demo_password = env::var("DEMO_PASSWORD").unwrap_or_else(|_| "Demo2024!".to_string());
    let email = format!("dono@{}.trimly.app", args.slug);

    println!("=== Seed Demo Shop ===");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    trimly_api::db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // 1. Clean existing demo shop (cascades to services, hours, appointments)
    println!("Cleaning existing demo shop...");
    sqlx::query("DELETE FROM owners WHERE shop_slug = $1")
        .bind(&args.slug)
        .execute(&pool)
        .await
        .context("Failed to delete demo owner")?;

    // 2. Owner account (cost 10 for seed speed)
    println!("Creating owner account...");
    let password_hash =
        bcrypt::hash(&demo_password, 10).context("Failed to hash demo password")?;

    let owner_id: Uuid = sqlx::query_scalar(
        "INSERT INTO owners
             (email, password_hash, owner_name, shop_name, shop_slug, phone,
              subscription_status, trial_expires_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW() + INTERVAL '30 days')
         RETURNING id",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind("Rafael Moreira")
    .bind("Barbearia Vila Nova (Demo)")
    .bind(&args.slug)
    .bind("+55 11 3456-7890")
    .bind(SubscriptionStatus::Active)
    .fetch_one(&pool)
    .await
    .context("Failed to insert owner")?;

    // 3. Catalog
    println!("Inserting services...");
    // (name, description, duration_minutes, price_cents, is_active)
    let services: [(&str, &str, i32, i64, bool); 6] = [
        ("Corte de cabelo", "Corte clássico com tesoura e máquina", 30, 5000, true),
        ("Barba", "Barba completa com toalha quente", 30, 3500, true),
        ("Corte + Barba", "Combo corte e barba", 60, 7500, true),
        ("Sobrancelha", "Design de sobrancelha na navalha", 15, 1500, true),
        ("Luzes", "Luzes com touca", 90, 15000, true),
        ("Pacote noivo", "Pacote completo para o grande dia", 120, 30000, false),
    ];

    let mut service_ids: Vec<Uuid> = Vec::with_capacity(services.len());
    for (name, description, duration, price, is_active) in &services {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO services
                 (owner_id, name, description, duration_minutes, price_cents, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .bind(duration)
        .bind(price)
        .bind(is_active)
        .fetch_one(&pool)
        .await
        .with_context(|| format!("Failed to insert service {name}"))?;
        service_ids.push(id);
    }

    // 4. Working week: closed Sunday and Monday
    println!("Inserting working hours...");
    let closed = NaiveTime::MIN;
    // (day_of_week 0=Sunday, is_open, opens_at, closes_at)
    let week: [(i16, bool, NaiveTime, NaiveTime); 7] = [
        (0, false, closed, closed),
        (1, false, closed, closed),
        (2, true, t(9, 0), t(19, 0)),
        (3, true, t(9, 0), t(19, 0)),
        (4, true, t(9, 0), t(19, 0)),
        (5, true, t(9, 0), t(19, 0)),
        (6, true, t(9, 0), t(15, 0)),
    ];

    for (day_of_week, is_open, opens_at, closes_at) in &week {
        sqlx::query(
            "INSERT INTO working_hours (owner_id, day_of_week, is_open, opens_at, closes_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(owner_id)
        .bind(day_of_week)
        .bind(is_open)
        .bind(opens_at)
        .bind(closes_at)
        .execute(&pool)
        .await
        .context("Failed to insert working hours")?;
    }

    // 5. Appointments around today
    println!("Inserting appointments...");
    let today = Utc::now().date_naive();
    let past = open_days(today - Duration::days(1), 2, -1);
    let ahead = open_days(today, 3, 1);

    use AppointmentStatus::{Cancelled, Completed, Scheduled};
    // (date, hour, minute, service index, client name, client phone, status)
    let bookings: [(NaiveDate, u32, u32, usize, &str, &str, AppointmentStatus); 10] = [
        (past[0], 10, 0, 0, "João Pereira", "11 98765-4321", Completed),
        (past[0], 14, 0, 1, "Marcos Lima", "11 97654-3210", Completed),
        (past[1], 11, 0, 2, "Pedro Alves", "11 96543-2109", Completed),
        (past[1], 16, 0, 0, "Lucas Ferreira", "11 95432-1098", Cancelled),
        (ahead[0], 9, 0, 0, "Carlos Souza", "11 94321-0987", Scheduled),
        (ahead[0], 10, 30, 2, "André Santos", "11 93210-9876", Scheduled),
        (ahead[0], 13, 30, 1, "Felipe Costa", "11 92109-8765", Scheduled),
        (ahead[1], 9, 30, 4, "Thiago Rocha", "11 91098-7654", Scheduled),
        (ahead[1], 14, 0, 0, "Bruno Martins", "11 90987-6543", Scheduled),
        (ahead[2], 13, 0, 3, "Gustavo Dias", "11 98877-6655", Scheduled),
    ];

    for (date, hour, minute, idx, client_name, client_phone, status) in &bookings {
        let (name, _, duration, price, _) = services[*idx];
        let starts_at = date.and_time(t(*hour, *minute));
        let ends_at = starts_at + Duration::minutes(duration as i64);

        sqlx::query(
            "INSERT INTO appointments
                 (owner_id, service_id, service_name, service_duration_minutes,
                  service_price_cents, client_name, client_phone, starts_at, ends_at, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(owner_id)
        .bind(service_ids[*idx])
        .bind(name)
        .bind(duration)
        .bind(price)
        .bind(client_name)
        .bind(client_phone)
        .bind(starts_at)
        .bind(ends_at)
        .bind(status)
        .execute(&pool)
        .await
        .with_context(|| format!("Failed to insert appointment for {client_name}"))?;
    }

    println!();
    println!("=== Demo shop seeded successfully! ===");
    println!("  Shop     : Barbearia Vila Nova (Demo)");
    println!("  Slug     : {}", args.slug);
    println!("  Booking  : /public/{}", args.slug);
    println!("  Owner    : {email}");
    println!("  Password : {demo_password}");
    println!("  Services : {} ({} active)", services.len(), services.iter().filter(|s| s.4).count());
    println!("  Week     : Tue-Fri 09:00-19:00, Sat 09:00-15:00");
    println!("  Bookings : {} total", bookings.len());

    Ok(())
}

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// Walks from `from` one day at a time in `step` direction, collecting the
/// first `n` dates the demo shop is open (it closes Sundays and Mondays).
fn open_days(from: NaiveDate, n: usize, step: i64) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(n);
    let mut date = from;
    while days.len() < n {
        match date.weekday() {
            Weekday::Sun | Weekday::Mon => {}
            _ => days.push(date),
        }
        date += Duration::days(step);
    }
    days
}
