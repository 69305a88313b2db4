//! Database seeder for Mizan development and testing.
//!
//! Seeds the canonical global obligation rules and a handful of demo
//! customers for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use mizan_core::obligation::default_rules;
use mizan_db::entities::{customers, obligation_rules};

/// Demo capital company ID (consistent for all seeds)
const DEMO_CAPITAL_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo personal company ID (consistent for all seeds)
const DEMO_PERSONAL_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo inactive company ID (consistent for all seeds)
const DEMO_INACTIVE_ID: &str = "00000000-0000-0000-0000-000000000003";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = mizan_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding canonical obligation rules...");
    seed_rules(&db).await;

    println!("Seeding demo customers...");
    seed_customers(&db).await;

    println!("Seeding complete!");
}

/// Inserts the canonical rule set, skipping types that already exist.
async fn seed_rules(db: &DatabaseConnection) {
    let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

    for rule in default_rules() {
        let existing = obligation_rules::Entity::find()
            .filter(obligation_rules::Column::ObligationType.eq(rule.obligation_type.clone()))
            .one(db)
            .await
            .expect("Failed to query obligation rules");

        if existing.is_some() {
            println!("  {} already seeded, skipping", rule.obligation_type);
            continue;
        }

        let model = obligation_rules::ActiveModel {
            id: Set(Uuid::new_v4()),
            obligation_type: Set(rule.obligation_type.clone()),
            frequency: Set(rule.frequency.as_str().to_string()),
            due_day: Set(narrow(rule.due_day)),
            due_hour: Set(narrow(rule.due_hour)),
            due_minute: Set(narrow(rule.due_minute)),
            due_month: Set(rule.due_month.map(narrow)),
            quarter_offset: Set(rule.quarter_offset.map(narrow)),
            applicable_quarters: Set(rule.applicable_quarters.to_csv()),
            skip_fourth_quarter: Set(rule.skip_fourth_quarter),
            enabled: Set(rule.enabled),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model
            .insert(db)
            .await
            .expect("Failed to insert obligation rule");
        println!("  seeded {}", rule.obligation_type);
    }
}

/// Inserts the demo customers if not present.
async fn seed_customers(db: &DatabaseConnection) {
    let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

    let demo_customers = [
        (
            DEMO_CAPITAL_ID,
            "Demo Anonim A.S.",
            "CAPITAL",
            "BALANCE",
            true,
            true,
            Some("₺2.500,00"),
            NaiveDate::from_ymd_opt(2023, 3, 15),
        ),
        (
            DEMO_PERSONAL_ID,
            "Demo Sahis Isletmesi",
            "PERSONAL",
            "OPERATING",
            false,
            true,
            Some("1.200,50"),
            NaiveDate::from_ymd_opt(2024, 1, 2),
        ),
        (
            DEMO_INACTIVE_ID,
            "Kapali Ltd.",
            "CAPITAL",
            "BALANCE",
            true,
            false,
            None,
            NaiveDate::from_ymd_opt(2020, 6, 1),
        ),
    ];

    for (id, name, company_type, ledger_type, has_employees, is_active, fee, established_on) in
        demo_customers
    {
        let id = Uuid::parse_str(id).expect("Invalid demo customer id");

        let existing = customers::Entity::find_by_id(id)
            .one(db)
            .await
            .expect("Failed to query customers");

        if existing.is_some() {
            println!("  {name} already seeded, skipping");
            continue;
        }

        let model = customers::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            company_type: Set(company_type.to_string()),
            ledger_type: Set(ledger_type.to_string()),
            has_employees: Set(has_employees),
            is_active: Set(is_active),
            subscription_fee: Set(fee.map(String::from)),
            established_on: Set(established_on),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(db).await.expect("Failed to insert customer");
        println!("  seeded {name}");
    }
}

/// Narrows a validated rule field into its column type.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn narrow(value: u32) -> i16 {
    value as i16
}
