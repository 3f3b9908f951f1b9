//! Database seeder for CampusPay development and testing.
//!
//! Seeds an admin, two students with opening balances, a few marketplace
//! items, and a housing listing with a pending tour request.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use campuspay_db::UserRepository;
use campuspay_db::entities::{
    housing_listings, market_items,
    sea_orm_active_enums::{ItemStatus, ListingStatus, TourPaymentStatus},
    tour_requests, users,
};
use campuspay_shared::{ROLE_ADMIN, ROLE_STUDENT};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("CAMPUSPAY__DATABASE__URL"))
        .expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = campuspay_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    let Some(_admin) = seed_user(&db, "admin@campuspay.dev", "Campus Admin", ROLE_ADMIN, Decimal::ZERO).await
    else {
        return;
    };
    let Some(seller) =
        seed_user(&db, "seller@campuspay.dev", "Tolu Seller", ROLE_STUDENT, Decimal::new(1_000, 0)).await
    else {
        return;
    };
    let Some(buyer) =
        seed_user(&db, "buyer@campuspay.dev", "Ada Buyer", ROLE_STUDENT, Decimal::new(50_000, 0)).await
    else {
        return;
    };
    let Some(landlord) =
        seed_user(&db, "landlord@campuspay.dev", "Mr Okafor", ROLE_STUDENT, Decimal::ZERO).await
    else {
        return;
    };

    println!("Seeding marketplace items...");
    seed_items(&db, seller.id).await;

    println!("Seeding housing...");
    seed_housing(&db, landlord.id, buyer.id).await;

    println!("Seeding complete!");
}

/// Returns the existing user with `email`, or creates one.
async fn seed_user(
    db: &DatabaseConnection,
    email: &str,
    full_name: &str,
    role: &str,
    opening_balance: Decimal,
) -> Option<users::Model> {
    let repo = UserRepository::new(db.clone());
    match repo.find_by_email(email).await {
        Ok(Some(user)) => {
            println!("  {email} already exists, skipping...");
            return Some(user);
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Failed to look up {email}: {e}");
            return None;
        }
    }

    match repo.create(email, full_name, role, opening_balance).await {
        Ok(user) => {
            println!("  Created {role} {email} with balance {opening_balance}");
            Some(user)
        }
        Err(e) => {
            eprintln!("Failed to insert {email}: {e}");
            None
        }
    }
}

async fn seed_items(db: &DatabaseConnection, seller_id: Uuid) {
    let existing = market_items::Entity::find()
        .filter(market_items::Column::SellerId.eq(seller_id))
        .one(db)
        .await
        .ok()
        .flatten();
    if existing.is_some() {
        println!("  Items already exist, skipping...");
        return;
    }

    let items = [
        ("Casio fx-991ES calculator", Decimal::new(8_500, 0)),
        ("Organic chemistry textbook", Decimal::new(12_000, 0)),
        ("Reading lamp", Decimal::new(4_250, 0)),
    ];

    for (title, price) in items {
        let now = Utc::now().into();
        let item = market_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            seller_id: Set(seller_id),
            title: Set(title.to_string()),
            description: Set(None),
            price: Set(price),
            status: Set(ItemStatus::Available),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if let Err(e) = item.insert(db).await {
            eprintln!("Failed to insert item {title}: {e}");
        } else {
            println!("  Created item: {title} ({price})");
        }
    }
}

async fn seed_housing(db: &DatabaseConnection, landlord_id: Uuid, requester_id: Uuid) {
    let existing = housing_listings::Entity::find()
        .filter(housing_listings::Column::LandlordId.eq(landlord_id))
        .one(db)
        .await
        .ok()
        .flatten();
    if existing.is_some() {
        println!("  Housing already exists, skipping...");
        return;
    }

    let now = Utc::now().into();
    let listing = housing_listings::ActiveModel {
        id: Set(Uuid::now_v7()),
        landlord_id: Set(landlord_id),
        title: Set("Self-contain, 5 minutes from the main gate".to_string()),
        rent_amount: Set(Decimal::new(180_000, 0)),
        status: Set(ListingStatus::Available),
        tenant_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let listing = match listing.insert(db).await {
        Ok(listing) => listing,
        Err(e) => {
            eprintln!("Failed to insert listing: {e}");
            return;
        }
    };
    println!("  Created listing: {}", listing.title);

    let tour = tour_requests::ActiveModel {
        id: Set(Uuid::now_v7()),
        listing_id: Set(listing.id),
        requester_id: Set(requester_id),
        host_id: Set(landlord_id),
        fee: Set(Decimal::new(2_000, 0)),
        payment_status: Set(TourPaymentStatus::Unpaid),
        paid_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    if let Err(e) = tour.insert(db).await {
        eprintln!("Failed to insert tour request: {e}");
    } else {
        println!("  Created unpaid tour request for the buyer");
    }
}
