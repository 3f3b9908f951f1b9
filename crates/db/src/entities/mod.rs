//! `SeaORM` entities.

pub mod housing_listings;
pub mod market_items;
pub mod notifications;
pub mod orders;
pub mod sea_orm_active_enums;
pub mod tour_requests;
pub mod users;
pub mod wallet_transactions;
