//! `SeaORM` Entity for tour_requests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TourPaymentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tour_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub listing_id: Uuid,
    pub requester_id: Uuid,
    pub host_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub fee: Decimal,
    pub payment_status: TourPaymentStatus,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::housing_listings::Entity",
        from = "Column::ListingId",
        to = "super::housing_listings::Column::Id"
    )]
    HousingListings,
}

impl Related<super::housing_listings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HousingListings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
