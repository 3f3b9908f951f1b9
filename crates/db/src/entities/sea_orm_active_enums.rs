//! String-backed enums stored in `TEXT` columns with `CHECK` constraints.
//!
//! Each enum converts to and from its `campuspay_core::wallet` counterpart.
//! Repositories convert at the boundary and never leak entity enums upward.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

use campuspay_core::wallet::types as domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[sea_orm(string_value = "topup")]
    Topup,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "transfer_out")]
    TransferOut,
    #[sea_orm(string_value = "transfer_in")]
    TransferIn,
    #[sea_orm(string_value = "escrow_hold")]
    EscrowHold,
    #[sea_orm(string_value = "escrow_release")]
    EscrowRelease,
    #[sea_orm(string_value = "escrow_refund")]
    EscrowRefund,
    #[sea_orm(string_value = "tour_payment")]
    TourPayment,
    #[sea_orm(string_value = "tour_earning")]
    TourEarning,
    #[sea_orm(string_value = "rent_payment")]
    RentPayment,
    #[sea_orm(string_value = "rent_earning")]
    RentEarning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "pending_acceptance")]
    PendingAcceptance,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipping")]
    Shipping,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    #[sea_orm(string_value = "held")]
    Held,
    #[sea_orm(string_value = "released")]
    Released,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "sold")]
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TourPaymentStatus {
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "rented")]
    Rented,
}

/// Generates both `From` directions between an entity enum and the domain enum
/// of the same name.
macro_rules! mirror_enum {
    ($name:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<domain::$name> for $name {
            fn from(value: domain::$name) -> Self {
                match value {
                    $(domain::$name::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$name> for domain::$name {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(
    TransactionType,
    [
        Topup,
        Withdrawal,
        TransferOut,
        TransferIn,
        EscrowHold,
        EscrowRelease,
        EscrowRefund,
        TourPayment,
        TourEarning,
        RentPayment,
        RentEarning,
    ]
);
mirror_enum!(
    TransactionStatus,
    [Pending, PendingAcceptance, Completed, Failed, Rejected]
);
mirror_enum!(
    OrderStatus,
    [Pending, Processing, Shipping, Delivered, Cancelled]
);
mirror_enum!(EscrowStatus, [Held, Released, Refunded]);
mirror_enum!(ItemStatus, [Available, Sold]);
mirror_enum!(TourPaymentStatus, [Unpaid, Paid]);
mirror_enum!(ListingStatus, [Available, Rented]);

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveEnum, Iterable};

    #[test]
    fn test_string_values_match_core() {
        for ty in TransactionType::iter() {
            let domain_ty: domain::TransactionType = ty.into();
            assert_eq!(ty.to_value(), domain_ty.as_str());
        }
        for status in TransactionStatus::iter() {
            let domain_status: domain::TransactionStatus = status.into();
            assert_eq!(status.to_value(), domain_status.as_str());
        }
        for status in OrderStatus::iter() {
            let domain_status: domain::OrderStatus = status.into();
            assert_eq!(status.to_value(), domain_status.as_str());
        }
    }

    #[test]
    fn test_round_trip_through_core() {
        let status: EscrowStatus = domain::EscrowStatus::from(EscrowStatus::Refunded).into();
        assert_eq!(status, EscrowStatus::Refunded);
    }
}
