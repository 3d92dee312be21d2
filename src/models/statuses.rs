use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(
            AsExpression, FromSqlRow, Serialize, Deserialize, ToSchema,
            Clone, Copy, Debug, PartialEq, Eq,
        )]
        #[diesel(sql_type = Text)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = std::str::from_utf8(bytes.as_bytes())?;
                Self::parse(raw)
                    .ok_or_else(|| format!("Unrecognized {} value: {}", stringify!($name), raw).into())
            }
        }
    };
}

text_enum!(PromoStatus {
    Active => "active",
    Inactive => "inactive",
});

text_enum!(DiscountKind {
    Percentage => "percentage",
    Fixed => "fixed",
});

text_enum!(PromoUsageStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

text_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Preparing => "preparing",
    Delivered => "delivered",
    Completed => "completed",
    Cancelled => "cancelled",
});

text_enum!(OrderType {
    DineIn => "dine_in",
    Takeaway => "takeaway",
    Delivery => "delivery",
});

text_enum!(PaymentMethod {
    CreditCard => "credit_card",
    Cash => "cash",
    MobilePayment => "mobile_payment",
    Wallet => "wallet",
});

text_enum!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

text_enum!(PaymentGateway {
    Paypal => "paypal",
    Stripe => "stripe",
    Manual => "manual",
});

text_enum!(RefundStatus {
    NotRequested => "not_requested",
    Requested => "requested",
    Partial => "partial",
    Full => "full",
});

impl OrderStatus {
    /// Happy path runs pending -> confirmed -> preparing -> delivered -> completed.
    /// Cancellation stays open until the order reaches delivered.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Preparing)
                | (Confirmed, Delivered)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Preparing, Delivered)
                | (Preparing, Cancelled)
                | (Delivered, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}
