use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::address::DeliveryTarget;
use crate::models::route::OrderRouteState;

/// Canonical order lifecycle vocabulary. Leg selection reads from this enum
/// only; consumers must not invent their own status-to-leg mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    PickedUp,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedOrder {
    pub id: Uuid,
    pub stage: OrderStage,
    pub driver_id: Option<Uuid>,
    pub restaurant: DeliveryTarget,
    pub customer: DeliveryTarget,
    pub route: OrderRouteState,
    pub trigger_seq: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
