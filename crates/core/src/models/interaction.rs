//! User-item interaction events

use crate::types::InteractionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded user-item interaction.
///
/// Immutable once written. Retention (30 days) is enforced by the
/// interaction store; readers supplying a time window never see expired
/// events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub kind: InteractionKind,
    /// Present iff `kind == Rating`, 1..=5
    pub rating: Option<u8>,
    pub order_quantity: u32,
    pub timestamp: DateTime<Utc>,
}

/// Input shape for recording a new interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub kind: InteractionKind,
    pub rating: Option<u8>,
    /// Defaults to 1 when not supplied
    pub order_quantity: Option<u32>,
}

impl NewInteraction {
    pub fn view(user_id: Uuid, item_id: Uuid) -> Self {
        Self {
            user_id,
            item_id,
            kind: InteractionKind::View,
            rating: None,
            order_quantity: None,
        }
    }

    pub fn order(user_id: Uuid, item_id: Uuid, quantity: u32) -> Self {
        Self {
            user_id,
            item_id,
            kind: InteractionKind::Order,
            rating: None,
            order_quantity: Some(quantity),
        }
    }

    pub fn rating(user_id: Uuid, item_id: Uuid, rating: u8) -> Self {
        Self {
            user_id,
            item_id,
            kind: InteractionKind::Rating,
            rating: Some(rating),
            order_quantity: None,
        }
    }

    pub fn favorite(user_id: Uuid, item_id: Uuid) -> Self {
        Self {
            user_id,
            item_id,
            kind: InteractionKind::Favorite,
            rating: None,
            order_quantity: None,
        }
    }

    /// Materialize into a stored interaction with a fresh id and timestamp
    pub fn into_interaction(self, timestamp: DateTime<Utc>) -> Interaction {
        Interaction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            item_id: self.item_id,
            kind: self.kind,
            rating: self.rating,
            order_quantity: self.order_quantity.unwrap_or(1),
            timestamp,
        }
    }
}
