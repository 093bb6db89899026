//! Cart line items: products and workshop bookings.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Product identifier from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Workshop identifier from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkshopId(String);

impl WorkshopId {
    /// Creates a new workshop ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the workshop ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkshopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkshopId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Scheduled slot identifier within a workshop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    /// Creates a new slot ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the slot ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SlotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identity of a line within a cart.
///
/// Product lines reuse the product id; booking lines combine workshop
/// and slot, so the same workshop booked on two slots makes two lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartKey(String);

impl CartKey {
    /// The key for a plain product line.
    pub fn product(product_id: &ProductId) -> Self {
        Self(product_id.as_str().to_string())
    }

    /// The key for a workshop-booking line.
    pub fn booking(workshop_id: &WorkshopId, slot_id: &SlotId) -> Self {
        Self(format!("workshop:{}:{}", workshop_id, slot_id))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CartKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Booking attributes fixed when a workshop slot is added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    /// The booked slot.
    pub slot_id: SlotId,

    /// Date the slot runs on.
    pub slot_date: NaiveDate,

    /// Slot start time.
    pub starts_at: NaiveTime,

    /// Slot end time.
    pub ends_at: NaiveTime,

    /// Lead participant name.
    pub participant_name: String,

    /// Lead participant email.
    pub participant_email: String,

    /// Lead participant phone.
    pub participant_phone: String,

    /// Free-form requests collected at registration.
    pub special_requests: Option<String>,
}

/// What kind of purchasable unit a cart line is.
///
/// Consumers must match exhaustively: product semantics (quantity
/// stepper, merging on re-add) never apply to bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    /// A catalog product purchased by quantity.
    Product {
        /// The underlying catalog product.
        product_id: ProductId,
    },

    /// A single workshop booking; the whole line is atomic.
    WorkshopBooking {
        /// The underlying catalog workshop.
        workshop_id: WorkshopId,

        /// Attributes fixed at creation.
        booking: BookingDetails,
    },
}

/// A purchasable unit in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique identity of this line within the cart.
    pub cart_key: CartKey,

    /// Line kind with kind-specific attributes.
    #[serde(flatten)]
    pub kind: LineKind,

    /// Display name; not authoritative for pricing.
    pub name: String,

    /// Display image reference; not authoritative for pricing.
    pub image: Option<String>,

    /// Price per unit, snapshotted at add time.
    pub unit_price: Money,

    /// Quantity for products; participant count for bookings.
    pub quantity: u32,
}

impl LineItem {
    /// Creates a product line.
    pub fn product(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        let product_id = product_id.into();
        Self {
            cart_key: CartKey::product(&product_id),
            kind: LineKind::Product { product_id },
            name: name.into(),
            image: None,
            unit_price,
            quantity,
        }
    }

    /// Creates a workshop-booking line for `participants` people.
    pub fn booking(
        workshop_id: impl Into<WorkshopId>,
        name: impl Into<String>,
        unit_price: Money,
        participants: u32,
        booking: BookingDetails,
    ) -> Self {
        let workshop_id = workshop_id.into();
        Self {
            cart_key: CartKey::booking(&workshop_id, &booking.slot_id),
            kind: LineKind::WorkshopBooking {
                workshop_id,
                booking,
            },
            name: name.into(),
            image: None,
            unit_price,
            quantity: participants,
        }
    }

    /// Attaches a display image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Catalog id of the underlying product or workshop.
    pub fn reference_id(&self) -> &str {
        match &self.kind {
            LineKind::Product { product_id } => product_id.as_str(),
            LineKind::WorkshopBooking { workshop_id, .. } => workshop_id.as_str(),
        }
    }

    /// Returns true for workshop-booking lines.
    pub fn is_booking(&self) -> bool {
        matches!(self.kind, LineKind::WorkshopBooking { .. })
    }

    /// Returns the total price for this line (quantity × unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// How many units this line contributes to the cart count.
    ///
    /// Products count by quantity; a booking counts as one regardless of
    /// participant count.
    pub fn unit_count(&self) -> u32 {
        match self.kind {
            LineKind::Product { .. } => self.quantity,
            LineKind::WorkshopBooking { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_details(slot: &str) -> BookingDetails {
        BookingDetails {
            slot_id: SlotId::new(slot),
            slot_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            starts_at: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            ends_at: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            participant_name: "Asha Rao".to_string(),
            participant_email: "asha@example.com".to_string(),
            participant_phone: "9876543210".to_string(),
            special_requests: None,
        }
    }

    #[test]
    fn test_product_cart_key_is_product_id() {
        let item = LineItem::product("prod-7", "Vase", Money::from_rupees(500), 1);
        assert_eq!(item.cart_key.as_str(), "prod-7");
        assert_eq!(item.reference_id(), "prod-7");
        assert!(!item.is_booking());
    }

    #[test]
    fn test_booking_cart_key_combines_workshop_and_slot() {
        let item = LineItem::booking(
            "ws-3",
            "Wheel Throwing",
            Money::from_rupees(1200),
            2,
            booking_details("slot-9"),
        );
        assert_eq!(item.cart_key.as_str(), "workshop:ws-3:slot-9");
        assert_eq!(item.reference_id(), "ws-3");
        assert!(item.is_booking());
    }

    #[test]
    fn test_same_workshop_different_slots_are_distinct_keys() {
        let a = LineItem::booking(
            "ws-3",
            "Wheel Throwing",
            Money::from_rupees(1200),
            1,
            booking_details("slot-1"),
        );
        let b = LineItem::booking(
            "ws-3",
            "Wheel Throwing",
            Money::from_rupees(1200),
            1,
            booking_details("slot-2"),
        );
        assert_ne!(a.cart_key, b.cart_key);
    }

    #[test]
    fn test_line_total() {
        let item = LineItem::product("prod-1", "Bowl", Money::from_paise(1000), 3);
        assert_eq!(item.line_total().paise(), 3000);
    }

    #[test]
    fn test_unit_count_semantics() {
        let product = LineItem::product("prod-1", "Bowl", Money::from_paise(1000), 3);
        assert_eq!(product.unit_count(), 3);

        let booking = LineItem::booking(
            "ws-3",
            "Wheel Throwing",
            Money::from_rupees(1200),
            4,
            booking_details("slot-9"),
        );
        assert_eq!(booking.unit_count(), 1);
    }

    #[test]
    fn test_line_item_serialization_roundtrip() {
        let item = LineItem::booking(
            "ws-3",
            "Wheel Throwing",
            Money::from_rupees(1200),
            2,
            booking_details("slot-9"),
        )
        .with_image("workshops/wheel.jpg");

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("workshop_booking"));

        let deserialized: LineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }
}
