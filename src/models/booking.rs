use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::pricing::SystemType;

/// Booking lifecycle states. The operational flow is a straight line with a
/// `rejected` escape hatch; `completed` and `rejected` accept no further
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Designing,
    Installation,
    Maintenance,
    Completed,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Designing => "designing",
            BookingStatus::Installation => "installation",
            BookingStatus::Maintenance => "maintenance",
            BookingStatus::Completed => "completed",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "designing" => Ok(BookingStatus::Designing),
            "installation" => Ok(BookingStatus::Installation),
            "maintenance" => Ok(BookingStatus::Maintenance),
            "completed" => Ok(BookingStatus::Completed),
            "rejected" => Ok(BookingStatus::Rejected),
            _ => Err(AppError::Validation("Invalid status value".into())),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Rejected)
    }

    /// The single forward successor in the operational flow.
    fn successor(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Pending => Some(BookingStatus::Approved),
            BookingStatus::Approved => Some(BookingStatus::Designing),
            BookingStatus::Designing => Some(BookingStatus::Installation),
            BookingStatus::Installation => Some(BookingStatus::Maintenance),
            BookingStatus::Maintenance => Some(BookingStatus::Completed),
            BookingStatus::Completed | BookingStatus::Rejected => None,
        }
    }

    /// A state may move to its successor or be rejected; terminal states
    /// move nowhere.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.successor() == Some(next) || next == BookingStatus::Rejected
    }
}

/// Postal location, also used as an order's shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Optional rooftop media: one video and/or up to three images.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// One scheduled follow-up on a booking in `maintenance` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceVisit {
    pub date: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_assigned_id: Option<String>,
}

/// Database row for a maintenance visit; `seq` fixes insertion order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MaintenanceVisitRow {
    pub id: i64,
    pub booking_id: String,
    pub seq: i64,
    pub date: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub staff_assigned_id: Option<String>,
}

impl From<MaintenanceVisitRow> for MaintenanceVisit {
    fn from(row: MaintenanceVisitRow) -> Self {
        Self {
            date: row.date,
            completed: row.completed,
            notes: row.notes,
            staff_assigned_id: row.staff_assigned_id,
        }
    }
}

/// Flat database row — for query_as.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: String,
    pub user_id: String,
    pub rooftop_size_sq_ft: i64,
    pub system_type: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub estimated_price_inr: i64,
    pub video: Option<String>,
    pub images: Option<String>,
    pub status: String,
    pub site_visit_date: Option<String>,
    pub assigned_staff_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Booking as sent to clients. `estimatedPriceINR` is the quote frozen at
/// creation; nothing ever rewrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub owner_user_id: String,
    pub rooftop_size_sq_ft: i64,
    pub system_type: SystemType,
    pub location: Location,
    #[serde(rename = "estimatedPriceINR")]
    pub estimated_price_inr: i64,
    pub media: Media,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_visit_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_staff_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub maintenance_schedule: Vec<MaintenanceVisit>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Booking {
    pub fn from_rows(
        row: BookingRow,
        visits: Vec<MaintenanceVisitRow>,
    ) -> Result<Self, AppError> {
        let system_type = SystemType::parse(&row.system_type)
            .ok_or_else(|| AppError::Internal(format!("corrupt system type '{}'", row.system_type)))?;
        let status = BookingStatus::parse(&row.status)?;
        let images: Vec<String> = match row.images.as_deref() {
            None => Vec::new(),
            Some(text) => serde_json::from_str(text)
                .map_err(|e| AppError::Internal(format!("corrupt images column: {}", e)))?,
        };

        Ok(Self {
            id: row.id,
            owner_user_id: row.user_id,
            rooftop_size_sq_ft: row.rooftop_size_sq_ft,
            system_type,
            location: Location {
                address: row.address,
                city: row.city,
                state: row.state,
                pincode: row.pincode,
            },
            estimated_price_inr: row.estimated_price_inr,
            media: Media {
                video: row.video,
                images,
            },
            status,
            site_visit_date: row.site_visit_date,
            assigned_staff_id: row.assigned_staff_id,
            notes: row.notes,
            maintenance_schedule: visits.into_iter().map(MaintenanceVisit::from).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Payload for requesting a booking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    pub rooftop_size_sq_ft: f64,
    pub system_type: String,
    pub location: Location,
    pub media: Option<Media>,
}

/// Staff-editable operational fields. The frozen quote is not among them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingPayload {
    pub site_visit_date: Option<String>,
    pub assigned_staff_id: Option<String>,
    pub notes: Option<String>,
}
