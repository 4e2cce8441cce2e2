use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::booking::{
    Booking, BookingRow, BookingStatus, CreateBookingPayload, MaintenanceVisitRow,
    UpdateBookingPayload,
};
use crate::pricing::{self, EstimateResponse};
use crate::{validation, AppState};

/// Instant price quote. Pure: no auth, no side effects. Invalid input comes
/// back inside the envelope, not as a transport error.
pub fn estimate_price(rooftop_size_sq_ft: f64, system_type: &str) -> EstimateResponse {
    pricing::estimate(rooftop_size_sq_ft, system_type).into()
}

/// Request a booking. Runs the estimator and freezes its final price onto
/// the persisted row; re-estimating later never touches existing bookings.
pub async fn create_booking(
    state: &AppState,
    session_token: &str,
    payload: CreateBookingPayload,
) -> Result<Booking, AppError> {
    let session = crate::auth::guard::validate_session(state, session_token)?;

    validation::validate_location(&payload.location)?;

    let mut media = payload.media.unwrap_or_default();
    // An empty video URL means "no video"
    if media.video.as_deref() == Some("") {
        media.video = None;
    }
    validation::validate_media(&media)?;

    let quote = pricing::estimate(payload.rooftop_size_sq_ft, &payload.system_type)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let booking_id = uuid::Uuid::new_v4().to_string();
    let images_json = if media.images.is_empty() {
        None
    } else {
        Some(
            serde_json::to_string(&media.images)
                .map_err(|e| AppError::Internal(e.to_string()))?,
        )
    };

    sqlx::query(
        "INSERT INTO bookings (
            id, user_id, rooftop_size_sq_ft, system_type,
            address, city, state, pincode,
            estimated_price_inr, video, images
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&booking_id)
    .bind(&session.user_id)
    .bind(quote.rooftop_size_sq_ft)
    .bind(quote.system_type.as_str())
    .bind(&payload.location.address)
    .bind(&payload.location.city)
    .bind(&payload.location.state)
    .bind(&payload.location.pincode)
    .bind(quote.final_price)
    .bind(&media.video)
    .bind(&images_json)
    .execute(&state.db)
    .await?;

    crate::audit::log_activity(
        &state.db,
        Some(&session.user_id),
        "BOOKING_CREATE",
        &format!("Booking {} created", booking_id),
        Some(&serde_json::json!({
            "estimatedPriceINR": quote.final_price,
            "systemType": quote.system_type.as_str(),
        })),
    )
    .await;

    crate::log_info!(
        "BOOKING",
        "Booking created",
        serde_json::json!({ "bookingId": booking_id, "estimatedPriceINR": quote.final_price })
    );

    fetch_booking(&state.db, &booking_id).await
}

/// Bookings of the calling user, newest first.
pub async fn my_bookings(state: &AppState, session_token: &str) -> Result<Vec<Booking>, AppError> {
    let session = crate::auth::guard::validate_session(state, session_token)?;

    let rows = sqlx::query_as::<_, BookingRow>(
        "SELECT * FROM bookings WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(&session.user_id)
    .fetch_all(&state.db)
    .await?;

    assemble(&state.db, rows).await
}

/// All bookings, optionally filtered by status (Admin only).
pub async fn admin_list_bookings(
    state: &AppState,
    session_token: &str,
    status: Option<&str>,
) -> Result<Vec<Booking>, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    let rows = match status {
        Some(s) => {
            let status = BookingStatus::parse(s)?;
            sqlx::query_as::<_, BookingRow>(
                "SELECT * FROM bookings WHERE status = ? ORDER BY created_at DESC, id DESC",
            )
            .bind(status.as_str())
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, BookingRow>(
                "SELECT * FROM bookings ORDER BY created_at DESC, id DESC",
            )
            .fetch_all(&state.db)
            .await?
        }
    };

    assemble(&state.db, rows).await
}

/// One booking by id (Admin only).
pub async fn admin_get_booking(
    state: &AppState,
    session_token: &str,
    booking_id: &str,
) -> Result<Booking, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;
    fetch_booking(&state.db, booking_id).await
}

/// Advance a booking along its lifecycle (Admin only). The graph is a
/// straight line with a `rejected` escape; anything else is refused.
pub async fn transition_booking(
    state: &AppState,
    session_token: &str,
    booking_id: &str,
    new_status: &str,
) -> Result<Booking, AppError> {
    let session = crate::auth::guard::validate_admin(state, session_token)?;

    let new_status = BookingStatus::parse(new_status)?;
    let current = fetch_booking(&state.db, booking_id).await?.status;

    if current.is_terminal() {
        return Err(AppError::TerminalState(format!(
            "Booking is {} and accepts no further transition",
            current.as_str()
        )));
    }
    if !current.can_transition_to(new_status) {
        return Err(AppError::InvalidTransition(format!(
            "Cannot move booking from {} to {}",
            current.as_str(),
            new_status.as_str()
        )));
    }

    sqlx::query("UPDATE bookings SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(new_status.as_str())
        .bind(booking_id)
        .execute(&state.db)
        .await?;

    crate::audit::log_activity(
        &state.db,
        Some(&session.user_id),
        "BOOKING_TRANSITION",
        &format!(
            "Booking {} moved {} -> {}",
            booking_id,
            current.as_str(),
            new_status.as_str()
        ),
        None,
    )
    .await;

    fetch_booking(&state.db, booking_id).await
}

/// Edit the operational fields of a booking (Admin only). The frozen quote
/// is not reachable from here.
pub async fn update_booking_details(
    state: &AppState,
    session_token: &str,
    booking_id: &str,
    payload: UpdateBookingPayload,
) -> Result<Booking, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    let result = sqlx::query(
        "UPDATE bookings SET
            site_visit_date   = COALESCE(?, site_visit_date),
            assigned_staff_id = COALESCE(?, assigned_staff_id),
            notes             = COALESCE(?, notes),
            updated_at        = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(&payload.site_visit_date)
    .bind(&payload.assigned_staff_id)
    .bind(&payload.notes)
    .bind(booking_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Booking {} not found", booking_id)));
    }

    fetch_booking(&state.db, booking_id).await
}

/// Schedule a maintenance visit (Admin only). Only legal while the booking
/// is in `maintenance`; insertion order defines the visit sequence.
pub async fn append_maintenance_visit(
    state: &AppState,
    session_token: &str,
    booking_id: &str,
    date: &str,
    notes: Option<&str>,
) -> Result<Booking, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    if date.trim().is_empty() {
        return Err(AppError::Validation("Visit date must not be empty".into()));
    }

    let booking = fetch_booking(&state.db, booking_id).await?;
    if booking.status != BookingStatus::Maintenance {
        return Err(AppError::Validation(
            "Maintenance visits can only be scheduled while the booking is in maintenance".into(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let (next_seq,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(MAX(seq) + 1, 0) FROM maintenance_visits WHERE booking_id = ?",
    )
    .bind(booking_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO maintenance_visits (booking_id, seq, date, completed, notes)
         VALUES (?, ?, ?, 0, ?)",
    )
    .bind(booking_id)
    .bind(next_seq)
    .bind(date)
    .bind(notes)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    fetch_booking(&state.db, booking_id).await
}

/// Mark the visit at `visit_index` (insertion order, 0-based) as done.
/// Completing an already-completed visit is a no-op.
pub async fn mark_maintenance_visit_complete(
    state: &AppState,
    session_token: &str,
    booking_id: &str,
    visit_index: usize,
) -> Result<Booking, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    // Existence check first so a bad booking id reads as NotFound
    fetch_booking(&state.db, booking_id).await?;

    let visits = sqlx::query_as::<_, MaintenanceVisitRow>(
        "SELECT * FROM maintenance_visits WHERE booking_id = ? ORDER BY seq ASC",
    )
    .bind(booking_id)
    .fetch_all(&state.db)
    .await?;

    let visit = visits.get(visit_index).ok_or_else(|| {
        AppError::IndexOutOfRange(format!(
            "No maintenance visit at index {} (schedule has {})",
            visit_index,
            visits.len()
        ))
    })?;

    if !visit.completed {
        sqlx::query("UPDATE maintenance_visits SET completed = 1 WHERE id = ?")
            .bind(visit.id)
            .execute(&state.db)
            .await?;
    }

    fetch_booking(&state.db, booking_id).await
}

async fn fetch_booking(db: &SqlitePool, booking_id: &str) -> Result<Booking, AppError> {
    let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ?")
        .bind(booking_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

    let visits = sqlx::query_as::<_, MaintenanceVisitRow>(
        "SELECT * FROM maintenance_visits WHERE booking_id = ? ORDER BY seq ASC",
    )
    .bind(booking_id)
    .fetch_all(db)
    .await?;

    Booking::from_rows(row, visits)
}

async fn assemble(db: &SqlitePool, rows: Vec<BookingRow>) -> Result<Vec<Booking>, AppError> {
    let mut bookings = Vec::with_capacity(rows.len());
    for row in rows {
        let visits = sqlx::query_as::<_, MaintenanceVisitRow>(
            "SELECT * FROM maintenance_visits WHERE booking_id = ? ORDER BY seq ASC",
        )
        .bind(&row.id)
        .fetch_all(db)
        .await?;
        bookings.push(Booking::from_rows(row, visits)?);
    }
    Ok(bookings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{Location, Media};
    use crate::models::user::Role;
    use crate::test_util::{login_as, test_state};

    fn location() -> Location {
        Location {
            address: "14 Rose St".into(),
            city: "Pune".into(),
            state: "MH".into(),
            pincode: "411001".into(),
        }
    }

    fn payload() -> CreateBookingPayload {
        CreateBookingPayload {
            rooftop_size_sq_ft: 600.0,
            system_type: "soil".into(),
            location: location(),
            media: None,
        }
    }

    async fn booking_in_maintenance(
        state: &AppState,
        customer_token: &str,
        admin_token: &str,
    ) -> String {
        let booking = create_booking(state, customer_token, payload()).await.unwrap();
        for status in ["approved", "designing", "installation", "maintenance"] {
            transition_booking(state, admin_token, &booking.id, status).await.unwrap();
        }
        booking.id
    }

    #[tokio::test]
    async fn create_freezes_the_quote() {
        let state = test_state().await;
        let (user_id, token) = login_as(&state, Role::Customer).await;

        let booking = create_booking(&state, &token, payload()).await.unwrap();
        assert_eq!(booking.owner_user_id, user_id);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.estimated_price_inr, 60_000); // 600 * 100, no tier
        assert!(booking.maintenance_schedule.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_more_than_three_images() {
        let state = test_state().await;
        let (_, token) = login_as(&state, Role::Customer).await;

        let mut p = payload();
        p.media = Some(Media {
            video: None,
            images: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        });
        let err = create_booking(&state, &token, p).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let mut p = payload();
        p.media = Some(Media {
            video: None,
            images: vec!["a".into(), "b".into(), "c".into()],
        });
        let booking = create_booking(&state, &token, p).await.unwrap();
        assert_eq!(booking.media.images.len(), 3);
    }

    #[tokio::test]
    async fn create_propagates_estimator_errors() {
        let state = test_state().await;
        let (_, token) = login_as(&state, Role::Customer).await;

        let mut p = payload();
        p.rooftop_size_sq_ft = 20.0;
        let err = create_booking(&state, &token, p).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("Minimum rooftop size"));
    }

    #[tokio::test]
    async fn create_requires_full_location() {
        let state = test_state().await;
        let (_, token) = login_as(&state, Role::Customer).await;

        let mut p = payload();
        p.location.pincode = "".into();
        let err = create_booking(&state, &token, p).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn customers_cannot_transition() {
        let state = test_state().await;
        let (_, token) = login_as(&state, Role::Customer).await;

        let booking = create_booking(&state, &token, payload()).await.unwrap();
        let err = transition_booking(&state, &token, &booking.id, "approved")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }

    #[tokio::test]
    async fn transition_follows_the_graph() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        let booking = create_booking(&state, &customer, payload()).await.unwrap();

        // Skipping ahead is refused
        let err = transition_booking(&state, &admin, &booking.id, "designing")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");

        let updated = transition_booking(&state, &admin, &booking.id, "approved")
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Approved);

        // Rejection works from any non-terminal state
        let rejected = transition_booking(&state, &admin, &booking.id, "rejected")
            .await
            .unwrap();
        assert_eq!(rejected.status, BookingStatus::Rejected);

        // ...and is terminal
        let err = transition_booking(&state, &admin, &booking.id, "pending")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "terminal_state");
    }

    #[tokio::test]
    async fn completed_is_terminal() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        let id = booking_in_maintenance(&state, &customer, &admin).await;
        transition_booking(&state, &admin, &id, "completed").await.unwrap();

        for next in ["pending", "maintenance", "rejected"] {
            let err = transition_booking(&state, &admin, &id, next).await.unwrap_err();
            assert_eq!(err.kind(), "terminal_state");
        }
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        let booking = create_booking(&state, &customer, payload()).await.unwrap();
        let err = transition_booking(&state, &admin, &booking.id, "archived")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn maintenance_schedule_requires_maintenance_status() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        let booking = create_booking(&state, &customer, payload()).await.unwrap();
        let err = append_maintenance_visit(&state, &admin, &booking.id, "2026-09-15", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn maintenance_visits_keep_insertion_order() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        let id = booking_in_maintenance(&state, &customer, &admin).await;
        append_maintenance_visit(&state, &admin, &id, "2026-09-15", Some("first check"))
            .await
            .unwrap();
        let booking = append_maintenance_visit(&state, &admin, &id, "2026-10-15", None)
            .await
            .unwrap();

        assert_eq!(booking.maintenance_schedule.len(), 2);
        assert_eq!(booking.maintenance_schedule[0].date, "2026-09-15");
        assert_eq!(booking.maintenance_schedule[1].date, "2026-10-15");
        assert!(!booking.maintenance_schedule[0].completed);
    }

    #[tokio::test]
    async fn completing_a_visit_is_idempotent() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        let id = booking_in_maintenance(&state, &customer, &admin).await;
        append_maintenance_visit(&state, &admin, &id, "2026-09-15", None)
            .await
            .unwrap();

        let once = mark_maintenance_visit_complete(&state, &admin, &id, 0).await.unwrap();
        assert!(once.maintenance_schedule[0].completed);

        let twice = mark_maintenance_visit_complete(&state, &admin, &id, 0).await.unwrap();
        assert!(twice.maintenance_schedule[0].completed);

        let err = mark_maintenance_visit_complete(&state, &admin, &id, 5)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "index_out_of_range");
    }

    #[tokio::test]
    async fn detail_updates_leave_the_quote_alone() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;
        let (staff_id, admin) = login_as(&state, Role::Admin).await;

        let booking = create_booking(&state, &customer, payload()).await.unwrap();
        let updated = update_booking_details(
            &state,
            &admin,
            &booking.id,
            UpdateBookingPayload {
                site_visit_date: Some("2026-09-05".into()),
                assigned_staff_id: Some(staff_id.clone()),
                notes: Some("north-facing roof".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.site_visit_date.as_deref(), Some("2026-09-05"));
        assert_eq!(updated.assigned_staff_id, Some(staff_id));
        assert_eq!(updated.estimated_price_inr, booking.estimated_price_inr);
    }

    #[tokio::test]
    async fn listings_are_scoped() {
        let state = test_state().await;
        let (_, alice) = login_as(&state, Role::Customer).await;
        let (_, bob) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        create_booking(&state, &alice, payload()).await.unwrap();
        create_booking(&state, &bob, payload()).await.unwrap();

        assert_eq!(my_bookings(&state, &alice).await.unwrap().len(), 1);
        assert_eq!(
            admin_list_bookings(&state, &admin, None).await.unwrap().len(),
            2
        );
        assert_eq!(
            admin_list_bookings(&state, &admin, Some("pending")).await.unwrap().len(),
            2
        );
        assert_eq!(
            admin_list_bookings(&state, &admin, Some("approved")).await.unwrap().len(),
            0
        );

        let err = admin_list_bookings(&state, &alice, None).await.unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }
}
