use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::service::Service;

/// Where a booking session currently stands. `Confirmation` is terminal:
/// once reached, the session only serves reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    SelectService,
    SelectDateTime,
    EnterDetails,
    Confirmation,
}

/// Catalog snapshot taken when the client picks a service, so the session
/// stays coherent even if the owner edits the catalog mid-booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowService {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
}

impl From<&Service> for FlowService {
    fn from(s: &Service) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            duration_minutes: s.duration_minutes,
            price_cents: s.price_cents,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlowSlot {
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}

/// One client's booking session, stored as JSON in Redis and advanced step
/// by step. All transition checks live here; the HTTP layer only validates
/// inputs against the database before applying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingFlow {
    pub id: Uuid,
    pub step: BookingStep,
    pub service: Option<FlowService>,
    pub date: Option<NaiveDate>,
    pub slot: Option<FlowSlot>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub appointment_id: Option<Uuid>,
}

impl BookingFlow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: BookingStep::SelectService,
            service: None,
            date: None,
            slot: None,
            client_name: None,
            client_phone: None,
            appointment_id: None,
        }
    }

    fn ensure_not_confirmed(&self) -> Result<(), ApiError> {
        if self.step == BookingStep::Confirmation {
            Err(ApiError::Conflict("Booking already confirmed".into()))
        } else {
            Ok(())
        }
    }

    pub fn pick_service(&mut self, service: FlowService) -> Result<(), ApiError> {
        self.ensure_not_confirmed()?;
        if self.step != BookingStep::SelectService {
            return Err(ApiError::Conflict("A service is already selected".into()));
        }
        self.service = Some(service);
        self.step = BookingStep::SelectDateTime;
        Ok(())
    }

    /// Changing the date always discards a previously chosen slot.
    pub fn pick_date(&mut self, date: NaiveDate) -> Result<(), ApiError> {
        self.ensure_not_confirmed()?;
        if self.step != BookingStep::SelectDateTime {
            return Err(ApiError::Conflict("Select a service first".into()));
        }
        self.date = Some(date);
        self.slot = None;
        Ok(())
    }

    pub fn pick_slot(&mut self, slot: FlowSlot) -> Result<(), ApiError> {
        self.ensure_not_confirmed()?;
        if self.step != BookingStep::SelectDateTime {
            return Err(ApiError::Conflict("Select a service first".into()));
        }
        let date = self
            .date
            .ok_or_else(|| ApiError::Conflict("Select a date first".into()))?;
        if slot.starts_at.date() != date {
            return Err(ApiError::Conflict("Slot does not match the selected date".into()));
        }
        self.slot = Some(slot);
        Ok(())
    }

    pub fn proceed_to_details(&mut self) -> Result<(), ApiError> {
        self.ensure_not_confirmed()?;
        if self.step != BookingStep::SelectDateTime {
            return Err(ApiError::Conflict("Select a service first".into()));
        }
        if self.slot.is_none() {
            return Err(ApiError::Conflict("Select a time slot first".into()));
        }
        self.step = BookingStep::EnterDetails;
        Ok(())
    }

    /// Checks the session is ready to confirm and hands back the snapshot
    /// the booking insert needs. Read-only so the caller can attempt the
    /// insert before sealing the session.
    pub fn confirmable(&self) -> Result<(FlowService, FlowSlot), ApiError> {
        self.ensure_not_confirmed()?;
        if self.step != BookingStep::EnterDetails {
            return Err(ApiError::Conflict("Enter your details first".into()));
        }
        match (&self.service, self.slot) {
            (Some(service), Some(slot)) => Ok((service.clone(), slot)),
            _ => Err(ApiError::Conflict("Enter your details first".into())),
        }
    }

    /// Records the booked appointment and seals the session.
    pub fn confirm(
        &mut self,
        client_name: String,
        client_phone: String,
        appointment_id: Uuid,
    ) -> Result<(), ApiError> {
        self.ensure_not_confirmed()?;
        if self.step != BookingStep::EnterDetails {
            return Err(ApiError::Conflict("Enter your details first".into()));
        }
        self.client_name = Some(client_name);
        self.client_phone = Some(client_phone);
        self.appointment_id = Some(appointment_id);
        self.step = BookingStep::Confirmation;
        Ok(())
    }

    /// One step backwards. Leaving the date/time screen discards the chosen
    /// service, date and slot (the grid depends on the service, so nothing
    /// picked there can outlive it); leaving the details screen keeps
    /// everything.
    pub fn back(&mut self) -> Result<(), ApiError> {
        self.ensure_not_confirmed()?;
        match self.step {
            BookingStep::SelectService => {
                Err(ApiError::Conflict("Already at the first step".into()))
            }
            BookingStep::SelectDateTime => {
                self.service = None;
                self.date = None;
                self.slot = None;
                self.step = BookingStep::SelectService;
                Ok(())
            }
            BookingStep::EnterDetails => {
                self.step = BookingStep::SelectDateTime;
                Ok(())
            }
            BookingStep::Confirmation => unreachable!("guarded above"),
        }
    }

    /// Throws the whole selection away and starts over.
    pub fn restart(&mut self) -> Result<(), ApiError> {
        self.ensure_not_confirmed()?;
        let id = self.id;
        *self = BookingFlow::new();
        self.id = id;
        Ok(())
    }
}

impl Default for BookingFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Redis persistence for booking sessions, keyed per shop so session ids
/// cannot be replayed across shops.
pub struct FlowStore;

impl FlowStore {
    fn key(slug: &str, id: Uuid) -> String {
        format!("booking:{}:{}", slug, id)
    }

    pub async fn save(
        redis: &mut redis::aio::MultiplexedConnection,
        slug: &str,
        flow: &BookingFlow,
        ttl_seconds: u64,
    ) -> Result<(), ApiError> {
        let payload = serde_json::to_string(flow)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Serialize booking session: {e}")))?;
        redis::cmd("SET")
            .arg(Self::key(slug, flow.id))
            .arg(payload)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<()>(redis)
            .await?;
        Ok(())
    }

    pub async fn load(
        redis: &mut redis::aio::MultiplexedConnection,
        slug: &str,
        id: Uuid,
    ) -> Result<BookingFlow, ApiError> {
        let payload: Option<String> = redis::cmd("GET")
            .arg(Self::key(slug, id))
            .query_async(redis)
            .await?;
        let payload = payload
            .ok_or_else(|| ApiError::NotFound("Booking session not found or expired".into()))?;
        serde_json::from_str(&payload)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Deserialize booking session: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn service() -> FlowService {
        FlowService {
            id: Uuid::new_v4(),
            name: "Corte".into(),
            duration_minutes: 30,
            price_cents: 5000,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn slot_on(d: u32, h: u32) -> FlowSlot {
        let starts_at = day(d).and_time(NaiveTime::from_hms_opt(h, 0, 0).unwrap());
        FlowSlot {
            starts_at,
            ends_at: starts_at + chrono::Duration::minutes(30),
        }
    }

    fn is_conflict(e: ApiError) -> bool {
        matches!(e, ApiError::Conflict(_))
    }

    #[test]
    fn test_happy_path_reaches_confirmation() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        flow.pick_slot(slot_on(2, 10)).unwrap();
        flow.proceed_to_details().unwrap();
        let appointment = Uuid::new_v4();
        flow.confirm("Ana".into(), "11988887777".into(), appointment).unwrap();

        assert_eq!(flow.step, BookingStep::Confirmation);
        assert_eq!(flow.appointment_id, Some(appointment));
        assert_eq!(flow.client_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_operations_out_of_order_are_rejected() {
        let mut flow = BookingFlow::new();
        assert!(is_conflict(flow.pick_date(day(2)).unwrap_err()));
        assert!(is_conflict(flow.pick_slot(slot_on(2, 10)).unwrap_err()));
        assert!(is_conflict(flow.proceed_to_details().unwrap_err()));
        assert!(is_conflict(
            flow.confirm("Ana".into(), "11988887777".into(), Uuid::new_v4())
                .unwrap_err()
        ));
    }

    #[test]
    fn test_changing_date_discards_chosen_slot() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        flow.pick_slot(slot_on(2, 10)).unwrap();
        flow.pick_date(day(3)).unwrap();
        assert!(flow.slot.is_none());
    }

    #[test]
    fn test_slot_must_lie_on_selected_date() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        let err = flow.pick_slot(slot_on(3, 10)).unwrap_err();
        assert!(is_conflict(err));
        assert!(flow.slot.is_none());
    }

    #[test]
    fn test_slot_required_before_details() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        assert!(is_conflict(flow.proceed_to_details().unwrap_err()));
    }

    #[test]
    fn test_back_from_date_time_discards_service_date_and_slot() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        flow.pick_slot(slot_on(2, 10)).unwrap();
        flow.back().unwrap();

        assert_eq!(flow.step, BookingStep::SelectService);
        assert!(flow.service.is_none());
        assert!(flow.date.is_none());
        assert!(flow.slot.is_none());
    }

    #[test]
    fn test_back_then_new_service_needs_a_fresh_date() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        flow.back().unwrap();
        flow.pick_service(service()).unwrap();

        let err = flow.pick_slot(slot_on(2, 10)).unwrap_err();
        assert!(is_conflict(err));
        assert!(flow.slot.is_none());
    }

    #[test]
    fn test_back_from_details_keeps_selection() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        flow.pick_slot(slot_on(2, 10)).unwrap();
        flow.proceed_to_details().unwrap();
        flow.back().unwrap();

        assert_eq!(flow.step, BookingStep::SelectDateTime);
        assert!(flow.service.is_some());
        assert!(flow.slot.is_some());
    }

    #[test]
    fn test_back_at_first_step_is_rejected() {
        let mut flow = BookingFlow::new();
        assert!(is_conflict(flow.back().unwrap_err()));
    }

    #[test]
    fn test_confirmed_session_rejects_every_mutation() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        flow.pick_slot(slot_on(2, 10)).unwrap();
        flow.proceed_to_details().unwrap();
        flow.confirm("Ana".into(), "11988887777".into(), Uuid::new_v4()).unwrap();

        assert!(is_conflict(flow.pick_service(service()).unwrap_err()));
        assert!(is_conflict(flow.pick_date(day(3)).unwrap_err()));
        assert!(is_conflict(flow.pick_slot(slot_on(3, 10)).unwrap_err()));
        assert!(is_conflict(flow.proceed_to_details().unwrap_err()));
        assert!(is_conflict(flow.back().unwrap_err()));
        assert!(is_conflict(flow.restart().unwrap_err()));
        assert!(is_conflict(
            flow.confirm("Bia".into(), "11900001111".into(), Uuid::new_v4())
                .unwrap_err()
        ));
    }

    #[test]
    fn test_restart_clears_everything_but_keeps_id() {
        let mut flow = BookingFlow::new();
        let id = flow.id;
        flow.pick_service(service()).unwrap();
        flow.pick_date(day(2)).unwrap();
        flow.pick_slot(slot_on(2, 10)).unwrap();
        flow.restart().unwrap();

        assert_eq!(flow.id, id);
        assert_eq!(flow.step, BookingStep::SelectService);
        assert!(flow.service.is_none());
        assert!(flow.date.is_none());
        assert!(flow.slot.is_none());
    }

    #[test]
    fn test_repicking_service_requires_going_back_first() {
        let mut flow = BookingFlow::new();
        flow.pick_service(service()).unwrap();
        assert!(is_conflict(flow.pick_service(service()).unwrap_err()));
        flow.back().unwrap();
        flow.pick_service(service()).unwrap();
        assert_eq!(flow.step, BookingStep::SelectDateTime);
    }
}
