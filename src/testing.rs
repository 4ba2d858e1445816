//! In-memory collaborators with failure injection, shared by the unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::{
    DatastoreError, DbResult, EventRepository, PricingRepository, SortOrder, TicketQuery, TicketRepository,
    TicketSort, VolunteerRepository,
};
use crate::models::{
    Event, FoodOption, NewPricingTier, NewTicket, PricingTier, PricingTierUpdate, Role, Ticket, Volunteer,
};
use crate::notify::{Notification, NotificationError, Notifier};
use crate::storage::{ObjectStorage, StorageError};

#[derive(Default)]
struct StoreState {
    events: Vec<Event>,
    tiers: Vec<PricingTier>,
    tickets: Vec<Ticket>,
    volunteers: Vec<Volunteer>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    inserts: AtomicUsize,
    /// 1-based index of the ticket insert that fails.
    fail_insert_at: Option<usize>,
    fail_deletes: bool,
    fail_reads: bool,
}

impl MemoryStore {
    pub fn failing_insert_at(mut self, n: usize) -> Self {
        self.fail_insert_at = Some(n);
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn with_event() -> (Self, Uuid) {
        let store = Self::default();
        let event_id = store.add_event("Spring Gala");
        (store, event_id)
    }

    pub fn add_event(&self, name: &str) -> Uuid {
        let event = Event {
            id: Uuid::new_v4(),
            name: name.to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            location: "Community Hall".to_string(),
            created_at: Utc::now(),
        };
        let id = event.id;
        self.state.lock().unwrap().events.push(event);
        id
    }

    pub fn add_tier(&self, event_id: Uuid, from: i32, to: i32, price: i64, food_option: FoodOption) -> PricingTier {
        let tier = tier(event_id, from, to, Decimal::from(price), food_option);
        self.state.lock().unwrap().tiers.push(tier.clone());
        tier
    }

    pub fn add_volunteer(&self, name: &str, role: Role, team_role: Option<&str>) -> Uuid {
        let volunteer = Volunteer {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            team_role: team_role.map(String::from),
            cleared_amount: Decimal::ZERO,
        };
        let id = volunteer.id;
        self.state.lock().unwrap().volunteers.push(volunteer);
        id
    }

    pub fn set_cleared_amount(&self, volunteer_id: Uuid, amount: Decimal) {
        let mut state = self.state.lock().unwrap();
        if let Some(v) = state.volunteers.iter_mut().find(|v| v.id == volunteer_id) {
            v.cleared_amount = amount;
        }
    }

    pub fn set_tier_price(&self, tier_id: Uuid, price: Decimal) {
        let mut state = self.state.lock().unwrap();
        if let Some(t) = state.tiers.iter_mut().find(|t| t.id == tier_id) {
            t.price_per_ticket = price;
        }
    }

    pub fn push_ticket(&self, ticket: Ticket) {
        self.state.lock().unwrap().tickets.push(ticket);
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.state.lock().unwrap().tickets.clone()
    }

    fn check_reads(&self) -> DbResult<()> {
        if self.fail_reads {
            return Err(DatastoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }
}

fn tier(event_id: Uuid, from: i32, to: i32, price: Decimal, food_option: FoodOption) -> PricingTier {
    PricingTier {
        id: Uuid::new_v4(),
        event_id,
        quantity_from: from,
        quantity_to: to,
        price_per_ticket: price,
        food_option,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn fetch_event(&self, event_id: Uuid) -> DbResult<Option<Event>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().events.iter().find(|e| e.id == event_id).cloned())
    }

    async fn current_event(&self) -> DbResult<Option<Event>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().events.last().cloned())
    }
}

#[async_trait]
impl PricingRepository for MemoryStore {
    async fn fetch_active_tiers(&self, event_id: Uuid, food_option: FoodOption) -> DbResult<Vec<PricingTier>> {
        self.check_reads()?;
        let mut tiers: Vec<PricingTier> = self
            .state
            .lock()
            .unwrap()
            .tiers
            .iter()
            .filter(|t| t.event_id == event_id && t.food_option == food_option && t.is_active)
            .cloned()
            .collect();
        tiers.sort_by_key(|t| t.quantity_from);
        Ok(tiers)
    }

    async fn fetch_tiers(&self, event_id: Option<Uuid>) -> DbResult<Vec<PricingTier>> {
        self.check_reads()?;
        let mut tiers: Vec<PricingTier> = self
            .state
            .lock()
            .unwrap()
            .tiers
            .iter()
            .filter(|t| event_id.map_or(true, |id| t.event_id == id))
            .cloned()
            .collect();
        tiers.sort_by_key(|t| t.quantity_from);
        Ok(tiers)
    }

    async fn fetch_tier(&self, tier_id: Uuid) -> DbResult<Option<PricingTier>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().tiers.iter().find(|t| t.id == tier_id).cloned())
    }

    async fn insert_tier(&self, new: NewPricingTier) -> DbResult<PricingTier> {
        let mut created = tier(new.event_id, new.quantity_from, new.quantity_to, new.price_per_ticket, new.food_option);
        created.is_active = new.is_active;
        self.state.lock().unwrap().tiers.push(created.clone());
        Ok(created)
    }

    async fn update_tier(&self, tier_id: Uuid, update: PricingTierUpdate) -> DbResult<Option<PricingTier>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.tiers.iter_mut().find(|t| t.id == tier_id).map(|t| {
            *t = update.apply_to(t);
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn delete_tier(&self, tier_id: Uuid) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.tiers.len();
        state.tiers.retain(|t| t.id != tier_id);
        Ok(state.tiers.len() < before)
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert_ticket(&self, ticket: NewTicket) -> DbResult<Ticket> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_insert_at == Some(n) {
            return Err(DatastoreError::Unavailable(format!("insert {n} failed")));
        }
        let mut state = self.state.lock().unwrap();
        if state.tickets.iter().any(|t| t.code == ticket.code) {
            return Err(DatastoreError::Unavailable("duplicate code".to_string()));
        }
        let ticket = ticket.into_ticket(Uuid::new_v4(), Utc::now());
        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn delete_ticket(&self, ticket_id: Uuid) -> DbResult<()> {
        if self.fail_deletes {
            return Err(DatastoreError::Unavailable("deletes disabled".to_string()));
        }
        self.state.lock().unwrap().tickets.retain(|t| t.id != ticket_id);
        Ok(())
    }

    async fn fetch_ticket_by_code(&self, code: &str) -> DbResult<Option<Ticket>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().tickets.iter().find(|t| t.code == code).cloned())
    }

    async fn mark_checked_in(&self, code: &str, at: DateTime<Utc>) -> DbResult<Option<Ticket>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .tickets
            .iter_mut()
            .find(|t| t.code == code && !t.is_checked_in)
            .map(|t| {
                t.is_checked_in = true;
                t.checked_in_at = Some(at);
                t.clone()
            }))
    }

    async fn search_tickets(&self, query: &TicketQuery) -> DbResult<(Vec<Ticket>, i64)> {
        self.check_reads()?;
        let mut matching: Vec<Ticket> = self
            .state
            .lock()
            .unwrap()
            .tickets
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        match query.sort {
            TicketSort::CreatedAt => matching.sort_by_key(|t| t.created_at),
            TicketSort::Name => matching.sort_by(|a, b| a.name.cmp(&b.name)),
            TicketSort::CheckedInAt => matching.sort_by_key(|t| t.checked_in_at),
        }
        if query.order == SortOrder::Desc {
            matching.reverse();
        }
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn fetch_all_tickets(&self) -> DbResult<Vec<Ticket>> {
        self.check_reads()?;
        Ok(self.tickets())
    }
}

#[async_trait]
impl VolunteerRepository for MemoryStore {
    async fn fetch_volunteers(&self) -> DbResult<Vec<Volunteer>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().volunteers.clone())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    /// 1-based index of the upload that fails.
    fail_put_at: Option<usize>,
    fail_deletes: bool,
}

impl MemoryStorage {
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_put_at: Some(n),
            ..Default::default()
        }
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_put_at == Some(n) {
            return Err(StorageError::Unavailable(format!("upload {n} failed")));
        }
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(format!("https://storage.test/public/{key}"))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes {
            return Err(StorageError::Unavailable("deletes disabled".to_string()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Notification)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Delivery("mail relay down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), notification.clone()));
        Ok(())
    }
}

/// Polls `condition` until it holds, for work spawned in the background.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes this thread's tracing output into a buffer until the guard drops. The returned closure
/// reads what has been logged so far.
pub fn capture_logs(level: tracing::Level) -> (impl Fn() -> String, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    let read = move || String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (read, guard)
}
