//! One monitor instance: fetch, filter, diff, notify.

use chrono::{Local, NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use crate::availability_client::{query_window, AvailabilityClient, PairResult};
use crate::config::Config;
use crate::error::CycleError;
use crate::notifier::{Notification, Notifier, SlotDigest};
use crate::processor::{normalize, SlotFilter};
use crate::tracker::KnownSlots;

/// What happened to the digest in a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing new, nothing sent
    Skipped,
    Sent,
    Failed,
}

/// Summary of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// (tenant, date) pairs that returned data
    pub days_with_data: usize,
    pub failed_requests: usize,
    /// Slots that passed the filter this cycle
    pub valid_slots: usize,
    pub new_slots: usize,
    pub delivery: Delivery,
}

impl CycleReport {
    fn no_data(failed_requests: usize) -> Self {
        Self {
            days_with_data: 0,
            failed_requests,
            valid_slots: 0,
            new_slots: 0,
            delivery: Delivery::Skipped,
        }
    }
}

pub struct CourtMonitor {
    tenant_ids: Vec<String>,
    days_ahead: u32,
    max_listed_slots: usize,
    booking_url: String,
    filter: SlotFilter,
    client: AvailabilityClient,
    notifier: Box<dyn Notifier>,
    known: KnownSlots,
}

impl CourtMonitor {
    pub fn new(config: &Config, notifier: Box<dyn Notifier>) -> Result<Self, CycleError> {
        Ok(Self {
            tenant_ids: config.tenant_ids.clone(),
            days_ahead: config.days_ahead,
            max_listed_slots: config.max_listed_slots,
            booking_url: config.booking_url.clone(),
            filter: SlotFilter::from_config(config),
            client: AvailabilityClient::new(config)?,
            notifier,
            known: KnownSlots::new(),
        })
    }

    pub fn known(&self) -> &KnownSlots {
        &self.known
    }

    pub fn channel_name(&self) -> &str {
        self.notifier.channel_name()
    }

    /// Send a one-off message outside the cycle (startup, tests). Returns
    /// whether it was delivered; failures are only logged.
    pub async fn send_direct(&self, notification: &Notification) -> bool {
        match self.notifier.send(notification).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(channel = self.notifier.channel_name(), "failed to send notification: {}", e);
                false
            }
        }
    }

    pub async fn announce_startup(&self) -> bool {
        tracing::info!("Sending startup message...");
        self.send_direct(&Notification::startup()).await
    }

    /// Run one cycle for the current local date.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let now = Local::now().naive_local();
        self.run_cycle_at(now.date(), now).await
    }

    /// Run one cycle with the window starting at `today`.
    ///
    /// When no pair returned data the known set is left untouched. Otherwise
    /// it is replaced with this cycle's identities, even if delivery fails.
    pub async fn run_cycle_at(&mut self, today: NaiveDate, now: NaiveDateTime) -> Result<CycleReport, CycleError> {
        let dates = query_window(today, self.days_ahead);
        tracing::info!(
            tenants = self.tenant_ids.len(),
            days = dates.len(),
            "cycle start"
        );

        let results = self.client.fetch_window(&self.tenant_ids, &dates).await;
        let failed_requests = results.iter().filter(|r| r.is_failure()).count();
        let days: Vec<_> = results.into_iter().filter_map(PairResult::into_day).collect();

        if days.is_empty() {
            tracing::info!(failed_requests, "no data received");
            return Ok(CycleReport::no_data(failed_requests));
        }

        let slots = normalize(&days, &self.filter)?;
        let current: HashSet<_> = slots.iter().map(|s| s.id()).collect();
        let new_ids = self.known.observe(current);

        let delivery = if slots.is_empty() {
            tracing::info!("no matching courts available");
            Delivery::Skipped
        } else if new_ids.is_empty() {
            tracing::info!(
                valid_slots = slots.len(),
                "slots exist, but were already notified"
            );
            Delivery::Skipped
        } else {
            tracing::info!(
                valid_slots = slots.len(),
                new_slots = new_ids.len(),
                "found new slots"
            );
            for id in &new_ids {
                tracing::debug!(slot = %id, "new slot");
            }
            self.deliver_digest(&slots, now).await
        };

        Ok(CycleReport {
            days_with_data: days.len(),
            failed_requests,
            valid_slots: slots.len(),
            new_slots: new_ids.len(),
            delivery,
        })
    }

    async fn deliver_digest(&self, slots: &[slot_types::CanonicalSlot], now: NaiveDateTime) -> Delivery {
        let digest = SlotDigest::new(
            slots,
            self.max_listed_slots,
            self.filter.min_hour,
            &self.booking_url,
            now,
        );
        tracing::debug!(listed = digest.listed(), total = digest.total(), "rendering digest");
        let notification = match digest.into_notification() {
            Ok(notification) => notification,
            Err(e) => {
                tracing::error!("failed to render notification: {}", e);
                return Delivery::Failed;
            }
        };

        if self.send_direct(&notification).await {
            Delivery::Sent
        } else {
            Delivery::Failed
        }
    }
}
