//! Rendering of the "new slots" digest.
//!
//! The digest lists every currently valid slot (not only the new ones),
//! sorted by date and time and capped at a fixed count. The header always
//! states the full total.

use chrono::NaiveDateTime;
use minijinja::{context, Environment, Value};
use serde::Serialize;
use slot_types::CanonicalSlot;

use super::{Notification, NotifyError};
use crate::processor::sort_for_display;

pub const DIGEST_SUBJECT: &str = "New Padel Courts Available!";

// Registered as `.html` so minijinja escapes upstream values.
const HTML_TEMPLATE: &str = r#"<h2>🎾 Padel Courts Available!</h2>
<p>Found {{ total }} available slot(s){{ filter_note }} at {{ checked_at }}</p>
<ul>
{% for slot in slots %}  <li><strong>{{ slot.date }}</strong> - {{ slot.time }}{% if slot.duration %} ({{ slot.duration }} min){% endif %} - {{ slot.price }}</li>
{% endfor %}</ul>
{% if omitted > 0 %}<p>...and {{ omitted }} more</p>
{% endif %}<p>Book now at <a href="{{ booking_url }}">Playtomic</a></p>
"#;

#[derive(Debug, Clone, Serialize)]
struct SlotLine {
    date: String,
    time: String,
    duration: Option<u32>,
    price: String,
}

impl SlotLine {
    fn from_slot(slot: &CanonicalSlot) -> Self {
        Self {
            date: slot.date.format("%Y-%m-%d").to_string(),
            time: slot.display_time().to_string(),
            duration: slot.duration,
            price: slot
                .price
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }

    fn text(&self) -> String {
        match self.duration {
            Some(minutes) => format!("📅 {} @ {} ({} min) ({})", self.date, self.time, minutes, self.price),
            None => format!("📅 {} @ {} ({})", self.date, self.time, self.price),
        }
    }
}

#[derive(Debug)]
pub struct SlotDigest {
    lines: Vec<SlotLine>,
    total: usize,
    min_hour: Option<u32>,
    booking_url: String,
    checked_at: NaiveDateTime,
}

impl SlotDigest {
    pub fn new(
        slots: &[CanonicalSlot],
        max_listed: usize,
        min_hour: Option<u32>,
        booking_url: &str,
        checked_at: NaiveDateTime,
    ) -> Self {
        let mut sorted = slots.to_vec();
        sort_for_display(&mut sorted);

        Self {
            lines: sorted.iter().take(max_listed).map(SlotLine::from_slot).collect(),
            total: slots.len(),
            min_hour,
            booking_url: booking_url.to_string(),
            checked_at,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn listed(&self) -> usize {
        self.lines.len()
    }

    pub fn omitted(&self) -> usize {
        self.total - self.lines.len()
    }

    fn filter_note(&self) -> String {
        self.min_hour
            .map(|hour| format!(" after {}:00", hour))
            .unwrap_or_default()
    }

    pub fn text(&self) -> String {
        let mut lines = vec![
            "🎾 *Padel Courts Available!*".to_string(),
            format!("Found {} slot(s){}", self.total, self.filter_note()),
            String::new(),
        ];
        lines.extend(self.lines.iter().map(SlotLine::text));
        if self.omitted() > 0 {
            lines.push(format!("...and {} more", self.omitted()));
        }
        lines.push(String::new());
        lines.push(format!("Book: {}", self.booking_url));
        lines.join("\n")
    }

    pub fn html(&self) -> Result<String, NotifyError> {
        let mut env = Environment::new();
        env.add_template("digest.html", HTML_TEMPLATE)?;
        let rendered = env.get_template("digest.html")?.render(context! {
            total => self.total,
            filter_note => self.filter_note(),
            checked_at => self.checked_at.format("%Y-%m-%d %H:%M").to_string(),
            slots => &self.lines,
            omitted => self.omitted(),
            // operator-supplied; escaping would mangle the slashes
            booking_url => Value::from_safe_string(self.booking_url.clone()),
        })?;
        Ok(rendered)
    }

    pub fn into_notification(self) -> Result<Notification, NotifyError> {
        Ok(Notification {
            subject: DIGEST_SUBJECT.to_string(),
            html: Some(self.html()?),
            text: self.text(),
        })
    }
}
