//! Default event extractor.

use crate::domain::entities::{Event, Transaction};
use crate::domain::services::extract_events;
use crate::ports::outbound::EventExtractor;

/// Extractor producing account lifecycle and message-sent events.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEventExtractor;

impl EventExtractor for DefaultEventExtractor {
    fn extract(&self, tx: &Transaction) -> Vec<Event> {
        extract_events(tx)
    }
}
