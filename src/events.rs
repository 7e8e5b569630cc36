//! Extracting event names from parsed documents.
//!
//! By convention an event payload schema is named with a dot
//! (`Order.Created`, `billing.invoice.paid`). Plain schema names are
//! ordinary data types and are ignored.

use crate::error::{Error, Result};
use crate::spec::SpecDocument;

/// Whether a schema key names an event.
pub fn is_event(key: &str) -> bool {
    key.contains('.')
}

/// Collect event names from every document, in document then key order.
///
/// Duplicates across documents are kept. A document without
/// `components.schemas` is an error.
pub fn collect_events(documents: &[SpecDocument]) -> Result<Vec<String>> {
    let mut events = Vec::new();

    for doc in documents {
        let schemas = doc.schemas.as_ref().ok_or_else(|| Error::MissingSchemas {
            path: doc.path.clone(),
        })?;

        events.extend(schemas.keys().filter(|key| is_event(key)).cloned());
    }

    Ok(events)
}
