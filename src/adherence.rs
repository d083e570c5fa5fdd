//! Read seam to the external medication/adherence store.
//!
//! The surrounding app owns the medication document and its adherence
//! history (writes happen on user interaction); this crate only reads it on
//! each delivery event to infer escalation state. One lookup supplies both
//! the adherence history and the display fields the caregiver report needs.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Medication;

#[derive(Error, Debug)]
pub enum AdherenceError {
    #[error("Adherence read failed: {0}")]
    Read(String),
}

/// Read-only access to medications and their adherence records.
#[async_trait]
pub trait AdherenceSource: Send + Sync {
    /// Current medication document for an id, `None` if it no longer exists.
    async fn medication(&self, med_id: &Uuid) -> Result<Option<Medication>, AdherenceError>;
}
