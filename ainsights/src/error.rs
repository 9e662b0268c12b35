/**
 * Error surface of the capture SDK.
 *
 * Only two things fail through normal control flow: submission-time
 * validation and client construction. Everything call-level funnels
 * through the `Pending` handle as a value.
 */

use ainsights_core::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AInsightsError {
    /// Malformed capture arguments, detected before anything is queued.
    #[error("invalid capture arguments: {0}")]
    Validation(String),

    /// The dispatch client could not be constructed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The event payload could not be serialized.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}
