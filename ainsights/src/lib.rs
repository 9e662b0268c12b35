/*!
 * AInsights — capture AI interaction events and ship them to an
 * ingestion backend without blocking the caller.
 *
 * The heavy lifting lives in `ainsights_core`: an order-preserving
 * dispatch client with one background worker, retry with exponential
 * backoff and jitter, and a bounded graceful shutdown. This crate adds
 * the capture surface: event payloads, argument validation, and bearer
 * authentication.
 *
 * # Quick start
 * ```ignore
 * use ainsights::{AInsights, InsightEvent};
 *
 * let insights = AInsights::new("API_KEY")?;
 *
 * insights.capture(
 *     InsightEvent::new(response_json)
 *         .template("Summarize: {text}")
 *         .input("text", "..."),
 * )?;
 *
 * // Drain pending events before the application exits.
 * insights.close();
 * ```
 */

mod client;
mod error;
mod event;

pub use client::{AInsights, DEFAULT_BASE_URL};
pub use error::AInsightsError;
pub use event::InsightEvent;

/// Re-exported so callers can wait on dispatch outcomes, tune retry
/// behaviour, and wire a custom dispatch client through
/// `AInsights::with_client`, all without a direct `ainsights_core`
/// dependency.
pub use ainsights_core::{
    AsyncClient, ClientConfig, DispatchResult, Jitter, Pending, Response, RetryPolicy,
    TransportError,
};
