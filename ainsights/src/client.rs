/**
 * The AInsights capture client.
 *
 * A thin facade over `ainsights_core::AsyncClient`: it owns the
 * credentials and endpoint wiring, validates capture arguments
 * synchronously, and dispatches each event as a `PUT insight` in the
 * background. Lifecycle is explicit: construct it where convenient, call
 * `close()` when the application shuts down.
 */

use ainsights_core::{AsyncClient, ClientConfig, Pending};

use crate::error::AInsightsError;
use crate::event::InsightEvent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Ingestion endpoint used when no custom base URL is given.
pub const DEFAULT_BASE_URL: &str = "https://ingestion.requesty.ai";

/// Relative path every captured event is PUT to.
const INSIGHT_PATH: &str = "insight";

// ---------------------------------------------------------------------------
// AInsights
// ---------------------------------------------------------------------------

/**
 * The capture client.
 *
 * # Example
 * ```ignore
 * let insights = AInsights::new("API_KEY")?;
 *
 * let handle = insights.capture(
 *     InsightEvent::new(response_json)
 *         .template("Classify: {text}")
 *         .input("text", "..."),
 * )?;
 * // handle can be ignored unless debugging delivery
 *
 * insights.close();
 * ```
 */
pub struct AInsights {
    http: AsyncClient,
}

impl AInsights {
    /**
     * Creates a client that dispatches to the default ingestion
     * endpoint, authenticating with `api_key`.
     */
    pub fn new(api_key: &str) -> Result<Self, AInsightsError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /**
     * Creates a client against a custom ingestion endpoint.
     */
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, AInsightsError> {
        let config = ClientConfig::new(base_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {api_key}"));

        Ok(Self {
            http: AsyncClient::new(config)?,
        })
    }

    /**
     * Wraps an already-built dispatch client. Used by tests to inject a
     * scripted executor; `new` is the ordinary entry point.
     */
    pub fn with_client(http: AsyncClient) -> Self {
        Self { http }
    }

    /**
     * Captures one AI interaction event and dispatches it in the
     * background.
     *
     * Validation happens here, synchronously, before anything is queued:
     * the event must carry `messages` or a `template` (whose `inputs`
     * may legitimately be empty, e.g. a template with no placeholders).
     *
     * The returned `Pending` handle can be ignored unless delivery needs
     * to be observed (tests, debugging); dropping it does not cancel the
     * dispatch.
     */
    pub fn capture(&self, event: InsightEvent) -> Result<Pending, AInsightsError> {
        if event.messages.is_none() && event.template.is_none() {
            return Err(AInsightsError::Validation(
                "specify at least one of ('messages') or ('template' and 'inputs')".into(),
            ));
        }

        let body = serde_json::to_string(&event)?;
        Ok(self.http.put(INSIGHT_PATH, body))
    }

    /**
     * Shuts the dispatch client down, draining queued events within the
     * grace window. Safe to call from multiple threads; every call
     * returns once the single shutdown sequence has completed.
     */
    pub fn close(&self) {
        self.http.close();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
