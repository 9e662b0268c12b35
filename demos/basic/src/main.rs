/**
 * Minimal test harness for the AInsights SDK.
 *
 * Replace the API_KEY constant with a real key from your project
 * settings, then run:
 *
 *   cargo run -p ainsights_demo
 *   cargo run -p ainsights_demo -- --wait   # block on each dispatch result
 */
use std::time::Duration;

use ainsights::{AInsights, InsightEvent};
use serde_json::json;

/// Paste your API key here.
const API_KEY: &str = "PASTE_YOUR_API_KEY_HERE";

fn main() {
    let wait = std::env::args().any(|a| a == "--wait");

    let insights = match AInsights::new(API_KEY) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("[demo] Failed to create client: {err}");
            return;
        }
    };

    /*
     * Capture a template-based event — the recommended shape.
     */
    let fake_response = json!({
        "id": "chatcmpl-demo",
        "choices": [{"message": {"role": "assistant", "content": "negative"}}],
    });

    let event = InsightEvent::new(fake_response.clone())
        .template("Read the conversation: {conversation}. Classify sentiment: {options}")
        .input("conversation", "Hi, I would like to return my watch ...")
        .input("options", "positive, neutral, negative")
        .user_id("demo-user");

    match insights.capture(event) {
        Ok(handle) => {
            println!("[demo] Captured a template event");
            if wait {
                match handle.wait_timeout(Duration::from_secs(15)) {
                    Some(Ok(response)) => println!("[demo] Dispatched, HTTP {}", response.status),
                    Some(Err(err)) => println!("[demo] Dispatch failed: {err}"),
                    None => println!("[demo] Still pending after 15s"),
                }
            }
        }
        Err(err) => eprintln!("[demo] Capture rejected: {err}"),
    }

    /*
     * Capture a messages-only event — the fallback shape.
     */
    let event = InsightEvent::new(fake_response)
        .messages(json!([{"role": "user", "content": "Classify my sentiment"}]));

    if let Err(err) = insights.capture(event) {
        eprintln!("[demo] Capture rejected: {err}");
    } else {
        println!("[demo] Captured a messages-only event");
    }

    /*
     * Drain whatever is still queued before exiting.
     */
    insights.close();
    println!("[demo] Closed");
}
