use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and describe all metrics
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!("sheet_fetches_total", "Total number of spreadsheet sheet downloads");
    describe_histogram!(
        "sheet_fetch_duration_seconds",
        "Sheet download and parse duration in seconds"
    );
    describe_counter!(
        "table_cache_lookups_total",
        "Table cache lookups by result (hit, miss, stale)"
    );
    describe_counter!("assistant_requests_total", "Total number of chat completion calls");
    describe_histogram!(
        "assistant_request_duration_seconds",
        "Chat completion call duration in seconds"
    );
    describe_counter!("assistant_tokens_total", "Tokens reported by the chat completion API");
    describe_gauge!("chat_sessions_active", "Number of live chat sessions");
    describe_counter!("pricing_desk_errors_total", "Total number of errors");
    describe_gauge!("pricing_desk_info", "Service version information");

    gauge!("pricing_desk_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record a sheet download
pub fn record_sheet_fetch(sheet: &str, outcome: &str, duration: Duration) {
    counter!(
        "sheet_fetches_total",
        "sheet" => sheet.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);
    histogram!("sheet_fetch_duration_seconds", "sheet" => sheet.to_string())
        .record(duration.as_secs_f64());
}

/// Record a cache lookup result
pub fn record_cache_lookup(result: &'static str) {
    counter!("table_cache_lookups_total", "result" => result).increment(1);
}

/// Record a chat completion call
pub fn record_assistant_request(model: &str, outcome: &str, duration: Duration) {
    counter!(
        "assistant_requests_total",
        "model" => model.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);
    histogram!("assistant_request_duration_seconds", "model" => model.to_string())
        .record(duration.as_secs_f64());
}

/// Record tokens
pub fn record_assistant_tokens(model: &str, token_type: &'static str, count: u64) {
    counter!(
        "assistant_tokens_total",
        "model" => model.to_string(),
        "type" => token_type,
    )
    .increment(count);
}

/// Update live chat session count
pub fn update_session_count(count: usize) {
    gauge!("chat_sessions_active").set(count as f64);
}

/// Record an error
pub fn record_error(component: &'static str, error_type: &str) {
    counter!(
        "pricing_desk_errors_total",
        "component" => component,
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metrics() {
        init_metric_descriptions();

        record_sheet_fetch("Extra", "ok", Duration::from_millis(120));
        record_cache_lookup("hit");
        record_assistant_request("llama-3.3-70b-versatile", "ok", Duration::from_secs(2));
        record_assistant_tokens("llama-3.3-70b-versatile", "input", 100);
        update_session_count(3);
        record_error("assistant", "assistant_error");

        // Without an installed recorder these are no-ops; they must not panic
    }
}
