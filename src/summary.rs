//! Completion-marker extraction.
//!
//! The agent signals completion by wrapping its final summary in
//! `<task_summary>` markers. This module is the single place that knows the
//! marker syntax: extraction, wrapping, and stripping all live here.

/// Opening completion marker.
pub const SUMMARY_OPEN: &str = "<task_summary>";

/// Closing completion marker.
pub const SUMMARY_CLOSE: &str = "</task_summary>";

/// Extracts the summary from a marker pair, if present.
///
/// The first opening marker wins, closed by the first closing marker after
/// it; later or nested markers are ignored. Returns the trimmed inner text.
pub fn extract_summary(text: &str) -> Option<String> {
    let start = text.find(SUMMARY_OPEN)?;
    let inner_start = start + SUMMARY_OPEN.len();
    let inner_len = text[inner_start..].find(SUMMARY_CLOSE)?;
    Some(text[inner_start..inner_start + inner_len].trim().to_string())
}

/// Wraps raw text in the marker pair.
pub fn wrap_summary(text: &str) -> String {
    format!("{}{}{}", SUMMARY_OPEN, text, SUMMARY_CLOSE)
}

/// Removes every marker tag, leaving plain text.
///
/// Persisted summaries are always marker-free.
pub fn strip_markers(text: &str) -> String {
    text.replace(SUMMARY_OPEN, "")
        .replace(SUMMARY_CLOSE, "")
        .trim()
        .to_string()
}

/// Synthesizes a summary when the agent never produced one.
///
/// Last resort after the explicit summary request also came back empty.
pub fn synthesize_summary(request_text: &str, file_count: usize) -> String {
    if file_count == 0 {
        "Task completed successfully".to_string()
    } else {
        format!(
            "Completed task: {}. Created {} file(s).",
            request_text, file_count
        )
    }
}
