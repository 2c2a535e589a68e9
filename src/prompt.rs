//! Prompts for the coding agent.
//!
//! The system prompt establishes the tool contract and the completion-marker
//! protocol; the helpers build the follow-up requests the engine sends after
//! the main loop ends.

/// System prompt for the coding agent.
pub const SYSTEM_PROMPT: &str = "You are a senior software engineer working inside an ephemeral \
sandbox environment. You build what the user asks for by invoking tools:\n\
\n\
- terminal: run a shell command in the sandbox\n\
- createOrUpdateFiles: write files into the sandbox\n\
- readFiles: read files back from the sandbox\n\
\n\
Work incrementally: inspect what exists, write files, run commands to verify. \
Use relative paths for all file operations. Do not ask the user questions; \
decide and proceed.\n\
\n\
When the task is fully complete, end your final message with the summary of \
what you built wrapped in <task_summary></task_summary> tags. Do not emit the \
tags before the task is complete.";

/// Instruction sent when the loop ends without a completion summary.
pub const FINAL_SUMMARY_INSTRUCTION: &str = "The task is over. Respond with a single \
<task_summary></task_summary> block summarizing what was built. Output nothing else.";

/// System prompt for the artifact-title request.
pub const TITLE_SYSTEM_PROMPT: &str =
    "You generate short, descriptive titles for build artifacts.";

/// Builds the request text asking for a short artifact title.
pub fn title_request(summary: &str) -> String {
    format!(
        "Generate a short title (at most a few words) for an artifact described by the \
following summary. Respond with the title only.\n\n{}",
        summary
    )
}

/// Maximum length of a derived fallback title.
const MAX_TITLE_LEN: usize = 60;

/// Derives a title from the summary when no generated one is available.
///
/// Takes the first non-empty line, truncated on a character boundary.
pub fn derive_title(summary: &str) -> String {
    let line = summary
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    if line.is_empty() {
        return "Fragment".to_string();
    }

    if line.chars().count() <= MAX_TITLE_LEN {
        return line.to_string();
    }

    let truncated: String = line.chars().take(MAX_TITLE_LEN).collect();
    format!("{}...", truncated.trim_end())
}
