const MAX_OUTPUT_LENGTH: usize = 8_000;
const MAX_ERROR_LENGTH: usize = 2_000;

/// Keep the head and tail of a long output, cut on char boundaries.
pub fn truncate_output(output: &str) -> String {
    let total = output.chars().count();
    if total <= MAX_OUTPUT_LENGTH {
        output.to_string()
    } else {
        let half = MAX_OUTPUT_LENGTH / 2;
        let start: String = output.chars().take(half).collect();
        let end: String = output.chars().skip(total - half).collect();
        format!("{}\n\n... [truncated {} chars] ...\n\n{}", start, total - MAX_OUTPUT_LENGTH, end)
    }
}

pub fn truncate_error(error: &str) -> String {
    if error.chars().count() <= MAX_ERROR_LENGTH {
        error.to_string()
    } else {
        let head: String = error.chars().take(MAX_ERROR_LENGTH).collect();
        format!("{}...", head)
    }
}
