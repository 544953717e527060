//! Human-readable rendering of conflict reports.

use crate::detect::{ConflictReport, FieldConflict, PromptConflict};
use similar::TextDiff;
use std::fmt::Write;

/// Character budget of each prompt in [`format_prompt_preview`].
pub const PREVIEW_CHARS: usize = 200;
/// Width of the local column in [`format_prompt_diff`].
pub const DIFF_COLUMN_WIDTH: usize = 60;

const ELLIPSIS: char = '…';
const COLUMN_SEPARATOR: char = '│';
const FINGERPRINT_DIGITS: usize = 12;

/// Truncates to `max` characters, ending with `…` when anything was cut.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

/// Renders field conflicts as an aligned three-column table.
///
/// ```text
/// FIELD              LOCAL  REMOTE
/// agent.voice_speed  1.0    1.2
/// ```
pub fn format_field_conflicts(conflicts: &[FieldConflict]) -> String {
    if conflicts.is_empty() {
        return String::new();
    }
    let rows: Vec<[String; 3]> = conflicts
        .iter()
        .map(|c| [c.path.clone(), c.local.to_string(), c.remote.to_string()])
        .collect();
    let header = ["FIELD", "LOCAL", "REMOTE"].map(String::from);

    let width = |col: usize| {
        rows.iter()
            .chain(std::iter::once(&header))
            .map(|row| row[col].chars().count())
            .max()
            .unwrap_or(0)
    };
    let (path_width, local_width) = (width(0), width(1));

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows.iter()) {
        let _ = writeln!(
            out,
            "{:<path_width$}  {:<local_width$}  {}",
            row[0], row[1], row[2]
        );
    }
    out
}

/// Short preview of both prompts with their fingerprints.
pub fn format_prompt_preview(conflict: &PromptConflict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Local prompt ({}):", conflict.local_fingerprint);
    let _ = writeln!(out, "  {}", truncate_chars(&conflict.local_prompt, PREVIEW_CHARS));
    let _ = writeln!(out, "Remote prompt ({}):", conflict.remote_fingerprint);
    let _ = writeln!(out, "  {}", truncate_chars(&conflict.remote_prompt, PREVIEW_CHARS));
    out
}

/// Side-by-side line diff; `!` marks lines that differ.
pub fn format_prompt_diff(conflict: &PromptConflict) -> String {
    let local: Vec<&str> = conflict.local_prompt.lines().collect();
    let remote: Vec<&str> = conflict.remote_prompt.lines().collect();
    let rows = local.len().max(remote.len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<width$} {COLUMN_SEPARATOR} REMOTE",
        "LOCAL",
        width = DIFF_COLUMN_WIDTH
    );
    for i in 0..rows {
        let l = local.get(i).copied().unwrap_or_default();
        let r = remote.get(i).copied().unwrap_or_default();
        let marker = if l == r { ' ' } else { '!' };
        let line = format!(
            "{marker} {:<width$} {COLUMN_SEPARATOR} {r}",
            truncate_chars(l, DIFF_COLUMN_WIDTH),
            width = DIFF_COLUMN_WIDTH
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

/// Unified diff from the local prompt to the remote prompt.
pub fn unified_prompt_diff(conflict: &PromptConflict, context: usize) -> String {
    TextDiff::from_lines(&conflict.local_prompt, &conflict.remote_prompt)
        .unified_diff()
        .context_radius(context)
        .header("local", "remote")
        .to_string()
}

impl ConflictReport {
    /// Multi-section summary for terminal output.
    pub fn format_summary(&self, agent: &str, environment: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Agent '{agent}' is out of sync with remote ({environment})"
        );
        let _ = writeln!(
            out,
            "  local:  {}",
            self.local_fingerprint.short(FINGERPRINT_DIGITS)
        );
        let _ = writeln!(
            out,
            "  remote: {}",
            self.remote_fingerprint.short(FINGERPRINT_DIGITS)
        );

        if !self.field_conflicts.is_empty() {
            let _ = writeln!(out, "\n{} field conflict(s):", self.field_conflicts.len());
            out.push_str(&format_field_conflicts(&self.field_conflicts));
        }
        match &self.prompt_conflict {
            Some(prompt) => {
                out.push_str("\nPrompt differs:\n");
                out.push_str(&format_prompt_preview(prompt));
            }
            None => out.push_str("\nPrompt matches.\n"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{fingerprint, fingerprint_text};
    use crate::remote::FieldValue;
    use serde_json::json;

    fn prompt_conflict(local: &str, remote: &str) -> PromptConflict {
        PromptConflict {
            local_prompt: local.into(),
            remote_prompt: remote.into(),
            local_fingerprint: fingerprint_text(local),
            remote_fingerprint: fingerprint_text(remote),
        }
    }

    #[test]
    fn field_table_is_aligned() {
        let conflicts = vec![
            FieldConflict {
                path: "agent.voice_speed".into(),
                local: FieldValue::Present(json!(1.0)),
                remote: FieldValue::Present(json!(1.2)),
            },
            FieldConflict {
                path: "llm.model".into(),
                local: FieldValue::Absent,
                remote: FieldValue::Present(json!("gpt-4o")),
            },
        ];
        let table = format_field_conflicts(&conflicts);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "FIELD              LOCAL     REMOTE");
        assert_eq!(lines[1], "agent.voice_speed  1.0       1.2");
        assert_eq!(lines[2], "llm.model          (absent)  \"gpt-4o\"");
        assert_eq!(format_field_conflicts(&[]), "");
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let long = "é".repeat(PREVIEW_CHARS + 10);
        let preview = format_prompt_preview(&prompt_conflict(&long, "short"));
        let first = preview.lines().nth(1).unwrap().trim_start();
        assert_eq!(first.chars().count(), PREVIEW_CHARS);
        assert!(first.ends_with('…'));
        assert!(preview.contains("  short\n"));
        assert!(preview.contains(fingerprint_text("short").as_str()));
    }

    #[test]
    fn side_by_side_marks_differing_lines() {
        let diff = format_prompt_diff(&prompt_conflict("same\nold\nonly local", "same\nnew"));
        let lines: Vec<&str> = diff.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("  same"));
        assert!(lines[2].starts_with("! old"));
        assert!(lines[2].ends_with("│ new"));
        assert!(lines[3].starts_with("! only local"));
        assert!(lines[3].ends_with('│'));

        let separator = lines[2].chars().position(|c| c == '│').unwrap();
        assert_eq!(separator, DIFF_COLUMN_WIDTH + 3);
    }

    #[test]
    fn long_local_lines_are_cut_to_the_column() {
        let local = "x".repeat(DIFF_COLUMN_WIDTH * 2);
        let diff = format_prompt_diff(&prompt_conflict(&local, "y"));
        let row = diff.lines().nth(1).unwrap();
        let separator = row.chars().position(|c| c == '│').unwrap();
        assert_eq!(separator, DIFF_COLUMN_WIDTH + 3);
        assert!(row.contains('…'));
    }

    #[test]
    fn unified_diff_has_headers_and_hunks() {
        let diff = unified_prompt_diff(&prompt_conflict("a\nb\n", "a\nc\n"), 3);
        assert!(diff.contains("--- local"));
        assert!(diff.contains("+++ remote"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }

    #[test]
    fn summary_lists_fields_and_prompt_state() {
        let report = ConflictReport {
            local_fingerprint: fingerprint(&json!({"a": 1})),
            remote_fingerprint: fingerprint(&json!({"a": 2})),
            field_conflicts: vec![FieldConflict {
                path: "agent.voice_speed".into(),
                local: FieldValue::Present(json!(1.0)),
                remote: FieldValue::Present(json!(1.2)),
            }],
            prompt_conflict: None,
        };
        let summary = report.format_summary("support", "staging");
        assert!(summary.starts_with("Agent 'support' is out of sync with remote (staging)"));
        assert!(summary.contains("1 field conflict(s):"));
        assert!(summary.contains("agent.voice_speed"));
        assert!(summary.contains("Prompt matches."));
        assert!(summary.contains(report.local_fingerprint.short(12)));
    }
}
