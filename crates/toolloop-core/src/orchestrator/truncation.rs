//! Bounding oversized tool results
//!
//! A tool that dumps an entire table into the conversation would blow the
//! model's context. Results are cut to a byte budget and a diagnostic part
//! tells the model how big the result really was and how to ask for less.

use serde::{Deserialize, Serialize};

use crate::types::ContentPart;

/// Default byte budget for one tool result
pub const DEFAULT_MAX_BYTES: usize = 100_000;

/// Maximum payload size a tool result may occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationPolicy {
    pub max_bytes: usize,
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl TruncationPolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

/// Total UTF-8 byte length of the text carried by `parts`, including text
/// nested in tool results
pub fn text_len(parts: &[ContentPart]) -> usize {
    parts.iter().map(part_text_len).sum()
}

fn part_text_len(part: &ContentPart) -> usize {
    match part {
        ContentPart::Text { text } => text.len(),
        ContentPart::ToolCall { .. } => 0,
        ContentPart::ToolResult { parts, .. } => text_len(parts),
    }
}

/// The notice appended to a truncated result
pub fn truncation_notice(total_bytes: usize, max_bytes: usize) -> String {
    format!(
        "\n\n[Result truncated: the tool returned {} bytes, which exceeds the maximum of {} bytes. \
         Only the first {} bytes are shown. Narrow the request (apply filters, select fewer \
         columns, or limit the number of rows) to get a smaller result.]",
        total_bytes, max_bytes, max_bytes
    )
}

/// Cut `parts` down to the policy's byte budget
///
/// Within budget the input is returned as is. Otherwise the result is the
/// longest prefix that fits, with the last text sliced to fill the budget,
/// followed by a diagnostic text part. Never fails.
pub fn truncate(parts: Vec<ContentPart>, policy: &TruncationPolicy) -> Vec<ContentPart> {
    let total = text_len(&parts);
    if total <= policy.max_bytes {
        return parts;
    }

    let (mut kept, _) = take_prefix(parts, policy.max_bytes);
    kept.push(ContentPart::text(truncation_notice(total, policy.max_bytes)));
    kept
}

/// Longest prefix of `parts` whose text fits in `budget`; returns the prefix
/// and the budget left over
fn take_prefix(parts: Vec<ContentPart>, mut budget: usize) -> (Vec<ContentPart>, usize) {
    let mut kept = Vec::new();

    for part in parts {
        let len = part_text_len(&part);
        if len <= budget {
            budget -= len;
            kept.push(part);
            continue;
        }

        // This part overflows: keep what fits of it, then stop
        match part {
            ContentPart::Text { text } => {
                let cut = floor_char_boundary(&text, budget);
                if cut > 0 {
                    kept.push(ContentPart::text(&text[..cut]));
                }
                budget -= cut;
            }
            ContentPart::ToolResult { call_id, parts, ok } => {
                let (inner, left) = take_prefix(parts, budget);
                kept.push(ContentPart::ToolResult {
                    call_id,
                    parts: inner,
                    ok,
                });
                budget = left;
            }
            // Zero-length, so it always fits above
            call @ ContentPart::ToolCall { .. } => kept.push(call),
        }
        break;
    }

    (kept, budget)
}

/// Largest index ≤ `max` that falls on a char boundary of `text`
fn floor_char_boundary(text: &str, max: usize) -> usize {
    if max >= text.len() {
        return text.len();
    }
    let mut index = max;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(parts: &[ContentPart]) -> Vec<String> {
        parts
            .iter()
            .filter_map(|p| p.as_text().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_within_budget_is_unchanged() {
        let parts = vec![ContentPart::text("hello"), ContentPart::text("world")];
        let result = truncate(parts.clone(), &TruncationPolicy::new(10));
        assert_eq!(result, parts);
    }

    #[test]
    fn test_large_single_part() {
        let parts = vec![ContentPart::text("x".repeat(150_000))];
        let result = truncate(parts, &TruncationPolicy::new(100_000));

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].as_text().unwrap().len(), 100_000);

        let notice = result[1].as_text().unwrap();
        assert!(notice.contains("150000"));
        assert!(notice.contains("100000"));
        assert!(notice.contains("filters"));
    }

    #[test]
    fn test_cut_across_parts() {
        let parts = vec![
            ContentPart::text("aaaa"),
            ContentPart::text("bbbb"),
            ContentPart::text("cccc"),
        ];
        let result = truncate(parts, &TruncationPolicy::new(6));

        let texts = texts(&result);
        assert_eq!(texts[0], "aaaa");
        assert_eq!(texts[1], "bb");
        assert_eq!(texts.len(), 3);
        assert!(texts[2].contains("12 bytes"));
    }

    #[test]
    fn test_bound_holds() {
        let parts: Vec<ContentPart> = (0..50).map(|i| ContentPart::text(format!("row {}\n", i))).collect();
        let total = text_len(&parts);
        let policy = TruncationPolicy::new(97);

        let result = truncate(parts, &policy);
        let notice_len = truncation_notice(total, policy.max_bytes).len();
        assert!(text_len(&result) <= policy.max_bytes + notice_len);
        assert_eq!(text_len(&result) - notice_len, 97);
    }

    #[test]
    fn test_zero_budget_keeps_only_diagnostic() {
        let result = truncate(vec![ContentPart::text("abc")], &TruncationPolicy::new(0));
        assert_eq!(result.len(), 1);
        assert!(result[0].as_text().unwrap().contains("3 bytes"));
    }

    #[test]
    fn test_respects_char_boundaries() {
        // "é" is two bytes; a budget of 3 cannot split the second one
        let result = truncate(vec![ContentPart::text("éé")], &TruncationPolicy::new(3));
        assert_eq!(result[0].as_text(), Some("é"));
    }

    #[test]
    fn test_nested_tool_result_is_cut() {
        let parts = vec![ContentPart::tool_result(
            "c1",
            vec![ContentPart::text("0123456789")],
            true,
        )];
        let result = truncate(parts, &TruncationPolicy::new(4));

        match &result[0] {
            ContentPart::ToolResult { call_id, parts, ok } => {
                assert_eq!(call_id, "c1");
                assert!(ok);
                assert_eq!(parts, &vec![ContentPart::text("0123")]);
            }
            other => panic!("unexpected part {:?}", other),
        }
        assert_eq!(result.len(), 2);
    }
}
