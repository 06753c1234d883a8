use crate::engine::TurnResult;
use crate::resolver::RetryRequest;
use itertools::Itertools;

/// Formats turn results into one-line, human-readable traces.
pub struct TraceFormatter;

impl TraceFormatter {
    /// The path walked during a turn and where the session came to rest, e.g.
    /// `start -> visual_support -> material_recommendations [awaiting input]`.
    pub fn format_turn(result: &TurnResult) -> String {
        let path = if result.visited.is_empty() {
            result.node_id.clone()
        } else {
            result.visited.iter().join(" -> ")
        };

        let state = match &result.retry {
            Some(retry) => Self::format_retry(retry),
            None if result.terminal => "terminal".to_string(),
            None => "awaiting input".to_string(),
        };

        let mut line = format!("turn {}: {} [{}]", result.turn, path, state);
        if !result.warnings.is_empty() {
            line.push_str(&format!(
                " (unresolved: {})",
                result.warnings.iter().join(", ")
            ));
        }
        line
    }

    fn format_retry(retry: &RetryRequest) -> String {
        let reason = format!("{:?}", retry.reason);
        if retry.valid_options.is_empty() {
            format!("retry: {}", reason)
        } else {
            format!(
                "retry: {}, expected one of {}",
                reason,
                retry.valid_options.iter().map(|o| format!("'{}'", o)).join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::RetryReason;
    use crate::template::UnresolvedPlaceholder;

    fn result() -> TurnResult {
        TurnResult {
            output_text: String::new(),
            awaiting_input: true,
            terminal: false,
            node_id: "material_recommendations".to_string(),
            turn: 1,
            retry: None,
            warnings: Vec::new(),
            visited: vec![
                "start".to_string(),
                "visual_support".to_string(),
                "material_recommendations".to_string(),
            ],
        }
    }

    #[test]
    fn test_format_path() {
        assert_eq!(
            TraceFormatter::format_turn(&result()),
            "turn 1: start -> visual_support -> material_recommendations [awaiting input]"
        );
    }

    #[test]
    fn test_format_retry_with_options() {
        let mut r = result();
        r.turn = 2;
        r.visited.clear();
        r.retry = Some(RetryRequest {
            node_id: "material_recommendations".to_string(),
            reason: RetryReason::InvalidChoice,
            valid_options: vec!["Local materials".to_string(), "Alternatives".to_string()],
            guidance: String::new(),
        });
        r.warnings.push(UnresolvedPlaceholder {
            name: "material_1".to_string(),
        });
        assert_eq!(
            TraceFormatter::format_turn(&r),
            "turn 2: material_recommendations [retry: InvalidChoice, expected one of \
             'Local materials', 'Alternatives'] (unresolved: {material_1})"
        );
    }

    #[test]
    fn test_format_terminal() {
        let mut r = result();
        r.terminal = true;
        r.awaiting_input = false;
        r.visited = vec!["end".to_string()];
        r.node_id = "end".to_string();
        assert_eq!(TraceFormatter::format_turn(&r), "turn 1: end [terminal]");
    }
}
