//! Text and JSON renderings of a controller snapshot.

use std::fmt::Write;

use serde_json::{json, Value};
use types::ViewState;

use crate::labels::label;

/// Multi-line report for a terminal.
pub fn render_text(view: &ViewState) -> String {
    let mut out = String::new();
    if let Some(registry) = view.registry {
        let _ = writeln!(out, "Registry: {}", registry);
    }
    let access = if view.authorized {
        "owner (can add and remove topics)"
    } else {
        "viewer (read-only)"
    };
    let _ = writeln!(out, "Access:   {}", access);

    if view.topics.is_empty() {
        let _ = writeln!(out, "No claim topics registered.");
    } else {
        let _ = writeln!(out, "Claim topics ({}):", view.topics.len());
        for topic in view.topics.iter() {
            let _ = writeln!(out, "  {:>4}  {}", topic.id(), label(topic));
        }
    }

    if let Some(message) = &view.message {
        let _ = writeln!(out, "{}", message);
    }
    out
}

/// The snapshot as JSON, with topic labels.
pub fn render_json(view: &ViewState) -> Value {
    let topics: Vec<Value> = view
        .topics
        .iter()
        .map(|topic| json!({ "id": topic.id(), "label": label(topic) }))
        .collect();
    json!({
        "registry": view.registry,
        "authorized": view.authorized,
        "phase": view.phase,
        "message": view.message,
        "topics": topics,
    })
}

#[cfg(test)]
mod tests {
    use types::{OperationPhase, Topic, TopicSet};

    use super::*;

    fn sample() -> ViewState {
        ViewState {
            registry: Some("0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0".parse().expect("address")),
            topics: TopicSet::from_remote(vec![Topic::new(1), Topic::new(77)]).expect("unique"),
            authorized: true,
            phase: OperationPhase::Idle,
            message: Some("Topic 77 added successfully".to_string()),
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample());
        assert!(text.contains("Registry: 0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0"));
        assert!(text.contains("owner"));
        assert!(text.contains("     1  KYC (Know Your Customer)"));
        assert!(text.contains("    77  Custom Topic"));
        assert!(text.ends_with("Topic 77 added successfully\n"));

        let empty = render_text(&ViewState::default());
        assert!(empty.contains("viewer (read-only)"));
        assert!(empty.contains("No claim topics registered."));
    }

    #[test]
    fn test_render_json() {
        let value = render_json(&sample());
        assert_eq!(value["registry"], "0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0");
        assert_eq!(value["phase"], "idle");
        assert_eq!(value["topics"][1], json!({"id": 77, "label": "Custom Topic"}));
        assert_eq!(render_json(&ViewState::default())["message"], Value::Null);
    }
}
