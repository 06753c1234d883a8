//! Turn-by-turn behaviour of the execution engine.
mod common;
use common::*;
use std::sync::{Arc, Mutex};
use taiwa::prelude::*;

fn repair_engine() -> Engine {
    Engine::new(compile_repair_graph())
}

/// Drives a fresh session up to `material_recommendations`.
fn session_at_materials(engine: &Engine) -> String {
    let session = engine.start_session();
    let result = engine
        .submit_turn(&session, "My chair is wobbly")
        .expect("first turn");
    assert_eq!(result.node_id, "material_recommendations");
    session
}

#[test]
fn test_new_session_rests_on_start() {
    let engine = repair_engine();
    let session = engine.start_session();
    let record = engine.snapshot(&session).unwrap();

    assert_eq!(record.current_node, "start");
    assert_eq!(record.turn, 0);
    assert!(!record.terminal);
    assert_eq!(record.status(), SessionStatus::Active);
    assert_eq!(engine.session_count(), 1);
}

#[test]
fn test_first_turn_runs_to_the_first_suspending_node() {
    let engine = repair_engine();
    let session = engine.start_session();
    let result = engine.submit_turn(&session, "My chair is wobbly").unwrap();

    assert_eq!(
        result.visited,
        vec!["start", "visual_support", "material_recommendations"]
    );
    assert_eq!(result.node_id, "material_recommendations");
    assert!(result.awaiting_input);
    assert!(!result.terminal);
    assert_eq!(result.turn, 1);
    assert!(result.retry.is_none());
    assert_eq!(
        result.output_text,
        "Video guide: \n\nYou'll need . Local materials or alternatives?"
    );

    let missing: Vec<&str> = result.warnings.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(missing, vec!["video_link", "material_1"]);

    let record = engine.snapshot(&session).unwrap();
    assert_eq!(record.binding("last_input"), Some("My chair is wobbly"));
}

#[test]
fn test_valid_choice_advances() {
    let engine = repair_engine();
    let session = session_at_materials(&engine);

    let result = engine.submit_turn(&session, "local MATERIALS").unwrap();
    assert_eq!(
        result.visited,
        vec!["motivation_and_support", "check_another_repair"]
    );
    assert_eq!(result.node_id, "check_another_repair");
    assert_eq!(
        result.output_text,
        "You're doing great!\n\nAnything else to repair?"
    );

    let record = engine.snapshot(&session).unwrap();
    assert_eq!(
        record.binding("material_recommendations_response"),
        Some("Local materials")
    );
}

#[test]
fn test_invalid_choice_is_retried_in_place() {
    let engine = repair_engine();
    let session = session_at_materials(&engine);

    let first = engine.submit_turn(&session, "banana").unwrap();
    let retry = first.retry.clone().expect("banana is not a choice");
    assert_eq!(retry.reason, RetryReason::InvalidChoice);
    assert_eq!(retry.node_id, "material_recommendations");
    assert_eq!(retry.valid_options, MATERIAL_CHOICES.to_vec());
    assert_eq!(first.node_id, "material_recommendations");
    assert!(first.awaiting_input);
    assert!(first.visited.is_empty());
    assert!(
        first
            .output_text
            .ends_with("\n\nPlease choose one of: Local materials, Alternatives.")
    );

    let second = engine.submit_turn(&session, "banana").unwrap();
    assert_eq!(second.retry, first.retry);
    assert_eq!(second.output_text, first.output_text);
    assert_eq!(second.turn, first.turn + 1);

    let record = engine.snapshot(&session).unwrap();
    assert_eq!(record.current_node, "material_recommendations");
    assert_eq!(record.turn, 3);
}

#[test]
fn test_no_ends_the_session() {
    let engine = repair_engine();
    let session = session_at_materials(&engine);
    engine.submit_turn(&session, "Alternatives").unwrap();

    let result = engine.submit_turn(&session, "nope").unwrap();
    assert_eq!(result.node_id, "end");
    assert!(result.terminal);
    assert!(!result.awaiting_input);
    assert_eq!(result.output_text, "Thanks for repairing with us!");

    let before = engine.snapshot(&session).unwrap();
    assert_eq!(before.status(), SessionStatus::Terminated);
    assert_eq!(
        engine.submit_turn(&session, "hello?").unwrap_err(),
        EngineError::SessionTerminated(session.clone())
    );
    assert_eq!(engine.snapshot(&session).unwrap(), before);
}

#[test]
fn test_unclear_yes_no_is_retried() {
    let engine = repair_engine();
    let session = session_at_materials(&engine);
    engine.submit_turn(&session, "Alternatives").unwrap();

    let result = engine.submit_turn(&session, "perhaps").unwrap();
    let retry = result.retry.expect("perhaps is neither yes nor no");
    assert_eq!(retry.reason, RetryReason::AmbiguousYesNo);
    assert_eq!(result.node_id, "check_another_repair");
    assert_eq!(
        result.output_text,
        "Anything else to repair?\n\nPlease answer yes or no."
    );
}

#[test]
fn test_loop_back_keeps_bindings() {
    let engine = repair_engine();
    let session = engine.start_session();
    engine.bind(&session, "material_1", "Wood glue").unwrap();

    let first = engine.submit_turn(&session, "My chair is wobbly").unwrap();
    assert!(first.output_text.contains("You'll need Wood glue."));
    engine.submit_turn(&session, "Local materials").unwrap();

    let result = engine.submit_turn(&session, "Yeah").unwrap();
    assert_eq!(
        result.visited,
        vec!["start", "visual_support", "material_recommendations"]
    );
    assert_eq!(result.node_id, "material_recommendations");
    assert!(result.output_text.contains("You'll need Wood glue."));

    let record = engine.snapshot(&session).unwrap();
    assert_eq!(record.binding("material_1"), Some("Wood glue"));
    assert_eq!(
        record.binding("material_recommendations_response"),
        Some("Local materials")
    );
    assert_eq!(record.binding("check_another_repair_response"), Some("yes"));
}

#[test]
fn test_initial_bindings_fill_only_missing_names() {
    let mut config = EngineConfig::default();
    config
        .initial_bindings
        .insert("video_link".to_string(), "https://video.test".to_string());
    config
        .initial_bindings
        .insert("material_1".to_string(), "Duct tape".to_string());
    let engine = Engine::builder(compile_repair_graph())
        .with_config(config)
        .build();

    let session = engine.start_session();
    engine.bind(&session, "material_1", "Wood glue").unwrap();
    let result = engine.submit_turn(&session, "My chair is wobbly").unwrap();

    assert!(result.warnings.is_empty());
    assert_eq!(
        result.output_text,
        "Video guide: https://video.test\n\nYou'll need Wood glue. Local materials or alternatives?"
    );
}

#[test]
fn test_off_topic_contact_is_redirected() {
    let engine = repair_engine();
    let session = engine.start_session();

    let result = engine
        .submit_turn(&session, "What do you think about the weather?")
        .unwrap();
    let retry = result.retry.expect("weather is off topic");
    assert_eq!(retry.reason, RetryReason::OffTopic);
    assert_eq!(result.node_id, "start");
    assert_eq!(result.output_text, engine.config().off_topic_reply);
    assert_eq!(result.turn, 1);

    let result = engine.submit_turn(&session, "My faucet is leaking").unwrap();
    assert_eq!(result.node_id, "material_recommendations");
    assert_eq!(result.turn, 2);
}

#[test]
fn test_off_topic_guard_can_be_disabled() {
    let config = EngineConfig {
        off_topic_keywords: Vec::new(),
        ..EngineConfig::default()
    };
    let engine = Engine::builder(compile_repair_graph())
        .with_config(config)
        .build();
    let session = engine.start_session();

    let result = engine.submit_turn(&session, "the weather broke my fence").unwrap();
    assert!(result.retry.is_none());
    assert_eq!(result.node_id, "material_recommendations");
}

#[test]
fn test_free_text_is_bound_and_rendered() {
    let engine = Engine::new(load_graph(FLAT_FLOW_JSON.as_bytes()).unwrap());
    let session = engine.start_session();

    let result = engine.submit_turn(&session, "hi").unwrap();
    assert_eq!(result.output_text, "What is broken?");
    assert_eq!(result.node_id, "describe");

    let result = engine.submit_turn(&session, "  garden hose ").unwrap();
    assert_eq!(result.output_text, "So your garden hose needs fixing?");

    let result = engine.submit_turn(&session, "no").unwrap();
    assert_eq!(result.node_id, "describe");

    engine.submit_turn(&session, "lawn mower").unwrap();
    let result = engine.submit_turn(&session, "yes").unwrap();
    assert!(result.terminal);
    assert_eq!(result.output_text, "Good luck with the lawn mower!");
}

#[test]
fn test_off_topic_free_text_is_not_bound() {
    let engine = Engine::new(load_graph(FLAT_FLOW_JSON.as_bytes()).unwrap());
    let session = engine.start_session();
    engine.submit_turn(&session, "hi").unwrap();

    let result = engine.submit_turn(&session, "tell me the news").unwrap();
    let retry = result.retry.expect("news is off topic");
    assert_eq!(retry.reason, RetryReason::OffTopic);
    assert_eq!(result.node_id, "describe");
    assert!(result.awaiting_input);
    assert_eq!(
        result.output_text,
        format!("What is broken?\n\n{}", engine.config().off_topic_reply)
    );
    assert_eq!(result.turn, 2);

    let record = engine.snapshot(&session).unwrap();
    assert_eq!(record.current_node, "describe");
    assert_eq!(record.turn, 2);
    assert_eq!(record.binding("item"), None);

    let result = engine.submit_turn(&session, "garden hose").unwrap();
    assert_eq!(result.output_text, "So your garden hose needs fixing?");
    assert_eq!(result.turn, 3);
}

#[test]
fn test_unknown_session_is_rejected() {
    let engine = repair_engine();
    assert_eq!(
        engine.submit_turn("missing", "hi").unwrap_err(),
        EngineError::UnknownSession("missing".to_string())
    );
    assert!(engine.snapshot("missing").is_err());
    assert!(!engine.close_session("missing"));
}

#[test]
fn test_close_session_forgets_it() {
    let engine = repair_engine();
    let session = engine.start_session();
    assert!(engine.close_session(&session));
    assert_eq!(engine.session_count(), 0);
    assert!(matches!(
        engine.submit_turn(&session, "hi"),
        Err(EngineError::UnknownSession(_))
    ));
}

#[test]
fn test_generated_reply_is_emitted_and_mined() {
    let seen: Arc<Mutex<Vec<ReplyRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let generator = move |request: &ReplyRequest| -> Result<String, CollaboratorError> {
        log.lock().unwrap().push(request.clone());
        Ok("**Issue Type:** loose joint\nStep 1: Tighten the screws".to_string())
    };
    let engine = Engine::builder(load_graph(EXPORT_FLOW_JSON.as_bytes()).unwrap())
        .with_generator(generator)
        .build();

    let session = engine.start_session();
    let result = engine.submit_turn(&session, "My chair wobbles").unwrap();
    assert_eq!(
        result.output_text,
        "**Issue Type:** loose joint\nStep 1: Tighten the screws\n\nVideo: \n\nLocal or alternatives?"
    );

    let record = engine.snapshot(&session).unwrap();
    assert_eq!(record.binding("issue_type"), Some("loose joint"));
    assert_eq!(record.binding("step_one"), Some("Tighten the screws"));
    assert!(record.binding("reply").is_some());

    {
        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].node_id, "llm");
        assert_eq!(
            requests[0].messages,
            vec![
                ChatMessage::new(Role::System, "Hello! I'm your DIY Repair Assistant."),
                ChatMessage::new(Role::User, "My chair wobbles"),
            ]
        );
    }

    // Second pass through the loop sees the first exchange as history.
    engine.submit_turn(&session, "Alternatives").unwrap();
    engine.submit_turn(&session, "yes").unwrap();
    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let roles: Vec<Role> = requests[1].messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User]
    );
    assert_eq!(requests[1].messages[3].content, "yes");
}

#[test]
fn test_generator_failure_leaves_session_unchanged() {
    let generator = |_: &ReplyRequest| -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Timeout)
    };
    let engine = Engine::builder(load_graph(EXPORT_FLOW_JSON.as_bytes()).unwrap())
        .with_generator(generator)
        .build();

    let session = engine.start_session();
    let before = engine.snapshot(&session).unwrap();

    let result = engine.submit_turn(&session, "My chair wobbles").unwrap();
    let retry = result.retry.expect("generator failure is retryable");
    assert_eq!(retry.reason, RetryReason::CollaboratorUnavailable);
    assert_eq!(retry.node_id, "llm");
    assert_eq!(result.node_id, "start");
    assert!(result.awaiting_input);
    assert!(!result.terminal);

    assert_eq!(engine.snapshot(&session).unwrap(), before);
    assert_eq!(engine.failure_snapshot(&session).unwrap(), None);
}

#[test]
fn test_without_generator_generate_nodes_pass_through() {
    let engine = Engine::new(load_graph(EXPORT_FLOW_JSON.as_bytes()).unwrap());
    let session = engine.start_session();

    let result = engine.submit_turn(&session, "My chair wobbles").unwrap();
    assert_eq!(
        result.visited,
        vec!["start", "llm", "visual_support", "material_recommendations"]
    );
    assert_eq!(result.output_text, "Video: \n\nLocal or alternatives?");
}

#[test]
fn test_snapshot_restore_continues_the_conversation() {
    let engine = repair_engine();
    let session = session_at_materials(&engine);
    let bytes = engine.snapshot(&session).unwrap().to_bytes().unwrap();

    let other = repair_engine();
    let restored = other
        .restore(SessionRecord::from_bytes(&bytes).unwrap())
        .unwrap();
    assert_eq!(restored, session);

    let result = other.submit_turn(&restored, "Alternatives").unwrap();
    assert_eq!(result.node_id, "check_another_repair");
    assert_eq!(result.turn, 2);
}

#[test]
fn test_restore_rejects_unknown_node() {
    let engine = repair_engine();
    let record = Session::with_id("s-1", "ghost");
    match engine.restore(record).unwrap_err() {
        EngineError::InvalidRecord { session_id, .. } => assert_eq!(session_id, "s-1"),
        other => panic!("Expected InvalidRecord error, got {:?}", other),
    }
    assert_eq!(engine.session_count(), 0);
}

#[test]
fn test_restore_rejects_waiting_on_pass_through_node() {
    let engine = repair_engine();
    let mut record = Session::with_id("s-2", "visual_support");
    record.awaiting_input = true;
    assert!(matches!(
        engine.restore(record),
        Err(EngineError::InvalidRecord { .. })
    ));
}

#[test]
fn test_turn_trace_format() {
    let engine = repair_engine();
    let session = engine.start_session();
    let result = engine.submit_turn(&session, "My chair is wobbly").unwrap();
    assert_eq!(
        TraceFormatter::format_turn(&result),
        "turn 1: start -> visual_support -> material_recommendations [awaiting input] \
         (unresolved: {video_link}, {material_1})"
    );
}
