//! Common test utilities for building flow definitions.
use taiwa::prelude::*;

#[allow(dead_code)]
pub const MATERIAL_CHOICES: [&str; 2] = ["Local materials", "Alternatives"];

/// The repair conversation built in code:
///
/// `start -> visual_support -> material_recommendations -> motivation_and_support
///  -> check_another_repair -{yes}-> start | -{no}-> end`
#[allow(dead_code)]
pub fn create_repair_flow() -> FlowDefinition {
    FlowDefinition {
        nodes: vec![
            FlowNodeDefinition::new("start", "start"),
            FlowNodeDefinition::new("visual_support", "message")
                .with_prompt("Video guide: {video_link}"),
            FlowNodeDefinition::new("material_recommendations", "message")
                .with_prompt("You'll need {material_1}. Local materials or alternatives?")
                .with_input(InputDefinition::multiple_choice(MATERIAL_CHOICES)),
            FlowNodeDefinition::new("motivation_and_support", "message")
                .with_prompt("You're doing great!"),
            FlowNodeDefinition::new("check_another_repair", "decision")
                .with_prompt("Anything else to repair?")
                .with_input(InputDefinition::yes_no()),
            FlowNodeDefinition::new("end", "end").with_prompt("Thanks for repairing with us!"),
        ],
        edges: vec![
            FlowEdgeDefinition::new("start", "visual_support"),
            FlowEdgeDefinition::new("visual_support", "material_recommendations"),
            FlowEdgeDefinition::new("material_recommendations", "motivation_and_support"),
            FlowEdgeDefinition::new("motivation_and_support", "check_another_repair"),
            FlowEdgeDefinition::when("check_another_repair", "start", "yes"),
            FlowEdgeDefinition::when("check_another_repair", "end", "no"),
        ],
        opening_statement: Some("You are a DIY repair assistant.".to_string()),
    }
}

/// Compiles [`create_repair_flow`], panicking on failure.
#[allow(dead_code)]
pub fn compile_repair_graph() -> Graph {
    GraphCompiler::builder(create_repair_flow())
        .build()
        .compile()
        .expect("repair flow should compile")
}

/// A flat document with free-text intake before the repair steps.
#[allow(dead_code)]
pub const FLAT_FLOW_JSON: &str = r#"{
    "opening_statement": "You are a DIY repair assistant.",
    "nodes": [
        { "id": "start", "type": "start" },
        { "id": "describe", "type": "message", "prompt": "What is broken?",
          "input": { "type": "free_text", "bind": "item" } },
        { "id": "confirm", "type": "decision", "prompt": "So your {item} needs fixing?",
          "input": { "type": "yes_no" } },
        { "id": "end", "type": "end", "prompt": "Good luck with the {item}!" }
    ],
    "edges": [
        { "source": "start", "target": "describe" },
        { "source": "describe", "target": "confirm" },
        { "source": "confirm", "target": "end", "condition": "yes" },
        { "source": "confirm", "target": "describe", "condition": "no" }
    ]
}"#;

/// The workflow export layout, with domain type names and `next_step` shorthands.
#[allow(dead_code)]
pub const EXPORT_FLOW_JSON: &str = r#"{
    "name": "DIY - reparation assistent",
    "workflow": {
        "features": { "opening_statement": "Hello! I'm your DIY Repair Assistant." },
        "graph": {
            "edges": [
                { "id": "e1", "source": "start", "target": "llm", "data": {} },
                { "id": "e2", "source": "llm", "target": "visual_support", "data": {} },
                { "id": "e3", "source": "check_another_repair", "target": "start",
                  "data": { "condition": "yes" } }
            ],
            "nodes": [
                { "id": "start", "data": { "type": "start", "title": "Start" } },
                { "id": "llm", "data": { "type": "llm", "title": "Diagnosis" } },
                { "id": "visual_support", "data": {
                    "type": "visual_support",
                    "prompt": "Video: {video_link}",
                    "next_step": "material_recommendations" } },
                { "id": "material_recommendations", "data": {
                    "type": "material_recommendations",
                    "prompt": "Local or alternatives?",
                    "input": { "type": "multiple_choice",
                               "choices": ["Local materials", "Alternatives"] },
                    "next_step": "check_another_repair" } },
                { "id": "check_another_repair", "data": {
                    "type": "check_another_repair",
                    "prompt": "Anything else?",
                    "input": { "type": "yes_no",
                               "next_step": { "yes": "start", "no": "end" } } } },
                { "id": "end", "data": { "type": "end", "prompt": "Bye!" } }
            ]
        }
    }
}"#;
