// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn text_line(session: &str, text: &str) -> String {
    format!(
        r#"{{"type":"text","timestamp":1700.5,"sessionID":"{session}","part":{{"id":"prt_1","text":"{text}","time":{{"start":1,"end":2}}}}}}"#
    )
}

#[test]
fn parses_step_start() {
    let line = r#"{"type":"step_start","timestamp":1.0,"sessionID":"ses_1","part":{"id":"prt_0","snapshot":"abc"}}"#;
    let event = parse_line(line).unwrap();
    assert_eq!(event.type_name(), "step_start");
    assert_eq!(event.session_id(), "ses_1");
    match event {
        WorkerEvent::StepStart { part, .. } => assert_eq!(part.snapshot, "abc"),
        other => panic!("wrong variant: {other:?}"),
    }
}

#[test]
fn parses_text() {
    let event = parse_line(&text_line("ses_1", "Done.")).unwrap();
    assert_eq!(event.text(), Some("Done."));
    assert!(!event.is_completion());
}

#[test]
fn parses_tool_use() {
    let line = r#"{"type":"tool_use","timestamp":2.0,"sessionID":"ses_1","part":{"id":"prt_2","tool":"bash","callID":"call_9","state":{"status":"completed","input":{"command":"ls"},"output":"ok","metadata":{"exit":0,"truncated":false}}}}"#;
    let event = parse_line(line).unwrap();
    match event {
        WorkerEvent::ToolUse { part, .. } => {
            assert_eq!(part.tool, "bash");
            assert_eq!(part.call_id, "call_9");
            assert_eq!(part.state.status, ToolStatus::Completed);
            assert_eq!(part.state.metadata.exit, Some(0));
        }
        other => panic!("wrong variant: {other:?}"),
    }
}

#[parameterized(
    stop = { "stop", true },
    tool_calls = { "tool-calls", false },
)]
fn step_finish_completion(reason: &str, completes: bool) {
    let line = format!(
        r#"{{"type":"step_finish","timestamp":3.0,"sessionID":"ses_1","part":{{"id":"prt_3","reason":"{reason}","tokens":{{"input":10,"output":4,"reasoning":0}},"cost":0.01}}}}"#
    );
    let event = parse_line(&line).unwrap();
    assert_eq!(event.is_completion(), completes);
    assert_eq!(event.token_usage().map(|t| t.input), Some(10));
}

#[test]
fn empty_and_blank_lines_are_silent() {
    assert!(parse_line("").is_none());
    assert!(parse_line("   \t ").is_none());
}

#[parameterized(
    not_json = { "not json at all" },
    not_object = { "[1,2,3]" },
    missing_type = { r#"{"timestamp":1.0,"sessionID":"s","part":{}}"# },
    type_not_string = { r#"{"type":7,"timestamp":1.0,"sessionID":"s","part":{}}"# },
    missing_timestamp = { r#"{"type":"text","sessionID":"s","part":{"text":"x"}}"# },
    session_not_string = { r#"{"type":"text","timestamp":1.0,"sessionID":9,"part":{"text":"x"}}"# },
    part_not_object = { r#"{"type":"text","timestamp":1.0,"sessionID":"s","part":"nope"}"# },
    unknown_type = { r#"{"type":"heartbeat","timestamp":1.0,"sessionID":"s","part":{}}"# },
    malformed_part = { r#"{"type":"text","timestamp":1.0,"sessionID":"s","part":{"id":"p"}}"# },
)]
fn malformed_lines_drop(line: &str) {
    assert!(parse_line(line).is_none());
}

#[test]
fn unknown_fields_are_preserved() {
    let line = r#"{"type":"text","timestamp":1.0,"sessionID":"s","part":{"text":"hi","novel":true},"topLevel":42}"#;
    let event = parse_line(line).unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["topLevel"], 42);
    assert_eq!(json["part"]["novel"], true);
}

#[test]
fn serde_round_trip() {
    let event = parse_line(&text_line("ses_2", "hello")).unwrap();
    let json = serde_json::to_string(&event).unwrap();
    let back: WorkerEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn tool_use_defaults_tolerate_sparse_parts() {
    let line = r#"{"type":"tool_use","timestamp":1.0,"sessionID":"s","part":{"id":"p"}}"#;
    let event = parse_line(line).unwrap();
    match event {
        WorkerEvent::ToolUse { part, .. } => {
            assert_eq!(part.state.status, ToolStatus::Pending);
            assert!(part.state.output.is_empty());
        }
        other => panic!("wrong variant: {other:?}"),
    }
}
