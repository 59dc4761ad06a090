//! Agent loop tests against a scripted provider

mod common;

use serde_json::json;
use std::time::Duration;

use common::{call, settings, time_call, ScriptedProvider};
use tooluse_agent::{AgentError, AgentLoop, AgentSettings, ToolOutcome};
use tooluse_provider::{ChatResponse, ProviderError, Role, ToolChoice};

fn agent(responses: Vec<ChatResponse>) -> AgentLoop<ScriptedProvider> {
    AgentLoop::new(ScriptedProvider::replying(responses), settings())
}

// ========== Direct Answer Tests ==========

#[tokio::test]
async fn test_direct_answer_skips_tool_phase() {
    let mut agent = agent(vec![ChatResponse::text("Hello there!")]);

    let report = agent.run_turn("Hi").await.unwrap();

    assert_eq!(report.answer, "Hello there!");
    assert!(!report.used_tools());
    assert_eq!(agent.provider().call_count(), 1);
    assert_eq!(agent.history().len(), 2);
    assert_eq!(agent.history().last().unwrap().role, Role::Assistant);
}

#[tokio::test]
async fn test_request_shape() {
    let mut agent = agent(vec![ChatResponse::text("ok")]);
    agent.run("Hi").await.unwrap();

    let params = &agent.provider().calls()[0];
    assert_eq!(params.model, "test-model");
    assert_eq!(params.max_tokens, 256);
    assert_eq!(params.tool_choice, ToolChoice::Auto);
    assert_eq!(params.tools.len(), 3);
    assert_eq!(params.messages.len(), 2);
    assert_eq!(params.messages[0].role, Role::System);
    assert!(params.messages[0].content.as_deref().unwrap().contains("get_time"));
    assert_eq!(params.messages[1].content.as_deref(), Some("Hi"));
}

#[tokio::test]
async fn test_custom_system_prompt() {
    let settings = AgentSettings {
        system_prompt: Some("Answer in one word.".to_string()),
        ..settings()
    };
    let mut agent = AgentLoop::new(
        ScriptedProvider::replying(vec![ChatResponse::text("Fine")]),
        settings,
    );
    agent.run("How are you?").await.unwrap();

    let params = &agent.provider().calls()[0];
    assert_eq!(params.messages[0].content.as_deref(), Some("Answer in one word."));
}

#[tokio::test]
async fn test_empty_model_text_is_empty_answer() {
    let mut response = ChatResponse::text("");
    response.content = None;
    let mut agent = agent(vec![response]);

    assert_eq!(agent.run("Hi").await.unwrap(), "");
}

// ========== Tool Phase Tests ==========

#[tokio::test]
async fn test_tool_round_trip() {
    let mut agent = agent(vec![
        time_call("call_1", "Cape Town"),
        ChatResponse::text("It is afternoon in Cape Town."),
    ]);

    let report = agent.run_turn("What time is it in Cape Town?").await.unwrap();

    assert_eq!(report.answer, "It is afternoon in Cape Town.");
    assert_eq!(report.tool_runs.len(), 1);
    let run = &report.tool_runs[0];
    assert_eq!(run.request_id, "call_1");
    assert_eq!(run.tool_name, "get_time");
    assert!(run.outcome.is_success());
    assert!(run.outcome.text().starts_with("The current time in Cape Town is "));

    let calls = agent.provider().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].tool_choice, ToolChoice::None);

    let last = calls[1].messages.last().unwrap();
    assert_eq!(last.role, Role::Tool);
    assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(last.content.as_deref(), Some(run.outcome.text()));

    // user, assistant tool calls, tool result, assistant answer
    assert_eq!(agent.history().len(), 4);
    assert_eq!(agent.state().last_location(), Some("Cape Town"));
    assert_eq!(agent.state().last_tool_name(), Some("get_time"));
}

#[tokio::test]
async fn test_follow_up_resolves_that() {
    let mut agent = agent(vec![
        time_call("call_1", "Cape Town"),
        ChatResponse::text("It's 2 PM in Cape Town."),
        time_call("call_2", "that"),
        ChatResponse::text("That is noon UTC."),
    ]);

    agent.run("What time is it in Cape Town?").await.unwrap();
    let report = agent.run_turn("Convert that to UTC.").await.unwrap();

    let run = &report.tool_runs[0];
    assert_eq!(run.args_used, json!({"location": "Cape Town"}));
    assert!(run.outcome.text().starts_with("The current time in Cape Town is "));
    assert_eq!(report.answer, "That is noon UTC.");

    let intents: Vec<&str> = agent.state().recent_intents().collect();
    assert_eq!(intents, vec!["What time is it in Cape Town?", "Convert that to UTC."]);
    assert_eq!(agent.state().last_location(), Some("Cape Town"));
    assert_eq!(agent.history().count_role(Role::System), 0);
}

#[tokio::test]
async fn test_multiple_calls_run_in_order() {
    let mut agent = agent(vec![
        ChatResponse::tool_calls(vec![
            call("a", "calc", json!({"expr": "oops"})),
            call("b", "get_time", json!({"location": "London"})),
            call("c", "calc", json!({"expression": "18% of 24500"})),
        ]),
        ChatResponse::text("Done."),
    ]);

    let report = agent.run_turn("Several things").await.unwrap();

    let ids: Vec<&str> = report.tool_runs.iter().map(|r| r.request_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(matches!(report.tool_runs[0].outcome, ToolOutcome::Failed(_)));
    assert!(report.tool_runs[1].outcome.is_success());
    assert!(report.tool_runs[2].outcome.text().contains("4,410.00"));

    let tool_ids: Vec<&str> = agent
        .history()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(tool_ids, vec!["a", "b", "c"]);

    assert_eq!(agent.state().last_tool_name(), Some("calc"));
    assert_eq!(agent.state().last_location(), Some("London"));
}

#[tokio::test]
async fn test_unknown_tool_is_text_result() {
    let mut agent = agent(vec![
        ChatResponse::tool_calls(vec![call("w1", "weather", json!({"city": "Paris"}))]),
        ChatResponse::text("I can't check the weather."),
    ]);

    let report = agent.run_turn("Weather in Paris?").await.unwrap();

    assert_eq!(
        report.tool_runs[0].outcome,
        ToolOutcome::NotFound("Error: Tool 'weather' not found".to_string())
    );
    assert_eq!(report.answer, "I can't check the weather.");
    assert_eq!(agent.state().last_tool_name(), Some("weather"));
}

#[tokio::test]
async fn test_domain_errors_reach_the_model() {
    let mut agent = agent(vec![
        ChatResponse::tool_calls(vec![call("d", "calc", json!({"expression": "10 / 0"}))]),
        ChatResponse::text("You can't divide by zero."),
    ]);

    let report = agent.run_turn("What is 10 / 0?").await.unwrap();

    assert!(report.tool_runs[0].outcome.is_success());
    let calls = agent.provider().calls();
    let tool_text = calls[1].messages.last().unwrap().content.clone().unwrap();
    assert!(tool_text.contains("Division by zero"));
}

#[tokio::test]
async fn test_synthesis_tool_calls_are_dropped() {
    let mut synthesis = time_call("late", "Tokyo");
    synthesis.content = Some("It's 3 PM in London.".to_string());

    let mut agent = agent(vec![time_call("call_1", "London"), synthesis]);
    let report = agent.run_turn("Time in London?").await.unwrap();

    assert_eq!(report.answer, "It's 3 PM in London.");
    assert_eq!(report.tool_runs.len(), 1);
    assert_eq!(agent.history().count_role(Role::Tool), 1);
    assert_eq!(agent.state().last_location(), Some("London"));
}

// ========== Session Control Tests ==========

#[tokio::test]
async fn test_reset_keeps_state_and_injects_context() {
    let mut agent = agent(vec![
        time_call("call_1", "Cape Town"),
        ChatResponse::text("It's 2 PM in Cape Town."),
        time_call("call_2", "that"),
        ChatResponse::text("Noon UTC."),
    ]);

    agent.run("What time is it in Cape Town?").await.unwrap();
    agent.reset();
    assert!(agent.history().is_empty());
    assert_eq!(agent.state().last_location(), Some("Cape Town"));
    let intents: Vec<&str> = agent.state().recent_intents().collect();
    assert_eq!(intents, vec!["What time is it in Cape Town?"]);

    let report = agent.run_turn("Convert that to UTC.").await.unwrap();
    assert_eq!(report.tool_runs[0].args_used["location"], "Cape Town");
    let intents: Vec<&str> = agent.state().recent_intents().collect();
    assert_eq!(intents, vec!["What time is it in Cape Town?", "Convert that to UTC."]);

    let params = &agent.provider().calls()[2];
    let context = params.messages[1].content.as_deref().unwrap();
    assert_eq!(params.messages[1].role, Role::System);
    assert!(context.starts_with("Context from previous conversation: "));
    assert!(context.contains("Last location: Cape Town"));
    assert_eq!(params.messages[2].content.as_deref(), Some("Convert that to UTC."));
}

#[tokio::test]
async fn test_reset_without_location_injects_nothing() {
    let mut agent = agent(vec![ChatResponse::text("Hi"), ChatResponse::text("Hi again")]);

    agent.run("Hello").await.unwrap();
    agent.reset();
    agent.run("Hello again").await.unwrap();

    let params = &agent.provider().calls()[1];
    assert_eq!(params.messages.len(), 2);
    assert_eq!(params.messages[1].role, Role::User);
}

#[tokio::test]
async fn test_reset_all_forgets_location() {
    let mut agent = agent(vec![
        time_call("call_1", "Cape Town"),
        ChatResponse::text("It's 2 PM in Cape Town."),
        time_call("call_2", "that"),
        ChatResponse::text("Which location do you mean?"),
    ]);

    agent.run("What time is it in Cape Town?").await.unwrap();
    agent.reset_all();
    assert!(agent.history().is_empty());
    assert!(agent.state().last_location().is_none());
    assert_eq!(agent.state().recent_intents().count(), 0);

    let report = agent.run_turn("Convert that to UTC.").await.unwrap();
    let run = &report.tool_runs[0];
    assert_eq!(run.args_used["location"], "that");
    assert!(run.outcome.text().contains("Location 'that' not supported"));

    let params = &agent.provider().calls()[2];
    assert_eq!(params.messages[1].role, Role::User);
}

// ========== Model Fault Tests ==========

#[tokio::test]
async fn test_provider_error_propagates() {
    let mut agent = AgentLoop::new(
        ScriptedProvider::new(vec![Err(ProviderError::RateLimited)]),
        settings(),
    );

    let err = agent.run("Hi").await.unwrap_err();

    assert!(matches!(err, AgentError::Provider(ProviderError::RateLimited)));
    assert_eq!(agent.state().recent_intents().count(), 1);
    assert_eq!(agent.history().len(), 1);
}

#[tokio::test]
async fn test_synthesis_failure_keeps_tool_state() {
    let mut agent = AgentLoop::new(
        ScriptedProvider::new(vec![
            Ok(time_call("call_1", "Tokyo")),
            Err(ProviderError::Api("500: upstream".to_string())),
        ]),
        settings(),
    );

    let err = agent.run("Time in Tokyo?").await.unwrap_err();

    assert!(err.to_string().contains("500: upstream"));
    assert_eq!(agent.state().last_location(), Some("Tokyo"));
    assert_eq!(agent.history().count_role(Role::Tool), 1);
}

#[tokio::test]
async fn test_model_timeout_is_recoverable() {
    let provider = ScriptedProvider::replying(vec![
        ChatResponse::text("too late"),
        ChatResponse::text("on time"),
    ])
    .stall_first(Duration::from_secs(5));

    let settings = AgentSettings {
        model_timeout: Some(Duration::from_millis(50)),
        ..settings()
    };
    let mut agent = AgentLoop::new(provider, settings);

    let err = agent.run("Hi").await.unwrap_err();
    assert!(matches!(err, AgentError::ModelTimeout(d) if d == Duration::from_millis(50)));

    agent.reset();
    assert_eq!(agent.run("Hi again").await.unwrap(), "on time");
}
