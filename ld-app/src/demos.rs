//! The demo scenarios behind each subcommand.
//!
//! Every demo writes to a caller-supplied writer so tests can drive it with a
//! scripted client and inspect the transcript.

use crate::commands::{Input, parse_input};
use crate::config::AppConfig;
use crate::session::Session;
use anyhow::Result;
use futures_util::StreamExt;
use ld_llm::{
    ChatMessage, CompletionOptions, LlmClient, create_completion, create_completion_with_tools,
    create_streaming_completion, extract_tool_calls,
};
use ld_tools::{LookupWeatherTool, ToolBox};
use serde_json::json;
use std::io::{BufRead, Write};

pub const HELLO_PROMPT: &str = "Say hello in one short sentence.";
pub const ASSISTANT_PROMPT: &str = "You are a helpful assistant.";
pub const CHAT_PROMPT: &str = "What's the weather like in Bogota today?";
pub const STREAM_PROMPT: &str = "Write a short description of the poverty probability index.";
pub const HISTORY_PROMPT: &str = "You are a helpful assistant. Be concise and friendly.";
pub const WEATHER_SYSTEM_PROMPT: &str = "You are a helpful weather assistant.";
pub const WEATHER_USER_PROMPT: &str = "What's the temperature in Celsius in Bogota?";

const CHAT_TEMPERATURE: f32 = 0.7;

fn banner<W: Write>(cfg: &AppConfig, out: &mut W) -> Result<()> {
    writeln!(out, "\nUsing {} with model: {}\n", cfg.provider, cfg.model)?;
    Ok(())
}

pub async fn test_connection<W: Write>(
    client: &LlmClient,
    cfg: &AppConfig,
    out: &mut W,
) -> Result<()> {
    banner(cfg, out)?;
    let messages = [ChatMessage::user(HELLO_PROMPT)];
    let reply = create_completion(
        client,
        cfg.provider,
        &cfg.model,
        &messages,
        &CompletionOptions::default(),
    )
    .await?;
    writeln!(out, "Connection OK. Model replied: {reply}")?;
    Ok(())
}

pub async fn chat<W: Write>(client: &LlmClient, cfg: &AppConfig, out: &mut W) -> Result<()> {
    banner(cfg, out)?;
    let messages = [
        ChatMessage::system(ASSISTANT_PROMPT),
        ChatMessage::user(CHAT_PROMPT),
    ];
    let options = CompletionOptions::new().temperature(CHAT_TEMPERATURE);
    let reply = create_completion(client, cfg.provider, &cfg.model, &messages, &options).await?;
    writeln!(out, "{reply}")?;
    Ok(())
}

pub async fn stream<W: Write>(client: &LlmClient, cfg: &AppConfig, out: &mut W) -> Result<()> {
    banner(cfg, out)?;
    let messages = [
        ChatMessage::system(ASSISTANT_PROMPT),
        ChatMessage::user(STREAM_PROMPT),
    ];
    let options = CompletionOptions::new().temperature(CHAT_TEMPERATURE);
    let mut fragments =
        create_streaming_completion(client, cfg.provider, &cfg.model, &messages, &options).await?;
    while let Some(fragment) = fragments.next().await {
        write!(out, "{}", fragment?)?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

/// Interactive chat that remembers earlier turns.
///
/// Reads lines from `input` until `quit`/`exit` or end of input.
pub async fn history<R: BufRead, W: Write>(
    client: &LlmClient,
    cfg: &AppConfig,
    mut input: R,
    stream: bool,
    out: &mut W,
) -> Result<()> {
    banner(cfg, out)?;
    let mode = if stream { " (streaming mode)" } else { "" };
    writeln!(out, "Chat session started{mode}!")?;
    writeln!(out, "Type 'quit' or 'exit' to end the conversation.\n")?;

    let mut session = Session::new(HISTORY_PROMPT);
    let options = CompletionOptions::new().temperature(CHAT_TEMPERATURE);
    let mut line = String::new();
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        match parse_input(&line) {
            Input::Quit => break,
            Input::Skip => continue,
            Input::Reset => {
                session.reset();
                writeln!(out, "Started a new conversation.\n")?;
            }
            Input::Message(text) => {
                write!(out, "\nAssistant: ")?;
                out.flush()?;
                let reply = match session
                    .send(client, cfg, &text, &options, stream, out)
                    .await
                {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::warn!(error = %e, "chat turn failed");
                        writeln!(out, "\nError: {e}\n")?;
                        continue;
                    }
                };
                if stream {
                    writeln!(out, "\n")?;
                } else {
                    writeln!(out, "{reply}\n")?;
                }
            }
        }
    }
    tracing::debug!(turns = session.history().len(), "chat session ended");
    writeln!(out, "\nGoodbye!\n")?;
    Ok(())
}

/// Offer `lookup_weather` to the model and report what it chose.
///
/// With `execute` set, each requested call is run through the toolbox.
pub async fn tools<W: Write>(
    client: &LlmClient,
    cfg: &AppConfig,
    execute: bool,
    out: &mut W,
) -> Result<()> {
    banner(cfg, out)?;
    let toolbox = ToolBox::new().with(LookupWeatherTool::new());
    let messages = [
        ChatMessage::system(WEATHER_SYSTEM_PROMPT),
        ChatMessage::user(WEATHER_USER_PROMPT),
    ];
    let options = CompletionOptions::new().tool_choice(json!("auto"));
    let response = create_completion_with_tools(
        client,
        cfg.provider,
        &cfg.model,
        &messages,
        &toolbox.definitions(),
        &options,
    )
    .await?;

    let calls = extract_tool_calls(&response, cfg.provider)?;
    if calls.is_empty() {
        writeln!(out, "Model responded with text instead of calling a function:")?;
        writeln!(out, "{}", response.text()?)?;
        return Ok(());
    }

    for call in &calls {
        writeln!(out, "Model chose to call: {}", call.name)?;
        writeln!(out, "Arguments: {}\n", serde_json::to_string(&call.arguments)?)?;
        if execute {
            let result = toolbox.execute(call).await?;
            let rendered = match result {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            writeln!(out, "Function result: {rendered}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld_llm::testing::{ScriptedAnthropic, ScriptedOpenAi};
    use ld_llm::{
        AnthropicContentBlock, AnthropicResponse, LlmConfig, OpenAiChatResponse,
        OpenAiStreamChunk, Provider,
    };

    fn cfg(provider: Provider) -> AppConfig {
        AppConfig {
            llm: LlmConfig::default(),
            provider,
            model: provider.default_model().to_string(),
        }
    }

    fn openai_text(content: &str) -> OpenAiChatResponse {
        serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
        .expect("response")
    }

    fn anthropic_blocks(content: Vec<AnthropicContentBlock>) -> AnthropicResponse {
        AnthropicResponse {
            id: "msg_1".to_string(),
            model: "claude-haiku-4-5".to_string(),
            content,
            stop_reason: None,
        }
    }

    fn transcript(out: Vec<u8>) -> String {
        String::from_utf8(out).expect("utf8")
    }

    #[tokio::test]
    async fn test_connection_prints_reply() {
        let transport = ScriptedOpenAi::new();
        transport.queue_response(openai_text("Hello there!"));
        let client = LlmClient::openai(transport.clone());
        let mut out = Vec::new();

        test_connection(&client, &cfg(Provider::OpenAI), &mut out)
            .await
            .expect("demo");

        let text = transcript(out);
        assert!(text.contains("Using openai with model: gpt-4o-mini"));
        assert!(text.contains("Hello there!"));
        let requests = transport.recorded_requests();
        assert_eq!(requests[0].messages, vec![ChatMessage::user(HELLO_PROMPT)]);
    }

    #[tokio::test]
    async fn chat_sends_system_prompt_and_temperature() {
        let transport = ScriptedAnthropic::new();
        transport.queue_response(anthropic_blocks(vec![AnthropicContentBlock::Text {
            text: "Sunny in Bogota.".to_string(),
        }]));
        let client = LlmClient::anthropic(transport.clone());
        let mut out = Vec::new();

        chat(&client, &cfg(Provider::Anthropic), &mut out)
            .await
            .expect("demo");

        assert!(transcript(out).contains("Sunny in Bogota."));
        let request = &transport.recorded_requests()[0];
        assert_eq!(request.system.as_deref(), Some(ASSISTANT_PROMPT));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.messages, vec![ChatMessage::user(CHAT_PROMPT)]);
    }

    #[tokio::test]
    async fn stream_prints_fragments_in_order() {
        let transport = ScriptedOpenAi::new();
        transport.queue_stream(vec![
            OpenAiStreamChunk::text("The PPI "),
            OpenAiStreamChunk::text(""),
            OpenAiStreamChunk::text("measures poverty."),
        ]);
        let client = LlmClient::openai(transport);
        let mut out = Vec::new();

        stream(&client, &cfg(Provider::OpenAI), &mut out)
            .await
            .expect("demo");

        assert!(transcript(out).ends_with("The PPI measures poverty.\n"));
    }

    #[tokio::test]
    async fn history_loop_skips_blanks_and_stops_on_exit() {
        let transport = ScriptedOpenAi::new();
        transport.queue_response(openai_text("Nice to meet you, Ana."));
        let client = LlmClient::openai(transport.clone());
        let input = "I'm Ana\n\n   \nEXIT\nnever sent\n".as_bytes();
        let mut out = Vec::new();

        history(&client, &cfg(Provider::OpenAI), input, false, &mut out)
            .await
            .expect("demo");

        let text = transcript(out);
        assert!(text.contains("Assistant: Nice to meet you, Ana."));
        assert!(text.contains("Goodbye!"));
        assert_eq!(transport.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn history_loop_survives_failed_turn() {
        let transport = ScriptedAnthropic::new();
        transport.queue_response(anthropic_blocks(vec![AnthropicContentBlock::Other]));
        transport.queue_response(anthropic_blocks(vec![AnthropicContentBlock::Text {
            text: "Second answer.".to_string(),
        }]));
        let client = LlmClient::anthropic(transport.clone());
        let mut out = Vec::new();

        history(
            &client,
            &cfg(Provider::Anthropic),
            "first\nsecond\nquit\n".as_bytes(),
            false,
            &mut out,
        )
        .await
        .expect("loop keeps running");

        let text = transcript(out);
        assert!(text.contains("Error: "));
        assert!(text.contains("Assistant: Second answer."));
        assert!(text.contains("Goodbye!"));
        let requests = transport.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages, vec![ChatMessage::user("second")]);
    }

    #[tokio::test]
    async fn failed_turn_is_not_resent() {
        let transport = ScriptedOpenAi::new();
        let client = LlmClient::openai(transport.clone());
        // The first turn drains the only queued item, an error; the second
        // turn gets the queued reply.
        transport.queue_stream_items(vec![Err(ld_llm::LlmError::Api {
            provider: "openai",
            message: "overloaded".to_string(),
        })]);
        transport.queue_stream(vec![OpenAiStreamChunk::text("Hi again.")]);
        let mut out = Vec::new();

        history(
            &client,
            &cfg(Provider::OpenAI),
            "first\nsecond\nquit\n".as_bytes(),
            true,
            &mut out,
        )
        .await
        .expect("loop keeps running");

        let requests = transport.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].messages,
            vec![
                ChatMessage::system(HISTORY_PROMPT),
                ChatMessage::user("second"),
            ]
        );
        let text = transcript(out);
        assert!(text.contains("Error: "));
        assert!(text.contains("Hi again."));
        assert!(text.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn streaming_history_carries_previous_reply() {
        let transport = ScriptedAnthropic::new();
        transport.queue_stream(vec!["Hi ", "Ana"]);
        transport.queue_stream(vec!["Ana"]);
        let client = LlmClient::anthropic(transport.clone());
        let input = "I'm Ana\nWhat's my name?\n".as_bytes();
        let mut out = Vec::new();

        history(&client, &cfg(Provider::Anthropic), input, true, &mut out)
            .await
            .expect("demo");

        let requests = transport.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].system.as_deref(), Some(HISTORY_PROMPT));
        assert_eq!(
            requests[1].messages,
            vec![
                ChatMessage::user("I'm Ana"),
                ChatMessage::assistant("Hi Ana"),
                ChatMessage::user("What's my name?"),
            ]
        );
        assert_eq!(transport.close_count(), 2);
    }

    #[tokio::test]
    async fn tools_demo_executes_raw_openai_arguments() {
        let transport = ScriptedOpenAi::new();
        transport.queue_response(
            serde_json::from_value(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "lookup_weather", "arguments": "{\"city_name\":\"Bogota\"}"}
                    }]
                }}]
            }))
            .expect("response"),
        );
        let client = LlmClient::openai(transport.clone());
        let mut out = Vec::new();

        tools(&client, &cfg(Provider::OpenAI), true, &mut out)
            .await
            .expect("demo");

        let text = transcript(out);
        assert!(text.contains("Model chose to call: lookup_weather"));
        assert!(text.contains("Function result: Currently 18°C and partly cloudy"));
        let request = &transport.recorded_requests()[0];
        assert_eq!(request.tool_choice, Some(json!("auto")));
        assert_eq!(request.tools.len(), 1);
    }

    #[tokio::test]
    async fn tools_demo_runs_structured_anthropic_arguments() {
        let transport = ScriptedAnthropic::new();
        transport.queue_response(anthropic_blocks(vec![AnthropicContentBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: "lookup_weather".to_string(),
            input: json!({"city_name": "Bogota"}),
        }]));
        let client = LlmClient::anthropic(transport.clone());
        let mut out = Vec::new();

        tools(&client, &cfg(Provider::Anthropic), true, &mut out)
            .await
            .expect("demo");

        let text = transcript(out);
        assert!(text.contains("Arguments: {\"city_name\":\"Bogota\"}"));
        assert!(text.contains("Function result: Currently 18°C and partly cloudy"));
        let request = &transport.recorded_requests()[0];
        assert_eq!(request.tools[0].name, "lookup_weather");
        assert!(!request.extra.contains_key("tool_choice"));
    }

    #[tokio::test]
    async fn tools_demo_prints_text_when_no_tool_is_called() {
        let transport = ScriptedAnthropic::new();
        transport.queue_response(anthropic_blocks(vec![AnthropicContentBlock::Text {
            text: "I can't check the weather.".to_string(),
        }]));
        let client = LlmClient::anthropic(transport);
        let mut out = Vec::new();

        tools(&client, &cfg(Provider::Anthropic), false, &mut out)
            .await
            .expect("demo");

        let text = transcript(out);
        assert!(text.contains("Model responded with text instead of calling a function:"));
        assert!(text.contains("I can't check the weather."));
    }
}
