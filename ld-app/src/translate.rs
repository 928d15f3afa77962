//! Document translation through whichever provider is configured.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use ld_llm::{ChatMessage, CompletionOptions, LlmClient, create_completion};
use std::io::Write;
use std::path::Path;

pub const DEFAULT_TARGET_LANGUAGE: &str = "Spanish";

const TRANSLATION_TEMPERATURE: f32 = 0.3;

fn translator_prompt(target: &str) -> String {
    format!(
        "You are a professional translator specializing in academic and policy documents. \
         Translate the following document from English to {target}. \
         Maintain the markdown formatting exactly as it appears. \
         Use formal, professional {target} appropriate for policy and research documents. \
         Preserve all technical terms and proper nouns appropriately."
    )
}

pub async fn translate_text(
    client: &LlmClient,
    cfg: &AppConfig,
    text: &str,
    target: &str,
) -> Result<String> {
    let messages = [
        ChatMessage::system(translator_prompt(target)),
        ChatMessage::user(format!("Translate this document to {target}:\n\n{text}")),
    ];
    let options = CompletionOptions::new().temperature(TRANSLATION_TEMPERATURE);
    Ok(create_completion(client, cfg.provider, &cfg.model, &messages, &options).await?)
}

/// Translate the file at `input`.
///
/// The result goes to `output` when given (parent directories are created),
/// otherwise it is written to `out`.
pub async fn translate_document<W: Write>(
    client: &LlmClient,
    cfg: &AppConfig,
    input: &Path,
    output: Option<&Path>,
    target: &str,
    out: &mut W,
) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    tracing::info!(
        input = %input.display(),
        chars = text.chars().count(),
        %target,
        "translating document"
    );

    let translated = translate_text(client, cfg, &text, target).await?;

    let Some(output) = output else {
        writeln!(out, "{translated}")?;
        return Ok(());
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(output, &translated)
        .with_context(|| format!("writing {}", output.display()))?;
    writeln!(
        out,
        "{target} version saved to: {} ({} characters)",
        output.display(),
        translated.chars().count()
    )?;
    Ok(())
}
