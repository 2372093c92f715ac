//! UseCase: AI-assisted task suggestion
//!
//! Asks the text generator for a JSON suggestion. Without a generator, or
//! when its answer is unusable, a keyword heuristic answers instead, so the
//! caller always gets a suggestion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{TextGenerator, TodoStatus};

use super::error::SuggestError;

const MAX_TITLE_CHARS: usize = 80;

const INSTRUCTIONS: &str = "You are an assistant that helps teams manage tasks. \
Given a natural language task description and optional team context, respond ONLY with a \
single JSON object with these keys:\n\
  \"titleSuggestion\": concise task title (max ~80 chars)\n\
  \"descriptionSuggestion\": multi-line markdown with concrete steps\n\
  \"recommendedStatus\": one of \"backlog\", \"in_progress\", \"done\", \"blocked\"\n\
  \"confidence\": number between 0 and 1\n\
  \"reasoning\": short explanation of why you chose this status\n\
Do not include any extra keys or text outside the JSON object.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSuggestion {
    pub title_suggestion: String,
    pub description_suggestion: String,
    pub recommended_status: TodoStatus,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedSuggestion {
    title_suggestion: Option<String>,
    description_suggestion: Option<String>,
    recommended_status: Option<TodoStatus>,
    confidence: Option<f64>,
    reasoning: Option<String>,
}

pub struct SuggestTaskUseCase {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl SuggestTaskUseCase {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn suggest(
        &self,
        prompt: &str,
        team_context: Option<&str>,
    ) -> Result<TaskSuggestion, SuggestError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SuggestError::Validation("prompt must not be empty".to_string()));
        }
        let team_context = team_context.map(str::trim).filter(|c| !c.is_empty());

        let Some(generator) = &self.generator else {
            return Ok(heuristic_suggestion(
                prompt,
                team_context,
                "Generated via local heuristic because no AI provider is configured.",
            ));
        };

        let request = format!(
            "{}\n\nTask description: \"{}\"\n{}",
            INSTRUCTIONS,
            prompt,
            match team_context {
                Some(context) => format!("Team context: \"{}\"", context),
                None => "Team context: (none provided)".to_string(),
            }
        );
        let generated = generator
            .generate(&request)
            .await
            .map_err(|e| e.to_string())
            .and_then(|text| parse_generated(&text));

        match generated {
            Ok(suggestion) => Ok(suggestion),
            Err(e) => {
                tracing::warn!("Falling back to heuristic task suggestion: {}", e);
                Ok(heuristic_suggestion(
                    prompt,
                    team_context,
                    "Fell back to a local heuristic because the AI provider response was invalid.",
                ))
            }
        }
    }
}

fn parse_generated(text: &str) -> Result<TaskSuggestion, String> {
    let parsed: GeneratedSuggestion =
        serde_json::from_str(text.trim()).map_err(|e| format!("not a JSON suggestion: {}", e))?;

    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    match (
        non_blank(parsed.title_suggestion),
        non_blank(parsed.description_suggestion),
        parsed.recommended_status,
        parsed.confidence.filter(|c| c.is_finite()),
        non_blank(parsed.reasoning),
    ) {
        (Some(title), Some(description), Some(status), Some(confidence), Some(reasoning)) => {
            Ok(TaskSuggestion {
                title_suggestion: truncate_chars(&title, MAX_TITLE_CHARS),
                description_suggestion: description,
                recommended_status: status,
                confidence: confidence.clamp(0.0, 1.0),
                reasoning,
            })
        }
        _ => Err("suggestion is missing required fields".to_string()),
    }
}

fn heuristic_suggestion(prompt: &str, team_context: Option<&str>, reasoning: &str) -> TaskSuggestion {
    let lower = prompt.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| lower.contains(word));

    let has_deadline = mentions(&["today", "tomorrow", "week", "deadline"]);
    let is_blocked = mentions(&["blocked", "stuck", "cannot", "can't"]);

    let recommended_status = if is_blocked {
        TodoStatus::Blocked
    } else if mentions(&["research", "start"]) {
        TodoStatus::InProgress
    } else {
        TodoStatus::Backlog
    };

    let mut steps = vec!["Key steps:".to_string()];
    if let Some(context) = team_context {
        steps.push(format!("• Coordinate with {}", context));
    }
    steps.push("• Break the work into 2–5 concrete subtasks".to_string());
    if has_deadline {
        steps.push("• Prioritize unblockers before the due date".to_string());
    }
    if is_blocked {
        steps.push("• Identify blockers and who can help resolve them".to_string());
    }

    TaskSuggestion {
        title_suggestion: truncate_chars(prompt, MAX_TITLE_CHARS),
        description_suggestion: steps.join("\n"),
        recommended_status,
        confidence: if is_blocked || has_deadline { 0.8 } else { 0.5 },
        reasoning: reasoning.to_string(),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
