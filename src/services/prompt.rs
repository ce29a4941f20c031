//! Prompt assembly for lab-report analysis.
//!
//! The instruction always goes first and is never shortened; only the
//! extracted report text is cut when the prompt would exceed its budget.

use tracing::warn;

/// Fixed clinician instruction sent ahead of every lab report.
pub const INSTRUCTION: &str = "Ты опытный врач. Расшифруй медицинский анализ: \
выдели показатели, отклоняющиеся от нормы, дай краткий вывод и рекомендации.";

/// Appended after the report text when it was cut to fit the budget.
pub const TRUNCATION_MARKER: &str = "\n\n[Текст анализа обрезан из-за ограничения длины]";

pub const PROMPT_SEPARATOR: &str = "\n\n";

/// Characters consumed by the instruction and separator before any report text.
pub fn instruction_overhead() -> usize {
    INSTRUCTION.chars().count() + PROMPT_SEPARATOR.chars().count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub instruction: Option<&'static str>,
    pub text: String,
    pub truncated: bool,
}

impl PromptPayload {
    /// Instruction + report text, capped at `max_chars` characters (marker excluded).
    pub fn assemble(extracted_text: &str, max_chars: usize) -> Self {
        let budget = max_chars.saturating_sub(instruction_overhead());
        let total = extracted_text.chars().count();

        if total <= budget {
            return Self {
                instruction: Some(INSTRUCTION),
                text: extracted_text.to_string(),
                truncated: false,
            };
        }

        warn!(
            text_chars = total,
            kept_chars = budget,
            max_prompt_chars = max_chars,
            "Extracted text exceeds prompt budget, truncating"
        );

        let mut text: String = extracted_text.chars().take(budget).collect();
        text.push_str(TRUNCATION_MARKER);

        Self {
            instruction: Some(INSTRUCTION),
            text,
            truncated: true,
        }
    }

    /// Free-form text with no instruction, used by the provider diagnostic.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            instruction: None,
            text: text.into(),
            truncated: false,
        }
    }

    /// Single-message rendering for providers without a separate system role.
    pub fn render(&self) -> String {
        match self.instruction {
            Some(instruction) => format!("{}{}{}", instruction, PROMPT_SEPARATOR, self.text),
            None => self.text.clone(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.render().chars().count()
    }
}
