//! Prompt templates for Referat.
//!
//! The instructions pin the backend to the Telegram HTML tag subset; whatever
//! it produces anyway is repaired by the markup sanitizer afterwards.

use std::collections::HashMap;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub answer: AnswerPrompts,
}

/// Prompts for video summarization.
#[derive(Debug, Clone)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: "You are an assistant that writes a concise summary of a video based on \
                     its subtitles, in {{language}}. \
                     Use only the following HTML tags for formatting (and always close them): \
                     <b>bold</b>, <i>italic</i>, <strong>important</strong>, <em>emphasized</em>. \
                     Do NOT use any other HTML tags or special formats."
                .to_string(),
            user: "Write a concise summary of this video based on its subtitles. \
                   Use HTML tags to highlight the important parts:\n\n{{transcript}}"
                .to_string(),
        }
    }
}

/// Prompts for transcript-grounded question answering.
#[derive(Debug, Clone)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: "You are an assistant that answers questions about the content of a video \
                     based on its subtitles, in {{language}}. \
                     Answer using only the subtitles as context. \
                     Use only the following HTML tags for formatting (and always close them): \
                     <b>bold</b>, <i>italic</i>, <strong>important</strong>, <em>emphasized</em>. \
                     Do NOT use any other HTML tags or special formats."
                .to_string(),
            user: "Context (video subtitles):\n{{transcript}}\n\nQuestion: {{question}}"
                .to_string(),
        }
    }
}

impl Prompts {
    /// Render a prompt template, substituting `{{key}}` placeholders.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summary.system.contains("<b>"));
        assert!(prompts.answer.user.contains("{{question}}"));
    }

    #[test]
    fn test_render_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "why?".to_string());
        vars.insert("transcript".to_string(), "because".to_string());

        let result = Prompts::render("Q: {{question}} T: {{transcript}}", &vars);
        assert_eq!(result, "Q: why? T: because");
    }
}
