//! Prompt templates for Kurs.

use super::PromptSettings;
use std::collections::HashMap;

/// Default system prompt for the course assistant.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant for questions about educational course materials.

You have two tools:
- 'search_course_content' finds relevant passages across all indexed courses. Course names may be partial; lesson numbers narrow the search.
- 'get_course_outline' returns a course's title, link, instructor and full lesson list.

Guidelines:
- Use 'get_course_outline' for questions about course structure (what lessons exist, what a course covers overall)
- Use 'search_course_content' for questions about specific content
- Answer general knowledge questions directly without tools
- Base content answers on the retrieved material; if nothing relevant is found, say so clearly
- Be concise. Do not mention the search process or the tools in your answer"#;

/// Assistant prompt configuration.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// System instruction for the query loop.
    pub system: String,
    /// Custom variables substituted as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Build prompts from configuration, falling back to defaults.
    pub fn from_settings(settings: &PromptSettings) -> Self {
        Self {
            system: settings
                .system
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            variables: settings.variables.clone(),
        }
    }

    /// The system prompt with {{variables}} substituted.
    pub fn rendered_system(&self) -> String {
        let mut rendered = self.system.clone();
        for (name, value) in &self.variables {
            rendered = rendered.replace(&format!("{{{{{}}}}}", name), value);
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_mentions_tools() {
        let prompts = Prompts::default();
        assert!(prompts.system.contains("search_course_content"));
        assert!(prompts.system.contains("get_course_outline"));
    }

    #[test]
    fn test_variable_rendering() {
        let mut settings = PromptSettings::default();
        settings.system = Some("Teach like {{teacher}}.".to_string());
        settings
            .variables
            .insert("teacher".to_string(), "Feynman".to_string());

        let prompts = Prompts::from_settings(&settings);
        assert_eq!(prompts.rendered_system(), "Teach like Feynman.");
    }

    #[test]
    fn test_unknown_variables_left_in_place() {
        let prompts = Prompts {
            system: "Hello {{missing}}".to_string(),
            variables: HashMap::new(),
        };
        assert_eq!(prompts.rendered_system(), "Hello {{missing}}");
    }
}
