use std::collections::HashMap;

/// Key of the tag shown on stacks labelled with their type's display name.
pub const STACK_DISPLAY: &str = "entity-stack-display";

/// Key of the tag shown on stacks labelled with the head's custom name.
pub const STACK_DISPLAY_CUSTOM_NAME: &str = "entity-stack-display-custom-name";

/// Message lookup with `%placeholder%` substitution.
pub trait MessageSource: Send + Sync {
    fn message(&self, key: &str, placeholders: &[(&str, &str)]) -> String;
}

/// In-memory message templates.
#[derive(Clone, Debug)]
pub struct TemplateMessages {
    templates: HashMap<String, String>,
}

impl TemplateMessages {
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }
}

impl Default for TemplateMessages {
    fn default() -> Self {
        Self::new(HashMap::new())
            .with_template(STACK_DISPLAY, "%amount%x %name%")
            .with_template(STACK_DISPLAY_CUSTOM_NAME, "%amount%x %name%")
    }
}

impl MessageSource for TemplateMessages {
    fn message(&self, key: &str, placeholders: &[(&str, &str)]) -> String {
        let Some(template) = self.templates.get(key) else {
            return format!("Missing message in locale file: {key}");
        };

        placeholders
            .iter()
            .fold(template.clone(), |message, (name, value)| {
                message.replace(&format!("%{name}%"), value)
            })
    }
}

/// Formats a stack amount with thousands separators.
pub fn format_amount(amount: usize) -> String {
    let digits = amount.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders() {
        let messages = TemplateMessages::default();
        let text = messages.message(STACK_DISPLAY, &[("amount", "12"), ("name", "Zombie")]);
        assert_eq!(text, "12x Zombie");
    }

    #[test]
    fn missing_key_reports_itself() {
        let messages = TemplateMessages::new(HashMap::new());
        assert_eq!(
            messages.message("nope", &[]),
            "Missing message in locale file: nope"
        );
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_amount(7), "7");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1000), "1,000");
        assert_eq!(format_amount(1234567), "1,234,567");
    }
}
