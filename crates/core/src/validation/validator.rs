use super::report::ValidationReport;
use super::rules::{builtin_rules, ValidationRule};
use crate::model::Document;

pub type RulePredicate = Box<dyn Fn(&Document) -> bool + Send + Sync>;

/// Caller-supplied rule: the message is reported when the predicate returns `false`.
pub struct CustomRule {
    name: String,
    message: String,
    predicate: RulePredicate,
}

impl CustomRule {
    pub fn new(name: impl Into<String>, message: impl Into<String>, predicate: RulePredicate) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            predicate,
        }
    }
}

impl ValidationRule for CustomRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, doc: &Document) -> Vec<String> {
        if (self.predicate)(doc) {
            Vec::new()
        } else {
            vec![format!("{}: {}", self.name, self.message)]
        }
    }
}

/// Runs the built-in rules followed by custom rules in registration order.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    pub fn with_rule<F>(mut self, name: impl Into<String>, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        self.rules
            .push(Box::new(CustomRule::new(name, message, Box::new(predicate))));
        self
    }

    pub fn with_custom(mut self, rule: Box<dyn ValidationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, doc: &Document) -> ValidationReport {
        let errors: Vec<String> = self.rules.iter().flat_map(|r| r.check(doc)).collect();
        if !errors.is_empty() {
            log::debug!("validation found {} error(s)", errors.len());
        }
        ValidationReport::new(errors)
    }
}
