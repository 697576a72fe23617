/// Keyword rule: when the user's message mentions any keyword, the generated
/// reply is replaced by `response`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyRule {
    pub keywords: Vec<String>,
    pub response: String,
}

impl SafetyRule {
    pub fn new(keywords: &[&str], response: impl Into<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            response: response.into(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered override table; the first matching rule wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyRules {
    rules: Vec<SafetyRule>,
}

pub const CRISIS_RESPONSE: &str = "If you're having thoughts of harming yourself, please know that you're not alone and there's help available. You can call or text 988 in the US and Canada to reach the Suicide & Crisis Lifeline. In the UK, you can call 111. These services are free, confidential, and available 24/7.";

pub const SUBSTANCE_RESPONSE: &str = "I can provide information about drug and alcohol addiction, treatment options, and support resources. For immediate help, you can call the SAMHSA National Helpline at 1-800-662-HELP (4357).";

pub const HELP_RESPONSE: &str = "I can help provide information on various topics related to mental health. Please let me know what you'd like assistance with.";

impl SafetyRules {
    pub fn new(rules: Vec<SafetyRule>) -> Self {
        Self { rules }
    }

    /// No overrides: generated replies pass through untouched
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    /// Reply to show for `input`, given the generated `reply`
    pub fn apply<'a>(&'a self, input: &str, reply: &'a str) -> &'a str {
        let lowered = input.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.response.as_str())
            .unwrap_or(reply)
    }
}

impl Default for SafetyRules {
    fn default() -> Self {
        Self::new(vec![
            SafetyRule::new(&["suicide", "kill myself", "want to die"], CRISIS_RESPONSE),
            SafetyRule::new(
                &["drugs", "alcohol", "addiction", "substance abuse"],
                SUBSTANCE_RESPONSE,
            ),
            SafetyRule::new(&["help"], HELP_RESPONSE),
        ])
    }
}
