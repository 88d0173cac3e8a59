//! Keyword routing rules.
//!
//! An ordered table of categories, each with a keyword set, evaluated once
//! per task against the lowercased text. The first matching category wins.

/// Handler category produced by keyword classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Web,
    Voice,
    Code,
}

impl Category {
    /// Registry key the category resolves to.
    pub const fn handler_key(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Voice => "voice",
            Self::Code => "code",
        }
    }
}

/// One routing rule.
///
/// `keywords` match as plain substrings. A `guarded` entry `(keyword, veto)`
/// matches only when `keyword` is present and `veto` is not.
#[derive(Debug)]
pub struct RoutingRule {
    pub category: Category,
    pub keywords: &'static [&'static str],
    pub guarded: &'static [(&'static str, &'static str)],
}

impl RoutingRule {
    fn matches(&self, task: &str) -> bool {
        self.keywords.iter().any(|kw| task.contains(kw))
            || self
                .guarded
                .iter()
                .any(|(kw, veto)| task.contains(kw) && !task.contains(veto))
    }
}

/// Routing table, in evaluation order.
pub const ROUTING_RULES: &[RoutingRule] = &[
    RoutingRule {
        category: Category::Web,
        keywords: &["flight", "book", "scrape", "browse", "web"],
        guarded: &[],
    },
    RoutingRule {
        category: Category::Voice,
        keywords: &[
            "speak",
            "transcribe",
            "tts",
            "stt",
            "text to speech",
            "speech to text",
        ],
        // "voice" alone is ambiguous next to "code"; code wins
        guarded: &[("voice", "code")],
    },
    RoutingRule {
        category: Category::Code,
        keywords: &["code", "run", "execute", "debug", "docker", "container"],
        guarded: &[],
    },
];

/// Classify a task by keyword against [`ROUTING_RULES`].
pub fn classify(task: &str) -> Option<Category> {
    classify_with(ROUTING_RULES, task)
}

/// Classify against an arbitrary rule table.
pub fn classify_with(rules: &[RoutingRule], task: &str) -> Option<Category> {
    let task = task.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&task))
        .map(|rule| rule.category)
}
