//! Static FAQ knowledge base

use serde::{Deserialize, Serialize};
use tracing::debug;

/// `source_title` of the fallback answer
pub const NO_MATCH_TITLE: &str = "No Match Found";

struct FaqEntry {
    topic: &'static str,
    answer: &'static str,
    source_title: &'static str,
}

const FAQ_ENTRIES: &[FaqEntry] = &[
    FaqEntry {
        topic: "refund policy",
        answer: "Our refund policy allows returns within 30 days of purchase with original receipt.",
        source_title: "Returns and Refunds Policy",
    },
    FaqEntry {
        topic: "shipping",
        answer: "We offer free shipping on orders over $50. Standard shipping takes 5-7 business days.",
        source_title: "Shipping Information",
    },
    FaqEntry {
        topic: "business hours",
        answer: "Our customer support is available Monday-Friday, 9 AM - 5 PM EST.",
        source_title: "Contact Information",
    },
    FaqEntry {
        topic: "payment methods",
        answer: "We accept Visa, MasterCard, American Express, PayPal, and Apple Pay.",
        source_title: "Payment Options",
    },
    FaqEntry {
        topic: "warranty",
        answer: "All products come with a 1-year manufacturer warranty covering defects.",
        source_title: "Warranty Information",
    },
];

/// Structured FAQ result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqAnswer {
    pub answer: String,
    pub source_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl FaqAnswer {
    pub fn is_match(&self) -> bool {
        self.source_title != NO_MATCH_TITLE
    }
}

/// Topics in table order
pub fn topics() -> Vec<&'static str> {
    FAQ_ENTRIES.iter().map(|entry| entry.topic).collect()
}

/// First entry whose topic occurs in the query, or the query in the topic
pub fn lookup(query: &str) -> FaqAnswer {
    let needle = query.trim().to_lowercase();

    if !needle.is_empty() {
        let hit = FAQ_ENTRIES
            .iter()
            .find(|entry| needle.contains(entry.topic) || entry.topic.contains(needle.as_str()));
        if let Some(entry) = hit {
            return FaqAnswer {
                answer: entry.answer.to_string(),
                source_title: entry.source_title.to_string(),
                suggestion: None,
            };
        }
    }

    debug!("No FAQ entry for '{}'", needle);
    FaqAnswer {
        answer: format!("I couldn't find an answer to '{}' in our FAQ database.", query),
        source_title: NO_MATCH_TITLE.to_string(),
        suggestion: Some(format!("Try asking about: {}", topics().join(", "))),
    }
}

/// [`lookup`] rendered as pretty JSON, the form handed to the model
pub fn lookup_faq(query: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&lookup(query))
}
