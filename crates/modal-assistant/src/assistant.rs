use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arithmetic::{is_prime, prime_factors, world_size};
use crate::knowledge::{self, COMMON_QUESTIONS, CONCEPTS};

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid regex: digit run"));

const CONCEPT_KEYWORDS: &[&str] = &["what is", "explain", "define", "meaning", "concept"];
const CALC_HELP_KEYWORDS: &[&str] = &["how to calculate", "calculate", "formula", "steps", "method"];
const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey", "help", "assist"];
const CALC_REQUEST_KEYWORDS: &[&str] = &["calculate", "compute", "solve"];

/// Which handler a query is routed to. Tested in this order; the first hit
/// wins, so "calculate 12" is calculation help, not a calculation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Conceptual,
    CalculationHelp,
    Greeting,
    CalculationRequest,
    General,
}

pub fn classify(query: &str) -> QueryKind {
    let has = |keywords: &[&str]| keywords.iter().any(|k| query.contains(k));

    if has(CONCEPT_KEYWORDS) {
        QueryKind::Conceptual
    } else if has(CALC_HELP_KEYWORDS) {
        QueryKind::CalculationHelp
    } else if has(GREETING_KEYWORDS) {
        QueryKind::Greeting
    } else if DIGITS.is_match(query) || has(CALC_REQUEST_KEYWORDS) {
        QueryKind::CalculationRequest
    } else {
        QueryKind::General
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantResponse {
    Concept {
        concept: &'static str,
        definition: &'static str,
        explanation: &'static str,
        examples: Vec<&'static str>,
        confidence: f32,
    },
    Faq {
        question: &'static str,
        answer: &'static str,
        confidence: f32,
    },
    Unknown {
        message: &'static str,
        suggestions: Vec<&'static str>,
    },
    CalculationHelp {
        calculation: &'static str,
        explanation: &'static str,
        steps: Vec<&'static str>,
        example: &'static str,
        confidence: f32,
    },
    GeneralCalcHelp {
        message: &'static str,
        suggestions: Vec<&'static str>,
    },
    Greeting {
        message: &'static str,
        suggestions: Vec<&'static str>,
    },
    CalculationRequest {
        message: &'static str,
        suggestions: Vec<&'static str>,
    },
    CalculationExplanation {
        number: u64,
        is_prime: bool,
        world_size: f64,
        prime_factors: Vec<u64>,
        explanation: String,
        philosophical_context: &'static str,
        suggestions: Vec<String>,
    },
    General {
        message: &'static str,
        suggestions: Vec<&'static str>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub timestamp: String,
    #[serde(default)]
    pub context: serde_json::Value,
}

/// Keyword-matching helper over the static knowledge base. Keeps every query
/// it has seen; the history has no bound.
#[derive(Debug, Default)]
pub struct Assistant {
    history: Vec<HistoryEntry>,
}

impl Assistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_query(&mut self, query: &str, context: serde_json::Value) -> AssistantResponse {
        self.record(query, context);
        answer(query)
    }

    /// Add `query` to the history without answering it.
    pub fn record(&mut self, query: &str, context: serde_json::Value) {
        self.history.push(HistoryEntry {
            query: query.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            context,
        });
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Answer a query from the knowledge base alone. Needs no history, so it can
/// run away from whatever holds the [`Assistant`].
pub fn answer(query: &str) -> AssistantResponse {
    let normalized = query.trim().to_lowercase();
    let kind = classify(&normalized);
    debug!(?kind, "assistant query classified");

    match kind {
        QueryKind::Conceptual => conceptual_answer(&normalized),
        QueryKind::CalculationHelp => calculation_help(&normalized),
        QueryKind::Greeting => greeting(),
        QueryKind::CalculationRequest => calculation_request(&normalized),
        QueryKind::General => general(),
    }
}

/// Prompts to offer on a given page of the web app.
pub fn contextual_suggestions(page: Option<&str>) -> Vec<&'static str> {
    match page {
        Some("calculator") => vec![
            "How do I interpret the results?",
            "What does world size mean?",
            "Explain the philosophical significance",
        ],
        Some("quiz") => vec![
            "What is modal realism?",
            "Explain possible worlds",
            "What is perdurantism?",
        ],
        _ => vec![
            "What can you help me with?",
            "Explain modal realism",
            "How do the calculators work?",
        ],
    }
}

fn first_word(query: &str) -> &str {
    query.split(' ').next().unwrap_or_default()
}

fn conceptual_answer(query: &str) -> AssistantResponse {
    let lead = first_word(query);

    if let Some(concept) = CONCEPTS
        .iter()
        .find(|c| query.contains(c.name) || c.name.contains(lead))
    {
        return AssistantResponse::Concept {
            concept: concept.name,
            definition: concept.definition,
            explanation: concept.explanation,
            examples: concept.examples.to_vec(),
            confidence: 0.9,
        };
    }

    if let Some(faq) = COMMON_QUESTIONS
        .iter()
        .find(|q| query.contains(first_word(q.question)) || q.question.contains(lead))
    {
        return AssistantResponse::Faq {
            question: faq.question,
            answer: faq.answer,
            confidence: 0.8,
        };
    }

    AssistantResponse::Unknown {
        message: "I'm not sure I understand that question. Could you rephrase it or ask about modal realism, possible worlds, or calculations?",
        suggestions: vec![
            "What is modal realism?",
            "How do you calculate world size?",
            "Explain possible worlds",
            "What is the difference between prime and composite worlds?",
        ],
    }
}

fn identify_calculation(query: &str) -> Option<&'static str> {
    if query.contains("prime") || query.contains("factor") {
        Some("prime factorization")
    } else if query.contains("world size") || query.contains("size") {
        Some("world size calculation")
    } else if query.contains("probability") || query.contains("prob") {
        Some("probability calculation")
    } else {
        None
    }
}

fn calculation_help(query: &str) -> AssistantResponse {
    match identify_calculation(query).and_then(knowledge::calculation) {
        Some(calc) => AssistantResponse::CalculationHelp {
            calculation: calc.name,
            explanation: calc.explanation,
            steps: calc.steps.to_vec(),
            example: calc.example,
            confidence: 0.9,
        },
        None => AssistantResponse::GeneralCalcHelp {
            message: "I can help with various calculations related to modal realism:",
            suggestions: vec![
                "How to calculate world size",
                "How to find prime factors",
                "How to calculate probability",
                "How to perform world operations",
            ],
        },
    }
}

fn greeting() -> AssistantResponse {
    AssistantResponse::Greeting {
        message: "Hello! I'm your AI assistant for the Modal Realism Calculator Suite. I can help you understand modal realism concepts, explain calculations, and provide guidance on using the calculators.",
        suggestions: vec![
            "What is modal realism?",
            "How do I calculate world size?",
            "Explain possible worlds",
            "Help me with a calculation",
        ],
    }
}

fn calculation_request(query: &str) -> AssistantResponse {
    let number = DIGITS
        .find(query)
        .and_then(|m| m.as_str().parse::<u64>().ok());

    match number {
        Some(n) => explain_world(n),
        None => AssistantResponse::CalculationRequest {
            message: "I'd be happy to help with calculations! Please provide a specific number or calculation you'd like me to explain.",
            suggestions: vec![
                "Calculate world 12",
                "Explain prime factorization of 24",
                "What is the size of world 7?",
            ],
        },
    }
}

/// Full breakdown of world `n`: size, primality, factors and prose.
pub fn explain_world(number: u64) -> AssistantResponse {
    let prime = is_prime(number);
    let size = world_size(number);
    let factors = prime_factors(number);

    AssistantResponse::CalculationExplanation {
        number,
        is_prime: prime,
        world_size: size,
        explanation: detailed_explanation(number, prime, size, &factors),
        philosophical_context: philosophical_context(prime),
        suggestions: world_suggestions(prime, &factors),
        prime_factors: factors,
    }
}

fn join_factors(factors: &[u64]) -> String {
    factors
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn detailed_explanation(number: u64, prime: bool, size: f64, factors: &[u64]) -> String {
    let mut explanation = format!("Let me explain the calculation for world {}:\n\n", number);

    explanation.push_str(&format!("**World Size**: {:.6}\n", size));
    explanation.push_str(&format!("**Probability**: {:.6}\n", size));
    explanation.push_str(&format!(
        "**Type**: {}\n\n",
        if prime { "Fundamental World" } else { "Composite World" }
    ));

    if prime {
        explanation.push_str(&format!(
            "This is a fundamental possible world because {} is a prime number. ",
            number
        ));
        explanation.push_str("It cannot be broken down into smaller components and represents a basic unit of modal space.\n\n");
    } else {
        explanation.push_str(&format!(
            "This is a composite world formed from fundamental worlds: [{}]. ",
            join_factors(factors)
        ));
        explanation.push_str("It represents a combination of simpler possible worlds in the modal dimension.\n\n");
    }

    explanation.push_str(&format!(
        "**Mathematical Relationship**: The size 1/{} creates an inverse relationship where ",
        number
    ));
    explanation.push_str("smaller numbers correspond to larger worlds in the modal dimension.");
    explanation
}

fn philosophical_context(prime: bool) -> &'static str {
    if prime {
        "In Yagisawa's extended modal realism, prime numbers represent fundamental possible worlds - \
         the basic building blocks of modal space. These worlds are irreducible and represent \
         the simplest ways things could have been."
    } else {
        "Composite worlds in extended modal realism represent combinations of fundamental worlds. \
         They show how different possibilities can combine to create more complex scenarios \
         in the modal dimension."
    }
}

fn world_suggestions(prime: bool, factors: &[u64]) -> Vec<String> {
    let mut suggestions = if prime {
        vec![
            "Explore other prime worlds (2, 3, 5, 7, 11...)".to_string(),
            "Compare with composite worlds".to_string(),
        ]
    } else {
        vec![
            format!("Break down into prime factors: [{}]", join_factors(factors)),
            "Compare with fundamental worlds".to_string(),
        ]
    };
    suggestions.push("Try world operations (addition, multiplication)".to_string());
    suggestions.push("Explore range analysis".to_string());
    suggestions
}

fn general() -> AssistantResponse {
    AssistantResponse::General {
        message: "I'm not sure how to help with that specific question. Here are some things I can assist with:",
        suggestions: vec![
            "Modal realism concepts and definitions",
            "Calculation explanations and step-by-step guides",
            "Philosophical context and background",
            "Help with using the calculators",
        ],
    }
}
