use serde::Serialize;

use crate::analysis::Analysis;
use crate::fallacy::Fallacy;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    VagueTerm {
        original: String,
        suggestions: Vec<&'static str>,
    },
    Fallacy {
        fallacy: Fallacy,
        correction: &'static str,
    },
}

/// Replacement phrases for a vague word. The first one is what the rewrite
/// substitutes.
pub fn specific_terms(vague_word: &str) -> &'static [&'static str] {
    match vague_word {
        "thing" => &["object", "item", "entity", "element"],
        "stuff" => &["materials", "substances", "items", "objects"],
        "something" => &["a specific item", "a particular object", "an entity"],
        "anything" => &["any object", "any item", "any entity"],
        "everything" => &["all objects", "all items", "all entities"],
        "somewhere" => &["a specific location", "a particular place"],
        "anywhere" => &["any location", "any place"],
        "somehow" => &["in some way", "by some means", "through some method"],
        _ => &["more specific term"],
    }
}

/// Vague-term suggestions first (in token order), then fallacy corrections.
pub fn generate(analysis: &Analysis) -> Vec<Suggestion> {
    let vague = analysis.vague_terms.iter().map(|v| Suggestion::VagueTerm {
        original: v.word.clone(),
        suggestions: specific_terms(&v.word).to_vec(),
    });
    let fallacies = analysis.fallacies.iter().map(|f| Suggestion::Fallacy {
        fallacy: *f,
        correction: f.correction(),
    });
    vague.chain(fallacies).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_words_get_the_generic_hint() {
        assert_eq!(specific_terms("widget"), &["more specific term"]);
        assert_eq!(specific_terms("thing")[0], "object");
    }

    #[test]
    fn vague_terms_come_before_fallacies() {
        let analysis = Analysis::of(vec!["obviously".into(), "stuff".into()]);
        let suggestions = generate(&analysis);
        assert_eq!(suggestions.len(), 2);
        assert!(matches!(
            &suggestions[0],
            Suggestion::VagueTerm { original, .. } if original == "stuff"
        ));
        assert_eq!(
            suggestions[1],
            Suggestion::Fallacy {
                fallacy: Fallacy::BeggingTheQuestion,
                correction: "Provide evidence or reasoning instead of assuming the conclusion",
            }
        );
    }
}
