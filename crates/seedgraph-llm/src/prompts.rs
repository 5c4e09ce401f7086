//! Prompt templates. All templates are deterministic in their inputs.

use seedgraph_graph::{ElementSet, SampledCombination};
use std::fmt::Write as _;

pub const QUESTION_PREFIX: &str = "Question: ";
pub const ANSWER_PREFIX: &str = "Answer: ";

pub(crate) const ANSWER_PROMPT_HEADER: &str =
    "Please provide a detailed and accurate answer to this question:\n";
pub(crate) const COMBINATION_PROMPT_HEADER: &str =
    "Generate one natural question and its answer using some or all of these related elements:\n\n";
pub(crate) const DOCUMENT_PROMPT_HEADER: &str = "Based on the following text, generate ";

/// Prompt for `n` questions around one seed query's elements.
pub fn question_prompt(elements: &ElementSet, num_questions: usize) -> String {
    let mut prompt =
        format!("Generate {num_questions} natural questions using some or all of these elements:\n\n");
    for (element_type, items) in elements.groups() {
        let _ = writeln!(prompt, "{element_type}:");
        for item in items {
            let _ = writeln!(prompt, "- {item}");
        }
        prompt.push('\n');
    }
    prompt.push_str(
        "\nFormat each question on a new line starting with 'Question: '\n\
         Make sure the questions are natural and diverse.",
    );
    prompt
}

/// Prompt for one question/answer pair built from sampled related pairs.
/// Types with no sampled pairs are left out.
pub fn combination_prompt(combination: &SampledCombination) -> String {
    let mut prompt = COMBINATION_PROMPT_HEADER.to_string();
    for (element_type, pairs) in &combination.pairs {
        if pairs.is_empty() {
            continue;
        }
        let _ = writeln!(prompt, "{element_type}:");
        for (a, b) in pairs {
            let _ = writeln!(prompt, "- {a} / {b}");
        }
        prompt.push('\n');
    }
    prompt.push_str(
        "\nEach line lists two elements that appear together in real user queries.\n\
         Format your response as:\n\
         Question: <the question>\n\
         Answer: <the answer>",
    );
    prompt
}

pub fn answer_prompt(question: &str) -> String {
    format!("{ANSWER_PROMPT_HEADER}{question}")
}

/// Prompt asking for a JSON array of `{question, answer}` objects grounded in
/// one document chunk.
pub fn document_qa_prompt(chunk: &str, num_questions: usize) -> String {
    format!(
        "{DOCUMENT_PROMPT_HEADER}{num_questions} diverse and natural question-answer pairs.\n\
         \n\
         TEXT:\n\
         {chunk}\n\
         \n\
         Generate questions that:\n\
         1. Have answers fully supported by the text\n\
         2. Vary in difficulty and complexity\n\
         3. Cover different aspects of the content\n\
         \n\
         For each pair, the answer should be accurate and concise.\n\
         \n\
         Format your response as a JSON array with objects containing \"question\" and \"answer\" fields."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedgraph_graph::{Element, ElementType};
    use std::collections::BTreeMap;

    #[test]
    fn question_prompt_layout() {
        let elements = ElementSet::new()
            .with("entities", [Element::labeled("Seattle", "GPE")])
            .with("noun_phrases", ["popular attractions"])
            .with("verbs", Vec::<Element>::new());

        let prompt = question_prompt(&elements, 3);
        let expected = "Generate 3 natural questions using some or all of these elements:\n\n\
                        entities:\n- Seattle (GPE)\n\n\
                        noun_phrases:\n- popular attractions\n\n\
                        verbs:\n\n\
                        \nFormat each question on a new line starting with 'Question: '\n\
                        Make sure the questions are natural and diverse.";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn combination_prompt_skips_empty_types() {
        let combination = SampledCombination {
            pairs: BTreeMap::from([
                (
                    ElementType::Entities,
                    vec![("Seattle".to_string(), "Space Needle".to_string())],
                ),
                (ElementType::Verbs, vec![]),
            ]),
        };
        let prompt = combination_prompt(&combination);
        assert!(prompt.starts_with(COMBINATION_PROMPT_HEADER));
        assert!(prompt.contains("entities:\n- Seattle / Space Needle\n"));
        assert!(!prompt.contains("verbs:"));
        assert!(prompt.ends_with("Answer: <the answer>"));
    }

    #[test]
    fn answer_and_document_prompts() {
        assert_eq!(
            answer_prompt("Why?"),
            "Please provide a detailed and accurate answer to this question:\nWhy?"
        );
        let prompt = document_qa_prompt("Rust is a language.", 4);
        assert!(prompt.starts_with("Based on the following text, generate 4 diverse"));
        assert!(prompt.contains("TEXT:\nRust is a language.\n"));
        assert!(prompt.contains("JSON array"));
    }
}
