//! Offline generators.
//!
//! [`MockGenerator`] answers the prompt templates in [`crate::prompts`]
//! deterministically, echoing the listed elements back, so the whole pipeline
//! runs without a network. [`ScriptedGenerator`] replays canned replies and
//! records prompts; tests use it to inject failures.

use crate::prompts::{
    ANSWER_PROMPT_HEADER, COMBINATION_PROMPT_HEADER, DOCUMENT_PROMPT_HEADER,
};
use crate::{LlmError, TextGenerator};
use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

/// Leading integer after `prefix`, e.g. `Generate 5 ...` -> 5.
fn count_after(prompt: &str, prefix: &str) -> Option<usize> {
    let rest = prompt.strip_prefix(prefix)?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// `- item` lines of a listing prompt.
fn listed_items(prompt: &str) -> Vec<&str> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("- "))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

fn mock_questions(prompt: &str) -> Option<String> {
    let n = count_after(prompt, "Generate ")?;
    if !prompt.contains("natural questions using") {
        return None;
    }
    let items = listed_items(prompt);
    let lines: Vec<String> = (0..n)
        .map(|i| match items.get(i % items.len().max(1)) {
            Some(item) if i < items.len() => format!("Question: What should I know about {item}?"),
            Some(item) => format!("Question: What else should I know about {item} (#{})?", i + 1),
            None => format!("Question: What is a good follow-up question (#{})?", i + 1),
        })
        .collect();
    Some(format!("Here are some questions:\n{}", lines.join("\n")))
}

fn mock_combination(prompt: &str) -> String {
    let pairs: Vec<(&str, &str)> = listed_items(prompt)
        .into_iter()
        .filter_map(|item| item.split_once(" / "))
        .collect();
    match pairs.as_slice() {
        [] => "I could not find enough related elements to write a question.".to_string(),
        [(a, b), rest @ ..] => {
            let mut question = format!("How are {a} and {b} related");
            if let Some((c, d)) = rest.first() {
                question.push_str(&format!(", and what about {c} and {d}"));
            }
            format!(
                "Question: {question}?\nAnswer: {a} and {b} often appear together in the same queries."
            )
        }
    }
}

fn mock_document_pairs(prompt: &str) -> String {
    let n = count_after(prompt, DOCUMENT_PROMPT_HEADER).unwrap_or(1);
    let text = prompt
        .split_once("TEXT:\n")
        .and_then(|(_, rest)| rest.split_once("\n\nGenerate questions that:"))
        .map(|(text, _)| text.trim())
        .unwrap_or_default();
    let first_sentence = text
        .split_inclusive(&['.', '!', '?'][..])
        .next()
        .unwrap_or(text)
        .trim();
    let topic: String = text.split_whitespace().take(4).collect::<Vec<_>>().join(" ");

    let pairs: Vec<serde_json::Value> = (1..=n)
        .map(|i| {
            json!({
                "question": format!("What does the text say about \"{topic}\" (#{i})?"),
                "answer": first_sentence,
            })
        })
        .collect();
    format!(
        "Here are the pairs:\n{}",
        serde_json::to_string_pretty(&pairs).unwrap_or_else(|_| "[]".to_string())
    )
}

impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Some(question) = prompt.strip_prefix(ANSWER_PROMPT_HEADER) {
            return Ok(format!("Mock answer: {}", question.trim()));
        }
        if prompt.starts_with(COMBINATION_PROMPT_HEADER) {
            return Ok(mock_combination(prompt));
        }
        if prompt.starts_with(DOCUMENT_PROMPT_HEADER) {
            return Ok(mock_document_pairs(prompt));
        }
        if let Some(questions) = mock_questions(prompt) {
            return Ok(questions);
        }
        Ok(format!("Mock response ({} chars).", prompt.chars().count()))
    }
}

// ============================================================================
// Scripted replies
// ============================================================================

/// Replays queued replies in order and records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: RefCell<VecDeque<Result<String, String>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.borrow_mut().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.replies.borrow_mut().push_back(Err(message.into()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Reported(message)),
            None => Err(LlmError::InvalidResponse(
                "scripted generator has no replies left".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_json_array, parse_question_answer, parse_questions, QaPair};
    use crate::prompts::{answer_prompt, combination_prompt, document_qa_prompt, question_prompt};
    use seedgraph_graph::{Element, ElementSet, ElementType, SampledCombination};
    use std::collections::BTreeMap;

    #[test]
    fn mock_questions_follow_requested_count() {
        let elements = ElementSet::new()
            .with("entities", [Element::labeled("Seattle", "GPE")])
            .with("concepts", ["attractions"]);
        let reply = MockGenerator.generate(&question_prompt(&elements, 3)).unwrap();
        let questions = parse_questions(&reply);

        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "What should I know about Seattle (GPE)?");
        assert_eq!(questions[1], "What should I know about attractions?");
        assert!(questions[2].contains("Seattle"));
    }

    #[test]
    fn mock_questions_without_elements() {
        let reply = MockGenerator
            .generate(&question_prompt(&ElementSet::with_builtin_types(), 2))
            .unwrap();
        assert_eq!(parse_questions(&reply).len(), 2);
    }

    #[test]
    fn mock_combination_round_trips_through_parser() {
        let combination = SampledCombination {
            pairs: BTreeMap::from([(
                ElementType::Concepts,
                vec![("food".to_string(), "vegan".to_string())],
            )]),
        };
        let reply = MockGenerator.generate(&combination_prompt(&combination)).unwrap();
        let pair = parse_question_answer(&reply);
        assert_eq!(pair.question, "How are food and vegan related?");
        assert!(!pair.is_incomplete());

        let empty = MockGenerator
            .generate(&combination_prompt(&SampledCombination::default()))
            .unwrap();
        assert!(parse_question_answer(&empty).is_incomplete());
    }

    #[test]
    fn mock_answers_and_documents() {
        assert_eq!(
            MockGenerator.generate(&answer_prompt("Is it sunny?")).unwrap(),
            "Mock answer: Is it sunny?"
        );

        let reply = MockGenerator
            .generate(&document_qa_prompt("Rust has no garbage collector. It is fast.", 2))
            .unwrap();
        let pairs: Vec<QaPair> = parse_json_array(&reply).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].answer, "Rust has no garbage collector.");
    }

    #[test]
    fn scripted_generator_replays_and_records() {
        let generator = ScriptedGenerator::new().reply("one").fail("quota exceeded");
        assert_eq!(generator.generate("p1").unwrap(), "one");
        assert!(matches!(generator.generate("p2"), Err(LlmError::Reported(m)) if m == "quota exceeded"));
        assert!(generator.generate("p3").is_err());
        assert_eq!(generator.prompts(), vec!["p1", "p2", "p3"]);
        assert_eq!(generator.remaining(), 0);
    }
}
