//! Operator questions.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{PipelineError, Result};

#[async_trait]
pub trait Prompt: Send + Sync {
    async fn confirm(&self, question: &str, default: bool) -> Result<bool>;
    async fn input(&self, question: &str, default: &str) -> Result<String>;
}

/// Reads answers from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    async fn ask(question: String) -> Result<String> {
        tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            write!(stdout, "{question}")?;
            stdout.flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok::<_, std::io::Error>(line.trim().to_string())
        })
        .await
        .map_err(|e| PipelineError::Prompt(e.to_string()))?
        .map_err(|e| PipelineError::Prompt(e.to_string()))
    }
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let answer = Self::ask(format!("? {question} {hint} ")).await?;
        Ok(parse_yes_no(&answer).unwrap_or(default))
    }

    async fn input(&self, question: &str, default: &str) -> Result<String> {
        let answer = Self::ask(format!("? {question} ({default}) ")).await?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }
}

/// `y`/`yes` and `n`/`no`, any case. Anything else is `None`.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Answers queued up front. An empty answer, or running out of answers,
/// takes the default. Asked questions are recorded.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
    confirm_all: bool,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
            confirm_all: false,
        }
    }

    /// Answer every confirmation with `yes`.
    pub fn always_yes() -> Self {
        Self {
            confirm_all: true,
            ..Self::default()
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn next(&self, question: &str) -> String {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut a| a.pop_front())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        let answer = self.next(question);
        if self.confirm_all {
            return Ok(true);
        }
        Ok(parse_yes_no(&answer).unwrap_or(default))
    }

    async fn input(&self, question: &str, default: &str) -> Result<String> {
        let answer = self.next(question);
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("Y"), Some(true));
        assert_eq!(parse_yes_no(" yes "), Some(true));
        assert_eq!(parse_yes_no("no"), Some(false));
        assert_eq!(parse_yes_no(""), None);
        assert_eq!(parse_yes_no("maybe"), None);
    }

    #[tokio::test]
    async fn test_scripted_prompt_answers_in_order() {
        let prompt = ScriptedPrompt::new(["n", "", "custom"]);
        assert!(!prompt.confirm("first?", true).await.unwrap());
        assert!(prompt.confirm("second?", true).await.unwrap());
        assert_eq!(prompt.input("third?", "dflt").await.unwrap(), "custom");
        assert_eq!(prompt.input("fourth?", "dflt").await.unwrap(), "dflt");
        assert_eq!(prompt.asked().len(), 4);
    }

    #[tokio::test]
    async fn test_always_yes() {
        let prompt = ScriptedPrompt::always_yes();
        assert!(prompt.confirm("release?", false).await.unwrap());
    }
}
