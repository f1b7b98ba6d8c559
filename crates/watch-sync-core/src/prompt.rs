use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Synchronous confirmation capability the orchestrator depends on. The CLI
/// backs it with dialoguer; tests script the answers.
pub trait Prompt: Send + Sync {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Non-interactive implementation that replays a fixed sequence of answers.
/// Runs out of answers -> declines, which is always the safe direction.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order.
    pub fn questions(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        self.asked.lock().unwrap().push(question.to_string());
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompt_replays_then_declines() {
        let prompt = ScriptedPrompt::new([true, false]);
        assert!(prompt.confirm("first?").unwrap());
        assert!(!prompt.confirm("second?").unwrap());
        assert!(!prompt.confirm("third?").unwrap());
        assert_eq!(prompt.questions().len(), 3);
    }
}
