//! The generator port

use async_trait::async_trait;
use ethos_core::Mode;

use crate::error::Result;

/// Sampling temperature generators are expected to use
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Text generation backend
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply to `prompt`, steered by the instruction for `mode`
    async fn generate(&self, prompt: &str, mode: Mode) -> Result<String>;
}

/// System instruction that frames the generator for a writing mode
pub fn system_instruction(mode: Mode) -> &'static str {
    match mode {
        Mode::Academic => {
            "You are a rigorous academic reviewer. Critique arguments, check consistency \
             with the literature and keep a formal, critical tone."
        }
        Mode::Cv => {
            "You are an expert HR recruiter and applicant tracking system specialist. \
             Focus on keywords, professional impact and concise formatting."
        }
        Mode::Homework => {
            "You are an educational mentor. Focus on the clarity and accuracy of the \
             assignment and on whether it suits the student's level."
        }
        Mode::Report => {
            "You are a professional report writing assistant. Focus on data presentation, \
             summarizing and professional language."
        }
        Mode::Custom => {
            "You are a flexible writing assistant. Guide the user according to their \
             custom template and preferences."
        }
        Mode::None => "You are a helpful writing assistant.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_has_an_instruction() {
        for mode in Mode::ALL {
            assert!(!system_instruction(mode).is_empty());
        }
        assert!(system_instruction(Mode::Academic).contains("academic reviewer"));
    }
}
