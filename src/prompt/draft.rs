//! Page-side draft handling: turns what the user typed into a rewrite payload.

use crate::error::MailcraftError;
use crate::prompt::Tone;
use crate::transport::protocol::RewritePayload;

/// Trailing marker that introduces an inline custom instruction,
/// e.g. `...thanks!  !@# make it sound more urgent`.
pub const INSTRUCTION_MARKER: &str = "!@#";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

impl Draft {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.subject.trim().is_empty() && self.body.trim().is_empty()
    }

    /// Remove a trailing `!@# instruction` from the body and return the
    /// instruction. The marker only counts on the body's last line.
    pub fn split_instruction(&mut self) -> Option<String> {
        let marker_at = self.body.rfind(INSTRUCTION_MARKER)?;
        let instruction = self.body[marker_at + INSTRUCTION_MARKER.len()..].trim();
        if instruction.is_empty() || instruction.contains('\n') {
            return None;
        }
        let instruction = instruction.to_string();
        self.body.truncate(marker_at);
        let trimmed_len = self.body.trim_end().len();
        self.body.truncate(trimmed_len);
        Some(instruction)
    }

    /// Source text sent for rewriting: labelled when a subject exists.
    pub fn text_payload(&self) -> String {
        let subject = self.subject.trim();
        if subject.is_empty() {
            self.body.clone()
        } else {
            format!("Subject: {subject}\n\nBody: {}", self.body)
        }
    }

    /// Build the rewrite payload. An inline instruction in the body wins over
    /// `tone`; `instruction` passed explicitly wins over both.
    pub fn into_payload(
        mut self,
        tone: Option<Tone>,
        instruction: Option<String>,
        credential: Option<String>,
    ) -> Result<RewritePayload, MailcraftError> {
        if self.is_blank() {
            return Err(MailcraftError::validation("Please write some text first!"));
        }
        let credential = credential
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| MailcraftError::validation("Please set up your Gemini API key."))?;

        let inline = self.split_instruction();
        let custom_instruction = instruction
            .filter(|i| !i.trim().is_empty())
            .or(inline);
        let tone = if custom_instruction.is_some() { None } else { tone };

        Ok(RewritePayload {
            source_text: self.text_payload(),
            tone,
            custom_instruction,
            credential,
        })
    }
}
