//! Prompt construction for the rewrite action.

pub mod draft;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub use draft::Draft;

/// Preset rewrite styles.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tone {
    #[default]
    Formal,
    Friendly,
    Concise,
    Persuasive,
}

impl Tone {
    /// Parse a tone name, falling back to [`Tone::Formal`] for anything unknown.
    pub fn from_name(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::Formal => {
                "Rewrite this email in a formal, professional tone while maintaining the original meaning."
            }
            Self::Friendly => {
                "Rewrite this email in a friendly, warm tone while maintaining the original meaning."
            }
            Self::Concise => {
                "Rewrite this email to be more concise and to the point while maintaining all important information."
            }
            Self::Persuasive => {
                "Rewrite this email to be more persuasive and compelling while maintaining the original meaning."
            }
        }
    }
}

const PREAMBLE: &str = "You are an expert email writing assistant. Always respond in the STRICT format: \
Subject: ...\n\nBody: ... with no extra commentary. Preserve paragraph breaks and list formatting in the body.";

const TONE_RULES: &str = "Return ONLY this exact format and nothing else:\n\n\
Subject: <subject goes here>\n\nBody: <body goes here>\n\n\
Rules:\n\
- Do not include explanations, notes, markdown, headings, or extra lines.\n\
- Always include both Subject and Body.";

const INSTRUCTION_RULES: &str = "Return ONLY the following two sections and nothing else. \
Maintain paragraph breaks and list formatting in the body.\n\n\
Subject: <subject goes here>\n\nBody: <body goes here>\n\n\
Rules:\n\
- Do not include explanations, notes, markdown headings, or extra commentary outside of Subject/Body.\n\
- Always include both Subject and Body.\n\
- Preserve essential details, names, paragraph breaks, and lists.";

/// How the rewrite should be steered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Style<'a> {
    Tone(Tone),
    Instruction(&'a str),
}

impl<'a> Style<'a> {
    /// A non-blank custom instruction wins over the tone; with neither,
    /// `default_tone` applies.
    pub fn resolve(tone: Option<Tone>, instruction: Option<&'a str>, default_tone: Tone) -> Self {
        match instruction.map(str::trim).filter(|i| !i.is_empty()) {
            Some(instruction) => Self::Instruction(instruction),
            None => Self::Tone(tone.unwrap_or(default_tone)),
        }
    }
}

/// Full prompt text sent to the generative service.
pub fn build_prompt(source_text: &str, style: &Style<'_>) -> String {
    let task = match style {
        Style::Tone(tone) => format!("{} {TONE_RULES}", tone.instruction()),
        Style::Instruction(instruction) => format!(
            "Rewrite the email according to these instructions: \"{instruction}\". {INSTRUCTION_RULES}"
        ),
    };
    format!("{PREAMBLE}\n\n{task}\n\nEmail to rewrite:\n{source_text}")
}
