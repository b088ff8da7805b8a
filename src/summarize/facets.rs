// The five summary facets and their prompts
use crate::summarize::llm::CompletionRequest;
use std::fmt;

/// Characters considered before the word window is applied.
const LEAD_CHARS: usize = 500;
/// Words of paper text fed to the short-context facets.
const LEAD_WORDS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Authors,
    Summary,
    KeyResults,
    Keywords,
    Limitations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextWindow {
    Leading { chars: usize, words: usize },
    FullText,
}

impl Facet {
    pub const ALL: [Facet; 5] = [
        Facet::Authors,
        Facet::Summary,
        Facet::KeyResults,
        Facet::Keywords,
        Facet::Limitations,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Facet::Authors => "authors",
            Facet::Summary => "summary",
            Facet::KeyResults => "key_results",
            Facet::Keywords => "keywords",
            Facet::Limitations => "limitations",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Facet::Authors => "Who are the authors of this paper?",
            Facet::Summary => "Summarize the above text, focus on key insights.",
            Facet::KeyResults => {
                "Give me three key results in the format of \"Key results:\n1. Key result 1\n2. Key result 2\n3. Key result 3\""
            }
            Facet::Keywords => "Give me keywords in the format of \"Keywords: Keyword 1, Keyword 2, Keyword 3\"",
            Facet::Limitations => "Give me 3 sentences describing the limitations of the text above.",
        }
    }

    pub fn context_window(&self) -> ContextWindow {
        match self {
            Facet::Limitations => ContextWindow::FullText,
            _ => ContextWindow::Leading {
                chars: LEAD_CHARS,
                words: LEAD_WORDS,
            },
        }
    }

    /// (temperature, max output tokens)
    pub fn generation_params(&self) -> (f32, u32) {
        match self {
            Facet::Authors => (0.0, 64),
            Facet::Summary => (0.7, 256),
            Facet::KeyResults => (0.5, 256),
            Facet::Keywords => (0.3, 64),
            Facet::Limitations => (0.5, 192),
        }
    }

    pub fn request(&self, full_text: &str) -> CompletionRequest {
        let context = match self.context_window() {
            ContextWindow::Leading { chars, words } => leading_words(full_text, chars, words),
            ContextWindow::FullText => full_text.trim().to_string(),
        };
        let (temperature, max_tokens) = self.generation_params();
        CompletionRequest {
            prompt: format!("{}\n\n{}", context, self.instruction()),
            temperature,
            max_tokens,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First `words` words within the first `chars` characters.
pub fn leading_words(text: &str, chars: usize, words: usize) -> String {
    let head: String = text.chars().take(chars).collect();
    head.split_whitespace().take(words).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_words_is_bounded_by_chars_and_words() {
        let text = (0..100).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let lead = leading_words(&text, 500, 20);
        assert_eq!(lead.split(' ').count(), 20);
        assert!(lead.starts_with("w0 w1 w2"));
        assert_eq!(leading_words("alpha beta gamma", 8, 20), "alpha be");
    }

    #[test]
    fn leading_words_is_char_boundary_safe() {
        assert_eq!(leading_words("héllo wörld ñandú", 9, 20), "héllo wör");
    }

    #[test]
    fn short_facets_use_leading_window() {
        let text = (0..60).map(|i| format!("t{i}")).collect::<Vec<_>>().join(" ");
        let req = Facet::Keywords.request(&text);
        assert!(req.prompt.starts_with("t0 t1"));
        assert!(!req.prompt.contains("t20 "));
        assert!(req.prompt.ends_with("Keyword 3\""));
        assert_eq!(req.max_tokens, 64);
    }

    #[test]
    fn limitations_sees_full_text() {
        let text = (0..60).map(|i| format!("t{i}")).collect::<Vec<_>>().join(" ");
        let req = Facet::Limitations.request(&text);
        assert!(req.prompt.contains("t59"));
        assert!(req.prompt.contains("limitations"));
    }

    #[test]
    fn only_limitations_mentions_limitations() {
        for facet in Facet::ALL {
            let mentions = facet.instruction().contains("limitations");
            assert_eq!(mentions, facet == Facet::Limitations, "{facet}");
        }
    }
}
