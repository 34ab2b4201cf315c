//! Lightweight prompt classification.
//!
//! Selects the system prompt and token budget from substring checks over
//! the raw prompt. Pure and deterministic; no state.

use once_cell::sync::Lazy;
use regex::Regex;

static VIETNAMESE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "[àáạảãâầấậẩẫăằắặẳẵèéẹẻẽêềếệểễìíịỉĩòóọỏõôồốộổỗơờớợởỡùúụủũưừứựửữỳýỵỷỹđ]",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptProfile {
    /// "generate a ... about ..." style content request.
    pub template_request: bool,
    /// Vietnamese output requested, by marker word or diacritics.
    pub vietnamese: bool,
    /// The prompt asks for short content.
    pub wants_short: bool,
}

pub fn classify(prompt: &str) -> PromptProfile {
    let lower = prompt.to_lowercase();
    PromptProfile {
        template_request: lower.contains("generate a") && lower.contains("about"),
        vietnamese: prompt.contains("Vietnamese")
            || prompt.contains("tiếng Việt")
            || VIETNAMESE_CHARS.is_match(prompt),
        wants_short: lower.contains("short"),
    }
}

impl PromptProfile {
    pub fn system_prompt(&self) -> String {
        if self.template_request {
            format!(
                "You are Tony Tech Insights' content creator. Create {} content that is \
                 professional, accessible, and aligned with our brand promise: \"Making \
                 Technology Accessible for Every Business\". Focus on practical business value.",
                if self.wants_short { "concise" } else { "detailed" }
            )
        } else {
            "You are Tony Tech Insights' AI assistant. Provide concise, practical tech advice \
             for businesses. Align with our brand: \"Making Technology Accessible for Every \
             Business\"."
                .to_string()
        }
    }

    /// Vietnamese diacritics inflate token counts for the same amount of
    /// content, so that branch gets a larger cap.
    pub fn max_tokens(&self) -> u32 {
        if self.vietnamese {
            800
        } else {
            500
        }
    }
}
