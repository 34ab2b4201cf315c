//! Fallback content synthesis.
//!
//! Used whenever the upstream API is unavailable, unconfigured, or too
//! slow. Always returns non-empty text and never fails. The random source
//! is injected so tests can pin the variant selection.

use chrono::Datelike;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use super::classify::PromptProfile;

const BRAND_TAGLINE: &str = "Making Technology Accessible for Every Business";

/// `about "X"` topic extraction for template requests.
static TOPIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)about\s+"([^"]+)""#).unwrap());

/// Content types by first-match substring, checked in order.
const CONTENT_TYPES: [(&str, &str); 4] = [
    ("blog", "blog post"),
    ("social", "social media post"),
    ("email", "email"),
    ("ad", "ad copy"),
];

const EN_RESPONSES: [&str; 4] = [
    "I understand your question about {topic}. As Tony Tech Insights, we specialize in \
     making technology accessible for businesses. Could you provide more details so I can \
     assist you better?",
    "That's an interesting question about {topic}. At Tony Tech Insights, we focus on \
     practical tech advice for businesses. Let me know if you'd like more specific \
     information.",
    "Thanks for asking about {topic}. This is an important area for businesses. I'd be \
     happy to explore this further if you have specific questions.",
    "From a business technology perspective, {topic} offers several strategic \
     opportunities. Would you like me to elaborate on any particular aspect?",
];

const VI_RESPONSES: [&str; 4] = [
    "Tại Tony Tech Insights, chúng tôi tập trung vào việc giúp công nghệ dễ tiếp cận với \
     các doanh nghiệp. Với câu hỏi về {topic}, tôi có thể giúp gì thêm cho bạn?",
    "Công nghệ đang thay đổi cách thức hoạt động của doanh nghiệp. Khi đề cập đến {topic}, \
     bạn có thể cung cấp thêm chi tiết để tôi có thể hỗ trợ tốt hơn không?",
    "{topic} là một chủ đề quan trọng đối với doanh nghiệp. Tôi rất vui được trả lời bất \
     kỳ câu hỏi cụ thể nào bạn có về vấn đề này.",
    "Từ góc độ công nghệ kinh doanh, {topic} mang lại nhiều cơ hội chiến lược. Bạn có muốn \
     biết thêm về khía cạnh nào cụ thể không?",
];

/// Synthesize a stand-in response for the given prompt.
pub fn generate<R: Rng>(prompt: &str, profile: &PromptProfile, rng: &mut R) -> String {
    if profile.template_request {
        generate_template(prompt, profile.vietnamese)
    } else {
        let topic = if prompt.trim().is_empty() {
            "your question"
        } else {
            prompt
        };
        let responses = if profile.vietnamese {
            &VI_RESPONSES
        } else {
            &EN_RESPONSES
        };
        responses[rng.gen_range(0..responses.len())].replace("{topic}", topic)
    }
}

fn generate_template(prompt: &str, vietnamese: bool) -> String {
    let lower = prompt.to_lowercase();
    let content_type = CONTENT_TYPES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, label)| *label)
        .unwrap_or("blog post");

    let topic = TOPIC_RE
        .captures(prompt)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or("technology");

    let year = chrono::Utc::now().year();
    let title = title_case(content_type);

    if vietnamese {
        format!(
            "{title}: {topic}\n\n\
             {topic} đang trở thành chủ đề quan trọng với các doanh nghiệp trong năm {year}. \
             Tại Tony Tech Insights, chúng tôi tin rằng công nghệ nên là công cụ thiết thực, \
             không phải là khẩu hiệu.\n\n\
             Một vài góc nhìn đáng cân nhắc:\n\
             - {topic} thay đổi hoạt động hằng ngày của doanh nghiệp như thế nào\n\
             - Những lợi ích nhanh, chi phí thấp cho đội ngũ nhỏ\n\
             - Cách đo lường hiệu quả thực tế\n\n\
             Dù bạn bắt đầu từ đâu, mục tiêu vẫn không đổi: {BRAND_TAGLINE}."
        )
    } else {
        format!(
            "{title}: {topic}\n\n\
             {topic} has become a defining theme for businesses in {year}. At Tony Tech \
             Insights we believe the companies that get ahead are the ones that treat \
             technology as a practical tool rather than a buzzword.\n\n\
             Three angles worth considering:\n\
             - What {topic} changes about day-to-day operations\n\
             - Where the quick, affordable wins are for small teams\n\
             - How to measure whether it is actually paying off\n\n\
             Wherever you start, the goal stays the same: {BRAND_TAGLINE}."
        )
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
