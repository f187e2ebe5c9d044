//! Instruction prompt sent to the fallback model.

const PROMPT_HEADER: &str = "Return a SINGLE JSON OBJECT (not an array).

Extract all line items with:
item_name, item_quantity, item_rate, item_amount

Invoice text:
---
";

const PROMPT_FOOTER: &str = "
---
";

/// Embed document text in the fixed extraction instructions.
pub fn build_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(PROMPT_HEADER.len() + text.len() + PROMPT_FOOTER.len());
    prompt.push_str(PROMPT_HEADER);
    prompt.push_str(text);
    prompt.push_str(PROMPT_FOOTER);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_between_markers() {
        let prompt = build_prompt("line one\nline two");

        assert!(prompt.starts_with("Return a SINGLE JSON OBJECT"));
        assert!(prompt.contains("item_name, item_quantity, item_rate, item_amount"));
        assert!(prompt.contains("---\nline one\nline two\n---"));
    }
}
