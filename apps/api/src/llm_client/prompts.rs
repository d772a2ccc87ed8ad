// Prompt fragments shared by every LLM caller. Feature prompts live in a
// prompts.rs next to their caller and append these.

/// Forces bare JSON output so `LlmClient::call_json` can decode it.
pub const JSON_ONLY_SYSTEM: &str = "Respond with one valid JSON value and nothing else. \
    No prose before or after it, no markdown code fences, no commentary.";

/// Keeps extraction honest: copy, never embellish.
pub const VERBATIM_INSTRUCTION: &str = "\
    CRITICAL: Copy facts exactly as written in the source document. \
    Do NOT infer or invent employers, titles, dates or metrics. \
    If a field is not present in the source, omit it.";
