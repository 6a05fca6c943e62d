// Shared prompt fragments. Each flow that calls the model defines its own
// prompts alongside it (see `evaluation::prompts`); this file holds the
// cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are an expert HR recruiter and a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown formatting or code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for free-text recruiter conversations.
pub const RECRUITER_ASSISTANT_SYSTEM: &str = "You are an expert recruiting assistant. \
    Answer using ONLY the candidate information you are given. \
    Be professional, objective and direct.";

/// Appended to every structured request as a second line of defence.
pub const NO_MARKDOWN_INSTRUCTION: &str =
    "Respond ONLY with the JSON described above: no markdown, no code blocks, no commentary.";
