// Shared prompt fragments. Each feature that calls the model keeps its own
// prompts.rs next to it; only cross-cutting pieces live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Temperature used for every generation call.
pub const GENERATION_TEMPERATURE: f32 = 0.5;
