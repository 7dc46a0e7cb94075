// All LLM prompt constants for the tailoring pipeline.

/// System prompt for résumé tailoring: enforces JSON-only output.
pub const TRANSFORM_SYSTEM: &str = "You are an expert resume editor tailoring an existing resume \
    to a specific job posting. You rewrite prose; you never change facts. \
    You MUST respond with valid JSON only, a single object matching the given schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Tailoring prompt template.
/// Replace: {tier_rules}, {source_json}, {target_json}, {priorities},
///          {style_constraints}, {feedback}, {schema}
pub const TRANSFORM_PROMPT_TEMPLATE: &str = r#"Tailor the SOURCE RESUME below to the TARGET POSTING.

FACT TIERS (hard rules, checked automatically after you answer):
{tier_rules}

SOURCE RESUME (source of truth, ONLY use facts from here):
{source_json}

TARGET POSTING:
{target_json}

SECTION PRIORITIES (emphasize higher-ranked content, never drop entries):
{priorities}

STYLE CONSTRAINTS:
{style_constraints}
{feedback}
OUTPUT RULES:
1. Keep every work_history, education and certifications entry, in the same order as the source
2. For each work_history entry, copy the source bullets verbatim into `original_bullets`
3. Rewrite `bullets` and `summary` freely, but every number, percentage, amount or team size must already appear in the source
4. `skills` may only contain skills listed in the source; reorder them by relevance
5. Give every skill a `relevance_score` between 0 and 1 and list the posting requirements it matches in `matched_requirements`

Return a JSON object with this EXACT schema:
{schema}"#;

/// Header of the corrective block appended on retries.
/// Replace: {attempt}, {violations}
pub const FEEDBACK_TEMPLATE: &str = r#"
CORRECTIONS REQUIRED (your previous answer, attempt {attempt}, was rejected):
{violations}
Fix exactly these fields. Everything else must still follow the SOURCE RESUME and the rules above.
"#;

/// Corrective block used when the previous attempt produced no usable document.
/// Replace: {attempt}, {reason}
pub const GENERATION_FAILURE_TEMPLATE: &str = r#"
NOTE: your previous answer (attempt {attempt}) could not be used: {reason}
Return one complete JSON object that matches the schema exactly.
"#;
