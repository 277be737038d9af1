// Prompt constants for resume scoring.

/// System prompt for scoring. Enforces JSON-only output.
pub const SCORING_SYSTEM: &str = "You are an expert in ATS (Applicant Tracking System) \
    and resume analysis. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Feedback schema the engine must answer with.
pub const FEEDBACK_FORMAT: &str = r#"{
  "overallScore": 0,
  "ATS": {
    "score": 0,
    "tips": [{"type": "good" | "improve", "tip": "short label"}],
    "matchedKeywords": ["keyword from the job description found in the resume"]
  },
  "toneAndStyle": {
    "score": 0,
    "tips": [{"type": "good" | "improve", "tip": "short label", "explanation": "detailed explanation"}]
  },
  "content": { "score": 0, "tips": [ ...same shape as toneAndStyle... ] },
  "structure": { "score": 0, "tips": [ ...same shape as toneAndStyle... ] },
  "skills": { "score": 0, "tips": [ ...same shape as toneAndStyle... ] }
}"#;

/// Scoring instructions template. Replace `{job_title}`, `{job_description}`
/// and `{format}` before sending.
const INSTRUCTIONS_TEMPLATE: &str = r#"Analyze and rate this resume and suggest how to improve it.
The rating can be low if the resume is bad. Be thorough and detailed; do not hesitate to point out mistakes or areas for improvement.
If available, use the job description of the job the user is applying to for more relevant feedback.

Job title: {job_title}
Job description: {job_description}

Rules:
- Every score is an integer from 0 to 100.
- ATS tips are short labels with no explanation. Give 3-4 of them.
- Tips in toneAndStyle, content, structure and skills should carry an explanation. Give 3-4 per category.
- matchedKeywords lists job description keywords that already appear in the resume.

Return the analysis as a JSON object with this EXACT schema:
{format}"#;

/// Builds the free-text scoring instructions from the job metadata.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    INSTRUCTIONS_TEMPLATE
        .replace("{job_title}", or_unspecified(job_title))
        .replace("{job_description}", or_unspecified(job_description))
        .replace("{format}", FEEDBACK_FORMAT)
}

/// Appends the extracted resume text to the instructions.
pub fn build_scoring_prompt(instructions: &str, resume_text: &str) -> String {
    format!("{instructions}\n\nResume:\n\"\"\"\n{}\n\"\"\"", resume_text.trim())
}

fn or_unspecified(text: &str) -> &str {
    if text.trim().is_empty() {
        "(not provided)"
    } else {
        text
    }
}
