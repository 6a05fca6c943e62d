// Prompt templates for the evaluation, interview-question and chat flows.
// Shared system fragments live in `llm_client::prompts`.

/// CV evaluation prompt.
/// Replace: {job_description}, {instructions}, {cv_text}, {criteria}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Analyse the following CV for the position described below.

POSITION:
{job_description}
{instructions}

CV:
{cv_text}

Score the candidate on these dimensions:
{criteria}

Perform a critical, in-depth analysis. Do not be superficial. Look for concrete evidence in the CV.

Return a JSON object with this EXACT schema:
{
  "relevance": <number 0-10>,
  "education": <number 0-10>,
  "previousJobs": <number 0-10>,
  "proactivity": <number 0-10>,
  "analysis": {
    "relevance": "detailed, critical analysis",
    "education": "detailed, critical analysis",
    "previousJobs": "detailed, critical analysis",
    "proactivity": "detailed, critical analysis"
  },
  "strengths": ["strength 1", "strength 2"],
  "weaknesses": ["weakness 1", "weakness 2"],
  "criticalAnalysis": "Executive summary on the candidate's suitability: why hire them or why not."
}

Every score MUST be a number between 0 and 10 inclusive."#;

/// Interview questions as plain strings.
/// Replace: {count}, {job_description}, {candidate}
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Generate {count} personalised interview questions for this candidate, based on their profile and the job description.

POSITION:
{job_description}

CANDIDATE:
{candidate}

Rules:
- Questions must be challenging but fair.
- Focus on validating the weaknesses and digging into the strengths.
- Questions must be open-ended and behavioural.

Return a JSON object with this EXACT schema:
{"questions": ["question 1", "question 2"]}"#;

/// Interview questions with the rationale behind each one.
/// Replace: {count}, {job_description}, {candidate}
pub const QUESTIONS_WITH_PURPOSE_PROMPT_TEMPLATE: &str = r#"Generate {count} personalised interview questions for this candidate, based on their profile and the job description.

POSITION:
{job_description}

CANDIDATE:
{candidate}

Rules:
- Questions must be challenging but fair.
- Focus on validating the weaknesses and digging into the strengths.
- Questions must be open-ended and behavioural.
- For each question, state what the interviewer learns from the answer.

Return a JSON object with this EXACT schema:
{"questions": [{"question": "the question", "purpose": "what the answer reveals"}]}"#;

/// Recruiter chat over the selected candidates.
/// Replace: {candidates}, {question}
pub const CHAT_PROMPT_TEMPLATE: &str = r#"You have access to the following candidates:

{candidates}

RECRUITER QUESTION:
"{question}"

Instructions:
- Answer ONLY from the information above.
- When asked to compare, contrast their strengths and weaknesses.
- When asked to simulate a candidate's answer, base it on their profile.
- Be professional, objective and direct."#;

/// Visible delimiter between candidates in the chat context.
pub const CANDIDATE_SEPARATOR: &str = "\n\n-------------------\n\n";

/// Substitutes `{name}` placeholders in a single left-to-right pass. Text
/// inserted for one placeholder is never scanned again, and braces that do not
/// open a known placeholder (the JSON schemas above) are kept as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = values.iter().find_map(|(name, value)| {
            after
                .strip_prefix(*name)
                .and_then(|tail| tail.strip_prefix('}'))
                .map(|tail| (*value, tail))
        });
        match placeholder {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
