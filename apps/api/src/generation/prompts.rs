// Prompt templates for resume generation and interview answers.
// The JSON-only system fragment lives in llm_client::prompts.

/// Output contract appended to the resume prompt. The model runs in JSON-object
/// mode, so the shape is described here and checked after parsing.
pub const RESUME_OUTPUT_CONTRACT: &str = r#"## OUTPUT FORMAT:
Return a single JSON object with EXACTLY these fields:
{
  "title": "Senior Full Stack Developer",
  "summary": "2-3 sentences, no first-person pronouns, at least one quantified result",
  "experience": [
    {
      "title": "Backend Developer",
      "company": "Google (Alphabet Inc.)",
      "location": "London, UK | Remote",
      "startDate": "March 2020",
      "endDate": "Present",
      "highlights": [
        "Led migration to React hooks, reducing component code by 40% while improving performance scores by 15 points"
      ]
    }
  ],
  "skills": ["Frontend: React (Hooks, Context), Vue 3"],
  "education": [
    {
      "degree": "Bachelor of Science in Computer Science",
      "institution": "Stanford University",
      "location": "Stanford, CA",
      "graduationDate": "May 2020"
    }
  ]
}

Constraints:
- "experience": 3 to 4 positions, most recent first.
- Each position: 5 to 6 "highlights", ordered by impact, each with a measurable result.
- Each company appears EXACTLY ONCE in "experience". For several roles at one company, keep the most senior one.
- "skills": 3 to 10 entries, formatted "Category: Skill (Specifics)", using exact terms from the job description that the candidate actually has.
- "education": at least 1 entry taken from the candidate's real education.
- Dates are "Month YYYY" with the full month name; current roles end with "Present"."#;

/// Resume prompt: job description analysis, candidate profile, structure and
/// content rules, followed by the output contract.
pub fn resume_prompt(job_description: &str, profile_json: &str) -> String {
    format!(
        r#"# RESUME GENERATION INSTRUCTIONS

## CONTEXT:
You are a professional resume writer creating an ATS-optimized, achievement-focused resume for a job seeker.
The resume must be tailored to the specific job description while accurately representing the candidate's background.

## JOB DESCRIPTION ANALYSIS:
{job_description}

Key requirements to emphasize:
1. Extract the 20-40 most relevant skills from the job description.
2. Extract the 3-4 most relevant work experiences for the job description.
3. Extract key responsibilities and achievements from the job description.

## CANDIDATE PROFILE ANALYSIS:
{profile_json}

Notable strengths to highlight:
1. Identify all companies and roles in the profile correctly.
2. Assess the candidate's years of experience and specialization.

## RESUME STRUCTURE REQUIREMENTS:

### 1. TITLE AND PROFESSIONAL SUMMARY
- Choose a professional title reflecting the candidate's most senior or relevant expertise.
- Experience titles should show a logical career progression related to the overall title.
- Summary: 2-3 sentences built from title, years of experience, specialization, two key achievements and a value proposition.

### 2. WORK EXPERIENCE
- Job Title @ Company | Location | Dates for each position.
- Achievement bullets follow the Challenge-Action-Result format.
- Each company must appear ONLY ONCE; never duplicate a company with different job titles.

### 3. SKILLS SECTION
- Grouped by category, with proficiency indicators where useful.
- Prioritize skills matching the job description.

## CONTENT RULES:
1. Quantify every possible result ("Increased user retention by 27% through...").
2. Use strong, varied action verbs.
3. Only include experiences with at least two points matching the job description.
4. Always mention the specific technologies used.
5. Never invent employers, degrees or skills absent from the profile.

## OUTPUT VALIDATION:
Before finalizing, verify that all dates follow "Month YYYY", there are no first-person pronouns,
every bullet has a clear result, skills match the profile, and each company appears exactly once.

{RESUME_OUTPUT_CONTRACT}"#
    )
}

/// Interview coaching prompt producing a first-person answer.
pub fn interview_prompt(resume_json: &str, job_description: &str, question: &str) -> String {
    format!(
        r#"You are an AI assistant helping a job seeker prepare for interviews. Generate a first-person response that the job seeker can use when answering this interview question.

The response should:
- Be written in first person (I, my, me) as if the job seeker is speaking
- Only reference skills and experiences that are actually in the resume
- Be concise, professional, and directly address the question
- Incorporate relevant details from both the resume and the job description
- Be personalized to the job seeker's background and experiences
- Sound natural and conversational, as in a real interview, avoiding robotic phrasing

Resume: {resume_json}

---

Job Description: {job_description}

---

Interview Question: {question}
"#
    )
}
