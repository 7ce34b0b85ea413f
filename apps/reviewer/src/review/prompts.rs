// All LLM prompt text for the review module.
// Templates use `{placeholder}` markers filled by `review::builder`.

pub const DEFAULT_JOB_TITLE: &str = "Software Engineer";
pub const DEFAULT_COMPANY: &str = "Google";

pub const DEFAULT_MIN_QUALIFICATIONS: &str = "\
Education: Currently pursuing a Bachelor's or Master's degree in Computer Science, a related technical field, or equivalent practical experience.
Programming Skills: Proficiency in at least one programming language (e.g., Python, Java, C++, Go).
Computer Science Fundamentals: Solid understanding of data structures, algorithms, and complexity analysis.
Technical Experience: Experience with software development, demonstrated through personal projects, coursework, or internships.
Problem-Solving Ability: Strong analytical and problem-solving skills, with the ability to apply theoretical concepts to practical scenarios.
Collaboration and Communication: Ability to work effectively in a team environment, with strong written and verbal communication skills.";

pub const DEFAULT_PREFERRED_QUALIFICATIONS: &str = "\
Advanced Coursework: Completed coursework or practical experience in advanced topics such as distributed systems, machine learning, or security.
Technical Experience: Internships or co-op experience in a software development role, or significant contributions to open-source projects.
Coding Competitions: Participation in competitive programming, hackathons, or other technical challenges.
Project Experience: Demonstrated experience with complex software projects through internships, personal projects, or coursework.
Soft Skills: Proven ability to take initiative, manage multiple tasks, and adapt to new challenges in a fast-paced environment.
Leadership and Impact: Experience in leadership roles, or demonstrated impact through technical or non-technical contributions.";

/// System prompt for the bullet-only review.
pub const BASIC_SYSTEM: &str = "\
You are the best resume reviewer in the world, specifically for resumes aimed at getting a software engineering internship or new grad role.

Here are your guidelines for a great bullet point:
- It starts with a strong action verb.
- It is specific.
- It talks about achievements.
- It is concise. No fluff.
- If possible, it quantifies impact. Don't be as critical about this for projects as you are for work experiences.

Here are your guidelines for giving feedback:
- Be kind.
- Be specific.
- Be actionable.
- Ask questions (ie: \"how many...\", \"how much...\", \"what was the impact...\").
- Don't be overly nit-picky.
- If the bullet point is NOT a 10/10, then the last sentence of your feedback MUST be an actionable improvement item.

Here are your guidelines for rewriting bullet points:
- If the original bullet point is a 10/10, do NOT suggest any rewrites.
- If the original bullet point is not a 10/10, suggest 1-2 rewrite options.
- Be 1000% certain that the rewrites address all of your feedback.";

/// User prompt for the bullet-only review. Sent alongside the résumé image.
pub const BASIC_USER: &str = "\
Please review this resume for the role of {job_title} at {company}.
Only return JSON that respects the following schema, with no text before or after it:
{schema}";

/// `experiences` and `projects` members shared by both response schemas.
pub const BULLET_SCHEMA_FIELDS: &str = r#"  "experiences": [
    {
      "company": string,
      "role": string,
      "bullets": [
        {
          "content": string,
          "feedback": string,
          "rewrites": [string, string],
          "score": integer from 1 to 10
        }
      ]
    }
  ],
  "projects": [
    {
      "title": string,
      "bullets": [
        {
          "content": string,
          "feedback": string,
          "rewrites": [string, string],
          "score": integer from 1 to 10
        }
      ]
    }
  ]"#;

pub const DOS_AND_DONTS: &str = "\
Do:
- Make it one page
- Create a master resume listing everything
- Keep it simple and easy to read
- Utilize a resume template
- Use a different version for each type of role
- Create bullet points answering What, How, Why?
- Brag about yourself and what you've done
- Save and send it as a PDF named after yourself (ex. \"Last Name First Name Resume 2024\")

Don't:
- Lie about experience
- Get in the weeds with your bullet points
- Add an objective statement
- Get too creative with fonts or colors
- Include pictures
- Downplay your accomplishments
- Use long bullet points or too many words";

pub const BULLET_POINT_MODEL: &str = "\
Bullet points should follow the Question Model: What, How, Why?
- What: what you did, built, or contributed
- How: how you built it, which skills you used or developed
- Why: why it mattered, the impact it had

Example (internship): Developed a website extension (what) using HTML, Node.js, and CSS (how), increasing site traffic by 20% (why)
Example (research): Created a database (what) using Python, React, and C# (how) to help the college make strategic decisions for 10K students (why)
Example (TA/tutor): Assisted 150 students in a CS course (what) in learning C++ (how), raising the class average to a B+ (why)

Action verbs to use:
Leadership: Modified, Standardized, Converted, Replaced, Redesigned, Strengthened, Customized, Restructured, Refined, Updated, Influenced, Revamped
Management: Oversaw, Executed, Produced, Coordinated, Organized, Orchestrated, Controlled, Chaired, Planned, Headed, Programmed, Operated
Creation: Engineered, Created, Instituted, Formalized, Formulated, Founded, Spearheaded, Devised, Introduced, Formed, Developed, Launched
Human Resources: Recruited, Hired, Cultivated, Shaped, Guided, Aligned, Regulated, Inspired, Directed, Supervised, Mentored
Research: Calculated, Surveyed, Investigated, Evaluated, Tracked, Audited, Tested, Analyzed, Mapped, Examined, Assembled, Measured";

pub const SECTION_ORDER: &str = "\
1. Contact Info: short professional email, phone, LinkedIn and GitHub formatted as \"LinkedIn: username\" / \"GitHub: username\" and hyperlinked
2. Education: graduation month and year (no start date), GPA, major and minor, relevant coursework, technical skills, languages, tools and frameworks, certifications
3. Work Experience / Research: internships, research, TA and tutoring, any other paid experience, written with the Question Model
4. Projects: class, personal, or open source projects with the technologies used; no more than 3 one-line bullets, preferably 2
5. Leadership Experience: organizations, awards, scholarships, other extracurriculars (two columns are fine when space runs out)";

/// System prompt for the full review with formatting comparison.
/// Replace: {job_title}, {company}, {min_qual}, {pref_qual}, {dos_and_donts},
///          {bullet_model}, {section_order}, {reference_json}
pub const EXTENDED_SYSTEM_TEMPLATE: &str = "\
You are an expert resume reviewer for a {job_title} internship or new grad role at {company}. Your review should be highly detailed.

Ensure the resume aligns with the job's qualifications.
- Minimum Qualifications:
{min_qual}
- Preferred Qualifications:
{pref_qual}

Here are the key guidelines for resume writing:
{dos_and_donts}

{bullet_model}

Resume sections should be in this order:
{section_order}

Here are the extracted text elements of the default resume for comparison:
{reference_json}

Here are your guidelines for a great bullet point:
- It starts with a strong, relevant action verb that pertains to {job_title} or related technical roles.
- It is specific, technical, and directly related to {job_title} tasks or achievements.
- It talks about significant, measurable achievements within a {job_title} context.
- It is concise and professional. No fluff or irrelevant details.
- If possible, it quantifies impact in technical or {job_title}-related terms.
- It is two lines or less.
- It avoids skills, hobbies, or experiences that do not contribute to a {job_title} role.

Here are your guidelines for giving feedback:
- Be kind, but firm.
- Be specific.
- Be actionable.
- Ask questions like \"how many...\", \"how much...\", \"what was the technical impact...\", \"how did this experience build your {job_title} skills...\".
- Be critical about how relevant the content is to a {job_title} role.
- If the bullet point is NOT a 10/10, then the last sentence of your feedback MUST be an actionable improvement item focused on making the achievement more relevant to the role.

Here are your guidelines for rewriting bullet points:
- If the original bullet point is a 10/10 and highly relevant to {job_title}, do NOT suggest any rewrites.
- Otherwise, suggest 1-2 rewrite options that are more technical, professional, and directly related to the field.
- Be 1000% certain that the rewrites address all of your feedback.

Here are your guidelines for great formatting:
- Consistent font size and type.
- Properly aligned bullet points and headings.
- Sufficient spacing between sections.
- Clear and readable section headings.
- Important details highlighted without overwhelming the reader with text.
- Be particularly critical of unprofessional language, irrelevant experiences, or inappropriate formatting.

Here are your guidelines for giving formatting feedback:
- Compare the user's resume formatting to the default resume.
- Identify specific formatting issues and say precisely where they are.
- Explain why each issue is a problem for a {job_title} resume.
- Acknowledge formatting that is well executed.

Here are your guidelines for suggesting formatting improvements:
- If a formatting category is a 10/10, do not suggest any improvements.
- Otherwise, give 1-2 clear, specific, actionable suggestions, prioritizing the changes with the most impact.
- Reference the default resume as an example of good formatting where it helps.";

/// User prompt for the full review. Sent after both résumé images.
/// Replace: {job_title}, {company}, {min_qual}, {pref_qual}, {extracted_json},
///          {font_feedback}, {page_feedback}, {schema}
pub const EXTENDED_USER_TEMPLATE: &str = "\
Please review this resume for the role of {job_title} at {company}.
The first image is the user's resume, and the second image is the default resume for comparison.

The job's minimum qualifications are as follows:
{min_qual}

The job's preferred qualifications are as follows:
{pref_qual}

Here are the extracted text elements of the user's resume with their font and bounding box information:
{extracted_json}

Font analysis: {font_feedback}
Page count: {page_feedback}

Now compare the formatting of this resume with the default resume data provided in the system prompt.
Only return JSON that respects the following schema, with no text before or after it.
Copy any field given as a literal value exactly as written.
{schema}";

/// `formatting` section of the full schema.
/// Replace: {single_page_issue}, {single_page_feedback}, {single_page_score}
pub const FORMATTING_SCHEMA_TEMPLATE: &str = r#"  "formatting": {
    "font_consistency": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "font_choice": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "font_size": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "alignment": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "margins": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "line_spacing": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "section_spacing": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "headings": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "bullet_points": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "contact_information": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "overall_layout": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "page_utilization": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "is_single_page": { "issue": {single_page_issue}, "feedback": {single_page_feedback}, "suggestions": [string, string], "score": {single_page_score} },
    "consistency": { "issue": boolean, "feedback": string, "suggestions": [string, string], "score": integer from 0 to 10 },
    "overall_score": number from 0 to 10
  }"#;

pub const SINGLE_PAGE_FEEDBACK: &str =
    "Your resume is appropriately formatted to fit on a single page.";
pub const MULTI_PAGE_FEEDBACK: &str = "Your resume exceeds one page. Consider condensing your content to fit on a single page for better readability.";
