// Resume parsing prompt templates.

pub const RESUME_PARSE_SYSTEM: &str = "\
You are a precise resume data extractor. \
Convert the text of a resume into a single structured JSON portfolio document.";

pub const RESUME_PARSE_PROMPT: &str = r#"Extract the following resume into a JSON object.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure; omit sections that are not present):
{
  "personalInfo": {
    "name": "string", "title": "string", "bio": "string",
    "email": "string", "phone": "string", "location": "string"
  },
  "socialProfiles": { "github": "url", "linkedin": "url", "twitter": "url", "website": "url" },
  "skills": [ { "category": "string", "items": ["string"] } ],
  "experience": [
    { "company": "string", "role": "string", "date": "string", "location": "string",
      "description": "string", "techStack": ["string"], "bullets": ["string"] }
  ],
  "projects": [
    { "title": "string", "description": "string", "link": "url", "github": "url",
      "techStack": ["string"], "bullets": ["string"] }
  ],
  "education": [
    { "institute": "string", "degree": "string", "date": "string", "grade": "string",
      "description": "string" }
  ],
  "certifications": [ { "name": "string", "issuer": "string", "date": "string", "link": "url" } ],
  "publications": [ { "title": "string", "venue": "string", "date": "string", "link": "url",
      "authors": ["string"] } ],
  "achievements": ["string"],
  "coursework": ["string"],
  "extracurricular": [
    { "organization": "string", "role": "string", "date": "string", "description": "string" }
  ],
  "customSections": [ { "title": "string", "items": ["string"] } ]
}

RULES:
- Dates stay in the resume's own format (e.g. "Jan 2021 - Present").
- Bullets are individual achievement lines, without leading bullet characters.
- Group skills under the resume's own headings; use "General" if there are none.
- Do NOT add ids, status, or mergeGroupId fields."#;
