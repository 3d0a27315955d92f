//! Prompt text for career generation. Placeholders are replaced in [`career_prompt`].

use crate::{
    interests::repo::Interest, qualifications::repo::Qualification, skills::repo::Skill,
    users::repo::User,
};

pub const CAREER_PROMPT_TEMPLATE: &str = r#"You are a career advisor. Based on the following user data:
User: {user}
Skills: {skills}
Qualifications: {qualifications}
Interests: {interests}

Provide 3 career recommendations with a brief explanation for each, and suggest relevant online courses for each career.
You may add a "confidence" between 0 and 1 and a "skillGaps" list of skills the user still needs.
Respond with valid JSON only, no markdown code fences, using this EXACT schema:
{
  "recommendations": [
    {
      "career": "Career Recommendation",
      "explanation": "Why this career fits the user",
      "courses": [
        {"title": "Course Title", "link": "https://course.link"}
      ],
      "confidence": 0.8,
      "skillGaps": ["Skill to learn"]
    }
  ]
}"#;

fn display_name(user: &User) -> String {
    let full: Vec<&str> = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if full.is_empty() {
        user.username.clone()
    } else {
        format!("{} ({})", user.username, full.join(" "))
    }
}

pub fn career_prompt(
    user: &User,
    skills: &[Skill],
    qualifications: &[Qualification],
    interests: &[Interest],
) -> String {
    let join = |names: Vec<&str>| names.join(", ");
    CAREER_PROMPT_TEMPLATE
        .replace("{user}", &display_name(user))
        .replace(
            "{skills}",
            &join(skills.iter().map(|s| s.skill_name.as_str()).collect()),
        )
        .replace(
            "{qualifications}",
            &join(qualifications.iter().map(|q| q.title.as_str()).collect()),
        )
        .replace(
            "{interests}",
            &join(interests.iter().map(|i| i.interest_name.as_str()).collect()),
        )
}
