use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

const MAX_CONTACT_LEN: usize = 255;
const MAX_SHORT_LEN: usize = 50;

/// Body of `PUT /api/profile`. Absent fields are treated as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub birthday: String,
    pub github: String,
    pub linkedin: String,
    pub website: String,
    pub education: String,
    pub skills: String,
    pub projects: String,
    pub experience: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl ProfileInput {
    /// Trims every field and checks the length and format limits.
    /// Returns the first problem found as a user-facing message.
    pub fn normalize(mut self) -> Result<Self, String> {
        for field in [
            &mut self.name,
            &mut self.email,
            &mut self.phone,
            &mut self.location,
            &mut self.birthday,
            &mut self.github,
            &mut self.linkedin,
            &mut self.website,
            &mut self.education,
            &mut self.skills,
            &mut self.projects,
            &mut self.experience,
        ] {
            *field = field.trim().to_string();
        }

        let limits = [
            ("name", &self.name, MAX_CONTACT_LEN),
            ("email", &self.email, MAX_CONTACT_LEN),
            ("location", &self.location, MAX_CONTACT_LEN),
            ("github", &self.github, MAX_CONTACT_LEN),
            ("linkedin", &self.linkedin, MAX_CONTACT_LEN),
            ("website", &self.website, MAX_CONTACT_LEN),
            ("phone", &self.phone, MAX_SHORT_LEN),
            ("birthday", &self.birthday, MAX_SHORT_LEN),
        ];
        for (field, value, max) in limits {
            if value.chars().count() > max {
                return Err(format!("{field} must be at most {max} characters"));
            }
        }

        if !self.email.is_empty() && !is_valid_email(&self.email) {
            return Err("email is not a valid address".to_string());
        }

        Ok(self)
    }
}
