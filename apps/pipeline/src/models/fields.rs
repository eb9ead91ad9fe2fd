//! Column names used across the base.

pub const APPLICANT_LINK: &str = "Applicant";

pub mod applicant {
    pub const PERSONAL_DETAILS: &str = "Personal Details";
    pub const WORK_EXPERIENCE: &str = "Work Experience";
    pub const SALARY_PREFERENCES: &str = "Salary Preferences";
    pub const COMPRESSED_JSON: &str = "Compressed JSON";
    pub const LLM_SUMMARY: &str = "LLM Summary";
    pub const LLM_SCORE: &str = "LLM Score";
    pub const LLM_FOLLOW_UPS: &str = "LLM Follow-Ups";
}

pub mod personal {
    pub const FULL_NAME: &str = "Full Name";
    pub const EMAIL: &str = "Email";
    pub const LOCATION: &str = "Location";
    pub const LINKEDIN: &str = "LinkedIn";
}

pub mod experience {
    pub const COMPANY: &str = "Company";
    pub const TITLE: &str = "Title";
    pub const START: &str = "Start";
    pub const END: &str = "End";
    pub const TECHNOLOGIES: &str = "Technologies";
}

pub mod salary {
    pub const PREFERRED_RATE: &str = "Preferred Rate";
    pub const MINIMUM_RATE: &str = "Minimum Rate";
    pub const CURRENCY: &str = "Currency";
    pub const AVAILABILITY: &str = "Availability (hrs/wk)";
}

pub mod shortlist {
    pub const COMPRESSED_JSON: &str = "Compressed JSON";
    pub const SCORE_REASON: &str = "Score Reason";
}
