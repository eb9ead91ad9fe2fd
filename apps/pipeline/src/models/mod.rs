pub mod fields;
pub mod profile;
pub mod record;

pub use profile::{CompressedProfile, ExperienceEntry, PersonalSection, SalarySection};
pub use record::{Fields, Page, Record};
