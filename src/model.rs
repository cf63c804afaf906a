use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const MAX_TAGS: usize = 3;
pub const MAX_TAG_LENGTH: usize = 30;

pub const TAG_CONSTRAINTS: &str = "Tags must be a single word (no spaces) with up to 30 characters. \
Allowed: letters, numbers, and at most 2 special characters from: - . @ # _ +";

const TAG_PATTERN: &str = r"^[a-zA-Z0-9]*[\-.@#_+]?[a-zA-Z0-9]*[\-.@#_+]?[a-zA-Z0-9]*$";

pub const DEADLINE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid tag '{0}': {}", TAG_CONSTRAINTS)]
    InvalidTag(String),
    #[error("{0} cannot be empty")]
    BlankField(&'static str),
    #[error("maximum number of tags per application is {}, got {0}", MAX_TAGS)]
    TooManyTags(usize),
    #[error("This job application already exists in the job book")]
    DuplicateApplication,
    #[error("The job application could not be found")]
    ApplicationNotFound,
    #[error(
        "Cannot add tags: this application would exceed {} tags (the maximum allowed). \
Please remove some tags using 'untag' before adding new ones.",
        MAX_TAGS
    )]
    TagCapacityExceeded,
    #[error("Cannot remove tags: {} not present on this application", format_names(.0))]
    TagNotFound(Vec<String>),
}

fn format_names(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("[{}]", n))
        .collect::<Vec<_>>()
        .join("")
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(TAG_PATTERN).expect("tag pattern is valid"))
}

/// A short, validated label attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let name = raw.trim();
        if Self::is_valid_name(name) {
            Ok(Tag(name.to_string()))
        } else {
            Err(ModelError::InvalidTag(name.to_string()))
        }
    }

    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.chars().count() <= MAX_TAG_LENGTH && tag_regex().is_match(name)
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Applied,
    InProgress,
    Rejected,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid status '{0}'. Valid values are: APPLIED, INPROGRESS, REJECTED")]
pub struct InvalidStatus(pub String);

impl Status {
    pub const ALL: [Status; 3] = [Status::Applied, Status::InProgress, Status::Rejected];

    pub fn name(self) -> &'static str {
        match self {
            Status::Applied => "APPLIED",
            Status::InProgress => "INPROGRESS",
            Status::Rejected => "REJECTED",
        }
    }
}

impl FromStr for Status {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InvalidStatus(wanted.to_string()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tracked job application.
///
/// Records are values: every change builds a new record which then replaces
/// the old one in the collection. `PartialEq` is the strong equality over
/// company, role, deadline and status (tags are not compared);
/// [`JobApplication::is_same_application`] is the weaker identity check on
/// company and role that governs duplicates.
#[derive(Debug, Clone)]
pub struct JobApplication {
    company_name: String,
    role: String,
    deadline: NaiveDateTime,
    status: Status,
    tags: BTreeSet<Tag>,
}

impl PartialEq for JobApplication {
    fn eq(&self, other: &Self) -> bool {
        self.company_name == other.company_name
            && self.role == other.role
            && self.deadline == other.deadline
            && self.status == other.status
    }
}

impl Eq for JobApplication {}

impl JobApplication {
    pub fn new(
        company_name: impl Into<String>,
        role: impl Into<String>,
        deadline: NaiveDateTime,
        status: Status,
        tags: BTreeSet<Tag>,
    ) -> Result<Self, ModelError> {
        let company_name = company_name.into().trim().to_string();
        let role = role.into().trim().to_string();
        if company_name.is_empty() {
            return Err(ModelError::BlankField("company name"));
        }
        if role.is_empty() {
            return Err(ModelError::BlankField("role"));
        }
        if tags.len() > MAX_TAGS {
            return Err(ModelError::TooManyTags(tags.len()));
        }
        Ok(JobApplication {
            company_name,
            role,
            deadline,
            status,
            tags,
        })
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn deadline(&self) -> NaiveDateTime {
        self.deadline
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    pub fn is_same_application(&self, other: &JobApplication) -> bool {
        self.company_name == other.company_name && self.role == other.role
    }

    pub fn has_capacity_for(&self, new_tags: &BTreeSet<Tag>) -> bool {
        self.tags.union(new_tags).count() <= MAX_TAGS
    }

    pub fn with_tags_added(&self, new_tags: &BTreeSet<Tag>) -> Result<Self, ModelError> {
        if !self.has_capacity_for(new_tags) {
            return Err(ModelError::TagCapacityExceeded);
        }
        let mut updated = self.clone();
        updated.tags.extend(new_tags.iter().cloned());
        Ok(updated)
    }

    /// Removes every tag in `to_remove`, or none of them if any is absent.
    pub fn with_tags_removed(&self, to_remove: &BTreeSet<Tag>) -> Result<Self, ModelError> {
        let missing = to_remove
            .difference(&self.tags)
            .map(|tag| tag.name().to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(ModelError::TagNotFound(missing));
        }
        let mut updated = self.clone();
        updated.tags.retain(|tag| !to_remove.contains(tag));
        Ok(updated)
    }

    pub fn format_deadline(&self) -> String {
        self.deadline.format(DEADLINE_DISPLAY_FORMAT).to_string()
    }
}

impl fmt::Display for JobApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; Role: {}; Status: {}; Deadline: {}",
            self.company_name,
            self.role,
            self.status,
            self.format_deadline()
        )?;
        if !self.tags.is_empty() {
            f.write_str("; Tags: ")?;
            for tag in &self.tags {
                write!(f, "{}", tag)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(23, 59, 0))
            .expect("valid test date")
    }

    pub(crate) fn tags(names: &[&str]) -> BTreeSet<Tag> {
        names
            .iter()
            .map(|n| Tag::parse(n).expect("valid test tag"))
            .collect()
    }

    pub(crate) fn app(company: &str, role: &str, deadline: NaiveDateTime) -> JobApplication {
        JobApplication::new(company, role, deadline, Status::Applied, BTreeSet::new())
            .expect("valid test application")
    }

    #[test]
    fn tag_accepts_words_with_up_to_two_specials() {
        for name in ["python", "6-Month", "c++", "on-site", "a.b@c", "Remote2025"] {
            assert!(Tag::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn tag_rejects_whitespace_symbols_and_overlong_names() {
        for name in ["", "   ", "two words", "a-b-c-d", "wow!", "++a++"] {
            assert!(Tag::parse(name).is_err(), "{name:?} should be invalid");
        }
        assert!(Tag::parse(&"a".repeat(30)).is_ok());
        assert!(Tag::parse(&"a".repeat(31)).is_err());
    }

    #[test]
    fn tag_name_is_trimmed() {
        assert_eq!(Tag::parse("  intern ").unwrap(), Tag::parse("intern").unwrap());
        assert_eq!(Tag::parse("intern").unwrap().to_string(), "[intern]");
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("applied".parse::<Status>().unwrap(), Status::Applied);
        assert_eq!("InProgress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!(" REJECTED ".parse::<Status>().unwrap(), Status::Rejected);
        assert!("pending".parse::<Status>().is_err());
    }

    #[test]
    fn blank_identity_fields_are_rejected() {
        let err = JobApplication::new(" ", "SWE", at(2025, 1, 1), Status::Applied, BTreeSet::new());
        assert_eq!(err, Err(ModelError::BlankField("company name")));
        let err = JobApplication::new("Google", "", at(2025, 1, 1), Status::Applied, BTreeSet::new());
        assert_eq!(err, Err(ModelError::BlankField("role")));
    }

    #[test]
    fn more_than_three_tags_are_rejected() {
        let err = JobApplication::new(
            "Google",
            "SWE",
            at(2025, 1, 1),
            Status::Applied,
            tags(&["a", "b", "c", "d"]),
        );
        assert_eq!(err, Err(ModelError::TooManyTags(4)));
    }

    #[test]
    fn weak_equality_ignores_data_fields() {
        let a = app("Google", "SWE", at(2025, 12, 31));
        let b = JobApplication::new("Google", "SWE", at(2026, 1, 1), Status::Rejected, tags(&["x"]))
            .unwrap();
        assert!(a.is_same_application(&b));
        assert_ne!(a, b);
        assert!(!a.is_same_application(&app("Google", "Backend", at(2025, 12, 31))));
    }

    #[test]
    fn strong_equality_ignores_tags() {
        let plain = app("Google", "SWE", at(2025, 12, 31));
        let tagged = plain.with_tags_added(&tags(&["remote"])).unwrap();
        assert_eq!(plain, tagged);
        let rejected =
            JobApplication::new("Google", "SWE", at(2025, 12, 31), Status::Rejected, tags(&[]))
                .unwrap();
        assert_ne!(plain, rejected);
    }

    #[test]
    fn adding_tags_beyond_capacity_fails() {
        let base = app("Google", "SWE", at(2025, 12, 31))
            .with_tags_added(&tags(&["a", "b"]))
            .unwrap();
        assert_eq!(
            base.with_tags_added(&tags(&["c", "d"])),
            Err(ModelError::TagCapacityExceeded)
        );
        // overlapping tags count once
        let full = base.with_tags_added(&tags(&["a", "c"])).unwrap();
        assert_eq!(full.tags(), &tags(&["a", "b", "c"]));
        assert_eq!(base.tags(), &tags(&["a", "b"]));
    }

    #[test]
    fn removing_tags_is_all_or_nothing() {
        let base = app("Google", "SWE", at(2025, 12, 31))
            .with_tags_added(&tags(&["java", "remote"]))
            .unwrap();
        assert_eq!(
            base.with_tags_removed(&tags(&["java", "python"])),
            Err(ModelError::TagNotFound(vec!["python".to_string()]))
        );
        let trimmed = base.with_tags_removed(&tags(&["java"])).unwrap();
        assert_eq!(trimmed.tags(), &tags(&["remote"]));
    }

    #[test]
    fn display_includes_tags() {
        let job = app("Meta", "Backend", at(2025, 11, 30))
            .with_tags_added(&tags(&["rust"]))
            .unwrap();
        assert_eq!(
            job.to_string(),
            "Meta; Role: Backend; Status: APPLIED; Deadline: 2025-11-30 23:59; Tags: [rust]"
        );
    }
}
