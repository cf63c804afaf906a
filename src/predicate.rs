use crate::model::{JobApplication, Status};
use chrono::NaiveDate;
use std::fmt;

/// Boolean tests over an application that drive the filtered view.
///
/// Keyword variants hold lower-cased text, so two predicates built from the
/// same keywords compare equal regardless of the input case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApplicationPredicate {
    #[default]
    ShowAll,
    CompanyKeywords(Vec<String>),
    RoleContains(String),
    TagContains(String),
    StatusMatches(Status),
    DeadlineOn(NaiveDate),
}

impl ApplicationPredicate {
    pub fn company_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        ApplicationPredicate::CompanyKeywords(keywords)
    }

    pub fn role_contains(keyword: &str) -> Self {
        ApplicationPredicate::RoleContains(keyword.trim().to_lowercase())
    }

    pub fn tag_contains(keyword: &str) -> Self {
        ApplicationPredicate::TagContains(keyword.trim().to_lowercase())
    }

    pub fn test(&self, application: &JobApplication) -> bool {
        match self {
            ApplicationPredicate::ShowAll => true,
            ApplicationPredicate::CompanyKeywords(keywords) => keywords
                .iter()
                .any(|keyword| contains_word_ignore_case(application.company_name(), keyword)),
            ApplicationPredicate::RoleContains(keyword) => application
                .role()
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
            ApplicationPredicate::TagContains(keyword) => {
                let keyword = keyword.to_lowercase();
                application
                    .tags()
                    .iter()
                    .any(|tag| tag.name().to_lowercase().contains(&keyword))
            }
            ApplicationPredicate::StatusMatches(status) => application.status() == *status,
            ApplicationPredicate::DeadlineOn(date) => application.deadline().date() == *date,
        }
    }

    pub fn is_show_all(&self) -> bool {
        matches!(self, ApplicationPredicate::ShowAll)
    }
}

fn contains_word_ignore_case(sentence: &str, word: &str) -> bool {
    sentence
        .split_whitespace()
        .any(|candidate| candidate.to_lowercase() == word.to_lowercase())
}

impl fmt::Display for ApplicationPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationPredicate::ShowAll => f.write_str("all"),
            ApplicationPredicate::CompanyKeywords(keywords) => {
                write!(f, "company ~ {}", keywords.join(" | "))
            }
            ApplicationPredicate::RoleContains(keyword) => write!(f, "role contains '{}'", keyword),
            ApplicationPredicate::TagContains(keyword) => write!(f, "tag contains '{}'", keyword),
            ApplicationPredicate::StatusMatches(status) => write!(f, "status {}", status),
            ApplicationPredicate::DeadlineOn(date) => write!(f, "due {}", date.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{app, at, tags};

    #[test]
    fn company_keywords_match_whole_words_only() {
        let job = app("Jane Street Capital", "Quant", at(2025, 12, 31));
        assert!(ApplicationPredicate::company_keywords(["street"]).test(&job));
        assert!(ApplicationPredicate::company_keywords(["", "nope", "CAPITAL"]).test(&job));
        assert!(!ApplicationPredicate::company_keywords(["Stre"]).test(&job));
        assert!(!ApplicationPredicate::company_keywords(Vec::<String>::new()).test(&job));
    }

    #[test]
    fn empty_keywords_are_dropped() {
        assert_eq!(
            ApplicationPredicate::company_keywords(["", "Google", " "]),
            ApplicationPredicate::CompanyKeywords(vec!["google".into()])
        );
    }

    #[test]
    fn role_and_tag_match_substrings_case_insensitively() {
        let job = app("Google", "Software Engineer", at(2025, 12, 31))
            .with_tags_added(&tags(&["Remote-First"]))
            .unwrap();
        assert!(ApplicationPredicate::role_contains("ENGINE").test(&job));
        assert!(!ApplicationPredicate::role_contains("manager").test(&job));
        assert!(ApplicationPredicate::tag_contains("remote").test(&job));
        assert!(!ApplicationPredicate::tag_contains("python").test(&job));
        assert_eq!(
            ApplicationPredicate::tag_contains("Remote"),
            ApplicationPredicate::tag_contains("remote")
        );
    }

    #[test]
    fn status_and_deadline_predicates() {
        let job = app("Google", "SWE", at(2025, 12, 31));
        assert!(ApplicationPredicate::StatusMatches(Status::Applied).test(&job));
        assert!(!ApplicationPredicate::StatusMatches(Status::Rejected).test(&job));
        let day = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert!(ApplicationPredicate::DeadlineOn(day).test(&job));
        assert!(!ApplicationPredicate::DeadlineOn(day.succ_opt().unwrap()).test(&job));
    }
}
