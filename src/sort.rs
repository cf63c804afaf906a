use crate::model::JobApplication;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Deadline,
    Company,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SortKeyError {
    #[error("Unknown sort field: {0}")]
    Field(String),
    #[error("Unknown sort order: {0}")]
    Order(String),
}

impl FromStr for SortField {
    type Err = SortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deadline" => Ok(SortField::Deadline),
            "company" => Ok(SortField::Company),
            "role" => Ok(SortField::Role),
            _ => Err(SortKeyError::Field(s.trim().to_string())),
        }
    }
}

impl FromStr for SortOrder {
    type Err = SortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(SortKeyError::Order(s.trim().to_string())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortField::Deadline => "deadline",
            SortField::Company => "company",
            SortField::Role => "role",
        })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

fn by_company(a: &JobApplication, b: &JobApplication) -> Ordering {
    fold(a.company_name()).cmp(&fold(b.company_name()))
}

fn by_role(a: &JobApplication, b: &JobApplication) -> Ordering {
    fold(a.role()).cmp(&fold(b.role()))
}

fn by_deadline(a: &JobApplication, b: &JobApplication) -> Ordering {
    a.deadline().cmp(&b.deadline())
}

fn by_exact_identity(a: &JobApplication, b: &JobApplication) -> Ordering {
    a.company_name()
        .cmp(b.company_name())
        .then_with(|| a.role().cmp(b.role()))
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Total ordering for `field` over applications with distinct identities: the
/// requested key first, then a fixed tie-break chain ending on the exact
/// company and role.
pub fn compare(field: SortField, a: &JobApplication, b: &JobApplication) -> Ordering {
    let ordering = match field {
        SortField::Deadline => by_deadline(a, b)
            .then_with(|| by_company(a, b))
            .then_with(|| by_role(a, b)),
        SortField::Company => by_company(a, b)
            .then_with(|| by_role(a, b))
            .then_with(|| by_deadline(a, b)),
        SortField::Role => by_role(a, b)
            .then_with(|| by_company(a, b))
            .then_with(|| by_deadline(a, b)),
    };
    ordering.then_with(|| by_exact_identity(a, b))
}

/// Stable in-place sort. `Desc` reverses the whole composite comparator.
pub fn sort_applications(applications: &mut [JobApplication], field: SortField, order: SortOrder) {
    match order {
        SortOrder::Asc => applications.sort_by(|a, b| compare(field, a, b)),
        SortOrder::Desc => applications.sort_by(|a, b| compare(field, b, a)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{app, at};

    fn names(apps: &[JobApplication]) -> Vec<String> {
        apps.iter()
            .map(|a| format!("{}/{}", a.company_name(), a.role()))
            .collect()
    }

    fn sample() -> Vec<JobApplication> {
        vec![
            app("Google", "SWE", at(2025, 12, 31)),
            app("meta", "Backend", at(2025, 11, 30)),
            app("Amazon", "SWE", at(2025, 11, 30)),
            app("Google", "Backend", at(2025, 10, 1)),
            app("Meta", "Alpha", at(2026, 1, 1)),
        ]
    }

    #[test]
    fn parses_fields_and_orders() {
        assert_eq!("Deadline".parse::<SortField>(), Ok(SortField::Deadline));
        assert_eq!("company".parse::<SortField>(), Ok(SortField::Company));
        assert_eq!("ROLE".parse::<SortField>(), Ok(SortField::Role));
        assert_eq!(
            "salary".parse::<SortField>(),
            Err(SortKeyError::Field("salary".into()))
        );
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn deadline_ties_break_on_company_then_role() {
        let mut apps = sample();
        sort_applications(&mut apps, SortField::Deadline, SortOrder::Asc);
        assert_eq!(
            names(&apps),
            vec![
                "Google/Backend",
                "Amazon/SWE",
                "meta/Backend",
                "Google/SWE",
                "Meta/Alpha"
            ]
        );
    }

    #[test]
    fn company_sort_is_case_insensitive_with_role_tie_break() {
        let mut apps = sample();
        sort_applications(&mut apps, SortField::Company, SortOrder::Asc);
        assert_eq!(
            names(&apps),
            vec![
                "Amazon/SWE",
                "Google/Backend",
                "Google/SWE",
                "Meta/Alpha",
                "meta/Backend"
            ]
        );
    }

    #[test]
    fn descending_reverses_the_whole_chain() {
        let mut asc = sample();
        sort_applications(&mut asc, SortField::Role, SortOrder::Asc);
        let mut desc = sample();
        sort_applications(&mut desc, SortField::Role, SortOrder::Desc);
        asc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn sorting_is_idempotent() {
        for field in [SortField::Deadline, SortField::Company, SortField::Role] {
            for order in [SortOrder::Asc, SortOrder::Desc] {
                let mut once = sample();
                sort_applications(&mut once, field, order);
                let mut twice = once.clone();
                sort_applications(&mut twice, field, order);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn result_does_not_depend_on_input_order() {
        let mut first = sample();
        sort_applications(&mut first, SortField::Company, SortOrder::Asc);
        let expected = first.clone();
        sort_applications(&mut first, SortField::Role, SortOrder::Asc);
        sort_applications(&mut first, SortField::Company, SortOrder::Asc);
        assert_eq!(first, expected);

        let mut reversed = sample();
        reversed.reverse();
        sort_applications(&mut reversed, SortField::Company, SortOrder::Asc);
        assert_eq!(reversed, expected);
    }

    #[test]
    fn case_variant_companies_sort_the_same_from_any_input_order() {
        let upper = app("Google", "SWE", at(2025, 12, 31));
        let lower = app("google", "SWE", at(2025, 12, 31));
        for field in [SortField::Deadline, SortField::Company, SortField::Role] {
            for order in [SortOrder::Asc, SortOrder::Desc] {
                let mut forward = vec![upper.clone(), lower.clone()];
                let mut backward = vec![lower.clone(), upper.clone()];
                sort_applications(&mut forward, field, order);
                sort_applications(&mut backward, field, order);
                assert_eq!(names(&forward), names(&backward), "{field} {order}");
            }
        }

        let mut apps = vec![lower.clone(), upper.clone()];
        sort_applications(&mut apps, SortField::Deadline, SortOrder::Asc);
        assert_eq!(names(&apps), vec!["Google/SWE", "google/SWE"]);
    }
}
