use crate::list::UniqueApplicationList;
use crate::model::{JobApplication, ModelError};
use crate::predicate::ApplicationPredicate;
use crate::sort::{SortField, SortOrder};

/// The in-memory job book: the authoritative list plus the active filter.
///
/// The view is never stored; it is recomputed from the list and the predicate
/// every time it is read, so it cannot drift from the underlying data.
#[derive(Debug, Clone, Default)]
pub struct JobBook {
    applications: UniqueApplicationList,
    filter: ApplicationPredicate,
}

impl JobBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_applications(applications: Vec<JobApplication>) -> Result<Self, ModelError> {
        let mut book = JobBook::new();
        book.applications.bulk_replace(applications)?;
        Ok(book)
    }

    pub fn applications(&self) -> &[JobApplication] {
        self.applications.as_slice()
    }

    pub fn add(&mut self, application: JobApplication) -> Result<(), ModelError> {
        self.applications.add(application)
    }

    pub fn replace(
        &mut self,
        target: &JobApplication,
        replacement: JobApplication,
    ) -> Result<(), ModelError> {
        self.applications.replace(target, replacement)
    }

    pub fn remove(&mut self, target: &JobApplication) -> Result<JobApplication, ModelError> {
        self.applications.remove(target)
    }

    pub fn reset(&mut self, applications: Vec<JobApplication>) -> Result<(), ModelError> {
        self.applications.bulk_replace(applications)
    }

    pub fn sort(&mut self, field: SortField, order: SortOrder) {
        self.applications.sort(field, order);
    }

    pub fn filter(&self) -> &ApplicationPredicate {
        &self.filter
    }

    pub fn set_filter(&mut self, predicate: ApplicationPredicate) {
        self.filter = predicate;
    }

    pub fn view(&self) -> Vec<&JobApplication> {
        self.applications
            .iter()
            .filter(|application| self.filter.test(application))
            .collect()
    }

    /// Looks up a zero-based position in the current view.
    pub fn view_get(&self, zero_based: usize) -> Option<&JobApplication> {
        self.applications
            .iter()
            .filter(|application| self.filter.test(application))
            .nth(zero_based)
    }

    pub fn view_len(&self) -> usize {
        self.applications
            .iter()
            .filter(|application| self.filter.test(application))
            .count()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{app, at};
    use crate::model::Status;

    #[test]
    fn view_follows_filter_and_underlying_changes() {
        let mut book = JobBook::with_applications(vec![
            app("Google", "SWE", at(2025, 12, 31)),
            app("Meta", "Backend", at(2025, 11, 30)),
        ])
        .unwrap();
        book.set_filter(ApplicationPredicate::company_keywords(["meta"]));
        assert_eq!(book.view_len(), 1);
        assert_eq!(book.view_get(0).map(|a| a.company_name()), Some("Meta"));
        assert!(book.view_get(1).is_none());

        book.add(app("Meta", "Frontend", at(2026, 1, 1))).unwrap();
        assert_eq!(book.view_len(), 2);
        assert_eq!(book.len(), 3);

        book.set_filter(ApplicationPredicate::StatusMatches(Status::Rejected));
        assert!(book.view().is_empty());
        book.set_filter(ApplicationPredicate::ShowAll);
        assert_eq!(book.view().len(), 3);
    }

    #[test]
    fn duplicate_initial_data_is_rejected() {
        let result = JobBook::with_applications(vec![
            app("Google", "SWE", at(2025, 12, 31)),
            app("Google", "SWE", at(2026, 12, 31)),
        ]);
        assert_eq!(result.err(), Some(ModelError::DuplicateApplication));
    }
}
