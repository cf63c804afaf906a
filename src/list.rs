use crate::model::{JobApplication, ModelError};
use crate::sort::{sort_applications, SortField, SortOrder};
use std::collections::HashSet;

/// Ordered applications with no two sharing a company/role identity.
///
/// Insertion and replacement check identity with
/// [`JobApplication::is_same_application`]; removal and replacement targets are
/// located by strong equality so that the exact record is affected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueApplicationList {
    applications: Vec<JobApplication>,
}

impl UniqueApplicationList {
    pub fn contains(&self, candidate: &JobApplication) -> bool {
        self.applications
            .iter()
            .any(|existing| existing.is_same_application(candidate))
    }

    pub fn add(&mut self, application: JobApplication) -> Result<(), ModelError> {
        if self.contains(&application) {
            return Err(ModelError::DuplicateApplication);
        }
        self.applications.push(application);
        Ok(())
    }

    pub fn replace(
        &mut self,
        target: &JobApplication,
        replacement: JobApplication,
    ) -> Result<(), ModelError> {
        let idx = self
            .position(target)
            .ok_or(ModelError::ApplicationNotFound)?;
        let collides = self
            .applications
            .iter()
            .enumerate()
            .any(|(i, existing)| i != idx && existing.is_same_application(&replacement));
        if collides {
            return Err(ModelError::DuplicateApplication);
        }
        self.applications[idx] = replacement;
        Ok(())
    }

    pub fn remove(&mut self, target: &JobApplication) -> Result<JobApplication, ModelError> {
        let idx = self
            .position(target)
            .ok_or(ModelError::ApplicationNotFound)?;
        Ok(self.applications.remove(idx))
    }

    /// Swaps in a whole new list; on failure the current contents are kept.
    pub fn bulk_replace(&mut self, applications: Vec<JobApplication>) -> Result<(), ModelError> {
        if !applications_are_unique(&applications) {
            return Err(ModelError::DuplicateApplication);
        }
        self.applications = applications;
        Ok(())
    }

    pub fn sort(&mut self, field: SortField, order: SortOrder) {
        sort_applications(&mut self.applications, field, order);
    }

    pub fn as_slice(&self) -> &[JobApplication] {
        &self.applications
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JobApplication> {
        self.applications.iter()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    fn position(&self, target: &JobApplication) -> Option<usize> {
        self.applications.iter().position(|existing| existing == target)
    }
}

pub fn applications_are_unique(applications: &[JobApplication]) -> bool {
    let mut seen = HashSet::with_capacity(applications.len());
    applications
        .iter()
        .all(|application| seen.insert((application.company_name(), application.role())))
}
