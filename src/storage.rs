use crate::datetime;
use crate::list::applications_are_unique;
use crate::model::{JobApplication, Status, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEADLINE_STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Persistence boundary for the job book so the logic layer can run against
/// any backing store.
pub trait ApplicationStorage {
    fn path(&self) -> &Path;
    fn load(&self) -> Result<Vec<JobApplication>, StorageError>;
    fn save(&self, applications: &[JobApplication]) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("permission denied while accessing {}", .path.display())]
    PermissionDenied { path: PathBuf, source: io::Error },
    #[error("could not access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Job Application's {0} field is missing!")]
    MissingField(&'static str),
    #[error("Illegal value in data file: {0}")]
    IllegalValue(String),
    #[error("Job applications list contains duplicate job application(s).")]
    DuplicateApplication,
    #[error("malformed data file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize job applications: {0}")]
    Serialize(#[source] serde_json::Error),
}

fn io_error(path: &Path, source: io::Error) -> StorageError {
    let path = path.to_path_buf();
    if source.kind() == io::ErrorKind::PermissionDenied {
        StorageError::PermissionDenied { path, source }
    } else {
        StorageError::Io { path, source }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerializableJobBook {
    #[serde(default)]
    job_applications: Vec<SerializableJobApplication>,
}

/// On-disk shape of one application. Every field is optional here so that a
/// missing one can be reported by name instead of as a generic JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerializableJobApplication {
    company_name: Option<String>,
    role: Option<String>,
    deadline: Option<String>,
    status: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl From<&JobApplication> for SerializableJobApplication {
    fn from(application: &JobApplication) -> Self {
        SerializableJobApplication {
            company_name: Some(application.company_name().to_string()),
            role: Some(application.role().to_string()),
            deadline: Some(
                application
                    .deadline()
                    .format(DEADLINE_STORAGE_FORMAT)
                    .to_string(),
            ),
            status: Some(application.status().name().to_string()),
            tags: application
                .tags()
                .iter()
                .map(|tag| tag.name().to_string())
                .collect(),
        }
    }
}

impl SerializableJobApplication {
    fn to_model(&self) -> Result<JobApplication, StorageError> {
        let company_name = self
            .company_name
            .as_deref()
            .ok_or(StorageError::MissingField("Company Name"))?;
        let role = self
            .role
            .as_deref()
            .ok_or(StorageError::MissingField("Role"))?;
        let deadline_text = self
            .deadline
            .as_deref()
            .ok_or(StorageError::MissingField("Deadline"))?;
        let status_text = self
            .status
            .as_deref()
            .ok_or(StorageError::MissingField("Status"))?;

        let deadline = datetime::parse_iso_date_time(deadline_text).ok_or_else(|| {
            StorageError::IllegalValue(format!("invalid deadline '{}'", deadline_text))
        })?;
        let status = status_text
            .parse::<Status>()
            .map_err(|err| StorageError::IllegalValue(err.to_string()))?;
        let tags = self
            .tags
            .iter()
            .map(|name| Tag::parse(name))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|err| StorageError::IllegalValue(err.to_string()))?;

        JobApplication::new(company_name, role, deadline, status, tags)
            .map_err(|err| StorageError::IllegalValue(err.to_string()))
    }
}

/// Stores the job book as a single pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage { path: path.into() }
    }
}

impl ApplicationStorage for JsonFileStorage {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<JobApplication>, StorageError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no data file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(io_error(&self.path, err)),
        };
        let book: SerializableJobBook =
            serde_json::from_str(&data).map_err(|source| StorageError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        let applications = book
            .job_applications
            .iter()
            .map(SerializableJobApplication::to_model)
            .collect::<Result<Vec<_>, _>>()?;
        if !applications_are_unique(&applications) {
            return Err(StorageError::DuplicateApplication);
        }
        debug!(count = applications.len(), "loaded job applications");
        Ok(applications)
    }

    fn save(&self, applications: &[JobApplication]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;
        }
        let book = SerializableJobBook {
            job_applications: applications.iter().map(Into::into).collect(),
        };
        let serialized = serde_json::to_string_pretty(&book).map_err(StorageError::Serialize)?;
        fs::write(&self.path, serialized).map_err(|err| io_error(&self.path, err))?;
        debug!(count = applications.len(), path = %self.path.display(), "saved job applications");
        Ok(())
    }
}
