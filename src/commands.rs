use crate::book::JobBook;
use crate::model::{JobApplication, ModelError, Status, Tag};
use crate::predicate::ApplicationPredicate;
use crate::sort::{SortField, SortOrder};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use tracing::{debug, info};

pub const ADD_USAGE: &str = "add: Adds a job application to the job book.\n\
Parameters: n/COMPANY_NAME r/ROLE s/STATUS [d/DEADLINE] [t/TAG]...\n\
Note: Deadline is optional. If omitted, defaults to today at 23:59.\n\
Supported date formats: yyyy-MM-dd, yyyy-MM-ddTHH:mm, MM-dd, dd MMM, dd MMMM, etc.\n\
Example: add n/Google r/SoftwareEngineer s/APPLIED d/2025-12-31 t/remote";

pub const DELETE_USAGE: &str = "delete: Deletes the application identified by the index number in the displayed list.\n\
Parameters: INDEX (must be a positive integer)\n\
Example: delete 1";

pub const UPDATE_USAGE: &str = "update: Updates the application identified by the index number in the displayed list. \
Existing values will be overwritten by the input values.\n\
Parameters: INDEX (must be a positive integer) [n/COMPANY_NAME] [r/ROLE] [s/STATUS] [d/DEADLINE] [t/TAG]...\n\
Use a single empty t/ to clear all tags.\n\
Example: update 1 s/INPROGRESS d/2025-12-31T17:00";

pub const TAG_USAGE: &str = "tag: Tags a job application.\n\
Parameters: INDEX t/TAG [t/TAG]...\n\
Example: tag 1 t/Intern t/Summer t/on-site";

pub const UNTAG_USAGE: &str = "untag: Removes tags from a job application.\n\
Parameters: INDEX t/TAG [t/TAG]...\n\
Example: untag 1 t/Intern t/Summer";

pub const FILTER_USAGE: &str = "filter: Filters job applications by exactly one of tag, status, deadline or role.\n\
Parameters: t/KEYWORD | s/STATUS | d/yyyy-MM-dd | r/KEYWORD | none\n\
Tag and role filters match if the keyword is contained in the field (case-insensitive).\n\
Deadline filter matches by date only, ignoring time.\n\
Examples: filter t/remote, filter s/APPLIED, filter d/2025-12-31, filter none";

pub const FIND_USAGE: &str = "find: Lists applications whose company name contains any of the given words.\n\
Parameters: KEYWORD [KEYWORD]...\n\
Example: find google meta";

pub const LIST_USAGE: &str = "list: Lists all job applications.\nExample: list";

pub const SORT_USAGE: &str = "sort: Sorts applications by a field.\n\
Parameters: FIELD [ORDER]\n\
  FIELD: deadline | company | role\n\
  ORDER (optional): asc | desc (default: asc)\n\
Examples: sort deadline, sort company desc";

pub const CLEAR_USAGE: &str = "clear: Deletes every job application.\nExample: clear";

pub const HELP_USAGE: &str = "help: Shows the command summary.\nExample: help";

pub const SAVE_USAGE: &str = "save: Saves all job applications to the data file.\nExample: save";

pub const EXIT_USAGE: &str = "exit: Saves and exits the program.\nExample: exit";

pub const ALL_USAGES: [&str; 13] = [
    ADD_USAGE,
    DELETE_USAGE,
    UPDATE_USAGE,
    TAG_USAGE,
    UNTAG_USAGE,
    FILTER_USAGE,
    FIND_USAGE,
    LIST_USAGE,
    SORT_USAGE,
    CLEAR_USAGE,
    HELP_USAGE,
    SAVE_USAGE,
    EXIT_USAGE,
];

pub fn help_text() -> String {
    ALL_USAGES.join("\n\n")
}

/// A 1-based position in the displayed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayIndex(NonZeroUsize);

impl DisplayIndex {
    pub fn new(one_based: usize) -> Option<Self> {
        NonZeroUsize::new(one_based).map(DisplayIndex)
    }

    pub fn zero_based(self) -> usize {
        self.0.get() - 1
    }
}

/// Fields to overwrite on an existing application; `None` keeps the original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateDescriptor {
    pub company_name: Option<String>,
    pub role: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub status: Option<Status>,
    pub tags: Option<BTreeSet<Tag>>,
}

impl UpdateDescriptor {
    pub fn is_any_field_updated(&self) -> bool {
        self.company_name.is_some()
            || self.role.is_some()
            || self.deadline.is_some()
            || self.status.is_some()
            || self.tags.is_some()
    }

    pub fn apply(&self, original: &JobApplication) -> Result<JobApplication, ModelError> {
        JobApplication::new(
            self.company_name
                .clone()
                .unwrap_or_else(|| original.company_name().to_string()),
            self.role
                .clone()
                .unwrap_or_else(|| original.role().to_string()),
            self.deadline.unwrap_or_else(|| original.deadline()),
            self.status.unwrap_or_else(|| original.status()),
            self.tags.clone().unwrap_or_else(|| original.tags().clone()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub message: String,
    pub should_persist: bool,
    pub should_exit: bool,
    pub should_show_help: bool,
}

impl CommandResult {
    fn new(message: impl Into<String>) -> Self {
        CommandResult {
            message: message.into(),
            should_persist: false,
            should_exit: false,
            should_show_help: false,
        }
    }

    fn persisted(message: impl Into<String>) -> Self {
        CommandResult {
            should_persist: true,
            ..CommandResult::new(message)
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("The application index provided is invalid")]
    InvalidIndex,
    #[error("At least one field to update must be provided.")]
    NoFieldsSpecified,
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(JobApplication),
    Delete(DisplayIndex),
    Update {
        index: DisplayIndex,
        descriptor: UpdateDescriptor,
    },
    Tag {
        index: DisplayIndex,
        tags: BTreeSet<Tag>,
    },
    Untag {
        index: DisplayIndex,
        tags: BTreeSet<Tag>,
    },
    Filter(ApplicationPredicate),
    Sort {
        field: SortField,
        order: SortOrder,
    },
    Clear,
    Help,
    Save,
    Exit,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Delete(_) => "delete",
            Command::Update { .. } => "update",
            Command::Tag { .. } => "tag",
            Command::Untag { .. } => "untag",
            Command::Filter(_) => "filter",
            Command::Sort { .. } => "sort",
            Command::Clear => "clear",
            Command::Help => "help",
            Command::Save => "save",
            Command::Exit => "exit",
        }
    }

    /// Runs the command against `book`. On error the book is left untouched.
    pub fn execute(&self, book: &mut JobBook) -> Result<CommandResult, CommandError> {
        info!(command = self.name(), "executing command");
        match self {
            Command::Add(application) => {
                book.add(application.clone())?;
                Ok(CommandResult::persisted(format!(
                    "New job application added: {}",
                    application
                )))
            }
            Command::Delete(index) => {
                let target = resolve(book, *index)?;
                let removed = book.remove(&target)?;
                Ok(CommandResult::persisted(format!(
                    "Deleted Application: {}",
                    removed
                )))
            }
            Command::Update { index, descriptor } => {
                if !descriptor.is_any_field_updated() {
                    return Err(CommandError::NoFieldsSpecified);
                }
                let target = resolve(book, *index)?;
                let updated = descriptor.apply(&target)?;
                book.replace(&target, updated.clone())?;
                book.set_filter(ApplicationPredicate::ShowAll);
                Ok(CommandResult::persisted(format!(
                    "Updated Job Application: {}",
                    updated
                )))
            }
            Command::Tag { index, tags } => {
                let target = resolve(book, *index)?;
                let updated = target.with_tags_added(tags)?;
                book.replace(&target, updated)?;
                Ok(CommandResult::persisted("Application has been tagged!"))
            }
            Command::Untag { index, tags } => {
                let target = resolve(book, *index)?;
                let updated = target.with_tags_removed(tags)?;
                book.replace(&target, updated)?;
                Ok(CommandResult::persisted("Tags have been removed!"))
            }
            Command::Filter(predicate) => {
                book.set_filter(predicate.clone());
                debug!(filter = %predicate, "filter updated");
                Ok(CommandResult::new(format!(
                    "{} applications listed!",
                    book.view_len()
                )))
            }
            Command::Sort { field, order } => {
                book.sort(*field, *order);
                Ok(CommandResult::persisted(format!(
                    "Sorted Application by {} ({}).",
                    field, order
                )))
            }
            Command::Clear => {
                book.reset(Vec::new())?;
                Ok(CommandResult::persisted("Job book has been cleared!"))
            }
            Command::Help => Ok(CommandResult {
                should_show_help: true,
                ..CommandResult::new("Opened help window.")
            }),
            Command::Save => Ok(CommandResult::persisted(
                "Saved job applications successfully!",
            )),
            Command::Exit => Ok(CommandResult {
                should_exit: true,
                ..CommandResult::persisted("Exiting HustleHub as requested ...")
            }),
        }
    }
}

fn resolve(book: &JobBook, index: DisplayIndex) -> Result<JobApplication, CommandError> {
    book.view_get(index.zero_based())
        .cloned()
        .ok_or(CommandError::InvalidIndex)
}
