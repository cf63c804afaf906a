use crate::book::JobBook;
use crate::commands::{CommandError, CommandResult};
use crate::model::JobApplication;
use crate::parser::{parse_command, ParseError};
use crate::storage::{ApplicationStorage, StorageError};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LogicError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Command(#[from] CommandError),
    /// The command ran and its change stands; only writing it out failed.
    #[error("{}\nCould not save data to file: {source}", .result.message)]
    Persist {
        result: CommandResult,
        source: StorageError,
    },
}

/// Owns the job book and its storage, and runs command lines against them.
pub struct Logic<S: ApplicationStorage> {
    book: JobBook,
    storage: S,
}

impl<S: ApplicationStorage> Logic<S> {
    pub fn new(book: JobBook, storage: S) -> Self {
        Logic { book, storage }
    }

    /// Loads the stored applications. Unreadable data yields an empty book and
    /// a warning for the user instead of an error.
    pub fn load(storage: S) -> (Self, Option<String>) {
        let loaded = storage.load().and_then(|applications| {
            JobBook::with_applications(applications)
                .map_err(|_| StorageError::DuplicateApplication)
        });
        match loaded {
            Ok(book) => {
                info!(
                    count = book.len(),
                    path = %storage.path().display(),
                    "job book loaded"
                );
                (Logic::new(book, storage), None)
            }
            Err(err) => {
                warn!(error = %err, path = %storage.path().display(), "starting with an empty job book");
                let warning = format!(
                    "Data file {} could not be loaded ({}). Starting with an empty job book.",
                    storage.path().display(),
                    err
                );
                (Logic::new(JobBook::new(), storage), Some(warning))
            }
        }
    }

    pub fn execute(&mut self, input: &str) -> Result<CommandResult, LogicError> {
        info!(input, "command entered");
        let command = parse_command(input)?;
        let result = command.execute(&mut self.book)?;
        if result.should_persist {
            if let Err(source) = self.storage.save(self.book.applications()) {
                warn!(error = %source, "saving job book failed");
                return Err(LogicError::Persist { result, source });
            }
        }
        Ok(result)
    }

    pub fn book(&self) -> &JobBook {
        &self.book
    }

    pub fn view(&self) -> Vec<&JobApplication> {
        self.book.view()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
