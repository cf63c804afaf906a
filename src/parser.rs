//! Turns a raw command line into a [`Command`].
//!
//! The first word selects the command; the rest is tokenized on the flags that
//! command accepts and validated into typed values. Nothing here touches the
//! job book, so a parse failure can never mutate state.

use crate::commands::{
    Command, DisplayIndex, UpdateDescriptor, ADD_USAGE, DELETE_USAGE, FILTER_USAGE, FIND_USAGE,
    HELP_USAGE, SORT_USAGE, TAG_USAGE, UNTAG_USAGE, UPDATE_USAGE,
};
use crate::datetime::{self, DateTimeParseError};
use crate::model::{InvalidStatus, JobApplication, ModelError, Status, Tag, MAX_TAGS};
use crate::predicate::ApplicationPredicate;
use crate::sort::{SortField, SortKeyError, SortOrder};
use crate::tokenizer::{
    tokenize, ArgumentMultimap, DuplicatePrefixError, Prefix, PREFIX_COMPANY, PREFIX_DEADLINE,
    PREFIX_ROLE, PREFIX_STATUS, PREFIX_TAG,
};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' to see the available commands.")]
    UnknownCommand(String),
    #[error("Invalid command format!\n{usage}")]
    InvalidFormat { usage: &'static str },
    #[error("Index must be a positive integer, got '{input}'.\n{usage}")]
    InvalidIndex { input: String, usage: &'static str },
    #[error(transparent)]
    DuplicatePrefixes(#[from] DuplicatePrefixError),
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    DateTime(#[from] DateTimeParseError),
    #[error("Filter command accepts only one filter flag at a time. Please use only one of: t/, s/, d/ or r/")]
    MultipleFilterFlags,
    #[error("Invalid empty {0} keyword for filter.")]
    EmptyFilterKeyword(&'static str),
    #[error("Invalid date format. Expected format: yyyy-MM-dd")]
    FilterDateFormat,
    #[error("Invalid date. Please enter a valid date in yyyy-MM-dd format.")]
    FilterDate,
    #[error("{source}\n{}", SORT_USAGE)]
    SortKey {
        #[from]
        source: SortKeyError,
    },
}

const FILTER_PREFIXES: [Prefix; 4] = [PREFIX_TAG, PREFIX_STATUS, PREFIX_DEADLINE, PREFIX_ROLE];

fn filter_date_regex() -> &'static Regex {
    static FILTER_DATE: OnceLock<Regex> = OnceLock::new();
    FILTER_DATE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("filter date pattern is valid"))
}

pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidFormat { usage: HELP_USAGE });
    }
    let (word, args) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    debug!(word, args, "parsing command");

    match word {
        "add" => parse_add(args),
        "delete" => parse_index(args, DELETE_USAGE).map(Command::Delete),
        "update" => parse_update(args),
        "tag" => parse_tagging(args, TAG_USAGE)
            .map(|(index, tags)| Command::Tag { index, tags }),
        "untag" => parse_tagging(args, UNTAG_USAGE)
            .map(|(index, tags)| Command::Untag { index, tags }),
        "filter" => parse_filter(args).map(Command::Filter),
        "find" => parse_find(args).map(Command::Filter),
        "list" => Ok(Command::Filter(ApplicationPredicate::ShowAll)),
        "sort" => parse_sort(args),
        "clear" => Ok(Command::Clear),
        "help" => Ok(Command::Help),
        "save" => Ok(Command::Save),
        "exit" => Ok(Command::Exit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_add(args: &str) -> Result<Command, ParseError> {
    let map = tokenize(
        args,
        &[PREFIX_COMPANY, PREFIX_ROLE, PREFIX_STATUS, PREFIX_DEADLINE, PREFIX_TAG],
    );
    let required = [PREFIX_COMPANY, PREFIX_ROLE, PREFIX_STATUS];
    if !required.iter().all(|p| map.is_present(*p)) || !map.preamble().is_empty() {
        return Err(ParseError::InvalidFormat { usage: ADD_USAGE });
    }
    map.verify_no_duplicates(&[PREFIX_COMPANY, PREFIX_ROLE, PREFIX_STATUS, PREFIX_DEADLINE])?;

    let company = non_blank(&map, PREFIX_COMPANY, "company name")?;
    let role = non_blank(&map, PREFIX_ROLE, "role")?;
    let status = parse_status(&map)?;
    let deadline = match map.value(PREFIX_DEADLINE) {
        Some(text) => datetime::parse(text)?,
        None => datetime::default_date_time(),
    };
    let tags = parse_tags(map.all_values(PREFIX_TAG))?;

    let application = JobApplication::new(company, role, deadline, status, tags)?;
    Ok(Command::Add(application))
}

fn parse_update(args: &str) -> Result<Command, ParseError> {
    let map = tokenize(
        args,
        &[PREFIX_COMPANY, PREFIX_ROLE, PREFIX_STATUS, PREFIX_DEADLINE, PREFIX_TAG],
    );
    let index = index_from(map.preamble(), UPDATE_USAGE)?;
    map.verify_no_duplicates(&[PREFIX_COMPANY, PREFIX_ROLE, PREFIX_STATUS, PREFIX_DEADLINE])?;

    let mut descriptor = UpdateDescriptor::default();
    if map.is_present(PREFIX_COMPANY) {
        descriptor.company_name = Some(non_blank(&map, PREFIX_COMPANY, "company name")?);
    }
    if map.is_present(PREFIX_ROLE) {
        descriptor.role = Some(non_blank(&map, PREFIX_ROLE, "role")?);
    }
    if map.is_present(PREFIX_STATUS) {
        descriptor.status = Some(parse_status(&map)?);
    }
    if let Some(text) = map.value(PREFIX_DEADLINE) {
        descriptor.deadline = Some(datetime::parse(text)?);
    }
    descriptor.tags = parse_tags_for_update(map.all_values(PREFIX_TAG))?;

    Ok(Command::Update { index, descriptor })
}

fn parse_tagging(
    args: &str,
    usage: &'static str,
) -> Result<(DisplayIndex, BTreeSet<Tag>), ParseError> {
    let map = tokenize(args, &[PREFIX_TAG]);
    let index = index_from(map.preamble(), usage)?;
    if !map.is_present(PREFIX_TAG) {
        return Err(ParseError::InvalidFormat { usage });
    }
    let tags = parse_tags(map.all_values(PREFIX_TAG))?;
    Ok((index, tags))
}

fn parse_filter(args: &str) -> Result<ApplicationPredicate, ParseError> {
    let map = tokenize(args, &FILTER_PREFIXES);
    let present: Vec<Prefix> = FILTER_PREFIXES
        .into_iter()
        .filter(|p| map.is_present(*p))
        .collect();

    let preamble = map.preamble();
    if preamble.eq_ignore_ascii_case("none") {
        return Ok(ApplicationPredicate::ShowAll);
    }
    if !preamble.is_empty() {
        return Err(ParseError::InvalidFormat { usage: FILTER_USAGE });
    }
    let flag = match present.as_slice() {
        [] => return Err(ParseError::InvalidFormat { usage: FILTER_USAGE }),
        [flag] => *flag,
        _ => return Err(ParseError::MultipleFilterFlags),
    };
    map.verify_no_duplicates(&[flag])?;
    let value = map.value(flag).unwrap_or_default();

    match flag {
        PREFIX_TAG if value.is_empty() => Err(ParseError::EmptyFilterKeyword("tag")),
        PREFIX_TAG => Ok(ApplicationPredicate::tag_contains(value)),
        PREFIX_ROLE if value.is_empty() => Err(ParseError::EmptyFilterKeyword("role")),
        PREFIX_ROLE => Ok(ApplicationPredicate::role_contains(value)),
        PREFIX_STATUS => Ok(ApplicationPredicate::StatusMatches(value.parse::<Status>()?)),
        _ => {
            if !filter_date_regex().is_match(value) {
                return Err(ParseError::FilterDateFormat);
            }
            datetime::parse_iso_date(value)
                .map(ApplicationPredicate::DeadlineOn)
                .map_err(|_| ParseError::FilterDate)
        }
    }
}

fn parse_find(args: &str) -> Result<ApplicationPredicate, ParseError> {
    let keywords: Vec<&str> = args.split_whitespace().collect();
    if keywords.is_empty() {
        return Err(ParseError::InvalidFormat { usage: FIND_USAGE });
    }
    Ok(ApplicationPredicate::company_keywords(keywords))
}

fn parse_sort(args: &str) -> Result<Command, ParseError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let (field, order) = match parts.as_slice() {
        [field] => (field.parse::<SortField>()?, SortOrder::default()),
        [field, order] => (field.parse::<SortField>()?, order.parse::<SortOrder>()?),
        _ => return Err(ParseError::InvalidFormat { usage: SORT_USAGE }),
    };
    Ok(Command::Sort { field, order })
}

fn parse_index(args: &str, usage: &'static str) -> Result<DisplayIndex, ParseError> {
    index_from(args.trim(), usage)
}

fn index_from(text: &str, usage: &'static str) -> Result<DisplayIndex, ParseError> {
    if text.is_empty() {
        return Err(ParseError::InvalidFormat { usage });
    }
    let invalid = || ParseError::InvalidIndex {
        input: text.to_string(),
        usage,
    };
    if !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    text.parse::<usize>()
        .ok()
        .and_then(DisplayIndex::new)
        .ok_or_else(invalid)
}

fn non_blank(
    map: &ArgumentMultimap,
    prefix: Prefix,
    field: &'static str,
) -> Result<String, ParseError> {
    match map.value(prefix) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ModelError::BlankField(field).into()),
    }
}

fn parse_status(map: &ArgumentMultimap) -> Result<Status, ParseError> {
    Ok(map.value(PREFIX_STATUS).unwrap_or_default().parse::<Status>()?)
}

fn parse_tags(values: &[String]) -> Result<BTreeSet<Tag>, ParseError> {
    let tags = values
        .iter()
        .map(|value| Tag::parse(value))
        .collect::<Result<BTreeSet<_>, _>>()?;
    if tags.len() > MAX_TAGS {
        return Err(ModelError::TooManyTags(tags.len()).into());
    }
    Ok(tags)
}

/// No `t/` keeps the tags; a single empty `t/` clears them.
fn parse_tags_for_update(values: &[String]) -> Result<Option<BTreeSet<Tag>>, ParseError> {
    match values {
        [] => Ok(None),
        [only] if only.is_empty() => Ok(Some(BTreeSet::new())),
        _ => parse_tags(values).map(Some),
    }
}
