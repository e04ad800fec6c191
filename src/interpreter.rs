//! Text command front end for a [`StorageApi`].
//!
//! A command line is a whitespace-separated list of tokens. The first token
//! selects the command (case-sensitive), the rest are its arguments:
//!
//! | Command    | Arguments     | Result                                  |
//! |------------|---------------|-----------------------------------------|
//! | `SET`      | key value     | `ok`                                    |
//! | `GET`      | key           | the value, or `Key not set`             |
//! | `DELETE`   | key           | `ok`                                    |
//! | `COUNT`    | [value]       | number of entries (matching `value`)    |
//! | `BEGIN`    |               | `ok`                                    |
//! | `COMMIT`   |               | `ok`, or `no transaction`               |
//! | `ROLLBACK` |               | `ok`, or `no transaction`               |
//!
//! Anything else yields `unknown command`. Tokens beyond the ones a command
//! uses are ignored.

use log::trace;

use crate::errors::{Result, TkvsError};
use crate::storage_api::StorageApi;

pub const OK: &str = "ok";
pub const KEY_NOT_SET: &str = "Key not set";
pub const NO_TRANSACTION: &str = "no transaction";

/// A parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Set { key: &'a str, value: &'a str },
    Get { key: &'a str },
    Delete { key: &'a str },
    Count { value: Option<&'a str> },
    Begin,
    Commit,
    Rollback,
}

impl<'a> Command<'a> {
    /// Parses a tokenized command line.
    pub fn parse(tokens: &[&'a str]) -> Result<Self> {
        let (name, args) = tokens.split_first().ok_or(TkvsError::EmptyCommand)?;
        let command = match *name {
            "SET" => match *args {
                [key, value, ..] => Command::Set { key, value },
                _ => return Err(TkvsError::NeedKeyValue),
            },
            "GET" => Command::Get {
                key: args.first().copied().ok_or(TkvsError::NeedKey)?,
            },
            "DELETE" => Command::Delete {
                key: args.first().copied().ok_or(TkvsError::NeedKey)?,
            },
            "COUNT" => Command::Count {
                value: args.first().copied(),
            },
            "BEGIN" => Command::Begin,
            "COMMIT" => Command::Commit,
            "ROLLBACK" => Command::Rollback,
            _ => return Err(TkvsError::UnknownCommand),
        };
        Ok(command)
    }

    /// Runs the command against `api` and renders its result.
    pub fn execute<S: StorageApi + ?Sized>(self, api: &mut S) -> String {
        match self {
            Command::Set { key, value } => {
                api.set(key, value);
                OK.to_string()
            }
            Command::Get { key } => api.get(key).unwrap_or_else(|| KEY_NOT_SET.to_string()),
            Command::Delete { key } => {
                api.delete(key);
                OK.to_string()
            }
            Command::Count { value } => api.count(value).to_string(),
            Command::Begin => {
                api.begin();
                OK.to_string()
            }
            Command::Commit => transaction_outcome(api.commit()),
            Command::Rollback => transaction_outcome(api.rollback()),
        }
    }
}

fn transaction_outcome(closed: bool) -> String {
    let outcome = if closed { OK } else { NO_TRANSACTION };
    outcome.to_string()
}

/// Collapses whitespace runs to single spaces and trims the line.
///
/// Returns `None` for a blank line.
pub fn normalize_line(line: &str) -> Option<String> {
    let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
    (!normalized.is_empty()).then_some(normalized)
}

/// Console framing for one executed line: `"<input>:\t<result>"`.
pub fn echo_line(input: &str, result: &str) -> String {
    format!("{input}:\t{result}")
}

/// Dispatches text commands to a [`StorageApi`].
///
/// The interpreter keeps no state of its own; every command maps to exactly
/// one call on the underlying API.
#[derive(Debug)]
pub struct CommandInterpreter<S> {
    api: S,
}

impl<S: StorageApi> CommandInterpreter<S> {
    pub fn new(api: S) -> Self {
        Self { api }
    }

    /// Executes one tokenized command and returns the single-line result.
    pub fn exec(&mut self, tokens: &[&str]) -> String {
        let result = match Command::parse(tokens) {
            Ok(command) => command.execute(&mut self.api),
            Err(e) => e.to_string(),
        };
        trace!("{:?} -> {}", tokens, result);
        result
    }

    /// Normalizes, tokenizes and executes a raw input line.
    ///
    /// Returns `None` for a blank line, which executes nothing.
    pub fn exec_line(&mut self, line: &str) -> Option<String> {
        let line = normalize_line(line)?;
        let tokens: Vec<&str> = line.split(' ').collect();
        Some(self.exec(&tokens))
    }

    pub fn api(&self) -> &S {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut S {
        &mut self.api
    }

    pub fn into_inner(self) -> S {
        self.api
    }
}
