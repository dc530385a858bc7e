//! The scope grammar for authorization requests.
//!
//! A scope string is a space-separated sequence of clauses:
//!
//! - `read` permits reading any protected resource. This is the default
//!   scope.
//! - `read[<key>]` permits reading the resource identified by `<key>`.
//! - `write[<key>]` permits writing to the identified resource. Unlike
//!   `read`, `write` must always name its resource.
//! - `delegate[<delegate key>]:<action>[<key>]` entrusts `<action>` (`read`
//!   or `write`) on the identified resource to the named delegate, e.g. an
//!   onboarding service writing to a repository on the client's behalf. The
//!   delegate exchanges a token carrying this clause for its own token
//!   naming it as the subject.
//!
//! Keys are either registered IDs or absolute URLs; anything starting with
//! `http` is treated as a URL.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Scope has missing elements")]
    MissingElements,

    #[error("Write scope requires a resource ID")]
    WriteWithoutResource,

    #[error("Invalid delegate scope")]
    InvalidDelegate,
}

/// The action named by a clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn as_access(self) -> char {
        match self {
            Action::Read => 'r',
            Action::Write => 'w',
        }
    }
}

/// One parsed clause of a scope string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeClause {
    ReadAll,
    Read(String),
    Write(String),
    Delegate {
        delegate: String,
        action: Action,
        resource: String,
    },
}

/// An access entry recorded against a resource or delegate key. The
/// `delegate` field is set when the access was granted through a delegation
/// clause.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Access {
    pub access: char,
    pub delegate: Option<String>,
}

impl Access {
    fn direct(access: char) -> Self {
        Access {
            access,
            delegate: None,
        }
    }
}

pub type AccessSet = HashSet<Access>;

/// A parsed scope. The original string is retained so that formatting a
/// scope reproduces exactly what the client sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    raw: String,
    clauses: Vec<ScopeClause>,
    read_all: bool,
    resources: HashMap<String, AccessSet>,
    delegates: HashMap<String, AccessSet>,
}

impl Scope {
    /// True iff the scope key is a registered URL rather than an ID.
    pub fn is_url_key(key: &str) -> bool {
        key.starts_with("http")
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn clauses(&self) -> &[ScopeClause] {
        &self.clauses
    }

    /// True iff the bare `read` clause appears.
    pub fn read_all(&self) -> bool {
        self.read_all
    }

    /// Accesses granted per resource key.
    pub fn resources(&self) -> &HashMap<String, AccessSet> {
        &self.resources
    }

    /// Accesses entrusted per delegate key.
    pub fn delegates(&self) -> &HashMap<String, AccessSet> {
        &self.delegates
    }

    /// Is accessing the resource within this scope?
    ///
    /// `access` is the requested access string (`"r"`, `"w"` or `"rw"`).
    /// The delegate map is consulted too, so a request against a delegate's
    /// own identifier resolves positively.
    pub fn within_scope(&self, access: &str, resource_key: &str) -> bool {
        if self.read_all && matches!(access, "r" | "rw") {
            return true;
        }

        let empty = AccessSet::new();
        let granted = self.resources.get(resource_key).unwrap_or(&empty);
        let entrusted = self.delegates.get(resource_key).unwrap_or(&empty);

        access
            .chars()
            .filter(|c| matches!(c, 'r' | 'w'))
            .map(Access::direct)
            .any(|entry| granted.contains(&entry) || entrusted.contains(&entry))
    }

    fn from_clauses(raw: String, clauses: Vec<ScopeClause>) -> Self {
        let mut read_all = false;
        let mut resources: HashMap<String, AccessSet> = HashMap::new();
        let mut delegates: HashMap<String, AccessSet> = HashMap::new();

        for clause in &clauses {
            match clause {
                ScopeClause::ReadAll => read_all = true,
                ScopeClause::Read(key) => {
                    resources
                        .entry(key.clone())
                        .or_default()
                        .insert(Access::direct('r'));
                }
                ScopeClause::Write(key) => {
                    resources
                        .entry(key.clone())
                        .or_default()
                        .insert(Access::direct('w'));
                }
                ScopeClause::Delegate {
                    delegate,
                    action,
                    resource,
                } => {
                    let access = action.as_access();
                    delegates
                        .entry(delegate.clone())
                        .or_default()
                        .insert(Access::direct(access));
                    resources.entry(resource.clone()).or_default().insert(Access {
                        access,
                        delegate: Some(delegate.clone()),
                    });
                }
            }
        }

        Scope {
            raw,
            clauses,
            read_all,
            resources,
            delegates,
        }
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(scope: &str) -> Result<Self, ScopeError> {
        let clauses = scope
            .split_whitespace()
            .map(parse_clause)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Scope::from_clauses(scope.to_string(), clauses))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Sorted unique access characters of a set, e.g. `{w, r, w}` -> `"rw"`.
pub fn concatenate_access(access: &AccessSet) -> String {
    let mut chars: Vec<char> = access.iter().map(|entry| entry.access).collect();
    chars.sort_unstable();
    chars.dedup();
    chars.into_iter().collect()
}

fn parse_clause(clause: &str) -> Result<ScopeClause, ScopeError> {
    if clause == "read" {
        return Ok(ScopeClause::ReadAll);
    }
    if let Some(key) = bracketed(clause, "read") {
        return Ok(ScopeClause::Read(key.to_string()));
    }
    if clause.starts_with("write") {
        return bracketed(clause, "write")
            .map(|key| ScopeClause::Write(key.to_string()))
            .ok_or(ScopeError::WriteWithoutResource);
    }
    if clause.starts_with("delegate") {
        return parse_delegate(clause);
    }

    Err(ScopeError::MissingElements)
}

fn parse_delegate(clause: &str) -> Result<ScopeClause, ScopeError> {
    let rest = clause
        .strip_prefix("delegate[")
        .ok_or(ScopeError::InvalidDelegate)?;
    // Delegate keys may themselves contain brackets; split on the last `]:`
    // so the delegate part is as long as possible.
    let (delegate, action_part) = rest.rsplit_once("]:").ok_or(ScopeError::InvalidDelegate)?;
    if delegate.is_empty() {
        return Err(ScopeError::InvalidDelegate);
    }

    let (action, resource) = if let Some(key) = bracketed(action_part, "read") {
        (Action::Read, key)
    } else if let Some(key) = bracketed(action_part, "write") {
        (Action::Write, key)
    } else {
        return Err(ScopeError::InvalidDelegate);
    };

    Ok(ScopeClause::Delegate {
        delegate: delegate.to_string(),
        action,
        resource: resource.to_string(),
    })
}

/// `<prefix>[<key>]` with a non-empty key.
fn bracketed<'a>(clause: &'a str, prefix: &str) -> Option<&'a str> {
    let key = clause
        .strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')?;
    if key.is_empty() { None } else { Some(key) }
}
