//! Utilities for collecting simulator diagnostics.
//!
//! Catalog validation, program parsing and circuit settling never fail hard on
//! malformed input. Instead, each stage records what it noticed as an issue
//! in an [`IssueSet`] and carries on.

#![warn(missing_docs)]


use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

/// A diagnostic issue that should be reported to users.
pub trait Diagnostic: Debug + Display {
    /// Returns an optional help message that should indicate
    /// what users need to do to resolve an issue.
    fn help(&self) -> Option<Box<dyn Display>> {
        None
    }

    /// Returns the severity of this issue.
    ///
    /// The default implementation returns [`Severity::default`].
    fn severity(&self) -> Severity {
        Default::default()
    }
}

/// An enumeration of possible severity levels.
///
/// Severities are ordered: `Info < Warning < Error`.
#[derive(
    Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum Severity {
    /// An informational message, such as a skipped program line.
    Info,
    /// A warning. The circuit still simulates, but may not do what was intended.
    #[default]
    Warning,
    /// An error. Catalogs with errors should not be used for simulation.
    Error,
}

/// A collection of issues.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IssueSet<T> {
    issues: Vec<T>,
    num_errors: usize,
    num_warnings: usize,
}

impl<T> IssueSet<T> {
    /// Creates a new, empty issue set.
    #[inline]
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            num_errors: 0,
            num_warnings: 0,
        }
    }

    /// Returns an iterator over all issues in the set.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.issues.iter()
    }

    /// The number of issues in this issue set.
    #[inline]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if this issue set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Removes all issues from the set.
    pub fn clear(&mut self) {
        self.issues.clear();
        self.num_errors = 0;
        self.num_warnings = 0;
    }
}

impl<T: Diagnostic> IssueSet<T> {
    /// Adds the given issue to the issue set.
    #[inline]
    pub fn add(&mut self, issue: T) {
        match issue.severity() {
            Severity::Error => self.num_errors += 1,
            Severity::Warning => self.num_warnings += 1,
            Severity::Info => (),
        };
        self.issues.push(issue);
    }

    /// Returns `true` if this issue set contains an error.
    ///
    /// Errors are determined by [`Diagnostic`]s with a
    /// [severity](Diagnostic::severity) of [`Severity::Error`].
    pub fn has_error(&self) -> bool {
        self.num_errors > 0
    }

    /// The number of errors in this issue set.
    #[inline]
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    /// Returns `true` if this issue set contains a warning.
    pub fn has_warning(&self) -> bool {
        self.num_warnings > 0
    }

    /// The number of warnings in this issue set.
    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }

    /// The highest severity of any issue in the set, if the set is non-empty.
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(Diagnostic::severity).max()
    }

    /// Iterates over the issues with at least the given severity.
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &T> {
        self.issues
            .iter()
            .filter(move |issue| issue.severity() >= severity)
    }
}

impl<T: Diagnostic> Extend<T> for IssueSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for issue in iter {
            self.add(issue);
        }
    }
}

impl<T: Diagnostic> FromIterator<T> for IssueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T> IntoIterator for IssueSet<T> {
    type Item = T;
    type IntoIter = <std::vec::Vec<T> as IntoIterator>::IntoIter;
    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a IssueSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl<T> Default for IssueSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl Severity {
    /// Returns log level corresponding to this severity.
    #[inline]
    pub const fn as_tracing_level(&self) -> tracing::Level {
        match *self {
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl<T: Display + Diagnostic> Display for IssueSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for issue in self.issues.iter() {
            writeln!(f, "{}: {}", issue.severity(), issue)?;
        }
        Ok(())
    }
}

/// Emits a tracing event for the given issue at the level matching its severity.
///
/// `tracing` levels must be known statically, hence the match.
pub fn log_issue<T: Diagnostic>(issue: &T) {
    match issue.severity() {
        Severity::Info => tracing::info!(issue = ?issue, "{}", issue),
        Severity::Warning => tracing::warn!(issue = ?issue, "{}", issue),
        Severity::Error => tracing::error!(issue = ?issue, "{}", issue),
    }
}
