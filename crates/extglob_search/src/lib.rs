#![deny(missing_docs)]
//! Concurrent directory search filtered by glob patterns.
//!
//! [`search`] walks a directory tree and reports every entry a matcher function accepts.
//! Each directory is listed by its own task, so sibling subtrees are explored in parallel and
//! results arrive in no particular order. [`search_patterns`] derives the matcher from lists
//! of include and exclude [`Pattern`]s.
//!
//! The matcher receives the path of an entry relative to the base directory, using `/` as the
//! separator on every platform. Directories are offered with a trailing `/`, so a pattern like
//! `*/` selects directories only. [`search_patterns`] also tries a directory without the `/`.
//!
//! ```no_run
//! use extglob::Pattern;
//! use extglob_search::{search_patterns, SearchOptions};
//! use futures::TryStreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let include = vec!["**/*.rs".parse::<Pattern>()?];
//! let exclude = vec!["target/".parse::<Pattern>()?];
//! let entries: Vec<_> = search_patterns(".", include, exclude, SearchOptions::default())
//!     .try_collect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod walk;

use std::{
    fs::Metadata,
    future::Future,
    io,
    path::{Path, PathBuf},
    pin::Pin,
    task::{ready, Context, Poll},
};

use extglob::Pattern;
use futures::Stream;
use thiserror::Error;
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};

/// The verdict of a matcher for a single entry.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct MatchResult {
    /// When true the entry is reported.
    pub matches: bool,

    /// When true the contents of a directory are not searched. Has no effect on files.
    pub skip_descendants: bool,
}

impl MatchResult {
    /// Report the entry and continue into it.
    pub const MATCH: Self = Self {
        matches: true,
        skip_descendants: false,
    };

    /// Do not report the entry but still search its contents.
    pub const NO_MATCH: Self = Self {
        matches: false,
        skip_descendants: false,
    };

    /// Neither report the entry nor search its contents.
    pub const PRUNE: Self = Self {
        matches: false,
        skip_descendants: true,
    };
}

/// Options that control a search.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SearchOptions {
    /// Skip entries whose name starts with a `.`. Skipped directories are not searched.
    pub skip_hidden_files: bool,

    /// Read the metadata of every reported entry while listing its directory. Entries whose
    /// metadata cannot be read are still reported, without metadata.
    pub prefetch_metadata: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            skip_hidden_files: true,
            prefetch_metadata: false,
        }
    }
}

/// An entry found by a search.
#[derive(Debug)]
pub struct SearchEntry {
    /// The path of the entry, the base directory joined with the relative path.
    pub path: PathBuf,

    /// The path relative to the base directory, `/` separated and without a trailing `/`.
    pub relative_path: String,

    /// True if the entry is a directory or a symbolic link to one.
    pub is_directory: bool,

    /// The metadata of the entry if [`SearchOptions::prefetch_metadata`] was set and reading
    /// it succeeded.
    pub metadata: Option<Metadata>,
}

/// An error that ends a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A directory could not be listed.
    #[error("failed to read the contents of directory '{}'", .0.display())]
    ReadDirectory(PathBuf, #[source] io::Error),

    /// The canonical path of a directory could not be determined.
    #[error("failed to determine the canonical path of '{}'", .0.display())]
    Canonicalize(PathBuf, #[source] io::Error),

    /// A task of the search was cancelled before it finished.
    #[error("the search was cancelled")]
    Cancelled,
}

/// Recursively searches `base` and reports every entry that `matcher` accepts.
///
/// The matcher is called once for every entry with the full path and the `/` separated path
/// relative to `base` (with a trailing `/` for directories). Directories are searched unless
/// the matcher sets [`MatchResult::skip_descendants`], whether they match or not. A directory
/// that is reached again through a symbolic link cycle is reported but not searched a second
/// time on the same branch.
///
/// The search starts immediately on the current tokio runtime. Dropping the returned stream
/// cancels it.
///
/// # Panics
/// Panics if called outside of a tokio runtime.
pub fn search<F>(base: impl Into<PathBuf>, matcher: F, options: SearchOptions) -> SearchStream
where
    F: Fn(&Path, &str) -> MatchResult + Send + Sync + 'static,
{
    let (receiver, task) = walk::spawn(base.into(), matcher, options);
    SearchStream {
        receiver,
        task,
        finished: false,
    }
}

/// Recursively searches `base` for entries that match the patterns.
///
/// An entry is pruned if any of the `exclude` patterns matches its relative path. Otherwise it
/// is reported if `include` is empty or any of the `include` patterns matches. Directories that
/// do not match are still searched, because patterns such as `**/*.rs` never match the
/// directories that lead to a file.
///
/// A directory matches if a pattern matches its relative path either as is (`build`) or with
/// a trailing `/` (`build/`).
///
/// # Panics
/// Panics if called outside of a tokio runtime.
pub fn search_patterns(
    base: impl Into<PathBuf>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    options: SearchOptions,
) -> SearchStream {
    search(
        base,
        move |_, relative_path| {
            if matches_any(&exclude, relative_path) {
                MatchResult::PRUNE
            } else if include.is_empty() || matches_any(&include, relative_path) {
                MatchResult::MATCH
            } else {
                MatchResult::NO_MATCH
            }
        },
        options,
    )
}

/// Directories arrive as `dir/`, they are tried as `dir` first.
fn matches_any(patterns: &[Pattern], relative_path: &str) -> bool {
    let plain = relative_path.strip_suffix('/');
    patterns.iter().any(|pattern| {
        plain.is_some_and(|plain| pattern.matches(plain)) || pattern.matches(relative_path)
    })
}

/// The entries of a running search.
///
/// The stream ends when the whole tree has been searched, or after yielding the first error.
/// Dropping the stream cancels all tasks of the search.
pub struct SearchStream {
    receiver: UnboundedReceiver<Result<SearchEntry, SearchError>>,
    task: JoinHandle<()>,
    finished: bool,
}

impl Stream for SearchStream {
    type Item = Result<SearchEntry, SearchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match ready!(self.receiver.poll_recv(cx)) {
            Some(Ok(entry)) => Poll::Ready(Some(Ok(entry))),
            Some(Err(err)) => {
                self.finished = true;
                self.task.abort();
                Poll::Ready(Some(Err(err)))
            }
            None => {
                // All senders are gone, wait for the root task to surface a panic.
                let result = ready!(Pin::new(&mut self.task).poll(cx));
                self.finished = true;
                match result {
                    Ok(()) => Poll::Ready(None),
                    Err(err) => match err.try_into_panic() {
                        Ok(payload) => std::panic::resume_unwind(payload),
                        Err(_) => Poll::Ready(Some(Err(SearchError::Cancelled))),
                    },
                }
            }
        }
    }
}

impl Drop for SearchStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}
