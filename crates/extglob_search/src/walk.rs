//! The tasks that make up a search.
//!
//! Every directory is handled by one task. The task lists the directory on the blocking pool,
//! runs the matcher over the entries and spawns a child task for every subdirectory into a
//! [`JoinSet`] it owns. A task therefore finishes only after its children finished, and
//! dropping it (on error or cancellation) aborts the whole subtree below it.

use std::{
    fs::Metadata,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use fs_err as fs;
use futures::{future::BoxFuture, FutureExt};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::{JoinError, JoinHandle, JoinSet},
};

use crate::{MatchResult, SearchEntry, SearchError, SearchOptions};

type Sender = UnboundedSender<Result<SearchEntry, SearchError>>;

/// State shared by all tasks of one search.
struct Search<F> {
    matcher: F,
    options: SearchOptions,
    sender: Sender,
}

/// The canonical path of a directory on the current branch, linked to its parent.
///
/// Every branch of the search extends the list of its parent without copying it, so sibling
/// branches that reach the same physical directory each explore it once.
struct Ancestor {
    canonical_path: PathBuf,
    parent: Option<Arc<Ancestor>>,
}

impl Ancestor {
    fn contains(&self, path: &Path) -> bool {
        let mut current = Some(self);
        while let Some(ancestor) = current {
            if ancestor.canonical_path == path {
                return true;
            }
            current = ancestor.parent.as_deref();
        }
        false
    }
}

struct Listing {
    canonical_path: PathBuf,
    entries: Vec<ListedEntry>,
}

struct ListedEntry {
    name: String,
    path: PathBuf,
    is_directory: bool,
    metadata: Option<Metadata>,
}

/// Starts the search of `base` on the current runtime.
pub(crate) fn spawn<F>(
    base: PathBuf,
    matcher: F,
    options: SearchOptions,
) -> (
    UnboundedReceiver<Result<SearchEntry, SearchError>>,
    JoinHandle<()>,
)
where
    F: Fn(&Path, &str) -> MatchResult + Send + Sync + 'static,
{
    let (sender, receiver) = unbounded_channel();
    let search = Arc::new(Search {
        matcher,
        options,
        sender,
    });

    let task = tokio::spawn(async move {
        if let Err(err) = search_directory(search.clone(), base, String::new(), None).await {
            // Nobody is listening anymore if this fails.
            let _ = search.sender.send(Err(err));
        }
    });

    (receiver, task)
}

fn search_directory<F>(
    search: Arc<Search<F>>,
    directory: PathBuf,
    relative_directory: String,
    parent: Option<Arc<Ancestor>>,
) -> BoxFuture<'static, Result<(), SearchError>>
where
    F: Fn(&Path, &str) -> MatchResult + Send + Sync + 'static,
{
    async move {
        tracing::trace!("searching directory '{}'", directory.display());

        let listing = {
            let directory = directory.clone();
            let ancestors = parent.clone();
            let options = search.options.clone();
            run_blocking(move || list_directory(&directory, ancestors.as_deref(), &options))
                .await?
        };

        let Some(listing) = listing else {
            tracing::debug!(
                "not searching '{}' again, it closes a symbolic link cycle",
                directory.display()
            );
            return Ok(());
        };

        let frame = Arc::new(Ancestor {
            canonical_path: listing.canonical_path,
            parent,
        });

        let mut children = JoinSet::new();
        for entry in listing.entries {
            let relative_path = format!("{relative_directory}{}", entry.name);
            let result = if entry.is_directory {
                (search.matcher)(&entry.path, &format!("{relative_path}/"))
            } else {
                (search.matcher)(&entry.path, &relative_path)
            };

            let descend = entry.is_directory && !result.skip_descendants;
            if entry.is_directory && result.skip_descendants {
                tracing::debug!("skipping the contents of '{relative_path}'");
            }

            if descend {
                children.spawn(search_directory(
                    search.clone(),
                    entry.path.clone(),
                    format!("{relative_path}/"),
                    Some(frame.clone()),
                ));
            }

            if result.matches {
                // The receiver is only gone when the stream was dropped, which aborts this task.
                let _ = search.sender.send(Ok(SearchEntry {
                    path: entry.path,
                    relative_path,
                    is_directory: entry.is_directory,
                    metadata: entry.metadata,
                }));
            }
        }

        while let Some(result) = children.join_next().await {
            match result.map_err(JoinError::try_into_panic) {
                Ok(result) => result?,
                Err(Ok(payload)) => std::panic::resume_unwind(payload),
                Err(Err(_)) => return Err(SearchError::Cancelled),
            }
        }

        Ok(())
    }
    .boxed()
}

/// Lists the contents of a directory. Returns `None` if the directory is one of its own
/// ancestors.
fn list_directory(
    directory: &Path,
    ancestors: Option<&Ancestor>,
    options: &SearchOptions,
) -> Result<Option<Listing>, SearchError> {
    let read_error = |err: io::Error| SearchError::ReadDirectory(directory.to_path_buf(), err);

    let read_dir = fs::read_dir(directory).map_err(read_error)?;
    let canonical_path = fs::canonicalize(directory)
        .map_err(|err| SearchError::Canonicalize(directory.to_path_buf(), err))?;
    if ancestors.is_some_and(|ancestors| ancestors.contains(&canonical_path)) {
        return Ok(None);
    }

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(read_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if options.skip_hidden_files && name.starts_with('.') {
            continue;
        }

        let path = entry.path();

        // Follows symbolic links, a link to a directory is searched like the directory.
        let is_directory = path.is_dir();
        let metadata = if options.prefetch_metadata {
            fs::metadata(&path).ok()
        } else {
            None
        };

        entries.push(ListedEntry {
            name,
            path,
            is_directory,
            metadata,
        });
    }

    Ok(Some(Listing {
        canonical_path,
        entries,
    }))
}

/// Runs a blocking function on the blocking pool. Panics are resumed on the calling task.
async fn run_blocking<T, F>(f: F) -> Result<T, SearchError>
where
    F: FnOnce() -> Result<T, SearchError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f)
        .await
        .map_err(JoinError::try_into_panic)
    {
        Ok(result) => result,
        Err(Err(_err)) => Err(SearchError::Cancelled),
        Err(Ok(payload)) => std::panic::resume_unwind(payload),
    }
}
