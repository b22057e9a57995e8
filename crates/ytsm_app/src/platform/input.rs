//! Line commands read from stdin, standing in for the page's clicks and form edits.

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use ytsm_core::{
    AfterSubmit, AjaxAction, FileUpload, FilterEdit, ModalRoute, Msg, NodeKind, ShowFilter,
    TreeIdError, TreeNodeRef, VideoSort,
};
use ytsm_logging::{ytsm_info, ytsm_warn};

pub const HELP: &str = "\
commands:
  sync [SUB_ID]                 synchronize everything or one subscription
  new-folder [folderN]          new-sub [folderN]          import [folderN]
  edit NODE | delete NODE       open the dialog for folderN / subN
  select NODE | select none     filter the video list by tree node
  query TEXT | sort KEY | watched y|n|all | downloaded y|n|all | per-page N
  page N | reload | refresh
  watch ID | unwatch ID | download ID | delete-files ID
  submit name=value... @field=PATH...   submit the open dialog
  close | dismiss TOAST_ID | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Msg),
    /// Submit the open dialog; file parts are read from disk first.
    Submit {
        values: Vec<(String, String)>,
        files: Vec<(String, PathBuf)>,
    },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, try help")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Node(#[from] TreeIdError),
    #[error("{0:?} is not a folder")]
    NotAFolder(String),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let msg = match (word, args.as_slice()) {
        ("", _) => return Ok(None),
        ("help", _) => return Ok(Some(Command::Help)),
        ("quit" | "exit", _) => return Ok(Some(Command::Quit)),
        ("submit", _) => return Ok(Some(parse_submit(&args)?)),
        ("sync", []) => Msg::ActionClicked(AjaxAction::SyncNow),
        ("sync", [id]) => {
            Msg::ActionClicked(AjaxAction::SyncSubscription(number(id, "sync [SUB_ID]")?))
        }
        ("new-folder", args) => open(ModalRoute::CreateFolder {
            parent: parent_folder(args)?,
        }),
        ("new-sub", args) => open(ModalRoute::CreateSubscription {
            parent_folder: parent_folder(args)?,
        }),
        ("import", args) => open(ModalRoute::ImportSubscriptions {
            parent_folder: parent_folder(args)?,
        }),
        ("edit", [node]) => Msg::EditNodeClicked(node.parse()?),
        ("delete", [node]) => Msg::DeleteNodeClicked(node.parse()?),
        ("select", ["none"]) => Msg::TreeSelectionChanged(None),
        ("select", [node]) => Msg::TreeSelectionChanged(Some(node.parse()?)),
        ("query", _) => Msg::VideoFilterEdited(FilterEdit::Query(rest.to_string())),
        ("sort", [key]) => Msg::VideoFilterEdited(FilterEdit::Sort(sort_key(key)?)),
        ("watched", [show]) => Msg::VideoFilterEdited(FilterEdit::ShowWatched(show_filter(show)?)),
        ("downloaded", [show]) => {
            Msg::VideoFilterEdited(FilterEdit::ShowDownloaded(show_filter(show)?))
        }
        ("per-page", [count]) => {
            Msg::VideoFilterEdited(FilterEdit::ResultsPerPage(number(count, "per-page N")?))
        }
        ("page", [page]) => Msg::VideoPageClicked(number(page, "page N")?),
        ("reload", []) => Msg::VideosReloadRequested,
        ("refresh", []) => Msg::TreeRefreshRequested,
        ("watch", [id]) => Msg::ActionClicked(AjaxAction::MarkVideoWatched(number(id, "watch ID")?)),
        ("unwatch", [id]) => {
            Msg::ActionClicked(AjaxAction::MarkVideoUnwatched(number(id, "unwatch ID")?))
        }
        ("download", [id]) => {
            Msg::ActionClicked(AjaxAction::DownloadVideoFiles(number(id, "download ID")?))
        }
        ("delete-files", [id]) => {
            Msg::ActionClicked(AjaxAction::DeleteVideoFiles(number(id, "delete-files ID")?))
        }
        ("close", []) => Msg::ModalDismissed,
        ("dismiss", [id]) => Msg::ToastDismissed(number(id, "dismiss TOAST_ID")?),
        (word, _) if is_known(word) => return Err(CommandError::Usage(usage_of(word))),
        (word, _) => return Err(CommandError::Unknown(word.to_string())),
    };
    Ok(Some(Command::Dispatch(msg)))
}

fn open(route: ModalRoute) -> Msg {
    Msg::OpenModal {
        route,
        after_submit: AfterSubmit::RefreshTree,
    }
}

fn parse_submit(args: &[&str]) -> Result<Command, CommandError> {
    const USAGE: &str = "submit name=value... @field=PATH...";
    let mut values = Vec::new();
    let mut files = Vec::new();
    for arg in args {
        let (name, value) = arg.split_once('=').ok_or(CommandError::Usage(USAGE))?;
        match name.strip_prefix('@') {
            Some(field) => files.push((field.to_string(), PathBuf::from(value))),
            None => values.push((name.to_string(), value.to_string())),
        }
    }
    Ok(Command::Submit { values, files })
}

fn parent_folder(args: &[&str]) -> Result<Option<u64>, CommandError> {
    match args {
        [] => Ok(None),
        [node] => {
            let node: TreeNodeRef = node.parse()?;
            match node.kind {
                NodeKind::Folder => Ok(Some(node.id)),
                NodeKind::Subscription => Err(CommandError::NotAFolder(node.to_string())),
            }
        }
        _ => Err(CommandError::Usage("new-folder|new-sub|import [folderN]")),
    }
}

fn number<T: std::str::FromStr>(raw: &str, usage: &'static str) -> Result<T, CommandError> {
    raw.parse().map_err(|_| CommandError::Usage(usage))
}

fn sort_key(raw: &str) -> Result<VideoSort, CommandError> {
    [
        VideoSort::Newest,
        VideoSort::Oldest,
        VideoSort::Playlist,
        VideoSort::PlaylistReverse,
        VideoSort::Popularity,
        VideoSort::Rating,
    ]
    .into_iter()
    .find(|sort| sort.as_str() == raw)
    .ok_or(CommandError::Usage(
        "sort newest|oldest|playlist|playlist_reverse|popularity|rating",
    ))
}

fn show_filter(raw: &str) -> Result<ShowFilter, CommandError> {
    [ShowFilter::Yes, ShowFilter::No, ShowFilter::All]
        .into_iter()
        .find(|show| show.as_str() == raw)
        .ok_or(CommandError::Usage("watched|downloaded y|n|all"))
}

const USAGES: &[(&str, &str)] = &[
    ("sync", "sync [SUB_ID]"),
    ("edit", "edit NODE"),
    ("delete", "delete NODE"),
    ("select", "select NODE|none"),
    ("sort", "sort KEY"),
    ("watched", "watched y|n|all"),
    ("downloaded", "downloaded y|n|all"),
    ("per-page", "per-page N"),
    ("page", "page N"),
    ("reload", "reload"),
    ("refresh", "refresh"),
    ("watch", "watch ID"),
    ("unwatch", "unwatch ID"),
    ("download", "download ID"),
    ("delete-files", "delete-files ID"),
    ("close", "close"),
    ("dismiss", "dismiss TOAST_ID"),
];

fn is_known(word: &str) -> bool {
    USAGES.iter().any(|(known, _)| *known == word)
}

fn usage_of(word: &str) -> &'static str {
    USAGES
        .iter()
        .find(|(known, _)| *known == word)
        .map_or("help", |(_, usage)| *usage)
}

fn read_upload(field: String, path: &Path) -> std::io::Result<FileUpload> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(FileUpload {
        field,
        file_name,
        bytes,
    })
}

/// Reads commands from stdin on its own thread. `quit` raises the flag; end of
/// input only stops reading.
pub fn spawn_reader(msg_tx: mpsc::Sender<Msg>, quit: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let msg = match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Dispatch(msg))) => msg,
                Ok(Some(Command::Submit { values, files })) => {
                    match files
                        .into_iter()
                        .map(|(field, path)| {
                            read_upload(field, &path)
                                .map_err(|err| format!("{}: {}", path.display(), err))
                        })
                        .collect::<Result<Vec<_>, _>>()
                    {
                        Ok(files) => Msg::ModalSubmitted { values, files },
                        Err(reason) => {
                            ytsm_warn!("Not submitting, could not read upload {}", reason);
                            continue;
                        }
                    }
                }
                Ok(Some(Command::Help)) => {
                    eprintln!("{}", HELP);
                    continue;
                }
                Ok(Some(Command::Quit)) => {
                    quit.store(true, Ordering::Relaxed);
                    return;
                }
                Err(err) => {
                    ytsm_warn!("{}", err);
                    continue;
                }
            };
            if msg_tx.send(msg).is_err() {
                return;
            }
        }
        ytsm_info!("Input closed, still watching the site");
    });
}
