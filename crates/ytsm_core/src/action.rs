const ACTION_PREFIX: &str = "ajax/action/";

/// Fire-and-forget actions posted from links and buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AjaxAction {
    SyncNow,
    /// Synchronize a single subscription right away.
    SyncSubscription(u64),
    DeleteVideoFiles(u64),
    DownloadVideoFiles(u64),
    MarkVideoWatched(u64),
    MarkVideoUnwatched(u64),
}

impl AjaxAction {
    pub fn path(&self) -> String {
        match self {
            AjaxAction::SyncNow => "ajax/action/sync_now/".to_string(),
            AjaxAction::SyncSubscription(id) => format!("ajax/action/sync_now/{id}"),
            AjaxAction::DeleteVideoFiles(id) => format!("ajax/action/delete_video_files/{id}"),
            AjaxAction::DownloadVideoFiles(id) => {
                format!("ajax/action/download_video_files/{id}")
            }
            AjaxAction::MarkVideoWatched(id) => format!("ajax/action/mark_video_watched/{id}"),
            AjaxAction::MarkVideoUnwatched(id) => {
                format!("ajax/action/mark_video_unwatched/{id}")
            }
        }
    }

    /// Recognises the `data-post-url` of an action link, absolute or relative.
    pub fn from_path(path: &str) -> Option<Self> {
        let start = path.find(ACTION_PREFIX)? + ACTION_PREFIX.len();
        let mut parts = path[start..].trim_end_matches('/').splitn(2, '/');
        let name = parts.next()?;
        let id = parts.next().map(str::parse::<u64>).transpose().ok()?;
        match (name, id) {
            ("sync_now", None) => Some(AjaxAction::SyncNow),
            ("sync_now", Some(id)) => Some(AjaxAction::SyncSubscription(id)),
            ("delete_video_files", Some(id)) => Some(AjaxAction::DeleteVideoFiles(id)),
            ("download_video_files", Some(id)) => Some(AjaxAction::DownloadVideoFiles(id)),
            ("mark_video_watched", Some(id)) => Some(AjaxAction::MarkVideoWatched(id)),
            ("mark_video_unwatched", Some(id)) => Some(AjaxAction::MarkVideoUnwatched(id)),
            _ => None,
        }
    }

    /// Caption used for the toast that reports the outcome.
    pub fn label(&self) -> &'static str {
        match self {
            AjaxAction::SyncNow => "Synchronization",
            AjaxAction::SyncSubscription(_) => "Subscription synchronization",
            AjaxAction::DeleteVideoFiles(_) => "Delete video files",
            AjaxAction::DownloadVideoFiles(_) => "Download video",
            AjaxAction::MarkVideoWatched(_) => "Mark as watched",
            AjaxAction::MarkVideoUnwatched(_) => "Mark as not watched",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip_through_links() {
        let actions = [
            AjaxAction::SyncNow,
            AjaxAction::SyncSubscription(4),
            AjaxAction::DeleteVideoFiles(9),
            AjaxAction::MarkVideoUnwatched(12),
        ];
        for action in actions {
            assert_eq!(AjaxAction::from_path(&action.path()), Some(action));
        }
    }

    #[test]
    fn absolute_links_and_unknown_routes() {
        assert_eq!(
            AjaxAction::from_path("/ajax/action/mark_video_watched/31"),
            Some(AjaxAction::MarkVideoWatched(31))
        );
        assert_eq!(AjaxAction::from_path("/ajax/action/explode/1"), None);
        assert_eq!(AjaxAction::from_path("/ajax/action/delete_video_files/"), None);
        assert_eq!(AjaxAction::from_path("/video/3"), None);
    }
}
