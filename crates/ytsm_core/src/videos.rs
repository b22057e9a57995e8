//! Video list: filter form state, paging and debounced reloads.

use crate::action::AjaxAction;
use crate::tree::{NodeKind, TreeNodeRef};

/// Delay between the last filter edit and the reload it triggers.
pub const VIDEO_RELOAD_DEBOUNCE_MS: u64 = 200;
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 50;
pub const VIDEOS_FAILED_TEXT: &str = "An error occurred while retrieving the video list!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    Newest,
    Oldest,
    Playlist,
    PlaylistReverse,
    Popularity,
    Rating,
}

impl VideoSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoSort::Newest => "newest",
            VideoSort::Oldest => "oldest",
            VideoSort::Playlist => "playlist",
            VideoSort::PlaylistReverse => "playlist_reverse",
            VideoSort::Popularity => "popularity",
            VideoSort::Rating => "rating",
        }
    }
}

/// Three-way "show only" selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFilter {
    Yes,
    No,
    #[default]
    All,
}

impl ShowFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowFilter::Yes => "y",
            ShowFilter::No => "n",
            ShowFilter::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFilter {
    pub query: String,
    pub sort: VideoSort,
    pub show_watched: ShowFilter,
    pub show_downloaded: ShowFilter,
    pub results_per_page: u32,
    pub page: u32,
    pub folder_id: Option<u64>,
    pub subscription_id: Option<u64>,
}

impl Default for VideoFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: VideoSort::default(),
            show_watched: ShowFilter::default(),
            show_downloaded: ShowFilter::default(),
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            page: 1,
            folder_id: None,
            subscription_id: None,
        }
    }
}

impl VideoFilter {
    /// Restricts the list to the selected tree node; `None` shows everything.
    pub fn select(&mut self, node: Option<TreeNodeRef>) {
        self.folder_id = None;
        self.subscription_id = None;
        match node {
            Some(TreeNodeRef {
                kind: NodeKind::Folder,
                id,
            }) => self.folder_id = Some(id),
            Some(TreeNodeRef {
                kind: NodeKind::Subscription,
                id,
            }) => self.subscription_id = Some(id),
            None => {}
        }
    }

    pub fn apply(&mut self, edit: FilterEdit) {
        match edit {
            FilterEdit::Query(query) => self.query = query,
            FilterEdit::Sort(sort) => self.sort = sort,
            FilterEdit::ShowWatched(show) => self.show_watched = show,
            FilterEdit::ShowDownloaded(show) => self.show_downloaded = show,
            FilterEdit::ResultsPerPage(count) => self.results_per_page = count,
        }
    }

    /// Field values as the filter form serializes them.
    pub fn form_values(&self) -> Vec<(String, String)> {
        let optional = |id: Option<u64>| id.map(|id| id.to_string()).unwrap_or_default();
        vec![
            ("query".into(), self.query.clone()),
            ("sort".into(), self.sort.as_str().into()),
            ("show_watched".into(), self.show_watched.as_str().into()),
            ("show_downloaded".into(), self.show_downloaded.as_str().into()),
            ("subscription_id".into(), optional(self.subscription_id)),
            ("folder_id".into(), optional(self.folder_id)),
            ("page".into(), self.page.to_string()),
            ("results_per_page".into(), self.results_per_page.to_string()),
        ]
    }
}

/// User edits to the visible filter inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    Query(String),
    Sort(VideoSort),
    ShowWatched(ShowFilter),
    ShowDownloaded(ShowFilter),
    ResultsPerPage(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCard {
    pub title: String,
    /// Action links found on the card.
    pub actions: Vec<AjaxAction>,
}

/// One page of the video list as served by the site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoPage {
    pub videos: Vec<VideoCard>,
    /// Page numbers offered by the paging buttons.
    pub pages: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VideoListContent {
    #[default]
    NotLoaded,
    Loaded(VideoPage),
    Failed,
}

#[derive(Debug, Default)]
pub struct VideoList {
    filter: VideoFilter,
    content: VideoListContent,
    last_seq: u64,
    loading: Option<u64>,
    reload_due_ms: Option<u64>,
}

impl VideoList {
    pub fn filter(&self) -> &VideoFilter {
        &self.filter
    }

    pub fn content(&self) -> &VideoListContent {
        &self.content
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub(crate) fn filter_mut(&mut self) -> &mut VideoFilter {
        &mut self.filter
    }

    /// Starts a load of the current filter. A newer load supersedes any older one.
    pub(crate) fn begin_load(&mut self) -> (u64, Vec<(String, String)>) {
        self.reload_due_ms = None;
        self.last_seq += 1;
        self.loading = Some(self.last_seq);
        (self.last_seq, self.filter.form_values())
    }

    /// Accepts the reply to the latest load only.
    pub(crate) fn finish_load(&mut self, seq: u64, result: Result<VideoPage, String>) -> bool {
        if self.loading != Some(seq) {
            return false;
        }
        self.loading = None;
        self.content = match result {
            Ok(page) => VideoListContent::Loaded(page),
            Err(_) => VideoListContent::Failed,
        };
        true
    }

    /// Back to page one, reloading once edits stop for the debounce delay.
    pub(crate) fn schedule_reload(&mut self, now_ms: u64) {
        self.filter.page = 1;
        self.reload_due_ms = Some(now_ms + VIDEO_RELOAD_DEBOUNCE_MS);
    }

    pub(crate) fn reload_due(&self, now_ms: u64) -> bool {
        self.reload_due_ms.is_some_and(|due| now_ms >= due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn selection_sets_exactly_one_filter() {
        let mut filter = VideoFilter::default();
        filter.select(Some(TreeNodeRef::folder(3)));
        assert_eq!((filter.folder_id, filter.subscription_id), (Some(3), None));
        filter.select(Some(TreeNodeRef::subscription(8)));
        assert_eq!((filter.folder_id, filter.subscription_id), (None, Some(8)));
        filter.select(None);
        assert_eq!((filter.folder_id, filter.subscription_id), (None, None));
    }

    #[test]
    fn form_values_use_server_choice_keys() {
        let mut filter = VideoFilter::default();
        filter.apply(FilterEdit::Sort(VideoSort::PlaylistReverse));
        filter.apply(FilterEdit::ShowWatched(ShowFilter::No));
        filter.select(Some(TreeNodeRef::folder(2)));
        let values = filter.form_values();
        let get = |key: &str| {
            values
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str())
        };
        assert_eq!(get("sort"), Some("playlist_reverse"));
        assert_eq!(get("show_watched"), Some("n"));
        assert_eq!(get("show_downloaded"), Some("all"));
        assert_eq!(get("folder_id"), Some("2"));
        assert_eq!(get("subscription_id"), Some(""));
        assert_eq!(get("page"), Some("1"));
        assert_eq!(get("results_per_page"), Some("50"));
    }

    #[test]
    fn only_latest_load_lands() {
        let mut list = VideoList::default();
        let (first, _) = list.begin_load();
        let (second, _) = list.begin_load();
        assert!(!list.finish_load(first, Ok(VideoPage::default())));
        assert!(list.is_loading());
        assert!(list.finish_load(second, Err("timeout".into())));
        assert_eq!(list.content(), &VideoListContent::Failed);
    }
}
