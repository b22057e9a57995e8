use scraper::{Html, Selector};
use ytsm_core::{AjaxAction, VideoCard, VideoPage};

/// Reads the server-rendered video list: one `.card` per video, its
/// `.card-title`, the `.ajax-link` actions on it and the paging buttons.
pub fn parse_video_page(html: &str) -> VideoPage {
    let doc = Html::parse_fragment(html);
    let (Some(card), Some(title), Some(link), Some(paging)) = (
        selector(".card"),
        selector(".card-title"),
        selector(".ajax-link[data-post-url]"),
        selector(".btn-paging[data-navigation-page]"),
    ) else {
        return VideoPage::default();
    };

    let videos = doc
        .select(&card)
        .map(|card| VideoCard {
            title: card
                .select(&title)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default(),
            actions: card
                .select(&link)
                .filter_map(|el| el.value().attr("data-post-url"))
                .filter_map(AjaxAction::from_path)
                .collect(),
        })
        .collect();

    let mut pages: Vec<u32> = doc
        .select(&paging)
        .filter_map(|el| el.value().attr("data-navigation-page")?.trim().parse().ok())
        .collect();
    pages.sort_unstable();
    pages.dedup();

    VideoPage { videos, pages }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cards_actions_and_pages() {
        let html = r#"
            <div class="row">
              <div class="card"><div class="card-body">
                <h5 class="card-title"> Live at the Apollo </h5>
                <a class="ajax-link" href="" data-post-url="/ajax/action/mark_video_watched/31">Watched</a>
                <a class="ajax-link" href="" data-post-url="/ajax/action/download_video_files/31">Download</a>
                <a class="ajax-link" href="" data-post-url="/ajax/action/launch_rocket/31">?</a>
              </div></div>
              <div class="card"><h5 class="card-title">Outtakes</h5></div>
            </div>
            <button class="btn-paging" data-navigation-page="2">2</button>
            <button class="btn-paging" data-navigation-page="1">1</button>
            <button class="btn-paging" data-navigation-page="2">Next</button>"#;
        let page = parse_video_page(html);
        assert_eq!(page.pages, vec![1, 2]);
        assert_eq!(page.videos.len(), 2);
        assert_eq!(page.videos[0].title, "Live at the Apollo");
        assert_eq!(
            page.videos[0].actions,
            vec![
                AjaxAction::MarkVideoWatched(31),
                AjaxAction::DownloadVideoFiles(31)
            ]
        );
        assert!(page.videos[1].actions.is_empty());
    }

    #[test]
    fn empty_listing() {
        assert_eq!(parse_video_page("<p>No videos.</p>"), VideoPage::default());
    }
}
