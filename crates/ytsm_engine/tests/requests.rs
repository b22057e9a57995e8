use std::sync::{Mutex, Once};
use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ytsm_core::{
    AjaxAction, FileUpload, FormEncoding, FormSubmission, Job, Notification, PollOutcome,
    TreeNodeRef,
};
use ytsm_engine::{
    handle_command, EngineCommand, EngineConfig, EngineEvent, EventSink, FailureKind,
    HttpSettings, ReqwestTransport,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ytsm_logging::initialize_for_tests);
}

#[derive(Default)]
struct Collect(Mutex<Vec<EngineEvent>>);

impl EventSink for Collect {
    fn emit(&self, event: EngineEvent) {
        self.0.lock().unwrap().push(event);
    }
}

async fn run(server: &MockServer, http: HttpSettings, command: EngineCommand) -> EngineEvent {
    init_logging();
    let mut config = EngineConfig::new(&server.uri()).unwrap();
    config.http = http;
    let transport = ReqwestTransport::new(&config.http).unwrap();
    let sink = Collect::default();
    handle_command(&config, &transport, command, &sink).await;
    let mut events = sink.0.into_inner().unwrap();
    assert_eq!(events.len(), 1);
    events.remove(0)
}

#[tokio::test]
async fn job_poll_decodes_json_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/get_running_jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"id": 7, "description": "Downloading", "message": "video 2/5", "progress": 0.4}]"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let event = run(&server, HttpSettings::default(), EngineCommand::PollJobs { seq: 3 }).await;
    assert_eq!(
        event,
        EngineEvent::JobsPolled {
            seq: 3,
            outcome: PollOutcome::Jobs(vec![Job::new(7, "Downloading", "video 2/5", 0.4)]),
        }
    );
}

#[tokio::test]
async fn login_page_instead_of_jobs_is_not_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/get_running_jobs/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>Sign in</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let event = run(&server, HttpSettings::default(), EngineCommand::PollJobs { seq: 1 }).await;
    assert_eq!(
        event,
        EngineEvent::JobsPolled {
            seq: 1,
            outcome: PollOutcome::NotJson {
                content_type: Some("text/html; charset=utf-8".into())
            },
        }
    );
}

#[tokio::test]
async fn missing_jobs_endpoint_is_a_failed_poll() {
    let server = MockServer::start().await;

    let event = run(&server, HttpSettings::default(), EngineCommand::PollJobs { seq: 2 }).await;
    let EngineEvent::JobsPolled { seq, outcome } = event else {
        panic!("expected a poll reply");
    };
    assert_eq!(seq, 2);
    assert!(matches!(outcome, PollOutcome::Failed(reason) if reason.contains("404")));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/get_tree/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("[]", "application/json")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let http = HttpSettings {
        request_timeout: Duration::from_millis(200),
        ..HttpSettings::default()
    };
    let event = run(&server, http, EngineCommand::LoadTree).await;
    let EngineEvent::TreeLoaded(Err(err)) = event else {
        panic!("expected a failed tree load");
    };
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn tree_listing_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/get_tree/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r##"[{"id": "folder2", "text": "News", "parent": "#"},
                 {"id": "sub5", "text": "Daily", "parent": "folder2"}]"##,
            "application/json",
        ))
        .mount(&server)
        .await;

    let EngineEvent::TreeLoaded(Ok(nodes)) =
        run(&server, HttpSettings::default(), EngineCommand::LoadTree).await
    else {
        panic!("expected a tree");
    };
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].node, TreeNodeRef::subscription(5));
    assert_eq!(nodes[1].parent, Some(TreeNodeRef::folder(2)));
}

#[tokio::test]
async fn modal_fragment_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modal/create_folder/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<div class="modal"><form action="/modal/create_folder/" method="post">
                 <input type="hidden" name="csrfmiddlewaretoken" value="abc">
                 <h5 class="modal-title">New folder</h5>
                 <input type="text" name="name"></form></div>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let event = run(
        &server,
        HttpSettings::default(),
        EngineCommand::LoadModal {
            token: 9,
            path: "modal/create_folder/".into(),
        },
    )
    .await;
    let EngineEvent::ModalLoaded {
        token: 9,
        result: Ok(form),
    } = event
    else {
        panic!("expected a parsed dialog");
    };
    assert_eq!(form.fields, vec!["name".to_string()]);
    assert_eq!(form.hidden, vec![("csrfmiddlewaretoken".into(), "abc".into())]);
    assert_eq!(form.title.as_deref(), Some("New folder"));
}

#[tokio::test]
async fn modal_without_form_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modal/delete_folder/4/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>gone</p>", "text/html"))
        .mount(&server)
        .await;

    let event = run(
        &server,
        HttpSettings::default(),
        EngineCommand::LoadModal {
            token: 1,
            path: "modal/delete_folder/4/".into(),
        },
    )
    .await;
    let EngineEvent::ModalLoaded { result: Err(err), .. } = event else {
        panic!("expected a failure");
    };
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn submission_carries_csrf_header_and_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/modal/update_folder/3/"))
        .and(header("X-CSRFToken", "tok"))
        .and(body_string_contains("name=Music+Videos"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success": false, "errors": {"name": [{"message": "Taken."}]}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let http = HttpSettings {
        csrf_token: Some("tok".into()),
        ..HttpSettings::default()
    };
    let event = run(
        &server,
        http,
        EngineCommand::SubmitModal {
            token: 4,
            submission: FormSubmission {
                action: "/modal/update_folder/3/".into(),
                encoding: FormEncoding::UrlEncoded,
                values: vec![("name".into(), "Music Videos".into())],
                files: Vec::new(),
            },
        },
    )
    .await;
    let EngineEvent::ModalReplied {
        token: 4,
        result: Ok(reply),
    } = event
    else {
        panic!("expected a reply");
    };
    assert_eq!(reply.success, Some(false));
    let errors = reply.errors.unwrap();
    assert_eq!(errors[0].field, "name");
    assert_eq!(errors[0].messages, vec!["Taken.".to_string()]);
}

#[tokio::test]
async fn multipart_submission_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/modal/import_subscriptions/"))
        .and(body_string_contains("playlist_urls"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"success": true}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let event = run(
        &server,
        HttpSettings::default(),
        EngineCommand::SubmitModal {
            token: 2,
            submission: FormSubmission {
                action: "modal/import_subscriptions/".into(),
                encoding: FormEncoding::Multipart,
                values: vec![("playlist_urls".into(), "https://youtube.com/x".into())],
                files: Vec::new(),
            },
        },
    )
    .await;
    let EngineEvent::ModalReplied { result: Ok(reply), .. } = event else {
        panic!("expected a reply");
    };
    assert_eq!(reply.success, Some(true));
}

#[tokio::test]
async fn multipart_submission_uploads_file_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/modal/import_subscriptions/"))
        .and(body_string_contains(r#"name="file"; filename="subs.opml""#))
        .and(body_string_contains("<opml version=\"1.0\"/>"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"success": true}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let event = run(
        &server,
        HttpSettings::default(),
        EngineCommand::SubmitModal {
            token: 3,
            submission: FormSubmission {
                action: "modal/import_subscriptions/".into(),
                encoding: FormEncoding::Multipart,
                values: vec![("playlist_urls".into(), String::new())],
                files: vec![FileUpload {
                    field: "file".into(),
                    file_name: "subs.opml".into(),
                    bytes: br#"<opml version="1.0"/>"#.to_vec(),
                }],
            },
        },
    )
    .await;
    let EngineEvent::ModalReplied { result: Ok(reply), .. } = event else {
        panic!("expected a reply");
    };
    assert_eq!(reply.success, Some(true));
}

#[tokio::test]
async fn notifications_are_fetched_from_last_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/get_notifications/12"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"id": 12, "time": "2024-05-01T18:09:00", "msg": "st-up", "uid": 1, "status": "Sync done"}]"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let event = run(
        &server,
        HttpSettings::default(),
        EngineCommand::FetchNotifications { after_id: 12 },
    )
    .await;
    assert_eq!(
        event,
        EngineEvent::NotificationsPolled {
            after_id: 12,
            result: Ok(vec![Notification::status_update(12, Some((18, 9)), "Sync done")]),
        }
    );
}

#[tokio::test]
async fn video_list_posts_filter_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ajax/get_videos/"))
        .and(body_string_contains("sort=newest"))
        .and(body_string_contains("folder_id=2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<div class="card"><h5 class="card-title">Intro</h5>
                 <a class="ajax-link" data-post-url="/ajax/action/mark_video_unwatched/5">x</a></div>
               <button class="btn-paging" data-navigation-page="2">2</button>"#,
            "text/html; charset=utf-8",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let event = run(
        &server,
        HttpSettings::default(),
        EngineCommand::LoadVideos {
            seq: 6,
            form: vec![
                ("sort".into(), "newest".into()),
                ("folder_id".into(), "2".into()),
            ],
        },
    )
    .await;
    let EngineEvent::VideosLoaded {
        seq: 6,
        result: Ok(page),
    } = event
    else {
        panic!("expected a video list");
    };
    assert_eq!(page.videos[0].title, "Intro");
    assert_eq!(page.videos[0].actions, vec![AjaxAction::MarkVideoUnwatched(5)]);
    assert_eq!(page.pages, vec![2]);
}

#[tokio::test]
async fn actions_post_to_their_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ajax/action/mark_video_watched/12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"success": true}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let event = run(
        &server,
        HttpSettings::default(),
        EngineCommand::PostAction(AjaxAction::MarkVideoWatched(12)),
    )
    .await;
    assert!(matches!(
        event,
        EngineEvent::ActionCompleted {
            action: AjaxAction::MarkVideoWatched(12),
            result: Ok(_),
        }
    ));
}
