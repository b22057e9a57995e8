use chardetng::EncodingDetector;
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use encoding_rs::Encoding;
use serde::Deserialize;
use serde_json::Value;
use ytsm_core::{
    FieldErrors, Job, Notification, PollOutcome, RawSubmitReply, TreeNode, TreeNodeRef,
    ROOT_PARENT,
};
use ytsm_logging::ytsm_warn;

use crate::HttpReply;

const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}: {message}")]
    Charset { encoding: String, message: String },
    #[error("malformed json: {0}")]
    Json(String),
}

#[derive(Debug, Deserialize)]
struct WireJob {
    id: u64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    progress: f64,
}

/// Turns a jobs endpoint reply into a poll outcome.
///
/// Anything not served as `application/json` counts as "no job list".
pub fn decode_jobs(reply: &HttpReply) -> PollOutcome {
    if reply.media_type().as_deref() != Some(JSON_MEDIA_TYPE) {
        return PollOutcome::NotJson {
            content_type: reply.content_type.clone(),
        };
    }
    match serde_json::from_slice::<Vec<WireJob>>(&reply.body) {
        Ok(jobs) => PollOutcome::Jobs(
            jobs.into_iter()
                .map(|job| Job::new(job.id, job.description, job.message, job.progress))
                .collect(),
        ),
        Err(err) => PollOutcome::Failed(DecodeError::Json(err.to_string()).to_string()),
    }
}

/// Reads `{success, errors}` without judging it; a non-JSON body yields an empty reply.
pub fn decode_submit_reply(body: &[u8]) -> RawSubmitReply {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return RawSubmitReply::default();
    };
    RawSubmitReply {
        success: map.get("success").and_then(Value::as_bool),
        errors: map.get("errors").and_then(decode_field_errors),
    }
}

fn decode_field_errors(value: &Value) -> Option<Vec<FieldErrors>> {
    value
        .as_object()?
        .iter()
        .map(|(field, entries)| {
            let messages = entries
                .as_array()?
                .iter()
                .map(|entry| entry.get("message")?.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?;
            Some(FieldErrors {
                field: field.clone(),
                messages,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct WireTreeNode {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    state: Option<WireNodeState>,
}

#[derive(Debug, Deserialize)]
struct WireNodeState {
    #[serde(default)]
    opened: bool,
}

/// Decodes the flat tree listing. Nodes with unrecognised ids are skipped.
pub fn decode_tree(body: &[u8]) -> Result<Vec<TreeNode>, DecodeError> {
    let wire: Vec<WireTreeNode> =
        serde_json::from_slice(body).map_err(|err| DecodeError::Json(err.to_string()))?;

    let nodes = wire
        .into_iter()
        .filter_map(|node| {
            let id = match node.id.parse::<TreeNodeRef>() {
                Ok(id) => id,
                Err(err) => {
                    ytsm_warn!("Skipping tree node: {}", err);
                    return None;
                }
            };
            let parent = node
                .parent
                .as_deref()
                .filter(|parent| *parent != ROOT_PARENT)
                .and_then(|parent| parent.parse().ok());
            Some(TreeNode {
                node: id,
                text: node.text,
                parent,
                icon: node.icon,
                opened: node.state.is_some_and(|state| state.opened),
            })
        })
        .collect();
    Ok(nodes)
}

#[derive(Debug, Deserialize)]
struct WireNotification {
    id: u64,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    status: Option<String>,
}

/// Decodes the notification list. Timestamps are reduced to local hour and minute.
pub fn decode_notifications(body: &[u8]) -> Result<Vec<Notification>, DecodeError> {
    let wire: Vec<WireNotification> =
        serde_json::from_slice(body).map_err(|err| DecodeError::Json(err.to_string()))?;
    Ok(wire
        .into_iter()
        .map(|entry| Notification {
            id: entry.id,
            time: entry.time.as_deref().and_then(clock_time),
            kind: entry.msg,
            status: entry.status,
        })
        .collect())
}

/// Offset timestamps are shown in local time; naive ones are taken as local already.
fn clock_time(raw: &str) -> Option<(u32, u32)> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        let local = time.with_timezone(&Local);
        return Some((local.hour(), local.minute()));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|time| (time.hour(), time.minute()))
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> chardetng fallback.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> Result<String, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, enc);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            key.eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        })
        .next()
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<String, DecodeError> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(DecodeError::Charset {
            encoding: enc.name().to_string(),
            message: "decoding error".into(),
        });
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn json_reply(body: &str) -> HttpReply {
        HttpReply {
            status: 200,
            content_type: Some("application/json".into()),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn decodes_job_list() {
        let reply = json_reply(
            r#"[{"id": 1, "description": "Download", "message": "50%", "progress": 0.5}]"#,
        );
        assert_eq!(
            decode_jobs(&reply),
            PollOutcome::Jobs(vec![Job::new(1, "Download", "50%", 0.5)])
        );
    }

    #[test]
    fn html_reply_is_not_a_job_list() {
        let reply = HttpReply {
            status: 200,
            content_type: Some("text/html; charset=utf-8".into()),
            body: b"<html>login</html>".to_vec(),
        };
        assert_eq!(
            decode_jobs(&reply),
            PollOutcome::NotJson {
                content_type: Some("text/html; charset=utf-8".into())
            }
        );
    }

    #[test]
    fn json_with_parameters_still_counts() {
        let mut reply = json_reply("[]");
        reply.content_type = Some("Application/JSON; charset=utf-8".into());
        assert_eq!(decode_jobs(&reply), PollOutcome::Jobs(Vec::new()));
    }

    #[test]
    fn broken_json_is_a_failed_poll() {
        let reply = json_reply(r#"{"id": 1}"#);
        assert!(matches!(decode_jobs(&reply), PollOutcome::Failed(_)));
    }

    #[test]
    fn submit_reply_shapes() {
        assert_eq!(
            decode_submit_reply(br#"{"success": true}"#),
            RawSubmitReply {
                success: Some(true),
                errors: None
            }
        );
        assert_eq!(
            decode_submit_reply(br#"{"success": false, "errors": {"__all__": [{"message": "bad"}]}}"#),
            RawSubmitReply {
                success: Some(false),
                errors: Some(vec![FieldErrors {
                    field: "__all__".into(),
                    messages: vec!["bad".into()],
                }]),
            }
        );
        assert_eq!(decode_submit_reply(b"<html></html>"), RawSubmitReply::default());
        assert_eq!(
            decode_submit_reply(br#"{"success": "yes", "errors": {"name": ["plain"]}}"#),
            RawSubmitReply::default()
        );
    }

    #[test]
    fn tree_nodes_resolve_parents() {
        let body = br##"[
            {"id": "folder1", "text": "Music", "type": "folder", "state": {"opened": true}, "parent": "#"},
            {"id": "sub4", "text": "Band", "type": "sub", "icon": "/t.png", "parent": "folder1"},
            {"id": "video9", "text": "?", "parent": "#"}
        ]"##;
        let nodes = decode_tree(body).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].parent, None);
        assert!(nodes[0].opened);
        assert_eq!(nodes[1].parent, Some(TreeNodeRef::folder(1)));
        assert_eq!(nodes[1].icon.as_deref(), Some("/t.png"));
    }

    #[test]
    fn notifications_keep_wall_clock() {
        let body = br#"[
            {"id": 3, "time": "2024-05-01T07:04:59.120", "msg": "st-up", "uid": null, "status": "Synchronizing"},
            {"id": 4, "time": "garbage", "msg": "st-op-end", "operation": 1, "status": "done"}
        ]"#;
        let entries = decode_notifications(body).unwrap();
        assert_eq!(
            entries[0],
            Notification::status_update(3, Some((7, 4)), "Synchronizing")
        );
        assert_eq!(entries[1].time, None);
        assert_eq!(entries[1].kind, "st-op-end");
        assert!(decode_notifications(b"{}").is_err());
    }

    #[test]
    fn charset_from_header_is_honoured() {
        let bytes = [0x63, 0x61, 0x66, 0xe9];
        let text = decode_html(&bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(text, "café");
    }
}
