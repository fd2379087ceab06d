//! IPC message dispatch — parse s-expressions and route to handlers.
//!
//! Requests are plists `(:type :NAME :id N ...)`. Responses are
//! `(:type :response :id N :status :ok ...)` or `:status :error` with a
//! reason. Malformed frames are rejected here and never reach the
//! recognition core.

use lexpr::Value;
use tracing::{debug, info, warn};

use super::server::IpcServer;
use crate::input::buffer::BufferKind;
use crate::recognition::trigger::TriggerConfig;
use crate::recognition::vocabulary::{Preset, Vocabulary};
use crate::session::{PracticeSession, SessionConfig};
use crate::state::{unix_millis, EngineState};
use crate::tracking::landmarks::{HandFrame, HandPose, Handedness, LANDMARK_COUNT};

/// Protocol version expected in the hello handshake.
const PROTOCOL_VERSION: i64 = 1;

/// Parse an s-expression message and dispatch to the appropriate
/// handler. Returns an optional response string.
pub fn handle_message(state: &mut EngineState, client_id: u64, raw: &str) -> Option<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(client_id, "malformed s-expression: {}", e);
            return Some(error_response(0, &format!("malformed s-expression: {e}")));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    // hello must be the first message on a connection
    let is_authenticated = state
        .ipc_server
        .clients
        .get(&client_id)
        .map(|c| c.authenticated)
        .unwrap_or(false);

    match msg_type.as_deref() {
        Some("hello") => handle_hello(state, client_id, msg_id, &value),
        _ if !is_authenticated => Some(error_response(msg_id, "hello handshake required")),
        Some("ping") => handle_ping(msg_id),
        Some("session-start") => handle_session_start(state, msg_id, &value),
        Some("session-stop") => handle_session_stop(state, msg_id, &value),
        Some("session-status") => handle_session_status(state, msg_id, &value),
        Some("frame") => handle_frame(state, msg_id, &value),
        Some("train-pose") => handle_train_pose(state, msg_id, &value),
        Some("registry-list") => handle_registry_list(state, msg_id),
        Some("trigger-config") => handle_trigger_config(state, msg_id, &value),
        Some("trigger-config-set") => handle_trigger_config_set(state, msg_id, &value),
        Some("engine-status") => handle_engine_status(state, msg_id),
        Some("shutdown") => handle_shutdown(state, msg_id),
        Some(other) => Some(error_response(
            msg_id,
            &format!("unknown message type: {other}"),
        )),
        None => Some(error_response(msg_id, "missing :type field")),
    }
}

// ── Handlers ────────────────────────────────────────────────

fn handle_hello(
    state: &mut EngineState,
    client_id: u64,
    msg_id: i64,
    value: &Value,
) -> Option<String> {
    let version = get_int(value, "version").unwrap_or(0);
    if version != PROTOCOL_VERSION {
        return Some(error_response(
            msg_id,
            &format!("unsupported protocol version: {version}"),
        ));
    }

    // SO_PEERCRED: only clients of the daemon's own UID may connect.
    if let Some(client) = state.ipc_server.clients.get(&client_id) {
        if let Some(peer_uid) = client.peer_uid {
            let our_uid = unsafe { libc::getuid() };
            if peer_uid != our_uid {
                warn!(client_id, peer_uid, our_uid, "rejecting client: UID mismatch");
                return Some(error_response(msg_id, "authentication failed: UID mismatch"));
            }
        }
    }

    let client_name = get_string(value, "client").unwrap_or_default();
    debug!(client_id, client = %client_name, "hello handshake (authenticated)");

    let peer_pid = state
        .ipc_server
        .clients
        .get(&client_id)
        .and_then(|c| c.peer_pid);
    if let Some(client) = state.ipc_server.clients.get_mut(&client_id) {
        client.authenticated = true;
    }

    let pid_field = peer_pid
        .map(|p| format!(" :peer-pid {}", p))
        .unwrap_or_default();
    Some(format!(
        "(:type :hello :id {} :version {} :server \"mudra-engine\" :features (:sessions t :training t){})",
        msg_id, PROTOCOL_VERSION, pid_field
    ))
}

fn handle_ping(msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :pong t :time {})",
        msg_id,
        unix_millis()
    ))
}

fn handle_session_start(state: &mut EngineState, msg_id: i64, value: &Value) -> Option<String> {
    let name = match get_string(value, "session") {
        Some(n) if !n.is_empty() => n,
        _ => return Some(error_response(msg_id, "missing :session field")),
    };

    let vocabulary = match get_value(value, "vocabulary") {
        None => Vocabulary::preset(Preset::Alphabet),
        Some(v) if matches!(v, Value::Cons(_)) => {
            let names: Vec<String> = flatten_list(v).iter().filter_map(|x| atom_string(x)).collect();
            if names.is_empty() {
                return Some(error_response(msg_id, "empty vocabulary list"));
            }
            Vocabulary::new(names)
        }
        Some(atom) => match atom_string(atom).as_deref().and_then(Preset::parse) {
            Some(preset) => Vocabulary::preset(preset),
            None => return Some(error_response(msg_id, "unknown vocabulary preset")),
        },
    };

    let buffer = match get_keyword(value, "buffer") {
        None => BufferKind::Text,
        Some(s) => match BufferKind::parse(&s) {
            Some(kind) => kind,
            None => return Some(error_response(msg_id, &format!("unknown buffer kind: {s}"))),
        },
    };

    let config = SessionConfig {
        vocabulary,
        buffer,
        trigger: TriggerConfig::default(),
    };
    let vocabulary_size = config.vocabulary.len();
    let replaced = state
        .sessions
        .insert(name.clone(), PracticeSession::new(&name, config))
        .is_some();
    info!(session = %name, vocabulary_size, replaced, "session started");

    let event = format_event(
        "session-started",
        &[("session", &format!("\"{}\"", escape_string(&name)))],
    );
    IpcServer::broadcast_event(state, &event);

    Some(format!(
        "(:type :response :id {} :status :ok :session \"{}\" :vocabulary-size {})",
        msg_id,
        escape_string(&name),
        vocabulary_size
    ))
}

fn handle_session_stop(state: &mut EngineState, msg_id: i64, value: &Value) -> Option<String> {
    let name = match get_string(value, "session") {
        Some(n) => n,
        None => return Some(error_response(msg_id, "missing :session field")),
    };
    if state.sessions.remove(&name).is_none() {
        return Some(error_response(msg_id, &format!("unknown session: {name}")));
    }
    info!(session = %name, "session stopped");

    let event = format_event(
        "session-stopped",
        &[("session", &format!("\"{}\"", escape_string(&name)))],
    );
    IpcServer::broadcast_event(state, &event);
    Some(ok_response(msg_id))
}

fn handle_session_status(state: &mut EngineState, msg_id: i64, value: &Value) -> Option<String> {
    let name = match get_string(value, "session") {
        Some(n) => n,
        None => return Some(error_response(msg_id, "missing :session field")),
    };
    match state.sessions.get(&name) {
        Some(session) => Some(format!(
            "(:type :response :id {} :status :ok :snapshot {})",
            msg_id,
            session.status_sexp()
        )),
        None => Some(error_response(msg_id, &format!("unknown session: {name}"))),
    }
}

fn handle_frame(state: &mut EngineState, msg_id: i64, value: &Value) -> Option<String> {
    let name = match get_string(value, "session") {
        Some(n) => n,
        None => return Some(error_response(msg_id, "missing :session field")),
    };
    let now_ms = match get_int(value, "time") {
        Some(t) if t >= 0 => t as u64,
        _ => return Some(error_response(msg_id, "missing or invalid :time field")),
    };

    let mut hands: Vec<HandFrame> = Vec::new();
    if let Some(hands_value) = get_value(value, "hands") {
        for hand_value in list_elements(hands_value) {
            match parse_hand_frame(hand_value) {
                Ok(hand) => hands.push(hand),
                Err(reason) => return Some(error_response(msg_id, &reason)),
            }
        }
    }
    if hands.len() > 2 {
        return Some(error_response(
            msg_id,
            &format!("too many hands: {} (expected 0-2)", hands.len()),
        ));
    }

    // Cheap Arc clone; keeps the session borrow free of the registry.
    let registry = state.registry.clone();
    let (committed, snapshot, buffer_display) = match state.sessions.get_mut(&name) {
        Some(session) => {
            let committed = session.process_frame(&registry, &hands, now_ms);
            (
                committed,
                session.status_sexp(),
                session.buffer.display().to_string(),
            )
        }
        None => return Some(error_response(msg_id, &format!("unknown session: {name}"))),
    };
    state.frames_total += 1;

    if let Some(symbol) = &committed {
        let event = format_event(
            "commit",
            &[
                ("session", &format!("\"{}\"", escape_string(&name))),
                ("symbol", &format!("\"{}\"", escape_string(symbol))),
                ("buffer", &format!("\"{}\"", escape_string(&buffer_display))),
                ("time", &now_ms.to_string()),
            ],
        );
        IpcServer::broadcast_event(state, &event);
    }

    let committed_field = committed
        .map(|s| format!("\"{}\"", escape_string(&s)))
        .unwrap_or_else(|| "nil".to_string());
    Some(format!(
        "(:type :response :id {} :status :ok :committed {} :snapshot {})",
        msg_id, committed_field, snapshot
    ))
}

fn handle_train_pose(state: &mut EngineState, msg_id: i64, value: &Value) -> Option<String> {
    let name = match get_string(value, "name") {
        Some(n) if !n.is_empty() => n,
        _ => return Some(error_response(msg_id, "missing :name field")),
    };
    let landmarks = match get_value(value, "landmarks") {
        Some(v) => v,
        None => return Some(error_response(msg_id, "missing :landmarks field")),
    };
    let pose = match parse_pose(landmarks) {
        Ok(pose) => pose,
        Err(reason) => return Some(error_response(msg_id, &reason)),
    };
    state.registry.upsert(&name, pose);
    Some(format!(
        "(:type :response :id {} :status :ok :name \"{}\" :registry-size {})",
        msg_id,
        escape_string(&name),
        state.registry.len()
    ))
}

fn handle_registry_list(state: &mut EngineState, msg_id: i64) -> Option<String> {
    let names = state
        .registry
        .names()
        .iter()
        .map(|n| format!("\"{}\"", escape_string(n)))
        .collect::<Vec<_>>()
        .join(" ");
    Some(format!(
        "(:type :response :id {} :status :ok :names ({}))",
        msg_id, names
    ))
}

fn handle_trigger_config(state: &mut EngineState, msg_id: i64, value: &Value) -> Option<String> {
    let name = match get_string(value, "session") {
        Some(n) => n,
        None => return Some(error_response(msg_id, "missing :session field")),
    };
    match state.sessions.get(&name) {
        Some(session) => Some(format!(
            "(:type :response :id {} :status :ok :config {})",
            msg_id,
            session.config.trigger.status_sexp()
        )),
        None => Some(error_response(msg_id, &format!("unknown session: {name}"))),
    }
}

fn handle_trigger_config_set(
    state: &mut EngineState,
    msg_id: i64,
    value: &Value,
) -> Option<String> {
    let name = match get_string(value, "session") {
        Some(n) => n,
        None => return Some(error_response(msg_id, "missing :session field")),
    };
    let session = match state.sessions.get_mut(&name) {
        Some(s) => s,
        None => return Some(error_response(msg_id, &format!("unknown session: {name}"))),
    };

    if let Some(threshold) = get_float(value, "curl-threshold") {
        if threshold <= 0.0 {
            return Some(error_response(msg_id, "curl-threshold must be positive"));
        }
        session.config.trigger.curl_threshold = threshold;
    }
    if let Some(interval) = get_int(value, "min-commit-interval-ms") {
        if interval < 0 {
            return Some(error_response(
                msg_id,
                "min-commit-interval-ms must be non-negative",
            ));
        }
        session.config.trigger.min_commit_interval_ms = interval as u64;
    }
    if let Some(fingers) = get_int(value, "min-curled-fingers") {
        if !(1..=5).contains(&fingers) {
            return Some(error_response(msg_id, "min-curled-fingers must be 1-5"));
        }
        session.config.trigger.min_curled_fingers = fingers as usize;
    }

    info!(session = %name, "trigger config updated");
    Some(format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id,
        session.config.trigger.status_sexp()
    ))
}

fn handle_engine_status(state: &mut EngineState, msg_id: i64) -> Option<String> {
    let mut names: Vec<String> = state.sessions.keys().cloned().collect();
    names.sort();
    let sessions = names
        .iter()
        .map(|n| format!("\"{}\"", escape_string(n)))
        .collect::<Vec<_>>()
        .join(" ");
    Some(format!(
        "(:type :response :id {} :status :ok :sessions ({}) :registry-size {} :uptime-secs {} :frames {})",
        msg_id,
        sessions,
        state.registry.len(),
        state.started_at.elapsed().as_secs(),
        state.frames_total
    ))
}

fn handle_shutdown(state: &mut EngineState, msg_id: i64) -> Option<String> {
    info!("shutdown requested over IPC");
    state.running = false;
    Some(ok_response(msg_id))
}

// ── Frame parsing ───────────────────────────────────────────

/// Parse one `(:handedness left|right :landmarks (x y z ...))` plist.
fn parse_hand_frame(value: &Value) -> Result<HandFrame, String> {
    let handedness_str = get_keyword(value, "handedness")
        .ok_or_else(|| "hand missing :handedness".to_string())?;
    let handedness = Handedness::parse(&handedness_str)
        .ok_or_else(|| format!("unknown handedness: {handedness_str}"))?;
    let landmarks = get_value(value, "landmarks")
        .ok_or_else(|| "hand missing :landmarks".to_string())?;
    let pose = parse_pose(landmarks)?;
    Ok(HandFrame { pose, handedness })
}

/// Parse a flat coordinate list into a 21-landmark pose.
fn parse_pose(value: &Value) -> Result<HandPose, String> {
    let coords: Vec<f64> = flatten_list(value)
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .collect();
    HandPose::from_coords(&coords).ok_or_else(|| {
        format!(
            "expected {} landmark coordinates, got {}",
            LANDMARK_COUNT * 3,
            coords.len()
        )
    })
}

// ── Helpers ────────────────────────────────────────────────

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Find the raw value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            if let Value::Cons(next) = pair.cdr() {
                return Some(next.car());
            }
            return None;
        }
        current = pair.cdr();
    }
    None
}

/// Render an atom (symbol, keyword, string, number) as a plain string.
fn atom_string(value: &Value) -> Option<String> {
    match value {
        Value::Keyword(k) => Some(k.to_string()),
        Value::Symbol(s) => {
            let s = s.to_string();
            Some(s.strip_prefix(':').unwrap_or(&s).to_string())
        }
        Value::String(s) => Some(s.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "t" } else { "nil" }.to_string()),
        _ => None,
    }
}

/// Extract a scalar keyword value from an s-expression plist.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    match get_value(value, key) {
        Some(Value::Null) => Some("nil".to_string()),
        Some(v) => atom_string(v).or_else(|| Some(v.to_string())),
        None => None,
    }
}

/// Extract an integer value from an s-expression plist.
fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a string value from an s-expression plist.
fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// Extract a floating-point value from an s-expression plist.
fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Elements of a proper list, in order.
fn list_elements(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        out.push(pair.car());
        current = pair.cdr();
    }
    out
}

/// Flatten a possibly nested list/cons structure into its leaf values.
fn flatten_list(value: &Value) -> Vec<&Value> {
    let mut result = Vec::new();
    fn walk<'a>(v: &'a Value, out: &mut Vec<&'a Value>) {
        match v {
            Value::Cons(pair) => {
                walk(pair.car(), out);
                walk(pair.cdr(), out);
            }
            Value::Null => {} // end of list
            other => out.push(other),
        }
    }
    walk(value, &mut result);
    result
}

/// Format an IPC event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::server::IpcClient;
    use crate::tracking::testutil::{closed_pose, open_pose, spread_pose};
    use std::os::unix::net::UnixStream;

    /// State with one connected, unauthenticated client (id 1).
    fn test_state() -> EngineState {
        let mut state = EngineState::new();
        let (stream, peer) = UnixStream::pair().unwrap();
        // Keep the peer end open so reads/writes stay well-defined.
        std::mem::forget(peer);
        state.ipc_server.clients.insert(1, IpcClient::new(stream, 1));
        state
    }

    fn authed_state() -> EngineState {
        let mut state = test_state();
        state.ipc_server.clients.get_mut(&1).unwrap().authenticated = true;
        state
    }

    /// Flat coordinate list sexp for a pose.
    fn coords_sexp(pose: &HandPose) -> String {
        let mut s = String::from("(");
        for lm in &pose.landmarks {
            s.push_str(&format!("{} {} {} ", lm.x, lm.y, lm.z));
        }
        s.push(')');
        s
    }

    fn start_session(state: &mut EngineState, name: &str, vocab: &str) {
        let msg = format!(
            "(:type :session-start :id 1 :session \"{}\" :vocabulary ({}) :buffer text)",
            name, vocab
        );
        let resp = handle_message(state, 1, &msg).unwrap();
        assert!(resp.contains(":status :ok"), "got {resp}");
    }

    fn train(state: &mut EngineState, name: &str, pose: &HandPose) {
        let msg = format!(
            "(:type :train-pose :id 1 :name \"{}\" :landmarks {})",
            name,
            coords_sexp(pose)
        );
        let resp = handle_message(state, 1, &msg).unwrap();
        assert!(resp.contains(":status :ok"), "got {resp}");
    }

    // ── Handshake ───────────────────────────────────────────

    #[test]
    fn test_hello_authenticates() {
        let mut state = test_state();
        let resp = handle_message(&mut state, 1, "(:type :hello :id 1 :version 1)").unwrap();
        assert!(resp.contains(":type :hello"));
        assert!(resp.contains(":server \"mudra-engine\""));
        assert!(state.ipc_server.clients[&1].authenticated);
    }

    #[test]
    fn test_hello_rejects_wrong_version() {
        let mut state = test_state();
        let resp = handle_message(&mut state, 1, "(:type :hello :id 1 :version 99)").unwrap();
        assert!(resp.contains(":status :error"));
        assert!(!state.ipc_server.clients[&1].authenticated);
    }

    #[test]
    fn test_unauthenticated_request_rejected() {
        let mut state = test_state();
        let resp = handle_message(&mut state, 1, "(:type :ping :id 2)").unwrap();
        assert!(resp.contains("hello handshake required"));
    }

    #[test]
    fn test_malformed_sexp() {
        let mut state = authed_state();
        let resp = handle_message(&mut state, 1, "(:type :ping").unwrap();
        assert!(resp.contains("malformed s-expression"));
    }

    #[test]
    fn test_unknown_type() {
        let mut state = authed_state();
        let resp = handle_message(&mut state, 1, "(:type :teleport :id 3)").unwrap();
        assert!(resp.contains("unknown message type: teleport"));
    }

    #[test]
    fn test_missing_type() {
        let mut state = authed_state();
        let resp = handle_message(&mut state, 1, "(:id 3)").unwrap();
        assert!(resp.contains("missing :type field"));
    }

    #[test]
    fn test_ping() {
        let mut state = authed_state();
        let resp = handle_message(&mut state, 1, "(:type :ping :id 2)").unwrap();
        assert!(resp.contains(":pong t"));
        assert!(resp.contains(":time "));
    }

    // ── Sessions ────────────────────────────────────────────

    #[test]
    fn test_session_start_with_preset() {
        let mut state = authed_state();
        let resp = handle_message(
            &mut state,
            1,
            "(:type :session-start :id 4 :session \"abc\" :vocabulary alphabet)",
        )
        .unwrap();
        assert!(resp.contains(":vocabulary-size 26"));
        assert!(state.sessions.contains_key("abc"));
    }

    #[test]
    fn test_session_start_with_name_list() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\" \"b\"");
        assert_eq!(state.sessions["s"].config.vocabulary.len(), 2);
    }

    #[test]
    fn test_session_start_unknown_preset() {
        let mut state = authed_state();
        let resp = handle_message(
            &mut state,
            1,
            "(:type :session-start :id 4 :session \"s\" :vocabulary emoji)",
        )
        .unwrap();
        assert!(resp.contains("unknown vocabulary preset"));
    }

    #[test]
    fn test_session_start_arithmetic_buffer() {
        let mut state = authed_state();
        let resp = handle_message(
            &mut state,
            1,
            "(:type :session-start :id 4 :session \"m\" :vocabulary arithmetic :buffer arithmetic)",
        )
        .unwrap();
        assert!(resp.contains(":status :ok"));
        assert_eq!(
            state.sessions["m"].config.buffer,
            BufferKind::Arithmetic
        );
    }

    #[test]
    fn test_session_stop() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let resp = handle_message(&mut state, 1, "(:type :session-stop :id 5 :session \"s\")")
            .unwrap();
        assert!(resp.contains(":status :ok"));
        assert!(state.sessions.is_empty());
    }

    #[test]
    fn test_session_stop_unknown() {
        let mut state = authed_state();
        let resp = handle_message(&mut state, 1, "(:type :session-stop :id 5 :session \"x\")")
            .unwrap();
        assert!(resp.contains("unknown session: x"));
    }

    #[test]
    fn test_session_status() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let resp =
            handle_message(&mut state, 1, "(:type :session-status :id 6 :session \"s\")").unwrap();
        assert!(resp.contains(":snapshot (:session \"s\""));
        assert!(resp.contains(":closed nil"));
    }

    // ── Frames ──────────────────────────────────────────────

    #[test]
    fn test_frame_commits_trained_symbol() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        train(&mut state, "a", &spread_pose());

        let msg = format!(
            "(:type :frame :id 7 :session \"s\" :time 100 :hands ((:handedness left :landmarks {}) (:handedness right :landmarks {})))",
            coords_sexp(&spread_pose()),
            coords_sexp(&closed_pose())
        );
        let resp = handle_message(&mut state, 1, &msg).unwrap();
        assert!(resp.contains(":committed \"a\""), "got {resp}");
        assert_eq!(state.sessions["s"].buffer.display(), "a");
        assert_eq!(state.frames_total, 1);
    }

    #[test]
    fn test_frame_open_trigger_does_not_commit() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        train(&mut state, "a", &spread_pose());

        let msg = format!(
            "(:type :frame :id 7 :session \"s\" :time 100 :hands ((:handedness left :landmarks {}) (:handedness right :landmarks {})))",
            coords_sexp(&spread_pose()),
            coords_sexp(&open_pose())
        );
        let resp = handle_message(&mut state, 1, &msg).unwrap();
        assert!(resp.contains(":committed nil"));
        assert!(resp.contains(":best \"a\""));
    }

    #[test]
    fn test_frame_commit_broadcasts_event() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        train(&mut state, "a", &spread_pose());

        let msg = format!(
            "(:type :frame :id 7 :session \"s\" :time 100 :hands ((:handedness left :landmarks {}) (:handedness right :landmarks {})))",
            coords_sexp(&spread_pose()),
            coords_sexp(&closed_pose())
        );
        handle_message(&mut state, 1, &msg);
        let written = String::from_utf8_lossy(&state.ipc_server.clients[&1].write_buf).to_string();
        assert!(written.contains(":event :commit"), "got {written}");
        assert!(written.contains(":symbol \"a\""));
    }

    #[test]
    fn test_frame_empty_hands() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let resp = handle_message(
            &mut state,
            1,
            "(:type :frame :id 7 :session \"s\" :time 0 :hands ())",
        )
        .unwrap();
        assert!(resp.contains(":committed nil"));
        assert!(resp.contains(":best nil"));
    }

    #[test]
    fn test_frame_wrong_landmark_count_rejected() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let resp = handle_message(
            &mut state,
            1,
            "(:type :frame :id 7 :session \"s\" :time 0 :hands ((:handedness left :landmarks (1 2 3))))",
        )
        .unwrap();
        assert!(resp.contains("expected 63 landmark coordinates, got 3"));
        // The malformed frame never reached the session.
        assert_eq!(state.sessions["s"].frames_seen, 0);
    }

    #[test]
    fn test_frame_unknown_handedness_rejected() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let msg = format!(
            "(:type :frame :id 7 :session \"s\" :time 0 :hands ((:handedness both :landmarks {})))",
            coords_sexp(&spread_pose())
        );
        let resp = handle_message(&mut state, 1, &msg).unwrap();
        assert!(resp.contains("unknown handedness: both"));
    }

    #[test]
    fn test_frame_unknown_session() {
        let mut state = authed_state();
        let resp = handle_message(
            &mut state,
            1,
            "(:type :frame :id 7 :session \"nope\" :time 0 :hands ())",
        )
        .unwrap();
        assert!(resp.contains("unknown session: nope"));
    }

    #[test]
    fn test_frame_missing_time() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let resp =
            handle_message(&mut state, 1, "(:type :frame :id 7 :session \"s\" :hands ())").unwrap();
        assert!(resp.contains("missing or invalid :time field"));
    }

    // ── Registry ────────────────────────────────────────────

    #[test]
    fn test_train_pose_and_list() {
        let mut state = authed_state();
        train(&mut state, "b", &spread_pose());
        train(&mut state, "a", &spread_pose());
        let resp = handle_message(&mut state, 1, "(:type :registry-list :id 8)").unwrap();
        assert!(resp.contains(":names (\"a\" \"b\")"));
    }

    #[test]
    fn test_train_pose_bad_landmarks() {
        let mut state = authed_state();
        let resp = handle_message(
            &mut state,
            1,
            "(:type :train-pose :id 8 :name \"a\" :landmarks (1 2))",
        )
        .unwrap();
        assert!(resp.contains(":status :error"));
        assert!(state.registry.is_empty());
    }

    // ── Trigger config ──────────────────────────────────────

    #[test]
    fn test_trigger_config_roundtrip() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let resp = handle_message(
            &mut state,
            1,
            "(:type :trigger-config :id 9 :session \"s\")",
        )
        .unwrap();
        assert!(resp.contains(":curl-threshold 0.050"));
        assert!(resp.contains(":min-commit-interval-ms 500"));

        let resp = handle_message(
            &mut state,
            1,
            "(:type :trigger-config-set :id 10 :session \"s\" :curl-threshold 0.08 :min-commit-interval-ms 250)",
        )
        .unwrap();
        assert!(resp.contains(":curl-threshold 0.080"));
        assert!(resp.contains(":min-commit-interval-ms 250"));
        let trigger = &state.sessions["s"].config.trigger;
        assert!((trigger.curl_threshold - 0.08).abs() < 1e-9);
        assert_eq!(trigger.min_commit_interval_ms, 250);
    }

    #[test]
    fn test_trigger_config_set_rejects_bad_values() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        let resp = handle_message(
            &mut state,
            1,
            "(:type :trigger-config-set :id 10 :session \"s\" :min-curled-fingers 9)",
        )
        .unwrap();
        assert!(resp.contains("min-curled-fingers must be 1-5"));
    }

    // ── Engine status / shutdown ────────────────────────────

    #[test]
    fn test_engine_status() {
        let mut state = authed_state();
        start_session(&mut state, "s", "\"a\"");
        train(&mut state, "a", &spread_pose());
        let resp = handle_message(&mut state, 1, "(:type :engine-status :id 11)").unwrap();
        assert!(resp.contains(":sessions (\"s\")"));
        assert!(resp.contains(":registry-size 1"));
        assert!(resp.contains(":frames 0"));
    }

    #[test]
    fn test_shutdown() {
        let mut state = authed_state();
        let resp = handle_message(&mut state, 1, "(:type :shutdown :id 12)").unwrap();
        assert!(resp.contains(":status :ok"));
        assert!(!state.running);
    }

    // ── Helpers ─────────────────────────────────────────────

    #[test]
    fn test_ok_response_format() {
        let r = ok_response(42);
        assert!(r.contains(":type :response"));
        assert!(r.contains(":id 42"));
        assert!(r.contains(":status :ok"));
    }

    #[test]
    fn test_error_response_escapes_quotes() {
        let r = error_response(1, "say \"hello\"");
        assert!(r.contains("say \\\"hello\\\""));
    }

    #[test]
    fn test_get_keyword_from_plist() {
        let v = lexpr::from_str("(:type :hello :version 1)").unwrap();
        assert_eq!(get_keyword(&v, "type"), Some("hello".to_string()));
        assert_eq!(get_keyword(&v, "version"), Some("1".to_string()));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_get_keyword_string_value() {
        let v = lexpr::from_str("(:client \"emacs\")").unwrap();
        assert_eq!(get_keyword(&v, "client"), Some("emacs".to_string()));
    }

    #[test]
    fn test_get_int_and_float() {
        let v = lexpr::from_str("(:id 42 :threshold 0.08)").unwrap();
        assert_eq!(get_int(&v, "id"), Some(42));
        assert_eq!(get_float(&v, "threshold"), Some(0.08));
        assert_eq!(get_int(&v, "threshold"), None);
    }

    #[test]
    fn test_list_elements_preserves_sublists() {
        let v = lexpr::from_str("((:a 1) (:b 2))").unwrap();
        let elems = list_elements(&v);
        assert_eq!(elems.len(), 2);
        assert!(matches!(elems[0], Value::Cons(_)));
    }

    #[test]
    fn test_flatten_list_numbers() {
        let v = lexpr::from_str("(1 2 (3 4) 5)").unwrap();
        let flat = flatten_list(&v);
        assert_eq!(flat.len(), 5);
    }

    #[test]
    fn test_format_event() {
        let e = format_event("commit", &[("symbol", "\"a\"")]);
        assert_eq!(e, "(:type :event :event :commit :symbol \"a\")");
        assert!(lexpr::from_str(&e).is_ok());
    }

    #[test]
    fn test_responses_are_valid_sexps() {
        assert!(lexpr::from_str(&ok_response(1)).is_ok());
        assert!(lexpr::from_str(&error_response(1, "test error")).is_ok());
    }
}
