//! End-to-end inject/remove cycle against scratch files, driving the same
//! pipeline the binary runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

use perigee::{inject, remove, ContextEnv};

const SCENARIO_SPECS: &str = r#"{
  "svc": {
    "envVar": "TOK",
    "secretService": "svc",
    "secretAccount": "user",
    "label": "Svc Token",
    "targetServer": "svc-mcp"
  }
}"#;

struct Session {
    _dir: TempDir,
    credentials: PathBuf,
    targets: PathBuf,
}

impl Session {
    fn new(credentials: Option<&str>, targets: Option<&str>) -> Self {
        let dir = tempdir().unwrap();
        let credentials_path = dir.path().join("credentials.json");
        let targets_path = dir.path().join("targets.json");

        if let Some(text) = credentials {
            fs::write(&credentials_path, text).unwrap();
        }
        if let Some(text) = targets {
            fs::write(&targets_path, text).unwrap();
        }

        Self {
            _dir: dir,
            credentials: credentials_path,
            targets: targets_path,
        }
    }

    fn ctx(&self) -> ContextEnv {
        ContextEnv::new(Some(&self.credentials), Some(&self.targets)).unwrap()
    }

    fn target_value(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(&self.targets).unwrap()).unwrap()
    }
}

fn store_with(entries: &[(&str, &str, &str)]) -> BTreeMap<(String, String), String> {
    entries
        .iter()
        .map(|(service, account, secret)| {
            ((service.to_string(), account.to_string()), secret.to_string())
        })
        .collect()
}

#[test]
fn inject_writes_the_secret_into_the_target_env() {
    let session = Session::new(Some(SCENARIO_SPECS), Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let store = store_with(&[("svc", "user", "abc123")]);

    let response = inject::run(&session.ctx(), &store).unwrap();

    assert_eq!(
        session.target_value(),
        json!({"targets": {"svc-mcp": {"env": {"TOK": "abc123"}}}})
    );
    let message = response.system_message.unwrap();
    assert!(message.contains("Injected: Svc Token"));
    assert!(!message.contains("Failed"));
}

#[test]
fn inject_with_absent_secret_changes_nothing() {
    let session = Session::new(Some(SCENARIO_SPECS), Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let before = fs::read_to_string(&session.targets).unwrap();
    let store = store_with(&[]);

    let response = inject::run(&session.ctx(), &store).unwrap();

    // Byte-for-byte untouched: nothing landed, so nothing was persisted.
    assert_eq!(fs::read_to_string(&session.targets).unwrap(), before);
    let message = response.system_message.unwrap();
    assert!(message.contains("Failed: Svc Token (not in keyring)"));
}

#[test]
fn inject_with_unknown_target_does_not_create_it() {
    let session = Session::new(Some(SCENARIO_SPECS), Some(r#"{"targets":{"other":{}}}"#));
    let store = store_with(&[("svc", "user", "abc123")]);

    let response = inject::run(&session.ctx(), &store).unwrap();

    assert_eq!(session.target_value(), json!({"targets": {"other": {}}}));
    let message = response.system_message.unwrap();
    assert!(message.contains("Failed: Svc Token (target 'svc-mcp' not found)"));
}

#[test]
fn inject_twice_overwrites_instead_of_duplicating() {
    let session = Session::new(Some(SCENARIO_SPECS), Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let store = store_with(&[("svc", "user", "abc123")]);

    inject::run(&session.ctx(), &store).unwrap();
    let after_first = session.target_value();
    inject::run(&session.ctx(), &store).unwrap();

    assert_eq!(session.target_value(), after_first);
}

#[test]
fn inject_preserves_unrelated_keys_and_their_order() {
    let targets = r#"{
  "zeta": "first by position",
  "targets": {
    "svc-mcp": {
      "command": "svc-bin",
      "args": ["--port", "1234"]
    }
  },
  "alpha": {"nested": [1, 2, 3]}
}"#;
    let session = Session::new(Some(SCENARIO_SPECS), Some(targets));
    let store = store_with(&[("svc", "user", "abc123")]);

    inject::run(&session.ctx(), &store).unwrap();

    let text = fs::read_to_string(&session.targets).unwrap();
    assert_eq!(
        session.target_value(),
        json!({
            "zeta": "first by position",
            "targets": {
                "svc-mcp": {
                    "command": "svc-bin",
                    "args": ["--port", "1234"],
                    "env": {"TOK": "abc123"}
                }
            },
            "alpha": {"nested": [1, 2, 3]}
        })
    );
    // Top-level order survived the rewrite.
    let zeta = text.find("\"zeta\"").unwrap();
    let targets_at = text.find("\"targets\"").unwrap();
    let alpha = text.find("\"alpha\"").unwrap();
    assert!(zeta < targets_at && targets_at < alpha);
}

#[test]
fn missing_credentials_file_is_completely_silent() {
    let session = Session::new(None, Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let before = fs::read_to_string(&session.targets).unwrap();
    let store = store_with(&[("svc", "user", "abc123")]);

    assert!(inject::run(&session.ctx(), &store).is_none());
    assert_eq!(fs::read_to_string(&session.targets).unwrap(), before);
}

#[test]
fn empty_credentials_object_is_silent_too() {
    let session = Session::new(Some("{}"), Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let store = store_with(&[]);

    assert!(inject::run(&session.ctx(), &store).is_none());
}

#[test]
fn malformed_credentials_file_warns_without_mutating() {
    let session = Session::new(Some("{broken"), Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let before = fs::read_to_string(&session.targets).unwrap();
    let store = store_with(&[]);

    let response = inject::run(&session.ctx(), &store).unwrap();

    assert!(response
        .system_message
        .unwrap()
        .starts_with("WARNING: failed to parse"));
    assert_eq!(fs::read_to_string(&session.targets).unwrap(), before);
}

#[test]
fn missing_target_file_warns_when_credentials_exist() {
    let session = Session::new(Some(SCENARIO_SPECS), None);
    let store = store_with(&[("svc", "user", "abc123")]);

    let response = inject::run(&session.ctx(), &store).unwrap();

    assert!(response
        .system_message
        .unwrap()
        .contains("no targets configured"));
    assert!(!session.targets.exists());
}

#[test]
fn target_file_without_targets_map_warns() {
    let session = Session::new(Some(SCENARIO_SPECS), Some(r#"{"other": true}"#));
    let store = store_with(&[("svc", "user", "abc123")]);

    let response = inject::run(&session.ctx(), &store).unwrap();

    assert!(response
        .system_message
        .unwrap()
        .contains("no targets configured"));
}

#[test]
fn remove_restores_the_pre_injection_shape() {
    let session = Session::new(Some(SCENARIO_SPECS), Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let store = store_with(&[("svc", "user", "abc123")]);

    inject::run(&session.ctx(), &store).unwrap();
    let response = remove::run(&session.ctx());

    // env map deleted since it became empty
    assert_eq!(session.target_value(), json!({"targets": {"svc-mcp": {}}}));
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"systemMessage":"Cleaned up 1 credential(s): Svc Token","decision":"approve"}"#
    );
}

#[test]
fn remove_leaves_foreign_env_vars_alone() {
    let targets = r#"{"targets":{"svc-mcp":{"env":{"TOK":"abc123","THEIRS":"keep"}}}}"#;
    let session = Session::new(Some(SCENARIO_SPECS), Some(targets));

    remove::run(&session.ctx());

    assert_eq!(
        session.target_value(),
        json!({"targets": {"svc-mcp": {"env": {"THEIRS": "keep"}}}})
    );
}

#[test]
fn remove_with_nothing_to_do_is_informational() {
    let session = Session::new(Some(SCENARIO_SPECS), Some(r#"{"targets":{"svc-mcp":{}}}"#));
    let before = fs::read_to_string(&session.targets).unwrap();

    let response = remove::run(&session.ctx());

    assert_eq!(fs::read_to_string(&session.targets).unwrap(), before);
    assert!(response
        .system_message
        .unwrap()
        .starts_with("INFO: credentials already clean"));
}

#[test]
fn remove_without_any_files_is_a_bare_approve() {
    let session = Session::new(None, None);

    let response = remove::run(&session.ctx());

    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"decision":"approve"}"#
    );
}

#[test]
fn full_cycle_on_a_busy_document_touches_only_the_env_entry() {
    let targets = r#"{
  "settings": {"theme": "dark"},
  "targets": {
    "svc-mcp": {"command": "svc-bin"},
    "unrelated": {"env": {"OTHER": "untouched"}}
  }
}"#;
    let session = Session::new(Some(SCENARIO_SPECS), Some(targets));
    let store = store_with(&[("svc", "user", "abc123")]);
    let original: Value = serde_json::from_str(targets).unwrap();

    inject::run(&session.ctx(), &store).unwrap();
    assert_ne!(session.target_value(), original);

    remove::run(&session.ctx());
    assert_eq!(session.target_value(), original);
}

#[test]
fn paths_are_plain_parameters() {
    // Everything above relied on it, but pin it down once explicitly.
    let session = Session::new(None, None);
    let ctx = session.ctx();

    assert_eq!(ctx.credentials_path(), session.credentials.as_path());
    assert_eq!(ctx.targets_path(), session.targets.as_path());
    assert_eq!(ctx.default_targets_path(), ctx.home().join(".perigee.json"));
}
