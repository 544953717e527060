//! Configuration sync between local agent files and a remote voice-agent
//! service.
//!
//! Both sides are reduced to the same `{agent, llm}` sync shape and
//! fingerprinted with SHA-256 over canonical JSON. When the fingerprints
//! disagree, the detector reports field-level and prompt-level conflicts,
//! and the resolver applies one of three operator-chosen strategies.
//!
//! # Examples
//!
//! ```
//! use agentsync_prompt::MemoryFragmentStore;
//! use agentsync_sync::{
//!     remote_fingerprint, AgentConfig, ConflictDetection, ConflictDetector, RemoteAgent,
//! };
//! use serde_json::json;
//!
//! let mut local = AgentConfig::new("support", "You are helpful.");
//! local.voice_speed = Some(1.0);
//!
//! let remote = RemoteAgent::from_documents(
//!     json!({ "name": "support", "voice_speed": 1.2 }),
//!     json!({ "prompt": "You are helpful." }),
//! )
//! .unwrap();
//!
//! let detector = ConflictDetector::new(MemoryFragmentStore::new());
//! let detection = detector.detect(&local, &remote, None).unwrap();
//! let report = detection.report().unwrap();
//! assert_eq!(report.field_conflicts[0].path, "agent.voice_speed");
//!
//! // Once recorded, an unchanged remote is in sync regardless of local edits.
//! let stored = remote_fingerprint(&remote);
//! let detection = detector.detect(&local, &remote, Some(&stored)).unwrap();
//! assert_eq!(detection, ConflictDetection::InSync);
//! ```

#![deny(unsafe_code)]

pub mod canonical;
pub mod config;
pub mod detect;
pub mod error;
pub mod fields;
pub mod remote;
pub mod report;
pub mod resolve;

pub use canonical::{
    canonical_json, fingerprint, fingerprint_text, fingerprints_equal, hash_content, Fingerprint,
    FINGERPRINT_ALGORITHM,
};
pub use config::{AgentConfig, LlmConfig, PromptSource};
pub use detect::{
    detect_conflicts, remote_fingerprint, ConflictDetection, ConflictDetector, ConflictReport,
    FieldConflict, PromptConflict,
};
pub use error::SyncError;
pub use fields::{
    local_field_values, remote_field_values, sync_shape, FieldKind, Section, SyncField,
    SYNC_FIELDS,
};
pub use remote::{FieldValue, RemoteAgent, RemoteDocument};
pub use report::{
    format_field_conflicts, format_prompt_diff, format_prompt_preview, unified_prompt_diff,
    DIFF_COLUMN_WIDTH, PREVIEW_CHARS,
};
pub use resolve::{
    merge_remote, resolve, ConfigWriter, FileConfigWriter, Resolution, ResolutionStrategy,
};
