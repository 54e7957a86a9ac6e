use fs_err as fs;
use serde_json::{to_string_pretty, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::wire::GenerationRequest;

/// Per-session directory of request/response JSON, one pair per call.
pub struct Transcript {
    dir: PathBuf,
    seq: AtomicU64,
}

#[derive(Debug)]
pub struct SavedPaths {
    pub request: PathBuf,
    pub response: PathBuf,
}

impl Transcript {
    pub fn new(root: &Path, session: Uuid) -> Self {
        Self { dir: root.join(session.to_string()), seq: AtomicU64::new(0) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, req: &GenerationRequest, resp: &Value) -> anyhow::Result<SavedPaths> {
        fs::create_dir_all(&self.dir)?;
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let stem = format!("{seq:03}-{}", req.kind);

        let request = self.dir.join(format!("{stem}.request.json"));
        fs::write(&request, to_string_pretty(req)?)?;

        let response = self.dir.join(format!("{stem}.response.json"));
        fs::write(&response, to_string_pretty(resp)?)?;

        Ok(SavedPaths { request, response })
    }

    /// Best-effort variant: failures are logged and swallowed.
    pub fn record(&self, req: &GenerationRequest, resp: &Value) {
        match self.save(req, resp) {
            Ok(saved) => tracing::debug!(
                request = %saved.request.display(),
                response = %saved.response.display(),
                "transcript saved"
            ),
            Err(e) => tracing::warn!(error = %e, dir = %self.dir.display(), "transcript write failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Instruction, RequestKind};
    use serde_json::json;

    #[test]
    fn saves_numbered_pairs_under_the_session_dir() {
        let root = tempfile::tempdir().unwrap();
        let session = Uuid::new_v4();
        let t = Transcript::new(root.path(), session);
        let req = GenerationRequest::new(
            RequestKind::Recipes,
            Instruction { system: "s".into(), user: "u".into() },
        );

        let first = t.save(&req, &json!([1, 2, 3])).unwrap();
        let second = t.save(&req, &json!({"ok": true})).unwrap();

        assert!(first.request.ends_with("001-recipes.request.json"));
        assert!(second.response.ends_with("002-recipes.response.json"));
        assert!(first.request.starts_with(root.path().join(session.to_string())));

        let body = std::fs::read_to_string(&first.request).unwrap();
        let saved: GenerationRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(saved.kind, RequestKind::Recipes);
        assert_eq!(saved.transaction.id, req.transaction.id);
    }
}
