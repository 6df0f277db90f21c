//! Store file on disk.
//!
//! A missing file is not an error: the planner starts from a store holding
//! the default project.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use plancast_core::PlannerStore;
use tracing::debug;

pub fn load(path: &Path, today: NaiveDate, now: DateTime<Utc>) -> Result<PlannerStore> {
    if !path.exists() {
        debug!(path = %path.display(), "no store file, starting fresh");
        return Ok(PlannerStore::with_default_project(today, now));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store {}", path.display()))?;
    let mut store = PlannerStore::from_json(&content)
        .with_context(|| format!("Invalid store file {}", path.display()))?;
    store.ensure_current(today, now);
    Ok(store)
}

pub fn save(path: &Path, store: &PlannerStore) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = store.to_json()?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    debug!(path = %path.display(), projects = store.projects.len(), "saved store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use plancast_core::TaskDraft;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn missing_file_gives_default_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = load(&dir.path().join("none.json"), today(), now()).unwrap();
        assert_eq!(store.current_id().unwrap(), "project1");
        assert_eq!(store.current().unwrap().start_date, today());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("plan.json");

        let mut store = PlannerStore::with_default_project(today(), now());
        store
            .add_task("project1", &TaskDraft::new("Pour slab", today(), 3), now())
            .unwrap();
        save(&path, &store).unwrap();

        let loaded = load(&path, today(), now()).unwrap();
        assert_eq!(loaded, store);
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        save(&path, &PlannerStore::with_default_project(today(), now())).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path, today(), now()).unwrap_err();
        assert!(err.to_string().contains("Invalid store file"));
    }

    #[test]
    fn empty_store_gets_default_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, r#"{"projects": {}, "currentProject": ""}"#).unwrap();
        let store = load(&path, today(), now()).unwrap();
        assert_eq!(store.projects.len(), 1);
        assert!(store.current().is_ok());
    }
}
