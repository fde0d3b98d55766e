//! Upload and removal of image assets.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::assets::filename::{has_allowed_extension, secure_filename};
use crate::content::model::{DEFAULT_FAVICON, DEFAULT_HERO_IMAGE, DEFAULT_LOGO};
use crate::content::ContentStore;
use crate::error::{CmsError, CmsResult};

/// What an uploaded image is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetRole {
    /// Free-standing image, not wired into the document.
    Generic,
    Hero,
    Logo,
    Favicon,
}

impl AssetRole {
    /// Prefix prepended to the stored filename.
    pub fn prefix(self) -> &'static str {
        match self {
            AssetRole::Generic => "",
            AssetRole::Hero => "hero_",
            AssetRole::Logo => "logo_",
            AssetRole::Favicon => "favicon_",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetRole::Generic => "generic",
            AssetRole::Hero => "hero",
            AssetRole::Logo => "logo",
            AssetRole::Favicon => "favicon",
        }
    }

    /// Document field this role repoints, as a key path.
    fn field(self) -> Option<&'static [&'static str]> {
        match self {
            AssetRole::Generic => None,
            AssetRole::Hero => Some(HERO_IMAGE_FIELD),
            AssetRole::Logo => Some(LOGO_FIELD),
            AssetRole::Favicon => Some(FAVICON_FIELD),
        }
    }
}

const HERO_IMAGE_FIELD: &[&str] = &["hero", "image"];
const LOGO_FIELD: &[&str] = &["logo"];
const FAVICON_FIELD: &[&str] = &["favicon"];

/// Fields that may reference an uploaded image, with their shipped default.
const REFERENCE_FIELDS: [(&str, &[&str], &str); 3] = [
    ("logo", LOGO_FIELD, DEFAULT_LOGO),
    ("favicon", FAVICON_FIELD, DEFAULT_FAVICON),
    ("hero.image", HERO_IMAGE_FIELD, DEFAULT_HERO_IMAGE),
];

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetRole {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" | "image" => Ok(AssetRole::Generic),
            "hero" => Ok(AssetRole::Hero),
            "logo" => Ok(AssetRole::Logo),
            "favicon" => Ok(AssetRole::Favicon),
            other => Err(CmsError::validation(format!("Unknown upload role: {other}"))),
        }
    }
}

/// A stored image as listed to the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetInfo {
    pub filename: String,
    pub size: u64,
}

/// Whether `filename` is one of the images shipped with the site.
pub fn is_default_asset(filename: &str) -> bool {
    [DEFAULT_LOGO, DEFAULT_FAVICON, DEFAULT_HERO_IMAGE].contains(&filename)
}

/// Owns the upload directory and patches asset references in the document.
#[derive(Debug, Clone)]
pub struct AssetManager {
    upload_dir: PathBuf,
    store: ContentStore,
    max_bytes: usize,
}

impl AssetManager {
    pub fn new(upload_dir: impl Into<PathBuf>, store: ContentStore, max_bytes: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            store,
            max_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Store an uploaded image and return the name it was stored under.
    ///
    /// Only the sanitized, role-prefixed name ever reaches the filesystem.
    /// Hero, logo and favicon uploads also repoint their document field.
    pub fn upload(&self, role: AssetRole, data: &[u8], filename: &str) -> CmsResult<String> {
        if filename.is_empty() {
            return Err(CmsError::validation("No selected file"));
        }
        if !has_allowed_extension(filename) {
            return Err(CmsError::validation("Invalid file type"));
        }
        if data.len() > self.max_bytes {
            return Err(CmsError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.max_bytes
            )));
        }

        let safe_name = secure_filename(filename);
        if !has_allowed_extension(&safe_name) {
            return Err(CmsError::validation("Invalid filename"));
        }
        let stored = format!("{}{}", role.prefix(), safe_name);

        // Load before touching the disk so a broken document fails the upload cleanly.
        let documents = match role.field() {
            Some(field) => {
                let original = self.store.load_value()?;
                let mut patched = original.clone();
                set_reference(&mut patched, field, &stored)
                    .map_err(|reason| CmsError::storage(self.store.path(), reason))?;
                Some((original, patched))
            }
            None => None,
        };

        fs::create_dir_all(&self.upload_dir)
            .map_err(|e| CmsError::storage(&self.upload_dir, e))?;
        let target = self.upload_dir.join(&stored);
        // Hidden and without an image extension, so never listed.
        let staged = self.upload_dir.join(format!(".{stored}.upload"));
        if let Err(e) = fs::write(&staged, data) {
            let _ = fs::remove_file(&staged);
            return Err(CmsError::storage(&staged, e));
        }

        // Whatever already holds the name is only replaced once the document
        // points at the new image.
        if let Some((_, patched)) = &documents {
            if let Err(e) = self.store.save_value(patched) {
                let _ = fs::remove_file(&staged);
                return Err(e);
            }
        }
        if let Err(e) = fs::rename(&staged, &target) {
            let _ = fs::remove_file(&staged);
            if let Some((original, _)) = &documents {
                if let Err(restore) = self.store.save_value(original) {
                    tracing::error!(error = %restore, "Failed to restore content document after upload error");
                }
            }
            return Err(CmsError::storage(&target, e));
        }

        tracing::info!(
            role = %role,
            filename = %stored,
            size = data.len(),
            "Asset uploaded"
        );
        Ok(stored)
    }

    /// Remove an asset and reset any document field that pointed at it.
    ///
    /// Unsafe names are rejected rather than corrected.
    pub fn delete(&self, filename: &str) -> CmsResult<Vec<&'static str>> {
        if filename.is_empty() {
            return Err(CmsError::validation("No filename provided"));
        }
        if filename.contains("..") || filename.starts_with('/') || filename.starts_with('\\') {
            return Err(CmsError::validation("Invalid filename"));
        }
        if secure_filename(filename) != filename {
            return Err(CmsError::validation("Invalid filename"));
        }
        if is_default_asset(filename) {
            return Err(CmsError::Forbidden(
                "Built-in default assets cannot be deleted".into(),
            ));
        }

        let target = self.resolve(filename)?;

        let mut doc = self.store.load_value()?;
        fs::remove_file(&target).map_err(|e| CmsError::storage(&target, e))?;

        let reset = reset_references(&mut doc, filename);
        if !reset.is_empty() {
            self.store.save_value(&doc)?;
        }

        tracing::info!(filename = %filename, reset = ?reset, "Asset deleted");
        Ok(reset)
    }

    /// Image files currently in the upload directory, sorted by name.
    pub fn list(&self) -> CmsResult<Vec<AssetInfo>> {
        let entries = match fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CmsError::storage(&self.upload_dir, e)),
        };

        let mut assets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CmsError::storage(&self.upload_dir, e))?;
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if has_allowed_extension(&filename) {
                assets.push(AssetInfo {
                    filename,
                    size: metadata.len(),
                });
            }
        }
        assets.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(assets)
    }

    /// Whether a document may reference `filename` as an image.
    pub fn is_referenceable(&self, filename: &str) -> bool {
        is_default_asset(filename)
            || (secure_filename(filename) == filename && self.upload_dir.join(filename).is_file())
    }

    /// Resolve a bare name inside the upload directory, refusing anything
    /// that ends up outside of it.
    fn resolve(&self, filename: &str) -> CmsResult<PathBuf> {
        let base = std::path::absolute(&self.upload_dir)
            .map_err(|e| CmsError::storage(&self.upload_dir, e))?;
        let target = base.join(filename);
        if !target.starts_with(&base) {
            return Err(CmsError::Forbidden("File not found or forbidden path".into()));
        }

        if !target.is_file() {
            return Err(CmsError::NotFound("File not found".into()));
        }

        // Symlinks must not lead out of the asset tree either.
        if let (Ok(real_base), Ok(real_target)) = (base.canonicalize(), target.canonicalize()) {
            if !real_target.starts_with(&real_base) {
                tracing::warn!(filename = %filename, "Asset resolves outside upload directory");
                return Err(CmsError::Forbidden("File not found or forbidden path".into()));
            }
        }

        Ok(target)
    }
}

/// Point every field that referenced `filename` back at its shipped default.
fn reset_references(doc: &mut Map<String, Value>, filename: &str) -> Vec<&'static str> {
    let mut reset = Vec::new();
    for (label, field, default) in REFERENCE_FIELDS {
        if reference(doc, field) == Some(filename) && set_reference(doc, field, default).is_ok() {
            reset.push(label);
        }
    }
    reset
}

/// String value at `field`, if there is one.
fn reference<'a>(doc: &'a Map<String, Value>, field: &[&str]) -> Option<&'a str> {
    let (first, rest) = field.split_first()?;
    let mut value = doc.get(*first)?;
    for key in rest {
        value = value.get(*key)?;
    }
    value.as_str()
}

/// Set `field` to `filename`, creating missing parent objects. Every other
/// key is left as stored.
fn set_reference(doc: &mut Map<String, Value>, field: &[&str], filename: &str) -> Result<(), String> {
    let Some((last, parents)) = field.split_last() else {
        return Ok(());
    };
    let mut obj = doc;
    for key in parents {
        obj = obj
            .entry(*key)
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| format!("{key} is not a JSON object"))?;
    }
    obj.insert((*last).to_string(), Value::String(filename.to_string()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentDocument;
    use tempfile::TempDir;

    fn setup() -> (TempDir, AssetManager) {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("content.json"));
        store.save(&ContentDocument::default()).unwrap();
        let manager = AssetManager::new(dir.path().join("img"), store, 2 * 1024 * 1024);
        (dir, manager)
    }

    fn load(manager: &AssetManager) -> ContentDocument {
        manager.store.load().unwrap()
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("image".parse::<AssetRole>().unwrap(), AssetRole::Generic);
        assert_eq!("hero".parse::<AssetRole>().unwrap(), AssetRole::Hero);
        assert_eq!("favicon".parse::<AssetRole>().unwrap(), AssetRole::Favicon);
        assert!("banner".parse::<AssetRole>().is_err());
    }

    #[test]
    fn test_hero_upload_then_delete() {
        let (_dir, manager) = setup();

        let stored = manager.upload(AssetRole::Hero, b"png-bytes", "pic.png").unwrap();
        assert_eq!(stored, "hero_pic.png");
        assert!(manager.upload_dir().join("hero_pic.png").is_file());
        assert_eq!(load(&manager).hero.image.as_deref(), Some("hero_pic.png"));

        let reset = manager.delete("hero_pic.png").unwrap();
        assert_eq!(reset, vec!["hero.image"]);
        assert!(!manager.upload_dir().join("hero_pic.png").exists());
        assert_eq!(load(&manager).hero.image.as_deref(), Some("hero.jpg"));
    }

    #[test]
    fn test_logo_and_favicon_uploads_update_document() {
        let (_dir, manager) = setup();

        assert_eq!(
            manager.upload(AssetRole::Logo, b"x", "brand.PNG").unwrap(),
            "logo_brand.PNG"
        );
        assert_eq!(
            manager.upload(AssetRole::Favicon, b"x", "icon.ico").unwrap(),
            "favicon_icon.ico"
        );
        let doc = load(&manager);
        assert_eq!(doc.logo.as_deref(), Some("logo_brand.PNG"));
        assert_eq!(doc.favicon.as_deref(), Some("favicon_icon.ico"));

        manager.delete("logo_brand.PNG").unwrap();
        assert_eq!(load(&manager).logo.as_deref(), Some("logo.png"));
    }

    #[test]
    fn test_generic_upload_leaves_document_alone() {
        let (_dir, manager) = setup();
        let before = load(&manager);

        let stored = manager
            .upload(AssetRole::Generic, b"gif", "../../team photo.gif")
            .unwrap();
        assert_eq!(stored, "team_photo.gif");
        assert_eq!(load(&manager), before);

        let reset = manager.delete("team_photo.gif").unwrap();
        assert!(reset.is_empty());
    }

    #[test]
    fn test_upload_rejections_write_nothing() {
        let (_dir, manager) = setup();

        let err = manager.upload(AssetRole::Generic, b"MZ", "setup.exe").unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));

        let err = manager.upload(AssetRole::Hero, b"x", "").unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));

        let big = vec![0u8; 2 * 1024 * 1024 + 1];
        let err = manager.upload(AssetRole::Hero, &big, "big.png").unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));

        let err = manager.upload(AssetRole::Generic, b"x", "日本.png").unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));

        assert!(!manager.upload_dir().exists());
        assert_eq!(load(&manager).hero.image, None);
    }

    #[test]
    fn test_upload_fails_cleanly_on_broken_document() {
        let (dir, manager) = setup();
        fs::write(dir.path().join("content.json"), "garbage").unwrap();

        let err = manager.upload(AssetRole::Logo, b"x", "brand.png").unwrap_err();
        assert!(matches!(err, CmsError::Storage { .. }));
        assert!(!manager.upload_dir().join("logo_brand.png").exists());
    }

    #[test]
    fn test_upload_patches_only_the_target_field() {
        let (dir, manager) = setup();
        let raw = serde_json::json!({
            "hero": {"title": "T", "image": "hero.jpg", "background": "#222"},
            "contact": {"email": "a@b.co", "hours": "7-19"},
            "opening_hours": {"mon": "7-19"}
        });
        fs::write(dir.path().join("content.json"), raw.to_string()).unwrap();

        manager.upload(AssetRole::Logo, b"x", "brand.png").unwrap();
        manager.upload(AssetRole::Hero, b"x", "pic.png").unwrap();
        let saved = manager.store.load_value().unwrap();
        assert_eq!(saved["logo"], "logo_brand.png");
        assert_eq!(saved["hero"]["image"], "hero_pic.png");
        assert_eq!(saved["hero"]["background"], "#222");
        assert_eq!(saved["contact"], raw["contact"]);
        assert_eq!(saved["opening_hours"], raw["opening_hours"]);
        assert!(!saved.contains_key("about"));
        assert!(!saved.contains_key("footer"));

        manager.delete("hero_pic.png").unwrap();
        let saved = manager.store.load_value().unwrap();
        assert_eq!(saved["hero"]["image"], "hero.jpg");
        assert_eq!(saved["hero"]["background"], "#222");
        assert!(!saved.contains_key("team"));
    }

    #[test]
    fn test_failed_save_keeps_existing_image() {
        let (dir, manager) = setup();
        fs::create_dir_all(manager.upload_dir()).unwrap();
        let existing = manager.upload_dir().join("hero_pic.png");
        fs::write(&existing, b"OLD").unwrap();
        let before = fs::read_to_string(dir.path().join("content.json")).unwrap();
        // A directory where the store stages its temp file makes the save fail.
        fs::create_dir(dir.path().join("content.json.tmp")).unwrap();

        let err = manager.upload(AssetRole::Hero, b"NEW", "pic.png").unwrap_err();
        assert!(matches!(err, CmsError::Storage { .. }));
        assert_eq!(fs::read(&existing).unwrap(), b"OLD");
        assert_eq!(fs::read_to_string(dir.path().join("content.json")).unwrap(), before);

        let names: Vec<_> = fs::read_dir(manager.upload_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("hero_pic.png")]);
    }

    #[test]
    fn test_delete_rejects_traversal() {
        let (dir, manager) = setup();
        fs::create_dir_all(manager.upload_dir()).unwrap();
        fs::write(dir.path().join("secret.png"), b"keep").unwrap();

        for name in ["../../etc/passwd", "/etc/passwd", "../secret.png", "a/b.png", "with space.png", ""] {
            let err = manager.delete(name).unwrap_err();
            assert!(matches!(err, CmsError::Validation(_)), "{name} should be rejected");
        }
        assert!(dir.path().join("secret.png").exists());
    }

    #[test]
    fn test_delete_missing_file_is_not_found() {
        let (_dir, manager) = setup();
        fs::create_dir_all(manager.upload_dir()).unwrap();
        let err = manager.delete("ghost.png").unwrap_err();
        assert!(matches!(err, CmsError::NotFound(_)));
    }

    #[test]
    fn test_shipped_defaults_are_protected() {
        let (_dir, manager) = setup();
        fs::create_dir_all(manager.upload_dir()).unwrap();
        fs::write(manager.upload_dir().join("logo.png"), b"x").unwrap();

        let err = manager.delete("logo.png").unwrap_err();
        assert!(matches!(err, CmsError::Forbidden(_)));
        assert_eq!(err.to_string(), "Built-in default assets cannot be deleted");
        assert!(manager.upload_dir().join("logo.png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_tree_is_forbidden() {
        let (dir, manager) = setup();
        fs::create_dir_all(manager.upload_dir()).unwrap();
        let outside = dir.path().join("outside.png");
        fs::write(&outside, b"x").unwrap();
        std::os::unix::fs::symlink(&outside, manager.upload_dir().join("link.png")).unwrap();

        let err = manager.delete("link.png").unwrap_err();
        assert!(matches!(err, CmsError::Forbidden(_)));
        assert!(outside.exists());
    }

    #[test]
    fn test_list_and_referenceable() {
        let (_dir, manager) = setup();
        assert!(manager.list().unwrap().is_empty());

        manager.upload(AssetRole::Generic, b"abc", "b.png").unwrap();
        manager.upload(AssetRole::Generic, b"a", "a.jpg").unwrap();
        fs::write(manager.upload_dir().join("notes.txt"), b"skip").unwrap();

        let names: Vec<_> = manager.list().unwrap().into_iter().map(|a| a.filename).collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);

        assert!(manager.is_referenceable("a.jpg"));
        assert!(manager.is_referenceable("hero.jpg"));
        assert!(!manager.is_referenceable("missing.png"));
    }
}
