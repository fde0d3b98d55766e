//! The content management operations exposed to the HTTP layer.
//!
//! Reads are public. Every mutation takes an [`AdminSession`], which only a
//! successful login can produce.

use std::path::Path;

use serde_json::Value;

use crate::admin::session::AdminSession;
use crate::assets::{AssetInfo, AssetManager, AssetRole};
use crate::config::CmsConfig;
use crate::content::{validate_update, ContentDocument, ContentStore};
use crate::error::{CmsError, CmsResult};
use crate::observability::metrics;

/// Content store plus asset manager over the same document.
#[derive(Debug, Clone)]
pub struct CmsService {
    store: ContentStore,
    assets: AssetManager,
}

impl CmsService {
    pub fn new(content_path: impl AsRef<Path>, upload_dir: impl AsRef<Path>, max_upload_bytes: usize) -> Self {
        let store = ContentStore::new(content_path.as_ref());
        let assets = AssetManager::new(upload_dir.as_ref(), store.clone(), max_upload_bytes);
        Self { store, assets }
    }

    pub fn from_config(config: &CmsConfig) -> Self {
        Self::new(
            &config.storage.content_path,
            &config.storage.upload_dir,
            config.uploads.max_bytes,
        )
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn assets(&self) -> &AssetManager {
        &self.assets
    }

    /// Current document, read fresh from disk.
    pub fn get_content(&self) -> CmsResult<ContentDocument> {
        self.store.load()
    }

    /// Validate `payload` and replace the six editable sections.
    ///
    /// A rejected payload leaves the stored document untouched.
    pub fn update_content(&self, session: &AdminSession, payload: &Value) -> CmsResult<()> {
        let result = self.apply_update(payload);
        metrics::record_content_update(outcome(&result));
        match &result {
            Ok(()) => tracing::info!(
                admin = %session.username(),
                session_id = %session.id(),
                "Content updated"
            ),
            Err(e) => tracing::warn!(admin = %session.username(), error = %e, "Content update rejected"),
        }
        result
    }

    fn apply_update(&self, payload: &Value) -> CmsResult<()> {
        let update = validate_update(payload)?;
        if let Some(image) = &update.hero.image {
            if !self.assets.is_referenceable(image) {
                return Err(CmsError::validation(format!(
                    "hero.image does not name an existing asset: {image}"
                )));
            }
        }

        let mut doc = self.store.load()?;
        tracing::debug!(
            menu_items = update.menu.len(),
            team_members = update.team.len(),
            "Applying content update"
        );
        update.apply_to(&mut doc);
        self.store.save(&doc)
    }

    /// Store an uploaded image, returning the stored filename.
    pub fn upload_asset(
        &self,
        session: &AdminSession,
        role: AssetRole,
        filename: &str,
        bytes: &[u8],
    ) -> CmsResult<String> {
        let result = self.assets.upload(role, bytes, filename);
        metrics::record_asset_upload(role.as_str(), outcome(&result));
        if let Err(e) = &result {
            tracing::warn!(admin = %session.username(), role = %role, error = %e, "Upload rejected");
        }
        result
    }

    /// Remove an image and reset any field that referenced it.
    pub fn delete_asset(&self, session: &AdminSession, filename: &str) -> CmsResult<()> {
        let result = self.assets.delete(filename).map(|_| ());
        metrics::record_asset_delete(outcome(&result));
        if let Err(e) = &result {
            tracing::warn!(admin = %session.username(), filename = %filename, error = %e, "Delete rejected");
        }
        result
    }

    pub fn list_assets(&self, _session: &AdminSession) -> CmsResult<Vec<AssetInfo>> {
        self.assets.list()
    }
}

/// Metric label for an operation result.
pub(crate) fn outcome<T>(result: &CmsResult<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(CmsError::Storage { .. }) => "error",
        Err(_) => "rejected",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CmsService, AdminSession) {
        let dir = tempfile::tempdir().unwrap();
        let service = CmsService::new(
            dir.path().join("content.json"),
            dir.path().join("img"),
            2 * 1024 * 1024,
        );
        let mut doc = ContentDocument::default();
        doc.contact.google_maps_api_key = Some("AIza-stored".into());
        doc.extra.insert("opening_hours".into(), json!("7-19"));
        service.store().save(&doc).unwrap();
        (dir, service, AdminSession::new("admin", Duration::from_secs(60)))
    }

    fn payload() -> Value {
        json!({
            "hero": {"title": "Bean There", "subtitle": "Fresh daily", "button_text": "Menu"},
            "about": {"who": "Two baristas", "why": "Good coffee"},
            "menu": [{"name": "Mocha", "description": "Chocolate", "price": "$5.00"}],
            "team": [{"name": "Ana", "bio": "Roaster"}],
            "contact": {"address": "1 Bean St", "email": "hi@bean.com", "phone": "555"},
            "footer": {"address": "1 Bean St", "city": "Montreal", "phone": "555", "email": "hi@bean.com"}
        })
    }

    #[test]
    fn test_update_round_trip() {
        let (_dir, service, session) = setup();
        service.update_content(&session, &payload()).unwrap();

        let doc = service.get_content().unwrap();
        assert_eq!(doc.hero.title, "Bean There");
        assert_eq!(doc.menu[0].price, "$5.00");
        assert_eq!(doc.team[0].bio, "Roaster");
        assert_eq!(doc.footer.city, "Montreal");
        assert_eq!(doc.contact.google_maps_api_key.as_deref(), Some("AIza-stored"));
        assert_eq!(doc.extra["opening_hours"], "7-19");
    }

    #[test]
    fn test_failed_update_leaves_document_unchanged() {
        let (_dir, service, session) = setup();
        let before = std::fs::read(service.store().path()).unwrap();

        let mut bad = payload();
        bad["team"][0]["name"] = json!("");
        let err = service.update_content(&session, &bad).unwrap_err();
        assert!(err.to_string().contains("team[0].name"));

        assert_eq!(std::fs::read(service.store().path()).unwrap(), before);
    }

    #[test]
    fn test_hero_image_must_exist() {
        let (_dir, service, session) = setup();

        let mut with_image = payload();
        with_image["hero"]["image"] = json!("hero_missing.png");
        assert!(matches!(
            service.update_content(&session, &with_image),
            Err(CmsError::Validation(_))
        ));

        service
            .upload_asset(&session, AssetRole::Hero, "banner.jpg", b"jpg")
            .unwrap();
        with_image["hero"]["image"] = json!("hero_banner.jpg");
        service.update_content(&session, &with_image).unwrap();
        assert_eq!(
            service.get_content().unwrap().hero.image.as_deref(),
            Some("hero_banner.jpg")
        );

        with_image["hero"]["image"] = json!("hero.jpg");
        service.update_content(&session, &with_image).unwrap();
    }

    #[test]
    fn test_upload_list_delete() {
        let (_dir, service, session) = setup();
        let stored = service
            .upload_asset(&session, AssetRole::Logo, "brand.png", b"png")
            .unwrap();
        assert_eq!(stored, "logo_brand.png");

        let listed = service.list_assets(&session).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size, 3);

        service.delete_asset(&session, &stored).unwrap();
        assert!(service.list_assets(&session).unwrap().is_empty());
        assert_eq!(service.get_content().unwrap().logo_or_default(), "logo.png");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome(&Ok::<(), CmsError>(())), "success");
        assert_eq!(outcome::<()>(&Err(CmsError::validation("x"))), "rejected");
        assert_eq!(
            outcome::<()>(&Err(CmsError::storage(Path::new("c"), "x"))),
            "error"
        );
    }
}
