//! Settings document persistence.
//!
//! One JSON document for every feature, keyed by feature short name. Loading
//! tolerates unknown keys and missing sections so documents survive version
//! skew in both directions.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::FeatureError;
use crate::feature::FeatureSet;

/// Read a settings document from disk.
pub fn load_document(path: &Path) -> Result<Value, FeatureError> {
    let text = fs::read_to_string(path).map_err(|source| FeatureError::ConfigIo {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| FeatureError::ConfigParse {
        path: path.to_owned(),
        source,
    })
}

/// Write a settings document to disk, pretty-printed for hand editing.
pub fn save_document(path: &Path, doc: &Value) -> Result<(), FeatureError> {
    let text = serde_json::to_string_pretty(doc).map_err(|source| FeatureError::ConfigParse {
        path: path.to_owned(),
        source,
    })?;
    fs::write(path, text).map_err(|source| FeatureError::ConfigIo {
        path: path.to_owned(),
        source,
    })
}

/// Load a document and distribute it to every feature. A missing file is not
/// an error: every feature keeps its defaults.
pub fn load_features(path: &Path, features: &mut FeatureSet) -> Result<(), FeatureError> {
    match load_document(path) {
        Ok(doc) => {
            features.load_document(&doc);
            log::info!("loaded feature settings from {}", path.display());
            Ok(())
        }
        Err(FeatureError::ConfigIo { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            log::info!("no settings file at {}, using defaults", path.display());
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Collect every feature's settings and persist them.
pub fn save_features(path: &Path, features: &FeatureSet) -> Result<(), FeatureError> {
    save_document(path, &features.save_document())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssgi::ScreenSpaceGi;

    #[test]
    fn missing_file_keeps_defaults() {
        let mut features = FeatureSet::default();
        features.register(Box::new(ScreenSpaceGi::new()));
        load_features(Path::new("/nonexistent/skylight.json"), &mut features).unwrap();
    }

    #[test]
    fn document_round_trip_through_feature_set() {
        let mut features = FeatureSet::default();
        let mut gi = ScreenSpaceGi::new();
        gi.settings.num_slices = 9;
        gi.settings.enable_blur = false;
        features.register(Box::new(gi));

        let doc = features.save_document();
        assert_eq!(doc["ScreenSpaceGI"]["NumSlices"], 9);

        let mut features2 = FeatureSet::default();
        features2.register(Box::new(ScreenSpaceGi::new()));
        features2.load_document(&doc);
        let doc2 = features2.save_document();
        assert_eq!(doc, doc2);
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let mut features = FeatureSet::default();
        features.register(Box::new(ScreenSpaceGi::new()));
        let doc = serde_json::json!({
            "SomeRetiredFeature": { "Enabled": true },
            "ScreenSpaceGI": { "NumSteps": 4 },
        });
        features.load_document(&doc);
        assert_eq!(features.save_document()["ScreenSpaceGI"]["NumSteps"], 4);
    }
}
