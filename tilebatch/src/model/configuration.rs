//! Model configuration file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ModelConfigError;

/// Name of the transform whose `size` argument sets the tile resize.
pub const RESIZE_TRANSFORM: &str = "Resize";

/// One preprocessing step declared by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Classification model description, as shipped next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    pub spec_version: String,
    pub architecture: String,
    pub num_classes: usize,
    pub class_names: Vec<String>,
    /// Edge length of the square patch the model consumes.
    pub patch_size_pixels: u32,
    /// Physical pixel spacing the model was trained at, in µm per pixel.
    pub spacing_um_px: f64,
    #[serde(default = "default_apply_softmax")]
    pub apply_softmax: bool,
    #[serde(default)]
    pub transform: Vec<TransformConfig>,
}

fn default_apply_softmax() -> bool {
    true
}

impl ModelConfiguration {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ModelConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ModelConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ModelConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ModelConfigError> {
        if self.class_names.is_empty() {
            return Err(ModelConfigError::NoClasses);
        }
        if self.num_classes != self.class_names.len() {
            return Err(ModelConfigError::ClassCountMismatch {
                declared: self.num_classes,
                named: self.class_names.len(),
            });
        }

        let mut seen = HashSet::new();
        for name in &self.class_names {
            if !seen.insert(name.as_str()) {
                return Err(ModelConfigError::DuplicateClass(name.clone()));
            }
        }

        if self.patch_size_pixels == 0 {
            return Err(ModelConfigError::ZeroPatchSize);
        }
        if !self.spacing_um_px.is_finite() || self.spacing_um_px <= 0.0 {
            return Err(ModelConfigError::InvalidSpacing(self.spacing_um_px));
        }

        self.resize_size()?;
        Ok(())
    }

    /// Returns the `(width, height)` requested by the `Resize` transform.
    ///
    /// `size` is either a single edge length or a `[height, width]` pair.
    pub fn resize_size(&self) -> Result<Option<(u32, u32)>, ModelConfigError> {
        let Some(resize) = self.transform.iter().find(|t| t.name == RESIZE_TRANSFORM) else {
            return Ok(None);
        };

        let invalid = |reason: &str| ModelConfigError::InvalidTransform {
            transform: RESIZE_TRANSFORM.to_string(),
            reason: reason.to_string(),
        };

        match resize.arguments.get("size") {
            Some(Value::Number(n)) => {
                let size = positive_edge(n.as_f64()).ok_or_else(|| invalid("size must be > 0"))?;
                Ok(Some((size, size)))
            }
            Some(Value::Array(pair)) if pair.len() == 2 => {
                let height =
                    positive_edge(pair[0].as_f64()).ok_or_else(|| invalid("size must be > 0"))?;
                let width =
                    positive_edge(pair[1].as_f64()).ok_or_else(|| invalid("size must be > 0"))?;
                Ok(Some((width, height)))
            }
            Some(_) => Err(invalid("size must be a number or a [height, width] pair")),
            None => Err(invalid("missing 'size' argument")),
        }
    }

    /// Transform names with no effect on tile reading.
    pub fn other_transforms(&self) -> impl Iterator<Item = &str> {
        self.transform
            .iter()
            .map(|t| t.name.as_str())
            .filter(|name| *name != RESIZE_TRANSFORM)
    }
}

fn positive_edge(value: Option<f64>) -> Option<u32> {
    let value = value?;
    (value.is_finite() && value >= 1.0).then(|| value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESNET: &str = r#"{
        "spec_version": "1.0",
        "architecture": "resnet34",
        "num_classes": 2,
        "class_names": ["Tumor", "Other"],
        "patch_size_pixels": 350,
        "spacing_um_px": 0.25,
        "transform": [
            { "name": "Resize", "arguments": { "size": 224 } },
            { "name": "ToTensor" },
            { "name": "Normalize", "arguments": { "mean": [0.5, 0.5, 0.5], "std": [0.5, 0.5, 0.5] } }
        ]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = ModelConfiguration::from_json(RESNET).unwrap();
        assert_eq!(config.architecture, "resnet34");
        assert_eq!(config.class_names, vec!["Tumor", "Other"]);
        assert_eq!(config.patch_size_pixels, 350);
        assert!(config.apply_softmax);
        assert_eq!(config.resize_size().unwrap(), Some((224, 224)));

        let others: Vec<&str> = config.other_transforms().collect();
        assert_eq!(others, vec!["ToTensor", "Normalize"]);
    }

    #[test]
    fn test_softmax_can_be_disabled() {
        let json = RESNET.replace(
            "\"num_classes\": 2,",
            "\"num_classes\": 2, \"apply_softmax\": false,",
        );
        let config = ModelConfiguration::from_json(&json).unwrap();
        assert!(!config.apply_softmax);
    }

    #[test]
    fn test_resize_pair_is_height_width() {
        let json = RESNET.replace("\"size\": 224", "\"size\": [100, 200]");
        let config = ModelConfiguration::from_json(&json).unwrap();
        assert_eq!(config.resize_size().unwrap(), Some((200, 100)));
    }

    #[test]
    fn test_no_resize_transform() {
        let json = RESNET.replace("\"Resize\"", "\"CenterCrop\"");
        let config = ModelConfiguration::from_json(&json).unwrap();
        assert_eq!(config.resize_size().unwrap(), None);
    }

    #[test]
    fn test_class_count_mismatch() {
        let json = RESNET.replace("\"num_classes\": 2", "\"num_classes\": 3");
        assert!(matches!(
            ModelConfiguration::from_json(&json),
            Err(ModelConfigError::ClassCountMismatch {
                declared: 3,
                named: 2
            })
        ));
    }

    #[test]
    fn test_duplicate_class() {
        let json = RESNET.replace("\"Other\"", "\"Tumor\"");
        assert!(matches!(
            ModelConfiguration::from_json(&json),
            Err(ModelConfigError::DuplicateClass(name)) if name == "Tumor"
        ));
    }

    #[test]
    fn test_invalid_spacing() {
        let json = RESNET.replace("0.25", "0.0");
        assert!(matches!(
            ModelConfiguration::from_json(&json),
            Err(ModelConfigError::InvalidSpacing(_))
        ));
    }

    #[test]
    fn test_bad_resize_argument() {
        let json = RESNET.replace("\"size\": 224", "\"size\": \"big\"");
        assert!(matches!(
            ModelConfiguration::from_json(&json),
            Err(ModelConfigError::InvalidTransform { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ModelConfiguration::from_json("{"),
            Err(ModelConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, RESNET).unwrap();

        let config = ModelConfiguration::load(&path).unwrap();
        assert_eq!(config.num_classes, 2);

        let missing = ModelConfiguration::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ModelConfigError::Io { .. })));
    }
}
