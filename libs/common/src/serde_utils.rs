use std::{cell::RefCell, fmt, fs::read_to_string, path::PathBuf};

use schemars::JsonSchema;
use serde::{de::Visitor, Deserialize, Serialize};
use tracing::debug;

thread_local! {
    /// Directory that relative file references are resolved against while a config file is being deserialized.
    pub static BASE_PATH: RefCell<PathBuf> = RefCell::new(PathBuf::new());
}

/// A path to a local file whose contents are read eagerly during deserialization.
#[derive(Debug, Clone)]
pub struct LocalFileReference {
  pub path: String,
  pub contents: String,
}

struct LocalFileReferenceVisitor {
  base_path: PathBuf,
}

impl<'de> Visitor<'de> for LocalFileReferenceVisitor {
  type Value = LocalFileReference;

  fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    formatter.write_str("expected a valid local file path")
  }

  fn visit_str<E>(self, file_path: &str) -> Result<Self::Value, E>
  where
    E: serde::de::Error,
  {
    let full_path = self.base_path.join(file_path);
    debug!("loading local file reference from path {:?}", full_path);

    let contents = read_to_string(&full_path)
      .map_err(|e| E::custom(format!("failed to read file {:?}: {}", full_path, e)))?;

    Ok(LocalFileReference {
      path: full_path.to_string_lossy().into_owned(),
      contents,
    })
  }
}

impl JsonSchema for LocalFileReference {
  fn schema_name() -> String {
    "LocalFileReference".to_string()
  }

  fn json_schema(_gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
    schemars::schema::Schema::Object(schemars::schema::SchemaObject {
      instance_type: Some(schemars::schema::InstanceType::String.into()),
      format: Some("path".to_string()),
      ..Default::default()
    })
  }
}

impl Serialize for LocalFileReference {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    self.path.serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for LocalFileReference {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let base_path = BASE_PATH.with(|base| base.borrow().clone());
    deserializer.deserialize_str(LocalFileReferenceVisitor { base_path })
  }
}
