// ── Raw option objects ──
//
// The plain, serializable shapes plugins and definition files hand to the
// registry. Known keys are typed; everything else survives in `extra` so
// options round-trip to the same plain object they were read from.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Raw options for one collection (table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOptions {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Name of the collection template this collection was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Parent collections, nearest ancestor first. Accepts a single string.
    #[serde(
        default,
        deserialize_with = "string_or_seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub inherits: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_target_key: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldOptions>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a field definition.
    pub fn field(mut self, field: FieldOptions) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_inherits<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherits = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set an arbitrary extra option.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Raw options for one field of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    pub name: String,

    /// Storage type (`string`, `bigInt`, `belongsToMany`, ...). May come
    /// from the field interface's defaults.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Name of the field interface this field is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,

    /// Association target collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Data source of the association target, when it differs from the owner's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_data_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_schema: Option<Value>,

    /// Owning collection. Always overwritten when the field is attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_target_data_source(mut self, key: impl Into<String>) -> Self {
        self.target_data_source = Some(key.into());
        self
    }

    pub fn with_foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    pub fn with_ui_schema(mut self, schema: Value) -> Self {
        self.ui_schema = Some(schema);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Declaration of one named data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceOptions {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub collections: Vec<CollectionOptions>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataSourceOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_collections(mut self, collections: Vec<CollectionOptions>) -> Self {
        self.collections = collections;
        self
    }
}

// ── Serde helpers ────────────────────────────────────────────────────

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_options_keep_unknown_keys() {
        let raw = json!({
            "name": "users",
            "sortable": true,
            "fields": [{ "name": "nickname", "type": "string", "x-custom": 1 }]
        });
        let opts: CollectionOptions = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(opts.extra.get("sortable"), Some(&json!(true)));
        assert_eq!(opts.fields[0].extra.get("x-custom"), Some(&json!(1)));
        assert_eq!(serde_json::to_value(&opts).unwrap(), raw);
    }

    #[test]
    fn inherits_accepts_a_single_string() {
        let opts: CollectionOptions =
            serde_json::from_value(json!({ "name": "admins", "inherits": "users" })).unwrap();
        assert_eq!(opts.inherits, vec!["users".to_string()]);
    }

    #[test]
    fn field_options_use_camel_case_keys() {
        let field = FieldOptions::new("roles")
            .with_type("belongsToMany")
            .with_target("roles")
            .with_foreign_key("userId");
        let value = serde_json::to_value(&field).unwrap();

        assert_eq!(value["type"], "belongsToMany");
        assert_eq!(value["foreignKey"], "userId");
        assert!(value.get("uiSchema").is_none());
    }
}
