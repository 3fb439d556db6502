#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use collectra_core::{
    Collection, CollectionBehavior, CollectionOptions, CollectionTemplate, DataSourceManager, DataSourceOptions,
    FieldInterface, FieldInterfaceGroup, FieldOptions,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────

fn users_and_roles() -> Vec<CollectionOptions> {
    vec![
        CollectionOptions::new("users")
            .field(FieldOptions::new("nickname").with_type("string"))
            .field(FieldOptions::new("roles").with_type("belongsToMany").with_target("roles")),
        CollectionOptions::new("roles").field(FieldOptions::new("name").with_type("string")),
    ]
}

fn manager() -> DataSourceManager {
    let manager = DataSourceManager::new();
    manager.add_collections(users_and_roles(), None);
    manager
}

fn names(collections: &[Arc<Collection>]) -> Vec<String> {
    collections.iter().map(|c| c.name().to_owned()).collect()
}

// ── Add / set ───────────────────────────────────────────────────────

#[test]
fn add_collections_counts_distinct_names_across_calls() {
    let manager = DataSourceManager::new();
    manager.add_collections([CollectionOptions::new("a"), CollectionOptions::new("b")], None);
    manager.add_collections(
        [
            CollectionOptions::new("b").with_title("B2"),
            CollectionOptions::new("c"),
        ],
        None,
    );
    manager.add_collections([CollectionOptions::new("a").with_title("A3")], None);

    let collections = manager.get_collections(None);
    assert_eq!(names(&collections), vec!["a", "b", "c"]);
    assert_eq!(manager.get_collection("a", None).unwrap().title(), Some("A3"));
    assert_eq!(manager.get_collection("b", None).unwrap().title(), Some("B2"));
}

#[test]
fn set_collections_replaces_everything() {
    let manager = manager();
    manager.set_collections([CollectionOptions::new("posts")], None);

    assert_eq!(names(&manager.get_collections(None)), vec!["posts"]);
    assert!(manager.get_collection("users", None).is_none());
}

// ── Lookup ──────────────────────────────────────────────────────────

#[test]
fn collection_lookup_by_name_and_association() {
    let manager = manager();

    assert_eq!(manager.get_collection("users", None).unwrap().name(), "users");
    assert_eq!(manager.get_collection("users.roles", None).unwrap().name(), "roles");
    assert_eq!(manager.get_collection_name("users.roles", None).as_deref(), Some("roles"));
}

#[test]
fn lookup_misses_are_none() {
    let manager = manager();

    assert!(manager.get_collection("not-exists", None).is_none());
    assert!(manager.get_collection(None::<&str>, None).is_none());
    assert!(manager.get_collection("users.not-exists", None).is_none());
    assert!(manager.get_collection("users.nickname", None).is_none());
    assert!(manager.get_collection("users.roles.name", None).is_none());
    assert!(manager.get_collection_field("not-exists", None).is_none());
    assert!(manager.get_collection_field("users.roles.missing", None).is_none());
    assert!(manager.get_collection_fields("not-exists", None).is_empty());
}

#[test]
fn field_lookup_walks_associations() {
    let manager = manager();

    let nickname = manager.get_collection_field("users.nickname", None).unwrap();
    assert_eq!(nickname.name(), "nickname");
    assert_eq!(nickname.collection_name(), Some("users"));

    let name = manager.get_collection_field("users.roles.name", None).unwrap();
    assert_eq!(name.name(), "name");
    assert_eq!(name.collection_name(), Some("roles"));
}

#[test]
fn collection_fields_follow_the_path() {
    let manager = manager();
    let fields: Vec<String> = manager
        .get_collection_fields("users.roles", None)
        .iter()
        .map(|f| f.name().to_owned())
        .collect();
    assert_eq!(fields, vec!["name"]);
}

#[test]
fn inline_options_bypass_the_registry() {
    let manager = manager();

    let inline = CollectionOptions::new("adhoc").field(FieldOptions::new("x").with_type("string"));
    let collection = manager.get_collection(&inline, None).unwrap();
    assert_eq!(collection.name(), "adhoc");
    assert!(manager.get_collection("adhoc", None).is_none());

    let field = FieldOptions::new("nickname").with_type("string");
    let resolved = manager.get_collection_field(&field, None).unwrap();
    assert_eq!(resolved.options(), &field);
}

#[test]
fn associations_cross_data_sources() {
    let manager = manager();
    manager.add_data_source(
        DataSourceOptions::new("crm").with_collections(vec![
            CollectionOptions::new("leads").field(
                FieldOptions::new("owner")
                    .with_type("belongsTo")
                    .with_target("users")
                    .with_target_data_source("main"),
            ),
        ]),
    );

    let owner = manager.get_collection("leads.owner", Some("crm")).unwrap();
    assert_eq!(owner.name(), "users");
    assert_eq!(owner.data_source_key(), "main");

    let nickname = manager.get_collection_field("leads.owner.nickname", Some("crm")).unwrap();
    assert_eq!(nickname.collection_name(), Some("users"));

    // Without the manager-level resolver the hop can't leave its data source.
    let crm = manager.get_data_source(Some("crm")).unwrap();
    assert!(crm.collection_manager().get_collection("leads.owner").is_none());
}

// ── Listing ─────────────────────────────────────────────────────────

#[test]
fn predicate_keeps_relative_order() {
    let manager = DataSourceManager::new();
    manager.add_collections(
        [
            CollectionOptions::new("a"),
            CollectionOptions::new("b").with_hidden(true),
            CollectionOptions::new("c"),
            CollectionOptions::new("d").with_hidden(true),
        ],
        None,
    );

    let visible = manager.get_collections_where(None, |c| !c.hidden());
    assert_eq!(names(&visible), vec!["a", "c"]);
}

#[test]
fn all_collections_group_by_data_source() {
    let manager = manager();
    manager.add_data_source(
        DataSourceOptions::new("crm")
            .with_display_name("CRM")
            .with_collections(vec![CollectionOptions::new("leads")]),
    );

    let all = manager.get_all_collections();
    let keys: Vec<&str> = all.iter().map(|group| group.key.as_str()).collect();
    assert_eq!(keys, vec!["main", "crm"]);
    assert_eq!(names(&all[0].collections), vec!["users", "roles"]);
    assert_eq!(all[1].display_name, "CRM");

    let filtered = manager.get_all_collections_where(|c| c.name() == "leads");
    assert!(filtered[0].collections.is_empty());
    assert_eq!(names(&filtered[1].collections), vec!["leads"]);
}

// ── Mixins ──────────────────────────────────────────────────────────

#[test]
fn mixins_reach_fresh_instances_only() {
    let manager = manager();
    let before = manager.get_collection("users", None).unwrap();

    manager.add_collection_mixins([CollectionBehavior::new("test").method("a", |collection, _| {
        json!(format!("a:{}", collection.name()))
    })]);

    assert!(!before.has_method("a"));
    assert!(before.call("a", &[]).is_none());

    let after = manager.get_collection("users", None).unwrap();
    assert!(after.has_method("a"));
    assert_eq!(after.call("a", &[]), Some(json!("a:users")));
}

#[test]
fn later_mixin_wins_a_collision() {
    let manager = manager();
    manager.add_collection_mixins([
        CollectionBehavior::new("one").method("label", |_, _| json!("one")),
        CollectionBehavior::new("two").method("label", |_, _| json!("two")),
    ]);

    let users = manager.get_collection("users", None).unwrap();
    assert_eq!(users.call("label", &[]), Some(json!("two")));
}

#[test]
fn re_registered_mixin_overrides_newer_ones() {
    let manager = manager();
    manager.add_collection_mixins([CollectionBehavior::new("a").method("label", |_, _| json!("a1"))]);
    manager.add_collection_mixins([CollectionBehavior::new("b").method("label", |_, _| json!("b"))]);
    manager.add_collection_mixins([CollectionBehavior::new("a").method("label", |_, _| json!("a2"))]);

    let users = manager.get_collection("users", None).unwrap();
    assert_eq!(users.call("label", &[]), Some(json!("a2")));
}

#[test]
fn mixin_methods_receive_arguments() {
    let manager = manager();
    manager.add_collection_mixins([CollectionBehavior::new("fields").method("hasField", |collection, args| {
        let name = args.first().and_then(Value::as_str).unwrap_or_default();
        Value::Bool(collection.has_field(name))
    })]);

    let users = manager.get_collection("users", None).unwrap();
    assert_eq!(users.call("hasField", &[json!("nickname")]), Some(json!(true)));
    assert_eq!(users.call("hasField", &[json!("missing")]), Some(json!(false)));
}

// ── Templates ───────────────────────────────────────────────────────

#[test]
fn template_behavior_applies_on_registration_and_creation() {
    let manager = DataSourceManager::new();
    manager.add_collections([CollectionOptions::new("tree").with_template("custom")], None);
    assert!(!manager.get_collection("tree", None).unwrap().has_method("custom"));

    manager.add_collection_templates([CollectionTemplate::new("custom")
        .with_collection(CollectionBehavior::new("custom").method("custom", |_, _| json!("custom")))]);
    let tree = manager.get_collection("tree", None).unwrap();
    assert_eq!(tree.call("custom", &[]), Some(json!("custom")));

    manager.add_collections([CollectionOptions::new("later").with_template("custom")], None);
    assert!(manager.get_collection("later", None).unwrap().has_method("custom"));

    manager.add_collections([CollectionOptions::new("plain")], None);
    assert!(!manager.get_collection("plain", None).unwrap().has_method("custom"));
}

#[test]
fn template_behavior_is_not_shadowed_by_mixins() {
    let manager = DataSourceManager::builder()
        .collection_template(
            CollectionTemplate::new("tree")
                .with_collection(CollectionBehavior::new("tree").method("kind", |_, _| json!("tree"))),
        )
        .collection_mixin(CollectionBehavior::new("generic").method("kind", |_, _| json!("generic")))
        .collections([
            CollectionOptions::new("categories").with_template("tree"),
            CollectionOptions::new("posts"),
        ])
        .build();

    let categories = manager.get_collection("categories", None).unwrap();
    let posts = manager.get_collection("posts", None).unwrap();
    assert_eq!(categories.call("kind", &[]), Some(json!("tree")));
    assert_eq!(posts.call("kind", &[]), Some(json!("generic")));
}

#[test]
fn template_transform_runs_before_instantiation() {
    let manager = DataSourceManager::builder()
        .collection_template(CollectionTemplate::new("tree").with_transform(|options| {
            options.field(FieldOptions::new("parentId").with_type("bigInt"))
        }))
        .collections([CollectionOptions::new("categories").with_template("tree")])
        .build();

    let categories = manager.get_collection("categories", None).unwrap();
    assert!(categories.has_field("parentId"));

    let raw = manager.main().collection_manager().snapshot();
    assert!(raw.raw("categories").unwrap().fields.is_empty());
}

// ── Field interfaces ────────────────────────────────────────────────

#[test]
fn interface_defaults_apply_retroactively() {
    let manager = DataSourceManager::new();
    manager.add_collections(
        [CollectionOptions::new("users").field(FieldOptions::new("age").with_interface("integer"))],
        None,
    );
    assert_eq!(manager.get_collection_field("users.age", None).unwrap().field_type(), None);

    manager.add_field_interfaces([FieldInterface::new("integer").with_default_options(json!({ "type": "bigInt" }))]);

    assert_eq!(manager.field_interfaces().len(), 1);
    assert_eq!(
        manager.get_collection_field("users.age", None).unwrap().field_type(),
        Some("bigInt")
    );
}

#[test]
fn interface_groups_are_independent() {
    let manager = DataSourceManager::new();
    manager.add_field_interface_groups([("test", FieldInterfaceGroup::new("Test", 1))]);

    assert!(manager.field_interfaces().is_empty());
    assert_eq!(
        manager.field_interfaces().get_group("test"),
        Some(FieldInterfaceGroup::new("Test", 1))
    );
}

#[test]
fn builtin_interfaces_resolve_created_by() {
    let manager = DataSourceManager::builder()
        .builtin_interfaces()
        .collections([CollectionOptions::new("posts").field(FieldOptions::new("createdBy").with_interface("createdBy"))])
        .build();

    let field = manager.get_collection_field("posts.createdBy", None).unwrap();
    assert_eq!(field.field_type(), Some("belongsTo"));
    assert_eq!(field.target(), Some("users"));
    assert_eq!(field.foreign_key(), Some("createdById"));
    assert!(manager.field_interfaces().get_group("systemInfo").is_some());
}

#[test]
fn resolved_options_serialize_to_plain_objects() {
    let manager = DataSourceManager::builder()
        .field_interface(FieldInterface::new("integer").with_default_options(json!({
            "type": "bigInt",
            "uiSchema": { "type": "number", "x-component": "InputNumber" }
        })))
        .collections([CollectionOptions::new("users").field(FieldOptions::new("age").with_interface("integer"))])
        .build();

    let users = manager.get_collection("users", None).unwrap();
    insta::assert_json_snapshot!(users.options(), @r#"
    {
      "name": "users",
      "fields": [
        {
          "name": "age",
          "type": "bigInt",
          "interface": "integer",
          "uiSchema": {
            "type": "number",
            "x-component": "InputNumber"
          },
          "collectionName": "users"
        }
      ]
    }
    "#);
}

// ── Change notification ─────────────────────────────────────────────

#[tokio::test]
async fn subscribers_see_reinstantiation() {
    let manager = manager();
    let mut stream = manager.main().collection_manager().subscribe();
    assert_eq!(stream.current().len(), 2);

    manager.add_collection_mixins([CollectionBehavior::new("m").method("m", |_, _| Value::Null)]);

    let snapshot = stream.changed().await.unwrap();
    assert!(snapshot.get("users").unwrap().has_method("m"));
    assert!(Arc::ptr_eq(&snapshot, stream.current()));
}
