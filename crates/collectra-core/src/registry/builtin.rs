// ── Built-in field interfaces and groups ──
//
// The interfaces every deployment starts with. Plugins register more (or
// override these by name) through the data source manager.

use serde_json::{Value, json};

use super::interface::{FieldInterface, FieldInterfaceGroup, FilterOperator, Filterable, FilterableChild};

// ── Operator sets ────────────────────────────────────────────────────

fn string_operators() -> Vec<FilterOperator> {
    vec![
        FilterOperator::new("{{t(\"contains\")}}", "$includes"),
        FilterOperator::new("{{t(\"does not contain\")}}", "$notIncludes"),
        FilterOperator::new("{{t(\"is\")}}", "$eq"),
        FilterOperator::new("{{t(\"is not\")}}", "$ne"),
        FilterOperator::unary("{{t(\"is empty\")}}", "$empty"),
        FilterOperator::unary("{{t(\"is not empty\")}}", "$notEmpty"),
    ]
}

fn number_operators() -> Vec<FilterOperator> {
    vec![
        FilterOperator::new("=", "$eq"),
        FilterOperator::new("≠", "$ne"),
        FilterOperator::new(">", "$gt"),
        FilterOperator::new("≥", "$gte"),
        FilterOperator::new("<", "$lt"),
        FilterOperator::new("≤", "$lte"),
        FilterOperator::unary("{{t(\"is empty\")}}", "$empty"),
        FilterOperator::unary("{{t(\"is not empty\")}}", "$notEmpty"),
    ]
}

fn id_operators() -> Vec<FilterOperator> {
    vec![
        FilterOperator::new("{{t(\"is\")}}", "$eq"),
        FilterOperator::new("{{t(\"is not\")}}", "$ne"),
        FilterOperator::unary("{{t(\"exists\")}}", "$exists"),
        FilterOperator::unary("{{t(\"not exists\")}}", "$notExists"),
    ]
}

fn boolean_operators() -> Vec<FilterOperator> {
    vec![
        FilterOperator::unary("{{t(\"Yes\")}}", "$isTruly"),
        FilterOperator::unary("{{t(\"No\")}}", "$isFalsy"),
    ]
}

fn association_operators() -> Vec<FilterOperator> {
    vec![
        FilterOperator::unary("{{t(\"exists\")}}", "$exists"),
        FilterOperator::unary("{{t(\"not exists\")}}", "$notExists"),
    ]
}

// ── Interfaces ───────────────────────────────────────────────────────

/// All built-in interfaces, in registration order.
pub fn builtin_interfaces() -> Vec<FieldInterface> {
    vec![
        input(),
        integer(),
        number(),
        checkbox(),
        created_by(),
        many_to_one(),
        one_to_many(),
        many_to_many(),
    ]
}

/// All built-in interface groups.
pub fn builtin_groups() -> Vec<(String, FieldInterfaceGroup)> {
    [
        ("basic", "{{t(\"Basic\")}}"),
        ("choices", "{{t(\"Choices\")}}"),
        ("media", "{{t(\"Media\")}}"),
        ("datetime", "{{t(\"Date & Time\")}}"),
        ("relation", "{{t(\"Relation\")}}"),
        ("advanced", "{{t(\"Advanced type\")}}"),
        ("systemInfo", "{{t(\"System info\")}}"),
        ("others", "{{t(\"Others\")}}"),
    ]
    .into_iter()
    .zip(0..)
    .map(|((name, label), order)| (name.to_owned(), FieldInterfaceGroup::new(label, order)))
    .collect()
}

fn input() -> FieldInterface {
    FieldInterface::new("input")
        .with_group("basic")
        .with_order(1)
        .with_title("{{t(\"Single line text\")}}")
        .with_sortable(true)
        .with_title_usable(true)
        .with_default_options(json!({
            "type": "string",
            "uiSchema": { "type": "string", "x-component": "Input" }
        }))
        .with_available_types(["string", "uid"])
        .with_filterable(Filterable {
            operators: string_operators(),
            children: Vec::new(),
        })
        .with_validate_schema(|_| {
            json!({
                "max": {
                    "type": "number",
                    "title": "{{ t(\"Max length\") }}",
                    "x-decorator": "FormItem",
                    "x-component": "InputNumber",
                    "x-component-props": { "precision": 0 }
                },
                "min": {
                    "type": "number",
                    "title": "{{ t(\"Min length\") }}",
                    "x-decorator": "FormItem",
                    "x-component": "InputNumber",
                    "x-component-props": { "precision": 0 }
                },
                "pattern": pattern_fragment()
            })
        })
}

fn integer() -> FieldInterface {
    FieldInterface::new("integer")
        .with_group("basic")
        .with_order(6)
        .with_title("{{t(\"Integer\")}}")
        .with_sortable(true)
        .with_title_usable(true)
        .with_default_options(json!({
            "type": "bigInt",
            "uiSchema": {
                "type": "number",
                "x-component": "InputNumber",
                "x-component-props": { "stringMode": true, "step": "1" },
                "x-validator": "integer"
            }
        }))
        .with_available_types(["bigInt", "integer"])
        .with_filterable(Filterable {
            operators: number_operators(),
            children: Vec::new(),
        })
        .with_validate_schema(|_| {
            json!({
                "maximum": bound_fragment("{{ t(\"Maximum\") }}"),
                "minimum": bound_fragment("{{ t(\"Minimum\") }}"),
                "format": {
                    "type": "string",
                    "title": "{{ t(\"Format\") }}",
                    "x-decorator": "FormItem",
                    "x-component": "Select",
                    "x-component-props": { "allowClear": true },
                    "enum": [
                        { "label": "{{ t(\"Odd\") }}", "value": "odd" },
                        { "label": "{{ t(\"Even\") }}", "value": "even" }
                    ]
                },
                "pattern": pattern_fragment()
            })
        })
}

fn number() -> FieldInterface {
    FieldInterface::new("number")
        .with_group("basic")
        .with_order(7)
        .with_title("{{t(\"Number\")}}")
        .with_sortable(true)
        .with_title_usable(true)
        .with_default_options(json!({
            "type": "double",
            "uiSchema": {
                "type": "number",
                "x-component": "InputNumber",
                "x-component-props": { "stringMode": true, "step": "1" }
            }
        }))
        .with_available_types(["double", "float", "decimal"])
        .with_filterable(Filterable {
            operators: number_operators(),
            children: Vec::new(),
        })
        .with_validate_schema(|_| {
            json!({
                "maximum": bound_fragment("{{ t(\"Maximum\") }}"),
                "minimum": bound_fragment("{{ t(\"Minimum\") }}"),
                "pattern": pattern_fragment()
            })
        })
}

fn checkbox() -> FieldInterface {
    FieldInterface::new("checkbox")
        .with_group("choices")
        .with_order(1)
        .with_title("{{t(\"Checkbox\")}}")
        .with_sortable(true)
        .with_default_options(json!({
            "type": "boolean",
            "uiSchema": { "type": "boolean", "x-component": "Checkbox" }
        }))
        .with_available_types(["boolean"])
        .with_filterable(Filterable {
            operators: boolean_operators(),
            children: Vec::new(),
        })
}

fn created_by() -> FieldInterface {
    FieldInterface::new("createdBy")
        .with_group("systemInfo")
        .with_order(3)
        .with_title("{{t(\"Created by\")}}")
        .with_association(true)
        .with_default_options(json!({
            "type": "belongsTo",
            "target": "users",
            "foreignKey": "createdById",
            "uiSchema": {
                "type": "object",
                "title": "{{t(\"Created by\")}}",
                "x-component": "AssociationField",
                "x-component-props": { "fieldNames": { "value": "id", "label": "nickname" } },
                "x-read-pretty": true
            }
        }))
        .with_available_types(["belongsTo"])
        .with_filterable(Filterable {
            operators: Vec::new(),
            children: vec![
                FilterableChild {
                    name: "id".into(),
                    title: "{{t(\"ID\")}}".into(),
                    operators: id_operators(),
                    schema: json!({ "title": "{{t(\"ID\")}}", "type": "number", "x-component": "InputNumber" }),
                },
                FilterableChild {
                    name: "nickname".into(),
                    title: "{{t(\"Nickname\")}}".into(),
                    operators: string_operators(),
                    schema: json!({ "title": "{{t(\"Nickname\")}}", "type": "string", "x-component": "Input" }),
                },
            ],
        })
}

fn many_to_one() -> FieldInterface {
    association("m2o", 1, "{{t(\"Many to one\")}}", "belongsTo", false)
}

fn one_to_many() -> FieldInterface {
    association("o2m", 2, "{{t(\"One to many\")}}", "hasMany", true)
}

fn many_to_many() -> FieldInterface {
    association("m2m", 3, "{{t(\"Many to many\")}}", "belongsToMany", true)
}

fn association(name: &str, order: i32, title: &str, storage: &str, multiple: bool) -> FieldInterface {
    FieldInterface::new(name)
        .with_group("relation")
        .with_order(order)
        .with_title(title)
        .with_association(true)
        .with_default_options(json!({
            "type": storage,
            "uiSchema": {
                "x-component": "AssociationField",
                "x-component-props": {
                    "multiple": multiple,
                    "fieldNames": { "label": "id", "value": "id" }
                }
            }
        }))
        .with_available_types([storage])
        .with_filterable(Filterable {
            operators: association_operators(),
            children: Vec::new(),
        })
}

// ── Shared schema fragments ──────────────────────────────────────────

fn bound_fragment(title: &str) -> Value {
    json!({
        "type": "number",
        "title": title,
        "x-decorator": "FormItem",
        "x-component": "InputNumber",
        "x-component-props": { "precision": 0 }
    })
}

fn pattern_fragment() -> Value {
    json!({
        "type": "string",
        "title": "{{ t(\"Regular expression\") }}",
        "x-decorator": "FormItem",
        "x-component": "Input",
        "x-component-props": { "prefix": "/", "suffix": "/" }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_unique() {
        let interfaces = builtin_interfaces();
        let mut names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), interfaces.len());
    }

    #[test]
    fn integer_validate_schema_offers_bounds_and_format() {
        let integer = integer();
        let fragment = integer.validate_schema(&json!({}));
        for key in ["maximum", "minimum", "format", "pattern"] {
            assert!(fragment.get(key).is_some(), "missing {key}");
        }
        assert_eq!(integer.storage_type(), Some("bigInt"));
    }

    #[test]
    fn created_by_filters_through_children() {
        let created_by = created_by();
        let filterable = created_by.filterable.clone().unwrap_or_default();
        let children: Vec<&str> = filterable.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, vec!["id", "nickname"]);
        assert!(created_by.is_association);
    }

    #[test]
    fn groups_are_ordered() {
        let groups = builtin_groups();
        assert_eq!(groups.first().map(|(n, _)| n.as_str()), Some("basic"));
        assert_eq!(groups.last().map(|(_, g)| g.order), Some(7));
    }
}
