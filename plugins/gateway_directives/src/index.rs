use std::collections::BTreeSet;

use gateway_common::graphql::ParsedGraphQLSchema;
use graphql_parser::schema::{
  Definition as SchemaDefinition, Directive, Field, TypeDefinition, TypeExtension, Value,
};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use tracing::debug;

use crate::config::OperationKind;

/// Argument name to parsed value, in the order the arguments appear in the schema.
pub type DirectiveArguments = IndexMap<String, JsonValue>;
/// Directive name to its arguments, for a single field.
pub type FieldDirectives = IndexMap<String, DirectiveArguments>;

type StaticField = Field<'static, String>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectiveIndexError {
  #[error("argument \"{argument}\" of directive @{directive} is a {kind} literal, only boolean and list literals are supported")]
  UnsupportedArgumentValue {
    directive: String,
    argument: String,
    kind: &'static str,
  },
}

/// Recognized directive applications on root operation fields, keyed by operation kind and
/// field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveIndex {
  fields: IndexMap<(OperationKind, String), FieldDirectives>,
}

impl DirectiveIndex {
  /// Scans the root types of `operation_types` and keeps the directives named in
  /// `recognized_names`. Fails on the first argument that is neither a boolean nor a list.
  pub fn build(
    schema: &ParsedGraphQLSchema,
    recognized_names: &[&str],
    operation_types: &BTreeSet<OperationKind>,
  ) -> Result<Self, DirectiveIndexError> {
    let mut index = DirectiveIndex::default();

    for kind in operation_types {
      let root_type = match root_type_name(schema, *kind) {
        Some(root_type) => root_type,
        None => {
          debug!("schema declares no {:?} root type, skipping", kind);
          continue;
        }
      };
      debug!("indexing directives of root type {} ({:?})", root_type, kind);

      for field in root_type_fields(schema, &root_type) {
        let mut directives = FieldDirectives::new();

        for directive in &field.directives {
          if !recognized_names.contains(&directive.name.as_str()) {
            continue;
          }

          // repeated directives on the same field: last one wins
          directives.insert(directive.name.clone(), parse_arguments(directive)?);
        }

        if !directives.is_empty() {
          index
            .fields
            .entry((*kind, field.name.clone()))
            .or_default()
            .extend(directives);
        }
      }
    }

    debug!("directive index built with {} field(s)", index.len());

    Ok(index)
  }

  pub fn field(&self, kind: OperationKind, field_name: &str) -> Option<&FieldDirectives> {
    self.fields.get(&(kind, field_name.to_string()))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&(OperationKind, String), &FieldDirectives)> {
    self.fields.iter()
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }
}

/// The root type named by the `schema { }` block. Conventional names apply only when the
/// schema has no such block.
fn root_type_name(schema: &ParsedGraphQLSchema, kind: OperationKind) -> Option<String> {
  let schema_definition = schema
    .definitions
    .iter()
    .find_map(|definition| match definition {
      SchemaDefinition::SchemaDefinition(schema_definition) => Some(schema_definition),
      _ => None,
    });

  match schema_definition {
    Some(schema_definition) => match kind {
      OperationKind::Query => schema_definition.query.clone(),
      OperationKind::Mutation => schema_definition.mutation.clone(),
      OperationKind::Subscription => schema_definition.subscription.clone(),
    },
    None => Some(kind.default_root_type_name().to_string()),
  }
}

/// Fields of the type definition and of all its extensions, in document order.
fn root_type_fields<'s>(schema: &'s ParsedGraphQLSchema, type_name: &str) -> Vec<&'s StaticField> {
  schema
    .definitions
    .iter()
    .flat_map(|definition| {
      let fields: &'s [StaticField] = match definition {
        SchemaDefinition::TypeDefinition(TypeDefinition::Object(object)) if object.name == type_name => {
          &object.fields
        }
        SchemaDefinition::TypeExtension(TypeExtension::Object(object)) if object.name == type_name => {
          &object.fields
        }
        _ => &[],
      };

      fields.iter()
    })
    .collect()
}

fn parse_arguments(
  directive: &Directive<'static, String>,
) -> Result<DirectiveArguments, DirectiveIndexError> {
  directive
    .arguments
    .iter()
    .map(|(name, value)| {
      let parsed = match value {
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::List(items) => JsonValue::Array(items.iter().map(literal_to_json).collect()),
        other => {
          return Err(DirectiveIndexError::UnsupportedArgumentValue {
            directive: directive.name.clone(),
            argument: name.clone(),
            kind: literal_kind(other),
          })
        }
      };

      Ok((name.clone(), parsed))
    })
    .collect()
}

fn literal_to_json(value: &Value<'static, String>) -> JsonValue {
  match value {
    Value::Boolean(b) => JsonValue::Bool(*b),
    Value::String(s) | Value::Enum(s) => JsonValue::String(s.clone()),
    Value::Int(n) => n.as_i64().map(JsonValue::from).unwrap_or(JsonValue::Null),
    Value::Float(f) => Number::from_f64(*f)
      .map(JsonValue::Number)
      .unwrap_or(JsonValue::Null),
    Value::List(items) => JsonValue::Array(items.iter().map(literal_to_json).collect()),
    Value::Object(fields) => JsonValue::Object(
      fields
        .iter()
        .map(|(k, v)| (k.clone(), literal_to_json(v)))
        .collect::<Map<String, JsonValue>>(),
    ),
    // variables have no meaning in a schema
    Value::Variable(_) | Value::Null => JsonValue::Null,
  }
}

fn literal_kind(value: &Value<'static, String>) -> &'static str {
  match value {
    Value::Variable(_) => "variable",
    Value::Int(_) => "int",
    Value::Float(_) => "float",
    Value::String(_) => "string",
    Value::Boolean(_) => "boolean",
    Value::Null => "null",
    Value::Enum(_) => "enum",
    Value::List(_) => "list",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gateway_common::graphql::parse_graphql_schema;
  use serde_json::json;

  fn mutations() -> BTreeSet<OperationKind> {
    BTreeSet::from([OperationKind::Mutation])
  }

  fn build(sdl: &str, names: &[&str], kinds: &BTreeSet<OperationKind>) -> Result<DirectiveIndex, DirectiveIndexError> {
    DirectiveIndex::build(&parse_graphql_schema(sdl).unwrap(), names, kinds)
  }

  #[test]
  fn indexes_boolean_argument() {
    let index = build(
      r#"
        directive @audit(flag: Boolean) on FIELD_DEFINITION
        type Query { hello: String }
        type Mutation { m: Boolean @audit(flag: true) }
      "#,
      &["audit"],
      &mutations(),
    )
    .unwrap();

    assert_eq!(index.len(), 1);
    let field = index.field(OperationKind::Mutation, "m").unwrap();
    assert_eq!(field.len(), 1);
    assert_eq!(
      field.get("audit").unwrap(),
      &DirectiveArguments::from([("flag".to_string(), json!(true))])
    );
  }

  #[test]
  fn skips_unrecognized_directives() {
    let index = build(
      r#"
        type Mutation {
          m: Boolean @audit(flag: true) @other(flag: false)
          n: Boolean @other(flag: true)
          o: Boolean
        }
      "#,
      &["audit"],
      &mutations(),
    )
    .unwrap();

    assert_eq!(index.len(), 1);
    let field = index.field(OperationKind::Mutation, "m").unwrap();
    assert!(field.get("other").is_none());
    assert!(index.field(OperationKind::Mutation, "n").is_none());
    assert!(index.field(OperationKind::Mutation, "o").is_none());
  }

  #[test]
  fn parses_list_arguments_and_keeps_order() {
    let index = build(
      r#"
        type Mutation {
          m: Boolean @rateLimit(enabled: true, scopes: ["admin", USER, 3, 1.5, null, [false], {a: "b"}]) @audit(flag: false)
        }
      "#,
      &["audit", "rateLimit"],
      &mutations(),
    )
    .unwrap();

    let field = index.field(OperationKind::Mutation, "m").unwrap();
    assert_eq!(field.keys().collect::<Vec<_>>(), vec!["rateLimit", "audit"]);

    let rate_limit = field.get("rateLimit").unwrap();
    assert_eq!(rate_limit.keys().collect::<Vec<_>>(), vec!["enabled", "scopes"]);
    assert_eq!(
      rate_limit.get("scopes").unwrap(),
      &json!(["admin", "USER", 3, 1.5, null, [false], {"a": "b"}])
    );
  }

  #[test]
  fn rejects_unsupported_argument_literals() {
    for (literal, kind) in [
      ("\"x\"", "string"),
      ("1", "int"),
      ("1.5", "float"),
      ("ADMIN", "enum"),
      ("{a: true}", "object"),
      ("null", "null"),
    ] {
      let sdl = format!("type Mutation {{ m: Boolean @audit(flag: {}) }}", literal);
      let result = build(&sdl, &["audit"], &mutations());

      assert_eq!(
        result,
        Err(DirectiveIndexError::UnsupportedArgumentValue {
          directive: "audit".to_string(),
          argument: "flag".to_string(),
          kind,
        })
      );
    }

    // unrecognized directives are never parsed
    assert!(build(
      "type Mutation { m: Boolean @other(flag: \"x\") }",
      &["audit"],
      &mutations()
    )
    .is_ok());
  }

  #[test]
  fn repeated_directive_last_write_wins() {
    let index = build(
      "type Mutation { m: Boolean @audit(flag: true) @audit(flag: false) }",
      &["audit"],
      &mutations(),
    )
    .unwrap();

    assert_eq!(
      index.field(OperationKind::Mutation, "m").unwrap()["audit"]["flag"],
      json!(false)
    );
  }

  #[test]
  fn resolves_root_types_from_schema_definition_and_extensions() {
    let sdl = r#"
      schema { query: RootQuery mutation: RootMutation }
      type RootQuery { q: String @audit(flag: true) }
      type RootMutation { a: Boolean @audit(flag: true) }
      extend type RootMutation { b: Boolean @audit(flag: false) }
      type Mutation { ignored: Boolean @audit(flag: true) }
    "#;

    let index = build(sdl, &["audit"], &mutations()).unwrap();
    assert_eq!(index.len(), 2);
    assert!(index.field(OperationKind::Mutation, "a").is_some());
    assert!(index.field(OperationKind::Mutation, "b").is_some());
    assert!(index.field(OperationKind::Mutation, "ignored").is_none());
    assert!(index.field(OperationKind::Query, "q").is_none());

    let index = build(
      sdl,
      &["audit"],
      &BTreeSet::from([OperationKind::Query, OperationKind::Mutation]),
    )
    .unwrap();
    assert_eq!(index.len(), 3);
    assert!(index.field(OperationKind::Query, "q").is_some());
  }

  #[test]
  fn schema_definition_without_mutation_root_indexes_no_mutations() {
    let index = build(
      r#"
        schema { query: Query }
        type Query { q: String @audit(flag: true) }
        type Mutation { m: Boolean @audit(flag: true) }
      "#,
      &["audit"],
      &BTreeSet::from([OperationKind::Query, OperationKind::Mutation]),
    )
    .unwrap();

    assert_eq!(index.len(), 1);
    assert!(index.field(OperationKind::Query, "q").is_some());
    assert!(index.field(OperationKind::Mutation, "m").is_none());
  }

  #[test]
  fn same_field_name_on_different_roots_does_not_collide() {
    let index = build(
      r#"
        type Query { hello: String @audit(flag: true) }
        type Mutation { hello: String @audit(flag: false) }
      "#,
      &["audit"],
      &BTreeSet::from([OperationKind::Query, OperationKind::Mutation]),
    )
    .unwrap();

    assert_eq!(index.field(OperationKind::Query, "hello").unwrap()["audit"]["flag"], json!(true));
    assert_eq!(index.field(OperationKind::Mutation, "hello").unwrap()["audit"]["flag"], json!(false));
  }

  #[test]
  fn missing_root_type_contributes_nothing() {
    let index = build("type Query { hello: String }", &["audit"], &mutations()).unwrap();
    assert!(index.is_empty());
  }
}
