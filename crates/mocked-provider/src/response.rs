use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A response travelling back through the link chain, in the GraphQL over HTTP JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphqlResponse {
    pub fn from_data(data: Value) -> Self {
        GraphqlResponse {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn from_errors(errors: Vec<GraphqlError>) -> Self {
        GraphqlResponse {
            errors,
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphqlError {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl IntoIterator<Item = PathSegment>) -> Self {
        self.path = path.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.get_or_insert_with(Map::new).insert(key.into(), value);
        self
    }
}

impl fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Field(String),
}

impl From<&str> for PathSegment {
    fn from(field: &str) -> Self {
        PathSegment::Field(field.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_a_partial_response() {
        let response: GraphqlResponse = serde_json::from_value(json!({
            "data": { "todo": null, "todos": [{ "text": "Success" }] },
            "errors": [{
                "message": "Boom",
                "locations": [{ "line": 1, "column": 3 }],
                "path": ["todo"]
            }]
        }))
        .unwrap();

        assert!(response.has_errors());
        assert_eq!(response.errors[0].path, vec![PathSegment::from("todo")]);
        assert_eq!(response.errors[0].locations, vec![Location { line: 1, column: 3 }]);
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let response = GraphqlResponse::from_errors(vec![GraphqlError::new("nope").with_path([
            PathSegment::from("todos"),
            PathSegment::Index(1),
        ])]);

        insta::assert_json_snapshot!(response, @r###"
        {
          "errors": [
            {
              "message": "nope",
              "path": [
                "todos",
                1
              ]
            }
          ]
        }
        "###);
    }
}
