use serde_json::Value;

/// Reserved property naming the title to inherit from
pub const INHERIT_PROPERTY: &str = "Inherit";

/// Properties configured for one game title, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfigEntry {
    pub title: String,
    pub properties: Vec<(String, Value)>,
}

impl GameConfigEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(n, _)| n.as_str())
    }

    pub fn has_inherit(&self) -> bool {
        self.contains(INHERIT_PROPERTY)
    }

    /// Properties as a JSON object, in order
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.properties
                .iter()
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
        )
    }
}
