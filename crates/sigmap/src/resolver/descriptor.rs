use serde_json::Value;
use thiserror::Error;

pub const MODULE_FIELD: &str = "Module";
pub const PATTERN_FIELD: &str = "Pattern";
pub const OFFSET_FIELD: &str = "Offset";
pub const RELATIVE_JUMP_FIELD: &str = "IsRelativeJump";
pub const VT_INDEX_FIELD: &str = "VTIndex";
pub const VT_PTR_NAME_FIELD: &str = "VTPtrName";

/// A malformed field in an address descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("{0} field missing")]
    MissingField(&'static str),

    #[error("{field} field not {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// How to compute one address, parsed from a configuration property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressDescriptor {
    /// Scan `module` for `pattern`, add `offset`, optionally follow a rel32 call/jmp
    Pattern {
        module: String,
        pattern: String,
        offset: i64,
        relative_jump: bool,
    },
    /// Slot `index` of the vtable of the instance stored in the registry as `instance`
    Virtual { instance: String, index: usize },
}

impl AddressDescriptor {
    /// Parse a descriptor object.
    ///
    /// `Pattern` takes precedence over `VTIndex`. A `VTIndex` without a
    /// `VTPtrName` has no instance to index and yields `Ok(None)`, as does a
    /// value that is not an object or carries neither form.
    pub fn from_json(value: &Value) -> Result<Option<Self>, DescriptorError> {
        if value.get(PATTERN_FIELD).is_some() {
            return parse_pattern(value).map(Some);
        }

        if value.get(VT_INDEX_FIELD).is_some() && value.get(VT_PTR_NAME_FIELD).is_some() {
            let index = virtual_index(value)?;
            let instance = string_field(value, VT_PTR_NAME_FIELD)?;
            return Ok(Some(AddressDescriptor::Virtual { instance, index }));
        }

        Ok(None)
    }
}

/// Read the `VTIndex` field of a descriptor
pub fn virtual_index(value: &Value) -> Result<usize, DescriptorError> {
    let field = value
        .get(VT_INDEX_FIELD)
        .ok_or(DescriptorError::MissingField(VT_INDEX_FIELD))?;

    integral(field)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or(DescriptorError::WrongType {
            field: VT_INDEX_FIELD,
            expected: "a non-negative integer",
        })
}

/// Integer value of a JSON number, accepting floats with no fractional part
fn integral(field: &Value) -> Option<i128> {
    if let Some(v) = field.as_i64() {
        return Some(v.into());
    }
    if let Some(v) = field.as_u64() {
        return Some(v.into());
    }

    let v = field.as_f64()?;
    (v.fract() == 0.0 && v >= i64::MIN as f64 && v < u64::MAX as f64).then_some(v as i128)
}

fn parse_pattern(value: &Value) -> Result<AddressDescriptor, DescriptorError> {
    let module = string_field(value, MODULE_FIELD)?;
    let pattern = string_field(value, PATTERN_FIELD)?;

    let offset = match value.get(OFFSET_FIELD) {
        None => 0,
        Some(field) => integral(field)
            .and_then(|v| i64::try_from(v).ok())
            .ok_or(DescriptorError::WrongType {
                field: OFFSET_FIELD,
                expected: "an integer",
            })?,
    };

    Ok(AddressDescriptor::Pattern {
        module,
        pattern,
        offset,
        relative_jump: value.get(RELATIVE_JUMP_FIELD).is_some(),
    })
}

fn string_field(value: &Value, field: &'static str) -> Result<String, DescriptorError> {
    value
        .get(field)
        .ok_or(DescriptorError::MissingField(field))?
        .as_str()
        .map(str::to_string)
        .ok_or(DescriptorError::WrongType {
            field,
            expected: "a string",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pattern_descriptor() {
        let value = json!({
            "Module": "engine.dll",
            "Pattern": "55 8B EC ?? ??",
            "Offset": -4,
            "IsRelativeJump": true
        });

        let descriptor = AddressDescriptor::from_json(&value).unwrap().unwrap();
        assert_eq!(
            descriptor,
            AddressDescriptor::Pattern {
                module: "engine.dll".to_string(),
                pattern: "55 8B EC ?? ??".to_string(),
                offset: -4,
                relative_jump: true,
            }
        );
    }

    #[test]
    fn test_pattern_defaults() {
        let value = json!({ "Module": "client.dll", "Pattern": "C3" });

        match AddressDescriptor::from_json(&value).unwrap().unwrap() {
            AddressDescriptor::Pattern {
                offset,
                relative_jump,
                ..
            } => {
                assert_eq!(offset, 0);
                assert!(!relative_jump);
            }
            other => panic!("unexpected descriptor: {:?}", other),
        }
    }

    #[test]
    fn test_relative_jump_is_presence_flag() {
        let value = json!({ "Module": "client.dll", "Pattern": "E8", "IsRelativeJump": false });

        match AddressDescriptor::from_json(&value).unwrap().unwrap() {
            AddressDescriptor::Pattern { relative_jump, .. } => assert!(relative_jump),
            other => panic!("unexpected descriptor: {:?}", other),
        }
    }

    #[test]
    fn test_parse_virtual_descriptor() {
        let value = json!({ "VTIndex": 13, "VTPtrName": "EngineClient" });

        let descriptor = AddressDescriptor::from_json(&value).unwrap().unwrap();
        assert_eq!(
            descriptor,
            AddressDescriptor::Virtual {
                instance: "EngineClient".to_string(),
                index: 13,
            }
        );
    }

    #[test]
    fn test_pattern_takes_precedence() {
        let value = json!({
            "Module": "client.dll",
            "Pattern": "C3",
            "VTIndex": 2,
            "VTPtrName": "Device"
        });

        assert!(matches!(
            AddressDescriptor::from_json(&value).unwrap(),
            Some(AddressDescriptor::Pattern { .. })
        ));
    }

    #[test]
    fn test_nothing_to_resolve() {
        assert_eq!(AddressDescriptor::from_json(&json!({})).unwrap(), None);
        assert_eq!(AddressDescriptor::from_json(&json!(true)).unwrap(), None);
        assert_eq!(
            AddressDescriptor::from_json(&json!({ "VTIndex": 3 })).unwrap(),
            None
        );
    }

    #[test]
    fn test_malformed_fields() {
        let value = json!({ "Module": "client.dll", "Pattern": "C3", "Offset": "8" });
        assert_eq!(
            AddressDescriptor::from_json(&value),
            Err(DescriptorError::WrongType {
                field: OFFSET_FIELD,
                expected: "an integer",
            })
        );

        let value = json!({ "Module": "client.dll", "Pattern": "C3", "Offset": 2.5 });
        assert!(AddressDescriptor::from_json(&value).is_err());

        let value = json!({ "Pattern": "C3" });
        assert_eq!(
            AddressDescriptor::from_json(&value),
            Err(DescriptorError::MissingField(MODULE_FIELD))
        );

        let value = json!({ "VTIndex": -1, "VTPtrName": "Device" });
        assert!(AddressDescriptor::from_json(&value).is_err());
    }

    #[test]
    fn test_integral_floats_are_accepted() {
        let value = json!({ "Module": "client.dll", "Pattern": "C3", "Offset": -2.0 });
        match AddressDescriptor::from_json(&value).unwrap().unwrap() {
            AddressDescriptor::Pattern { offset, .. } => assert_eq!(offset, -2),
            other => panic!("unexpected descriptor: {:?}", other),
        }

        assert_eq!(virtual_index(&json!({ "VTIndex": 13.0 })), Ok(13));
        assert!(virtual_index(&json!({ "VTIndex": 13.5 })).is_err());
        assert!(virtual_index(&json!({ "VTIndex": -1.0 })).is_err());
    }

    #[test]
    fn test_virtual_index_out_of_range() {
        assert_eq!(
            virtual_index(&json!({ "VTIndex": u64::MAX })).ok(),
            usize::try_from(u64::MAX).ok()
        );
        assert!(virtual_index(&json!({ "VTIndex": 1e30 })).is_err());
    }

    #[test]
    fn test_virtual_index() {
        assert_eq!(virtual_index(&json!({ "VTIndex": 7 })), Ok(7));
        assert_eq!(
            virtual_index(&json!({})),
            Err(DescriptorError::MissingField(VT_INDEX_FIELD))
        );
    }
}
