use crate::errors::ToolError;

#[derive(Clone, Debug, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, value: Option<&str>, label: &str) -> Result<String, ToolError> {
        let text = value.map(str::trim).unwrap_or("");
        if text.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(text.to_string())
    }

    pub fn ensure_port(&self, value: Option<u16>) -> Result<Option<u16>, ToolError> {
        match value {
            Some(0) => Err(ToolError::invalid_params(
                "port must be an integer between 1 and 65535",
            )),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Validation;
    use crate::errors::ToolErrorKind;

    #[test]
    fn ensure_string_rejects_blank() {
        let validation = Validation::new();
        let err = validation.ensure_string(Some("   "), "host").unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidParams);
        assert_eq!(err.message, "host must be a non-empty string");
        assert!(validation.ensure_string(None, "user").is_err());
        assert_eq!(validation.ensure_string(Some(" ci "), "user").unwrap(), "ci");
    }

    #[test]
    fn ensure_port_rejects_zero() {
        let validation = Validation::new();
        assert!(validation.ensure_port(Some(0)).is_err());
        assert_eq!(validation.ensure_port(Some(2222)).unwrap(), Some(2222));
        assert_eq!(validation.ensure_port(None).unwrap(), None);
    }
}
