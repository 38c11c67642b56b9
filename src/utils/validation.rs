use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Maximum length of an object name component, in bytes
pub const MAX_NAME_LENGTH: usize = 1024;

/// Checks an uploaded file name before it becomes part of an object path.
///
/// Names are used as-is (no renaming), so anything that could escape the
/// upload folder is rejected: path separators, `.` and `..`, and control
/// characters.
pub fn validate_file_name(name: &str) -> Result<&str, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", name);
        return Err(ValidationError {
            code: "PATH_TRAVERSAL",
            message: format!("Filename '{}' must not contain path components", name),
        });
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename must not contain control characters".to_string(),
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError {
            code: "FILENAME_TOO_LONG",
            message: format!("Filename exceeds {} bytes", MAX_NAME_LENGTH),
        });
    }

    Ok(name)
}

/// Object names in a delete request are taken verbatim, never prefixed or cleaned up.
///
/// Names that a store client would silently rewrite (a leading or trailing
/// `/`, or an empty segment such as `a//b`) are refused, since the rewritten
/// name addresses a different object.
pub fn validate_object_name(name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_OBJECT_NAME",
            message: "Object name cannot be empty".to_string(),
        });
    }

    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return Err(ValidationError {
            code: "INVALID_OBJECT_NAME",
            message: format!(
                "Object name '{}' has a leading, trailing or repeated '/'",
                name
            ),
        });
    }

    Ok(name)
}
