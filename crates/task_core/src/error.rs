use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    Format(String),
    Validation(String),
    TypeConversion(String),
}

impl TaskError {
    pub fn format_error<M: Into<String>>(message: M) -> Self {
        Self::Format(message.into())
    }

    pub fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation(message.into())
    }

    pub fn field_validation<M: fmt::Display>(field: &str, message: M) -> Self {
        Self::Validation(format!("{field}: {message}"))
    }

    pub fn type_conversion<M: fmt::Display>(field: &str, message: M) -> Self {
        Self::TypeConversion(format!("{field}: {message}"))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Format(_) => "format_error",
            Self::Validation(_) => "validation_error",
            Self::TypeConversion(_) => "type_conversion",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Format(message) => message,
            Self::Validation(message) => message,
            Self::TypeConversion(message) => message,
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for TaskError {}
