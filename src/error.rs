use std::fmt;

#[derive(Debug)]
pub enum ProbeError {
    /// Automation server answered but reported a failure
    Transport { command: String, message: String },

    /// HTTP request to the automation server failed
    Http { context: String, source: reqwest::Error },

    /// JSON parsing failed (server response, progress file, action record)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed (request body, progress file)
    JsonSerialize { context: String, source: serde_json::Error },

    /// Hierarchy snapshot was not well-formed XML
    XmlParse(String),

    /// Filesystem operation failed
    Io { context: String, source: std::io::Error },

    /// Screenshot could not be decoded
    Image { context: String, source: image::ImageError },

    /// Config file missing or malformed
    Config(String),

    /// An artifact expected from an earlier stage is absent
    MissingArtifact(String),

    /// Too many consecutive failed cycles; the device is considered gone
    TransportLost(String),
}

impl ProbeError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProbeError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn transport(command: impl Into<String>, message: impl Into<String>) -> Self {
        ProbeError::Transport {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Transport { command, message } => {
                write!(f, "Transport command '{}' failed: {}", command, message)
            }
            ProbeError::Http { context, source } => {
                write!(f, "HTTP error ({}): {}", context, source)
            }
            ProbeError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            ProbeError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            ProbeError::XmlParse(msg) => {
                write!(f, "Malformed hierarchy XML: {}", msg)
            }
            ProbeError::Io { context, source } => {
                write!(f, "I/O error ({}): {}", context, source)
            }
            ProbeError::Image { context, source } => {
                write!(f, "Image error ({}): {}", context, source)
            }
            ProbeError::Config(msg) => {
                write!(f, "Config error: {}", msg)
            }
            ProbeError::MissingArtifact(msg) => {
                write!(f, "Missing artifact: {}", msg)
            }
            ProbeError::TransportLost(msg) => {
                write!(f, "Device transport lost: {}", msg)
            }
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Http { source, .. } => Some(source),
            ProbeError::JsonParse { source, .. } => Some(source),
            ProbeError::JsonSerialize { source, .. } => Some(source),
            ProbeError::Io { source, .. } => Some(source),
            ProbeError::Image { source, .. } => Some(source),
            _ => None,
        }
    }
}
