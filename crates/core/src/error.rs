use thiserror::Error;

pub type AudienceResult<T> = Result<T, AudienceError>;

#[derive(Error, Debug)]
pub enum AudienceError {
    #[error("Segment not found: {0}")]
    NotFound(String),

    #[error("Segment name is reserved: {0}")]
    ReservedName(String),

    #[error("Segment already registered: {0}")]
    DuplicateName(String),

    #[error("Invalid segment name: {0:?}")]
    InvalidName(String),

    #[error("Registry is sealed, cannot register segment: {0}")]
    Sealed(String),

    #[error("Segment operation not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    #[error("Segment does not support operation: {operation}")]
    UnsupportedOperation { operation: &'static str },

    #[error("Failed to construct segment {segment}: {reason}")]
    Construction { segment: String, reason: String },

    #[error("Segment {segment} failed: {source}")]
    SegmentFailed {
        segment: String,
        #[source]
        source: Box<AudienceError>,
    },

    #[error("Member store error: {0}")]
    MemberStore(String),

    #[error("Member type already designated as {existing}, refusing {attempted}")]
    MemberTypeAlreadyDesignated {
        existing: &'static str,
        attempted: &'static str,
    },

    #[error("Designated member type is {designated}, not {requested}")]
    MemberTypeMismatch {
        designated: &'static str,
        requested: &'static str,
    },

    #[error("No member type has been designated for this process")]
    NoDesignatedMember,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AudienceError {
    /// Wraps `self` with the name of the segment it came from, unless it
    /// already names one.
    pub fn in_segment(self, segment: impl Into<String>) -> Self {
        match self {
            Self::SegmentFailed { .. } => self,
            other => Self::SegmentFailed {
                segment: segment.into(),
                source: Box::new(other),
            },
        }
    }

    /// The segment name carried by a batch failure, if any.
    pub fn segment(&self) -> Option<&str> {
        match self {
            Self::SegmentFailed { segment, .. } | Self::Construction { segment, .. } => {
                Some(segment.as_str())
            }
            Self::NotFound(name)
            | Self::ReservedName(name)
            | Self::DuplicateName(name)
            | Self::Sealed(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for AudienceError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
