use std::path::PathBuf;

pub type ExportResult<T> = Result<T, ExportError>;

/// Encoder invocation that produced a subprocess failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderPass {
    Probe,
    Video,
    Mux,
}

impl std::fmt::Display for EncoderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncoderPass::Probe => write!(f, "capability probe"),
            EncoderPass::Video => write!(f, "video pass"),
            EncoderPass::Mux => write!(f, "mux pass"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("could not launch encoder '{}': {source}", path.display())]
    EncoderUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder does not report '{marker}' support, a build with x264 enabled is required")]
    MissingCapability { marker: String },

    #[error("no channels selected for export")]
    NoChannelsSelected,

    #[error("song produced no playable frames")]
    EmptySong,

    #[error("failed to start encoder {pass}: {source}")]
    Spawn {
        pass: EncoderPass,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder {pass} exited with {status}: {stderr}")]
    EncoderFailed {
        pass: EncoderPass,
        status: String,
        stderr: String,
    },

    #[error("audio error: {0}")]
    Audio(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("trace error: {0}")]
    Trace(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn trace(msg: impl Into<String>) -> Self {
        Self::Trace(msg.into())
    }

    /// True for failures detected before any rendering work starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExportError::EncoderUnavailable { .. }
                | ExportError::MissingCapability { .. }
                | ExportError::NoChannelsSelected
                | ExportError::EmptySong
        )
    }
}

impl From<hound::Error> for ExportError {
    fn from(err: hound::Error) -> Self {
        ExportError::Audio(err.to_string())
    }
}
