use thiserror::Error;

use crate::wizard::Stage;

#[derive(Error, Debug)]
pub enum BrewError {
    #[error("cannot leave {stage}: {reason}")]
    Gating { stage: Stage, reason: &'static str },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("{message}")]
    Generation {
        message: &'static str,
        #[source]
        source: Box<BrewError>,
    },
    #[error("export failed: {0}")]
    Export(String),
    #[error("config error: {0}")]
    Config(String),
}

impl BrewError {
    pub fn schema(msg: impl Into<String>) -> Self {
        BrewError::Schema(msg.into())
    }

    /// Wrap a transport/schema failure into the banner shown to the user.
    pub fn generation(message: &'static str, source: BrewError) -> Self {
        BrewError::Generation { message, source: Box::new(source) }
    }

    pub fn is_gating(&self) -> bool {
        matches!(self, BrewError::Gating { .. })
    }
}
