use std::path::PathBuf;

/// Everything the engine can report. All variants are recoverable; the
/// host shows them as a single notification.
#[derive(Debug, thiserror::Error)]
pub enum OtfError {
    #[error("you must have a character selected")]
    NoActor,

    #[error("no skill or spell named '{name}' found on {actor}")]
    SkillNotFound { name: String, actor: String },

    #[error("no melee or ranged attack named '{name}' found on {actor}")]
    AttackNotFound { name: String, actor: String },

    #[error("unable to find a {defense} to roll")]
    NoDefense { defense: String },

    #[error("invalid dice formula: {0}")]
    InvalidFormula(String),

    #[error("invalid page reference: {0}")]
    InvalidReference(String),

    #[error("cannot decode action: {0}")]
    Decode(String),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, OtfError>;
