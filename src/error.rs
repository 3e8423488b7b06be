use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /* engine validation failures */
    #[error("Group [{name}] already exists in set [{set}]")]
    DuplicateGroupName { set: String, name: String },

    #[error("Stale snapshot: fetched version {fetched} is behind current version {current}")]
    StaleSnapshot { current: u32, fetched: u32 },

    /* mapped errors */
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error(transparent)]
    SerdeYamlError(#[from] serde_yml::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
