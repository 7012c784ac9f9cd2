use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(
        "cannot find expected fixture {path} for {method} request to {target}. \
         Either the request properties or content seem to differ from the expected recorded state.\n\
         Request:\n{request}\nRequest content:\n{request_content}"
    )]
    FixtureNotFound {
        method: String,
        target: String,
        path: String,
        request: String,
        request_content: String,
    },
}
