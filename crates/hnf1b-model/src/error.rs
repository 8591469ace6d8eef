use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid coordinate on chromosome {chromosome}: start {start} > end {end}")]
    InvalidCoordinate {
        chromosome: String,
        start: u64,
        end: u64,
    },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
