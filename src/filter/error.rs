use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("The sortBy must be one of [Newest Oldest Popular Relevance]")]
    InvalidSort(String),
}
