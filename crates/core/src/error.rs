use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0} missing. Put it in .env")]
    MissingSetting(&'static str),

    #[error("Invalid study pack: {0}")]
    InvalidStudyPack(String),
}
