use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage failures are fatal for the current run: a dropped weekly
    /// snapshot must fail visibly rather than silently.
    #[error(transparent)]
    Db(#[from] trendlens_db::DbError),
}
