pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Layout(#[from] bumble::Error),

    #[error("invalid date bounds: minimum {min} is after maximum {max}")]
    InvalidDateBounds { min: String, max: String },

    #[error("invalid radius range: [{lo}, {hi}]")]
    InvalidRadiusRange { lo: f64, hi: f64 },
}
