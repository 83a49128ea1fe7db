pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("marker {index} has non-positive radius: {radius}")]
    InvalidRadius { index: usize, radius: f64 },

    #[error("marker {index} references lane {lane}, but only {lanes} lanes exist")]
    LaneOutOfBounds {
        index: usize,
        lane: usize,
        lanes: usize,
    },
}
