use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("buffer of {actual} values does not fit a {width}x{height} grid")]
    ShapeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },
}
