use thiserror::Error;
use vantage_3d::RenderError;

#[derive(Error, Debug)]
pub enum SceneError {
    /// Pick ids live in one 8-bit channel.
    #[error("scene already holds {limit} models")]
    TooManyModels { limit: usize },

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type SceneResult<T> = std::result::Result<T, SceneError>;
