/// Convenience result type used across Quadrille.
pub type QuadrilleResult<T> = Result<T, QuadrilleError>;

/// Top-level error taxonomy used by compositor APIs.
///
/// Soft per-quad failures (a not-yet-delivered surface, an unrecognized quad
/// kind) are deliberately *not* errors: the rasterizer degrades to skipping
/// the quad or drawing a fallback fill and records a diagnostic instead.
#[derive(thiserror::Error, Debug)]
pub enum QuadrilleError {
    /// The root window handed to `compose` is absent or not visible.
    #[error("no root window: {0}")]
    NoRootWindow(String),

    /// The rasterizer was driven outside its binding state machine.
    #[error("binding error: {0}")]
    Binding(String),

    /// The presentation sink rejected a finished frame.
    #[error("presentation error: {0}")]
    Presentation(String),

    /// Invalid caller-provided data (zero-sized viewport, bad rect, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuadrilleError {
    /// Build a [`QuadrilleError::NoRootWindow`] value.
    pub fn no_root_window(msg: impl Into<String>) -> Self {
        Self::NoRootWindow(msg.into())
    }

    /// Build a [`QuadrilleError::Binding`] value.
    pub fn binding(msg: impl Into<String>) -> Self {
        Self::Binding(msg.into())
    }

    /// Build a [`QuadrilleError::Presentation`] value.
    pub fn presentation(msg: impl Into<String>) -> Self {
        Self::Presentation(msg.into())
    }

    /// Build a [`QuadrilleError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
