pub type OvercutResult<T> = Result<T, OvercutError>;

#[derive(thiserror::Error, Debug)]
pub enum OvercutError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("job error: {0}")]
    Job(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OvercutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn job(msg: impl Into<String>) -> Self {
        Self::Job(msg.into())
    }
}

/// Expected rejection of an interactive edit.
///
/// Unlike [`OvercutError`], a rejection is part of normal operation: the
/// model is left untouched and the caller surfaces the reason to the user.
pub type EditResult<T> = Result<T, EditRejection>;

#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditRejection {
    #[error("clip would be shorter than the 0.1s minimum")]
    ClipTooShort,

    #[error("trim point is outside the source media")]
    TrimOutOfBounds,

    #[error("transition duration must be between 0.1s and 3s")]
    TransitionDurationOutOfRange,

    #[error("index is out of bounds")]
    IndexOutOfBounds,

    #[error("no layer with that id")]
    UnknownLayer,

    #[error("timeline has no clips")]
    EmptyTimeline,

    #[error("a backend request is already in flight")]
    Busy,

    #[error("project has not been saved yet")]
    NotSaved,

    #[error("destructive action requires confirmation")]
    ConfirmationRequired,
}
