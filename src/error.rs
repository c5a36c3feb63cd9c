use thiserror::Error;

/// Failures loading or reading the college catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Catalog seed is malformed: {0}")]
    MalformedSeed(#[from] serde_json::Error),

    #[error("Duplicate college ids in catalog: {}", .0.join(", "))]
    DuplicateIds(Vec<String>),

    #[error("College {id} breaks a catalog invariant: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("College not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompareError {
    #[error("At most {0} colleges can be compared")]
    SelectionFull(usize),

    #[error("College {0} is already selected")]
    AlreadySelected(String),

    #[error("College {0} is not selected")]
    NotSelected(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Unknown quiz step: {0}")]
    UnknownStep(String),

    #[error("Answer does not fit step {step}: {reason}")]
    InvalidAnswer { step: String, reason: String },

    #[error("Step {0} needs an answer before moving on")]
    Unanswered(String),

    #[error("Quiz is not accepting answers in its current phase")]
    NotInProgress,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ViewError {
    #[error("Sign in to open {0}")]
    SignInRequired(&'static str),

    #[error("Select a college before writing a review")]
    NoCollegeSelected,

    #[error("Unknown college: {0}")]
    UnknownCollege(String),

    #[error("Close {0} before opening another panel")]
    OverlayOpen(&'static str),

    #[error("College {0} must be opened from the catalog")]
    DetailNeedsCatalog(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
