pub type ListResult<T> = Result<T, ListError>;

/// failures a list operation can report without having changed the list
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    /// the operation would grow the list past the number of nodes the
    /// allocator can describe. raised before any node is built or linked
    #[error("list would hold {requested} elements, the maximum is {max}")]
    CapacityExceeded { requested: usize, max: usize },
    /// the allocator could not provide storage for a node
    #[error("allocator failed to provide storage for a list node")]
    AllocFailed,
}

/// failure of an operation that builds values through a caller-supplied,
/// fallible constructor. the caller's error is handed back untouched
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError<E> {
    #[error(transparent)]
    List(#[from] ListError),
    #[error("value construction failed")]
    Value(E),
}

impl<E> BuildError<E> {
    /// returns the constructor's error, if that is what failed
    pub fn into_value(self) -> Option<E> {
        match self {
            Self::Value(e) => Some(e),
            Self::List(_) => None,
        }
    }
}

/// raise a precondition violation. these mark caller misuse rather than a
/// recoverable condition, so they panic
macro_rules! precondition {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            panic!("precondition violated: {}", format_args!($($arg)+));
        }
    };
}

pub(crate) use precondition;
