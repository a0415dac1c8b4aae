use std::{backtrace::Backtrace, error::Error, fmt, rc::Rc};
use thiserror::Error;

/// Boxed error returned by a fallible converter or selector.
pub type BoxError = Box<dyn Error + 'static>;

/// Raised when a lookup asks for a store that no enclosing
/// [StoreProvider](crate::provider::StoreProvider) has bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "no StoreProvider<{type_name}> found above this node.\n\
     To fix, please try:\n  \
     * wrapping your root node in a StoreProvider<{type_name}>\n  \
     * making sure the State and Action type parameters of the provider, \
     the connector and the hooks all agree\n  \
     * checking that the state type is not pulled in twice, from two \
     different versions of the same crate"
)]
pub struct ProviderNotFoundError {
    /// Name of the `(State, Action)` pair that was requested.
    pub type_name: &'static str,
}

/// A converter or selector failed while deriving a view model.
///
/// Keeps the original error along with the backtrace captured at
/// the point the failure was observed.
pub struct DerivationError {
    source: BoxError,
    trace: Backtrace,
}

impl DerivationError {
    pub(crate) fn new(source: BoxError) -> Self {
        Self {
            source,
            trace: Backtrace::capture(),
        }
    }

    /// The error returned by the converter.
    pub fn inner(&self) -> &(dyn Error + 'static) {
        &*self.source
    }

    /// Backtrace captured when the failure was trapped. Only
    /// populated when `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` is set.
    pub fn backtrace(&self) -> &Backtrace {
        &self.trace
    }
}

impl fmt::Display for DerivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converter failed: {}", self.source)
    }
}

impl Error for DerivationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

impl fmt::Debug for DerivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivationError")
            .field("source", &self.source)
            .field("trace", &self.trace)
            .finish()
    }
}

/// Everything that can stop a connector, selector hook or store
/// accessor from producing output.
///
/// These are never handled internally: they are returned from the
/// render so the application decides what to show instead.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    #[error(transparent)]
    ProviderNotFound(#[from] ProviderNotFoundError),
    #[error("{0}")]
    Derivation(Rc<DerivationError>),
}

impl ConnectorError {
    /// The derivation failure behind this error, if that is what it is.
    pub fn as_derivation(&self) -> Option<&DerivationError> {
        match self {
            ConnectorError::Derivation(error) => Some(error),
            ConnectorError::ProviderNotFound(_) => None,
        }
    }
}

impl From<Rc<DerivationError>> for ConnectorError {
    fn from(error: Rc<DerivationError>) -> Self {
        ConnectorError::Derivation(error)
    }
}
