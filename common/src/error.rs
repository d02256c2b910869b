use std::{error::Error, fmt::Display};

/// This type gets used to be our catch all error.
/// We implement conversions for all Library errors to ease error management.
#[derive(Debug)]
pub enum NcError {
    /// Allows a generic Error message.
    StringNcError(String),
    /// Anticipated errors, may be rethrown with an additional error message
    RethrowNcError(String, Box<dyn Error>),
    /// All other library Errors get converted to this error.
    OtherNcError(Box<dyn Error>),
    /// A model was asked for a prediction (or to be saved) before `train` or `load` completed.
    NotFittedError,
    /// A model snapshot could not be decoded or does not match the current schema.
    CorruptModelError(String),
}

/// This type is our goto Result, as it allows us to convert between many different errors.
pub type NcResult<O> = Result<O, NcError>;

impl Display for NcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NcError::StringNcError(str) => str.fmt(f),
            NcError::RethrowNcError(str, err) => {
                str.fmt(f)?;
                " with: ".fmt(f)?;
                err.fmt(f)?;
                Ok(())
            }
            NcError::OtherNcError(err) => err.fmt(f),
            NcError::NotFittedError => {
                "Model has not been trained. Call train or load first.".fmt(f)
            }
            NcError::CorruptModelError(reason) => {
                "Model snapshot is corrupt: ".fmt(f)?;
                reason.fmt(f)
            }
        }
    }
}
impl Error for NcError {}

impl NcError {
    /// Allows to annotate a NcError with a to better detect the origin of errors.
    /// # Usage
    /// ```
    /// # use common::{NcError, NcResult};
    /// # fn fallible_function() -> NcResult<()> {
    /// # Err(NcError::StringNcError("".into()))
    /// # }
    /// # fn container_function() -> NcResult<()> {
    /// fallible_function().map_err(NcError::rethrow_with("function failed"))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn rethrow_with(str: &'static str) -> impl Fn(NcError) -> NcError {
        move |err| NcError::RethrowNcError(str.to_string(), Box::new(err))
    }

    /// Is this a [NcError::NotFittedError], possibly wrapped in rethrows?
    pub fn is_not_fitted(&self) -> bool {
        match self {
            NcError::NotFittedError => true,
            NcError::RethrowNcError(_, inner) => inner
                .downcast_ref::<NcError>()
                .map_or(false, NcError::is_not_fitted),
            _ => false,
        }
    }

    /// Is this a [NcError::CorruptModelError], possibly wrapped in rethrows?
    pub fn is_corrupt_model(&self) -> bool {
        match self {
            NcError::CorruptModelError(_) => true,
            NcError::RethrowNcError(_, inner) => inner
                .downcast_ref::<NcError>()
                .map_or(false, NcError::is_corrupt_model),
            _ => false,
        }
    }
}

macro_rules! implement_from {
    ($type:ty) => {
        impl From<$type> for NcError {
            fn from(other: $type) -> Self {
                NcError::OtherNcError(Box::from(other))
            }
        }
    };
}
implement_from!(std::io::Error);
implement_from!(serde_json::Error);
implement_from!(csv::Error);
implement_from!(std::num::ParseFloatError);
implement_from!(std::num::ParseIntError);
implement_from!(serde_dhall::Error);
implement_from!(rmp_serde::encode::Error);

impl From<rmp_serde::decode::Error> for NcError {
    fn from(other: rmp_serde::decode::Error) -> Self {
        NcError::CorruptModelError(other.to_string())
    }
}

impl<'a> From<&'a str> for NcError {
    fn from(other: &'a str) -> Self {
        NcError::StringNcError(other.to_string())
    }
}
impl From<String> for NcError {
    fn from(other: String) -> Self {
        NcError::StringNcError(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rethrown_not_fitted_is_still_detected() {
        let err = Err::<(), _>(NcError::NotFittedError)
            .map_err(NcError::rethrow_with("Prediction failed"))
            .unwrap_err();
        assert!(err.is_not_fitted());
        assert!(!err.is_corrupt_model());
        assert_eq!(
            err.to_string(),
            "Prediction failed with: Model has not been trained. Call train or load first."
        );
    }

    #[test]
    fn string_errors_are_neither() {
        let err = NcError::from("something else");
        assert!(!err.is_not_fitted());
        assert!(!err.is_corrupt_model());
    }
}
