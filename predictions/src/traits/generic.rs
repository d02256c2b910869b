use common::{Listing, NcResult, Trainable};

/// A **strategy** on how to define how *good* a predictor performs.
pub trait Evaluator {
    /// Describes how *good* should be measured.
    /// If the output should get written to json, it must derive serde::Serialize
    /// This is not enforced here since not all output need to be written to json
    type Output;

    /// This function gets pairs of real listing and predicted listing (in this order) and should
    /// determine how well they match.
    /// If no pairs are provided an Error can be returned.
    /// Implementations may define additional failure conditions.
    fn evaluate<'i>(
        &self,
        pairs: impl IntoIterator<Item = (&'i Listing, &'i Listing)>,
    ) -> NcResult<Self::Output>;
}

/// A **strategy** on how to predict the cleared targets of listings.
pub trait Predictor: Trainable {
    /// This function should set all targets and the provenance on the supplied listings.
    /// It should be ensured that `train` is called at least once before this function is executed.
    /// Failing to do so results in [NcError::NotFittedError](common::NcError::NotFittedError).
    /// Implementations may define additional failure conditions.
    fn predict<'j>(&self, validation_data: impl IntoIterator<Item = &'j mut Listing>) -> NcResult<()>;
}
