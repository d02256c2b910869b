//! Versioned MessagePack snapshots of trained models.
use common::{CategoricalTarget, NcError, NcResult, NumericTarget};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Bump whenever the layout of a stored model state changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<S> {
    format_version: u32,
    model_kind: String,
    numeric_targets: Vec<String>,
    categorical_targets: Vec<String>,
    state: Option<S>,
}

fn numeric_target_names() -> Vec<String> {
    NumericTarget::ALL.iter().map(|t| t.name().to_string()).collect()
}

fn categorical_target_names() -> Vec<String> {
    CategoricalTarget::ALL
        .iter()
        .map(|t| t.name().to_string())
        .collect()
}

/// Encodes the state of a model of kind `model_kind`. `None` stands for an untrained model.
pub(crate) fn encode<S: Serialize>(model_kind: &str, state: Option<&S>) -> NcResult<Vec<u8>> {
    let snapshot = Snapshot {
        format_version: FORMAT_VERSION,
        model_kind: model_kind.to_string(),
        numeric_targets: numeric_target_names(),
        categorical_targets: categorical_target_names(),
        state,
    };

    let mut bytes = Vec::new();
    rmp_serde::encode::write_named(&mut bytes, &snapshot)?;
    Ok(bytes)
}

/// Decodes a snapshot written by [encode] for a model of kind `model_kind`.
/// Fails with [NcError::CorruptModelError] if the bytes can't be decoded or the snapshot was
/// written by a different format version, for a different model kind or for other targets.
pub(crate) fn decode<S: DeserializeOwned>(model_kind: &str, bytes: &[u8]) -> NcResult<Option<S>> {
    let snapshot: Snapshot<S> = rmp_serde::from_slice(bytes)?;

    if snapshot.format_version != FORMAT_VERSION {
        return Err(NcError::CorruptModelError(format!(
            "format version {} is not supported, expected {}",
            snapshot.format_version, FORMAT_VERSION
        )));
    }
    if snapshot.model_kind != model_kind {
        return Err(NcError::CorruptModelError(format!(
            "snapshot holds a {} model, expected a {} model",
            snapshot.model_kind, model_kind
        )));
    }
    if snapshot.numeric_targets != numeric_target_names()
        || snapshot.categorical_targets != categorical_target_names()
    {
        return Err(NcError::CorruptModelError(
            "snapshot was written for different target columns".to_string(),
        ));
    }

    Ok(snapshot.state)
}
