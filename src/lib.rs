pub mod entity;
pub mod model;
pub mod render;
pub mod resolve;
pub mod types;
pub mod xml;

use thiserror::Error;

use entity::parse_descriptor;
use model::{Diagnostic, Schema};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("No descriptor parsed successfully")]
    NoEntities,
}

/// Build a resolved schema from `(file name, descriptor source)` pairs.
///
/// A descriptor with a structural failure is dropped from the run and
/// reported as a diagnostic; the rest of the set still parses and resolves.
/// Fails only when nothing parses at all.
pub fn build_schema(
    descriptors: &[(String, String)],
) -> Result<(Schema, Vec<Diagnostic>), ModelError> {
    let mut schema = Schema::default();
    let mut diags = Vec::new();

    for (origin, source) in descriptors {
        match parse_descriptor(source, origin) {
            Ok((entity, mut file_diags)) => {
                diags.append(&mut file_diags);
                schema.insert(entity);
            }
            Err(e) => {
                tracing::error!("{origin}: {e}");
                diags.push(Diagnostic::new(origin, format!("descriptor dropped: {e}")));
            }
        }
    }

    if schema.entities.is_empty() {
        return Err(ModelError::NoEntities);
    }

    diags.extend(resolve::resolve(&mut schema));
    Ok((schema, diags))
}
