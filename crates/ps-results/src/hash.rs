//! Content-based hashing for run IDs.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 over the run documents, the parameter tables in use and the
/// solver version.
///
/// Documents are hashed through their JSON form, so the id is stable across
/// YAML/JSON sources and key ordering of the input files. `tables` is
/// whatever the run reads its ECM parameters from (`None` for the built-in
/// reference set).
pub fn compute_run_id<P, D, S, T>(
    pack: &P,
    drive: &D,
    sim: &S,
    tables: &T,
    solver_version: &str,
) -> String
where
    P: Serialize,
    D: Serialize,
    S: Serialize,
    T: Serialize,
{
    let mut hasher = Sha256::new();

    for doc in [
        serde_json::to_string(pack),
        serde_json::to_string(drive),
        serde_json::to_string(sim),
        serde_json::to_string(tables),
    ] {
        hasher.update(doc.unwrap_or_default().as_bytes());
        hasher.update([0u8]);
    }

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
