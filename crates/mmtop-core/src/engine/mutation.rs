use super::config::ResidueSpecifier;
use super::error::EngineError;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::system::MolecularSystem;
use crate::core::utils::identifiers::is_alanine_retained_atom;
use tracing::info;

/// What [`mutate_to_alanine`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub residue_id: ResidueId,
    pub original_name: String,
    pub atoms_removed: usize,
}

/// Truncates the side chain of one residue to alanine.
///
/// The first residue in file order matching the chain and number of `target` is renamed
/// to `ALA` and keeps only its `N`, `CA`, `C`, `O` and `CB` atoms. Tleap rebuilds the
/// missing alanine hydrogens when the topology is generated.
///
/// # Errors
///
/// Returns [`EngineError::MissingMutationSpec`] when no target is given and
/// [`EngineError::ResidueNotFound`] when no residue matches it; the system is left
/// untouched in both cases.
pub fn mutate_to_alanine(
    system: &mut MolecularSystem,
    target: Option<&ResidueSpecifier>,
) -> Result<MutationOutcome, EngineError> {
    let target = target.ok_or(EngineError::MissingMutationSpec)?;
    let residue_id = system
        .find_residue(target.chain_id, target.residue_number)
        .ok_or_else(|| EngineError::ResidueNotFound {
            spec: target.clone(),
        })?;

    let side_chain: Vec<AtomId> = system
        .residue_atoms(residue_id)
        .filter(|(_, atom)| !is_alanine_retained_atom(&atom.name))
        .map(|(id, _)| id)
        .collect();
    let atoms_removed = system.remove_atoms(side_chain);

    let residue = system
        .residue_mut(residue_id)
        .ok_or_else(|| EngineError::ResidueNotFound {
            spec: target.clone(),
        })?;
    let original_name = std::mem::replace(&mut residue.name, "ALA".to_string());
    residue.hetero = false;

    info!(
        residue = %target,
        from = %original_name,
        atoms_removed,
        "Mutated residue to alanine"
    );

    Ok(MutationOutcome {
        residue_id,
        original_name,
        atoms_removed,
    })
}
