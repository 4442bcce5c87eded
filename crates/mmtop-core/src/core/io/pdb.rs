use super::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::residue::Residue;
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::BondOrigin;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

/// Records of a PDB file that are not part of the molecular system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Header records (CRYST1, REMARK, TITLE, ...) preceding the first atom, verbatim.
    pub header_lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: &'static str },
    #[error("Line is too short for ATOM/HETATM record (must reach column 54)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_int<T: std::str::FromStr>(
    value: &str,
    line: usize,
    columns: &'static str,
) -> Result<T, PdbError> {
    value.parse().map_err(|_| PdbError::Parse {
        line,
        kind: PdbParseErrorKind::InvalidInt {
            columns,
            value: value.into(),
        },
    })
}

fn parse_float(value: &str, line: usize, columns: &'static str) -> Result<f64, PdbError> {
    value.parse().map_err(|_| PdbError::Parse {
        line,
        kind: PdbParseErrorKind::InvalidFloat {
            columns,
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    value: &str,
    default: f64,
    line: usize,
    columns: &'static str,
) -> Result<f64, PdbError> {
    if value.is_empty() {
        Ok(default)
    } else {
        parse_float(value, line, columns)
    }
}

type ResidueKey = (char, isize, Option<char>, String);

/// Reader and writer for the PDB snapshots exchanged with GROMACS and tleap.
///
/// Only the first model is read. Bonds come from `CONECT` records and from covalent
/// distance perception, which runs once after all atoms are loaded. The writer emits
/// residues in file order, closes every chain with a `TER` record and renumbers atom
/// serials from 1; only `CONECT` bonds are written back.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let mut system = MolecularSystem::new();
        let mut metadata = PdbMetadata::default();
        let mut serial_map: HashMap<usize, AtomId> = HashMap::new();
        let mut conect: Vec<(usize, usize)> = Vec::new();
        let mut current: Option<(ResidueKey, ResidueId)> = None;
        let mut first_model_done = false;

        for (index, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = index + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    if first_model_done {
                        continue;
                    }
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    if !matches!(line.get(16..17), Some(" ") | Some("A") | None) {
                        continue;
                    }

                    let serial: usize = parse_int(slice_and_trim(&line, 6, 11), line_num, "7-11")?;
                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField { columns: "13-16" },
                        });
                    }
                    // GROMACS and tleap use column 21 for four-letter names (NALA, HISE).
                    let res_name = slice_and_trim(&line, 17, 21);
                    if res_name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField { columns: "18-21" },
                        });
                    }
                    let chain = line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' ');
                    let res_seq: isize = parse_int(slice_and_trim(&line, 22, 26), line_num, "23-26")?;
                    let insertion_code = line
                        .get(26..27)
                        .and_then(|s| s.chars().next())
                        .filter(|c| !c.is_whitespace());
                    let x = parse_float(slice_and_trim(&line, 30, 38), line_num, "31-38")?;
                    let y = parse_float(slice_and_trim(&line, 38, 46), line_num, "39-46")?;
                    let z = parse_float(slice_and_trim(&line, 46, 54), line_num, "47-54")?;
                    let occupancy =
                        parse_optional_float(slice_and_trim(&line, 54, 60), 1.0, line_num, "55-60")?;
                    let temp_factor =
                        parse_optional_float(slice_and_trim(&line, 60, 66), 0.0, line_num, "61-66")?;
                    let element = slice_and_trim(&line, 76, 78);

                    let key: ResidueKey = (chain, res_seq, insertion_code, res_name.to_string());
                    let reuse = current
                        .as_ref()
                        .filter(|(current_key, _)| *current_key == key)
                        .map(|(_, id)| *id);
                    let residue_id = match reuse {
                        Some(id) => id,
                        None => {
                            let chain_id = system.add_chain(chain);
                            let id = system
                                .add_residue_with_insertion(chain_id, res_seq, insertion_code, res_name)
                                .ok_or_else(|| {
                                    PdbError::Inconsistency(format!(
                                        "Failed to create residue {} {} on line {}",
                                        res_name, res_seq, line_num
                                    ))
                                })?;
                            if let Some(residue) = system.residue_mut(id) {
                                residue.hetero = record_type == "HETATM";
                            }
                            current = Some((key, id));
                            id
                        }
                    };

                    let position = Point3::new(x, y, z);
                    let mut atom = if element.is_empty() {
                        Atom::new(name, residue_id, position)
                    } else {
                        Atom::with_element(name, element, residue_id, position)
                    };
                    atom.serial = serial;
                    atom.occupancy = occupancy;
                    atom.temp_factor = temp_factor;

                    let atom_id = system.add_atom_to_residue(residue_id, atom).ok_or_else(|| {
                        PdbError::Inconsistency(format!("Failed to add atom on line {}", line_num))
                    })?;
                    // Serials wrap at 100000 in large GROMACS systems; CONECT refers to the first.
                    serial_map.entry(serial).or_insert(atom_id);
                }
                "CONECT" => parse_conect(&line, line_num, &mut conect)?,
                "ENDMDL" => first_model_done = true,
                "END" => break,
                "TER" | "MODEL" | "" => {}
                _ => {
                    if system.atom_count() == 0 {
                        metadata.header_lines.push(line.clone());
                    }
                }
            }
        }

        if system.atom_count() == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }

        conect.sort_unstable();
        conect.dedup();
        for (source, target) in conect {
            match (serial_map.get(&source), serial_map.get(&target)) {
                (Some(&a1), Some(&a2)) => {
                    system.add_bond(a1, a2, BondOrigin::Conect);
                }
                _ => warn!(
                    source,
                    target, "CONECT record references an unknown atom serial; skipped"
                ),
            }
        }

        let perceived = system.perceive_bonds();
        debug!(
            atoms = system.atom_count(),
            residues = system.residue_count(),
            perceived_bonds = perceived,
            "Read PDB snapshot"
        );

        Ok((system, metadata))
    }

    fn write_to(
        system: &MolecularSystem,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }

        let mut serial = 1usize;
        let mut atom_serials: HashMap<AtomId, usize> = HashMap::new();
        let mut previous: Option<(char, &Residue)> = None;

        for (residue_id, residue) in system.residues_iter() {
            if residue.atoms().is_empty() {
                continue;
            }
            let chain = system
                .chain(residue.chain_id())
                .map(|c| c.id)
                .unwrap_or(' ');

            if let Some((previous_chain, previous_residue)) = previous {
                if previous_chain != chain {
                    write_ter_record(writer, serial, previous_residue, previous_chain)?;
                    serial += 1;
                }
            }

            for (atom_id, atom) in system.residue_atoms(residue_id) {
                write_atom_record(writer, serial, atom, residue, chain)?;
                atom_serials.insert(atom_id, serial);
                serial += 1;
            }
            previous = Some((chain, residue));
        }

        if let Some((chain, residue)) = previous {
            write_ter_record(writer, serial, residue, chain)?;
        }

        let mut conect: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for bond in system
            .bonds()
            .iter()
            .filter(|b| b.origin == BondOrigin::Conect)
        {
            if let (Some(&s1), Some(&s2)) = (
                atom_serials.get(&bond.atom1_id),
                atom_serials.get(&bond.atom2_id),
            ) {
                conect.entry(s1).or_default().push(s2);
                conect.entry(s2).or_default().push(s1);
            }
        }
        for (source, mut targets) in conect {
            targets.sort_unstable();
            targets.dedup();
            for chunk in targets.chunks(4) {
                write!(writer, "CONECT{:5}", source % 100000)?;
                for target in chunk {
                    write!(writer, "{:5}", target % 100000)?;
                }
                writeln!(writer)?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}

fn parse_conect(
    line: &str,
    line_num: usize,
    conect: &mut Vec<(usize, usize)>,
) -> Result<(), PdbError> {
    const FIELDS: [(usize, usize, &str); 5] = [
        (6, 11, "7-11"),
        (11, 16, "12-16"),
        (16, 21, "17-21"),
        (21, 26, "22-26"),
        (26, 31, "27-31"),
    ];

    let (start, end, columns) = FIELDS[0];
    let source_str = slice_and_trim(line, start, end);
    if source_str.is_empty() {
        return Ok(());
    }
    let source: usize = parse_int(source_str, line_num, columns)?;

    for &(start, end, columns) in &FIELDS[1..] {
        let target_str = slice_and_trim(line, start, end);
        if target_str.is_empty() {
            continue;
        }
        let target: usize = parse_int(target_str, line_num, columns)?;
        if target != source {
            conect.push((source.min(target), source.max(target)));
        }
    }
    Ok(())
}

fn format_residue_name(name: &str) -> String {
    if name.len() > 3 {
        name.chars().take(4).collect()
    } else {
        format!("{:>3} ", name)
    }
}

fn write_atom_record(
    writer: &mut impl Write,
    serial: usize,
    atom: &Atom,
    residue: &Residue,
    chain: char,
) -> Result<(), PdbError> {
    let record_type = if residue.hetero { "HETATM" } else { "ATOM  " };
    let atom_name = if atom.name.len() >= 4 {
        atom.name.chars().take(4).collect::<String>()
    } else {
        format!(" {:<3}", atom.name)
    };

    writeln!(
        writer,
        "{:6}{:5} {:4} {:4}{:1}{:4}{:1}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
        record_type,
        serial % 100000,
        atom_name,
        format_residue_name(&residue.name),
        chain,
        residue.number() % 10000,
        residue.insertion_code().unwrap_or(' '),
        atom.position.x,
        atom.position.y,
        atom.position.z,
        atom.occupancy,
        atom.temp_factor,
        atom.element.to_uppercase()
    )?;
    Ok(())
}

fn write_ter_record(
    writer: &mut impl Write,
    serial: usize,
    residue: &Residue,
    chain: char,
) -> Result<(), PdbError> {
    writeln!(
        writer,
        "TER   {:5}      {:4}{:1}{:4}{:1}",
        serial % 100000,
        format_residue_name(&residue.name),
        chain,
        residue.number() % 10000,
        residue.insertion_code().unwrap_or(' ')
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[allow(clippy::too_many_arguments)]
    fn atom_line(
        record: &str,
        serial: usize,
        name: &str,
        res_name: &str,
        chain: char,
        res_seq: isize,
        pos: [f64; 3],
        element: &str,
    ) -> String {
        let atom_name = if name.len() >= 4 {
            name.to_string()
        } else {
            format!(" {:<3}", name)
        };
        format!(
            "{:6}{:5} {:4} {:>3} {:1}{:4}    {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
            record, serial, atom_name, res_name, chain, res_seq, pos[0], pos[1], pos[2], 1.0, 0.0,
            element
        )
    }

    fn read_str(content: &str) -> Result<(MolecularSystem, PdbMetadata), PdbError> {
        PdbFile::read_from(&mut Cursor::new(content.as_bytes()))
    }

    fn two_chain_pdb() -> String {
        [
            "CRYST1   50.000   50.000   50.000  90.00  90.00  90.00 P 1           1".to_string(),
            "REMARK    GENERATED BY TRJCONV".to_string(),
            atom_line("ATOM", 1, "N", "GLY", 'A', 1, [0.0, 0.0, 0.0], "N"),
            atom_line("ATOM", 2, "CA", "GLY", 'A', 1, [1.458, 0.0, 0.0], "C"),
            atom_line("ATOM", 3, "C", "GLY", 'A', 1, [2.009, 1.420, 0.0], "C"),
            atom_line("ATOM", 4, "OC1", "GLY", 'A', 1, [1.251, 2.390, 0.0], "O"),
            "TER".to_string(),
            atom_line("HETATM", 5, "C1", "MOL", 'B', 1, [10.0, 10.0, 10.0], "C"),
            atom_line("HETATM", 6, "CL1", "MOL", 'B', 1, [11.76, 10.0, 10.0], "CL"),
            "CONECT    5    6".to_string(),
            "END".to_string(),
        ]
        .join("\n")
    }

    #[test]
    fn reads_atoms_residues_and_header() {
        let (system, metadata) = read_str(&two_chain_pdb()).unwrap();

        assert_eq!(system.atom_count(), 6);
        assert_eq!(system.residue_count(), 2);
        assert_eq!(metadata.header_lines.len(), 2);
        assert!(metadata.header_lines[0].starts_with("CRYST1"));

        let names: Vec<&str> = system
            .residues_iter()
            .map(|(_, r)| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["GLY", "MOL"]);

        let (mol_id, mol) = system.residues_iter().nth(1).unwrap();
        assert!(mol.hetero);
        assert_eq!(system.chain(mol.chain_id()).unwrap().id, 'B');
        let chlorine = system.residue_atoms(mol_id).nth(1).unwrap().1;
        assert_eq!(chlorine.element, "Cl");
        assert_eq!(chlorine.serial, 6);
        assert!((chlorine.position.x - 11.76).abs() < 1e-9);
    }

    #[test]
    fn conect_and_perceived_bonds_are_both_loaded() {
        let (system, _) = read_str(&two_chain_pdb()).unwrap();

        let conect_bonds = system
            .bonds()
            .iter()
            .filter(|b| b.origin == BondOrigin::Conect)
            .count();
        assert_eq!(conect_bonds, 1);
        // N-CA, CA-C, C-OC1 in the glycine.
        let perceived = system
            .bonds()
            .iter()
            .filter(|b| b.origin == BondOrigin::Perceived)
            .count();
        assert_eq!(perceived, 3);
    }

    #[test]
    fn residue_boundary_follows_number_and_name_changes() {
        let content = [
            atom_line("ATOM", 1, "CA", "ALA", 'A', 1, [0.0, 0.0, 0.0], "C"),
            atom_line("ATOM", 2, "CA", "GLY", 'A', 2, [3.8, 0.0, 0.0], "C"),
            atom_line("HETATM", 3, "C1", "LIG", 'A', 2, [7.6, 0.0, 0.0], "C"),
        ]
        .join("\n");
        let (system, _) = read_str(&content).unwrap();
        assert_eq!(system.residue_count(), 3);
    }

    #[test]
    fn reads_only_the_first_model() {
        let content = [
            "MODEL        1".to_string(),
            atom_line("ATOM", 1, "CA", "ALA", 'A', 1, [0.0, 0.0, 0.0], "C"),
            "ENDMDL".to_string(),
            "MODEL        2".to_string(),
            atom_line("ATOM", 1, "CA", "ALA", 'A', 1, [1.0, 0.0, 0.0], "C"),
            "ENDMDL".to_string(),
        ]
        .join("\n");
        let (system, _) = read_str(&content).unwrap();
        assert_eq!(system.atom_count(), 1);
    }

    #[test]
    fn element_is_inferred_when_column_is_missing() {
        let mut line = atom_line("ATOM", 1, "HD1", "HIS", 'A', 1, [0.0, 0.0, 0.0], "");
        line.truncate(66);
        let (system, _) = read_str(&line).unwrap();
        let (_, atom) = system.atoms_iter().next().unwrap();
        assert!(atom.is_hydrogen());
    }

    #[test]
    fn invalid_coordinate_reports_line_number() {
        let content = [
            atom_line("ATOM", 1, "CA", "ALA", 'A', 1, [0.0, 0.0, 0.0], "C"),
            atom_line("ATOM", 2, "CB", "ALA", 'A', 1, [0.0, 0.0, 0.0], "C").replace("   0.000   0.000   0.000", "   abcde   0.000   0.000"),
        ]
        .join("\n");
        match read_str(&content) {
            Err(PdbError::Parse { line, kind }) => {
                assert_eq!(line, 2);
                assert!(matches!(kind, PdbParseErrorKind::InvalidFloat { .. }));
            }
            other => panic!("Expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn short_atom_line_is_rejected() {
        let result = read_str("ATOM      1  CA  ALA A   1       0.000");
        assert!(matches!(
            result,
            Err(PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort
            })
        ));
    }

    #[test]
    fn file_without_atoms_is_rejected() {
        let result = read_str("REMARK nothing here\nEND\n");
        assert!(matches!(result, Err(PdbError::MissingRecord(_))));
    }

    #[test]
    fn unknown_conect_serial_is_skipped() {
        let content = [
            atom_line("ATOM", 1, "CA", "ALA", 'A', 1, [0.0, 0.0, 0.0], "C"),
            "CONECT    1   99".to_string(),
        ]
        .join("\n");
        let (system, _) = read_str(&content).unwrap();
        assert!(system.bonds().is_empty());
    }

    #[test]
    fn written_snapshot_reads_back_with_same_names_and_order() {
        let (system, metadata) = read_str(&two_chain_pdb()).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_to(&system, &metadata, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();

        assert!(text.starts_with("CRYST1"));
        assert_eq!(text.lines().filter(|l| l.starts_with("TER")).count(), 2);
        // The TER record closing chain A takes serial 5.
        assert!(text.lines().any(|l| l.starts_with("CONECT    6    7")));
        assert!(text.trim_end().ends_with("END"));

        let (reread, _) = PdbFile::read_from(&mut Cursor::new(buffer)).unwrap();
        let atoms: Vec<(String, String)> = reread
            .residues_iter()
            .flat_map(|(id, r)| {
                reread
                    .residue_atoms(id)
                    .map(move |(_, a)| (r.name.clone(), a.name.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(
            atoms,
            vec![
                ("GLY".to_string(), "N".to_string()),
                ("GLY".to_string(), "CA".to_string()),
                ("GLY".to_string(), "C".to_string()),
                ("GLY".to_string(), "OC1".to_string()),
                ("MOL".to_string(), "C1".to_string()),
                ("MOL".to_string(), "CL1".to_string()),
            ]
        );
        assert_eq!(reread.bonds().len(), system.bonds().len());
    }

    #[test]
    fn four_letter_residue_names_survive_read_and_write() {
        let line = |serial: usize, res_name: &str, res_seq: isize| {
            format!(
                "{:6}{:5}  CA  {:4}{:1}{:4}    {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}           C",
                "ATOM", serial, res_name, 'A', res_seq, res_seq as f64 * 3.8, 0.0, 0.0, 1.0, 0.0
            )
        };
        let content = [line(1, "NALA", 1), line(2, "GLY", 2), line(3, "HISE", 3)].join("\n");

        let (system, _) = read_str(&content).unwrap();
        let names: Vec<&str> = system.residues_iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["NALA", "GLY", "HISE"]);

        let mut buffer = Vec::new();
        PdbFile::write_system_to(&system, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let atom_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("ATOM")).collect();
        assert_eq!(&atom_lines[0][17..22], "NALAA");
        assert_eq!(&atom_lines[1][17..22], "GLY A");

        let (reread, _) = read_str(&text).unwrap();
        let reread_names: Vec<String> = reread.residues_iter().map(|(_, r)| r.name.clone()).collect();
        assert_eq!(reread_names, vec!["NALA", "GLY", "HISE"]);
    }

    #[test]
    fn writer_uses_fixed_pdb_columns() {
        let (system, _) = read_str(&atom_line(
            "ATOM",
            7,
            "CA",
            "ALA",
            'A',
            25,
            [1.5, -2.25, 3.0],
            "C",
        ))
        .unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_system_to(&system, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let line = text.lines().next().unwrap();

        assert_eq!(&line[0..6], "ATOM  ");
        assert_eq!(&line[6..11], "    1");
        assert_eq!(&line[12..16], " CA ");
        assert_eq!(&line[17..20], "ALA");
        assert_eq!(&line[21..22], "A");
        assert_eq!(&line[22..26], "  25");
        assert_eq!(&line[30..38], "   1.500");
        assert_eq!(&line[38..46], "  -2.250");
        assert_eq!(&line[76..78], " C");
    }

    #[test]
    fn path_helpers_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.pdb");
        let (system, metadata) = read_str(&two_chain_pdb()).unwrap();

        PdbFile::write_to_path(&system, &metadata, &path).unwrap();
        let (reread, reread_metadata) = PdbFile::read_from_path(&path).unwrap();

        assert_eq!(reread.atom_count(), 6);
        assert_eq!(reread_metadata, metadata);
    }
}
