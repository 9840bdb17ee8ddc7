//! Writer for the tab-separated pedigree (PED) format.
//!
//! One line per donor: family, individual, father, mother, sex, affection.
//! Individuals are named by their DNA library when they have one, otherwise
//! by their own display name; `0` stands for an unknown parent.

use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;
use tracing::debug;

use crate::error::SheetError;
use crate::pedigree::Pedigree;
use crate::shortcuts::Shortcut;
use crate::shortcuts::germline::GermlineDonor;

const FAMILY_PREFIX: &str = "FAM_";
const UNKNOWN_PARENT: &str = "0";

/// Name of a donor in the individual and parent columns.
pub fn ped_name(donor: &GermlineDonor<'_>) -> String {
    match donor.dna_ngs_library {
        Some(library) => library.name(),
        None => donor.name(),
    }
}

/// Family id of a pedigree, `None` for a pedigree without members.
pub fn family_id(pedigree: &Pedigree<'_>) -> Option<String> {
    pedigree
        .index()
        .map(|index| format!("{FAMILY_PREFIX}{}", index.name()))
}

pub fn write_pedigree<W: Write + ?Sized>(writer: &mut W, pedigree: &Pedigree<'_>) -> Result<(), SheetError> {
    let Some(family) = family_id(pedigree) else {
        return Ok(());
    };
    for donor in &pedigree.donors {
        let father = pedigree
            .father(donor)?
            .map_or_else(|| UNKNOWN_PARENT.to_string(), ped_name);
        let mother = pedigree
            .mother(donor)?
            .map_or_else(|| UNKNOWN_PARENT.to_string(), ped_name);
        writeln!(
            writer,
            "{family}\t{}\t{father}\t{mother}\t{}\t{}",
            ped_name(donor),
            donor.sex().ped_code(),
            donor.affection().ped_code(),
        )
        .map_err(io_error)?;
    }
    debug!(family = %family, donors = pedigree.member_count(), "wrote pedigree");
    Ok(())
}

pub fn write_pedigrees<'p, 'a: 'p, W, I>(writer: &mut W, pedigrees: I) -> Result<(), SheetError>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'p Pedigree<'a>>,
{
    for pedigree in pedigrees {
        write_pedigree(&mut *writer, pedigree)?;
    }
    Ok(())
}

/// Write all pedigrees to `path`, replacing it only once the content is
/// complete.
pub fn write_pedigrees_to_path<'p, 'a: 'p, I>(path: &Utf8Path, pedigrees: I) -> Result<(), SheetError>
where
    I: IntoIterator<Item = &'p Pedigree<'a>>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path()).map_err(io_error)?;
    let mut temp = tempfile::Builder::new()
        .prefix(".biomedsheets-ped")
        .tempfile_in(parent.as_std_path())
        .map_err(io_error)?;
    {
        let mut writer = io::BufWriter::new(temp.as_file_mut());
        write_pedigrees(&mut writer, pedigrees)?;
        writer.flush().map_err(io_error)?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| SheetError::Filesystem(err.to_string()))?;
    debug!(path = %path, "wrote PED file");
    Ok(())
}

fn io_error(err: io::Error) -> SheetError {
    SheetError::Filesystem(err.to_string())
}
