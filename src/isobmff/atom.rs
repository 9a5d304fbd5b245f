//! The recursive atom (box) tree parser (§4.3.1).
//!
//! `mdat` is never read into memory here — only its offset and size are
//! retained, so the streaming invariant (§9 "the `mdat` payload must never
//! be materialized in memory") holds from the moment a file is parsed.

use crate::error::Mp4Error;
use crate::io::ByteReader;

/// Containers whose payload is itself a sequence of child atoms.
const CONTAINER_TYPES: &[&str] = &["moov", "trak", "tref", "mdia", "minf", "stbl", "udta", "ilst"];

#[derive(Debug, Clone)]
pub struct Atom
{
    pub box_type:    String,
    /// Absolute file offset of the atom's header start.
    pub offset:      u64,
    /// Total atom size (header + payload), resolved for size-0 ("to end")
    /// atoms.
    pub size:        u64,
    /// Absolute file offset of the first payload byte (after the header,
    /// and after `meta`'s extra 4-byte version+flags prefix).
    pub data_offset: u64,
    pub children:    Vec<Atom>
}

impl Atom
{
    /// The payload length from `data_offset` to the end of this atom.
    pub fn payload_len(&self) -> u64
    {
        (self.offset + self.size).saturating_sub(self.data_offset)
    }

    /// Read this atom's full payload (from `data_offset` onward). Not used
    /// for `mdat`, whose payload may be arbitrarily large.
    pub fn read_payload(&self, reader: &mut ByteReader) -> Result<Vec<u8>, Mp4Error>
    {
        Ok(reader.read(self.data_offset, self.payload_len())?)
    }

    /// Walk a dot-separated path (e.g. `"moov.udta.meta.ilst"`) to the
    /// first matching descendant.
    pub fn find(&self, path: &str) -> Option<&Atom>
    {
        let mut segments = path.split('.');
        let first = segments.next()?;
        if first != self.box_type
        {
            return None;
        }
        let mut current = self;
        for segment in segments
        {
            current = current.children.iter().find(|c| c.box_type == segment)?;
        }
        Some(current)
    }

    /// Find the first direct child with the given type.
    pub fn child(&self, box_type: &str) -> Option<&Atom>
    {
        self.children.iter().find(|c| c.box_type == box_type)
    }

    /// All direct children with the given type.
    pub fn children_of(&self, box_type: &str) -> impl Iterator<Item = &Atom>
    {
        self.children.iter().filter(move |c| c.box_type == box_type)
    }
}

/// Parse every top-level atom in the file.
pub fn parse_file(reader: &mut ByteReader) -> Result<Vec<Atom>, Mp4Error>
{
    parse_atoms(reader, 0, reader.file_size())
}

/// Parse the sequence of atoms occupying `[start, end)`.
fn parse_atoms(reader: &mut ByteReader, start: u64, end: u64) -> Result<Vec<Atom>, Mp4Error>
{
    let mut atoms = Vec::new();
    let mut offset = start;

    while offset + 8 <= end
    {
        let header = reader.read(offset, 8)?;
        let declared_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let box_type = String::from_utf8_lossy(&header[4..8]).to_string();

        let (header_len, size) = if declared_size == 1
        {
            let ext = reader.read(offset + 8, 8)?;
            let extended = u64::from_be_bytes(ext.try_into().unwrap());
            (16u64, extended)
        }
        else if declared_size == 0
        {
            (8u64, end - offset)
        }
        else
        {
            (8u64, declared_size)
        };

        if size < header_len || offset + size > end
        {
            return Err(Mp4Error::InvalidAtom { atom_type: box_type, reason: format!("declared size {size} exceeds remaining {} bytes", end - offset) });
        }

        let mut data_offset = offset + header_len;
        let mut children = Vec::new();

        if box_type == "meta"
        {
            // meta carries a 4-byte version+flags prefix before its children.
            data_offset += 4;
            children = parse_atoms(reader, data_offset, offset + size)?;
        }
        else if box_type == "mdat"
        {
            // Never descended into; offset/size retained only.
        }
        else if CONTAINER_TYPES.contains(&box_type.as_str())
        {
            children = parse_atoms(reader, data_offset, offset + size)?;
        }
        else if offset + size > data_offset
        {
            // §4.3.1: every child of `ilst` recurses, even unenumerated ones.
            // We can't know here whether our parent is `ilst`; the caller
            // re-parses `ilst` children explicitly (see `parse_ilst_items`)
            // so leaf atoms elsewhere are left unexpanded.
        }

        atoms.push(Atom { box_type, offset, size, data_offset, children });
        offset += size;
    }

    Ok(atoms)
}

/// `ilst` item atoms (`©nam`, `covr`, `trkn`, `----`, ...) always recurse
/// into their own children (one or more `data`/`mean`/`name` atoms), even
/// though their fourcc isn't in [`CONTAINER_TYPES`]. Call this on an atom
/// already identified as `moov.udta.meta.ilst` to get fully-parsed items.
pub fn parse_ilst_items(reader: &mut ByteReader, ilst: &Atom) -> Result<Vec<Atom>, Mp4Error>
{
    let mut items = Vec::new();
    let mut offset = ilst.data_offset;
    let end = ilst.offset + ilst.size;

    while offset + 8 <= end
    {
        let header = reader.read(offset, 8)?;
        let declared_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let box_type = String::from_utf8_lossy(&header[4..8]).to_string();
        let (header_len, size) = if declared_size == 1
        {
            let ext = reader.read(offset + 8, 8)?;
            (16u64, u64::from_be_bytes(ext.try_into().unwrap()))
        }
        else if declared_size == 0
        {
            (8u64, end - offset)
        }
        else
        {
            (8u64, declared_size)
        };

        if size < header_len || offset + size > end
        {
            return Err(Mp4Error::InvalidAtom { atom_type: box_type, reason: "ilst item size out of range".into() });
        }

        let data_offset = offset + header_len;
        let children = parse_atoms(reader, data_offset, offset + size)?;
        items.push(Atom { box_type, offset, size, data_offset, children });
        offset += size;
    }

    Ok(items)
}

#[cfg(test)]
mod tests
{
    use std::io::Write as _;

    use tempfile::NamedTempFile;

    use super::*;

    fn atom_bytes(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8>
    {
        let mut out = ((8 + payload.len()) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(box_type);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn parses_flat_atoms()
    {
        let mut data = atom_bytes(b"ftyp", b"M4A isom");
        data.extend(atom_bytes(b"free", b""));

        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&data).unwrap();
        let mut reader = ByteReader::open(f.path()).unwrap();
        let atoms = parse_file(&mut reader).unwrap();

        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[0].box_type, "ftyp");
        assert_eq!(atoms[1].box_type, "free");
    }

    #[test]
    fn size_zero_extends_to_container_end()
    {
        let data = atom_bytes(b"mdat", b"0123456789");
        // Rewrite the size field as 0.
        let mut data = data;
        data[0..4].copy_from_slice(&0u32.to_be_bytes());

        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&data).unwrap();
        let mut reader = ByteReader::open(f.path()).unwrap();
        let atoms = parse_file(&mut reader).unwrap();

        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].size, data.len() as u64);
    }

    #[test]
    fn extended_size_reads_eight_byte_size()
    {
        let mut data = vec![0, 0, 0, 1];
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&24u64.to_be_bytes());
        data.extend_from_slice(&[0u8; 8]);

        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&data).unwrap();
        let mut reader = ByteReader::open(f.path()).unwrap();
        let atoms = parse_file(&mut reader).unwrap();

        assert_eq!(atoms[0].size, 24);
        assert_eq!(atoms[0].data_offset, 16);
    }

    #[test]
    fn finds_nested_path()
    {
        let stco = atom_bytes(b"stco", &[0, 0, 0, 0, 0, 0, 0, 0]);
        let stbl = atom_bytes(b"stbl", &stco);
        let minf = atom_bytes(b"minf", &stbl);
        let mdia = atom_bytes(b"mdia", &minf);
        let trak = atom_bytes(b"trak", &mdia);
        let moov = atom_bytes(b"moov", &trak);

        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&moov).unwrap();
        let mut reader = ByteReader::open(f.path()).unwrap();
        let atoms = parse_file(&mut reader).unwrap();
        let root = &atoms[0];

        assert!(root.find("moov.trak.mdia.minf.stbl.stco").is_some());
        assert!(root.find("moov.trak.mdia.minf.stbl.co64").is_none());
    }
}
