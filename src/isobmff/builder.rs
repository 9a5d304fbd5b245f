//! Atom byte builders (§4.3.4). Every size emitted is a plain big-endian
//! `u32` header — this system never emits the extended 64-bit size form.

/// `[u32 size][FourCC type][payload]`.
pub fn atom(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8>
{
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    out.extend_from_slice(box_type);
    out.extend_from_slice(payload);
    out
}

/// A container atom: header + concatenated children.
pub fn container(box_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8>
{
    let payload: Vec<u8> = children.iter().flat_map(|c| c.iter().copied()).collect();
    atom(box_type, &payload)
}

/// An iTunes `data` atom: 4-byte type indicator + 4-byte locale + value.
pub fn data_atom(type_indicator: u32, locale: u32, value: &[u8]) -> Vec<u8>
{
    let mut payload = Vec::with_capacity(8 + value.len());
    payload.extend_from_slice(&type_indicator.to_be_bytes());
    payload.extend_from_slice(&locale.to_be_bytes());
    payload.extend_from_slice(value);
    atom(b"data", &payload)
}

/// A `meta` box: header + 4-byte version+flags + children.
pub fn meta(children: &[Vec<u8>]) -> Vec<u8>
{
    let mut payload = vec![0u8, 0, 0, 0];
    for child in children
    {
        payload.extend_from_slice(child);
    }
    atom(b"meta", &payload)
}

/// An iTunes UTF-8 text metadata item: a container holding one `data`
/// child with type indicator 1 (UTF-8).
pub fn text_item(fourcc: &[u8; 4], text: &str) -> Vec<u8>
{
    container(fourcc, &[data_atom(1, 0, text.as_bytes())])
}

/// `trkn`/`disk`: 8-byte data prefix handled by [`data_atom`], value is
/// 2 bytes pad + 2-byte value + 2-byte total + 2 bytes pad (§4.3.2).
pub fn track_or_disc_item(fourcc: &[u8; 4], number: u16, total: u16) -> Vec<u8>
{
    let mut value = vec![0u8, 0];
    value.extend_from_slice(&number.to_be_bytes());
    value.extend_from_slice(&total.to_be_bytes());
    value.extend_from_slice(&[0u8, 0]);
    container(fourcc, &[data_atom(0, 0, &value)])
}

/// `tmpo` (BPM): 2-byte unsigned integer, type indicator 21 (implicit int).
pub fn tempo_item(bpm: u16) -> Vec<u8>
{
    container(b"tmpo", &[data_atom(21, 0, &bpm.to_be_bytes())])
}

/// `covr`: artwork payload, type indicator from [`crate::model::ArtworkFormat::itunes_type_indicator`].
pub fn cover_item(type_indicator: u32, data: &[u8]) -> Vec<u8>
{
    container(b"covr", &[data_atom(type_indicator, 0, data)])
}

/// A reverse-DNS `----` item: `mean`/`name`/`data` triple (§4.3.2).
pub fn reverse_dns_item(domain: &str, key: &str, value: &str) -> Vec<u8>
{
    let mut mean_payload = vec![0u8, 0, 0, 0];
    mean_payload.extend_from_slice(domain.as_bytes());
    let mean = atom(b"mean", &mean_payload);

    let mut name_payload = vec![0u8, 0, 0, 0];
    name_payload.extend_from_slice(key.as_bytes());
    let name = atom(b"name", &name_payload);

    let data = data_atom(1, 0, value.as_bytes());

    container(b"----", &[mean, name, data])
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn atom_has_correct_size_header()
    {
        let a = atom(b"free", b"hi");
        assert_eq!(u32::from_be_bytes(a[0..4].try_into().unwrap()), 10);
        assert_eq!(&a[4..8], b"free");
        assert_eq!(&a[8..], b"hi");
    }

    #[test]
    fn text_item_wraps_data_atom()
    {
        let item = text_item(b"\xa9nam", "Title");
        // container size = 8 (header) + data atom size
        let data_atom_size = u32::from_be_bytes(item[16..20].try_into().unwrap());
        assert_eq!(&item[20..24], b"data");
        assert_eq!(data_atom_size as usize, item.len() - 8);
    }

    #[test]
    fn track_item_layout()
    {
        let item = track_or_disc_item(b"trkn", 3, 10);
        // value begins after data atom's 16-byte header+prefix
        let value = &item[item.len() - 8..];
        assert_eq!(u16::from_be_bytes([value[2], value[3]]), 3);
        assert_eq!(u16::from_be_bytes([value[4], value[5]]), 10);
    }
}
