//! Embedded artwork: format detection and best-effort dimension probing.

/// Image formats this crate recognizes for embedded artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkFormat
{
    Jpeg,
    Png
}

impl ArtworkFormat
{
    /// Detect format from leading magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self>
    {
        if data.starts_with(&[0xFF, 0xD8, 0xFF])
        {
            Some(ArtworkFormat::Jpeg)
        }
        else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
        {
            Some(ArtworkFormat::Png)
        }
        else
        {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str
    {
        match self
        {
            | ArtworkFormat::Jpeg => "image/jpeg",
            | ArtworkFormat::Png => "image/png"
        }
    }

    /// The iTunes `covr` data-atom type indicator.
    pub fn itunes_type_indicator(&self) -> u32
    {
        match self
        {
            | ArtworkFormat::Jpeg => 13,
            | ArtworkFormat::Png => 14
        }
    }

    pub fn from_itunes_type_indicator(indicator: u32) -> Option<Self>
    {
        match indicator
        {
            | 13 => Some(ArtworkFormat::Jpeg),
            | 14 => Some(ArtworkFormat::Png),
            | _ => None
        }
    }

    /// QuickTime sample description format fourcc for the artwork video
    /// track (§4.3.3, §4.3.5).
    pub fn stsd_fourcc(&self) -> &'static [u8; 4]
    {
        match self
        {
            | ArtworkFormat::Jpeg => b"jpeg",
            | ArtworkFormat::Png => b"png "
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork
{
    pub data:   Vec<u8>,
    pub format: ArtworkFormat
}

/// Fallback dimensions when probing fails, per §3.
pub const FALLBACK_DIMENSIONS: (u32, u32) = (300, 300);

impl Artwork
{
    pub fn new(data: Vec<u8>) -> Option<Self>
    {
        let format = ArtworkFormat::detect(&data)?;
        Some(Self { data, format })
    }

    /// Probe pixel dimensions from a JPEG SOF0/SOF2 marker or a PNG IHDR
    /// chunk, falling back to 300x300 when detection fails.
    pub fn dimensions(&self) -> (u32, u32)
    {
        match self.format
        {
            | ArtworkFormat::Png => probe_png_dimensions(&self.data).unwrap_or(FALLBACK_DIMENSIONS),
            | ArtworkFormat::Jpeg => probe_jpeg_dimensions(&self.data).unwrap_or(FALLBACK_DIMENSIONS)
        }
    }
}

fn probe_png_dimensions(data: &[u8]) -> Option<(u32, u32)>
{
    // IHDR is always the first chunk, at offset 8 (signature) + 8 (length+type).
    if data.len() < 33 || &data[12..16] != b"IHDR"
    {
        return None;
    }
    let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(data[20..24].try_into().ok()?);
    Some((width, height))
}

fn probe_jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)>
{
    let mut pos = 2; // skip SOI marker
    while pos + 9 < data.len()
    {
        if data[pos] != 0xFF
        {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        // SOF0 (0xC0) through SOF15 (0xCF), excluding DHT (0xC4), JPG (0xC8), DAC (0xCC).
        let is_sof = (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC;
        if is_sof
        {
            let height = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
            let width = u16::from_be_bytes([data[pos + 7], data[pos + 8]]) as u32;
            return Some((width, height));
        }
        if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker)
        {
            pos += 2;
            continue;
        }
        if pos + 3 >= data.len()
        {
            break;
        }
        let segment_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        pos += 2 + segment_len;
    }
    None
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn detects_jpeg_and_png()
    {
        assert_eq!(ArtworkFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ArtworkFormat::Jpeg));
        assert_eq!(ArtworkFormat::detect(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]), Some(ArtworkFormat::Png));
        assert_eq!(ArtworkFormat::detect(&[0x00, 0x01]), None);
    }

    #[test]
    fn falls_back_to_300x300_on_undetectable_dimensions()
    {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(b"not really a png chunk");
        let art = Artwork { data, format: ArtworkFormat::Png };
        assert_eq!(art.dimensions(), FALLBACK_DIMENSIONS);
    }

    #[test]
    fn probes_png_ihdr_dimensions()
    {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&[0, 0, 0, 13]); // chunk length
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&640u32.to_be_bytes());
        data.extend_from_slice(&480u32.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]); // bit depth, color type, etc
        let art = Artwork { data, format: ArtworkFormat::Png };
        assert_eq!(art.dimensions(), (640, 480));
    }
}
