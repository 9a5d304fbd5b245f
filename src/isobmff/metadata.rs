//! iTunes metadata parsing: `moov.udta.meta.ilst` → `AudioMetadata` (§4.3.2).

use crate::error::Mp4Error;
use crate::id3v2::text_encoding::{TextEncoding, decode_string};
use crate::io::ByteReader;
use crate::isobmff::atom::{self, Atom};
use crate::isobmff::genre;
use crate::model::{Artwork, ArtworkFormat, AudioMetadata};

/// Type indicator embedded in a `data` atom's 8-byte prefix.
fn data_atom_value<'a>(item: &Atom, reader: &mut ByteReader, scratch: &'a mut Vec<u8>) -> Result<Option<(u32, &'a [u8])>, Mp4Error>
{
    let Some(data) = item.child("data")
    else
    {
        return Ok(None);
    };
    *scratch = data.read_payload(reader)?;
    if scratch.len() < 8
    {
        return Ok(None);
    }
    let type_indicator = u32::from_be_bytes(scratch[0..4].try_into().unwrap());
    Ok(Some((type_indicator, &scratch[8..])))
}

fn decode_text_value(type_indicator: u32, value: &[u8]) -> String
{
    match type_indicator
    {
        | 2 => decode_string(value, TextEncoding::Utf16Be).unwrap_or_default(),
        | _ => String::from_utf8_lossy(value).trim_end_matches('\0').to_string()
    }
}

/// Parse `moov.udta.meta.ilst` into an `AudioMetadata`. Returns the default
/// (empty) metadata when no `ilst` is present.
pub fn parse_metadata(reader: &mut ByteReader, moov: &Atom) -> Result<AudioMetadata, Mp4Error>
{
    let mut metadata = AudioMetadata::new();

    let Some(ilst) = moov.find("moov.udta.meta.ilst")
    else
    {
        return Ok(metadata);
    };

    let items = atom::parse_ilst_items(reader, ilst)?;
    let mut scratch = Vec::new();

    for item in &items
    {
        match item.box_type.as_str()
        {
            | "\u{a9}nam" | "\u{a9}ART" | "\u{a9}alb" | "\u{a9}gen" | "\u{a9}day" | "\u{a9}wrt" | "\u{a9}cmt" | "\u{a9}too" | "aART" | "cprt" =>
            {
                if let Some((indicator, value)) = data_atom_value(item, reader, &mut scratch)?
                {
                    apply_text_item(&item.box_type, &decode_text_value(indicator, value), &mut metadata);
                }
            }
            | "trkn" | "disk" =>
            {
                if let Some((_, value)) = data_atom_value(item, reader, &mut scratch)?
                {
                    if value.len() >= 6
                    {
                        let number = u16::from_be_bytes([value[2], value[3]]);
                        if item.box_type == "trkn"
                        {
                            metadata.track_number = Some(number as i32);
                        }
                        else
                        {
                            metadata.disc_number = Some(number as i32);
                        }
                    }
                }
            }
            | "covr" =>
            {
                if let Some((indicator, value)) = data_atom_value(item, reader, &mut scratch)?
                {
                    let format = ArtworkFormat::from_itunes_type_indicator(indicator).or_else(|| ArtworkFormat::detect(value));
                    if let Some(format) = format
                    {
                        metadata.artwork = Some(Artwork { data: value.to_vec(), format });
                    }
                }
            }
            | "tmpo" =>
            {
                if let Some((_, value)) = data_atom_value(item, reader, &mut scratch)?
                {
                    if value.len() >= 2
                    {
                        metadata.bpm = Some(u16::from_be_bytes([value[0], value[1]]) as i32);
                    }
                }
            }
            | "gnre" =>
            {
                if let Some((_, value)) = data_atom_value(item, reader, &mut scratch)?
                {
                    if value.len() >= 2
                    {
                        let index = u16::from_be_bytes([value[0], value[1]]);
                        if let Some(name) = genre::name_for_index(index)
                        {
                            metadata.genre = Some(name.to_string());
                        }
                    }
                }
            }
            | "\u{a9}lyr" =>
            {
                if let Some((indicator, value)) = data_atom_value(item, reader, &mut scratch)?
                {
                    apply_lyrics_item(&decode_text_value(indicator, value), &mut metadata);
                }
            }
            | "----" => apply_reverse_dns_item(item, reader, &mut metadata)?,
            | _ => {}
        }
    }

    Ok(metadata)
}

fn apply_text_item(fourcc: &str, text: &str, metadata: &mut AudioMetadata)
{
    match fourcc
    {
        | "\u{a9}nam" => metadata.title = Some(text.to_string()),
        | "\u{a9}ART" | "aART" => metadata.artist = Some(text.to_string()),
        | "\u{a9}alb" => metadata.album = Some(text.to_string()),
        | "\u{a9}gen" => metadata.genre = Some(text.to_string()),
        | "\u{a9}day" => metadata.year = text.chars().take(4).collect::<String>().parse().ok(),
        | "\u{a9}wrt" => metadata.composer = Some(text.to_string()),
        | "\u{a9}cmt" => metadata.comment = Some(text.to_string()),
        | "\u{a9}too" => metadata.encoder = Some(text.to_string()),
        | "cprt" => metadata.copyright = Some(text.to_string()),
        | _ => {}
    }

    if fourcc == "\u{a9}ART"
    {
        metadata.artist = Some(text.to_string());
    }
}

fn apply_lyrics_item(text: &str, metadata: &mut AudioMetadata)
{
    metadata.unsynchronized_lyrics = Some(text.to_string());

    let trimmed = text.trim_start();
    if trimmed.starts_with("<?xml") || trimmed.starts_with("<tt")
    {
        if let Ok(doc) = crate::lyrics::ttml::parse_document(text)
        {
            metadata.synchronized_lyrics = doc.to_synchronized_lyrics();
        }
    }
    else if let Ok(lyrics) = crate::lyrics::lrc::parse(text)
    {
        metadata.synchronized_lyrics = vec![lyrics];
    }
}

fn apply_reverse_dns_item(item: &Atom, reader: &mut ByteReader, metadata: &mut AudioMetadata) -> Result<(), Mp4Error>
{
    let mean = item.child("mean");
    let name = item.child("name");
    let data = item.child("data");
    let (Some(mean), Some(name), Some(data)) = (mean, name, data)
    else
    {
        return Ok(());
    };

    let mean_payload = mean.read_payload(reader)?;
    let name_payload = name.read_payload(reader)?;
    let data_payload = data.read_payload(reader)?;

    let domain = if mean_payload.len() > 4 { String::from_utf8_lossy(&mean_payload[4..]).trim_end_matches('\0').to_string() } else { String::new() };
    let key = if name_payload.len() > 4 { String::from_utf8_lossy(&name_payload[4..]).trim_end_matches('\0').to_string() } else { String::new() };
    let value = if data_payload.len() > 8 { String::from_utf8_lossy(&data_payload[8..]).trim_end_matches('\0').to_string() } else { String::new() };

    metadata.custom_text_fields.insert(format!("{domain}:{key}"), value);
    Ok(())
}

/// Duration in seconds, computed from `moov.mvhd` (§4.3.2). `None` when
/// `mvhd` is absent or its timescale is zero.
pub fn duration_seconds(reader: &mut ByteReader, moov: &Atom) -> Result<Option<f64>, Mp4Error>
{
    let Some(mvhd) = moov.child("mvhd")
    else
    {
        return Ok(None);
    };
    let (timescale, duration) = crate::isobmff::fields::read_timescale_duration(reader, mvhd)?;
    if timescale == 0
    {
        return Ok(None);
    }
    Ok(Some(duration as f64 / timescale as f64))
}
