//! Builders for synthetic MP4 chunks.
//!
//! The boxes produced here are structurally valid but carry no decodable
//! media; they exist so chunk inspection can be exercised without sample files.

/// Serialize one box with a 32-bit size header.
pub fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&((payload.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

/// An fMP4 initialisation segment (`ftyp` + `moov`) with one H.264 video
/// track of the given geometry.
pub fn init_segment(width: u16, height: u16) -> Vec<u8> {
    let ftyp = mp4_box(b"ftyp", b"iso5\0\0\0\0iso6mp41");

    let mut mvhd = vec![0u8; 100];
    mvhd[12..16].copy_from_slice(&1000u32.to_be_bytes());

    let mut tkhd = vec![0u8; 84];
    tkhd[3] = 0x03;
    tkhd[12..16].copy_from_slice(&1u32.to_be_bytes());
    tkhd[76..80].copy_from_slice(&((width as u32) << 16).to_be_bytes());
    tkhd[80..84].copy_from_slice(&((height as u32) << 16).to_be_bytes());

    let mut mdhd = vec![0u8; 24];
    mdhd[12..16].copy_from_slice(&90000u32.to_be_bytes());

    let mut hdlr = vec![0u8; 25];
    hdlr[8..12].copy_from_slice(b"vide");

    let mut avc1 = vec![0u8; 78];
    avc1[7] = 1; // data_reference_index
    avc1[24..26].copy_from_slice(&width.to_be_bytes());
    avc1[26..28].copy_from_slice(&height.to_be_bytes());
    let mut stsd = vec![0, 0, 0, 0, 0, 0, 0, 1];
    stsd.extend(mp4_box(b"avc1", &avc1));

    let stbl = mp4_box(b"stbl", &mp4_box(b"stsd", &stsd));
    let minf = mp4_box(b"minf", &stbl);
    let mdia = mp4_box(
        b"mdia",
        &[mp4_box(b"mdhd", &mdhd), mp4_box(b"hdlr", &hdlr), minf].concat(),
    );
    let trak = mp4_box(b"trak", &[mp4_box(b"tkhd", &tkhd), mdia].concat());
    let mvex = mp4_box(b"mvex", &mp4_box(b"trex", &[0u8; 24]));
    let moov = mp4_box(b"moov", &[mp4_box(b"mvhd", &mvhd), trak, mvex].concat());

    [ftyp, moov].concat()
}

/// A media fragment (`moof` + `mdat`) wrapping `payload`.
pub fn media_fragment(sequence: u32, payload: &[u8]) -> Vec<u8> {
    let mut mfhd = vec![0u8; 8];
    mfhd[4..8].copy_from_slice(&sequence.to_be_bytes());
    let moof = mp4_box(b"moof", &mp4_box(b"mfhd", &mfhd));
    [moof, mp4_box(b"mdat", payload)].concat()
}
