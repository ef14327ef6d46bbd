use super::*;

#[test]
fn empty_bytes_are_rejected() {
    assert!(matches!(
        FontFace::from_bytes(Vec::new()),
        Err(MemeError::Validation(_))
    ));
}

#[test]
fn non_font_bytes_are_rejected() {
    let err = FontFace::from_bytes(b"this is not an sfnt file".to_vec()).unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}

#[test]
fn missing_font_file_is_reported_with_path() {
    let err = FontFace::from_path("/definitely/not/here/impact.ttf").unwrap_err();
    assert!(err.to_string().contains("impact.ttf"));
}

#[test]
fn system_font_resolves_when_any_is_installed() {
    let Ok(face) = FontFace::system_default() else {
        return;
    };
    assert!(!face.family().trim().is_empty());
    assert!(!face.bytes().is_empty());

    let again = FontFace::from_bytes(face.bytes().to_vec()).unwrap();
    assert!(!again.shaping_face().family.is_empty());
    assert_eq!(again.index(), 0);
}

fn be_u16(b: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([b[at], b[at + 1]])
}

fn be_u32(b: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// Pack standalone sfnt files into a TrueType collection, rebasing table offsets.
fn pack_collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let dir_len = |f: &[u8]| 12 + 16 * usize::from(be_u16(f, 4));
    let header_len = 12 + 4 * fonts.len();
    let dirs_len: usize = fonts.iter().map(|f| dir_len(f)).sum();

    let mut out = Vec::new();
    out.extend_from_slice(b"ttcf");
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&(fonts.len() as u32).to_be_bytes());
    let mut dir_at = header_len;
    for f in fonts {
        out.extend_from_slice(&(dir_at as u32).to_be_bytes());
        dir_at += dir_len(f);
    }

    let mut base = header_len + dirs_len;
    for f in fonts {
        let n = usize::from(be_u16(f, 4));
        out.extend_from_slice(&f[..12]);
        for t in 0..n {
            let rec = 12 + 16 * t;
            out.extend_from_slice(&f[rec..rec + 8]);
            out.extend_from_slice(&(be_u32(f, rec + 8) + base as u32).to_be_bytes());
            out.extend_from_slice(&f[rec + 12..rec + 16]);
        }
        base += f.len().next_multiple_of(4);
    }
    for f in fonts {
        out.extend_from_slice(f);
        out.resize(out.len().next_multiple_of(4), 0);
    }
    out
}

/// Two standalone (non-collection) system fonts with different family names.
fn two_standalone_fonts() -> Option<(Vec<u8>, Vec<u8>)> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    let mut picked: Vec<(String, Vec<u8>)> = Vec::new();
    for face in db.faces() {
        let Some((family, _)) = face.families.first() else {
            continue;
        };
        if picked.iter().any(|(f, _)| f == family) {
            continue;
        }
        let Some(Some(bytes)) = db.with_face_data(face.id, |data, index| {
            let sfnt = data.starts_with(&[0, 1, 0, 0]) || data.starts_with(b"OTTO");
            (index == 0 && sfnt).then(|| data.to_vec())
        }) else {
            continue;
        };
        picked.push((family.clone(), bytes));
        if picked.len() == 2 {
            let b = picked.pop()?.1;
            let a = picked.pop()?.1;
            return Some((a, b));
        }
    }
    None
}

#[test]
fn collection_face_shapes_with_its_own_family() {
    let Some((a, b)) = two_standalone_fonts() else {
        return;
    };
    let standalone_a = FontFace::from_bytes(a.clone()).unwrap();
    let standalone_b = FontFace::from_bytes(b.clone()).unwrap();
    let ttc = pack_collection(&[a, b]);

    let first = FontFace::from_collection_bytes(ttc.clone(), 0).unwrap();
    let second = FontFace::from_collection_bytes(ttc, 1).unwrap();
    assert_eq!(second.index(), 1);
    assert_eq!(first.shaping_face(), standalone_a.shaping_face());
    assert_eq!(second.shaping_face(), standalone_b.shaping_face());

    let ids = |font: &FontFace| -> Vec<u32> {
        crate::render::text::TextShaper::new()
            .shape_centered("MEME", font, 32.0, crate::foundation::core::Point::new(0.0, 0.0))
            .unwrap()
            .glyphs
            .iter()
            .map(|g| g.id)
            .collect()
    };
    let from_collection = ids(&second);
    assert!(!from_collection.is_empty());
    assert_eq!(from_collection, ids(&standalone_b));
}

#[test]
fn missing_collection_face_is_rejected() {
    let Ok(face) = FontFace::system_default() else {
        return;
    };
    let err = FontFace::from_collection_bytes(face.bytes().to_vec(), 10_000).unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}
