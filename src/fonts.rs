use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

/// Index into a [`FontSet`]: `(bold, italic)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct FontStyle {
    pub(crate) bold: bool,
    pub(crate) italic: bool,
}

impl FontStyle {
    pub(crate) fn new(bold: bool, italic: bool) -> Self {
        Self { bold, italic }
    }

    fn slot(self) -> usize {
        (self.bold as usize) * 2 + self.italic as usize
    }
}

struct TrueTypeFont {
    name: String,
    data: Vec<u8>,
    face_index: u32,
    remapper: subsetter::GlyphRemapper,
    char_to_gid: BTreeMap<char, u16>,
}

enum FontSource {
    Builtin {
        base_font: &'static str,
        widths_1000: Vec<f32>,
    },
    TrueType(TrueTypeFont),
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) line_h_ratio: f32,
    pub(crate) ascender_ratio: f32,
    source: FontSource,
    used: bool,
}

impl FontEntry {
    fn builtin(pdf_name: String, style: FontStyle) -> Self {
        let base_font = match (style.bold, style.italic) {
            (false, false) => "Helvetica",
            (true, false) => "Helvetica-Bold",
            (false, true) => "Helvetica-Oblique",
            (true, true) => "Helvetica-BoldOblique",
        };
        // Helvetica AFM: ascender 718, descender -207, line gap 231
        Self {
            pdf_name,
            line_h_ratio: 1.156,
            ascender_ratio: 0.718,
            source: FontSource::Builtin {
                base_font,
                widths_1000: helvetica_widths(style.bold),
            },
            used: false,
        }
    }

    fn truetype(pdf_name: String, name: &str, data: Vec<u8>, face_index: u32) -> Option<Self> {
        let face = Face::parse(&data, face_index).ok()?;
        let units = face.units_per_em() as f32;
        let line_gap = face.line_gap() as f32;
        let line_h_ratio = (face.ascender() as f32 - face.descender() as f32 + line_gap) / units;
        let ascender_ratio = face.ascender() as f32 / units;
        Some(Self {
            pdf_name,
            line_h_ratio,
            ascender_ratio,
            source: FontSource::TrueType(TrueTypeFont {
                name: name.to_string(),
                data,
                face_index,
                remapper: subsetter::GlyphRemapper::new(),
                char_to_gid: BTreeMap::new(),
            }),
            used: false,
        })
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        match &self.source {
            FontSource::Builtin { widths_1000, .. } => word
                .chars()
                .map(|ch| {
                    // unmappable chars are drawn as '?'
                    let byte = match char_to_winansi(ch) {
                        0 => b'?',
                        b => b,
                    };
                    widths_1000[(byte - 32) as usize] * font_size / 1000.0
                })
                .sum(),
            FontSource::TrueType(tt) => {
                let Ok(face) = Face::parse(&tt.data, tt.face_index) else {
                    return 0.0;
                };
                let units = face.units_per_em() as f32;
                word.chars()
                    .filter_map(|ch| face.glyph_index(ch))
                    .filter_map(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / units * font_size)
                    .sum()
            }
        }
    }

    pub(crate) fn space_width(&self, font_size: f32) -> f32 {
        self.word_width(" ", font_size)
    }

    pub(crate) fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_h_ratio
    }

    /// Encode text for a `Tj` operand, registering the glyphs it uses.
    pub(crate) fn encode(&mut self, text: &str) -> Vec<u8> {
        self.used = true;
        match &mut self.source {
            FontSource::Builtin { .. } => to_winansi_bytes(text),
            FontSource::TrueType(tt) => {
                let Ok(face) = Face::parse(&tt.data, tt.face_index) else {
                    return Vec::new();
                };
                let mut out = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    let gid = match tt.char_to_gid.get(&ch) {
                        Some(&gid) => gid,
                        None => {
                            let gid = face
                                .glyph_index(ch)
                                .map(|g| tt.remapper.remap(g.0))
                                .unwrap_or(0);
                            tt.char_to_gid.insert(ch, gid);
                            gid
                        }
                    };
                    out.push((gid >> 8) as u8);
                    out.push((gid & 0xFF) as u8);
                }
                out
            }
        }
    }

    fn write(&self, pdf: &mut Pdf, font_ref: Ref, alloc: &mut impl FnMut() -> Ref) {
        match &self.source {
            FontSource::Builtin { base_font, .. } => {
                pdf.type1_font(font_ref)
                    .base_font(Name(base_font.as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
            FontSource::TrueType(tt) => {
                if embed_truetype(pdf, font_ref, tt, alloc).is_none() {
                    log::warn!("Embedding {} failed — using Helvetica", tt.name);
                    pdf.type1_font(font_ref)
                        .base_font(Name(b"Helvetica"))
                        .encoding_predefined(Name(b"WinAnsiEncoding"));
                }
            }
        }
    }
}

/// The four faces of one family, loaded once per render.
pub(crate) struct FontSet {
    entries: Vec<FontEntry>,
}

const STYLES: [FontStyle; 4] = [
    FontStyle { bold: false, italic: false },
    FontStyle { bold: false, italic: true },
    FontStyle { bold: true, italic: false },
    FontStyle { bold: true, italic: true },
];

impl FontSet {
    /// `custom` is either a path to a TrueType/OpenType file or a family name
    /// looked up in the system font directories.
    pub(crate) fn load(custom: Option<&str>) -> Self {
        let entries = STYLES
            .iter()
            .enumerate()
            .map(|(i, &style)| {
                let pdf_name = format!("F{}", i + 1);
                custom
                    .and_then(|name| load_custom(&pdf_name, name, style))
                    .unwrap_or_else(|| {
                        if let Some(name) = custom {
                            log::warn!(
                                "Font not found: {name} bold={} italic={} — using Helvetica",
                                style.bold,
                                style.italic
                            );
                        }
                        FontEntry::builtin(pdf_name, style)
                    })
            })
            .collect();
        Self { entries }
    }

    pub(crate) fn get(&self, style: FontStyle) -> &FontEntry {
        &self.entries[style.slot()]
    }

    pub(crate) fn get_mut(&mut self, style: FontStyle) -> &mut FontEntry {
        &mut self.entries[style.slot()]
    }

    /// Write every font that was drawn with; returns resource name/ref pairs.
    pub(crate) fn write_used(
        &self,
        pdf: &mut Pdf,
        alloc: &mut impl FnMut() -> Ref,
    ) -> Vec<(String, Ref)> {
        self.entries
            .iter()
            .filter(|e| e.used)
            .map(|e| {
                let font_ref = alloc();
                e.write(pdf, font_ref, alloc);
                (e.pdf_name.clone(), font_ref)
            })
            .collect()
    }
}

fn load_custom(pdf_name: &str, name: &str, style: FontStyle) -> Option<FontEntry> {
    let path = Path::new(name);
    let (file, face_index) = if is_font_file(path) && path.is_file() {
        (path.to_path_buf(), 0)
    } else {
        find_font_file(name, style.bold, style.italic)?
    };
    let data = std::fs::read(&file).ok()?;
    let family = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    FontEntry::truetype(pdf_name.to_string(), family, data, face_index)
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("RECEIPT_PDF_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        dirs.extend(
            val.split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut visited = std::collections::HashSet::new();
    let mut files_scanned = 0u32;

    let mut stack = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold, italic)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold, italic))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        files_scanned,
        index.len(),
    );
    index
}

/// Look up a font file by family name and style.
/// Falls back to the regular variant if the requested bold/italic is not available.
fn find_font_file(font_name: &str, bold: bool, italic: bool) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    let key = font_name.trim().to_lowercase();
    index
        .get(&(key.clone(), bold, italic))
        .or_else(|| {
            if bold || italic {
                index.get(&(key, false, false))
            } else {
                None
            }
        })
        .cloned()
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes; unmappable chars become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match char_to_winansi(c) {
            0 => b'?',
            b => b,
        })
        .collect()
}

/// Helvetica / Helvetica-Bold AFM widths for ASCII 32..=126; the upper
/// WinAnsi half is approximated.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    const REGULAR: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
        278, 278, 584, 584, 584, 556, 1015, // :..@
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
        278, 278, 278, 469, 556, 333, // [..`
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
        334, 260, 334, 584, // {..~
    ];
    const BOLD: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ];
    let table = if bold { &BOLD } else { &REGULAR };
    (32u16..=255)
        .map(|b| match b {
            32..=126 => table[(b - 32) as usize] as f32,
            0x95 => 350.0,        // bullet
            0x96 => 556.0,        // en dash
            0x97 => 1000.0,       // em dash
            0xA0 => 278.0,        // nbsp
            _ => 556.0,
        })
        .collect()
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding,
/// subsetted to the glyphs registered through [`FontEntry::encode`].
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    tt: &TrueTypeFont,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<()> {
    let face = Face::parse(&tt.data, tt.face_index).ok()?;

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let subset_data = subsetter::subset(&tt.data, tt.face_index, &tt.remapper)
        .unwrap_or_else(|e| {
            log::warn!("Font subsetting failed for {}: {e} — embedding full font", tt.name);
            tt.data.clone()
        });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(subset_data.len()).ok()?;
    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&subset_data, 6);
    pdf.stream(data_ref, &compressed)
        .filter(pdf_writer::Filter::FlateDecode)
        .pair(Name(b"Length1"), data_len);

    let ps_name: String = tt.name.chars().filter(|c| !c.is_whitespace()).collect();

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = tt
            .char_to_gid
            .iter()
            .filter_map(|(&ch, &new_gid)| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| (new_gid, adv as f32 / units * 1000.0))
            })
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for (&ch, &new_gid) in &tt.char_to_gid {
        if new_gid != 0 {
            cmap.pair(new_gid, ch);
        }
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_helvetica_is_wider() {
        let fonts = FontSet::load(None);
        let regular = fonts.get(FontStyle::new(false, false)).word_width("Widget", 10.0);
        let bold = fonts.get(FontStyle::new(true, false)).word_width("Widget", 10.0);
        assert!(bold > regular);
        assert!((fonts.get(FontStyle::default()).space_width(10.0) - 2.78).abs() < 1e-4);
    }

    #[test]
    fn only_drawn_fonts_are_written() {
        let mut fonts = FontSet::load(None);
        fonts.get_mut(FontStyle::new(true, false)).encode("Total");
        let mut pdf = Pdf::new();
        let mut next = 1;
        let mut alloc = || {
            let r = Ref::new(next);
            next += 1;
            r
        };
        let written = fonts.write_used(&mut pdf, &mut alloc);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, "F3");
    }

    #[test]
    fn missing_custom_font_falls_back_to_helvetica() {
        let fonts = FontSet::load(Some("/nonexistent/NoSuchFont.ttf"));
        let entry = fonts.get(FontStyle::default());
        assert!((entry.ascender_ratio - 0.718).abs() < 1e-6);
    }

    #[test]
    fn winansi_replaces_unmappable() {
        assert_eq!(to_winansi_bytes("€5 ✓"), vec![0x80, b'5', b' ', b'?']);
    }
}
