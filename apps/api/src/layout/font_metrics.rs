//! Static font-metric tables for the PDF base-14 families the poster uses.
//!
//! Character widths are in em units (relative to font size), taken from the
//! Adobe AFM files divided by 1000. The PDF embeds no font programs, so these
//! tables are the exact advance widths the viewer will use for ASCII text.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
}

impl FontFamily {
    pub const ALL: [FontFamily; 4] = [
        FontFamily::Helvetica,
        FontFamily::HelveticaBold,
        FontFamily::TimesRoman,
        FontFamily::TimesBold,
    ];

    /// PostScript name of the standard Type 1 font.
    pub fn base_font(self) -> &'static [u8] {
        match self {
            FontFamily::Helvetica => b"Helvetica",
            FontFamily::HelveticaBold => b"Helvetica-Bold",
            FontFamily::TimesRoman => b"Times-Roman",
            FontFamily::TimesBold => b"Times-Bold",
        }
    }

    /// Name of the font in a page's resource dictionary.
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            FontFamily::Helvetica => b"F1",
            FontFamily::HelveticaBold => b"F2",
            FontFamily::TimesRoman => b"F3",
            FontFamily::TimesBold => b"F4",
        }
    }

    pub fn bold(self) -> Self {
        match self {
            FontFamily::Helvetica | FontFamily::HelveticaBold => FontFamily::HelveticaBold,
            FontFamily::TimesRoman | FontFamily::TimesBold => FontFamily::TimesBold,
        }
    }
}

/// Design fonts rendered with the serif family. Everything else is sans.
const SERIF_DESIGN_FONTS: [&str; 11] = [
    "merriweather",
    "playfair",
    "lora",
    "crimson",
    "source serif",
    "eb garamond",
    "libre baskerville",
    "cormorant",
    "old standard",
    "spectral",
    "vollkorn",
];

const SANS_DESIGN_FONTS: [&str; 10] = [
    "roboto",
    "open sans",
    "lato",
    "montserrat",
    "inter",
    "poppins",
    "raleway",
    "nunito",
    "source sans",
    "helvetica",
];

/// Maps a design-settings font name (e.g. `"merriweather"`, `"Open Sans"`)
/// to the built-in family drawn in its place.
pub fn family_for_design_font(name: &str) -> FontFamily {
    let normalized = name.trim().to_lowercase().replace(['-', '_'], " ");
    if SERIF_DESIGN_FONTS
        .iter()
        .any(|serif| normalized.starts_with(serif))
    {
        return FontFamily::TimesRoman;
    }
    if !SANS_DESIGN_FONTS
        .iter()
        .any(|sans| normalized.starts_with(sans))
    {
        warn!(font = name, "Unknown design font, using Helvetica");
    }
    FontFamily::Helvetica
}

/// Fonts used for one poster: bold headings in the title family, body text
/// in the content family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FontPairing {
    pub heading: FontFamily,
    pub body: FontFamily,
}

impl FontPairing {
    pub fn for_design(title_font: &str, content_font: &str) -> Self {
        Self {
            heading: family_for_design_font(title_font).bold(),
            body: family_for_design_font(content_font),
        }
    }
}

impl Default for FontPairing {
    fn default() -> Self {
        Self {
            heading: FontFamily::HelveticaBold,
            body: FontFamily::Helvetica,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font family.
///
/// `widths[i]` = width of ASCII character `(i + 32)` in em units.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub font: FontFamily,
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters (codepoints > 0x7E).
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Measures the rendered width of a string in em units.
    ///
    /// Non-ASCII characters fall back to `average_char_width`.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Width of `s` in points at `font_size`.
    pub fn measure_pt(&self, s: &str, font_size: f32) -> f32 {
        self.measure_str(s) * font_size
    }

    /// Greedy word wrap of `text` into lines no wider than `max_width` points.
    ///
    /// Hard newlines start a new line; blank source lines become empty lines.
    /// A single word wider than `max_width` gets a line of its own.
    pub fn wrap_lines(&self, text: &str, font_size: f32, max_width: f32) -> Vec<String> {
        let space_w = self.space_width * font_size;
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            let words: Vec<&str> = paragraph.split_whitespace().collect();
            if words.is_empty() {
                lines.push(String::new());
                continue;
            }

            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in words {
                let word_w = self.measure_pt(word, font_size);
                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_w;
                } else if current_width + space_w + word_w > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = word_w;
                } else {
                    current.push(' ');
                    current.push_str(word);
                    current_width += space_w + word_w;
                }
            }
            lines.push(current);
        }

        // Trailing blank lines add height without content.
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Helvetica,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.54,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::HelveticaBold,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.58,
    space_width: 0.278,
};

static TIMES_ROMAN_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::TimesRoman,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.408, 0.500, 0.500, 0.833, 0.778, 0.180, 0.333, 0.333, 0.500, 0.564, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.564, 0.564, 0.564, 0.444, 0.921,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.667, 0.722, 0.611, 0.556, 0.722, 0.722, 0.333, 0.389, 0.722, 0.611, 0.889,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.722, 0.556, 0.722, 0.667, 0.556, 0.611, 0.722, 0.722, 0.944, 0.722, 0.722, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.469, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.444, 0.500, 0.444, 0.500, 0.444, 0.333, 0.500, 0.500, 0.278, 0.278, 0.500, 0.278, 0.778,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.500, 0.500, 0.500, 0.500, 0.333, 0.389, 0.278, 0.500, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.480, 0.200, 0.480, 0.541,
    ],
    average_char_width: 0.48,
    space_width: 0.250,
};

static TIMES_BOLD_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::TimesBold,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.555, 0.500, 0.500, 1.000, 0.833, 0.278, 0.333, 0.333, 0.500, 0.570, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.570, 0.570, 0.570, 0.500, 0.930,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.778, 0.389, 0.500, 0.778, 0.667, 0.944,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.611, 0.778, 0.722, 0.556, 0.667, 0.722, 0.722, 1.000, 0.722, 0.722, 0.667,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.581, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.500, 0.556, 0.444, 0.556, 0.444, 0.333, 0.500, 0.556, 0.278, 0.333, 0.556, 0.278, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.500, 0.556, 0.556, 0.444, 0.389, 0.333, 0.556, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.394, 0.220, 0.394, 0.520,
    ],
    average_char_width: 0.51,
    space_width: 0.250,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(font: FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::Helvetica => &HELVETICA_TABLE,
        FontFamily::HelveticaBold => &HELVETICA_BOLD_TABLE,
        FontFamily::TimesRoman => &TIMES_ROMAN_TABLE,
        FontFamily::TimesBold => &TIMES_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        assert_eq!(get_metrics(FontFamily::Helvetica).measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        let metrics = get_metrics(FontFamily::Helvetica);
        // R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = metrics.measure_str("Rust");
        assert!((width - 2.056).abs() < 1e-4, "got {width}");
    }

    #[test]
    fn test_measure_str_non_ascii_falls_back() {
        let metrics = get_metrics(FontFamily::TimesRoman);
        let width = metrics.measure_str("é");
        assert!((width - metrics.average_char_width).abs() < 1e-4);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "Results and Discussion";
        let regular = get_metrics(FontFamily::Helvetica).measure_str(text);
        let bold = get_metrics(FontFamily::HelveticaBold).measure_str(text);
        assert!(bold > regular);
    }

    #[test]
    fn test_times_narrower_than_helvetica() {
        let text = "the quick brown fox jumps over the lazy dog";
        let times = get_metrics(FontFamily::TimesRoman).measure_str(text);
        let helvetica = get_metrics(FontFamily::Helvetica).measure_str(text);
        assert!(times < helvetica);
    }

    #[test]
    fn test_wrap_lines_respects_width() {
        let metrics = get_metrics(FontFamily::Helvetica);
        let text = "word ".repeat(60);
        let lines = metrics.wrap_lines(&text, 22.0, 400.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.measure_pt(line, 22.0) <= 400.0, "line too wide: {line}");
        }
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        assert_eq!(rejoined.len(), 60);
    }

    #[test]
    fn test_wrap_lines_keeps_hard_breaks() {
        let metrics = get_metrics(FontFamily::Helvetica);
        let lines = metrics.wrap_lines("First\n\nSecond\n\n", 22.0, 1000.0);
        assert_eq!(lines, vec!["First", "", "Second"]);
    }

    #[test]
    fn test_wrap_lines_overlong_word_gets_own_line() {
        let metrics = get_metrics(FontFamily::Helvetica);
        let long = "x".repeat(200);
        let lines = metrics.wrap_lines(&format!("a {long} b"), 22.0, 300.0);
        assert_eq!(lines, vec!["a".to_string(), long, "b".to_string()]);
    }

    #[test]
    fn test_wrap_lines_empty() {
        let metrics = get_metrics(FontFamily::Helvetica);
        assert!(metrics.wrap_lines("", 22.0, 300.0).is_empty());
        assert!(metrics.wrap_lines("   \n  ", 22.0, 300.0).is_empty());
    }

    #[test]
    fn test_design_font_mapping() {
        assert_eq!(family_for_design_font("merriweather"), FontFamily::TimesRoman);
        assert_eq!(family_for_design_font("Playfair Display"), FontFamily::TimesRoman);
        assert_eq!(family_for_design_font("eb-garamond"), FontFamily::TimesRoman);
        assert_eq!(family_for_design_font("roboto"), FontFamily::Helvetica);
        assert_eq!(family_for_design_font("Comic Sans"), FontFamily::Helvetica);
    }

    #[test]
    fn test_font_pairing_uses_bold_headings() {
        let pairing = FontPairing::for_design("merriweather", "roboto");
        assert_eq!(pairing.heading, FontFamily::TimesBold);
        assert_eq!(pairing.body, FontFamily::Helvetica);
    }

    #[test]
    fn test_resource_names_unique() {
        let mut names: Vec<&[u8]> = FontFamily::ALL.iter().map(|f| f.resource_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), FontFamily::ALL.len());
    }
}
