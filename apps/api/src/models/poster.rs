use serde::{Deserialize, Serialize};

/// The poster content model as posted by the editor.
///
/// Every visibility flag is shown unless explicitly `false`, so the flags are
/// `Option<bool>` on the wire and read through the `*_shown` helpers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterData {
    pub title: String,
    pub authors: String,
    pub school: String,
    pub contact: String,
    pub sections: Vec<PosterSection>,
    pub keypoints: Vec<String>,
    pub key_descriptions: Vec<String>,
    pub key_visibility: Vec<Option<bool>>,
    pub images: Vec<PosterImage>,
    /// Newline-delimited reference list.
    pub references: String,
    pub references_title: Option<String>,
    pub qr_code_url: Option<String>,
    pub qr_code_color: Option<String>,
    pub qr_code_caption: Option<String>,
    pub show_qr_code: Option<bool>,
    pub show_keypoints: Option<bool>,
    pub show_references: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterSection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterImage {
    pub url: String,
    pub caption: String,
    pub upper_caption: Option<String>,
    pub visible: Option<bool>,
}

impl PosterData {
    pub fn qr_code_shown(&self) -> bool {
        self.show_qr_code != Some(false)
    }

    pub fn keypoints_shown(&self) -> bool {
        self.show_keypoints != Some(false)
    }

    pub fn references_shown(&self) -> bool {
        self.show_references != Some(false)
    }

    /// A key point is hidden only by an explicit `false` at its index.
    pub fn key_point_visible(&self, index: usize) -> bool {
        self.key_visibility.get(index).copied().flatten() != Some(false)
    }
}

impl PosterImage {
    pub fn shown(&self) -> bool {
        self.visible != Some(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Column ceiling for this orientation: 3 for portrait, 4 for landscape.
    pub fn max_columns(self) -> usize {
        match self {
            Orientation::Portrait => 3,
            Orientation::Landscape => 4,
        }
    }
}

/// Design choices made in the editor's style panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignSettings {
    pub title_font: String,
    pub content_font: String,
    pub header_bg_color: String,
    pub header_text_color: String,
    pub key_points_text_color: String,
    pub orientation: Orientation,
    pub layout: String,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            title_font: "merriweather".to_string(),
            content_font: "roboto".to_string(),
            header_bg_color: "#FFFFFF".to_string(),
            header_text_color: "#202B5B".to_string(),
            key_points_text_color: "#202B5B".to_string(),
            orientation: Orientation::Portrait,
            layout: "academic-modern".to_string(),
        }
    }
}
