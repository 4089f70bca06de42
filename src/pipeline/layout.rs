//! Layout assembly: pairing the generated biography with media references.
//!
//! The biography text is split on markdown-style headings into titled
//! sections; uploaded photos and their QR references are distributed across
//! the sections in order. When the text carries no structure it becomes a
//! single section under a default title.

use serde::{Deserialize, Serialize};

use crate::files::StoredImage;
use crate::task::QrCodeRef;

/// One titled block of the final document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub body: String,
    /// Public URL of the photo shown with this section, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Assembled document structure handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub title: String,
    pub language: String,
    /// Template style requested at submission (e.g. "classic")
    pub style: String,
    pub sections: Vec<DocumentSection>,
    pub qr_codes: Vec<QrCodeRef>,
}

/// Assemble the document layout from the biography text and media.
pub fn assemble_layout(
    biography: &str,
    images: &[StoredImage],
    qr_codes: &[QrCodeRef],
    style: &str,
    language: &str,
) -> DocumentLayout {
    let (title, mut sections) = split_sections(biography, language);

    for (section, image) in sections.iter_mut().zip(images.iter()) {
        section.image_url = Some(image.public_url.clone());
    }

    DocumentLayout {
        title,
        language: language.to_string(),
        style: style.to_string(),
        sections,
        qr_codes: qr_codes.to_vec(),
    }
}

fn default_title(language: &str) -> &'static str {
    if language.starts_with("zh") {
        "我的个人传记"
    } else {
        "My Biography"
    }
}

fn default_section_title(language: &str) -> &'static str {
    if language.starts_with("zh") {
        "我的故事"
    } else {
        "My Story"
    }
}

/// Split on `#`/`##` headings. The first top-level heading becomes the
/// document title; every further heading opens a section.
fn split_sections(biography: &str, language: &str) -> (String, Vec<DocumentSection>) {
    let mut title: Option<String> = None;
    let mut sections: Vec<DocumentSection> = Vec::new();
    let mut current: Option<DocumentSection> = None;
    let mut preamble = String::new();

    for line in biography.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("## ") {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(DocumentSection {
                title: heading.trim().to_string(),
                body: String::new(),
                image_url: None,
            });
        } else if let Some(heading) = trimmed.strip_prefix("# ") {
            if title.is_none() && current.is_none() && sections.is_empty() {
                title = Some(heading.trim().to_string());
            } else {
                if let Some(section) = current.take() {
                    sections.push(section);
                }
                current = Some(DocumentSection {
                    title: heading.trim().to_string(),
                    body: String::new(),
                    image_url: None,
                });
            }
        } else if let Some(section) = current.as_mut() {
            section.body.push_str(line);
            section.body.push('\n');
        } else {
            preamble.push_str(line);
            preamble.push('\n');
        }
    }
    if let Some(section) = current.take() {
        sections.push(section);
    }

    // Unstructured text becomes a single default section.
    if sections.is_empty() {
        sections.push(DocumentSection {
            title: default_section_title(language).to_string(),
            body: if preamble.trim().is_empty() {
                biography.to_string()
            } else {
                preamble.clone()
            },
            image_url: None,
        });
    } else if !preamble.trim().is_empty() {
        sections.insert(
            0,
            DocumentSection {
                title: default_section_title(language).to_string(),
                body: preamble,
                image_url: None,
            },
        );
    }

    for section in &mut sections {
        section.body = section.body.trim().to_string();
    }

    (
        title.unwrap_or_else(|| default_title(language).to_string()),
        sections,
    )
}
