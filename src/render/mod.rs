//! Document rendering boundary.
//!
//! The core only cares whether rendering produced a document or failed;
//! typography is not its business. The shipped implementation writes a
//! self-contained HTML document; a PDF renderer can be substituted behind
//! the same trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::pipeline::DocumentLayout;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders an assembled layout into document bytes on disk.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render the layout, returning the path of the written document.
    async fn render(&self, layout: &DocumentLayout, doc_id: &str) -> Result<PathBuf, RenderError>;
}

/// HTML renderer writing one self-contained file per document.
pub struct HtmlRenderer {
    output_dir: PathBuf,
}

impl HtmlRenderer {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    fn build_html(layout: &DocumentLayout) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n");
        html.push_str(&format!("<html lang=\"{}\">\n", escape(&layout.language)));
        html.push_str("<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape(&layout.title)));
        html.push_str(
            "<style>\n\
             body { font-family: \"Songti SC\", Georgia, serif; max-width: 48rem; margin: 2rem auto; line-height: 1.8; }\n\
             h1 { text-align: center; }\n\
             section { margin: 2.5rem 0; }\n\
             img { max-width: 100%; border-radius: 4px; }\n\
             .qr { font-size: 0.85rem; color: #555; }\n\
             </style>\n</head>\n",
        );
        html.push_str(&format!("<body class=\"style-{}\">\n", escape(&layout.style)));
        html.push_str(&format!("<h1>{}</h1>\n", escape(&layout.title)));

        for section in &layout.sections {
            html.push_str("<section>\n");
            html.push_str(&format!("<h2>{}</h2>\n", escape(&section.title)));
            if let Some(url) = &section.image_url {
                html.push_str(&format!("<img src=\"{}\" alt=\"\">\n", escape(url)));
            }
            for paragraph in section.body.split("\n\n") {
                if !paragraph.trim().is_empty() {
                    html.push_str(&format!("<p>{}</p>\n", escape(paragraph.trim())));
                }
            }
            html.push_str("</section>\n");
        }

        if !layout.qr_codes.is_empty() {
            html.push_str("<section class=\"qr\">\n<h2>Media</h2>\n<ul>\n");
            for qr in &layout.qr_codes {
                html.push_str(&format!(
                    "<li><a href=\"{url}\">{name}</a></li>\n",
                    url = escape(&qr.media_url),
                    name = escape(&qr.file_name),
                ));
            }
            html.push_str("</ul>\n</section>\n");
        }

        html.push_str(&format!(
            "<footer><small>Generated {}</small></footer>\n",
            chrono::Utc::now().format("%Y-%m-%d")
        ));
        html.push_str("</body>\n</html>\n");
        html
    }
}

#[async_trait]
impl Renderer for HtmlRenderer {
    async fn render(&self, layout: &DocumentLayout, doc_id: &str) -> Result<PathBuf, RenderError> {
        let html = Self::build_html(layout);
        let path = self.output_dir.join(format!("biography_{}.html", doc_id));
        tokio::fs::write(&path, html).await?;
        tracing::info!(path = %path.display(), "Rendered biography document");
        Ok(path)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
