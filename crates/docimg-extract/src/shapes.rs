//! Inline shape discovery in `word/document.xml`.

use crate::package::get_attr;
use docimg_core::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// What a pass over the document body found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeScan {
    /// One entry per `wp:inline`, holding its `a:blip r:embed` id if any
    pub inline_shapes: Vec<Option<String>>,
    /// Runs (`w:r`) that contain an `a:graphicData` element
    pub graphic_runs: usize,
}

#[derive(Default)]
struct ShapeWalkState {
    scan: ShapeScan,
    in_inline: bool,
    inline_embed: Option<String>,
    run_depth: usize,
    run_has_graphic: bool,
}

impl ShapeWalkState {
    fn handle_element(&mut self, e: &BytesStart<'_>, is_empty: bool) {
        match e.name().as_ref() {
            b"wp:inline" if !is_empty => {
                self.in_inline = true;
                self.inline_embed = None;
            }
            b"wp:inline" => self.scan.inline_shapes.push(None),
            b"a:blip" if self.in_inline && self.inline_embed.is_none() => {
                self.inline_embed = get_attr(e, b"r:embed");
            }
            b"a:graphicData" if self.run_depth > 0 => self.run_has_graphic = true,
            b"w:r" if !is_empty => {
                self.run_depth += 1;
                if self.run_depth == 1 {
                    self.run_has_graphic = false;
                }
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"wp:inline" if self.in_inline => {
                self.in_inline = false;
                let embed = self.inline_embed.take();
                self.scan.inline_shapes.push(embed);
            }
            b"w:r" if self.run_depth > 0 => {
                self.run_depth -= 1;
                if self.run_depth == 0 && self.run_has_graphic {
                    self.scan.graphic_runs += 1;
                    log::info!("  Found embedded graphic in paragraph");
                }
            }
            _ => {}
        }
    }
}

/// Walk the document body collecting inline shapes and graphic-bearing runs.
///
/// # Errors
///
/// Returns an error on malformed XML; the whole walk is then a strategy-level
/// failure.
pub fn scan_document(xml: &str) -> Result<ShapeScan> {
    let mut state = ShapeWalkState::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => state.handle_element(&e, false),
            Event::Empty(e) => state.handle_element(&e, true),
            Event::End(e) => state.handle_end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(state.scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline(rel: &str) -> String {
        format!(
            r#"<w:r><w:drawing><wp:inline><wp:extent cx="1" cy="1"/><a:graphic><a:graphicData uri="pic"><pic:pic><pic:blipFill><a:blip r:embed="{rel}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
        )
    }

    fn body(inner: &str) -> String {
        format!(r#"<w:document><w:body><w:p>{inner}</w:p></w:body></w:document>"#)
    }

    #[test]
    fn test_scan_finds_inline_embeds_in_order() {
        let xml = body(&format!("{}{}", inline("rId5"), inline("rId9")));
        let scan = scan_document(&xml).unwrap();
        assert_eq!(
            scan.inline_shapes,
            vec![Some("rId5".to_string()), Some("rId9".to_string())]
        );
        assert_eq!(scan.graphic_runs, 2);
    }

    #[test]
    fn test_scan_inline_without_blip() {
        let xml = body(r#"<w:r><w:drawing><wp:inline><a:graphic><a:graphicData uri="chart"/></a:graphic></wp:inline></w:drawing></w:r>"#);
        let scan = scan_document(&xml).unwrap();
        assert_eq!(scan.inline_shapes, vec![None]);
        assert_eq!(scan.graphic_runs, 1);
    }

    #[test]
    fn test_scan_ignores_anchored_shapes() {
        let xml = body(r#"<w:r><w:drawing><wp:anchor><a:graphic><a:graphicData><a:blip r:embed="rId3"/></a:graphicData></a:graphic></wp:anchor></w:drawing></w:r>"#);
        let scan = scan_document(&xml).unwrap();
        assert!(scan.inline_shapes.is_empty());
        // Still an informational graphic run
        assert_eq!(scan.graphic_runs, 1);
    }

    #[test]
    fn test_scan_plain_text_has_nothing() {
        let scan = scan_document(&body("<w:r><w:t>text</w:t></w:r>")).unwrap();
        assert_eq!(scan, ShapeScan::default());
    }

    #[test]
    fn test_scan_malformed_xml() {
        assert!(scan_document("<w:document><w:body></w:document>").is_err());
    }
}
