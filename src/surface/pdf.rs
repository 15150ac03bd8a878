//! # PDF Surface
//!
//! Renders drawing calls to a PDF 1.7 file. Each page's calls become one
//! Flate-compressed content stream; text uses the standard Type1 fonts with
//! WinAnsiEncoding, so nothing is embedded.
//!
//! Device coordinates have their origin at the top-left and grow downwards.
//! PDF user space starts bottom-left, so every y is flipped on the way out.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use super::metrics::{self, ASCENT, LINE_SPACING, POINTS_PER_DEVICE_UNIT};
use super::{Alignment, Brush, Color, Font, GraphicsSurface, Pen, Size};
use crate::error::Result;
use crate::page_setup::PageGeometry;

/// Bezier control-point distance for a quarter circle.
const KAPPA: f64 = 0.552_284_749_8;

/// The standard PDF fonts a template font name can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    fn for_font(font: &Font) -> Self {
        let name = font.name.to_ascii_lowercase();
        match (name.as_str(), font.bold) {
            (n, false) if n.contains("times") => Self::TimesRoman,
            (n, true) if n.contains("times") => Self::TimesBold,
            (n, false) if n.contains("courier") => Self::Courier,
            (n, true) if n.contains("courier") => Self::CourierBold,
            (_, false) => Self::Helvetica,
            (_, true) => Self::HelveticaBold,
        }
    }

    fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }
}

/// Accumulates pages of drawing calls and serializes them as PDF.
pub struct PdfSurface {
    /// Page size in points.
    page_width: f64,
    page_height: f64,
    pages: Vec<String>,
    fonts: Vec<StandardFont>,
    title: Option<String>,
    has_more_pages: bool,
}

impl PdfSurface {
    pub fn new(geometry: &PageGeometry) -> Self {
        let (w, h) = geometry.device_size();
        Self {
            page_width: w * POINTS_PER_DEVICE_UNIT,
            page_height: h * POINTS_PER_DEVICE_UNIT,
            pages: Vec::new(),
            fonts: Vec::new(),
            title: None,
            has_more_pages: false,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn stream(&mut self) -> &mut String {
        if self.pages.is_empty() {
            self.pages.push(String::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn font_index(&mut self, font: &Font) -> usize {
        let std_font = StandardFont::for_font(font);
        match self.fonts.iter().position(|f| *f == std_font) {
            Some(i) => i,
            None => {
                self.fonts.push(std_font);
                self.fonts.len() - 1
            }
        }
    }

    fn pt(device: f64) -> f64 {
        device * POINTS_PER_DEVICE_UNIT
    }

    fn flip(&self, device_y: f64) -> f64 {
        self.page_height - Self::pt(device_y)
    }

    fn write_stroke_setup(stream: &mut String, pen: &Pen) {
        let (r, g, b) = rgb_fractions(pen.color);
        let _ = write!(
            stream,
            "{:.3} {:.3} {:.3} RG\n{:.2} w\n",
            r,
            g,
            b,
            Self::pt(pen.width)
        );
    }

    /// Serialize every page into PDF bytes.
    pub fn finish(&self) -> Vec<u8> {
        let mut objects: Vec<Vec<u8>> = vec![Vec::new(), Vec::new(), Vec::new()];

        let mut fonts = self.fonts.clone();
        if fonts.is_empty() {
            fonts.push(StandardFont::Helvetica);
        }
        let mut font_resources = String::new();
        for (i, font) in fonts.iter().enumerate() {
            let id = objects.len();
            objects.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.pdf_name()
                )
                .into_bytes(),
            );
            let _ = write!(font_resources, "/F{} {} 0 R ", i, id);
        }

        let empty = [String::new()];
        let pages: &[String] = if self.pages.is_empty() {
            &empty
        } else {
            &self.pages
        };

        let mut page_ids = Vec::with_capacity(pages.len());
        for content in pages {
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_id = objects.len();
            let mut data: Vec<u8> = Vec::new();
            let _ = write!(
                data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            data.extend_from_slice(&compressed);
            data.extend_from_slice(b"\nendstream");
            objects.push(data);

            let page_id = objects.len();
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Contents {} 0 R /Resources << /Font << {}>> >> >>",
                    self.page_width, self.page_height, content_id, font_resources
                )
                .into_bytes(),
            );
            page_ids.push(page_id);
        }

        objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_ids.len()
        )
        .into_bytes();

        let mut info = String::from("<< ");
        if let Some(title) = &self.title {
            let _ = write!(info, "/Title ({}) ", escape_pdf_string(title));
        }
        info.push_str("/Producer (ledgerprint) >>");
        let info_id = objects.len();
        objects.push(info.into_bytes());

        serialize(&objects, info_id)
    }
}

impl GraphicsSurface for PdfSurface {
    fn measure_string(&self, text: &str, font: &Font) -> Size {
        metrics::measure(text, font)
    }

    fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        brush: &Brush,
        x: f64,
        y: f64,
        alignment: Alignment,
    ) -> Result<()> {
        let index = self.font_index(font);
        let (r, g, b) = rgb_fractions(brush.color);
        let line_advance = font.size * LINE_SPACING;
        let top = Self::pt(y);
        let page_height = self.page_height;
        let stream = self.stream();

        for (i, line) in text.split('\n').enumerate() {
            if line.is_empty() {
                continue;
            }
            let width = metrics::line_width_pt(line, font);
            let left = match alignment {
                Alignment::Near => Self::pt(x),
                Alignment::Center => Self::pt(x) - width / 2.0,
                Alignment::Far => Self::pt(x) - width,
            };
            let baseline = page_height - (top + i as f64 * line_advance + font.size * ASCENT);
            let _ = write!(
                stream,
                "BT\n/F{} {:.1} Tf\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} Td\n<{}> Tj\nET\n",
                index,
                font.size,
                r,
                g,
                b,
                left,
                baseline,
                winansi_hex(line)
            );
        }
        Ok(())
    }

    fn draw_line(&mut self, pen: &Pen, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        let (fy1, fy2) = (self.flip(y1), self.flip(y2));
        let stream = self.stream();
        stream.push_str("q\n");
        Self::write_stroke_setup(stream, pen);
        let _ = write!(
            stream,
            "{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
            Self::pt(x1),
            fy1,
            Self::pt(x2),
            fy2
        );
        Ok(())
    }

    fn draw_ellipse(&mut self, pen: &Pen, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let rx = Self::pt(width) / 2.0;
        let ry = Self::pt(height) / 2.0;
        let cx = Self::pt(x) + rx;
        let cy = self.flip(y) - ry;
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);

        let stream = self.stream();
        stream.push_str("q\n");
        Self::write_stroke_setup(stream, pen);
        let _ = write!(stream, "{:.2} {:.2} m\n", cx + rx, cy);
        let _ = write!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx + rx,
            cy + ky,
            cx + kx,
            cy + ry,
            cx,
            cy + ry
        );
        let _ = write!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx - kx,
            cy + ry,
            cx - rx,
            cy + ky,
            cx - rx,
            cy
        );
        let _ = write!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx - rx,
            cy - ky,
            cx - kx,
            cy - ry,
            cx,
            cy - ry
        );
        let _ = write!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx + kx,
            cy - ry,
            cx + rx,
            cy - ky,
            cx + rx,
            cy
        );
        stream.push_str("S\nQ\n");
        Ok(())
    }

    fn set_has_more_pages(&mut self, more: bool) {
        self.has_more_pages = more;
    }

    fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    fn begin_page(&mut self) -> Result<()> {
        self.pages.push(String::new());
        Ok(())
    }
}

fn rgb_fractions(c: Color) -> (f64, f64, f64) {
    (
        c.r as f64 / 255.0,
        c.g as f64 / 255.0,
        c.b as f64 / 255.0,
    )
}

fn serialize(objects: &[Vec<u8>], info_id: usize) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = vec![0; objects.len()];

    output.extend_from_slice(b"%PDF-1.7\n");
    output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    for (i, obj) in objects.iter().enumerate().skip(1) {
        offsets[i] = output.len();
        let _ = write!(output, "{} 0 obj\n", i);
        output.extend_from_slice(obj);
        output.extend_from_slice(b"\nendobj\n\n");
    }

    let xref_offset = output.len();
    let _ = write!(output, "xref\n0 {}\n", objects.len());
    let _ = write!(output, "0000000000 65535 f \n");
    for offset in offsets.iter().skip(1) {
        let _ = write!(output, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        output,
        "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len(),
        info_id,
        xref_offset
    );
    output
}

/// Escape special characters in a PDF literal string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Encode text as a hex string of WinAnsiEncoding bytes. Unmappable
/// characters become `?`.
fn winansi_hex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let byte = unicode_to_winansi(ch).unwrap_or(b'?');
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82),
        0x201E => Some(0x84),
        0x2026 => Some(0x85), // Ellipsis
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> PdfSurface {
        PdfSurface::new(&PageGeometry::default())
    }

    #[test]
    fn a4_page_is_close_to_595_by_842_points() {
        let s = surface();
        assert!((s.page_width - 595.28).abs() < 0.1);
        assert!((s.page_height - 841.89).abs() < 0.1);
    }

    #[test]
    fn output_is_structurally_a_pdf() {
        let mut s = surface().with_title("Journal (2026)");
        s.begin_page().unwrap();
        s.draw_string("Total", &Font::default(), &Brush::default(), 100.0, 100.0, Alignment::Far)
            .unwrap();
        s.draw_line(&Pen::default(), 0.0, 0.0, 100.0, 0.0).unwrap();
        s.begin_page().unwrap();
        s.draw_ellipse(&Pen::default(), 10.0, 10.0, 20.0, 20.0).unwrap();

        let bytes = s.finish();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/Title (Journal \\(2026\\))"));
    }

    #[test]
    fn empty_surface_still_has_one_page() {
        let bytes = surface().finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn fonts_are_deduplicated() {
        let mut s = surface();
        let bold = Font {
            bold: true,
            ..Font::default()
        };
        s.draw_string("a", &Font::default(), &Brush::default(), 0.0, 0.0, Alignment::Near)
            .unwrap();
        s.draw_string("b", &bold, &Brush::default(), 0.0, 0.0, Alignment::Near)
            .unwrap();
        s.draw_string("c", &Font::default(), &Brush::default(), 0.0, 0.0, Alignment::Near)
            .unwrap();
        assert_eq!(s.fonts, vec![StandardFont::Helvetica, StandardFont::HelveticaBold]);
    }

    #[test]
    fn maps_font_families() {
        let times = Font {
            name: "Times New Roman".to_string(),
            ..Font::default()
        };
        assert_eq!(StandardFont::for_font(&times), StandardFont::TimesRoman);
        assert_eq!(StandardFont::for_font(&Font::default()), StandardFont::Helvetica);
    }

    #[test]
    fn encodes_winansi_hex() {
        assert_eq!(winansi_hex("A€"), "4180");
        assert_eq!(winansi_hex("ü"), "FC");
        assert_eq!(winansi_hex("漢"), "3F");
    }
}
