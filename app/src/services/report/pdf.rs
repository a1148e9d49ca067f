// app/src/services/report/pdf.rs

//! Multi-page report writer on top of `lopdf`.
//!
//! Page order: cover, core analysis, plus page (tier >= plus), premium page (deluxe),
//! add-ons page (when any add-on was ordered). The disclaimer is appended to the last
//! page. Text uses the standard Helvetica faces, so only Latin-1 survives; anything else
//! is replaced before encoding.

use super::sections::{parse_sections, ParsedSections, Section};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{AddonSet, Tier};
use chrono::Utc;
use image::ImageFormat;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const BODY_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 15.0;
const WRAP_COLUMNS: usize = 88;
const COVER_IMAGE_SIZE: f32 = 360.0;

pub const DISCLAIMER: &str = "This report is created for entertainment and self-reflection purposes only. \
It is generated with the help of artificial intelligence and does not predict real events or people.";

/// Everything the writer needs for one report.
#[derive(Debug, Clone)]
pub struct ReportInput {
  pub text: String,
  pub image_path: Option<PathBuf>,
  pub tier: Tier,
  pub addons: AddonSet,
  pub display_name: String,
  pub output_path: PathBuf,
}

/// Collects drawing operations page by page, starting a new page when the cursor
/// reaches the bottom margin.
struct PageBuilder {
  pages: Vec<Vec<Operation>>,
  cursor_y: f32,
}

fn pdf_text(raw: &str) -> Object {
  let bytes: Vec<u8> = raw
    .chars()
    .map(|c| match c {
      '\u{2018}' | '\u{2019}' => '\'',
      '\u{201C}' | '\u{201D}' => '"',
      '\u{2013}' | '\u{2014}' => '-',
      '\u{2022}' => '*',
      c => c,
    })
    .map(|c| if (c as u32) < 256 && !c.is_control() { c as u32 as u8 } else { b'?' })
    .collect();
  Object::string_literal(bytes)
}

/// Greedy word wrap on a fixed column budget.
fn wrap(text: &str, columns: usize) -> Vec<String> {
  let mut lines = Vec::new();
  for paragraph in text.lines() {
    let mut line = String::new();
    for word in paragraph.split_whitespace() {
      if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > columns {
        lines.push(std::mem::take(&mut line));
      }
      if !line.is_empty() {
        line.push(' ');
      }
      line.push_str(word);
    }
    lines.push(line);
  }
  lines
}

impl PageBuilder {
  fn new() -> Self {
    Self {
      pages: Vec::new(),
      cursor_y: 0.0,
    }
  }

  fn new_page(&mut self) {
    self.pages.push(Vec::new());
    self.cursor_y = PAGE_HEIGHT - MARGIN;
  }

  fn ops(&mut self) -> &mut Vec<Operation> {
    if self.pages.is_empty() {
      self.new_page();
    }
    let last = self.pages.len() - 1;
    &mut self.pages[last]
  }

  fn ensure_space(&mut self, height: f32) {
    if self.pages.is_empty() || self.cursor_y - height < MARGIN {
      self.new_page();
    }
  }

  fn text_at(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) {
    let ops = self.ops();
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![pdf_text(text)]));
    ops.push(Operation::new("ET", vec![]));
  }

  fn centered(&mut self, font: &str, size: f32, y: f32, text: &str) {
    // Helvetica averages about half an em per glyph.
    let width = text.chars().count() as f32 * size * 0.5;
    let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
    self.text_at(font, size, x, y, text);
  }

  fn heading(&mut self, text: &str) {
    self.ensure_space(LINE_HEIGHT * 4.0);
    self.cursor_y -= 8.0;
    self.set_fill([0.36, 0.22, 0.52]);
    let y = self.cursor_y;
    self.text_at("F2", 16.0, MARGIN, y, text);
    self.set_fill([0.1, 0.1, 0.1]);
    self.cursor_y -= LINE_HEIGHT * 1.6;
  }

  fn paragraph(&mut self, text: &str) {
    for line in wrap(text, WRAP_COLUMNS) {
      self.ensure_space(LINE_HEIGHT);
      if !line.is_empty() {
        let y = self.cursor_y;
        self.text_at("F1", BODY_SIZE, MARGIN, y, &line);
      }
      self.cursor_y -= LINE_HEIGHT;
    }
    self.cursor_y -= LINE_HEIGHT * 0.5;
  }

  fn set_fill(&mut self, [r, g, b]: [f32; 3]) {
    self.ops().push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
  }

  fn image(&mut self, name: &str, x: f32, y: f32, size: f32) {
    let ops = self.ops();
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
      "cm",
      vec![size.into(), 0.0f32.into(), 0.0f32.into(), size.into(), x.into(), y.into()],
    ));
    ops.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
    ops.push(Operation::new("Q", vec![]));
  }

  fn footer(&mut self, text: &str) {
    self.set_fill([0.45, 0.45, 0.45]);
    let mut y = MARGIN - 20.0 + LINE_HEIGHT;
    for line in wrap(text, 110) {
      self.text_at("F1", 8.0, MARGIN, y, &line);
      y -= 10.0;
    }
  }
}

/// Portrait as a DCT-encoded image XObject.
fn image_xobject(path: &Path) -> AppResult<Stream> {
  let img = image::open(path).map_err(|e| AppError::Pdf(format!("Cannot read cover image: {}", e)))?;
  let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
  let mut jpeg = Vec::new();
  rgb
    .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
    .map_err(|e| AppError::Pdf(format!("Cannot encode cover image: {}", e)))?;

  let mut stream = Stream::new(
    dictionary! {
      "Type" => "XObject",
      "Subtype" => "Image",
      "Width" => rgb.width() as i64,
      "Height" => rgb.height() as i64,
      "ColorSpace" => "DeviceRGB",
      "BitsPerComponent" => 8i64,
      "Filter" => "DCTDecode",
    },
    jpeg,
  );
  stream.allows_compression = false;
  Ok(stream)
}

fn cover(pages: &mut PageBuilder, input: &ReportInput, has_image: bool) {
  pages.new_page();
  pages.set_fill([0.36, 0.22, 0.52]);
  pages.centered("F2", 30.0, PAGE_HEIGHT - 110.0, "Soulsketch");
  pages.set_fill([0.2, 0.2, 0.2]);
  pages.centered("F1", 14.0, PAGE_HEIGHT - 140.0, input.tier.display_name());
  pages.centered("F2", 20.0, PAGE_HEIGHT - 190.0, &format!("A Soulmate Portrait for {}", input.display_name));

  if has_image {
    let x = (PAGE_WIDTH - COVER_IMAGE_SIZE) / 2.0;
    let y = PAGE_HEIGHT - 230.0 - COVER_IMAGE_SIZE;
    pages.image("Im1", x, y, COVER_IMAGE_SIZE);
  }

  pages.set_fill([0.45, 0.45, 0.45]);
  let generated = format!("Generated {}", Utc::now().format("%B %-d, %Y at %H:%M UTC"));
  pages.centered("F1", 10.0, 120.0, &generated);
}

fn core_pages(pages: &mut PageBuilder, sections: &ParsedSections) {
  pages.new_page();
  for section in Section::CORE {
    if let Some(body) = sections.get(section) {
      pages.heading(section.heading());
      pages.paragraph(body);
    }
  }
}

fn plus_page(pages: &mut PageBuilder, display_name: &str) {
  pages.new_page();
  pages.heading("Your Connection Compass");
  pages.paragraph(&format!(
    "{}, this page collects practical ways to recognize and nurture the connection described in your \
     reading. Notice who makes you feel calm rather than anxious. Pay attention to shared laughter, to \
     conversations that lose track of time and to people who remember the small things you say.",
    display_name
  ));
  pages.paragraph(
    "Compatibility keys: consistency over intensity, curiosity about each other's inner world, and a \
     shared sense of humour. Timing tends to favour periods when you are investing in your own growth.",
  );
}

fn premium_page(pages: &mut PageBuilder) {
  pages.new_page();
  pages.heading("Deluxe Soul Reading");
  pages.paragraph(
    "Your deluxe reading looks beyond first impressions to the longer arc of the relationship. The \
     strongest bonds in your chart grow through seasons: an easy beginning, a period of learning each \
     other's rhythms, and a deepening once trust is settled.",
  );
  pages.paragraph(
    "Reflection prompts: What does feeling truly seen look like for you? Which old pattern are you ready \
     to leave behind? What would you like a partner to learn from you?",
  );
}

fn addons_page(pages: &mut PageBuilder, addons: &AddonSet, sections: &ParsedSections) {
  pages.new_page();
  pages.heading("Your Special Readings");
  for addon in addons.iter() {
    pages.heading(addon.display_name());
    match sections.get(Section::for_addon(addon)) {
      Some(body) => pages.paragraph(body),
      None => pages.paragraph("This reading is being prepared and will be shared with you separately."),
    }
  }
}

fn assemble(pages: Vec<Vec<Operation>>, image: Option<Stream>) -> AppResult<Vec<u8>> {
  let mut doc = Document::with_version("1.5");
  let pages_id = doc.new_object_id();

  let regular = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Helvetica",
    "Encoding" => "WinAnsiEncoding",
  });
  let bold = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Helvetica-Bold",
    "Encoding" => "WinAnsiEncoding",
  });

  let mut resources = dictionary! {
    "Font" => dictionary! { "F1" => regular, "F2" => bold },
  };
  if let Some(stream) = image {
    let image_id = doc.add_object(stream);
    resources.set("XObject", dictionary! { "Im1" => image_id });
  }
  let resources_id = doc.add_object(resources);

  let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
  for operations in pages {
    let content = Content { operations }
      .encode()
      .map_err(|e| AppError::Pdf(format!("Cannot encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id: ObjectId = doc.add_object(dictionary! {
      "Type" => "Page",
      "Parent" => pages_id,
      "Contents" => content_id,
      "Resources" => resources_id,
    });
    kids.push(page_id.into());
  }

  let count = kids.len() as i64;
  let media_box: Vec<Object> = vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
  doc.objects.insert(
    pages_id,
    Object::Dictionary(dictionary! {
      "Type" => "Pages",
      "Kids" => kids,
      "Count" => count,
      "MediaBox" => media_box,
    }),
  );
  let catalog_id = doc.add_object(dictionary! {
    "Type" => "Catalog",
    "Pages" => pages_id,
  });
  doc.trailer.set("Root", catalog_id);
  doc.compress();

  let mut bytes = Vec::new();
  doc
    .save_to(&mut bytes)
    .map_err(|e| AppError::Pdf(format!("Cannot serialize PDF: {}", e)))?;
  Ok(bytes)
}

/// Lays out the whole report and returns the PDF bytes.
pub fn render_report(input: &ReportInput) -> AppResult<Vec<u8>> {
  let sections = parse_sections(&input.text);

  let image = match input.image_path.as_deref() {
    Some(path) if path.exists() => match image_xobject(path) {
      Ok(stream) => Some(stream),
      Err(e) => {
        warn!(error = %e, "Cover image skipped.");
        None
      }
    },
    _ => None,
  };

  let mut pages = PageBuilder::new();
  cover(&mut pages, input, image.is_some());
  core_pages(&mut pages, &sections);
  if input.tier.includes_plus_content() {
    plus_page(&mut pages, &input.display_name);
  }
  if input.tier.includes_premium_content() {
    premium_page(&mut pages);
  }
  if !input.addons.is_empty() {
    addons_page(&mut pages, &input.addons, &sections);
  }
  pages.footer(DISCLAIMER);

  debug!(pages = pages.pages.len(), sections = sections.len(), "Report laid out.");
  assemble(pages.pages, image)
}

/// Renders the report off the async runtime and writes it to `input.output_path`.
#[instrument(name = "report::write_pdf", skip(input), fields(output = %input.output_path.display()), err(Display))]
pub async fn write_report(input: ReportInput) -> AppResult<PathBuf> {
  let output_path = input.output_path.clone();
  let bytes = tokio::task::spawn_blocking(move || render_report(&input))
    .await
    .map_err(|e| AppError::Pdf(format!("PDF rendering task failed: {}", e)))??;

  if let Some(parent) = output_path.parent() {
    tokio::fs::create_dir_all(parent).await?;
  }
  tokio::fs::write(&output_path, bytes).await?;
  Ok(output_path)
}
