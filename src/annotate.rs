//! Overlay of per-region compliance onto the frame.

use image::{Rgb, RgbImage};

use crate::compliance::{ComplianceVerdict, RegionKind};
use crate::detect::BBox;
use crate::ppe::PpeCategory;

pub const OK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const MISSING_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const BOX_THICKNESS: u32 = 3;
/// Glyphs are 3x5 cells scaled up by this factor.
const GLYPH_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = 4 * GLYPH_SCALE;
const GLYPH_HEIGHT: i32 = 5 * GLYPH_SCALE;
const LABEL_PADDING: i32 = 2;
const LABEL_STRIP_HEIGHT: i32 = GLYPH_HEIGHT + 2 * LABEL_PADDING;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionStatus {
    Ok,
    Missing,
}

impl RegionStatus {
    pub fn color(self) -> Rgb<u8> {
        match self {
            RegionStatus::Ok => OK_COLOR,
            RegionStatus::Missing => MISSING_COLOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionAnnotation {
    pub bbox: BBox,
    pub status: RegionStatus,
    pub label: String,
}

/// Builds annotations for the evaluated regions.
///
/// Heads list whichever required head items the region lacks. Hands and feet
/// are only shown when gloves or shoes are actually required.
pub fn annotations(verdict: &ComplianceVerdict, required: &[PpeCategory]) -> Vec<RegionAnnotation> {
    let mut out = Vec::new();
    for region in &verdict.regions {
        let annotation = match region.kind {
            RegionKind::Head => {
                let missing: Vec<String> = region
                    .kind
                    .categories()
                    .iter()
                    .filter(|c| required.contains(*c) && !region.satisfies(**c))
                    .map(|c| c.as_str().to_uppercase())
                    .collect();
                if missing.is_empty() {
                    (RegionStatus::Ok, "HEAD: OK".to_string())
                } else {
                    (RegionStatus::Missing, format!("Missing: {}", missing.join(",")))
                }
            }
            RegionKind::Hand => {
                if !required.contains(&PpeCategory::Gloves) {
                    continue;
                }
                single_item(region.satisfies(PpeCategory::Gloves), "GLOVE")
            }
            RegionKind::Foot => {
                if !required.contains(&PpeCategory::Shoes) {
                    continue;
                }
                single_item(region.satisfies(PpeCategory::Shoes), "SHOE")
            }
        };
        out.push(RegionAnnotation {
            bbox: region.bbox,
            status: annotation.0,
            label: annotation.1,
        });
    }
    out
}

fn single_item(satisfied: bool, name: &str) -> (RegionStatus, String) {
    if satisfied {
        (RegionStatus::Ok, format!("{}: OK", name))
    } else {
        (RegionStatus::Missing, format!("Missing: {}", name))
    }
}

/// Draws each annotation as an outlined box with its label on a filled
/// strip above it. The strip widens past the box when the label needs it.
pub fn render(img: &mut RgbImage, annotations: &[RegionAnnotation]) {
    for annotation in annotations {
        let color = annotation.status.color();
        let bbox = annotation.bbox;
        draw_rect(img, bbox, color, BOX_THICKNESS);
        let text_width = text_width(&annotation.label);
        let strip = BBox::new(
            bbox.x1,
            bbox.y1 - LABEL_STRIP_HEIGHT,
            bbox.x2.max(bbox.x1 + text_width + 2 * LABEL_PADDING),
            bbox.y1,
        );
        fill_rect(img, strip, color);
        draw_text(
            img,
            strip.x1 + LABEL_PADDING,
            strip.y1 + LABEL_PADDING,
            &annotation.label,
            LABEL_TEXT_COLOR,
        );
    }
}

/// Pixel width of `text` as drawn by `draw_text`.
pub fn text_width(text: &str) -> i32 {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        0
    } else {
        chars * GLYPH_ADVANCE - GLYPH_SCALE
    }
}

fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let mut cursor_x = x;
    for ch in text.chars() {
        draw_char(img, cursor_x, y, ch, color);
        cursor_x += GLYPH_ADVANCE;
    }
}

fn draw_char(img: &mut RgbImage, x: i32, y: i32, ch: char, color: Rgb<u8>) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    for (row, bits) in glyph(ch).iter().enumerate() {
        for col in 0..3 {
            if (bits >> (2 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let px = x + col * GLYPH_SCALE + dx;
                    let py = y + row as i32 * GLYPH_SCALE + dy;
                    if px >= 0 && py >= 0 && px < w && py < h {
                        img.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

/// 3x5 bitmap rows, most significant bit on the left. Lower case is drawn
/// as upper case; unknown characters are blank.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        _ => [0b000; 5],
    }
}

/// Clamps a box to the image. `None` when nothing of it is visible.
fn clip(img: &RgbImage, bbox: BBox) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    if bbox.x2 < 0 || bbox.y2 < 0 || bbox.x1 >= w as i32 || bbox.y1 >= h as i32 {
        return None;
    }
    let clamp = |v: i32, max: u32| -> u32 { v.clamp(0, max as i32 - 1) as u32 };
    Some((
        clamp(bbox.x1, w),
        clamp(bbox.y1, h),
        clamp(bbox.x2, w),
        clamp(bbox.y2, h),
    ))
}

fn draw_rect(img: &mut RgbImage, bbox: BBox, color: Rgb<u8>, thickness: u32) {
    let Some((x0, y0, x1, y1)) = clip(img, bbox) else {
        return;
    };
    for t in 0..thickness {
        let xx0 = x0 + t;
        let yy0 = y0 + t;
        let xx1 = x1.saturating_sub(t);
        let yy1 = y1.saturating_sub(t);
        if xx0 > xx1 || yy0 > yy1 {
            break;
        }
        for x in xx0..=xx1 {
            img.put_pixel(x, yy0, color);
            img.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            img.put_pixel(xx0, y, color);
            img.put_pixel(xx1, y, color);
        }
    }
}

fn fill_rect(img: &mut RgbImage, bbox: BBox, color: Rgb<u8>) {
    let Some((x0, y0, x1, y1)) = clip(img, bbox) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x, y, color);
        }
    }
}
