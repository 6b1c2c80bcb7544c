//! Layout Renderer
//!
//! Turns a record into a fixed-pixel visual tree at 96 px/in. Both label
//! formats go through [`render`]; the preset picks the geometry and the
//! region map. Nothing here can fail: empty fields produce a visibly
//! degraded label, never an error.

use serde::{Deserialize, Serialize};

use crate::payload::qr_payload;
use crate::record::LabelRecord;
use crate::templates::{LabelPreset, LabelSize, LabelType};

/// Shown instead of a barcode when the field is empty.
pub const NO_DATA: &str = "No Data";
pub const SUPPLIER_FALLBACK: &str = "Supplier / Vendor Name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size_px: u32,
    pub bold: bool,
    pub align: Align,
}

impl TextStyle {
    pub const fn new(size_px: u32, bold: bool, align: Align) -> Self {
        Self {
            size_px,
            bold,
            align,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Text { content: String, style: TextStyle },
    /// CODE128 bars for the raw field value, optionally with the value
    /// printed underneath.
    Barcode {
        value: String,
        human_readable: bool,
        text_px: u32,
    },
    Placeholder { text: String },
    QrCode { payload: String },
    /// Solid line or block.
    Rule,
    Border { thickness: u32, shade: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub rect: Rect,
    pub kind: NodeKind,
}

/// A rendered label. Owned by whoever mounted it; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelLayout {
    pub size: LabelSize,
    pub label_type: LabelType,
    pub width_px: u32,
    pub height_px: u32,
    pub payload: String,
    pub nodes: Vec<Node>,
}

impl LabelLayout {
    /// Every textual value in paint order: text, barcode values,
    /// placeholders and the QR payload.
    pub fn text_content(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Text { content, .. } => Some(content.as_str()),
                NodeKind::Barcode { value, .. } => Some(value.as_str()),
                NodeKind::Placeholder { text } => Some(text.as_str()),
                NodeKind::QrCode { payload } => Some(payload.as_str()),
                NodeKind::Rule | NodeKind::Border { .. } => None,
            })
            .collect()
    }

    pub fn barcodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Barcode { value, .. } => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn preset(&self) -> LabelPreset {
        LabelPreset::for_size(self.size)
    }
}

pub fn render(record: &LabelRecord, size: LabelSize, label_type: LabelType) -> LabelLayout {
    let preset = LabelPreset::for_size(size);
    let payload = qr_payload(record);

    let mut canvas = Canvas::default();
    match size {
        LabelSize::Outer => outer(&mut canvas, &preset, record, label_type, &payload),
        LabelSize::Inner => inner(&mut canvas, &preset, record, label_type, &payload),
    }

    LabelLayout {
        size,
        label_type,
        width_px: preset.width_px,
        height_px: preset.height_px,
        payload,
        nodes: canvas.nodes,
    }
}

#[derive(Default)]
struct Canvas {
    nodes: Vec<Node>,
}

impl Canvas {
    fn push(&mut self, rect: Rect, kind: NodeKind) {
        self.nodes.push(Node { rect, kind });
    }

    fn text(&mut self, rect: Rect, content: &str, style: TextStyle) {
        self.push(
            rect,
            NodeKind::Text {
                content: content.to_string(),
                style,
            },
        );
    }

    fn rule(&mut self, rect: Rect) {
        self.push(rect, NodeKind::Rule);
    }

    /// Barcode for the raw value; an empty value is "no data", not an
    /// encoding attempt.
    fn barcode(&mut self, rect: Rect, value: &str, human_readable: bool, text_px: u32) {
        if value.is_empty() {
            self.push(
                rect,
                NodeKind::Placeholder {
                    text: NO_DATA.to_string(),
                },
            );
        } else {
            self.push(
                rect,
                NodeKind::Barcode {
                    value: value.to_string(),
                    human_readable,
                    text_px,
                },
            );
        }
    }

    fn qr(&mut self, rect: Rect, payload: &str) {
        self.push(
            rect,
            NodeKind::QrCode {
                payload: payload.to_string(),
            },
        );
    }

    /// Bold label on the left, value on the right of the same line.
    fn key_value(&mut self, rect: Rect, key: &str, value: &str, size_px: u32, bold_value: bool) {
        self.text(rect, key, TextStyle::new(size_px, true, Align::Left));
        self.text(rect, value, TextStyle::new(size_px, bold_value, Align::Right));
    }
}

const CAPTION: TextStyle = TextStyle::new(9, true, Align::Left);
const OUTER_BAR_PX: u32 = 12;
const OUTER_BAR_TEXT_PX: u32 = 9;

fn outer(
    canvas: &mut Canvas,
    preset: &LabelPreset,
    record: &LabelRecord,
    label_type: LabelType,
    payload: &str,
) {
    let (w, h) = (preset.width_px, preset.height_px);
    canvas.push(
        Rect::new(0, 0, w, h),
        NodeKind::Border {
            thickness: preset.border_px,
            shade: 0,
        },
    );

    let inset = preset.border_px + preset.padding_px;
    let left = inset;
    let top = inset;
    let inner_w = w - 2 * inset;
    let bottom = h - inset;

    // header
    let supplier = if record.supplier_name.is_empty() {
        SUPPLIER_FALLBACK.to_string()
    } else {
        record.supplier_name.to_uppercase()
    };
    canvas.text(
        Rect::new(left, top, inner_w, 17),
        &supplier,
        TextStyle::new(14, true, Align::Center),
    );
    canvas.rule(Rect::new(left, top + 21, inner_w, 2));

    let body_top = top + 27;
    let body_h = bottom - body_top;

    // left column: five barcode rows
    let col_w = inner_w * 66 / 100;
    let row_h = body_h / 5;
    let row = |i: u32| Rect::new(left, body_top + i * row_h, col_w - 4, row_h);

    for i in 0..4 {
        let r = row(i);
        canvas.rule(Rect::new(r.x, r.bottom() - 1, r.w, 1));
    }

    let r = row(0);
    let (a, b) = split(r, 2, 3);
    barcode_cell(canvas, a, "PO Number:", &record.po_number);
    value_cell(canvas, b, "PO Line:", &record.po_line, Align::Center);

    barcode_cell(canvas, row(1), "HU:", &record.hu_number);

    let (a, b) = split(row(2), 1, 2);
    if record.ibd_number.is_empty() {
        caption(canvas, a, "IBD:");
    } else {
        barcode_cell(canvas, a, "IBD:", &record.ibd_number);
    }
    barcode_cell(canvas, b, "Batch:", &record.batch_number);

    let (a, b) = split(row(3), 3, 5);
    barcode_cell(canvas, a, "SanDisk PN:", &record.sandisk_pn);
    value_cell(canvas, b, "Quantity:", &record.quantity, Align::Right);

    let (a, b) = split(row(4), 1, 2);
    barcode_cell(canvas, a, "MPN:", &record.mpn);
    value_cell(canvas, b, "Date Code:", &record.date_code, Align::Center);

    // right column: QR, details, substrate block
    let divider_x = left + col_w;
    canvas.rule(Rect::new(divider_x, body_top, 1, body_h));
    let rx = divider_x + 9;
    let rw = left + inner_w - rx;

    // 20 mm square
    let qr_side = 76;
    canvas.qr(
        Rect::new(rx + (rw - qr_side) / 2, body_top + 4, qr_side, qr_side),
        payload,
    );

    let detail = TextStyle::new(9, false, Align::Left);
    let line_h = 12;
    let mut y = body_top + qr_side + 12;
    let mut line = |canvas: &mut Canvas, text: &str, style: TextStyle| {
        canvas.text(Rect::new(rx, y, rw, line_h), text, style);
        y += line_h;
    };
    line(canvas, "Vendor Lot:", CAPTION);
    line(canvas, &record.vendor_lot, detail);
    line(canvas, "Expiry Date:", CAPTION);
    line(canvas, &record.expiry_date, detail);
    line(canvas, &format!("COO: {}", record.coo), CAPTION);
    line(canvas, &format!("Box No: {}", record.box_no), CAPTION);
    line(canvas, &format!("Date: {}", record.print_date), CAPTION);

    if label_type == LabelType::Substrate {
        let block = Rect::new(rx, bottom - line_h - 3, rw, line_h + 3);
        canvas.rule(Rect::new(block.x, block.y, block.w, 1));
        let text_rect = Rect::new(block.x, block.y + 3, block.w, line_h);
        canvas.text(text_rect, &format!("Rev: {}", record.rev), CAPTION);
        canvas.text(
            text_rect,
            &format!("Num: {}", record.num),
            TextStyle::new(9, true, Align::Right),
        );
    }
}

/// Splits a row at `num/den` of its width and draws the cell divider.
fn split(r: Rect, num: u32, den: u32) -> (Rect, Rect) {
    let first = r.w * num / den;
    let a = Rect::new(r.x, r.y, first - 4, r.h);
    let b = Rect::new(r.x + first + 4, r.y, r.w - first - 4, r.h);
    (a, b)
}

fn caption(canvas: &mut Canvas, cell: Rect, label: &str) {
    canvas.text(Rect::new(cell.x, cell.y + 4, cell.w, 11), label, CAPTION);
}

fn barcode_cell(canvas: &mut Canvas, cell: Rect, label: &str, value: &str) {
    caption(canvas, cell, label);
    let bars = Rect::new(
        cell.x,
        cell.y + 17,
        cell.w,
        OUTER_BAR_PX + OUTER_BAR_TEXT_PX + 2,
    );
    canvas.barcode(bars, value, true, OUTER_BAR_TEXT_PX);
}

fn value_cell(canvas: &mut Canvas, cell: Rect, label: &str, value: &str, align: Align) {
    caption(canvas, cell, label);
    canvas.rule(Rect::new(cell.x, cell.y + 16, cell.w, 1));
    canvas.text(
        Rect::new(cell.x, cell.y + 22, cell.w, 14),
        value,
        TextStyle::new(13, true, align),
    );
}

fn inner(
    canvas: &mut Canvas,
    preset: &LabelPreset,
    record: &LabelRecord,
    label_type: LabelType,
    payload: &str,
) {
    let (w, h) = (preset.width_px, preset.height_px);
    canvas.push(
        Rect::new(0, 0, w, h),
        NodeKind::Border {
            thickness: preset.border_px,
            shade: 0xd1,
        },
    );

    let inset = preset.border_px + preset.padding_px;
    let left = inset;
    let top = inset;
    let inner_w = w - 2 * inset;
    let bottom = h - inset;

    // left: two barcodes, then text lines
    let col_w = inner_w * 65 / 100;
    let lw = col_w - 4;
    let bold7 = TextStyle::new(7, true, Align::Left);
    let plain7 = TextStyle::new(7, false, Align::Left);

    let mut y = top;
    for (key, value) in [("HU:", &record.hu_number), ("PN:", &record.sandisk_pn)] {
        canvas.text(Rect::new(left, y, 14, 8), key, bold7);
        canvas.text(Rect::new(left + 15, y, lw - 15, 8), value, plain7);
        canvas.barcode(Rect::new(left, y + 9, lw, 9), value, false, 0);
        y += 21;
    }

    let line_h = 8;
    y += 2;
    for (key, value) in [
        ("V/Lot:", &record.vendor_lot),
        ("MPN:", &record.mpn),
        ("DC:", &record.date_code),
        ("Exp Date:", &record.expiry_date),
        ("IBD:", &record.ibd_number),
    ] {
        let key_w = (key.chars().count() as u32 * 6 * 3).div_ceil(4) + 2;
        canvas.text(
            Rect::new(left, y, key_w, line_h),
            key,
            TextStyle::new(6, true, Align::Left),
        );
        canvas.text(
            Rect::new(left + key_w, y, lw - key_w, line_h),
            value,
            TextStyle::new(6, false, Align::Left),
        );
        y += line_h;
    }

    // right: PO block, QR, meta block
    let divider_x = left + col_w;
    canvas.rule(Rect::new(divider_x, top, 1, bottom - top));
    let rx = divider_x + 5;
    let rw = left + inner_w - rx;

    let mut y = top;
    for (key, value) in [
        ("PO. No.:", &record.po_number),
        ("PO Line:", &record.po_line),
        ("Batch:", &record.batch_number),
    ] {
        canvas.key_value(Rect::new(rx, y, rw, line_h), key, value, 6, false);
        y += line_h;
    }

    let qr_side = 36;
    canvas.qr(Rect::new(rx + (rw - qr_side) / 2, y + 4, qr_side, qr_side), payload);

    let mut meta = vec![
        ("MSL:", record.msl.as_str(), false),
        ("COO:", record.coo.as_str(), false),
        ("Qty:", record.quantity.as_str(), false),
    ];
    if label_type == LabelType::Substrate {
        meta.push(("Rev:", record.rev.as_str(), true));
        meta.push(("Num:", record.num.as_str(), true));
    }
    let mut y = bottom - line_h * meta.len() as u32;
    for (key, value, bold) in meta {
        canvas.key_value(Rect::new(rx, y, rw, line_h), key, value, 6, bold);
        y += line_h;
    }
}
