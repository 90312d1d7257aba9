//! Content-stream walker that turns each page into positioned, styled
//! [`TextRun`]s.

use outliner_core::{DocumentText, PageText, TextRun};

use super::backend::{get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue};
use crate::PdfError;

/// Approximate average glyph width as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Fraction of an average glyph width that a `TJ` displacement must exceed to
/// count as a word break.
const TJ_WORD_GAP_RATIO: f32 = 0.3;

/// Base-font name fragments that indicate a bold face.
const BOLD_NAME_MARKERS: &[&str] = &["BOLD", "BLACK", "HEAVY", "DEMI"];

/// The identity 2x3 matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource name (the `/F1`-style key).
    font_key: Vec<u8>,
    /// Current font size in text-space units.
    font_size: f32,
    is_bold: bool,
    text_matrix: [f32; 6],
    /// Set by BT, updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Current transformation matrix (`cm`).
    ctm: [f32; 6],
    /// Saved CTMs for `q` / `Q`.
    ctm_stack: Vec<[f32; 6]>,
    /// Horizontal scaling factor (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            is_bold: false,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            ctm: IDENTITY_MATRIX,
            ctm_stack: Vec::new(),
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

/// `m1 × m2` for 2x3 affine matrices stored as [a, b, c, d, e, f].
fn multiply(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn vertical_scale(m: &[f32; 6]) -> f32 {
    (m[2].powi(2) + m[3].powi(2)).sqrt()
}

impl TextState {
    /// Device-space position of the current glyph origin, including rise.
    fn position(&self) -> (f32, f32) {
        let x = self.text_matrix[4] + self.text_rise * self.text_matrix[2];
        let y = self.text_matrix[5] + self.text_rise * self.text_matrix[3];
        let c = &self.ctm;
        (c[0] * x + c[2] * y + c[4], c[1] * x + c[3] * y + c[5])
    }

    /// Rendered font size: `font_size` scaled by the text matrix and the CTM.
    fn effective_font_size(&self) -> f32 {
        (self.font_size * vertical_scale(&self.text_matrix) * vertical_scale(&self.ctm)).abs()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Multiply the text line matrix by a translation (used by Td / TD).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    /// Apply the `Tf` operator.
    fn set_font(&mut self, key: Vec<u8>, base_font: &str, size: f32, descriptor_bold: bool) {
        self.font_key = key;
        self.font_size = size;
        self.is_bold = descriptor_bold || is_bold_font_name(base_font);
    }
}

/// Bold detection from a base-font name such as `ABCDEF+Arial-BoldMT`.
pub fn is_bold_font_name(base_font: &str) -> bool {
    let upper = base_font.to_uppercase();
    BOLD_NAME_MARKERS.iter().any(|marker| upper.contains(marker))
}

fn resolve_font<'a>(key: &[u8], fonts: &'a [BackendFontInfo]) -> Option<&'a BackendFontInfo> {
    fonts.iter().find(|info| info.name == key)
}

/// Estimated rendered width in device units. Glyph widths are not read, so
/// every character counts as `APPROX_CHAR_WIDTH_RATIO` of the font size.
fn estimate_text_width(text: &str, state: &TextState) -> f32 {
    let n = text.chars().count() as f32;
    n * state.effective_font_size() * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale
}

/// Advance the text matrix after rendering `text`.
fn advance_after_show(text: &str, state: &mut TextState) {
    let mut total_dx: f32 = 0.0;
    for ch in text.chars() {
        total_dx += state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale;
        total_dx += state.char_spacing;
        if ch == ' ' {
            total_dx += state.word_spacing;
        }
    }
    state.advance_x(total_dx);
}

fn decode_string(
    val: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    font_key: &[u8],
) -> String {
    match val {
        PdfValue::Str(bytes) => {
            let decoded = backend.decode_text(page_id, font_key, bytes);
            if decoded.is_empty() {
                super::backend::decode_text_simple(bytes)
            } else {
                decoded
            }
        }
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk one page's content stream and collect its text runs.
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` / `Q` | Save / restore the CTM |
/// | `cm`     | Concatenate the CTM |
/// | `BT`     | Begin text object, reset matrices |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix |
/// | `Td` / `TD` / `T*` | Move to a new line |
/// | `TL` / `Tc` / `Tw` / `Tz` / `Ts` | Text state parameters |
/// | `Tj` / `'` / `"` | Show a string |
/// | `TJ`     | Show strings with kerning adjustments |
pub fn extract_page_runs(
    backend: &dyn PdfBackend,
    page_num: usize,
    page_id: PageId,
) -> Result<Vec<TextRun>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|e| {
        log::debug!("page {}: no font resources ({})", page_num, e);
        Vec::new()
    });

    let mut state = TextState::default();
    let mut runs: Vec<TextRun> = Vec::new();

    for op in &ops {
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }

            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            // Font state survives ET; some producers set it once per page.
            "ET" => {}

            "Tf" => handle_tf(&op.operands, &fonts, &mut state),

            "Tm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if op.operands.len() >= 2 {
                    let tx = get_number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.leading = v;
                }
            }

            "Tc" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.text_rise = v;
                }
            }

            "Tj" => {
                if let Some(first) = op.operands.first() {
                    emit_show_string(first, backend, page_id, page_num, &mut state, &mut runs);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    handle_tj_array(arr, backend, page_id, page_num, &mut state, &mut runs);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(first) = op.operands.first() {
                    emit_show_string(first, backend, page_id, page_num, &mut state, &mut runs);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    if let Some(aw) = get_number_from_value(&op.operands[0]) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(&op.operands[1]) {
                        state.char_spacing = ac;
                    }
                    state.translate_line(0.0, -state.leading);
                    emit_show_string(
                        &op.operands[2],
                        backend,
                        page_id,
                        page_num,
                        &mut state,
                        &mut runs,
                    );
                }
            }

            _ => {}
        }
    }

    Ok(runs)
}

/// Extract every page plus the page bounds and metadata title.
pub fn extract_document_text(backend: &dyn PdfBackend) -> Result<DocumentText, PdfError> {
    let page_map = backend.pages();
    let mut pages: Vec<PageText> = Vec::with_capacity(page_map.len());

    for (&page_num, &page_id) in &page_map {
        let page = page_num as usize;
        let runs = extract_page_runs(backend, page, page_id)?;
        log::trace!("page {}: {} runs", page, runs.len());
        let (bottom, height) = match backend.page_bounds(page_id) {
            Some((bottom, height)) => (bottom, Some(height)),
            None => (0.0, None),
        };
        pages.push(PageText {
            page,
            height,
            bottom,
            runs,
        });
    }

    Ok(DocumentText {
        pages,
        metadata_title: backend.metadata_title(),
    })
}

// ---------------------------------------------------------------------------
// Operator handlers
// ---------------------------------------------------------------------------

fn matrix_operand(operands: &[PdfValue]) -> Option<[f32; 6]> {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    match vals.as_slice() {
        &[a, b, c, d, e, f] => Some([a, b, c, d, e, f]),
        _ => None,
    }
}

fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    if operands.len() < 2 {
        return;
    }
    let key = match &operands[0] {
        PdfValue::Name(n) => n.clone(),
        PdfValue::Str(s) => s.clone(),
        _ => return,
    };
    let size = get_number_from_value(&operands[1]).unwrap_or(0.0);
    match resolve_font(&key, fonts) {
        Some(info) => {
            let base = info.base_font.clone().unwrap_or_default();
            state.set_font(key, &base, size, info.descriptor_bold);
        }
        None => {
            // Font missing from the resource dict; the key is all we have.
            let name = String::from_utf8_lossy(&key).into_owned();
            state.set_font(key, &name, size, false);
        }
    }
}

fn push_run(text: &str, x: f32, y: f32, page: usize, state: &TextState, runs: &mut Vec<TextRun>) {
    let width = estimate_text_width(text, state);
    runs.push(
        TextRun::new(text, state.effective_font_size(), state.is_bold, x, y, page)
            .with_width(width),
    );
}

/// Shared by `Tj`, `'` and `"`.
fn emit_show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    page_num: usize,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
) {
    let text = decode_string(operand, backend, page_id, &state.font_key);
    if text.is_empty() {
        return;
    }
    let (x, y) = state.position();
    push_run(&text, x, y, page_num, state, runs);
    advance_after_show(&text, state);
}

/// Process a `TJ` array of strings and kerning adjustments (thousandths of a
/// text-space unit). The whole array becomes one run; large negative
/// adjustments become spaces.
fn handle_tj_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page_id: PageId,
    page_num: usize,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
) {
    let mut buf = String::new();
    let mut origin = state.position();

    for elem in arr {
        match elem {
            PdfValue::Str(_) => {
                let fragment = decode_string(elem, backend, page_id, &state.font_key);
                if buf.is_empty() {
                    origin = state.position();
                }
                buf.push_str(&fragment);
                advance_after_show(&fragment, state);
            }
            val => {
                if let Some(adj) = get_number_from_value(val) {
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                    let gap_threshold = state.font_size
                        * APPROX_CHAR_WIDTH_RATIO
                        * state.horiz_scale
                        * TJ_WORD_GAP_RATIO;
                    if dx > gap_threshold && !buf.is_empty() && !buf.ends_with(' ') {
                        buf.push(' ');
                    }
                    state.advance_x(dx);
                }
            }
        }
    }

    let text = buf.trim_end();
    if !text.is_empty() {
        push_run(text, origin.0, origin.1, page_num, state, runs);
    }
}
