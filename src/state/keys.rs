//! Well-known store keys.
//!
//! The snapshot is schemaless, so every component agrees on names through
//! these constants rather than string literals.

// Lifecycle and live input
/// Current [`AppState`](crate::model::AppState), as lower-case text.
pub const APP_STATE: &str = "appState";
/// Live messages to append, as a list of serialized records.
pub const CONVERSATION: &str = "conversation";
/// Text currently being typed.
pub const INPUT: &str = "input";
/// Character index of the input caret.
pub const CURSOR_POS: &str = "cursorPos";
/// Last special key pressed in the input (`ArrowUp`, `ArrowDown`, ...).
pub const SPECIAL_KEY_PRESSED: &str = "specialKeyPressed";
/// Maximum number of characters accepted by the input.
pub const MAX_INPUT_LENGTH: &str = "maxInputLength";
/// Shaped height of the input block; the transcript stacks above it.
pub const INPUT_HEIGHT: &str = "inputHeight";
/// Resolved content-space position of the input caret.
pub const CARET_POSITION: &str = "caretPosition";

// Layout inputs
/// Viewport width in content units.
pub const VIEWPORT_WIDTH: &str = "viewportWidth";
/// Viewport height in content units.
pub const VIEWPORT_HEIGHT: &str = "viewportHeight";
/// Padding between viewport edge and content box.
pub const PADDING: &str = "padding";
/// Number of text lines that fit the content height.
pub const NUM_LINES: &str = "numLines";
/// Spacing between messages, in lines.
pub const NUM_LINES_SPACING: &str = "numLinesSpacing";
/// Message width as a fraction of the usable width.
pub const MESSAGE_WIDTH_RATIO: &str = "messageWidthRatio";
/// Counterpart offset as a fraction of the usable width.
pub const COUNTERPART_OFFSET_RATIO: &str = "counterpartOffsetRatio";
/// Cursor and indicator width as a fraction of the line height.
pub const CURSOR_WIDTH_RATIO: &str = "cursorWidthRatio";
/// Line height of the font relative to its size.
pub const FONT_LINE_HEIGHT_RATIO: &str = "fontLineHeightRatio";

/// Font family handed to the shaping engine.
pub const FONT: &str = "font";
/// Whether response messages shift left by their trust score.
pub const TRUST_WEIGHTED: &str = "trustWeighted";

/// Every key the layout calculator reads.
pub const LAYOUT_INPUTS: [&str; 9] = [
    VIEWPORT_WIDTH,
    VIEWPORT_HEIGHT,
    PADDING,
    NUM_LINES,
    NUM_LINES_SPACING,
    MESSAGE_WIDTH_RATIO,
    COUNTERPART_OFFSET_RATIO,
    CURSOR_WIDTH_RATIO,
    FONT_LINE_HEIGHT_RATIO,
];

// Layout outputs
/// Lower-left corner of the viewport.
pub const ORIGIN: &str = "origin";
/// Lower-left corner of the content box.
pub const LEFT_BOTTOM: &str = "leftBottom";
/// Content box width.
pub const CONTENT_WIDTH: &str = "contentWidth";
/// Content box height.
pub const CONTENT_HEIGHT: &str = "contentHeight";
/// Height of one text line.
pub const LINE_HEIGHT: &str = "lineHeight";
/// Gap between messages and around columns.
pub const SPACING: &str = "spacing";
/// Maximum width of an input message.
pub const MESSAGE_WIDTH: &str = "messageWidth";
/// Maximum width of a response message.
pub const COUNTERPART_WIDTH: &str = "counterpartWidth";
/// Horizontal shift of response messages.
pub const COUNTERPART_OFFSET: &str = "counterpartOffset";
/// X of the input sender indicator, relative to `leftBottom`.
pub const MESSAGE_INDICATOR: &str = "messageIndicator";
/// X of the loading indicator, relative to `leftBottom` plus spacing.
pub const LOA_INDICATOR: &str = "loaIndicator";
/// X of the response sender indicator, relative to `leftBottom`.
pub const COUNTERPART_INDICATOR: &str = "counterpartIndicator";
/// Width of cursors and sender indicators.
pub const CURSOR_WIDTH: &str = "cursorWidth";
/// Font size derived from the line height.
pub const FONT_SIZE: &str = "fontSize";
/// Whether the last recompute produced usable (positive) metrics.
pub const LAYOUT_READY: &str = "layoutReady";
